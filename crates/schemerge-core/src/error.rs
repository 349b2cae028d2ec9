use thiserror::Error;

use crate::ddl::{AppliedStatement, Side};

/// Core error type shared across schemerge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or executor failure.
    #[error("database error: {0}")]
    Db(String),
    /// The snapshot violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Creation DDL that mentions a foreign key but could not be classified.
    #[error("cannot extract relations from `{table}`: {reason} (line: {line:?})")]
    Extraction {
        table: String,
        line: String,
        reason: String,
    },
    /// A DDL statement failed partway through a merge.
    ///
    /// `applied` lists every statement that succeeded before the failure,
    /// in execution order.
    #[error("ddl failed on {side}: {message} (statement: {statement})")]
    Ddl {
        side: Side,
        statement: String,
        message: String,
        applied: Vec<AppliedStatement>,
    },
    /// A requested feature is not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Convenience alias for results returned by schemerge crates.
pub type Result<T> = std::result::Result<T, Error>;
