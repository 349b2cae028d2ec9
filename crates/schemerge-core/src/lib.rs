//! Core model and merge engine for schemerge.
//!
//! This crate defines the schema snapshot types (`Schema`, `Table`, `Column`,
//! `Relation`), their diff and merge algorithms, the relation scanner for
//! creation DDL, and the `SchemaExecutor` seam that connects them to a live
//! database.

pub mod column;
pub mod ddl;
pub mod diff;
pub mod error;
pub mod executor;
pub mod extract;
pub mod merge;
pub mod naming;
pub mod redaction;
pub mod relation;
pub mod schema;
pub mod table;
pub mod validation;

pub use column::{Column, ColumnType};
pub use ddl::{AppliedStatement, DdlApplier, Side};
pub use diff::{DiffResult, TableDiffResult};
pub use error::{Error, Result};
pub use executor::{DescribedColumn, Row, SchemaExecutor};
pub use extract::{ConstraintTuple, KeyTuple, ScannedDdl, extract_relations, resolve_relations, scan_create_table};
pub use merge::{MergeMode, MergeReport, TableMergeReport};
pub use naming::NameMatch;
pub use redaction::{RedactedConnection, redact_connection_string};
pub use relation::{Relation, RelationType};
pub use schema::{Schema, SchemaSummary};
pub use table::{Table, TableSummary};
pub use validation::validate_schema;

/// Current contract version for serialized snapshots.
pub const SNAPSHOT_VERSION: &str = "0.1";
