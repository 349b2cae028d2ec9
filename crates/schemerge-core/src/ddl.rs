//! Statement application with a partial-application ledger.
//!
//! Merges never wrap their statements in a transaction: each statement is
//! submitted on its own. The [`DdlApplier`] records every statement that
//! succeeded so a failure can report exactly how far the merge got.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::executor::SchemaExecutor;

/// Which of the two databases a statement targets.
///
/// `Base` is the schema a merge is invoked on, `Mirror` the one passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Base,
    Mirror,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Base => f.write_str("base"),
            Side::Mirror => f.write_str("mirror"),
        }
    }
}

/// A statement that was executed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedStatement {
    pub side: Side,
    pub statement: String,
}

/// Routes statements to the base or mirror executor and keeps the ledger.
pub struct DdlApplier<'a> {
    base: &'a dyn SchemaExecutor,
    mirror: &'a dyn SchemaExecutor,
    ledger: Vec<AppliedStatement>,
}

impl<'a> DdlApplier<'a> {
    pub fn new(base: &'a dyn SchemaExecutor, mirror: &'a dyn SchemaExecutor) -> Self {
        Self {
            base,
            mirror,
            ledger: Vec::new(),
        }
    }

    pub fn executor(&self, side: Side) -> &'a dyn SchemaExecutor {
        match side {
            Side::Base => self.base,
            Side::Mirror => self.mirror,
        }
    }

    /// Execute one statement against `side`.
    ///
    /// On failure the returned [`Error::Ddl`] carries the statement and a copy
    /// of the ledger; nothing already applied is undone.
    pub async fn apply(&mut self, side: Side, statement: String) -> Result<()> {
        match self.executor(side).execute(&statement).await {
            Ok(()) => {
                tracing::info!(event = "ddl_applied", side = %side, statement = %statement);
                self.ledger.push(AppliedStatement { side, statement });
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    event = "ddl_failed",
                    side = %side,
                    statement = %statement,
                    applied = self.ledger.len(),
                    error = %err
                );
                Err(Error::Ddl {
                    side,
                    statement,
                    message: err.to_string(),
                    applied: self.ledger.clone(),
                })
            }
        }
    }

    /// Statements applied so far, in execution order.
    pub fn ledger(&self) -> &[AppliedStatement] {
        &self.ledger
    }

    pub fn into_ledger(self) -> Vec<AppliedStatement> {
        self.ledger
    }
}

/// Format a statement the way it appears in a merge dump.
pub(crate) fn dump_line(statement: &str) -> String {
    format!("{statement}; \n")
}
