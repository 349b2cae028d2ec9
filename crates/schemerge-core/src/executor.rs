use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A result row from a read-only query, keyed by column label.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// One row of `DESCRIBE <table>` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribedColumn {
    pub name: String,
    pub raw_type: String,
    /// `YES` or `NO`.
    pub null_marker: String,
    /// `PRI`, `UNI`, `MUL` or empty.
    pub key_marker: String,
    pub default_value: Option<String>,
    /// Free-form extra flags such as `auto_increment`.
    pub extra: String,
}

/// Connection-bound collaborator that answers catalog questions and runs SQL.
///
/// Implementations block the caller (by awaiting) until the database answers;
/// the core never issues two calls concurrently against the same executor.
#[async_trait]
pub trait SchemaExecutor: Send + Sync {
    /// Returns the engine identifier (e.g. `mysql`).
    fn engine(&self) -> &'static str;

    /// Connection identity with secrets redacted.
    fn identity(&self) -> &str;

    /// Table names in catalog order.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Column metadata in physical column order.
    async fn describe_columns(&self, table: &str) -> Result<Vec<DescribedColumn>>;

    /// Full creation DDL text of a table.
    async fn show_create_table(&self, table: &str) -> Result<String>;

    /// Run a statement that returns no result set.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Run a read-only query.
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;
}
