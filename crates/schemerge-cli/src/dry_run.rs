use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use schemerge_core::{DescribedColumn, Result, Row, SchemaExecutor};

/// Executor that answers catalog reads from `inner` but only records
/// statements passed to `execute`.
pub struct DryRunExecutor<'a> {
    inner: &'a dyn SchemaExecutor,
    planned: Mutex<Vec<String>>,
}

impl<'a> DryRunExecutor<'a> {
    pub fn new(inner: &'a dyn SchemaExecutor) -> Self {
        Self {
            inner,
            planned: Mutex::new(Vec::new()),
        }
    }

    pub fn planned(&self) -> Vec<String> {
        self.planned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SchemaExecutor for DryRunExecutor<'_> {
    fn engine(&self) -> &'static str {
        self.inner.engine()
    }

    fn identity(&self) -> &str {
        self.inner.identity()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.inner.list_tables().await
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<DescribedColumn>> {
        self.inner.describe_columns(table).await
    }

    async fn show_create_table(&self, table: &str) -> Result<String> {
        self.inner.show_create_table(table).await
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        tracing::debug!(event = "ddl_planned", identity = %self.inner.identity(), statement = %sql);
        self.planned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sql.to_string());
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.inner.query(sql).await
    }
}

#[cfg(test)]
mod tests {
    use schemerge_core::{Column, DdlApplier, Error, MergeMode, Table};

    use super::*;

    struct RejectingExecutor;

    #[async_trait]
    impl SchemaExecutor for RejectingExecutor {
        fn engine(&self) -> &'static str {
            "rejecting"
        }

        fn identity(&self) -> &str {
            "mysql://localhost/app"
        }

        async fn list_tables(&self) -> Result<Vec<String>> {
            Ok(vec!["users".to_string()])
        }

        async fn describe_columns(&self, _table: &str) -> Result<Vec<DescribedColumn>> {
            Ok(Vec::new())
        }

        async fn show_create_table(&self, _table: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn execute(&self, sql: &str) -> Result<()> {
            Err(Error::Db(format!("should not run: {sql}")))
        }

        async fn query(&self, _sql: &str) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn records_statements_without_executing() {
        let inner = RejectingExecutor;
        let base = DryRunExecutor::new(&inner);
        let mirror = DryRunExecutor::new(&inner);
        let mut ddl = DdlApplier::new(&base, &mirror);

        let mut a = Table::new("app", "users").with_columns(vec![Column::new("id", "int")]);
        let mut b = Table::new("app", "users").with_columns(vec![
            Column::new("id", "int"),
            Column::new("age", "INT").with_nullable(true),
        ]);

        let report = a
            .merge(&mut b, &mut ddl, MergeMode::TwoWay)
            .await
            .expect("dry-run merge");
        assert_eq!(report.added, 1);
        assert_eq!(base.planned(), vec!["ALTER TABLE users ADD COLUMN age INT NULL"]);
        assert!(mirror.planned().is_empty());
        assert_eq!(base.list_tables().await.expect("tables"), vec!["users"]);
    }
}
