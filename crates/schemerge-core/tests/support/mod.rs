use std::sync::Mutex;

use async_trait::async_trait;
use schemerge_core::{DescribedColumn, Error, Result, Row, SchemaExecutor};

/// Executor that records statements instead of running them.
pub struct RecordingExecutor {
    identity: String,
    fail_on: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            fail_on: None,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Fail every statement containing `fragment`.
    pub fn failing_on(identity: &str, fragment: &str) -> Self {
        Self {
            fail_on: Some(fragment.to_string()),
            ..Self::new(identity)
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("executed lock").clone()
    }
}

#[async_trait]
impl SchemaExecutor for RecordingExecutor {
    fn engine(&self) -> &'static str {
        "recording"
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn describe_columns(&self, _table: &str) -> Result<Vec<DescribedColumn>> {
        Ok(Vec::new())
    }

    async fn show_create_table(&self, _table: &str) -> Result<String> {
        Ok(String::new())
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        if let Some(fragment) = &self.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(Error::Db(format!("rejected: {sql}")));
            }
        }
        self.executed.lock().expect("executed lock").push(sql.to_string());
        Ok(())
    }

    async fn query(&self, _sql: &str) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }
}
