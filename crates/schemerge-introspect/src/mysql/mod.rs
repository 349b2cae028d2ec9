use std::time::Duration;

use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use schemerge_core::{DescribedColumn, Result, Row, SchemaExecutor, redact_connection_string};

mod mapper;
mod queries;

/// Pool settings used by [`MySqlExecutor::connect`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Executor for MySQL databases.
#[derive(Debug, Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
    identity: String,
}

impl MySqlExecutor {
    /// Create an executor over a pre-configured pool. `connection` is only
    /// used, redacted, as the executor identity.
    pub fn new(pool: MySqlPool, connection: &str) -> Self {
        Self {
            pool,
            identity: redact_connection_string(connection).redacted,
        }
    }

    /// Connect a new pool. Connection failures surface here, before any
    /// snapshot is built.
    pub async fn connect(url: &str, opts: &ConnectOptions) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect(url)
            .await
            .map_err(queries::db_error)?;
        Ok(Self::new(pool, url))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl SchemaExecutor for MySqlExecutor {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        queries::list_tables(&self.pool).await
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<DescribedColumn>> {
        let raw = queries::list_columns(&self.pool, table).await?;
        Ok(mapper::map_columns(raw))
    }

    async fn show_create_table(&self, table: &str) -> Result<String> {
        queries::show_create_table(&self.pool, table).await
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        queries::execute(&self.pool, sql).await
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let rows = queries::fetch_rows(&self.pool, sql).await?;
        Ok(rows.iter().map(mapper::map_row).collect())
    }
}
