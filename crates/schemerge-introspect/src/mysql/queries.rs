use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

use schemerge_core::{Error, Result};

pub fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

pub async fn list_tables(pool: &MySqlPool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select cast(table_name as char) as name
        from information_schema.tables
        where table_schema = database()
          and table_type = 'BASE TABLE'
        order by table_name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub struct RawColumn {
    pub name: String,
    pub column_type: String,
    pub is_nullable: String,
    pub column_key: String,
    pub default: Option<String>,
    pub extra: String,
}

pub async fn list_columns(pool: &MySqlPool, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (String, String, String, String, Option<String>, String)>(
        r#"
        select
          cast(column_name as char),
          cast(column_type as char),
          cast(is_nullable as char),
          cast(column_key as char),
          cast(column_default as char),
          cast(extra as char)
        from information_schema.columns
        where table_schema = database()
          and table_name = ?
        order by ordinal_position
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(
            |(name, column_type, is_nullable, column_key, default, extra)| RawColumn {
                name,
                column_type,
                is_nullable,
                column_key,
                default,
                extra,
            },
        )
        .collect())
}

pub async fn show_create_table(pool: &MySqlPool, table: &str) -> Result<String> {
    let sql = format!("show create table {}", quote_identifier(table));
    let row = sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .map_err(db_error)?;

    // Column 0 is the table name, column 1 the statement.
    match row.try_get::<String, _>(1) {
        Ok(ddl) => Ok(ddl),
        Err(_) => {
            let bytes: Vec<u8> = row.try_get(1).map_err(db_error)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

pub async fn execute(pool: &MySqlPool, sql: &str) -> Result<()> {
    sqlx::raw_sql(sql).execute(pool).await.map_err(db_error)?;
    Ok(())
}

pub async fn fetch_rows(pool: &MySqlPool, sql: &str) -> Result<Vec<MySqlRow>> {
    sqlx::query(sql).fetch_all(pool).await.map_err(db_error)
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
