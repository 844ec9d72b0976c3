//! SQLite pool creation and table bootstrap.

use crate::config::DatabaseConfig;
use crate::core::{PERSON_MIGRATE_TABLE, PERSON_TABLE, Result, TableSchema};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    info!(max_connections = config.max_connections, "connected to database");
    Ok(pool)
}

/// Creates the source and destination tables when they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    for table in [PERSON_TABLE, PERSON_MIGRATE_TABLE] {
        let schema = TableSchema::person(table);
        sqlx::query(&schema.create_table_sql()).execute(pool).await?;
        info!(table, "table ready");
    }
    Ok(())
}

/// Single-connection in-memory database with both tables created.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    ensure_schema(&pool).await.expect("schema");
    pool
}
