//! Database schema.
//!
//! One table, `files`, keyed by a `UNIQUE` canonical path. Migrations are
//! plain `CREATE ... IF NOT EXISTS` statements, safe to rerun on every
//! connect.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the schema on a fresh connection pool. Used by `snap init`.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = migrate_pool(&pool).await;
    pool.close().await;
    result
}

/// Create the `files` table and its indexes if they don't exist yet.
///
/// Idempotent; every command that touches the store calls it on connect.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL,
            ingested_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_ingested_at ON files(ingested_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
