//! SQLite-backed [`FileStore`] implementation.
//!
//! One table, `files`, with a `UNIQUE` constraint on `path`. The constraint
//! is what arbitrates between racing ingesters: a rejected insert is mapped
//! to [`InsertOutcome::AlreadyPresent`], every other database error to
//! [`StoreError::Unavailable`].

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use code_snapshot_core::models::StoredFile;
use code_snapshot_core::store::{FileStore, InsertOutcome, StoreError};

use crate::config::Config;
use crate::db;
use crate::migrate;

/// Upper bound on bound parameters per `IN (...)` lookup.
const FETCH_BATCH: usize = 500;

/// SQLite implementation of the [`FileStore`] trait.
pub struct SqliteFileStore {
    pool: SqlitePool,
}

impl SqliteFileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        if let Err(e) = migrate::migrate_pool(&pool).await {
            pool.close().await;
            return Err(e);
        }
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Release every pooled connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl FileStore for SqliteFileStore {
    async fn contains(&self, path: &str) -> Result<bool, StoreError> {
        let hit: Option<i64> = sqlx::query_scalar("SELECT 1 FROM files WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::unavailable)?;
        Ok(hit.is_some())
    }

    async fn insert(&self, file: &StoredFile) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            "INSERT INTO files (id, path, content, ingested_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&file.id)
        .bind(&file.path)
        .bind(&file.content)
        .bind(file.ingested_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::AlreadyPresent)
            }
            Err(e) => Err(StoreError::unavailable(e)),
        }
    }

    async fn fetch_many(&self, paths: &[String]) -> Result<HashMap<String, String>, StoreError> {
        let mut found = HashMap::with_capacity(paths.len());

        for batch in paths.chunks(FETCH_BATCH) {
            let mut query: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT path, content FROM files WHERE path IN (");
            let mut separated = query.separated(", ");
            for path in batch {
                separated.push_bind(path.as_str());
            }
            separated.push_unseparated(")");

            let rows = query
                .build()
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::unavailable)?;

            for row in rows {
                found.insert(row.get("path"), row.get("content"));
            }
        }

        Ok(found)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::unavailable)?;
        Ok(n.max(0) as u64)
    }
}
