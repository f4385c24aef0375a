//! Storage abstraction for Code Snapshot.
//!
//! The [`FileStore`] trait defines the handful of operations the ingestion
//! and retrieval engines need, enabling pluggable backends (SQLite,
//! in-memory).
//!
//! The store, not the engines, is the authority on path uniqueness: a second
//! insert for an already-present path must come back as
//! [`InsertOutcome::AlreadyPresent`], never as an error.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::StoredFile;

/// Result of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The path was already stored; nothing was written.
    AlreadyPresent,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn unavailable<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError::Unavailable(err.into())
    }
}

/// Abstract storage backend for stored files.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`contains`](FileStore::contains) | Existence pre-check by canonical path |
/// | [`insert`](FileStore::insert) | Atomic insert-if-absent |
/// | [`fetch_many`](FileStore::fetch_many) | Batch lookup of contents by path |
/// | [`count`](FileStore::count) | Number of stored files |
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Whether a file with this canonical path is stored.
    async fn contains(&self, path: &str) -> Result<bool, StoreError>;

    /// Insert `file` unless its path is already present.
    async fn insert(&self, file: &StoredFile) -> Result<InsertOutcome, StoreError>;

    /// Contents for every requested path that is stored, keyed by path.
    /// Missing paths are simply absent from the map.
    async fn fetch_many(&self, paths: &[String]) -> Result<HashMap<String, String>, StoreError>;

    /// Total number of stored files.
    async fn count(&self) -> Result<u64, StoreError>;
}
