//! In-memory [`FileStore`] implementation for tests and embedding.
//!
//! Uses a `HashMap` keyed by path behind `std::sync::RwLock`. Insert takes
//! the write lock for the whole check-and-set, so concurrent inserters see
//! exactly one winner per path.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::StoredFile;

use super::{FileStore, InsertOutcome, StoreError};

/// In-memory store.
pub struct InMemoryFileStore {
    files: RwLock<HashMap<String, StoredFile>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of one stored row, for assertions.
    pub fn get(&self, path: &str) -> Option<StoredFile> {
        self.files.read().ok()?.get(path).cloned()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = match self.files.read() {
            Ok(files) => files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        paths.sort();
        paths
    }
}

impl Default for InMemoryFileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::unavailable("in-memory store lock poisoned")
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn contains(&self, path: &str) -> Result<bool, StoreError> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files.contains_key(path))
    }

    async fn insert(&self, file: &StoredFile) -> Result<InsertOutcome, StoreError> {
        let mut files = self.files.write().map_err(poisoned)?;
        match files.entry(file.path.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyPresent),
            Entry::Vacant(slot) => {
                slot.insert(file.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn fetch_many(&self, paths: &[String]) -> Result<HashMap<String, String>, StoreError> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(paths
            .iter()
            .filter_map(|p| files.get(p).map(|f| (p.clone(), f.content.clone())))
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files.len() as u64)
    }
}
