//! Core data models used throughout Code Snapshot.
//!
//! These types represent the stored files and the reports that flow
//! through the ingestion and retrieval pipeline.

use serde::Serialize;

/// A file persisted in the store, keyed uniquely by its canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Opaque store-assigned identifier.
    pub id: String,
    /// Canonical path relative to the ingestion root.
    pub path: String,
    /// Full text content at ingestion time.
    pub content: String,
    /// Unix timestamp (seconds) of the insert.
    pub ingested_at: i64,
}

impl StoredFile {
    /// Build a new row with a fresh id, stamped with the current time.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path: path.into(),
            content: content.into(),
            ingested_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// A directory entry the tree walker skipped instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkDiagnostic {
    pub path: String,
    pub reason: String,
}

/// A candidate file that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub reason: String,
}

/// Tally of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: u64,
    pub skipped_duplicate: u64,
    pub failed: Vec<FailedFile>,
    pub walk_skipped: Vec<WalkDiagnostic>,
}
