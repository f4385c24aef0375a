//! Ingestion pipeline orchestration.
//!
//! Coordinates the full ingest flow: walk → canonicalize → existence check →
//! read → insert. Files already present in the store are skipped without
//! being read, so re-running over an unchanged tree performs no writes.
//!
//! Per-file problems (unreadable file, invalid UTF-8, path outside the root)
//! are recorded in the [`IngestReport`] and the batch continues. Only a
//! store failure stops the run, and even then rows inserted so far stay.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use code_snapshot_core::models::{FailedFile, IngestReport, StoredFile};
use code_snapshot_core::path::canonical_relative;
use code_snapshot_core::store::{FileStore, InsertOutcome, StoreError};

use crate::config::Config;
use crate::progress::{IngestProgressEvent, IngestProgressReporter};
use crate::sqlite_store::SqliteFileStore;
use crate::walker::TreeWalker;

/// Emit an `Ingesting` progress event every this many candidates.
const PROGRESS_EVERY: u64 = 100;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The store failed mid-batch. `report` holds what was done before.
    #[error("store became unavailable after {} files were inserted: {source}", .report.inserted)]
    StoreUnavailable {
        #[source]
        source: StoreError,
        report: Box<IngestReport>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Lowercase canonical paths before storing them.
    pub case_fold_paths: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            case_fold_paths: true,
        }
    }
}

/// Ingest `candidates` (absolute paths under `root`) into `store`.
///
/// Candidates are processed strictly in order. Accepts any iterator, so a
/// [`Walk`](crate::walker::Walk) can be fed in lazily.
pub async fn ingest<I>(
    store: &dyn FileStore,
    root: &Path,
    candidates: I,
    options: &IngestOptions,
    progress: &dyn IngestProgressReporter,
) -> Result<IngestReport, IngestError>
where
    I: IntoIterator<Item = PathBuf>,
{
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let candidates = candidates.into_iter();
    let total = match candidates.size_hint() {
        (lower, Some(upper)) if lower == upper => Some(lower as u64),
        _ => None,
    };

    let mut report = IngestReport::default();
    let mut n = 0u64;

    for path in candidates {
        if let Err(source) = ingest_one(store, &root, &path, options, &mut report).await {
            tracing::error!(error = %source, "store unavailable, stopping ingestion");
            return Err(IngestError::StoreUnavailable {
                source,
                report: Box::new(report),
            });
        }

        n += 1;
        if n % PROGRESS_EVERY == 0 || Some(n) == total {
            progress.report(IngestProgressEvent::Ingesting { n, total });
        }
    }

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped_duplicate,
        failed = report.failed.len(),
        "ingestion finished"
    );

    Ok(report)
}

async fn ingest_one(
    store: &dyn FileStore,
    root: &Path,
    path: &Path,
    options: &IngestOptions,
    report: &mut IngestReport,
) -> Result<(), StoreError> {
    let relative = match canonical_relative(root, path, options.case_fold_paths) {
        Ok(relative) => relative,
        Err(e) => {
            record_failure(report, path.display().to_string(), e.to_string());
            return Ok(());
        }
    };

    if store.contains(&relative).await? {
        tracing::debug!(path = %relative, "already stored, skipping");
        report.skipped_duplicate += 1;
        return Ok(());
    }

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            record_failure(report, relative, e.to_string());
            return Ok(());
        }
    };

    match store.insert(&StoredFile::new(relative.clone(), content)).await? {
        InsertOutcome::Inserted => {
            tracing::debug!(path = %relative, "inserted");
            report.inserted += 1;
        }
        InsertOutcome::AlreadyPresent => {
            // Lost a race with another ingester between the check and the insert.
            tracing::debug!(path = %relative, "inserted concurrently elsewhere, skipping");
            report.skipped_duplicate += 1;
        }
    }

    Ok(())
}

fn record_failure(report: &mut IngestReport, path: String, reason: String) {
    tracing::warn!(%path, %reason, "failed to ingest file");
    report.failed.push(FailedFile { path, reason });
}

/// CLI flags for `snap ingest`.
#[derive(Debug, Clone, Default)]
pub struct IngestArgs {
    pub root: Option<PathBuf>,
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub json: bool,
}

/// CLI entry point: walk the configured root, ingest into SQLite, print
/// the report to stdout.
pub async fn run_ingest(
    config: &Config,
    args: &IngestArgs,
    progress: &dyn IngestProgressReporter,
) -> Result<IngestReport> {
    let root = config.ingest_root(args.root.as_deref())?;
    let root = std::path::absolute(&root).unwrap_or(root);
    let matcher = config.matcher()?;
    tracing::debug!(patterns = ?matcher.patterns(), "exclusion patterns");

    progress.report(IngestProgressEvent::Discovering {
        root: root.display().to_string(),
    });

    let walker = TreeWalker::new(&matcher).follow_symlinks(config.ingest.follow_symlinks);
    let mut walk = walker.walk(&root);
    let mut candidates: Vec<PathBuf> = walk.by_ref().collect();
    let walk_skipped = walk.into_diagnostics();
    if let Some(limit) = args.limit {
        candidates.truncate(limit);
    }
    tracing::info!(root = %root.display(), files = candidates.len(), "walk finished");

    if args.dry_run {
        print_dry_run(&root, &candidates, args.json)?;
        return Ok(IngestReport {
            walk_skipped,
            ..IngestReport::default()
        });
    }

    let options = IngestOptions {
        case_fold_paths: config.ingest.case_fold_paths,
    };
    let found = candidates.len();

    let store = SqliteFileStore::open(config).await?;
    let result = ingest(&store, &root, candidates, &options, progress).await;
    store.close().await;

    match result {
        Ok(mut report) => {
            report.walk_skipped = walk_skipped;
            print_report(&root, found, &report, args.json, true)?;
            Ok(report)
        }
        Err(IngestError::StoreUnavailable { source, mut report }) => {
            report.walk_skipped = walk_skipped;
            print_report(&root, found, &report, args.json, false)?;
            Err(IngestError::StoreUnavailable { source, report }.into())
        }
    }
}

fn print_dry_run(root: &Path, candidates: &[PathBuf], json: bool) -> Result<()> {
    let relative: Vec<String> = candidates
        .iter()
        .map(|p| crate::walker::anchored(root, p).trim_start_matches('/').to_string())
        .collect();

    if json {
        let obj = serde_json::json!({
            "dry_run": true,
            "root": root.display().to_string(),
            "files": relative,
        });
        println!("{}", serde_json::to_string_pretty(&obj)?);
        return Ok(());
    }

    println!("ingest {} (dry-run)", root.display());
    println!("  files found: {}", relative.len());
    for path in &relative {
        println!("    {}", path);
    }
    Ok(())
}

fn print_report(
    root: &Path,
    found: usize,
    report: &IngestReport,
    json: bool,
    complete: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("ingest {}", root.display());
    println!("  files found: {}", found);
    println!("  inserted: {}", report.inserted);
    println!("  skipped (already stored): {}", report.skipped_duplicate);
    println!("  failed: {}", report.failed.len());
    for failure in &report.failed {
        println!("    {}: {}", failure.path, failure.reason);
    }
    if !report.walk_skipped.is_empty() {
        println!("  walk skipped: {}", report.walk_skipped.len());
        for entry in &report.walk_skipped {
            println!("    {}: {}", entry.path, entry.reason);
        }
    }
    if complete {
        println!("ok");
    } else {
        println!("aborted: store unavailable");
    }
    Ok(())
}
