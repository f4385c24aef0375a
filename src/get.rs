//! File retrieval by relative path.
//!
//! Resolves a set of relative paths to their stored contents. Used by both
//! the `snap get` CLI command and the `POST /files/resolve` HTTP endpoint.

use anyhow::Result;

use code_snapshot_core::retrieve::{resolve, Resolution};

use crate::config::Config;
use crate::sqlite_store::SqliteFileStore;

/// Open the store, resolve `paths`, close the store.
pub async fn get_files(config: &Config, paths: &[String]) -> Result<Resolution> {
    let store = SqliteFileStore::open(config).await?;
    let result = resolve(&store, paths, config.ingest.case_fold_paths).await;
    store.close().await;

    let resolution = result?;
    if !resolution.not_found.is_empty() {
        tracing::info!(
            missing = ?resolution.not_found,
            "some requested files are not in the store"
        );
    }
    Ok(resolution)
}

/// CLI entry point. Calls [`get_files`] and prints to stdout.
pub async fn run_get(config: &Config, paths: &[String], json: bool) -> Result<()> {
    let resolution = get_files(config, paths).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    for (path, content) in &resolution.found {
        println!("Filename: {}", path);
        println!("Content:");
        println!("{}", content);
        println!("{}", "-".repeat(40));
    }

    if !resolution.not_found.is_empty() {
        println!("Not found ({}):", resolution.not_found.len());
        for path in &resolution.not_found {
            println!("  {}", path);
        }
    }

    Ok(())
}
