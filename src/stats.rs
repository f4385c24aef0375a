//! Store statistics.
//!
//! A quick summary of what has been snapshotted: file count, total content
//! size, database size, and when the last file was ingested.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::sqlite_store::SqliteFileStore;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteFileStore::open(config).await?;
    let row = sqlx::query(
        "SELECT COUNT(*) AS files, COALESCE(SUM(LENGTH(CAST(content AS BLOB))), 0) AS bytes, MAX(ingested_at) AS last FROM files",
    )
    .fetch_one(store.pool())
    .await;
    store.close().await;
    let row = row?;

    let files: i64 = row.get("files");
    let content_bytes: i64 = row.get("bytes");
    let last_ingest: Option<i64> = row.get("last");

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Code Snapshot — Store Stats");
    println!("===========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Files:       {}", files);
    println!("  Content:     {}", format_bytes(content_bytes.max(0) as u64));
    println!(
        "  Last ingest: {}",
        match last_ingest {
            Some(ts) => format_ts_relative(ts),
            None => "never".to_string(),
        }
    );
    println!();

    Ok(())
}

/// Human-readable byte count, binary units.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// "3 hours ago" for the last month, an absolute date beyond that or for
/// timestamps in the future.
fn format_ts_relative(ts: i64) -> String {
    const STEPS: [(i64, &str); 3] = [(86_400, "day"), (3_600, "hour"), (60, "min")];

    let delta = chrono::Utc::now().timestamp() - ts;
    if !(0..86_400 * 30).contains(&delta) {
        return format_ts_iso(ts);
    }
    for (secs, unit) in STEPS {
        let n = delta / secs;
        if n > 0 {
            let plural = if n == 1 { "" } else { "s" };
            return format!("{} {}{} ago", n, unit, plural);
        }
    }
    "just now".to_string()
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
