//! End-to-end properties of the walk → ingest → resolve pipeline, run
//! against both the in-memory and the SQLite store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use code_snapshot::config::Config;
use code_snapshot::ingest::{ingest, IngestError, IngestOptions};
use code_snapshot::progress::NoProgress;
use code_snapshot::sqlite_store::SqliteFileStore;
use code_snapshot::walker::TreeWalker;
use code_snapshot_core::exclude::ExclusionMatcher;
use code_snapshot_core::models::{IngestReport, StoredFile};
use code_snapshot_core::retrieve::resolve;
use code_snapshot_core::store::memory::InMemoryFileStore;
use code_snapshot_core::store::{FileStore, InsertOutcome, StoreError};
use tempfile::TempDir;

fn tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, content) in files {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
    }
    tmp
}

async fn walk_and_ingest(
    store: &dyn FileStore,
    root: &Path,
    patterns: &[&str],
) -> IngestReport {
    let matcher = ExclusionMatcher::new(patterns).unwrap();
    let walk = TreeWalker::new(&matcher).walk(root);
    ingest(store, root, walk, &IngestOptions::default(), &NoProgress)
        .await
        .unwrap()
}

async fn sqlite_store(tmp: &TempDir) -> SqliteFileStore {
    let config = Config::minimal(tmp.path().join("data").join("snap.sqlite"));
    SqliteFileStore::open(&config).await.unwrap()
}

#[tokio::test]
async fn pruned_vendor_directory_is_never_ingested() {
    let tmp = tree(&[("vendor/x.py", "x"), ("src/a.py", "a")]);
    let store = InMemoryFileStore::new();

    let report = walk_and_ingest(&store, tmp.path(), &["*/vendor/*"]).await;

    assert_eq!(report.inserted, 1);
    assert_eq!(store.paths(), vec!["src/a.py"]);
}

#[tokio::test]
async fn basename_pattern_excludes_deeply_nested_file() {
    let tmp = tree(&[("deep/nested/app.log", "log"), ("deep/nested/app.py", "py")]);
    let store = InMemoryFileStore::new();

    walk_and_ingest(&store, tmp.path(), &["*.log"]).await;

    assert_eq!(store.paths(), vec!["deep/nested/app.py"]);
}

#[tokio::test]
async fn second_run_over_unchanged_tree_inserts_nothing() {
    let tmp = tree(&[("a.py", "a"), ("src/b.py", "b"), ("src/lib/c.py", "c")]);
    let store = InMemoryFileStore::new();

    let first = walk_and_ingest(&store, tmp.path(), &[]).await;
    let second = walk_and_ingest(&store, tmp.path(), &[]).await;

    assert_eq!(first.inserted, 3);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_duplicate, 3);
    assert!(second.failed.is_empty());
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn stored_content_is_never_overwritten() {
    let tmp = tree(&[("a.py", "original")]);
    let store = InMemoryFileStore::new();

    walk_and_ingest(&store, tmp.path(), &[]).await;
    fs::write(tmp.path().join("a.py"), "changed").unwrap();
    let report = walk_and_ingest(&store, tmp.path(), &[]).await;

    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(store.get("a.py").unwrap().content, "original");
}

#[tokio::test]
async fn unreadable_file_is_isolated() {
    // Invalid UTF-8 cannot be read as text, whatever user runs the test.
    let tmp = tree(&[("1_first.py", "first"), ("3_third.py", "third")]);
    fs::write(tmp.path().join("2_second.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
    let store = InMemoryFileStore::new();

    let report = walk_and_ingest(&store, tmp.path(), &[]).await;

    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "2_second.bin");
    assert_eq!(store.get("3_third.py").unwrap().content, "third");
}

#[tokio::test]
async fn vanished_file_is_recorded_as_failed() {
    let tmp = tree(&[("a.py", "a")]);
    let store = InMemoryFileStore::new();
    let candidates = vec![tmp.path().join("a.py"), tmp.path().join("gone.py")];

    let report = ingest(
        &store,
        tmp.path(),
        candidates,
        &IngestOptions::default(),
        &NoProgress,
    )
    .await
    .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "gone.py");
}

#[tokio::test]
async fn candidate_outside_root_is_recorded_as_failed() {
    let tmp = tree(&[("root/a.py", "a"), ("other/b.py", "b")]);
    let store = InMemoryFileStore::new();
    let root = tmp.path().join("root");
    let candidates = vec![root.join("a.py"), tmp.path().join("other").join("b.py")];

    let report = ingest(&store, &root, candidates, &IngestOptions::default(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(store.paths(), vec!["a.py"]);
}

#[tokio::test]
async fn case_folding_collapses_paths_differing_only_by_case() {
    let tmp = tree(&[("Src/Main.py", "main")]);
    let store = InMemoryFileStore::new();
    let options = IngestOptions {
        case_fold_paths: true,
    };
    let matcher = ExclusionMatcher::empty();

    ingest(
        &store,
        tmp.path(),
        TreeWalker::new(&matcher).walk(tmp.path()),
        &options,
        &NoProgress,
    )
    .await
    .unwrap();

    assert_eq!(store.paths(), vec!["src/main.py"]);
    let res = resolve(&store, ["SRC/MAIN.PY"], true).await.unwrap();
    assert_eq!(res.found["src/main.py"], "main");
}

#[tokio::test]
async fn default_config_stores_one_row_per_case_insensitive_path() {
    let upper = tree(&[("Src/Main.py", "upper")]);
    let lower = tree(&[("src/main.py", "lower")]);
    let db = TempDir::new().unwrap();
    let config = Config::minimal(db.path().join("snap.sqlite"));
    let store = SqliteFileStore::open(&config).await.unwrap();
    let options = IngestOptions {
        case_fold_paths: config.ingest.case_fold_paths,
    };
    let matcher = config.matcher().unwrap();

    let mut reports = Vec::new();
    for root in [upper.path(), lower.path()] {
        let walk = TreeWalker::new(&matcher).walk(root);
        reports.push(ingest(&store, root, walk, &options, &NoProgress).await.unwrap());
    }

    assert_eq!(reports[0].inserted, 1);
    assert_eq!(reports[1].inserted, 0);
    assert_eq!(reports[1].skipped_duplicate, 1);
    assert_eq!(store.count().await.unwrap(), 1);
    let res = resolve(&store, ["SRC/main.PY"], config.ingest.case_fold_paths)
        .await
        .unwrap();
    assert_eq!(res.found["src/main.py"], "upper");

    store.close().await;
}

#[cfg(unix)]
#[tokio::test]
async fn backslash_in_file_name_resolves_to_the_stored_key() {
    let tmp = tree(&[("a\\b.py", "odd")]);
    let store = InMemoryFileStore::new();

    walk_and_ingest(&store, tmp.path(), &[]).await;
    let stored = store.paths();
    assert_eq!(stored, vec!["a\\b.py"]);

    let res = resolve(&store, &stored, true).await.unwrap();
    assert_eq!(res.found["a\\b.py"], "odd");
    assert!(res.not_found.is_empty());
}

#[tokio::test]
async fn concurrent_ingesters_never_duplicate() {
    let files: Vec<(String, String)> = (0..40)
        .map(|i| (format!("pkg{}/mod{}.py", i % 4, i), format!("# {}", i)))
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    let tmp = tree(&refs);
    let store = InMemoryFileStore::new();

    let (a, b) = tokio::join!(
        walk_and_ingest(&store, tmp.path(), &[]),
        walk_and_ingest(&store, tmp.path(), &[]),
    );

    assert_eq!(a.inserted + b.inserted, 40);
    assert_eq!(a.skipped_duplicate + b.skipped_duplicate, 40);
    assert!(a.failed.is_empty() && b.failed.is_empty());
    assert_eq!(store.count().await.unwrap(), 40);
}

/// Store that reports a path as absent even when it is stored, so every
/// duplicate has to be caught by the insert itself.
struct BlindPrecheck(InMemoryFileStore);

#[async_trait]
impl FileStore for BlindPrecheck {
    async fn contains(&self, _path: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn insert(&self, file: &StoredFile) -> Result<InsertOutcome, StoreError> {
        self.0.insert(file).await
    }
    async fn fetch_many(&self, paths: &[String]) -> Result<HashMap<String, String>, StoreError> {
        self.0.fetch_many(paths).await
    }
    async fn count(&self) -> Result<u64, StoreError> {
        self.0.count().await
    }
}

#[tokio::test]
async fn rejected_insert_counts_as_duplicate_not_failure() {
    let tmp = tree(&[("a.py", "a"), ("b.py", "b")]);
    let store = BlindPrecheck(InMemoryFileStore::new());

    walk_and_ingest(&store, tmp.path(), &[]).await;
    let second = walk_and_ingest(&store, tmp.path(), &[]).await;

    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_duplicate, 2);
    assert!(second.failed.is_empty());
}

/// Store whose inserts start failing after a fixed number of successes.
struct FailingStore {
    inner: InMemoryFileStore,
    inserts_left: AtomicU64,
}

#[async_trait]
impl FileStore for FailingStore {
    async fn contains(&self, path: &str) -> Result<bool, StoreError> {
        self.inner.contains(path).await
    }
    async fn insert(&self, file: &StoredFile) -> Result<InsertOutcome, StoreError> {
        if self.inserts_left.load(Ordering::SeqCst) == 0 {
            return Err(StoreError::unavailable("connection lost"));
        }
        self.inserts_left.fetch_sub(1, Ordering::SeqCst);
        self.inner.insert(file).await
    }
    async fn fetch_many(&self, paths: &[String]) -> Result<HashMap<String, String>, StoreError> {
        self.inner.fetch_many(paths).await
    }
    async fn count(&self) -> Result<u64, StoreError> {
        self.inner.count().await
    }
}

#[tokio::test]
async fn store_outage_stops_the_run_but_keeps_prior_inserts() {
    let tmp = tree(&[("a.py", "a"), ("b.py", "b"), ("c.py", "c"), ("d.py", "d")]);
    let store = FailingStore {
        inner: InMemoryFileStore::new(),
        inserts_left: AtomicU64::new(2),
    };
    let matcher = ExclusionMatcher::empty();

    let err = ingest(
        &store,
        tmp.path(),
        TreeWalker::new(&matcher).walk(tmp.path()),
        &IngestOptions::default(),
        &NoProgress,
    )
    .await
    .unwrap_err();

    let IngestError::StoreUnavailable { report, .. } = err;
    assert_eq!(report.inserted, 2);
    assert!(report.failed.is_empty());
    assert_eq!(store.inner.paths(), vec!["a.py", "b.py"]);
}

#[tokio::test]
async fn sqlite_store_round_trip_with_partial_resolution() {
    let tmp = tree(&[("files/a.py", "print('a')"), ("files/src/b.py", "print('b')")]);
    let root: PathBuf = tmp.path().join("files");
    let store = sqlite_store(&tmp).await;

    let first = walk_and_ingest(&store, &root, &[]).await;
    let second = walk_and_ingest(&store, &root, &[]).await;
    assert_eq!(first.inserted, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_duplicate, 2);
    assert_eq!(store.count().await.unwrap(), 2);

    let res = resolve(&store, ["a.py", "missing.py"], false).await.unwrap();
    assert_eq!(res.found.len(), 1);
    assert_eq!(res.found["a.py"], "print('a')");
    assert_eq!(
        res.not_found.iter().cloned().collect::<Vec<_>>(),
        vec!["missing.py".to_string()]
    );

    let empty = resolve(&store, Vec::<String>::new(), false).await.unwrap();
    assert!(empty.found.is_empty() && empty.not_found.is_empty());

    store.close().await;
}

#[tokio::test]
async fn sqlite_unique_constraint_is_reported_as_already_present() {
    let tmp = TempDir::new().unwrap();
    let store = sqlite_store(&tmp).await;

    let first = store.insert(&StoredFile::new("a.py", "one")).await.unwrap();
    let second = store.insert(&StoredFile::new("a.py", "two")).await.unwrap();

    assert_eq!(first, InsertOutcome::Inserted);
    assert_eq!(second, InsertOutcome::AlreadyPresent);
    let found = store.fetch_many(&["a.py".to_string()]).await.unwrap();
    assert_eq!(found["a.py"], "one");

    store.close().await;
}

#[tokio::test]
async fn sqlite_fetch_many_spans_multiple_batches() {
    let tmp = TempDir::new().unwrap();
    let store = sqlite_store(&tmp).await;
    for i in 0..1200 {
        store
            .insert(&StoredFile::new(format!("f{}.py", i), format!("{}", i)))
            .await
            .unwrap();
    }

    let wanted: Vec<String> = (0..1300).map(|i| format!("f{}.py", i)).collect();
    let res = resolve(&store, &wanted, false).await.unwrap();

    assert_eq!(res.found.len(), 1200);
    assert_eq!(res.not_found.len(), 100);
    assert_eq!(res.found["f1199.py"], "1199");

    store.close().await;
}
