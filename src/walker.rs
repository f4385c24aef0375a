//! Directory tree walker.
//!
//! Produces a lazy, deterministic (pre-order, sorted by file name) sequence
//! of absolute file paths under a root, consulting the
//! [`ExclusionMatcher`] for every entry. Entries are matched in root-anchored
//! form (`/src/a.py` for `<root>/src/a.py`), so where the root itself lives
//! on disk never influences what gets excluded:
//!
//! - directories are tested before descent and pruned whole when excluded,
//! - files are tested individually and dropped when excluded.
//!
//! Entries that cannot be visited (unreadable directories, broken or
//! unfollowed symlinks, loops) are recorded as [`WalkDiagnostic`]s and
//! skipped; the walk itself never fails.

use std::path::{Path, PathBuf};

use code_snapshot_core::exclude::ExclusionMatcher;
use code_snapshot_core::models::WalkDiagnostic;
use code_snapshot_core::path::slash_path;
use walkdir::{DirEntry, WalkDir};

/// Stateless walker configuration. Each call to [`walk`](Self::walk)
/// starts from scratch.
#[derive(Debug, Clone, Copy)]
pub struct TreeWalker<'m> {
    matcher: &'m ExclusionMatcher,
    follow_symlinks: bool,
}

impl<'m> TreeWalker<'m> {
    pub fn new(matcher: &'m ExclusionMatcher) -> Self {
        Self {
            matcher,
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn walk(&self, root: &Path) -> Walk<'m> {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let matcher = self.matcher;
        let prune_root = root.clone();

        let entries = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| keep_entry(matcher, &prune_root, entry));

        Walk {
            entries: Box::new(entries),
            matcher,
            root,
            diagnostics: Vec::new(),
        }
    }
}

/// `path` as matched against patterns: relative to `root`, with a leading `/`.
pub fn anchored(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => format!("/{}", slash_path(relative)),
        Err(_) => slash_path(path),
    }
}

fn keep_entry(matcher: &ExclusionMatcher, root: &Path, entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    if matcher.is_excluded_dir_str(&anchored(root, entry.path())) {
        tracing::debug!(path = %entry.path().display(), "pruned excluded directory");
        return false;
    }
    true
}

/// Iterator over the files of one walk.
pub struct Walk<'m> {
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'm>,
    matcher: &'m ExclusionMatcher,
    root: PathBuf,
    diagnostics: Vec<WalkDiagnostic>,
}

impl Walk<'_> {
    /// Entries skipped so far.
    pub fn diagnostics(&self) -> &[WalkDiagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<WalkDiagnostic> {
        self.diagnostics
    }

    fn skip(&mut self, path: String, reason: String) {
        tracing::warn!(%path, %reason, "skipping entry");
        self.diagnostics.push(WalkDiagnostic { path, reason });
    }
}

impl Iterator for Walk<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        continue;
                    }
                    if file_type.is_symlink() {
                        self.skip(
                            entry.path().display().to_string(),
                            "symbolic link not followed".to_string(),
                        );
                        continue;
                    }
                    if !file_type.is_file() {
                        self.skip(
                            entry.path().display().to_string(),
                            "not a regular file".to_string(),
                        );
                        continue;
                    }
                    if self
                        .matcher
                        .is_excluded_str(&anchored(&self.root, entry.path()))
                    {
                        continue;
                    }
                    return Some(entry.into_path());
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    self.skip(path, err.to_string());
                }
            }
        }
    }
}
