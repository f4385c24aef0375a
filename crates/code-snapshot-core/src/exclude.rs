//! Glob-based path exclusion.
//!
//! A path is excluded when the whole path, or its final segment alone,
//! matches any configured pattern. Patterns are compiled once into a
//! [`GlobSet`] when the pipeline starts.
//!
//! # Pattern syntax
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `*` | Any run of characters, **including** `/` |
//! | `?` | Exactly one character |
//! | `[abc]`, `[!abc]` | Character class / negated class |
//!
//! Matching is case-sensitive and unanchored beyond what the pattern
//! spells out, so `*/vendor/*` matches `/r/vendor/x.py` and `*.log` matches
//! `/r/deep/nested/app.log` through its basename.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use thiserror::Error;

use crate::path::slash_path;

/// Exclusion patterns applied when none are configured.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "*/node_modules/*",
    "*/.git/*",
    "*/vendor/*",
    "*/storage/*",
    "*.txt",
    "*.json",
    "*.lock",
    "*.log",
    "*.env*",
    "*.neon",
    "*.gz",
    "*.md",
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.DS_Store*",
    "*/migrations/*",
    "*/seeders/*",
];

#[derive(Debug, Error)]
#[error("invalid exclude pattern '{pattern}': {source}")]
pub struct ExcludeError {
    pub pattern: String,
    #[source]
    pub source: globset::Error,
}

/// Compiled, immutable set of exclusion patterns.
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    set: GlobSet,
    /// Patterns ending in `*`, whose match on `dir/` carries over to every
    /// path below `dir`.
    dir_set: GlobSet,
    patterns: Vec<String>,
}

impl ExclusionMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self, ExcludeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut dir_builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            // `vendor/` names the directory `vendor`.
            let trimmed = match pattern.trim_end_matches('/') {
                "" => pattern,
                t => t,
            };
            let glob = GlobBuilder::new(trimmed)
                .literal_separator(false)
                .case_insensitive(false)
                .backslash_escape(false)
                .build()
                .map_err(|source| ExcludeError {
                    pattern: pattern.to_string(),
                    source,
                })?;
            if trimmed.ends_with('*') {
                dir_builder.add(glob.clone());
            }
            builder.add(glob);
            kept.push(pattern.to_string());
        }
        let set = builder.build().map_err(|source| ExcludeError {
            pattern: kept.join(", "),
            source,
        })?;
        let dir_set = dir_builder.build().map_err(|source| ExcludeError {
            pattern: kept.join(", "),
            source,
        })?;
        Ok(Self {
            set,
            dir_set,
            patterns: kept,
        })
    }

    /// Matcher that excludes nothing.
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            dir_set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True if `path` or its basename matches any pattern.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.is_excluded_str(&slash_path(path))
    }

    /// Same as [`is_excluded`](Self::is_excluded) for a slash-separated string.
    pub fn is_excluded_str(&self, path: &str) -> bool {
        if self.set.is_empty() {
            return false;
        }
        if self.set.is_match(path) {
            return true;
        }
        match basename(path) {
            Some(name) => self.set.is_match(name),
            None => false,
        }
    }

    /// Directory check used for pruning.
    ///
    /// Also tries the path with a trailing `/` against patterns ending in
    /// `*`, so that `*/vendor/*` prunes the `vendor` directory itself rather
    /// than only the files inside it. Any such match also covers every file
    /// below the directory, so pruning never drops a file the per-file check
    /// would keep.
    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        self.is_excluded_dir_str(&slash_path(path))
    }

    /// Same as [`is_excluded_dir`](Self::is_excluded_dir) for a slash-separated string.
    pub fn is_excluded_dir_str(&self, path: &str) -> bool {
        if self.is_excluded_str(path) {
            return true;
        }
        !self.dir_set.is_empty()
            && self
                .dir_set
                .is_match(format!("{}/", path.trim_end_matches('/')))
    }
}

fn basename(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
}
