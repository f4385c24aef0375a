//! Path canonicalization.
//!
//! Every path that reaches the store goes through [`canonical_relative`]
//! (ingestion) or [`canonical_request`] (retrieval), so both sides agree on
//! one spelling per logical file: forward slashes, no `.` or empty segments,
//! and optionally lowercase.

use std::path::{Component, Path};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("{path} is not under root {root}")]
    OutsideRoot { path: String, root: String },
    #[error("{0} contains a parent-directory segment")]
    ParentSegment(String),
    #[error("{0} is not valid UTF-8")]
    NotUtf8(String),
    #[error("path is empty")]
    Empty,
}

/// Render a path with `/` separators for glob matching.
///
/// Backslashes are only rewritten where they are the platform separator;
/// on Unix a backslash is an ordinary file name character.
pub fn slash_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '\\' {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Compute the canonical store key of `path` relative to `root`.
pub fn canonical_relative(root: &Path, path: &Path, case_fold: bool) -> Result<String, PathError> {
    let relative = path.strip_prefix(root).map_err(|_| PathError::OutsideRoot {
        path: path.display().to_string(),
        root: root.display().to_string(),
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| PathError::NotUtf8(relative.display().to_string()))?;
                segments.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(PathError::ParentSegment(relative.display().to_string()))
            }
            Component::RootDir | Component::Prefix(_) => {}
        }
    }

    finish(segments.join("/"), case_fold)
}

/// Canonicalize a caller-supplied relative path string.
///
/// Splits on `/`, and on `\` only where it is the platform separator, so a
/// request names the same key [`canonical_relative`] produced for the file.
/// Drops `.` and empty segments and rejects `..`.
pub fn canonical_request(raw: &str, case_fold: bool) -> Result<String, PathError> {
    let mut segments = Vec::new();
    for part in raw.split(is_separator) {
        match part {
            "" | "." => {}
            ".." => return Err(PathError::ParentSegment(raw.to_string())),
            other => segments.push(other),
        }
    }
    finish(segments.join("/"), case_fold)
}

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

fn finish(joined: String, case_fold: bool) -> Result<String, PathError> {
    if joined.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(if case_fold {
        joined.to_lowercase()
    } else {
        joined
    })
}
