//! Batch resolution of relative paths to stored contents.
//!
//! Used by the `snap get` CLI command, `POST /files/resolve`, and any
//! embedding application that needs file contents for a set of paths.
//! Missing paths are part of a successful answer, never an error.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::path::canonical_request;
use crate::store::{FileStore, StoreError};

/// Outcome of resolving a set of paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Canonical path → content, one entry per requested path that is stored.
    pub found: BTreeMap<String, String>,
    /// Requested paths with no stored file, including ones that could not be
    /// canonicalized (kept verbatim).
    pub not_found: BTreeSet<String>,
}

/// Resolve `paths` against `store`.
///
/// Requested paths are canonicalized the same way ingested paths are, so
/// `./src/a.py` and `src\a.py` both find `src/a.py`. Keys in the result
/// use the canonical spelling.
pub async fn resolve<I, S>(
    store: &dyn FileStore,
    paths: I,
    case_fold: bool,
) -> Result<Resolution, StoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut resolution = Resolution::default();
    let mut wanted = BTreeSet::new();
    for raw in paths {
        let raw = raw.as_ref();
        match canonical_request(raw, case_fold) {
            Ok(path) => {
                wanted.insert(path);
            }
            Err(_) => {
                resolution.not_found.insert(raw.to_string());
            }
        }
    }

    if wanted.is_empty() {
        return Ok(resolution);
    }

    let wanted: Vec<String> = wanted.into_iter().collect();
    let mut contents = store.fetch_many(&wanted).await?;

    for path in wanted {
        match contents.remove(&path) {
            Some(content) => {
                resolution.found.insert(path, content);
            }
            None => {
                resolution.not_found.insert(path);
            }
        }
    }

    Ok(resolution)
}
