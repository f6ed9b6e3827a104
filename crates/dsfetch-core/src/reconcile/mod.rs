//! Reconciliation: what is still missing, computed from the filesystem alone.
//!
//! The result depends only on the manifest and the directory contents, never
//! on what a previous pass believed it downloaded. That makes it correct after
//! a crash, on a cold resume, or when no pass ran at all.

pub mod artifact;

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::manifest::{read_manifest, ManifestError};
use crate::storage;
use crate::url_model;

pub use artifact::{FAILURE_LIST, MISSING_LIST};

/// URLs whose destination is not a regular file, in manifest order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MissingSet {
    urls: Vec<String>,
}

impl MissingSet {
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }
}

/// Returns every URL in `urls` whose resolved destination under `dir` is not a
/// regular file. URLs that cannot be resolved are always missing.
pub fn reconcile(urls: &[String], dir: &Path) -> MissingSet {
    let mut seen = HashSet::with_capacity(urls.len());
    let mut missing = Vec::new();
    for url in urls {
        if !seen.insert(url.as_str()) {
            continue;
        }
        let present = url_model::resolve(url, dir)
            .map(|dest| storage::is_present(&dest))
            .unwrap_or(false);
        if !present {
            missing.push(url.clone());
        }
    }
    MissingSet { urls: missing }
}

/// Reads the manifest at `manifest` (first `limit` URLs, 0 = all) and reconciles it against `dir`.
///
/// An absent manifest means the split was not requested: the result is empty
/// and any stale missing list in `dir` is removed.
pub fn reconcile_manifest(
    manifest: &Path,
    limit: usize,
    dir: &Path,
) -> Result<MissingSet, ManifestError> {
    match read_manifest(manifest, limit) {
        Ok(m) => Ok(reconcile(m.urls(), dir)),
        Err(e) if e.is_not_found() => {
            if let Err(err) = artifact::remove_artifact(dir, MISSING_LIST) {
                tracing::warn!(dir = %dir.display(), "could not clear missing list: {}", err);
            }
            Ok(MissingSet::default())
        }
        Err(e) => Err(e),
    }
}
