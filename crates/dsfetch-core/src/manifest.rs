//! Manifest reading: newline-delimited URL lists.
//!
//! Accepts plain `url` lines and the `reason<TAB>url` lines written to the
//! failure artifact, so a failure list can be passed straight back in.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Ordered URLs of one split, read once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    urls: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("no URLs parsed from manifest: {}", .0.display())]
    Empty(PathBuf),
    #[error("failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ManifestError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ManifestError::NotFound(_))
    }
}

impl Manifest {
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Extracts the URL from one manifest line, or None for blank and comment lines.
fn parse_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let url = line.rsplit('\t').next().unwrap_or(line).trim();
    if url.is_empty() {
        None
    } else {
        Some(url)
    }
}

/// Reads `path` into a manifest, keeping at most `limit` URLs (0 = all).
///
/// A missing file is `ManifestError::NotFound`; callers treat that as an
/// optional split that was not requested.
pub fn read_manifest(path: &Path, limit: usize) -> Result<Manifest, ManifestError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ManifestError::NotFound(path.to_path_buf())
        } else {
            ManifestError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut urls = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(url) = parse_line(&line) {
            urls.push(url.to_string());
            if limit > 0 && urls.len() >= limit {
                break;
            }
        }
    }

    if urls.is_empty() {
        return Err(ManifestError::Empty(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), count = urls.len(), "manifest loaded");
    Ok(Manifest { urls })
}
