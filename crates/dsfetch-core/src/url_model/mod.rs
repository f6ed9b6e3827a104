//! Destination resolution: URL → local file path.
//!
//! Every component that asks "is this URL already downloaded?" goes through
//! [`resolve`], so the orchestrator, reconciliation and the retry pass agree.
//!
//! Only the final path segment is used. Two distinct URLs that end in the same
//! segment (e.g. `https://a/x/img.jpg` and `https://b/y/img.jpg?v=2`) resolve to
//! the same file: whichever transfer completes last owns the file, and once it
//! exists both URLs count as present. Consumers of the dataset rely on this
//! naming, so it is kept rather than disambiguated.

mod path;

use std::path::{Path, PathBuf};

pub use path::final_segment;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot derive a filename from URL: {url}")]
pub struct ResolveError {
    pub url: String,
}

/// Maps `url` to its destination path under `dir`.
///
/// # Examples
///
/// - `resolve("https://h/images/abc.jpg?x=1", "/data")` → `/data/abc.jpg`
/// - `resolve("https://h/", "/data")` → `Err(ResolveError)`
pub fn resolve(url: &str, dir: &Path) -> Result<PathBuf, ResolveError> {
    final_segment(url)
        .map(|name| dir.join(name))
        .ok_or_else(|| ResolveError {
            url: url.to_string(),
        })
}
