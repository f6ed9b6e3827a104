//! Single-item fetcher: one URL into one file.
//!
//! Used by the wide parallel pass and by the sequential retry pass. A URL whose
//! destination already exists is skipped without touching the network, which
//! is what makes re-running a split cheap.

mod http;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::retry::{run_with_retry, FetchError, RetryPolicy};
use crate::storage::{self, SpoolFile};
use crate::url_model;

pub use http::CurlTransport;

/// Per-attempt transfer options for the curl transport.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    /// Whole-request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

/// One HTTP GET attempt, streaming the body into `sink`.
///
/// Implementations return the number of body bytes written. They do not retry;
/// that is the fetcher's job.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already existed; no request was made.
    Skipped,
    Downloaded { bytes: u64 },
}

/// Transport plus retry policy. Cheap to clone and shared by all workers.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetcher backed by libcurl.
    pub fn curl(opts: CurlOptions, policy: RetryPolicy) -> Self {
        Self::new(Arc::new(CurlTransport::new(opts)), policy)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolves `url` under `dir` and fetches it. Blocking.
    pub fn fetch_into(&self, url: &str, dir: &Path) -> Result<FetchOutcome, FetchError> {
        let dest = url_model::resolve(url, dir)?;
        self.fetch(url, &dest)
    }

    /// Fetches `url` to `dest` unless `dest` is already a regular file. Blocking:
    /// sleeps between attempts according to the retry policy.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError> {
        if storage::is_present(dest) {
            return Ok(FetchOutcome::Skipped);
        }
        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        let bytes = run_with_retry(&self.policy, |attempt| {
            let res = self.attempt(url, dir, dest);
            if let Err(ref e) = res {
                tracing::debug!(url, attempt, kind = ?e.kind, "attempt failed: {}", e);
            }
            res
        })?;
        tracing::debug!(url, bytes, dest = %dest.display(), "downloaded");
        Ok(FetchOutcome::Downloaded { bytes })
    }

    fn attempt(&self, url: &str, dir: &Path, dest: &Path) -> Result<u64, FetchError> {
        let mut spool = SpoolFile::create_in(dir).map_err(|e| FetchError::storage(&e))?;
        let bytes = self.transport.get(url, &mut spool)?;
        spool.finalize(dest).map_err(|e| FetchError::storage(&e))?;
        Ok(bytes)
    }
}
