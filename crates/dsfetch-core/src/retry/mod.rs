//! Retry and backoff policy for single-URL fetches.
//!
//! Error classification (timeouts, throttling, connection failures, storage)
//! and exponential backoff live here so the fetcher and both passes share one
//! policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
