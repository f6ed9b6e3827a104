//! Bulk download orchestration.
//!
//! A pass drives a bounded worker pool over a manifest: each worker runs the
//! single-item fetcher, hands its outcome back, and one collector owns the
//! counters and decides when to report progress.

mod outcome;
mod parallel;
mod progress;

pub use outcome::{FailedUrl, PassCollector, PassSummary, TaskOutcome};
pub use parallel::{run_pass, DEFAULT_CONCURRENCY};
pub use progress::{PassKind, PassProgress, ProgressConfig, ProgressReporter};

pub(crate) use parallel::fetch_guarded;
