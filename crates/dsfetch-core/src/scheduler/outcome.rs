//! Per-task outcomes and their aggregation for one pass.

use serde::Serialize;

use crate::fetcher::FetchOutcome;
use crate::retry::FetchError;

use super::progress::{PassKind, PassProgress};

/// Result of one task in one pass. Produced once, never retracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Skipped,
    Downloaded,
    Failed(FetchError),
}

impl From<Result<FetchOutcome, FetchError>> for TaskOutcome {
    fn from(res: Result<FetchOutcome, FetchError>) -> Self {
        match res {
            Ok(FetchOutcome::Skipped) => TaskOutcome::Skipped,
            Ok(FetchOutcome::Downloaded { .. }) => TaskOutcome::Downloaded,
            Err(e) => TaskOutcome::Failed(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// Counts for one pass. `completed + skipped + failed == total` once the pass is done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Failed URLs in manifest order.
    pub failures: Vec<FailedUrl>,
}

impl PassSummary {
    pub fn finished(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

/// Single owner of a pass's counters. Workers hand their outcome back through
/// the join set and only the collector mutates these tallies.
#[derive(Debug)]
pub struct PassCollector {
    total: usize,
    completed: usize,
    skipped: usize,
    failed: usize,
    failures: Vec<(usize, FailedUrl)>,
}

impl PassCollector {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    /// Records the outcome of the task for manifest entry `index`.
    pub fn record(&mut self, index: usize, url: String, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Downloaded => self.completed += 1,
            TaskOutcome::Skipped => self.skipped += 1,
            TaskOutcome::Failed(err) => {
                tracing::warn!(url = %url, kind = ?err.kind, "download failed: {}", err);
                self.failed += 1;
                self.failures.push((
                    index,
                    FailedUrl {
                        url,
                        reason: err.to_string(),
                    },
                ));
            }
        }
    }

    /// Records a task whose result was lost (the worker never reported back).
    pub fn record_lost(&mut self, reason: String) {
        tracing::warn!("worker task lost: {}", reason);
        self.failed += 1;
    }

    pub fn finished(&self) -> usize {
        self.completed + self.skipped + self.failed
    }

    pub fn progress(&self, pass: PassKind, label: &str, elapsed_secs: f64) -> PassProgress {
        PassProgress {
            label: label.to_string(),
            pass,
            completed: self.completed,
            skipped: self.skipped,
            failed: self.failed,
            total: self.total,
            elapsed_secs,
        }
    }

    pub fn finish(mut self) -> PassSummary {
        self.failures.sort_by_key(|(index, _)| *index);
        PassSummary {
            total: self.total,
            completed: self.completed,
            skipped: self.skipped,
            failed: self.failed,
            failures: self.failures.into_iter().map(|(_, f)| f).collect(),
        }
    }
}
