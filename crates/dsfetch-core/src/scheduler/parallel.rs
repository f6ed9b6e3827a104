//! Wide parallel pass over a manifest.
//!
//! Keeps up to `concurrency` blocking fetches in flight; when one finishes its
//! outcome goes to the collector and the next URL is started, until the
//! manifest is exhausted.

use anyhow::{Context, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use crate::fetcher::Fetcher;
use crate::retry::{ErrorKind, FetchError};
use crate::storage;

use super::outcome::{PassCollector, PassSummary, TaskOutcome};
use super::progress::{PassKind, ProgressReporter};

/// Default worker pool width for the parallel pass.
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Runs one fetch task per URL with at most `concurrency` in flight.
///
/// Individual failures never abort the pass; they are counted and listed in
/// the summary. The only error is failing to create `out_dir`. The failure
/// count is a weak signal: reconciliation decides what is actually missing.
pub async fn run_pass(
    fetcher: &Fetcher,
    urls: &[String],
    out_dir: &Path,
    concurrency: usize,
    label: &str,
    reporter: &ProgressReporter,
) -> Result<PassSummary> {
    storage::ensure_dir(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    match storage::sweep_spool_files(out_dir) {
        Ok(0) => {}
        Ok(n) => tracing::info!(split = label, "removed {} stale spool file(s)", n),
        Err(e) => tracing::warn!(split = label, "could not sweep spool files: {}", e),
    }

    let concurrency = concurrency.max(1);
    let start = Instant::now();
    let mut gate = reporter.gate(start);
    let mut collector = PassCollector::new(urls.len());
    let mut pending = urls.iter().enumerate();
    let mut join_set = tokio::task::JoinSet::new();

    tracing::info!(
        split = label,
        total = urls.len(),
        concurrency,
        dir = %out_dir.display(),
        "parallel pass started"
    );

    loop {
        while join_set.len() < concurrency {
            let Some((index, url)) = pending.next() else {
                break;
            };
            let fetcher = fetcher.clone();
            let url = url.clone();
            let dir = out_dir.to_path_buf();
            join_set.spawn_blocking(move || {
                let outcome = fetch_guarded(&fetcher, &url, &dir);
                (index, url, outcome)
            });
        }

        if join_set.is_empty() {
            break;
        }
        // Wake at the report interval even if every worker is still blocked.
        let joined = match gate.next_due() {
            Some(due) => {
                let due = tokio::time::Instant::from_std(due);
                match tokio::time::timeout_at(due, join_set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        if gate.should_report(collector.finished(), Instant::now()) {
                            reporter.emit(collector.progress(
                                PassKind::Parallel,
                                label,
                                start.elapsed().as_secs_f64(),
                            ));
                        }
                        continue;
                    }
                }
            }
            None => join_set.join_next().await,
        };
        let Some(res) = joined else {
            break;
        };
        match res {
            Ok((index, url, outcome)) => collector.record(index, url, outcome),
            Err(e) => collector.record_lost(e.to_string()),
        }

        if gate.should_report(collector.finished(), Instant::now()) {
            reporter.emit(collector.progress(
                PassKind::Parallel,
                label,
                start.elapsed().as_secs_f64(),
            ));
        }
    }

    reporter.emit(collector.progress(PassKind::Parallel, label, start.elapsed().as_secs_f64()));
    let summary = collector.finish();
    tracing::info!(
        split = label,
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        total = summary.total,
        "parallel pass finished"
    );
    Ok(summary)
}

/// Fetches one URL, turning a panic in the transport into a failed outcome.
pub(crate) fn fetch_guarded(fetcher: &Fetcher, url: &str, dir: &Path) -> TaskOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch_into(url, dir))) {
        Ok(res) => TaskOutcome::from(res),
        Err(_) => TaskOutcome::Failed(FetchError::new(ErrorKind::Other, "fetch task panicked")),
    }
}
