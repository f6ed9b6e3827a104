//! Sequential retry over the reconciled missing set.
//!
//! URLs still missing after a wide pass are disproportionately the ones that
//! hit rate limits or flaky hosts, so they are retried one at a time.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::fetcher::Fetcher;
use crate::reconcile::{self, artifact, MissingSet};
use crate::scheduler::{fetch_guarded, FailedUrl, PassCollector, PassKind, PassSummary, ProgressReporter};

/// Reason recorded for a URL that is missing but never produced an error.
const UNKNOWN_REASON: &str = "missing";

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryReport {
    /// Outcome of the sequential pass.
    pub attempted: PassSummary,
    /// Final reconciliation of the retried URLs.
    pub still_missing: MissingSet,
    /// Written only when `still_missing` is non-empty.
    pub failure_artifact: Option<PathBuf>,
}

impl RetryReport {
    pub fn fully_satisfied(&self) -> bool {
        self.still_missing.is_empty()
    }
}

/// Retry pass bound to one split's destination directory.
pub struct RetryCoordinator<'a> {
    fetcher: &'a Fetcher,
    out_dir: &'a Path,
    label: &'a str,
    reporter: &'a ProgressReporter,
}

impl<'a> RetryCoordinator<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        out_dir: &'a Path,
        label: &'a str,
        reporter: &'a ProgressReporter,
    ) -> Self {
        Self {
            fetcher,
            out_dir,
            label,
            reporter,
        }
    }

    /// Sequential pass, final reconciliation and failure artifact in one call.
    /// `known_reasons` maps URLs to the error seen in an earlier pass.
    pub async fn retry(
        &self,
        missing: &MissingSet,
        known_reasons: &HashMap<String, String>,
    ) -> Result<RetryReport> {
        let attempted = self.sequential_pass(missing).await?;
        self.settle(missing, attempted, known_reasons)
    }

    /// Persists the missing list, then fetches every URL in `missing` with
    /// concurrency 1. URLs that appeared on disk in the meantime are skipped.
    pub async fn sequential_pass(&self, missing: &MissingSet) -> Result<PassSummary> {
        crate::storage::ensure_dir(self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;
        let list = artifact::write_missing_list(self.out_dir, missing.urls())
            .with_context(|| format!("failed to write missing list in {}", self.out_dir.display()))?;
        tracing::info!(
            split = self.label,
            count = missing.len(),
            list = %list.display(),
            "sequential retry started"
        );

        let fetcher = self.fetcher.clone();
        let urls = missing.urls().to_vec();
        let dir = self.out_dir.to_path_buf();
        let label = self.label.to_string();
        let reporter = self.reporter.clone();
        let summary = tokio::task::spawn_blocking(move || {
            sequential(&fetcher, &urls, &dir, &label, &reporter)
        })
        .await
        .context("retry pass task failed")?;

        tracing::info!(
            split = self.label,
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            "sequential retry finished"
        );
        Ok(summary)
    }

    /// Final reconciliation of `missing`: removes the failure artifact when
    /// everything is present, otherwise rewrites it with what is left. The
    /// missing list is removed either way since the retry cycle is over.
    pub fn settle(
        &self,
        missing: &MissingSet,
        attempted: PassSummary,
        known_reasons: &HashMap<String, String>,
    ) -> Result<RetryReport> {
        let still_missing = reconcile::reconcile(missing.urls(), self.out_dir);

        let failure_artifact = if still_missing.is_empty() {
            artifact::remove_artifact(self.out_dir, artifact::FAILURE_LIST)
                .context("failed to remove stale failure list")?;
            None
        } else {
            let latest: HashMap<&str, &str> = attempted
                .failures
                .iter()
                .map(|f| (f.url.as_str(), f.reason.as_str()))
                .collect();
            let entries: Vec<FailedUrl> = still_missing
                .urls()
                .iter()
                .map(|url| FailedUrl {
                    url: url.clone(),
                    reason: latest
                        .get(url.as_str())
                        .copied()
                        .or_else(|| known_reasons.get(url).map(String::as_str))
                        .unwrap_or(UNKNOWN_REASON)
                        .to_string(),
                })
                .collect();
            let path = artifact::write_failure_list(self.out_dir, &entries)
                .with_context(|| format!("failed to write failure list in {}", self.out_dir.display()))?;
            tracing::warn!(
                split = self.label,
                count = entries.len(),
                list = %path.display(),
                "URLs still missing after retry"
            );
            Some(path)
        };

        if let Err(e) = artifact::remove_artifact(self.out_dir, artifact::MISSING_LIST) {
            tracing::warn!(split = self.label, "could not remove missing list: {}", e);
        }

        Ok(RetryReport {
            attempted,
            still_missing,
            failure_artifact,
        })
    }
}

/// One URL at a time, on the calling (blocking) thread.
fn sequential(
    fetcher: &Fetcher,
    urls: &[String],
    dir: &Path,
    label: &str,
    reporter: &ProgressReporter,
) -> PassSummary {
    let start = Instant::now();
    let mut gate = reporter.gate(start);
    let mut collector = PassCollector::new(urls.len());
    for (index, url) in urls.iter().enumerate() {
        let outcome = fetch_guarded(fetcher, url, dir);
        collector.record(index, url.clone(), outcome);
        if gate.should_report(collector.finished(), Instant::now()) {
            reporter.emit(collector.progress(PassKind::Retry, label, start.elapsed().as_secs_f64()));
        }
    }
    reporter.emit(collector.progress(PassKind::Retry, label, start.elapsed().as_secs_f64()));
    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Transport;
    use crate::retry::{FetchError, RetryPolicy};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Succeeds for every URL not containing "dead"; checks it is never called concurrently.
    #[derive(Default)]
    struct OneAtATime {
        in_flight: AtomicUsize,
        overlapped: AtomicUsize,
    }

    impl Transport for OneAtATime {
        fn get(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if url.contains("dead") {
                return Err(FetchError::http(404));
            }
            sink.write_all(b"ok").unwrap();
            Ok(2)
        }
    }

    fn missing(dir: &Path, urls: &[&str]) -> MissingSet {
        let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        reconcile::reconcile(&urls, dir)
    }

    #[tokio::test]
    async fn successful_retry_removes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(artifact::failure_list_path(dir.path()), "old\thttps://h/z.png\n").unwrap();
        let t = Arc::new(OneAtATime::default());
        let fetcher = Fetcher::new(t.clone(), RetryPolicy::immediate(3));
        let reporter = ProgressReporter::default();
        let coord = RetryCoordinator::new(&fetcher, dir.path(), "t", &reporter);

        let set = missing(dir.path(), &["https://h/a.png", "https://h/b.png"]);
        let report = coord.retry(&set, &HashMap::new()).await.unwrap();

        assert!(report.fully_satisfied());
        assert_eq!(report.attempted.completed, 2);
        assert!(report.failure_artifact.is_none());
        assert!(!artifact::failure_list_path(dir.path()).exists());
        assert!(!artifact::missing_list_path(dir.path()).exists());
        assert_eq!(t.overlapped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remaining_urls_land_in_failure_list_with_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(Arc::new(OneAtATime::default()), RetryPolicy::immediate(2));
        let reporter = ProgressReporter::default();
        let coord = RetryCoordinator::new(&fetcher, dir.path(), "t", &reporter);

        let set = missing(
            dir.path(),
            &["https://h/dead/1.png", "https://h/ok.png", "https://h/dead/2.png"],
        );
        let report = coord.retry(&set, &HashMap::new()).await.unwrap();

        assert!(!report.fully_satisfied());
        assert_eq!(
            report.still_missing.urls(),
            &["https://h/dead/1.png", "https://h/dead/2.png"]
        );
        let path = report.failure_artifact.unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "HTTP 404\thttps://h/dead/1.png\nHTTP 404\thttps://h/dead/2.png\n"
        );
        assert!(!artifact::missing_list_path(dir.path()).exists());
    }

    #[test]
    fn settle_falls_back_to_earlier_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(Arc::new(OneAtATime::default()), RetryPolicy::immediate(1));
        let reporter = ProgressReporter::default();
        let coord = RetryCoordinator::new(&fetcher, dir.path(), "t", &reporter);
        let set = missing(dir.path(), &["https://h/a.png", "https://h/b.png"]);
        let known = HashMap::from([("https://h/a.png".to_string(), "HTTP 503".to_string())]);

        let report = coord.settle(&set, PassSummary::default(), &known).unwrap();
        let body = std::fs::read_to_string(report.failure_artifact.unwrap()).unwrap();
        assert_eq!(body, "HTTP 503\thttps://h/a.png\nmissing\thttps://h/b.png\n");
    }

    #[tokio::test]
    async fn missing_list_exists_during_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(Arc::new(OneAtATime::default()), RetryPolicy::immediate(1));
        let reporter = ProgressReporter::default();
        let coord = RetryCoordinator::new(&fetcher, dir.path(), "t", &reporter);
        let set = missing(dir.path(), &["https://h/dead/x.png"]);

        let attempted = coord.sequential_pass(&set).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(artifact::missing_list_path(dir.path())).unwrap(),
            "https://h/dead/x.png\n"
        );
        coord.settle(&set, attempted, &HashMap::new()).unwrap();
        assert!(!artifact::missing_list_path(dir.path()).exists());
        assert!(artifact::failure_list_path(dir.path()).exists());
    }
}
