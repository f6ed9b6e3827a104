//! Split pipeline: parallel pass → reconciliation → sequential retry →
//! final reconciliation → failure report.
//!
//! Splits are independent (own manifest, own directory, no shared state), so
//! several run concurrently and are joined before overall success is decided.

mod retry_pass;
mod state;

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tokio::task::JoinSet;

use crate::config::SplitConfig;
use crate::fetcher::Fetcher;
use crate::manifest::read_manifest;
use crate::reconcile::{self, artifact};
use crate::scheduler::{self, PassSummary, ProgressReporter};

pub use retry_pass::{RetryCoordinator, RetryReport};
pub use state::SplitState;

use state::StateTracker;

/// Outcome of one split, as consumed by the bootstrap flow.
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub name: String,
    pub output: PathBuf,
    pub state: SplitState,
    /// False when the manifest was absent and the split was skipped.
    pub manifest_present: bool,
    pub parallel: Option<PassSummary>,
    pub missing_after_parallel: usize,
    pub retry: Option<RetryReport>,
    /// URLs still missing at the end of the run, in manifest order.
    pub still_missing: Vec<String>,
    pub failure_artifact: Option<PathBuf>,
    /// True iff the split ended in `Done`; downstream steps may proceed.
    pub fully_satisfied: bool,
}

impl SplitReport {
    fn new(split: &SplitConfig, state: SplitState) -> Self {
        Self {
            name: split.name.clone(),
            output: split.output.clone(),
            state,
            manifest_present: true,
            parallel: None,
            missing_after_parallel: 0,
            retry: None,
            still_missing: Vec::new(),
            failure_artifact: None,
            fully_satisfied: state == SplitState::Done,
        }
    }

    pub fn nothing_to_do(&self) -> bool {
        !self.manifest_present
    }
}

/// Runs the full acquisition cycle for one split.
///
/// Errors only on problems that make the split impossible to process (an
/// unreadable manifest, an uncreatable directory, an unwritable artifact);
/// individual download failures end up in the report instead.
pub async fn run_split(
    split: &SplitConfig,
    fetcher: &Fetcher,
    workers: usize,
    reporter: &ProgressReporter,
) -> Result<SplitReport> {
    let mut tracker = StateTracker::new(&split.name);

    let manifest = match read_manifest(&split.manifest, split.limit) {
        Ok(m) => m,
        Err(e) if e.is_not_found() => {
            tracing::info!(
                split = %split.name,
                manifest = %split.manifest.display(),
                "manifest not present; nothing to do"
            );
            reconcile::reconcile_manifest(&split.manifest, split.limit, &split.output)?;
            artifact::remove_artifact(&split.output, artifact::FAILURE_LIST)
                .context("failed to remove stale failure list")?;
            tracker.advance(SplitState::Done);
            let mut report = SplitReport::new(split, tracker.state());
            report.manifest_present = false;
            return Ok(report);
        }
        Err(e) => return Err(e).with_context(|| format!("split {}", split.name)),
    };

    tracker.advance(SplitState::ParallelPass);
    let parallel = scheduler::run_pass(
        fetcher,
        manifest.urls(),
        &split.output,
        workers,
        &split.name,
        reporter,
    )
    .await?;

    tracker.advance(SplitState::Reconciling);
    let missing = reconcile::reconcile(manifest.urls(), &split.output);
    tracing::info!(split = %split.name, missing = missing.len(), "reconciled after parallel pass");

    if missing.is_empty() {
        artifact::remove_artifact(&split.output, artifact::FAILURE_LIST)
            .context("failed to remove stale failure list")?;
        artifact::remove_artifact(&split.output, artifact::MISSING_LIST)
            .context("failed to remove stale missing list")?;
        tracker.advance(SplitState::Done);
        let mut report = SplitReport::new(split, tracker.state());
        report.parallel = Some(parallel);
        return Ok(report);
    }

    tracker.advance(SplitState::SequentialRetry);
    let known_reasons: HashMap<String, String> = parallel
        .failures
        .iter()
        .map(|f| (f.url.clone(), f.reason.clone()))
        .collect();
    let coordinator = RetryCoordinator::new(fetcher, &split.output, &split.name, reporter);
    let attempted = coordinator.sequential_pass(&missing).await?;

    tracker.advance(SplitState::ReconcilingFinal);
    let retry = coordinator.settle(&missing, attempted, &known_reasons)?;
    tracker.advance(if retry.fully_satisfied() {
        SplitState::Done
    } else {
        SplitState::PermanentFailure
    });

    let mut report = SplitReport::new(split, tracker.state());
    report.missing_after_parallel = missing.len();
    report.parallel = Some(parallel);
    report.still_missing = retry.still_missing.urls().to_vec();
    report.failure_artifact = retry.failure_artifact.clone();
    report.retry = Some(retry);
    Ok(report)
}

/// Runs all `splits` concurrently and waits for every one of them.
///
/// Reports come back in input order. Fails up front if two splits share a
/// name or an output directory, since splits must not share state.
pub async fn run_splits(
    splits: &[SplitConfig],
    fetcher: &Fetcher,
    workers: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<Result<SplitReport>>> {
    let mut names = HashSet::new();
    let mut outputs = HashSet::new();
    for s in splits {
        if !names.insert(s.name.as_str()) {
            anyhow::bail!("duplicate split name: {}", s.name);
        }
        if !outputs.insert(s.output.as_path()) {
            anyhow::bail!(
                "splits must write to distinct directories: {} is used twice",
                s.output.display()
            );
        }
    }

    let mut join_set = JoinSet::new();
    for (index, split) in splits.iter().enumerate() {
        let split = split.clone();
        let fetcher = fetcher.clone();
        let reporter = reporter.clone();
        join_set.spawn(async move {
            let res = run_split(&split, &fetcher, workers, &reporter).await;
            (index, res)
        });
    }

    let labels: Vec<&str> = splits.iter().map(|s| s.name.as_str()).collect();
    Ok(join_in_order(join_set, &labels).await)
}

/// Waits for every task in `join_set` and returns their results by index.
///
/// A task that panics or is cancelled does not stop the others: its slot
/// becomes an error naming the task and the join failure.
async fn join_in_order<T: 'static>(
    mut join_set: JoinSet<(usize, Result<T>)>,
    labels: &[&str],
) -> Vec<Result<T>> {
    let mut results: Vec<Option<Result<T>>> = labels.iter().map(|_| None).collect();
    let mut lost = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, res)) => results[index] = Some(res),
            Err(e) => {
                tracing::error!("split task failed: {}", e);
                lost.push(e.to_string());
            }
        }
    }
    results
        .into_iter()
        .zip(labels)
        .map(|(res, label)| {
            res.unwrap_or_else(|| {
                Err(anyhow::anyhow!(
                    "split {} did not report ({})",
                    label,
                    lost.join("; ")
                ))
            })
        })
        .collect()
}
