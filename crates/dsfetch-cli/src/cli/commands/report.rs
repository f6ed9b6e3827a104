//! Console output shared by `fetch` and `bootstrap`: live progress lines,
//! per-split summaries and the final exit verdict.

use anyhow::Result;
use dsfetch_core::pipeline::{SplitReport, SplitState};
use dsfetch_core::scheduler::{PassProgress, ProgressConfig, ProgressReporter};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// Reporter wired to a printing task. Drop every clone of the reporter, then
/// await the handle, to flush the last line.
pub(super) fn spawn_progress_printer(cfg: ProgressConfig) -> (ProgressReporter, JoinHandle<()>) {
    let (progress_tx, mut progress_rx) = mpsc::channel::<PassProgress>(64);
    let handle = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        while let Some(p) = progress_rx.recv().await {
            let now = Instant::now();
            let due = last_print
                .map(|t| now.duration_since(t).as_millis() as u64 >= PROGRESS_INTERVAL_MS)
                .unwrap_or(true);
            if due || p.finished() >= p.total {
                println!("{}", progress_line(&p));
                last_print = Some(now);
            }
        }
    });
    (ProgressReporter::new(cfg).with_sender(progress_tx), handle)
}

fn progress_line(p: &PassProgress) -> String {
    let eta = p
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    format!(
        "  [{} {:?}] {}/{} ({:.1}%)  ok {}  skip {}  fail {}  {:.1}/s  ETA {}",
        p.label,
        p.pass,
        p.finished(),
        p.total,
        p.fraction() * 100.0,
        p.completed,
        p.skipped,
        p.failed,
        p.tasks_per_sec(),
        eta
    )
}

pub(super) fn print_summary(report: &SplitReport) {
    if report.nothing_to_do() {
        println!("{}: manifest not present, nothing to do.", report.name);
        return;
    }
    if let Some(ref p) = report.parallel {
        println!(
            "{}: {} completed, {} skipped, {} failed (of {}) -> {}",
            report.name,
            p.completed,
            p.skipped,
            p.failed,
            p.total,
            report.output.display()
        );
    }
    if let Some(ref r) = report.retry {
        println!(
            "{}: {} missing after parallel pass; retry recovered {}, {} still missing",
            report.name,
            report.missing_after_parallel,
            report.missing_after_parallel.saturating_sub(r.still_missing.len()),
            r.still_missing.len()
        );
    }
    match report.state {
        SplitState::Done => println!("{}: all files present.", report.name),
        _ => {
            if let Some(ref path) = report.failure_artifact {
                println!("{}: failed URLs written to {}", report.name, path.display());
            }
        }
    }
}

pub(super) fn print_json(reports: &[&SplitReport]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}

/// Error naming every split that is not fully satisfied, or `Ok` if none.
pub(super) fn verdict(reports: &[&SplitReport]) -> Result<()> {
    let unsatisfied: Vec<String> = reports
        .iter()
        .filter(|r| !r.fully_satisfied)
        .map(|r| match r.failure_artifact {
            Some(ref path) => format!(
                "{} ({} missing, see {})",
                r.name,
                r.still_missing.len(),
                path.display()
            ),
            None => format!("{} ({} missing)", r.name, r.still_missing.len()),
        })
        .collect();
    if unsatisfied.is_empty() {
        return Ok(());
    }
    anyhow::bail!("incomplete splits: {}", unsatisfied.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsfetch_core::scheduler::PassKind;
    use std::path::PathBuf;

    fn report(name: &str, state: SplitState) -> SplitReport {
        SplitReport {
            name: name.to_string(),
            output: PathBuf::from(format!("out/{name}")),
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

    #[test]
    fn verdict_passes_when_all_done() {
        let a = report("sft", SplitState::Done);
        let b = report("preference", SplitState::Done);
        assert!(verdict(&[&a, &b]).is_ok());
    }

    #[test]
    fn verdict_names_failure_artifact() {
        let a = report("sft", SplitState::Done);
        let mut b = report("preference", SplitState::PermanentFailure);
        b.still_missing = vec!["https://h/x.png".to_string()];
        b.failure_artifact = Some(PathBuf::from("out/preference/_failed.txt"));
        let err = verdict(&[&a, &b]).unwrap_err().to_string();
        assert!(err.contains("preference (1 missing, see out/preference/_failed.txt)"));
        assert!(!err.contains("sft"));
    }

    #[test]
    fn progress_line_shows_counts_and_eta() {
        let p = PassProgress {
            label: "sft".into(),
            pass: PassKind::Parallel,
            completed: 30,
            skipped: 20,
            failed: 0,
            total: 100,
            elapsed_secs: 10.0,
        };
        let line = progress_line(&p);
        assert!(line.contains("[sft Parallel] 50/100 (50.0%)"));
        assert!(line.contains("ETA 10s"));
    }
}
