//! `dsfetch bootstrap` – run every configured split and fail unless all are satisfied.

use anyhow::Result;
use dsfetch_core::config::DsfetchConfig;
use dsfetch_core::fetcher::Fetcher;
use dsfetch_core::pipeline::{self, SplitReport};

use super::report::{print_json, print_summary, spawn_progress_printer, verdict};

pub async fn run_bootstrap(cfg: &DsfetchConfig, json: bool) -> Result<()> {
    if cfg.splits.is_empty() {
        println!("No splits configured. Add [[splits]] entries to config.toml.");
        return Ok(());
    }
    let fetcher = Fetcher::curl(cfg.curl_options(), cfg.retry_policy());

    let (reporter, printer) = spawn_progress_printer(cfg.progress());
    let results =
        pipeline::run_splits(&cfg.splits, &fetcher, cfg.workers.max(1), &reporter).await;
    drop(reporter);
    let _ = printer.await;

    let mut reports: Vec<SplitReport> = Vec::new();
    let mut errors = Vec::new();
    for (split, res) in cfg.splits.iter().zip(results?) {
        match res {
            Ok(r) => reports.push(r),
            Err(e) => {
                tracing::error!(split = %split.name, "split aborted: {:#}", e);
                errors.push(format!("{}: {:#}", split.name, e));
            }
        }
    }

    let refs: Vec<&SplitReport> = reports.iter().collect();
    if json {
        print_json(&refs)?;
    } else {
        for r in &refs {
            print_summary(r);
        }
    }
    if !errors.is_empty() {
        anyhow::bail!("splits aborted: {}", errors.join("; "));
    }
    verdict(&refs)
}
