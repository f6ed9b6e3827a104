//! `dsfetch fetch` – run the full acquisition cycle for one manifest.

use anyhow::Result;
use dsfetch_core::config::{DsfetchConfig, SplitConfig};
use dsfetch_core::fetcher::Fetcher;
use dsfetch_core::pipeline;
use std::path::PathBuf;
use std::time::Duration;

use super::report::{print_json, print_summary, spawn_progress_printer, verdict};

#[derive(Debug)]
pub struct FetchArgs {
    pub manifest: PathBuf,
    pub output: PathBuf,
    pub limit: usize,
    pub workers: Option<usize>,
    pub timeout: Option<u64>,
    pub json: bool,
}

impl FetchArgs {
    /// Split name shown in logs: the manifest's file stem.
    fn split_name(&self) -> String {
        self.manifest
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manifest".to_string())
    }
}

pub async fn run_fetch(cfg: &DsfetchConfig, args: FetchArgs) -> Result<()> {
    let mut opts = cfg.curl_options();
    if let Some(secs) = args.timeout {
        opts.timeout = Duration::from_secs(secs.max(1));
    }
    let workers = args.workers.unwrap_or(cfg.workers).max(1);
    let fetcher = Fetcher::curl(opts, cfg.retry_policy());

    let split = SplitConfig {
        name: args.split_name(),
        manifest: args.manifest.clone(),
        output: args.output.clone(),
        limit: args.limit,
    };

    let (reporter, printer) = spawn_progress_printer(cfg.progress());
    let result = pipeline::run_split(&split, &fetcher, workers, &reporter).await;
    drop(reporter);
    let _ = printer.await;
    let report = result?;

    if args.json {
        print_json(&[&report])?;
    } else {
        print_summary(&report);
    }
    verdict(&[&report])
}
