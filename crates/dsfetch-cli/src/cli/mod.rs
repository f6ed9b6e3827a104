//! CLI for dsfetch.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dsfetch_core::config;
use std::path::PathBuf;

use commands::{run_bootstrap, run_fetch, run_reconcile, FetchArgs};

/// Default destination for a single manifest, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "openimages/edited/sft";

/// Top-level CLI for dsfetch.
#[derive(Debug, Parser)]
#[command(name = "dsfetch")]
#[command(about = "dsfetch: resumable bulk download of URL manifests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every URL in a manifest, retry what is missing, report the rest.
    Fetch {
        /// Newline-delimited URL list.
        manifest: PathBuf,

        /// Destination directory (created if absent).
        #[arg(long, short, default_value = DEFAULT_OUTPUT, value_name = "DIR")]
        output: PathBuf,

        /// Only the first N URLs (0 = all).
        #[arg(long, default_value = "0", value_name = "N")]
        limit: usize,

        /// Parallel pass width (default from config).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,

        /// Per-attempt timeout in seconds (default from config).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Print the split report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List URLs from a manifest that are not yet on disk. Makes no requests.
    Reconcile {
        /// Newline-delimited URL list.
        manifest: PathBuf,

        /// Destination directory to check.
        #[arg(long, short, default_value = DEFAULT_OUTPUT, value_name = "DIR")]
        output: PathBuf,

        /// Only the first N URLs (0 = all).
        #[arg(long, default_value = "0", value_name = "N")]
        limit: usize,

        /// Persist the result as the missing list in the destination directory.
        #[arg(long)]
        write: bool,
    },

    /// Run every split configured in config.toml concurrently.
    Bootstrap {
        /// Print the split reports as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                manifest,
                output,
                limit,
                workers,
                timeout,
                json,
            } => {
                let args = FetchArgs {
                    manifest,
                    output,
                    limit,
                    workers,
                    timeout,
                    json,
                };
                run_fetch(&cfg, args).await?
            }
            CliCommand::Reconcile {
                manifest,
                output,
                limit,
                write,
            } => run_reconcile(&manifest, &output, limit, write)?,
            CliCommand::Bootstrap { json } => run_bootstrap(&cfg, json).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
