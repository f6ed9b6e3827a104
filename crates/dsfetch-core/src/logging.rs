//! Logging setup.
//!
//! Bulk runs are mostly unattended: per-URL detail goes to a log file under
//! the XDG state directory while the CLI prints only progress and summaries.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,dsfetch=debug";

/// Where log records end up after [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// Location of the log file: `$XDG_STATE_HOME/dsfetch/dsfetch.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dsfetch")?;
    Ok(xdg_dirs.get_state_home().join("dsfetch.log"))
}

/// Opens `path` for appending, creating its directory first.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn install<W>(writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

/// Installs the global subscriber, writing to the log file when it can be
/// opened and to stderr otherwise.
pub fn init() -> LogSink {
    match log_file_path().and_then(|p| open_log_file(&p).map(|f| (p, f))) {
        Ok((path, file)) => {
            install(Mutex::new(file));
            tracing::info!("dsfetch logging to {}", path.display());
            LogSink::File(path)
        }
        Err(e) => {
            install(io::stderr);
            tracing::warn!("file logging unavailable, using stderr: {:#}", e);
            LogSink::Stderr
        }
    }
}
