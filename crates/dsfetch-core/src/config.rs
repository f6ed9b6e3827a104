use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::CurlOptions;
use crate::retry::RetryPolicy;
use crate::scheduler::ProgressConfig;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per URL within one fetch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds; the wait after attempt `n` is `base * 2^n`.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 60,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// One dataset split: a manifest and the directory it is materialized into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitConfig {
    pub name: String,
    pub manifest: PathBuf,
    pub output: PathBuf,
    /// Only the first `limit` URLs are considered (0 = all).
    #[serde(default)]
    pub limit: usize,
}

/// Global configuration loaded from `~/.config/dsfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DsfetchConfig {
    /// Worker pool width for the parallel pass.
    pub workers: usize,
    /// Whole-request timeout per attempt, in seconds.
    pub timeout_secs: u64,
    /// TCP/TLS connect timeout per attempt, in seconds.
    pub connect_timeout_secs: u64,
    /// Sent as the `User-Agent` header; some image hosts reject requests without one.
    pub user_agent: String,
    /// Log progress every time this many tasks have finished.
    pub progress_every: usize,
    /// Log progress at least this often while a pass is running.
    pub progress_interval_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Splits processed by `dsfetch bootstrap`.
    #[serde(default)]
    pub splits: Vec<SplitConfig>,
}

impl Default for DsfetchConfig {
    fn default() -> Self {
        Self {
            workers: 32,
            timeout_secs: 60,
            connect_timeout_secs: 30,
            user_agent: "Mozilla/5.0".to_string(),
            progress_every: 100,
            progress_interval_secs: 10,
            retry: None,
            splits: Vec::new(),
        }
    }
}

impl DsfetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().policy()
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn progress(&self) -> ProgressConfig {
        ProgressConfig {
            every: self.progress_every,
            interval: Duration::from_secs(self.progress_interval_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dsfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DsfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DsfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_from(path: &Path) -> Result<DsfetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: DsfetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
