//! dsfetch core: resumable bulk acquisition of URL manifests.
//!
//! Manifest → parallel pass → reconciliation → sequential retry → final
//! reconciliation → failure report. The destination directory is the only
//! persistent state; re-running a split skips everything already on disk.

pub mod config;
pub mod logging;

pub mod fetcher;
pub mod manifest;
pub mod pipeline;
pub mod reconcile;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod url_model;
