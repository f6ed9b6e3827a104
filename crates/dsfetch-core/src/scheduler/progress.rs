//! Progress reporting for passes (tasks finished, rate, ETA).
//!
//! Reports are advisory: they are logged and, if a channel is attached, sent
//! with `try_send` so a slow consumer never stalls the pass.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassKind {
    Parallel,
    Retry,
}

/// When to emit progress during a pass.
#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    /// Report whenever the finished-task count reaches a multiple of this (0 = never).
    pub every: usize,
    /// Report when this much time has passed since the previous report.
    pub interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            every: 100,
            interval: Duration::from_secs(10),
        }
    }
}

/// Snapshot of a pass (CLI-friendly).
#[derive(Debug, Clone, Serialize)]
pub struct PassProgress {
    /// Split name.
    pub label: String,
    pub pass: PassKind,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
    /// Elapsed time since the pass started (seconds).
    pub elapsed_secs: f64,
}

impl PassProgress {
    pub fn finished(&self) -> usize {
        self.completed + self.skipped + self.failed
    }

    /// Fraction of tasks finished in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.finished() as f64 / self.total as f64).min(1.0)
    }

    /// Tasks finished per second (0 if elapsed is 0).
    pub fn tasks_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.finished() as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if nothing has finished yet).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total.saturating_sub(self.finished());
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.tasks_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }
}

/// Where a pass sends its progress: the log, plus an optional channel.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    cfg: ProgressConfig,
    tx: Option<mpsc::Sender<PassProgress>>,
}

impl ProgressReporter {
    pub fn new(cfg: ProgressConfig) -> Self {
        Self { cfg, tx: None }
    }

    pub fn with_sender(mut self, tx: mpsc::Sender<PassProgress>) -> Self {
        self.tx = Some(tx);
        self
    }

    pub(crate) fn gate(&self, start: Instant) -> ProgressGate {
        ProgressGate {
            cfg: self.cfg,
            last_report: start,
            last_finished: 0,
        }
    }

    pub(crate) fn emit(&self, p: PassProgress) {
        tracing::info!(
            split = %p.label,
            pass = ?p.pass,
            completed = p.completed,
            skipped = p.skipped,
            failed = p.failed,
            total = p.total,
            "progress {}/{} ({:.1}%)",
            p.finished(),
            p.total,
            p.fraction() * 100.0
        );
        if let Some(ref tx) = self.tx {
            let _ = tx.try_send(p);
        }
    }
}

/// Decides when the collector should emit a progress report.
#[derive(Debug)]
pub(crate) struct ProgressGate {
    cfg: ProgressConfig,
    last_report: Instant,
    last_finished: usize,
}

impl ProgressGate {
    /// When the next time-based report is due, or None if reports are count-only.
    pub(crate) fn next_due(&self) -> Option<Instant> {
        if self.cfg.interval.is_zero() {
            None
        } else {
            Some(self.last_report + self.cfg.interval)
        }
    }

    /// True when `finished` crossed a multiple of `every` since the last check,
    /// or `interval` elapsed since the last report.
    pub(crate) fn should_report(&mut self, finished: usize, now: Instant) -> bool {
        let crossed = self.cfg.every > 0
            && finished / self.cfg.every > self.last_finished / self.cfg.every;
        let timed = now.duration_since(self.last_report) >= self.cfg.interval;
        self.last_finished = finished;
        if crossed || timed {
            self.last_report = now;
            true
        } else {
            false
        }
    }
}
