//! Progress notifications for population runs.
//!
//! Purely observational: a reporter never sees candidates or the
//! cancellation token, only "one more iteration finished".

use std::time::{Duration, Instant};

/// Receives step-completion notifications from a population run.
///
/// The engine serializes all calls through a dedicated mutex, so
/// implementations need no internal locking.
pub trait ProgressReporter: Send {
    /// A run over `total` iterations is starting.
    fn start(&mut self, total: usize, label: &str);
    /// One iteration finished (successfully or not).
    fn update(&mut self);
    /// The run is over.
    fn finish(&mut self);
}

/// Default reporter: logs percentage and ETA through `tracing`.
///
/// Emits at most one `info` event per percent of progress.
#[derive(Debug, Default)]
pub struct ProgressBar {
    label: String,
    total: usize,
    done: usize,
    next_report: usize,
    started: Option<Instant>,
}

impl ProgressBar {
    /// A reporter that has not started yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterations reported so far.
    pub fn done(&self) -> usize {
        self.done
    }

    fn step(&self) -> usize {
        (self.total / 100).max(1)
    }

    fn eta(&self, elapsed: Duration) -> Duration {
        if self.done == 0 {
            return Duration::ZERO;
        }
        let remaining = self.total.saturating_sub(self.done) as f64;
        elapsed.mul_f64(remaining / self.done as f64)
    }
}

impl ProgressReporter for ProgressBar {
    fn start(&mut self, total: usize, label: &str) {
        self.label = label.to_string();
        self.total = total;
        self.done = 0;
        self.next_report = self.step();
        self.started = Some(Instant::now());
        tracing::info!(target: "cascade::progress", "{}: starting {} iterations", self.label, total);
    }

    fn update(&mut self) {
        self.done += 1;
        if self.done < self.next_report && self.done != self.total {
            return;
        }
        self.next_report = self.done + self.step();
        let elapsed = self.started.map(|t| t.elapsed()).unwrap_or_default();
        let percent = if self.total == 0 {
            100.0
        } else {
            100.0 * self.done as f64 / self.total as f64
        };
        tracing::info!(
            target: "cascade::progress",
            "{}: {:.0}% ({}/{}), elapsed {:.1?}, eta {:.1?}",
            self.label,
            percent,
            self.done,
            self.total,
            elapsed,
            self.eta(elapsed),
        );
    }

    fn finish(&mut self) {
        let elapsed = self.started.take().map(|t| t.elapsed()).unwrap_or_default();
        tracing::info!(
            target: "cascade::progress",
            "{}: finished {}/{} in {:.1?}",
            self.label,
            self.done,
            self.total,
            elapsed,
        );
    }
}
