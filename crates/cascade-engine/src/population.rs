//! Population runs: many independent lineages over a fixed worker pool.
//!
//! The index space `[0, total)` is cut into chunks of
//! [`RunConfig::chunk_size`] consecutive indices. Chunks are assigned
//! statically and round-robin: worker `w` of `W` owns chunks `w`, `w + W`,
//! `w + 2W`, and so on. Every iteration is isolated: an error or panic is
//! logged, counted and handled per [`ErrorPolicy`], and never takes down
//! the rest of the batch.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use cascade_core::{Candidate, SourceInterface};

use crate::cancel::{CancelState, CancelToken};
use crate::config::{ConfigError, ErrorPolicy, RunConfig};
use crate::error::{panic_message, RunError};
use crate::lineage::{is_settled, Propagation};
use crate::pipeline::ModuleList;
use crate::signal::{self, SignalGuard};

/// A candidate handed to a population run by shared ownership.
pub type SharedCandidate = Arc<Mutex<Candidate>>;

// ── RunSummary ─────────────────────────────────────────────────────

/// Outcome counts of one population run.
///
/// `completed + interrupted + failed + skipped == total` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Iterations in the run.
    pub total: usize,
    /// Iterations whose lineage ran to its natural end.
    pub completed: usize,
    /// Iterations that ran but stopped early because the token stopped.
    pub interrupted: usize,
    /// Iterations that ended in an error or panic.
    pub failed: usize,
    /// Iterations never started because the token had already stopped.
    pub skipped: usize,
    /// Token state after the pool drained.
    pub state: CancelState,
}

impl RunSummary {
    /// Whether every iteration completed and no stop was requested.
    pub fn is_complete(&self) -> bool {
        self.completed == self.total && self.state == CancelState::Running
    }
}

#[derive(Default)]
struct Counters {
    completed: AtomicUsize,
    interrupted: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Population runs ────────────────────────────────────────────────

impl ModuleList {
    /// Propagate every candidate in `candidates` in parallel.
    ///
    /// Candidates keep whatever state their lineage reached, including
    /// partial results of failed or interrupted iterations.
    ///
    /// The token is reset before dispatch.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if `config` fails validation; nothing runs.
    pub fn run_candidates(
        &self,
        candidates: &mut [Candidate],
        policy: Propagation,
        config: &RunConfig,
        token: &CancelToken,
    ) -> Result<RunSummary, ConfigError> {
        config.validate()?;
        Ok(self.candidates_inner(candidates, policy, config, token))
    }

    /// Propagate shared candidates in parallel. Each entry is locked for
    /// the duration of its own lineage only.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if `config` fails validation; nothing runs.
    pub fn run_shared(
        &self,
        candidates: &[SharedCandidate],
        policy: Propagation,
        config: &RunConfig,
        token: &CancelToken,
    ) -> Result<RunSummary, ConfigError> {
        config.validate()?;
        Ok(self.execute(
            candidates.len(),
            "shared candidates",
            config,
            token,
            |i| {
                let mut candidate = candidates[i]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                self.run_candidate(&mut candidate, policy, token)?;
                Ok(is_settled(&candidate, policy))
            },
        ))
    }

    /// Draw `count` fresh candidates from `source` and propagate each.
    ///
    /// Candidates are dropped once their lineage ends; anything worth
    /// keeping must be captured by an output module. A source failure
    /// counts as a failed iteration.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if `config` fails validation; nothing runs.
    pub fn run_source(
        &self,
        source: &dyn SourceInterface,
        count: usize,
        policy: Propagation,
        config: &RunConfig,
        token: &CancelToken,
    ) -> Result<RunSummary, ConfigError> {
        config.validate()?;
        Ok(self.source_inner(source, count, policy, config, token))
    }

    /// [`run_candidates`](ModuleList::run_candidates) with the default
    /// policy and config, honoring the list's progress flag.
    pub fn run_all(&self, candidates: &mut [Candidate]) -> RunSummary {
        self.candidates_inner(
            candidates,
            Propagation::default(),
            &RunConfig::default(),
            &CancelToken::new(),
        )
    }

    /// [`run_source`](ModuleList::run_source) with the default policy
    /// and config, honoring the list's progress flag.
    pub fn run_from_source(&self, source: &dyn SourceInterface, count: usize) -> RunSummary {
        self.source_inner(
            source,
            count,
            Propagation::default(),
            &RunConfig::default(),
            &CancelToken::new(),
        )
    }

    fn candidates_inner(
        &self,
        candidates: &mut [Candidate],
        policy: Propagation,
        config: &RunConfig,
        token: &CancelToken,
    ) -> RunSummary {
        // Uncontended per-slot locks make the disjoint &mut borrows Sync.
        let slots: Vec<Mutex<&mut Candidate>> = candidates.iter_mut().map(Mutex::new).collect();
        self.execute(slots.len(), "candidates", config, token, |i| {
            let mut slot = slots[i].lock().unwrap_or_else(PoisonError::into_inner);
            let candidate: &mut Candidate = &mut slot;
            self.run_candidate(candidate, policy, token)?;
            Ok(is_settled(candidate, policy))
        })
    }

    fn source_inner(
        &self,
        source: &dyn SourceInterface,
        count: usize,
        policy: Propagation,
        config: &RunConfig,
        token: &CancelToken,
    ) -> RunSummary {
        self.execute(count, "source", config, token, |_| {
            let mut candidate = source.candidate()?;
            self.run_candidate(&mut candidate, policy, token)?;
            Ok(is_settled(&candidate, policy))
        })
    }

    /// Drive `iteration(i)` for every `i < total` over the worker pool.
    ///
    /// `iteration` returns whether the lineage settled. `config` must
    /// already be validated.
    fn execute<F>(
        &self,
        total: usize,
        label: &str,
        config: &RunConfig,
        token: &CancelToken,
        iteration: F,
    ) -> RunSummary
    where
        F: Fn(usize) -> Result<bool, RunError> + Sync,
    {
        token.reset();

        let chunk_size = config.chunk_size.max(1);
        let chunks = total.div_ceil(chunk_size);
        let threads = config.resolved_threads().min(chunks).max(1);
        let show_progress = config.show_progress.unwrap_or(self.show_progress());

        tracing::info!(threads, total, chunk_size, "starting population run over {label}");

        let guard = config.handle_signals.then(|| SignalGuard::install(token));
        if show_progress {
            self.progress().start(total, label);
        }

        let counters = Counters::default();
        let worker = |w: usize| {
            let stride = threads.saturating_mul(chunk_size);
            let mut start = w.saturating_mul(chunk_size);
            while start < total {
                let end = start.saturating_add(chunk_size).min(total);
                for i in start..end {
                    if !token.is_running() {
                        Counters::bump(&counters.skipped);
                        continue;
                    }

                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| iteration(i)))
                        .unwrap_or_else(|payload| {
                            Err(RunError::Panicked {
                                message: panic_message(payload.as_ref()),
                            })
                        });
                    match outcome {
                        Ok(true) => Counters::bump(&counters.completed),
                        Ok(false) => Counters::bump(&counters.interrupted),
                        Err(error) => {
                            Counters::bump(&counters.failed);
                            tracing::error!(index = i, %error, "iteration failed");
                            if config.on_error == ErrorPolicy::Halt {
                                token.fail();
                            }
                        }
                    }

                    if show_progress
                        && panic::catch_unwind(AssertUnwindSafe(|| self.progress().update()))
                            .is_err()
                    {
                        tracing::warn!(index = i, "progress reporter panicked");
                    }
                }
                start = start.saturating_add(stride);
            }
        };

        thread::scope(|s| {
            let worker = &worker;
            let mut handles = Vec::with_capacity(threads);
            let mut inline = Vec::new();
            for w in 0..threads {
                let spawned = thread::Builder::new()
                    .name(format!("cascade-worker-{w}"))
                    .spawn_scoped(s, move || worker(w));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        tracing::warn!(worker = w, error = %e, "failed to spawn worker, running its share inline");
                        inline.push(w);
                    }
                }
            }
            for w in inline {
                worker(w);
            }
            for handle in handles {
                if handle.join().is_err() {
                    tracing::error!("population worker panicked outside an iteration");
                }
            }
        });

        if show_progress {
            self.progress().finish();
        }

        let failed = counters.failed.load(Ordering::Relaxed);
        if failed > 0 && config.on_error == ErrorPolicy::Continue {
            token.fail();
        }

        if let Some(sig) = guard.and_then(SignalGuard::restore) {
            tracing::warn!(signal = sig, "run stopped by signal, re-raising");
            signal::reraise(sig);
        }

        let summary = RunSummary {
            total,
            completed: counters.completed.load(Ordering::Relaxed),
            interrupted: counters.interrupted.load(Ordering::Relaxed),
            failed,
            skipped: counters.skipped.load(Ordering::Relaxed),
            state: token.state(),
        };
        tracing::debug!(?summary, "population run finished");
        summary
    }
}
