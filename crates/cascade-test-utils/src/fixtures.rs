//! Reusable module and source fixtures.
//!
//! Standard fixtures for pipeline validation and engine testing:
//!
//! - [`StepLimit`]: counts steps on the candidate and deactivates it after N.
//! - [`Spawner`]: appends one secondary per call, up to a generation bound.
//! - [`CountingModule`]: counts calls across all candidates.
//! - [`Recorder`]: logs every visit in global order.
//! - [`FailingModule`]: fails deterministically on a chosen call.
//! - [`TriggerAfter`]: runs a callback once after N calls.
//! - [`SequentialSource`] / [`FailingSource`]: candidate sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cascade_core::{Candidate, Module, ModuleError, ParticleState, SourceError, SourceInterface};

/// Property key holding the number of [`StepLimit`] steps taken.
pub const STEPS: &str = "steps";

/// Property key holding the secondary generation (primaries: absent = 0).
pub const GENERATION: &str = "generation";

/// Steps taken by `candidate` so far, per [`StepLimit`].
pub fn steps(candidate: &Candidate) -> i64 {
    candidate
        .property(STEPS)
        .and_then(|p| p.as_int())
        .unwrap_or(0)
}

/// Generation of `candidate`: 0 for primaries, parent + 1 for secondaries
/// created by [`Spawner`].
pub fn generation(candidate: &Candidate) -> i64 {
    candidate
        .property(GENERATION)
        .and_then(|p| p.as_int())
        .unwrap_or(0)
}

/// `n` fresh active candidates with ids `1..=n`.
pub fn population(n: usize) -> Vec<Candidate> {
    (1..=n)
        .map(|id| Candidate::new(ParticleState::new(id as i32, 1.0)))
        .collect()
}

/// Increments the [`STEPS`] property of active candidates and deactivates
/// them once it reaches `limit`.
pub struct StepLimit {
    pub limit: i64,
}

impl StepLimit {
    pub fn new(limit: i64) -> Self {
        Self { limit }
    }
}

impl Module for StepLimit {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        if !candidate.is_active() {
            return Ok(());
        }
        let n = steps(candidate) + 1;
        candidate.set_property(STEPS, n);
        if n >= self.limit {
            candidate.set_active(false);
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("StepLimit: {}", self.limit)
    }
}

/// Appends exactly one secondary per call to active candidates whose
/// generation is below `max_generation`.
///
/// The secondary keeps the parent's particle id, so visits can be traced
/// back to their primary.
pub struct Spawner {
    pub max_generation: i64,
}

impl Spawner {
    pub fn new(max_generation: i64) -> Self {
        Self { max_generation }
    }
}

impl Module for Spawner {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        let g = generation(candidate);
        if !candidate.is_active() || g >= self.max_generation {
            return Ok(());
        }
        let state = ParticleState::new(candidate.current.id(), candidate.current.energy() / 2.0);
        candidate
            .add_secondary(state)
            .set_property(GENERATION, g + 1);
        Ok(())
    }
}

/// Counts calls across every candidate it processes.
#[derive(Default)]
pub struct CountingModule {
    calls: AtomicUsize,
}

impl CountingModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `process()` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Module for CountingModule {
    fn process(&self, _candidate: &mut Candidate) -> Result<(), ModuleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// One call observed by a [`Recorder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visit {
    pub id: i32,
    pub generation: i64,
    pub steps: i64,
    pub active: bool,
}

/// Records every call, in global order, behind a shared log.
///
/// Place it last in a pipeline to see the state each step left behind.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<Visit>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the visits so far.
    pub fn visits(&self) -> Vec<Visit> {
        self.log.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Module for Recorder {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        let visit = Visit {
            id: candidate.current.id(),
            generation: generation(candidate),
            steps: steps(candidate),
            active: candidate.is_active(),
        };
        self.log
            .lock()
            .map_err(|_| ModuleError::InvalidState {
                reason: "recorder log poisoned".into(),
            })?
            .push(visit);
        Ok(())
    }
}

/// Fails deterministically after a configurable number of successful calls.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Sync`.
pub struct FailingModule {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingModule {
    /// Create a module that succeeds `succeed_count` times then fails
    /// exactly once. Later calls succeed again.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `process()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Reset the call counter.
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::Relaxed);
    }
}

impl Module for FailingModule {
    fn process(&self, _candidate: &mut Candidate) -> Result<(), ModuleError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n == self.succeed_count {
            return Err(ModuleError::ExecutionFailed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(())
    }
}

/// Invokes `action` exactly once, on the `after`-th call.
pub struct TriggerAfter {
    after: usize,
    calls: AtomicUsize,
    action: Box<dyn Fn() + Send + Sync>,
}

impl TriggerAfter {
    pub fn new(after: usize, action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            after,
            calls: AtomicUsize::new(0),
            action: Box::new(action),
        }
    }

    /// How many times `process()` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Module for TriggerAfter {
    fn process(&self, _candidate: &mut Candidate) -> Result<(), ModuleError> {
        if self.calls.fetch_add(1, Ordering::Relaxed) + 1 == self.after {
            (self.action)();
        }
        Ok(())
    }
}

/// Produces active candidates with ids `1, 2, 3, ...` in draw order.
#[derive(Default)]
pub struct SequentialSource {
    drawn: AtomicUsize,
}

impl SequentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates produced so far.
    pub fn drawn(&self) -> usize {
        self.drawn.load(Ordering::Relaxed)
    }
}

impl SourceInterface for SequentialSource {
    fn candidate(&self) -> Result<Candidate, SourceError> {
        let id = self.drawn.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Candidate::new(ParticleState::new(id as i32, 1.0)))
    }

    fn description(&self) -> String {
        "SequentialSource".into()
    }
}

/// A source that always fails with the given error.
pub struct FailingSource(pub SourceError);

impl SourceInterface for FailingSource {
    fn candidate(&self) -> Result<Candidate, SourceError> {
        Err(self.0.clone())
    }

    fn description(&self) -> String {
        "FailingSource".into()
    }
}
