//! Population runs: cancellation, fault isolation and progress.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cascade_core::SourceError;
use cascade_engine::{
    CancelState, CancelToken, ErrorPolicy, ModuleList, ModuleListRunner, ProgressReporter,
    Propagation, RunConfig, SharedCandidate,
};
use cascade_source::{Source, SourceEnergy, SourceList, SourceParticleType};
use cascade_test_utils::{
    population, CountingModule, FailingModule, FailingSource, Recorder, SequentialSource,
    StepLimit, TriggerAfter,
};

fn config() -> RunConfig {
    RunConfig::default().with_signal_handling(false)
}

/// Stops the run from inside the reporter's `start`, i.e. after the token
/// reset but before any iteration is dispatched.
struct StopOnStart(CancelToken);

impl ProgressReporter for StopOnStart {
    fn start(&mut self, _total: usize, _label: &str) {
        self.0.signal(2);
    }
    fn update(&mut self) {}
    fn finish(&mut self) {}
}

/// Panics on every update.
struct PanickingReporter;

impl ProgressReporter for PanickingReporter {
    fn start(&mut self, _total: usize, _label: &str) {}
    fn update(&mut self) {
        panic!("reporter broke");
    }
    fn finish(&mut self) {}
}

#[derive(Clone, Default)]
struct CountingReporter {
    updates: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl ProgressReporter for CountingReporter {
    fn start(&mut self, _total: usize, _label: &str) {}
    fn update(&mut self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
    fn finish(&mut self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn stopped_before_dispatch_processes_nothing() {
    let token = CancelToken::new();
    let counter = Arc::new(CountingModule::new());
    let mut list = ModuleList::new()
        .with(counter.clone())
        .with(StepLimit::new(1));
    list.set_progress_reporter(StopOnStart(token.clone()));

    let mut cands = population(100);
    let summary = list
        .run_candidates(
            &mut cands,
            Propagation::default(),
            &config().with_progress(true).with_threads(4),
            &token,
        )
        .unwrap();

    assert_eq!(counter.calls(), 0);
    assert_eq!(summary.skipped, 100);
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.state, CancelState::Signalled(2));
    assert!(cands.iter().all(|c| c.is_active()));
}

#[test]
fn stop_after_k_starts_completes_at_least_k_and_never_repeats() {
    const N: usize = 400;
    const K: usize = 50;

    let token = CancelToken::new();
    let trigger_token = token.clone();
    let recorder = Recorder::new();
    let list = ModuleList::new()
        .with(TriggerAfter::new(K, move || {
            trigger_token.signal(15);
        }))
        .with(StepLimit::new(1))
        .with(recorder.clone());

    let mut cands = population(N);
    let summary = list
        .run_candidates(
            &mut cands,
            Propagation::default(),
            &config().with_threads(4).with_chunk_size(8),
            &token,
        )
        .unwrap();

    assert!(summary.completed >= K);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        summary.completed + summary.interrupted + summary.skipped,
        N
    );
    assert_eq!(summary.state, CancelState::Signalled(15));

    let visits = recorder.visits();
    assert!(visits.len() <= N);
    let mut per_id: HashMap<i32, usize> = HashMap::new();
    for v in &visits {
        *per_id.entry(v.id).or_default() += 1;
    }
    assert!(per_id.values().all(|&n| n == 1));
    assert_eq!(per_id.len(), summary.completed);
}

#[test]
fn failure_on_third_call_is_isolated() {
    let list = ModuleList::new()
        .with(FailingModule::new(2))
        .with(StepLimit::new(1));

    let token = CancelToken::new();
    let mut cands = population(10);
    let summary = list
        .run_candidates(
            &mut cands,
            Propagation::default(),
            &config().with_error_policy(ErrorPolicy::Continue),
            &token,
        )
        .unwrap();

    assert_eq!(summary.total, 10);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 9);
    assert_eq!(token.state(), CancelState::Failed);
    assert_eq!(cands.iter().filter(|c| c.is_active()).count(), 1);
}

#[test]
fn halt_policy_skips_remaining_iterations() {
    let list = ModuleList::new()
        .with(FailingModule::new(2))
        .with(StepLimit::new(1));

    let token = CancelToken::new();
    let mut cands = population(10);
    let summary = list
        .run_candidates(
            &mut cands,
            Propagation::default(),
            &config().with_threads(1),
            &token,
        )
        .unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 7);
    assert_eq!(token.state(), CancelState::Failed);
}

#[test]
fn empty_source_list_fails_every_iteration() {
    let list = ModuleList::new().with(StepLimit::new(1));
    let token = CancelToken::new();
    let summary = list
        .run_source(
            &SourceList::new(),
            6,
            Propagation::default(),
            &config().with_error_policy(ErrorPolicy::Continue),
            &token,
        )
        .unwrap();
    assert_eq!(summary.failed, 6);
    assert_eq!(token.state(), CancelState::Failed);
}

#[test]
fn failing_source_halts_by_default() {
    let list = ModuleList::new().with(StepLimit::new(1));
    let summary = list
        .run_source(
            &FailingSource(SourceError::NoParticleTypes),
            50,
            Propagation::default(),
            &config().with_threads(1),
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 49);
}

#[test]
fn source_run_draws_exactly_count() {
    let counter = Arc::new(CountingModule::new());
    let list = ModuleList::new()
        .with(counter.clone())
        .with(StepLimit::new(2));
    let source = SequentialSource::new();
    let summary = list
        .run_source(
            &source,
            333,
            Propagation::default(),
            &config().with_threads(3).with_chunk_size(10),
            &CancelToken::new(),
        )
        .unwrap();
    assert!(summary.is_complete());
    assert_eq!(source.drawn(), 333);
    assert_eq!(counter.calls(), 666);
}

#[test]
fn configured_source_feeds_population() {
    let source = Source::with_seed(7)
        .with(SourceParticleType::new(22))
        .with(SourceEnergy::new(10.0));
    let recorder = Recorder::new();
    let list = ModuleList::new()
        .with(StepLimit::new(1))
        .with(recorder.clone());
    let summary = list
        .run_source(&source, 20, Propagation::default(), &config(), &CancelToken::new())
        .unwrap();
    assert_eq!(summary.completed, 20);
    assert!(recorder.visits().iter().all(|v| v.id == 22));
}

#[test]
fn shared_candidates_run_once_each() {
    let list = ModuleList::new().with(StepLimit::new(3));
    let shared: Vec<SharedCandidate> = population(64)
        .into_iter()
        .map(|c| Arc::new(Mutex::new(c)))
        .collect();
    let summary = list
        .run_shared(
            &shared,
            Propagation::default(),
            &config().with_threads(8).with_chunk_size(1),
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(summary.completed, 64);
    for c in &shared {
        let c = c.lock().unwrap();
        assert!(!c.is_active());
        assert_eq!(cascade_test_utils::steps(&c), 3);
    }
}

#[test]
fn progress_reporter_sees_every_attempt() {
    let reporter = CountingReporter::default();
    let mut list = ModuleList::new().with(StepLimit::new(1));
    list.set_progress_reporter(reporter.clone());
    list.set_show_progress(true);

    let mut cands = population(250);
    list.run_candidates(&mut cands, Propagation::default(), &config(), &CancelToken::new())
        .unwrap();
    assert_eq!(reporter.updates.load(Ordering::Relaxed), 250);
    assert_eq!(reporter.finished.load(Ordering::Relaxed), 1);

    // A per-run override disables reporting.
    let mut cands = population(10);
    list.run_candidates(
        &mut cands,
        Propagation::default(),
        &config().with_progress(false),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(reporter.updates.load(Ordering::Relaxed), 250);
}

#[test]
fn primary_only_population_counts_as_complete() {
    let list = ModuleList::new()
        .with(cascade_test_utils::Spawner::new(1))
        .with(StepLimit::new(2));
    let mut cands = population(5);
    let summary = list
        .run_candidates(&mut cands, Propagation::PRIMARY_ONLY, &config(), &CancelToken::new())
        .unwrap();
    assert!(summary.is_complete());
    assert!(cands.iter().all(|c| c.secondary_count() == 2));
}

#[test]
fn run_all_follows_the_list_progress_flag() {
    let reporter = CountingReporter::default();
    let mut list = ModuleList::new().with(StepLimit::new(2));
    list.set_progress_reporter(reporter.clone());
    list.set_show_progress(true);

    let mut cands = population(40);
    let summary = list.run_all(&mut cands);
    assert_eq!(summary.total, 40);
    assert!(summary.is_complete());
    assert_eq!(reporter.updates.load(Ordering::Relaxed), 40);
    assert_eq!(reporter.finished.load(Ordering::Relaxed), 1);
    assert!(cands.iter().all(|c| cascade_test_utils::steps(c) == 2));

    list.set_show_progress(false);
    let mut cands = population(10);
    let summary = list.run_all(&mut cands);
    assert_eq!(summary.completed, 10);
    assert_eq!(reporter.updates.load(Ordering::Relaxed), 40);
}

#[test]
fn run_from_source_draws_and_reports() {
    let reporter = CountingReporter::default();
    let counter = Arc::new(CountingModule::new());
    let mut list = ModuleList::new()
        .with(counter.clone())
        .with(StepLimit::new(2));
    list.set_progress_reporter(reporter.clone());
    list.set_show_progress(true);

    let source = SequentialSource::new();
    let summary = list.run_from_source(&source, 75);
    assert!(summary.is_complete());
    assert_eq!(summary.total, 75);
    assert_eq!(source.drawn(), 75);
    assert_eq!(counter.calls(), 150);
    assert_eq!(reporter.updates.load(Ordering::Relaxed), 75);
}

#[test]
fn nested_runner_in_population() {
    let inner = ModuleList::new().with(StepLimit::new(3));
    let list = ModuleList::new().with(ModuleListRunner::from(inner));
    let mut cands = population(30);
    let summary = list
        .run_candidates(
            &mut cands,
            Propagation::default(),
            &config().with_threads(3).with_chunk_size(4),
            &CancelToken::new(),
        )
        .unwrap();
    assert!(summary.is_complete());
    assert!(cands.iter().all(|c| cascade_test_utils::steps(c) == 3));
}

#[test]
fn population_stop_reaches_nested_lineages() {
    const K: usize = 5;

    let token = CancelToken::new();
    let trigger_token = token.clone();
    let inner = ModuleList::new()
        .with(TriggerAfter::new(K, move || {
            trigger_token.signal(15);
        }))
        .with(StepLimit::new(1_000));
    let list = ModuleList::new().with(ModuleListRunner::from(inner));

    let mut cands = population(8);
    let summary = list
        .run_candidates(
            &mut cands,
            Propagation::default(),
            &config().with_threads(1),
            &token,
        )
        .unwrap();

    assert_eq!(summary.state, CancelState::Signalled(15));
    assert_eq!(summary.interrupted, 1);
    assert_eq!(summary.skipped, 7);
    assert_eq!(cascade_test_utils::steps(&cands[0]), K as i64);
    assert!(cands[1..].iter().all(|c| cascade_test_utils::steps(c) == 0));
}

#[test]
fn panicking_reporter_does_not_drop_iterations() {
    let counter = Arc::new(CountingModule::new());
    let mut list = ModuleList::new()
        .with(counter.clone())
        .with(StepLimit::new(1));
    list.set_progress_reporter(PanickingReporter);
    list.set_show_progress(true);

    let mut cands = population(50);
    let summary = list
        .run_candidates(
            &mut cands,
            Propagation::default(),
            &config().with_threads(2).with_chunk_size(5),
            &CancelToken::new(),
        )
        .unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.completed, 50);
    assert_eq!(counter.calls(), 50);
}
