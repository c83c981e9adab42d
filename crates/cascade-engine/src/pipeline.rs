//! The [`ModuleList`] pipeline: ordered modules applied to a candidate.
//!
//! Editing (`add`, `remove`) takes `&mut self` and every run takes
//! `&self`, so the list cannot be changed while a population run is
//! using it.

use std::ops::Index;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cascade_core::{Candidate, Module};

use crate::error::{PipelineError, RunError};
use crate::progress::{ProgressBar, ProgressReporter};

/// Ordered sequence of modules, plus the progress settings used by
/// population runs over it.
pub struct ModuleList {
    modules: Vec<Box<dyn Module>>,
    show_progress: bool,
    progress: Mutex<Box<dyn ProgressReporter>>,
}

impl Default for ModuleList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModuleList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleList")
            .field("modules", &self.iter().map(|m| m.description()).collect::<Vec<_>>())
            .field("show_progress", &self.show_progress)
            .finish()
    }
}

impl ModuleList {
    /// An empty list with progress reporting off.
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            show_progress: false,
            progress: Mutex::new(Box::new(ProgressBar::new())),
        }
    }

    /// Append a module.
    pub fn add(&mut self, module: impl Module + 'static) {
        self.modules.push(Box::new(module));
    }

    /// Append an already boxed module.
    pub fn add_boxed(&mut self, module: Box<dyn Module>) {
        self.modules.push(module);
    }

    /// Builder-style [`add`](ModuleList::add).
    pub fn with(mut self, module: impl Module + 'static) -> Self {
        self.add(module);
        self
    }

    /// Remove and return the module at `index`. Later modules shift down
    /// by one.
    ///
    /// # Errors
    ///
    /// [`PipelineError::IndexOutOfRange`] if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<Box<dyn Module>, PipelineError> {
        if index >= self.modules.len() {
            return Err(PipelineError::IndexOutOfRange {
                index,
                len: self.modules.len(),
            });
        }
        Ok(self.modules.remove(index))
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the list has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The module at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&dyn Module> {
        self.modules.get(index).map(|m| &**m)
    }

    /// Modules in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Module> + '_ {
        self.modules.iter().map(|m| &**m)
    }

    /// Enable or disable progress reporting for population runs.
    pub fn set_show_progress(&mut self, show: bool) {
        self.show_progress = show;
    }

    /// Whether population runs report progress by default.
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    /// Replace the progress reporter (default: [`ProgressBar`]).
    pub fn set_progress_reporter(&mut self, reporter: impl ProgressReporter + 'static) {
        self.progress = Mutex::new(Box::new(reporter));
    }

    pub(crate) fn progress(&self) -> MutexGuard<'_, Box<dyn ProgressReporter>> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply every module, in order, to `candidate`.
    ///
    /// There is no early exit when a module deactivates the candidate:
    /// the remaining modules still see it. A module error ends the step
    /// immediately and is returned with the module's position.
    pub fn process(&self, candidate: &mut Candidate) -> Result<(), RunError> {
        for (index, module) in self.modules.iter().enumerate() {
            module
                .process(candidate)
                .map_err(|reason| RunError::ModuleFailed {
                    index,
                    name: module.description(),
                    reason,
                })?;
        }
        Ok(())
    }

    /// Multi-line description: a `ModuleList` header, then one indented
    /// line per module in pipeline order.
    pub fn description(&self) -> String {
        let mut s = String::from("ModuleList\n");
        for module in &self.modules {
            s.push_str("  ");
            s.push_str(&module.description());
            s.push('\n');
        }
        s
    }

    /// Log [`description`](ModuleList::description) at `info` level.
    pub fn show_modules(&self) {
        tracing::info!("{}", self.description());
    }
}

impl Index<usize> for ModuleList {
    type Output = dyn Module;

    fn index(&self, index: usize) -> &Self::Output {
        &*self.modules[index]
    }
}

// Compile-time assertion: ModuleList is shared by reference across workers.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ModuleList>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::{ModuleError, ParticleState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Named(&'static str);
    impl Module for Named {
        fn process(&self, _c: &mut Candidate) -> Result<(), ModuleError> {
            Ok(())
        }
        fn description(&self) -> String {
            self.0.to_string()
        }
    }

    /// Deactivates on every call and counts calls.
    struct Stop(Arc<AtomicUsize>);
    impl Module for Stop {
        fn process(&self, c: &mut Candidate) -> Result<(), ModuleError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            c.set_active(false);
            Ok(())
        }
    }

    struct Fail;
    impl Module for Fail {
        fn process(&self, _c: &mut Candidate) -> Result<(), ModuleError> {
            Err(ModuleError::ExecutionFailed {
                reason: "boom".into(),
            })
        }
    }

    fn list_of(names: &[&'static str]) -> ModuleList {
        let mut list = ModuleList::new();
        for n in names {
            list.add(Named(*n));
        }
        list
    }

    #[test]
    fn description_empty() {
        assert_eq!(ModuleList::new().description(), "ModuleList\n");
    }

    #[test]
    fn description_one() {
        assert_eq!(list_of(&["A"]).description(), "ModuleList\n  A\n");
    }

    #[test]
    fn description_three_in_insertion_order() {
        let desc = list_of(&["First", "Second", "Third"]).description();
        let lines: Vec<&str> = desc.lines().collect();
        assert_eq!(lines, ["ModuleList", "  First", "  Second", "  Third"]);
    }

    #[test]
    fn remove_shifts_following_modules() {
        let mut list = list_of(&["A", "B", "C", "D"]);
        let removed = list.remove(1).unwrap();
        assert_eq!(removed.description(), "B");
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].description(), "C");
        assert_eq!(list[2].description(), "D");
        assert_eq!(list.get(0).map(|m| m.description()), Some("A".into()));
    }

    #[test]
    fn remove_out_of_range_fails_fast() {
        let mut list = list_of(&["A"]);
        assert_eq!(
            list.remove(1).err(),
            Some(PipelineError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn process_applies_all_modules_after_deactivation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let list = ModuleList::new()
            .with(Stop(calls.clone()))
            .with(Stop(calls.clone()))
            .with(Stop(calls.clone()));
        let mut c = Candidate::new(ParticleState::default());
        list.process(&mut c).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert!(!c.is_active());
    }

    #[test]
    fn process_reports_failing_module() {
        let list = ModuleList::new().with(Named("ok")).with(Fail);
        let mut c = Candidate::default();
        match list.process(&mut c).unwrap_err() {
            RunError::ModuleFailed { index, name, .. } => {
                assert_eq!(index, 1);
                assert_eq!(name, "Fail");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn iteration_matches_order() {
        let list = list_of(&["x", "y"]);
        let names: Vec<String> = list.iter().map(|m| m.description()).collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn progress_flag_toggles() {
        let mut list = ModuleList::new();
        assert!(!list.show_progress());
        list.set_show_progress(true);
        assert!(list.show_progress());
    }
}
