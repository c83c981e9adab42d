//! Cooperative cancellation for population runs.
//!
//! A [`CancelToken`] is a shared tri-state flag: `0` while running, the
//! signal number once a termination signal was observed, `-1` once an
//! iteration failed. Workers consult it at loop boundaries only; a
//! module's `process()` call always runs to completion.

use std::cell::RefCell;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

const RUNNING: i32 = 0;
const FAILED: i32 = -1;

thread_local! {
    /// Token of the lineage this thread is propagating, if any.
    static CURRENT: RefCell<Option<CancelToken>> = const { RefCell::new(None) };
}

/// Decoded value of a [`CancelToken`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelState {
    /// No stop requested.
    Running,
    /// An external termination signal was observed.
    Signalled(i32),
    /// An iteration failed with an internal error.
    Failed,
}

impl CancelState {
    fn from_raw(raw: i32) -> Self {
        match raw {
            RUNNING => Self::Running,
            n if n > 0 => Self::Signalled(n),
            _ => Self::Failed,
        }
    }
}

/// Shared cancellation flag, cheap to clone.
///
/// Clones observe the same state. The first non-zero write wins; later
/// writes are ignored until [`reset`](CancelToken::reset), which every
/// population run performs before dispatching work.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    state: Arc<AtomicI32>,
}

// Compile-time assertion: CancelToken must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<CancelToken>();
};

impl CancelToken {
    /// A token in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current decoded state.
    pub fn state(&self) -> CancelState {
        CancelState::from_raw(self.raw())
    }

    /// Raw encoded value (`0`, signal number, or `-1`).
    pub fn raw(&self) -> i32 {
        self.state.load(Ordering::Acquire)
    }

    /// Whether work may continue.
    pub fn is_running(&self) -> bool {
        self.raw() == RUNNING
    }

    /// Return to the running state.
    pub fn reset(&self) {
        self.state.store(RUNNING, Ordering::Release);
    }

    /// Record an external termination signal. Returns `false` if the
    /// token was already stopped (or `signal` is not positive).
    pub fn signal(&self, signal: i32) -> bool {
        signal > 0 && self.transition(signal)
    }

    /// Record an internal failure. Returns `false` if the token was
    /// already stopped.
    pub fn fail(&self) -> bool {
        self.transition(FAILED)
    }

    fn transition(&self, to: i32) -> bool {
        self.state
            .compare_exchange(RUNNING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn cell(&self) -> &Arc<AtomicI32> {
        &self.state
    }

    /// The token governing the lineage running on this thread.
    ///
    /// Set for the duration of [`ModuleList::run_candidate`], so modules
    /// that drive their own nested lineages can honor the outer stop.
    ///
    /// [`ModuleList::run_candidate`]: crate::ModuleList::run_candidate
    pub fn current() -> Option<CancelToken> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Make this token [`current`](CancelToken::current) until the
    /// returned scope drops.
    pub(crate) fn enter(&self) -> CurrentScope {
        let previous = CURRENT.with(|current| current.replace(Some(self.clone())));
        CurrentScope { previous }
    }
}

/// Restores the previously current token on drop, unwinding included.
pub(crate) struct CurrentScope {
    previous: Option<CancelToken>,
}

impl Drop for CurrentScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}
