//! Temporary ownership of termination-signal delivery.
//!
//! [`SignalGuard::install`] points a process-wide handler for SIGINT and
//! SIGTERM at a [`CancelToken`]. The handler performs one atomic
//! compare-and-set per live token and nothing else (no allocation, no
//! locking, no logging), which keeps it async-signal-safe.
//!
//! Guards may overlap freely, on any threads and in any order. A signal
//! reaches every live guard that asked for it. The handler is installed
//! when the first guard for a signal goes live, and the disposition found
//! at that moment is restored only when the last such guard is released.
//!
//! On non-unix targets the guard is a no-op.

use crate::cancel::CancelToken;

/// Signals translated into cancellation during a population run.
#[cfg(unix)]
pub const TERMINATION_SIGNALS: &[i32] = &[libc::SIGINT, libc::SIGTERM];

/// Signals translated into cancellation during a population run.
#[cfg(not(unix))]
pub const TERMINATION_SIGNALS: &[i32] = &[];

#[cfg(unix)]
mod imp {
    use std::ptr;
    use std::sync::atomic::{AtomicI32, AtomicPtr, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use crate::cancel::CancelToken;

    /// Maximum number of simultaneously live guards.
    const SLOTS: usize = 64;

    /// Token cell per slot, null when the slot is free.
    static TOKENS: [AtomicPtr<AtomicI32>; SLOTS] =
        [const { AtomicPtr::new(ptr::null_mut()) }; SLOTS];

    /// Signal mask per slot: bit `sig - 1` is set when the slot's guard
    /// listens for `sig`.
    static MASKS: [AtomicU64; SLOTS] = [const { AtomicU64::new(0) }; SLOTS];

    /// Handler invocations in flight. A slot's cell is only released once
    /// this drops to zero after the slot was cleared.
    static IN_HANDLER: AtomicUsize = AtomicUsize::new(0);

    /// Owner of the cells TOKENS points into and of the saved dispositions.
    /// Never touched by the handler.
    static REGISTRY: Mutex<Registry> = Mutex::new(Registry {
        cells: [const { None }; SLOTS],
        dispositions: Vec::new(),
    });

    struct Disposition {
        signal: libc::c_int,
        users: usize,
        previous: libc::sigaction,
    }

    struct Registry {
        cells: [Option<Arc<AtomicI32>>; SLOTS],
        dispositions: Vec<Disposition>,
    }

    // SAFETY: `libc::sigaction` is plain data; the raw handler address it
    // carries is never dereferenced by this crate.
    unsafe impl Send for Registry {}

    fn registry() -> MutexGuard<'static, Registry> {
        REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bit(sig: libc::c_int) -> Option<u64> {
        (1..=64).contains(&sig).then(|| 1u64 << (sig - 1))
    }

    extern "C" fn on_signal(sig: libc::c_int) {
        IN_HANDLER.fetch_add(1, Ordering::SeqCst);
        if let Some(bit) = bit(sig) {
            for (cell, mask) in TOKENS.iter().zip(&MASKS) {
                let target = cell.load(Ordering::SeqCst);
                if target.is_null() || mask.load(Ordering::SeqCst) & bit == 0 {
                    continue;
                }
                // SAFETY: a non-null slot points into an Arc held by
                // REGISTRY, which is only released after the slot is
                // cleared and no handler is in flight.
                let state = unsafe { &*target };
                let _ = state.compare_exchange(0, sig, Ordering::AcqRel, Ordering::Acquire);
            }
        }
        IN_HANDLER.fetch_sub(1, Ordering::SeqCst);
    }

    impl Registry {
        fn occupy(&mut self, cell: &Arc<AtomicI32>, mask: u64) -> Option<usize> {
            let slot = self.cells.iter().position(Option::is_none)?;
            MASKS[slot].store(mask, Ordering::SeqCst);
            TOKENS[slot].store(Arc::as_ptr(cell) as *mut AtomicI32, Ordering::SeqCst);
            self.cells[slot] = Some(Arc::clone(cell));
            Some(slot)
        }

        fn vacate(&mut self, slot: usize) {
            TOKENS[slot].store(ptr::null_mut(), Ordering::SeqCst);
            MASKS[slot].store(0, Ordering::SeqCst);
            while IN_HANDLER.load(Ordering::SeqCst) != 0 {
                std::hint::spin_loop();
            }
            self.cells[slot] = None;
        }

        /// Take a reference on `sig`'s handler, installing it for the
        /// first user. Returns `false` if installation failed.
        fn acquire(&mut self, sig: libc::c_int) -> bool {
            if let Some(held) = self.dispositions.iter_mut().find(|d| d.signal == sig) {
                held.users += 1;
                return true;
            }

            // SAFETY: zeroed sigaction is a valid "no flags, empty mask"
            // value; every field we rely on is set explicitly below.
            let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
            action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = libc::SA_RESTART;
            // SAFETY: sa_mask is a valid sigset_t owned by `action`.
            unsafe { libc::sigemptyset(&mut action.sa_mask) };

            // SAFETY: as above.
            let mut previous: libc::sigaction = unsafe { std::mem::zeroed() };
            // SAFETY: both pointers reference live, initialized sigaction values.
            if unsafe { libc::sigaction(sig, &action, &mut previous) } != 0 {
                tracing::warn!(signal = sig, "failed to install signal handler");
                return false;
            }
            self.dispositions.push(Disposition {
                signal: sig,
                users: 1,
                previous,
            });
            true
        }

        /// Drop a reference on `sig`'s handler, restoring the saved
        /// disposition when the last user leaves.
        fn release(&mut self, sig: libc::c_int) {
            let Some(pos) = self.dispositions.iter().position(|d| d.signal == sig) else {
                return;
            };
            let held = &mut self.dispositions[pos];
            held.users -= 1;
            if held.users == 0 {
                let held = self.dispositions.swap_remove(pos);
                // SAFETY: `previous` was filled in by a successful sigaction call.
                unsafe { libc::sigaction(sig, &held.previous, ptr::null_mut()) };
            }
        }
    }

    pub(super) struct Installed {
        token: Arc<AtomicI32>,
        slot: Option<usize>,
        signals: Vec<libc::c_int>,
    }

    pub(super) fn install(token: &CancelToken, signals: &[i32]) -> Installed {
        let cell = Arc::clone(token.cell());
        let mut registry = registry();

        let mask = signals.iter().filter_map(|&sig| bit(sig)).fold(0, |m, b| m | b);
        let slot = registry.occupy(&cell, mask);
        if slot.is_none() {
            tracing::warn!(limit = SLOTS, "too many live signal guards, token not targeted");
        }

        let mut held = Vec::with_capacity(signals.len());
        for &sig in signals {
            if bit(sig).is_none() {
                tracing::warn!(signal = sig, "unsupported signal number");
                continue;
            }
            if registry.acquire(sig) {
                held.push(sig);
            }
        }

        Installed {
            token: cell,
            slot,
            signals: held,
        }
    }

    pub(super) fn restore(installed: &mut Installed) -> i32 {
        {
            let mut registry = registry();
            for sig in installed.signals.drain(..).rev() {
                registry.release(sig);
            }
            if let Some(slot) = installed.slot.take() {
                registry.vacate(slot);
            }
        }
        installed.token.load(Ordering::Acquire)
    }

    pub(super) fn reraise(sig: i32) {
        // SAFETY: raise has no memory-safety preconditions.
        unsafe { libc::raise(sig) };
    }
}

#[cfg(not(unix))]
mod imp {
    use crate::cancel::CancelToken;

    pub(super) struct Installed {
        token: CancelToken,
    }

    pub(super) fn install(token: &CancelToken, _signals: &[i32]) -> Installed {
        Installed {
            token: token.clone(),
        }
    }

    pub(super) fn restore(installed: &mut Installed) -> i32 {
        installed.token.raw()
    }

    pub(super) fn reraise(_sig: i32) {}
}

/// Routes termination signals into a [`CancelToken`] while alive.
///
/// Dropping the guard without calling [`restore`](SignalGuard::restore)
/// still restores the previous handlers, but never re-raises.
pub struct SignalGuard {
    installed: Option<imp::Installed>,
}

impl SignalGuard {
    /// Install handlers for [`TERMINATION_SIGNALS`] targeting `token`.
    pub fn install(token: &CancelToken) -> Self {
        Self::install_for(token, TERMINATION_SIGNALS)
    }

    /// Install handlers for an explicit set of signals.
    pub fn install_for(token: &CancelToken, signals: &[i32]) -> Self {
        Self {
            installed: Some(imp::install(token, signals)),
        }
    }

    /// Restore the previous handlers. Returns the signal observed while
    /// the guard was active, if any.
    pub fn restore(mut self) -> Option<i32> {
        self.restore_inner()
    }

    fn restore_inner(&mut self) -> Option<i32> {
        let mut installed = self.installed.take()?;
        let raw = imp::restore(&mut installed);
        (raw > 0).then_some(raw)
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        let _ = self.restore_inner();
    }
}

/// Deliver `signal` to this process under its current disposition.
///
/// Called after [`SignalGuard::restore`] so the host's own handler (or
/// the default action) sees the signal the run absorbed. While other
/// guards for `signal` are still live, they absorb it instead and pass
/// it on when the last of them is restored.
pub fn reraise(signal: i32) {
    imp::reraise(signal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_without_signal_returns_none() {
        let token = CancelToken::new();
        let guard = SignalGuard::install_for(&token, &[]);
        assert_eq!(guard.restore(), None);
    }

    #[test]
    fn failure_state_is_not_a_signal() {
        let token = CancelToken::new();
        let guard = SignalGuard::install_for(&token, &[]);
        token.fail();
        assert_eq!(guard.restore(), None);
    }

    #[test]
    fn token_signal_is_reported_on_restore() {
        let token = CancelToken::new();
        let guard = SignalGuard::install_for(&token, &[]);
        token.signal(15);
        assert_eq!(guard.restore(), Some(15));
    }

    #[test]
    fn guard_slots_are_recycled() {
        for _ in 0..200 {
            let token = CancelToken::new();
            let guard = SignalGuard::install_for(&token, &[]);
            token.signal(10);
            assert_eq!(guard.restore(), Some(10));
        }
    }
}
