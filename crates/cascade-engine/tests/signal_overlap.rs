//! Overlapping signal guards. Kept in its own test binary: signal
//! dispositions are process-wide.

#![cfg(unix)]

use std::ptr;

use cascade_engine::{CancelState, CancelToken, SignalGuard};

fn raise(signal: i32) {
    // SAFETY: raise has no memory-safety preconditions.
    unsafe { libc::raise(signal) };
}

fn disposition(signal: i32) -> libc::sighandler_t {
    // SAFETY: zeroed sigaction is a valid out-parameter.
    let mut current: libc::sigaction = unsafe { std::mem::zeroed() };
    // SAFETY: a null new action only queries the current one.
    unsafe { libc::sigaction(signal, ptr::null(), &mut current) };
    current.sa_sigaction
}

#[test]
fn overlapping_guards_released_first_in_first_out() {
    let usr1 = libc::SIGUSR1;
    assert_eq!(disposition(usr1), libc::SIG_DFL);

    let a = CancelToken::new();
    let b = CancelToken::new();
    let other = CancelToken::new();
    let ga = SignalGuard::install_for(&a, &[usr1]);
    let gb = SignalGuard::install_for(&b, &[usr1]);
    let g_other = SignalGuard::install_for(&other, &[libc::SIGUSR2]);

    // Every live guard listening for the signal sees it.
    raise(usr1);
    assert_eq!(a.state(), CancelState::Signalled(usr1));
    assert_eq!(b.state(), CancelState::Signalled(usr1));
    assert_eq!(other.state(), CancelState::Running);

    // The older guard leaves first; the handler stays in place for `b`.
    assert_eq!(ga.restore(), Some(usr1));
    assert_ne!(disposition(usr1), libc::SIG_DFL);

    a.reset();
    b.reset();
    raise(usr1);
    assert_eq!(a.state(), CancelState::Running);
    assert_eq!(b.state(), CancelState::Signalled(usr1));

    // The last guard out puts back the disposition found by the first.
    assert_eq!(gb.restore(), Some(usr1));
    assert_eq!(disposition(usr1), libc::SIG_DFL);

    assert_eq!(g_other.restore(), None);
    assert_eq!(disposition(libc::SIGUSR2), libc::SIG_DFL);
}
