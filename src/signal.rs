//! Process-wide active-session pointer and the `SA_SIGINFO` handler that
//! resolves it.
//!
//! The pointer is published only after the session is fully initialized and
//! cleared before any of its fields are torn down, so the handler either
//! sees a fully-formed session or sees nothing. Reentrancy is impossible
//! because the handler's own signal is self-masked at install time.

use crate::session::Session;
use std::sync::atomic::{AtomicPtr, Ordering};

static ACTIVE_SESSION: AtomicPtr<Session> = AtomicPtr::new(std::ptr::null_mut());

/// Publish `session` as the process-wide active session. Must only be
/// called once the session is fully constructed; the handler may fire the
/// instant this returns.
pub(crate) fn publish_active(session: *const Session) {
    ACTIVE_SESSION.store(session as *mut Session, Ordering::Release);
}

/// Clear the active session. Must happen before any owned resource is torn
/// down, and must happen-after the timer has been disarmed so no further
/// deliveries are pending.
pub(crate) fn clear_active() {
    ACTIVE_SESSION.store(std::ptr::null_mut(), Ordering::Release);
}

extern "C" fn handle_signal(_sig: libc::c_int, _info: *mut libc::siginfo_t, _ctx: *mut libc::c_void) {
    let saved_errno = current_errno();
    let ptr = ACTIVE_SESSION.load(Ordering::Acquire);
    if !ptr.is_null() {
        // SAFETY: `ptr` is only ever a pointer to a `Session` published by
        // `publish_active` after full initialization, and cleared by
        // `clear_active` before the session's fields are dropped.
        let session = unsafe { &*ptr };
        session.on_signal();
    }
    restore_errno(saved_errno);
}

#[cfg(target_os = "linux")]
fn current_errno() -> i32 {
    unsafe { *libc::__errno_location() }
}
#[cfg(target_os = "linux")]
fn restore_errno(value: i32) {
    unsafe {
        *libc::__errno_location() = value;
    }
}

#[cfg(target_os = "macos")]
fn current_errno() -> i32 {
    unsafe { *libc::__error() }
}
#[cfg(target_os = "macos")]
fn restore_errno(value: i32) {
    unsafe {
        *libc::__error() = value;
    }
}

/// Install the `SA_SIGINFO | SA_RESTART` handler for `signum`, with `signum`
/// itself masked so the handler never nests.
///
/// # Safety
/// Must be called with no other thread concurrently installing a handler
/// for the same signal.
pub(crate) unsafe fn install(signum: libc::c_int) -> std::io::Result<()> {
    let mut sa: libc::sigaction = std::mem::zeroed();
    sa.sa_sigaction = handle_signal as usize;
    sa.sa_flags = libc::SA_SIGINFO | libc::SA_RESTART;
    libc::sigemptyset(&mut sa.sa_mask);
    libc::sigaddset(&mut sa.sa_mask, signum);
    if libc::sigaction(signum, &sa, std::ptr::null_mut()) != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Restore the default disposition for `signum`.
///
/// # Safety
/// Must be called after the timer delivering this signal has been disarmed.
pub(crate) unsafe fn uninstall(signum: libc::c_int) {
    libc::signal(signum, libc::SIG_DFL);
}
