//! Clock sources and the sampling timer itself.
//!
//! Prefers the POSIX per-process timer (`timer_create`/`timer_settime`) when
//! the platform has it; falls back to the coarser `setitimer` interval timer
//! (`ITIMER_PROF` for CPU time, `ITIMER_REAL` for wall time) otherwise.

use crate::config::TimeMode;
use std::io;
use std::mem::MaybeUninit;

pub fn monotonic_now_ns() -> u64 {
    clock_now_ns(libc::CLOCK_MONOTONIC)
}

pub fn realtime_now_ns() -> u64 {
    clock_now_ns(libc::CLOCK_REALTIME)
}

fn clock_now_ns(clock_id: libc::clockid_t) -> u64 {
    let mut ts = MaybeUninit::<libc::timespec>::uninit();
    // SAFETY: `ts` is fully initialized by `clock_gettime` on success; on a
    // clock_id every target of this crate supports, failure cannot occur.
    unsafe {
        libc::clock_gettime(clock_id, ts.as_mut_ptr());
        let ts = ts.assume_init();
        ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
    }
}

/// Which signal the handler for a given [`TimeMode`] is installed against.
pub fn signal_for(mode: TimeMode) -> libc::c_int {
    match mode {
        TimeMode::Cpu => libc::SIGPROF,
        TimeMode::Wall => libc::SIGALRM,
    }
}

pub enum TimerHandle {
    Posix(libc::timer_t),
    Interval(libc::c_int),
}

/// Arm the sampling timer for `mode` at `interval_ms`. Tries `timer_create`
/// first; on `ENOSYS` (not supported on this platform) falls back to
/// `setitimer`.
pub fn arm(interval_ms: u64, mode: TimeMode) -> io::Result<TimerHandle> {
    match arm_posix(interval_ms, mode) {
        Ok(handle) => Ok(handle),
        Err(e) if e.raw_os_error() == Some(libc::ENOSYS) => arm_interval(interval_ms, mode),
        Err(e) => Err(e),
    }
}

fn arm_posix(interval_ms: u64, mode: TimeMode) -> io::Result<TimerHandle> {
    let clock_id = match mode {
        TimeMode::Cpu => libc::CLOCK_PROCESS_CPUTIME_ID,
        TimeMode::Wall => libc::CLOCK_MONOTONIC,
    };
    let signum = signal_for(mode);

    let mut sev: libc::sigevent = unsafe { std::mem::zeroed() };
    sev.sigev_notify = libc::SIGEV_SIGNAL;
    sev.sigev_signo = signum;

    let mut timer_id = MaybeUninit::<libc::timer_t>::uninit();
    // SAFETY: `sev` is fully initialized above; `timer_id` is an out-param.
    let rc = unsafe { libc::timer_create(clock_id, &mut sev, timer_id.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `timer_create` succeeded, so `timer_id` was written.
    let timer_id = unsafe { timer_id.assume_init() };

    let spec = interval_to_itimerspec(interval_ms);
    // SAFETY: `timer_id` was just created by this thread.
    let rc = unsafe { libc::timer_settime(timer_id, 0, &spec, std::ptr::null_mut()) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        unsafe {
            libc::timer_delete(timer_id);
        }
        return Err(err);
    }
    Ok(TimerHandle::Posix(timer_id))
}

fn arm_interval(interval_ms: u64, mode: TimeMode) -> io::Result<TimerHandle> {
    let which = match mode {
        TimeMode::Cpu => libc::ITIMER_PROF,
        TimeMode::Wall => libc::ITIMER_REAL,
    };
    let spec = interval_to_itimerval(interval_ms);
    // SAFETY: `spec` is a fully initialized `itimerval`.
    let rc = unsafe { libc::setitimer(which, &spec, std::ptr::null_mut()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(TimerHandle::Interval(which))
}

pub fn disarm(handle: &TimerHandle) -> io::Result<()> {
    match handle {
        TimerHandle::Posix(id) => {
            // SAFETY: `id` was created by a prior `timer_create` and not yet deleted.
            let rc = unsafe { libc::timer_delete(*id) };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
        TimerHandle::Interval(which) => {
            let zero = interval_to_itimerval(0);
            // SAFETY: `zero` disarms the timer; no resources to release afterward.
            let rc = unsafe { libc::setitimer(*which, &zero, std::ptr::null_mut()) };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }
}

fn interval_to_itimerspec(interval_ms: u64) -> libc::itimerspec {
    let ts = ms_to_timespec(interval_ms);
    libc::itimerspec { it_interval: ts, it_value: ts }
}

fn interval_to_itimerval(interval_ms: u64) -> libc::itimerval {
    let tv = ms_to_timeval(interval_ms);
    libc::itimerval { it_interval: tv, it_value: tv }
}

fn ms_to_timespec(ms: u64) -> libc::timespec {
    libc::timespec {
        tv_sec: (ms / 1000) as libc::time_t,
        tv_nsec: ((ms % 1000) * 1_000_000) as libc::c_long,
    }
}

fn ms_to_timeval(ms: u64) -> libc::timeval {
    libc::timeval {
        tv_sec: (ms / 1000) as libc::time_t,
        tv_usec: ((ms % 1000) * 1000) as libc::suseconds_t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_advances() {
        let a = monotonic_now_ns();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = monotonic_now_ns();
        assert!(b > a);
    }

    #[test]
    fn signal_numbers_match_time_mode() {
        assert_eq!(signal_for(TimeMode::Cpu), libc::SIGPROF);
        assert_eq!(signal_for(TimeMode::Wall), libc::SIGALRM);
    }
}
