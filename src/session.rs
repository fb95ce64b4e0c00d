//! Session lifecycle: owns every resource for one profiling run and is the
//! target the signal handler resolves through the process-wide active
//! pointer in [`crate::signal`].

use crate::collector::{self, CollectorState};
use crate::config::{ConfigOptions, Configuration};
use crate::error::{ConfigError, ResourceError, StopError};
use crate::ring::Ring;
use crate::runtime::{GcMarkObserver, ManagedRuntime, NativeUnwinder, Symbolizer};
use crate::serializer::{self, Profile};
use crate::signal;
use crate::timer::{self, TimerHandle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Running,
    Stopped,
}

/// Shared GC-mark-phase state, registered with the runtime via
/// [`ManagedRuntime::register_gc_hooks`] so the runtime drives mark
/// start/end directly instead of relying on a caller to remember to invoke
/// [`Session::on_gc_mark_start`]/[`Session::on_gc_mark_end`].
struct GcBarrier {
    is_marking: Arc<AtomicBool>,
    ring: Arc<Ring>,
    runtime: Arc<dyn ManagedRuntime>,
}

impl GcBarrier {
    fn mark_start(&self) {
        self.is_marking.store(true, Ordering::Release);
        let runtime = &self.runtime;
        self.ring.for_each_pending(|sample| {
            runtime.report_reachable(sample.managed_handles());
        });
        log::trace!("gc mark started, sampling suspended");
    }

    fn mark_end(&self) {
        self.is_marking.store(false, Ordering::Release);
        log::trace!("gc mark ended, sampling resumed");
    }
}

impl GcMarkObserver for GcBarrier {
    fn on_mark_start(&self) {
        self.mark_start();
    }

    fn on_mark_end(&self) {
        self.mark_end();
    }
}

pub struct Session {
    config: Configuration,
    ring: Arc<Ring>,
    running: Arc<AtomicBool>,
    is_marking: Arc<AtomicBool>,
    runtime: Arc<dyn ManagedRuntime>,
    symbolizer: Arc<dyn Symbolizer>,
    unwinder: Arc<dyn NativeUnwinder>,
    gc_barrier: Arc<GcBarrier>,
    collector: Mutex<Option<JoinHandle<CollectorState>>>,
    timer: Mutex<Option<TimerHandle>>,
    phase: Mutex<Phase>,
    start_realtime_ns: AtomicU64,
    start_monotonic_ns: AtomicU64,
    dropped: AtomicU64,
}

impl Session {
    pub fn new(
        options: ConfigOptions,
        runtime: Arc<dyn ManagedRuntime>,
        symbolizer: Arc<dyn Symbolizer>,
        unwinder: Arc<dyn NativeUnwinder>,
    ) -> Result<Self, ConfigError> {
        let config = Configuration::new(options)?;
        let ring = Arc::new(Ring::new(
            config.ring_capacity(),
            config.max_managed_depth(),
            config.max_native_depth(),
        ));
        let is_marking = Arc::new(AtomicBool::new(false));
        let gc_barrier = Arc::new(GcBarrier {
            is_marking: Arc::clone(&is_marking),
            ring: Arc::clone(&ring),
            runtime: Arc::clone(&runtime),
        });
        Ok(Self {
            config,
            ring,
            running: Arc::new(AtomicBool::new(false)),
            is_marking,
            runtime,
            symbolizer,
            unwinder,
            gc_barrier,
            collector: Mutex::new(None),
            timer: Mutex::new(None),
            phase: Mutex::new(Phase::Created),
            start_realtime_ns: AtomicU64::new(0),
            start_monotonic_ns: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn configuration(&self) -> ConfigOptions {
        self.config.effective()
    }

    pub fn start(&self) -> Result<(), ResourceError> {
        let mut phase = self.phase.lock().unwrap();
        if *phase != Phase::Created {
            return Err(ResourceError::AlreadyRunning);
        }

        self.start_realtime_ns.store(timer::realtime_now_ns(), Ordering::Relaxed);
        let start_mono = timer::monotonic_now_ns();
        self.start_monotonic_ns.store(start_mono, Ordering::Relaxed);
        self.running.store(true, Ordering::Release);

        let handle = collector::spawn(
            Arc::clone(&self.ring),
            Arc::clone(&self.running),
            Arc::clone(&self.runtime),
            Arc::clone(&self.symbolizer),
            start_mono,
            self.config.max_managed_depth(),
            self.config.max_native_depth(),
        )
        .map_err(ResourceError::ThreadSpawn)?;
        *self.collector.lock().unwrap() = Some(handle);

        self.runtime.register_gc_hooks(Arc::clone(&self.gc_barrier) as Arc<dyn GcMarkObserver>);

        if !self.config.test_no_install_timer() {
            let signum = timer::signal_for(self.config.time_mode());
            // SAFETY: one handler installed per signal, no concurrent installer.
            unsafe { signal::install(signum) }.map_err(ResourceError::SignalInstall)?;
            let handle = timer::arm(self.config.interval_ms(), self.config.time_mode())
                .map_err(ResourceError::TimerArm)?;
            *self.timer.lock().unwrap() = Some(handle);
        }

        // Publish last: the handler must only ever see a fully-initialized session.
        signal::publish_active(self as *const Session);
        *phase = Phase::Running;
        log::debug!("session started, interval_ms={}", self.config.interval_ms());
        Ok(())
    }

    /// Stop the session. On success, returns the serialized profile. On a
    /// stop-path error, still returns whatever profile could be recovered
    /// alongside the error — only a collector-thread panic loses the
    /// in-flight aggregation state, since it dies with the thread.
    pub fn stop(&self) -> Result<Profile, (StopError, Option<Profile>)> {
        let mut phase = self.phase.lock().unwrap();
        if *phase != Phase::Running {
            return Err((StopError::NotRunning, None));
        }

        let mut stop_error = None;
        if let Some(handle) = self.timer.lock().unwrap().take() {
            if let Err(e) = timer::disarm(&handle) {
                log::warn!("failed to disarm sampling timer: {}", e);
                stop_error = Some(StopError::TimerDisarm(e));
            }
        }
        if !self.config.test_no_install_timer() {
            // SAFETY: uninstalling reverts to the default disposition regardless
            // of whether the timer above was actually disarmed.
            unsafe { signal::uninstall(timer::signal_for(self.config.time_mode())) };
        }
        signal::clear_active();
        self.running.store(false, Ordering::Release);

        let handle = self.collector.lock().unwrap().take().expect("collector was spawned in start()");
        let state = match handle.join() {
            Ok(state) => state,
            Err(_) => {
                *phase = Phase::Stopped;
                return Err((StopError::CollectorPanicked, None));
            }
        };

        *phase = Phase::Stopped;
        let profile = serializer::serialize(
            self.start_realtime_ns.load(Ordering::Relaxed),
            timer::monotonic_now_ns().saturating_sub(self.start_monotonic_ns.load(Ordering::Relaxed)),
            state.collected,
            self.dropped.load(Ordering::Relaxed),
            state,
        );
        log::debug!(
            "session stopped, collected={} dropped={}",
            profile.collected_sample_count,
            profile.dropped_sample_count
        );

        match stop_error {
            Some(e) => Err((e, Some(profile))),
            None => Ok(profile),
        }
    }

    /// Invoked when a mark phase begins: stop accepting new samples and
    /// report every buffered managed-frame handle as reachable. A runtime
    /// that honors [`ManagedRuntime::register_gc_hooks`] calls this through
    /// the registered hook automatically; exposed directly too for callers
    /// driving the barrier themselves (e.g. tests, or a runtime that can't
    /// hold onto an `Arc<dyn GcMarkObserver>`).
    pub fn on_gc_mark_start(&self) {
        self.gc_barrier.mark_start();
    }

    /// Invoked when a mark phase ends: resume accepting samples.
    pub fn on_gc_mark_end(&self) {
        self.gc_barrier.mark_end();
    }

    /// Called from the signal handler. Must remain async-signal-safe: no
    /// allocation, no locking, no I/O.
    pub(crate) fn on_signal(&self) {
        if self.is_marking.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let mut reservation = match self.ring.reserve() {
            Some(r) => r,
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        let thread_id = self.runtime.current_thread_id();
        let now_ns = timer::monotonic_now_ns();
        let ok = reservation
            .sample_mut()
            .capture(thread_id, &*self.runtime, &*self.unwinder, now_ns);
        if ok {
            reservation.commit();
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Test-only: synthesize a timer tick without installing a real signal
    /// handler, for sessions built with `test_no_install_timer`.
    pub fn fire_for_test(&self) {
        self.on_signal();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let running = matches!(*self.phase.lock().unwrap(), Phase::Running);
        if running {
            signal::clear_active();
            if let Some(handle) = self.timer.lock().unwrap().take() {
                let _ = timer::disarm(&handle);
            }
            self.running.store(false, Ordering::Release);
        }
    }
}
