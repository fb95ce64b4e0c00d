//! Trait boundary between the sampling core and whatever it is sampling:
//! the managed runtime's frame walker/GC, a symbolization backend for native
//! frames, and a native stack unwinder.
//!
//! These traits are object-safe so a [`crate::session::Session`] can hold
//! `Arc<dyn ManagedRuntime>` / `Arc<dyn Symbolizer>` / `Arc<dyn NativeUnwinder>`
//! without knowing which concrete runtime it is attached to.

use std::sync::Arc;

/// Opaque handle to a managed call frame. Only valid while the runtime says
/// so — specifically, must not be dereferenced by the holder while a GC mark
/// phase is in progress (see [`ManagedRuntime::register_gc_hooks`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub name: String,
    pub filename: Option<String>,
    pub first_lineno: Option<i32>,
}

/// Callbacks the runtime must invoke at the start and end of every GC mark
/// phase, so the sampler suspends production and reports reachable
/// managed-frame handles without the caller having to remember to drive it.
pub trait GcMarkObserver: Send + Sync {
    /// The runtime is about to start relocating or freeing frames.
    fn on_mark_start(&self);
    /// The runtime has finished marking; sampling may resume.
    fn on_mark_end(&self);
}

/// The managed runtime's sampling entry points. Implementations of
/// `sample_frames` and `current_thread_id` are called from the signal
/// handler and must themselves be async-signal-safe: no allocation, no
/// locking, no re-entrant acquisition of the runtime's own global lock.
pub trait ManagedRuntime: Send + Sync {
    /// The calling thread's runtime-assigned identifier.
    fn current_thread_id(&self) -> u64;

    /// Fill `frames`/`linenos` (same length, `<= max_depth`) with the
    /// current call stack, innermost frame first. Returns the depth written.
    fn sample_frames(&self, max_depth: usize, frames: &mut [FrameHandle], linenos: &mut [i32]) -> usize;

    /// Resolve a frame handle to a displayable description. Called only from
    /// the collector thread, never from the signal handler, so this may
    /// allocate.
    fn describe_frame(&self, frame: FrameHandle) -> FrameInfo;

    /// Report frame handles that are still referenced by buffered, unconsumed
    /// samples, so the GC treats them as reachable during a mark phase.
    fn report_reachable(&self, _frames: &[FrameHandle]) {}

    /// Register the callbacks this runtime must invoke at the start and end
    /// of a GC mark phase. Called once, during `Session::start`.
    fn register_gc_hooks(&self, hooks: Arc<dyn GcMarkObserver>);
}

/// Outcome of resolving a native instruction pointer to a symbol.
#[derive(Debug, Clone)]
pub enum SymbolLookup {
    Found { name: String, base_address: usize },
    NotFound,
    Error(i32),
}

/// Symbolizes native program counters. Called only from the collector
/// thread.
pub trait Symbolizer: Send + Sync {
    fn symbolize(&self, pc: usize) -> SymbolLookup;
}

/// Walks the native call stack. Called from the signal handler and must be
/// async-signal-safe.
pub trait NativeUnwinder: Send + Sync {
    /// Skip `skip_frames` innermost frames (the unwinder's own machinery),
    /// then fill up to `max_depth` instruction pointers into `out`. Returns
    /// the count written.
    fn unwind(&self, skip_frames: usize, max_depth: usize, out: &mut [usize]) -> usize;
}

/// In-process fakes used by tests and the integration suite to exercise the
/// full pipeline without attaching to a real managed runtime.
pub mod testing {
    use super::{FrameHandle, FrameInfo, GcMarkObserver, ManagedRuntime, NativeUnwinder, SymbolLookup, Symbolizer};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    /// A fixed call stack, replayed on every `sample_frames` call.
    pub struct FakeRuntime {
        thread_id: AtomicU64,
        frames: Vec<FrameInfo>,
        gc_hooks: Mutex<Option<Arc<dyn GcMarkObserver>>>,
    }

    impl FakeRuntime {
        pub fn with_stack(frames: Vec<(&str, &str, i32)>) -> Self {
            Self {
                thread_id: AtomicU64::new(0),
                frames: frames
                    .into_iter()
                    .map(|(name, filename, lineno)| FrameInfo {
                        name: name.to_string(),
                        filename: Some(filename.to_string()),
                        first_lineno: Some(lineno),
                    })
                    .collect(),
                gc_hooks: Mutex::new(None),
            }
        }

        pub fn set_thread_id(&self, id: u64) {
            self.thread_id.store(id, Ordering::Relaxed);
        }

        /// Drive the hooks registered via `register_gc_hooks`, simulating the
        /// runtime entering a mark phase.
        pub fn fire_gc_mark_start(&self) {
            if let Some(hooks) = self.gc_hooks.lock().unwrap().as_ref() {
                hooks.on_mark_start();
            }
        }

        /// Drive the hooks registered via `register_gc_hooks`, simulating the
        /// runtime leaving a mark phase.
        pub fn fire_gc_mark_end(&self) {
            if let Some(hooks) = self.gc_hooks.lock().unwrap().as_ref() {
                hooks.on_mark_end();
            }
        }
    }

    impl ManagedRuntime for FakeRuntime {
        fn current_thread_id(&self) -> u64 {
            self.thread_id.load(Ordering::Relaxed)
        }

        fn sample_frames(&self, max_depth: usize, frames: &mut [FrameHandle], linenos: &mut [i32]) -> usize {
            let depth = self.frames.len().min(max_depth);
            for i in 0..depth {
                frames[i] = FrameHandle(i as u64);
                linenos[i] = self.frames[i].first_lineno.unwrap_or(0);
            }
            depth
        }

        fn describe_frame(&self, frame: FrameHandle) -> FrameInfo {
            self.frames
                .get(frame.0 as usize)
                .cloned()
                .unwrap_or(FrameInfo { name: "<unknown>".into(), filename: None, first_lineno: None })
        }

        fn register_gc_hooks(&self, hooks: Arc<dyn GcMarkObserver>) {
            *self.gc_hooks.lock().unwrap() = Some(hooks);
        }
    }

    /// A fixed native backtrace, replayed on every `unwind` call.
    pub struct FakeUnwinder {
        pcs: Vec<usize>,
    }

    impl FakeUnwinder {
        pub fn with_pcs(pcs: Vec<usize>) -> Self {
            Self { pcs }
        }
    }

    impl NativeUnwinder for FakeUnwinder {
        fn unwind(&self, skip_frames: usize, max_depth: usize, out: &mut [usize]) -> usize {
            let usable: Vec<usize> = self.pcs.iter().skip(skip_frames).copied().collect();
            let depth = usable.len().min(max_depth);
            out[..depth].copy_from_slice(&usable[..depth]);
            depth
        }
    }

    /// Resolves a fixed table of `pc -> name`; anything else is `NotFound`.
    pub struct FakeSymbolizer {
        table: Mutex<Vec<(usize, String)>>,
    }

    impl FakeSymbolizer {
        pub fn new(table: Vec<(usize, &str)>) -> Self {
            Self {
                table: Mutex::new(table.into_iter().map(|(pc, n)| (pc, n.to_string())).collect()),
            }
        }
    }

    impl Symbolizer for FakeSymbolizer {
        fn symbolize(&self, pc: usize) -> SymbolLookup {
            let table = self.table.lock().unwrap();
            match table.iter().find(|(p, _)| *p == pc) {
                Some((base, name)) => SymbolLookup::Found { name: name.clone(), base_address: *base },
                None => SymbolLookup::NotFound,
            }
        }
    }
}
