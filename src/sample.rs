use crate::runtime::{FrameHandle, ManagedRuntime, NativeUnwinder};

/// A single stack snapshot captured at one instant.
///
/// Every buffer is pre-allocated at construction and never resized after
/// that — `capture` only ever writes within the existing capacity, so it can
/// safely run from a signal handler.
#[derive(Debug, Clone)]
pub struct Sample {
    timestamp_ns: u64,
    thread_id: u64,
    managed_frames: Vec<FrameHandle>,
    linenos: Vec<i32>,
    managed_depth: usize,
    native_frames: Vec<usize>,
    native_depth: usize,
    consumed_time_ns: u64,
}

impl Sample {
    pub fn new(max_managed_depth: usize, max_native_depth: usize) -> Self {
        Self {
            timestamp_ns: 0,
            thread_id: 0,
            managed_frames: vec![FrameHandle(0); max_managed_depth],
            linenos: vec![0; max_managed_depth],
            managed_depth: 0,
            native_frames: vec![0; max_native_depth],
            native_depth: 0,
            consumed_time_ns: 0,
        }
    }

    fn reset(&mut self) {
        self.timestamp_ns = 0;
        self.thread_id = 0;
        self.managed_depth = 0;
        self.native_depth = 0;
        self.consumed_time_ns = 0;
    }

    /// Fills this record in place. Never allocates. Returns `false` only if
    /// the backing storage has zero capacity for both kinds of frame.
    pub fn capture(
        &mut self,
        thread_id: u64,
        runtime: &dyn ManagedRuntime,
        unwinder: &dyn NativeUnwinder,
        now_ns: u64,
    ) -> bool {
        if self.managed_frames.is_empty() && self.native_frames.is_empty() {
            return false;
        }
        self.reset();
        let capture_start_ns = crate::timer::monotonic_now_ns();
        self.timestamp_ns = now_ns;
        self.thread_id = thread_id;
        self.managed_depth =
            runtime.sample_frames(self.managed_frames.len(), &mut self.managed_frames, &mut self.linenos);
        // The first two native frames belong to the handler's own unwind
        // machinery, not the interrupted program.
        self.native_depth = unwinder.unwind(2, self.native_frames.len(), &mut self.native_frames);
        self.consumed_time_ns = crate::timer::monotonic_now_ns().saturating_sub(capture_start_ns);
        true
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Wall-clock time spent inside `capture` itself, for diagnostics.
    pub fn consumed_time_ns(&self) -> u64 {
        self.consumed_time_ns
    }

    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    pub fn managed_depth(&self) -> usize {
        self.managed_depth
    }

    pub fn native_depth(&self) -> usize {
        self.native_depth
    }

    pub fn managed_frame(&self, i: usize) -> FrameHandle {
        self.managed_frames[i]
    }

    pub fn lineno(&self, i: usize) -> i32 {
        self.linenos[i]
    }

    pub fn native_frame(&self, i: usize) -> usize {
        self.native_frames[i]
    }

    pub fn managed_handles(&self) -> &[FrameHandle] {
        &self.managed_frames[..self.managed_depth]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::{FakeRuntime, FakeUnwinder};

    #[test]
    fn capture_records_timestamp_and_thread() {
        let mut s = Sample::new(8, 8);
        let rt = FakeRuntime::with_stack(vec![("f", "a.rb", 1)]);
        let uw = FakeUnwinder::with_pcs(vec![0x1000, 0x2000]);
        assert!(s.capture(7, &rt, &uw, 123));
        assert_eq!(s.timestamp_ns(), 123);
        assert_eq!(s.thread_id(), 7);
        assert_eq!(s.managed_depth(), 1);
    }

    #[test]
    fn capture_truncates_to_capacity() {
        let mut s = Sample::new(1, 0);
        let rt = FakeRuntime::with_stack(vec![("f", "a.rb", 1), ("g", "a.rb", 2)]);
        let uw = FakeUnwinder::with_pcs(vec![]);
        assert!(s.capture(0, &rt, &uw, 0));
        assert_eq!(s.managed_depth(), 1);
    }

    #[test]
    fn zero_capacity_capture_fails() {
        let mut s = Sample::new(0, 0);
        let rt = FakeRuntime::with_stack(vec![]);
        let uw = FakeUnwinder::with_pcs(vec![]);
        assert!(!s.capture(0, &rt, &uw, 0));
    }
}
