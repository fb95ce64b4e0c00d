//! Lock-free single-producer/single-consumer ring of pre-constructed
//! [`Sample`] slots.
//!
//! MEMORY ORDERING & SYNCHRONIZATION STRATEGY
//! -------------------------------------------
//! `tail` is written only by the producer (the signal handler) and read by
//! the consumer; `head` is written only by the consumer (the collector) and
//! read by the producer. Each side loads the *peer's* index with `Acquire`
//! and stores its *own* index with `Release`, which establishes a
//! happens-before edge: anything the producer wrote into a slot before its
//! `Release` store of `tail` is visible to the consumer after its `Acquire`
//! load of `tail`, and symmetrically for `head`. Loads of one's own index are
//! `Relaxed` since only one thread ever writes it.
//!
//! The buffer holds `capacity + 1` slots (a sentinel) so that `head == tail`
//! unambiguously means empty and `(tail + 1) % slots == head` unambiguously
//! means full, without a separate counter.

use crate::reservation::Reservation;
use crate::sample::Sample;
use crate::{debug_assert_ring_index, debug_assert_ring_not_over_capacity};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

#[repr(align(128))]
struct CachePadded<T>(T);

pub struct Ring {
    slots: usize,
    buffer: Box<[UnsafeCell<Sample>]>,
    tail: CachePadded<AtomicUsize>,
    head: CachePadded<AtomicUsize>,
}

// SAFETY: exactly one producer touches `tail`/slot[tail] and exactly one
// consumer touches `head`/slot[head]; ordering is established by the
// Acquire/Release pair documented above.
unsafe impl Send for Ring {}
unsafe impl Sync for Ring {}

impl Ring {
    pub fn new(capacity: usize, max_managed_depth: usize, max_native_depth: usize) -> Self {
        let slots = capacity + 1;
        let buffer = (0..slots)
            .map(|_| UnsafeCell::new(Sample::new(max_managed_depth, max_native_depth)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            buffer,
            tail: CachePadded(AtomicUsize::new(0)),
            head: CachePadded(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots - 1
    }

    pub fn len(&self) -> usize {
        let tail = self.tail.0.load(Ordering::Acquire);
        let head = self.head.0.load(Ordering::Acquire);
        if tail >= head {
            tail - head
        } else {
            self.slots - head + tail
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve the slot the producer will write into. Async-signal-safe: no
    /// allocation, no blocking, returns `None` immediately if full.
    pub fn reserve(&self) -> Option<Reservation<'_>> {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Acquire);
        let next = (tail + 1) % self.slots;
        if next == head {
            return None;
        }
        debug_assert_ring_index!(tail, self.slots);
        // SAFETY: single producer; this slot will not be touched by the
        // consumer until `commit` publishes `next` as the new tail.
        let slot = unsafe { &mut *self.buffer[tail].get() };
        Some(Reservation::new(self, slot, next))
    }

    pub(crate) fn commit(&self, next_tail: usize) {
        debug_assert_ring_index!(next_tail, self.slots);
        self.tail.0.store(next_tail, Ordering::Release);
    }

    /// Consumer side: if a sample is available, swap it into `out` (no
    /// allocation — the slot keeps `out`'s previous buffers for reuse) and
    /// return `true`.
    pub fn pop(&self, out: &mut Sample) -> bool {
        let head = self.head.0.load(Ordering::Relaxed);
        let tail = self.tail.0.load(Ordering::Acquire);
        if head == tail {
            return false;
        }
        debug_assert_ring_index!(head, self.slots);
        // SAFETY: single consumer; this slot was published by a `commit`
        // that happened-before this `Acquire` load of `tail`.
        let slot = unsafe { &mut *self.buffer[head].get() };
        std::mem::swap(slot, out);
        let next = (head + 1) % self.slots;
        debug_assert_ring_not_over_capacity!(self.len(), self.capacity());
        self.head.0.store(next, Ordering::Release);
        true
    }

    /// Non-consuming walk over every slot between `head` and `tail`, for the
    /// GC barrier's reachability scan. Caller must ensure the producer is
    /// quiesced (i.e. this is called only while `is_marking` is set).
    pub fn for_each_pending(&self, mut f: impl FnMut(&Sample)) {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Acquire);
        let mut i = head;
        while i != tail {
            // SAFETY: slots in [head, tail) are committed and not yet popped.
            let slot = unsafe { &*self.buffer[i].get() };
            f(slot);
            i = (i + 1) % self.slots;
        }
    }
}
