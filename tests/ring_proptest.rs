//! Property-based tests for the sentinel-slot SPSC ring, adapted from the
//! sequencing invariants a ring buffer must hold regardless of its internal
//! indexing scheme: bounded occupancy, monotonic progress, and
//! happens-before ordering between producer and consumer.

use proptest::prelude::*;
use sampler_core::ring::Ring;
use sampler_core::runtime::testing::{FakeRuntime, FakeUnwinder};
use sampler_core::sample::Sample;

fn fill(ring: &Ring, runtime: &FakeRuntime, unwinder: &FakeUnwinder, n: usize) -> usize {
    let mut written = 0;
    for i in 0..n {
        if let Some(mut r) = ring.reserve() {
            r.sample_mut().capture(i as u64, runtime, unwinder, i as u64);
            r.commit();
            written += 1;
        } else {
            break;
        }
    }
    written
}

proptest! {
    /// The ring never holds more than `capacity` items after any sequence
    /// of writes.
    #[test]
    fn bounded_occupancy(writes in 0usize..200) {
        let ring = Ring::new(64, 0, 0);
        let runtime = FakeRuntime::with_stack(vec![]);
        let unwinder = FakeUnwinder::with_pcs(vec![]);

        fill(&ring, &runtime, &unwinder, writes);
        prop_assert!(ring.len() <= ring.capacity());
    }

    /// `len()` increases by exactly one on a successful reserve+commit, and
    /// decreases by exactly one on a successful pop.
    #[test]
    fn monotonic_progress(ops in prop::collection::vec(prop::bool::ANY, 1..100)) {
        let ring = Ring::new(32, 0, 0);
        let runtime = FakeRuntime::with_stack(vec![]);
        let unwinder = FakeUnwinder::with_pcs(vec![]);
        let mut out = Sample::new(0, 0);

        for write_op in ops {
            let before = ring.len();
            if write_op {
                if let Some(mut r) = ring.reserve() {
                    r.sample_mut().capture(0, &runtime, &unwinder, 0);
                    r.commit();
                    prop_assert_eq!(ring.len(), before + 1);
                }
            } else if ring.pop(&mut out) {
                prop_assert_eq!(ring.len(), before - 1);
            }
        }
    }

    /// The consumer never observes more items than were produced, and the
    /// ring returns to empty once every produced item is popped.
    #[test]
    fn happens_before(writes in 0usize..64) {
        let ring = Ring::new(64, 0, 0);
        let runtime = FakeRuntime::with_stack(vec![]);
        let unwinder = FakeUnwinder::with_pcs(vec![]);
        let mut out = Sample::new(0, 0);

        let produced = fill(&ring, &runtime, &unwinder, writes);
        prop_assert_eq!(ring.len(), produced);

        let mut consumed = 0;
        while ring.pop(&mut out) {
            consumed += 1;
        }
        prop_assert!(consumed <= produced);
        prop_assert!(ring.is_empty());
    }

    /// FIFO: values come back out in the order they were committed.
    #[test]
    fn fifo_order(writes in 1usize..64) {
        let ring = Ring::new(64, 0, 0);
        let runtime = FakeRuntime::with_stack(vec![]);
        let unwinder = FakeUnwinder::with_pcs(vec![]);
        let mut out = Sample::new(0, 0);

        for i in 0..writes {
            let mut r = ring.reserve().unwrap();
            r.sample_mut().capture(i as u64, &runtime, &unwinder, 0);
            r.commit();
        }
        let mut expected = 0u64;
        while ring.pop(&mut out) {
            prop_assert_eq!(out.thread_id(), expected);
            expected += 1;
        }
        prop_assert_eq!(expected as usize, writes);
    }
}
