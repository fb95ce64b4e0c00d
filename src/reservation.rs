use crate::ring::Ring;
use crate::sample::Sample;

/// A reserved, exclusively-owned write slot returned by [`Ring::reserve`].
///
/// Dropping a `Reservation` without calling [`commit`](Reservation::commit)
/// simply discards it — the slot was never touched by the consumer, so there
/// is nothing to unwind.
pub struct Reservation<'a> {
    ring: &'a Ring,
    slot: &'a mut Sample,
    next_tail: usize,
}

impl<'a> Reservation<'a> {
    pub(crate) fn new(ring: &'a Ring, slot: &'a mut Sample, next_tail: usize) -> Self {
        Self { ring, slot, next_tail }
    }

    /// The slot to capture into before committing.
    pub fn sample_mut(&mut self) -> &mut Sample {
        self.slot
    }

    /// Publish this slot, making it visible to the consumer.
    pub fn commit(self) {
        self.ring.commit(self.next_tail);
    }
}
