/// An ordered call stack tagged with its owning thread. Two stacks are
/// equal iff thread id, length, and every location index match — this is
/// the aggregation key identical stacks fold on. The native stack plays no
/// part in this: it rides along on `AggregatedSample` as informational data
/// only, since ASLR/inlining jitter means two ticks of the same managed
/// stack can unwind to slightly different native PCs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackKey {
    pub thread_id: u64,
    pub managed: Vec<u32>,
}

impl StackKey {
    pub fn new(thread_id: u64, managed: Vec<u32>) -> Self {
        Self { thread_id, managed }
    }
}
