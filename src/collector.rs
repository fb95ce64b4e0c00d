//! The collector thread: drains the ring, interns frames, and aggregates
//! identical stacks. Runs on a dedicated OS thread so it never competes with
//! the instrumented program for the runtime's global lock any more than a
//! normal background thread would.

use crate::aggregate::AggregateTable;
use crate::function::{Function, FunctionKind};
use crate::intern::{FunctionTable, LocationTable};
use crate::location::Location;
use crate::ring::Ring;
use crate::runtime::{ManagedRuntime, SymbolLookup, Symbolizer};
use crate::sample::Sample;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const DRAIN_SLEEP: Duration = Duration::from_millis(10);

/// Everything the collector accumulates over the run, handed back to the
/// session when the thread is joined at `stop()`.
pub struct CollectorState {
    pub functions: FunctionTable,
    pub locations: LocationTable,
    pub aggregated: AggregateTable,
    pub collected: u64,
}

impl CollectorState {
    fn new() -> Self {
        Self {
            functions: FunctionTable::new(),
            locations: LocationTable::new(),
            aggregated: AggregateTable::new(),
            collected: 0,
        }
    }
}

pub fn spawn(
    ring: Arc<Ring>,
    running: Arc<AtomicBool>,
    runtime: Arc<dyn ManagedRuntime>,
    symbolizer: Arc<dyn Symbolizer>,
    start_monotonic_ns: u64,
    max_managed_depth: usize,
    max_native_depth: usize,
) -> std::io::Result<thread::JoinHandle<CollectorState>> {
    thread::Builder::new().name("sampler-collector".into()).spawn(move || {
        log::debug!("collector thread starting");
        let mut state = CollectorState::new();
        let mut scratch = Sample::new(max_managed_depth, max_native_depth);
        loop {
            drain_once(&ring, &mut scratch, &mut state, &*runtime, &*symbolizer, start_monotonic_ns);
            if !running.load(Ordering::Acquire) {
                break;
            }
            thread::sleep(DRAIN_SLEEP);
        }
        // Final drain: the producer may have committed samples after the
        // last `running` check but before the timer was fully disarmed.
        drain_once(&ring, &mut scratch, &mut state, &*runtime, &*symbolizer, start_monotonic_ns);
        log::debug!("collector thread exiting, collected={}", state.collected);
        state
    })
}

fn drain_once(
    ring: &Ring,
    scratch: &mut Sample,
    state: &mut CollectorState,
    runtime: &dyn ManagedRuntime,
    symbolizer: &dyn Symbolizer,
    start_monotonic_ns: u64,
) {
    while ring.pop(scratch) {
        state.collected += 1;
        log::trace!("drained sample, consumed_time_ns={}", scratch.consumed_time_ns());

        let mut stack = Vec::with_capacity(scratch.managed_depth());
        for i in 0..scratch.managed_depth() {
            let info = runtime.describe_frame(scratch.managed_frame(i));
            let function = Function {
                kind: FunctionKind::Managed,
                name: info.name,
                filename: info.filename,
                start_lineno: info.first_lineno,
                start_address: None,
            };
            let function_index = state.functions.index_for(function);
            let location = Location { function_index, lineno: scratch.lineno(i), address: 0 };
            stack.push(state.locations.index_for(location));
        }

        let mut native_stack = Vec::with_capacity(scratch.native_depth());
        for i in 0..scratch.native_depth() {
            let pc = scratch.native_frame(i);
            let (name, base_address) = match symbolizer.symbolize(pc) {
                SymbolLookup::Found { name, base_address } => (name, base_address),
                SymbolLookup::NotFound | SymbolLookup::Error(_) => (String::new(), pc),
            };
            let function = Function {
                kind: FunctionKind::Native,
                name,
                filename: None,
                start_lineno: None,
                start_address: Some(base_address),
            };
            let function_index = state.functions.index_for(function);
            let location = Location { function_index, lineno: 0, address: base_address };
            native_stack.push(state.locations.index_for(location));
        }

        let elapsed_ns = scratch.timestamp_ns().saturating_sub(start_monotonic_ns);
        state.aggregated.fold(scratch.thread_id(), stack, native_stack, elapsed_ns);
    }
}
