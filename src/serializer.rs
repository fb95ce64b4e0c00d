//! Builds the externally-visible [`Profile`] directly from the collector's
//! already-interned state — no re-interning, a single pass.

use crate::collector::CollectorState;
use crate::function::Function;
use crate::location::Location;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SerializedSample {
    pub thread_id: u64,
    pub stack: Vec<u32>,
    pub native_stack: Vec<u32>,
    pub elapsed_ns: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub start_timestamp_ns: u64,
    pub duration_ns: u64,
    pub collected_sample_count: u64,
    pub dropped_sample_count: u64,
    pub samples: Vec<SerializedSample>,
    pub locations: Vec<Location>,
    pub functions: Vec<Function>,
}

pub fn serialize(
    start_timestamp_ns: u64,
    duration_ns: u64,
    collected_sample_count: u64,
    dropped_sample_count: u64,
    state: CollectorState,
) -> Profile {
    let CollectorState { functions, locations, aggregated, .. } = state;
    let samples = aggregated
        .into_entries()
        .into_iter()
        .map(|a| SerializedSample {
            thread_id: a.thread_id,
            stack: a.stack,
            native_stack: a.native_stack,
            elapsed_ns: a.max_elapsed_ns,
            count: a.count,
        })
        .collect();
    Profile {
        start_timestamp_ns,
        duration_ns,
        collected_sample_count,
        dropped_sample_count,
        samples,
        locations: locations.into_entries(),
        functions: functions.into_entries(),
    }
}
