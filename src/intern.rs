//! Hash-based intern tables for [`Function`] and [`Location`].
//!
//! The original serializer this is modeled on (`function_index_for`,
//! `location_index_for`) does an O(n) linear scan because its tables are
//! small per-process; here the tables are `HashMap`-backed for O(1)
//! amortized lookup while preserving the exact fold semantics: return the
//! existing index on a hit, push-and-insert on a miss. Capacity starts at 16
//! and doubles on fill, same as the growth policy it replaces.

use crate::debug_assert_intern_index_monotonic;
use crate::function::Function;
use crate::location::Location;
use std::collections::HashMap;

const INITIAL_CAPACITY: usize = 16;

pub struct FunctionTable {
    index: HashMap<Function, u32>,
    entries: Vec<Function>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self {
            index: HashMap::with_capacity(INITIAL_CAPACITY),
            entries: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn index_for(&mut self, f: Function) -> u32 {
        if let Some(&idx) = self.index.get(&f) {
            return idx;
        }
        let idx = self.entries.len() as u32;
        debug_assert_intern_index_monotonic!(idx as usize, self.entries.len());
        self.entries.push(f.clone());
        self.index.insert(f, idx);
        idx
    }

    pub fn entries(&self) -> &[Function] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Function> {
        self.entries
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LocationTable {
    index: HashMap<Location, u32>,
    entries: Vec<Location>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self {
            index: HashMap::with_capacity(INITIAL_CAPACITY),
            entries: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn index_for(&mut self, loc: Location) -> u32 {
        if let Some(&idx) = self.index.get(&loc) {
            return idx;
        }
        let idx = self.entries.len() as u32;
        debug_assert_intern_index_monotonic!(idx as usize, self.entries.len());
        self.entries.push(loc.clone());
        self.index.insert(loc, idx);
        idx
    }

    pub fn entries(&self) -> &[Location] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Location> {
        self.entries
    }
}

impl Default for LocationTable {
    fn default() -> Self {
        Self::new()
    }
}
