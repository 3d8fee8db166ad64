// src/core/impressions/unique_keys.rs

//! The unique-keys tracker (§4.4.3): `feature -> set of keys`, accumulated
//! since the last drain. Used only by the `None` strategy.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// A single mutex around the whole map, the same shape `Counter` uses
/// (`core/impressions/counter.rs`), so `pop_all`'s "atomic
/// snapshot-and-clear" requirement (§4.4.3, §5) holds in one critical
/// section via `std::mem::take` rather than racing a `DashMap` iteration
/// against a concurrent `clear`.
#[derive(Default)]
pub struct UniqueKeysTracker {
    keys: Mutex<HashMap<String, HashSet<String>>>,
}

impl UniqueKeysTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, feature: &str, key: &str) {
        self.keys
            .lock()
            .entry(feature.to_string())
            .or_default()
            .insert(key.to_string());
    }

    /// Atomically snapshots and clears the accumulated keys.
    pub fn pop_all(&self) -> HashMap<String, HashSet<String>> {
        std::mem::take(&mut *self.keys.lock())
    }
}
