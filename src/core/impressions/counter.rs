// src/core/impressions/counter.rs

//! The time-bucketed impression counter (§4.4.2): `track` increments
//! `(feature, hour_bucket)`; `popAll` atomically snapshots and clears.

use crate::core::model::Impression;
use crate::time::truncate_hour;
use parking_lot::Mutex;
use std::collections::HashMap;

/// `(feature, hour_bucket)`.
pub type CounterKey = (String, i64);

/// One row of a `popAll()` snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountPerFeature {
    pub feature: String,
    pub timeframe: i64,
    pub count: i64,
}

/// Safe under concurrent `track`/`popAll` (§5): a single mutex guards the
/// whole map, the same trade-off `spineldb`'s `ShardCache` makes for
/// operations cheap enough that a dashmap-style sharded lock isn't worth
/// the complexity, and it makes `popAll`'s "atomic snapshot-and-clear"
/// requirement trivial to satisfy exactly.
#[derive(Default)]
pub struct Counter {
    counts: Mutex<HashMap<CounterKey, i64>>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, impressions: &[Impression]) {
        let mut counts = self.counts.lock();
        for imp in impressions {
            let key = (imp.feature.clone(), truncate_hour(imp.time));
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    /// Atomically snapshots and clears the accumulated counts.
    pub fn pop_all(&self) -> Vec<CountPerFeature> {
        let mut counts = self.counts.lock();
        std::mem::take(&mut *counts)
            .into_iter()
            .map(|((feature, timeframe), count)| CountPerFeature {
                feature,
                timeframe,
                count,
            })
            .collect()
    }
}
