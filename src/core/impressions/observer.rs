// src/core/impressions/observer.rs

//! The impression observer (§4.4.1): annotates each impression with the
//! time of its most recent previous sighting (same fingerprint), backed by
//! a bounded, strictly-LRU cache.

use crate::core::impressions::fingerprint::{fingerprint, Fingerprint};
use crate::core::model::Impression;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Default observer cache capacity (§4.4.1).
pub const DEFAULT_OBSERVER_CACHE_SIZE: usize = 500;
/// The spec permits capacities as low as 5 for tests; anything smaller is
/// clamped up to 1 rather than rejected, since `NonZeroUsize` can't
/// represent zero anyway.
const MIN_OBSERVER_CACHE_SIZE: usize = 1;

/// `fingerprint -> last seen time` (§3), with strict LRU eviction on
/// insertion-or-access, mirroring how `spineldb`'s `ShardCache` wraps
/// `lru::LruCache` behind a single lock (`src/core/storage/db/shard.rs`).
pub struct Observer {
    cache: Mutex<LruCache<Fingerprint, i64>>,
}

impl Observer {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(MIN_OBSERVER_CACHE_SIZE)).unwrap();
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// `testAndSet` (§4.4.1): returns a copy of `imp` with `previous_time`
    /// set to the last time this fingerprint was seen, if any, leaving it
    /// unchanged otherwise. Then records `fingerprint -> imp.time`.
    pub fn test_and_set(&self, imp: &Impression) -> Impression {
        let fp = fingerprint(imp);
        let mut cache = self.cache.lock();
        let previously_seen = cache.get(&fp).copied();
        cache.put(fp, imp.time);
        match previously_seen {
            Some(last_seen) => imp.with_previous_time(Some(last_seen)),
            None => imp.clone(),
        }
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_has_no_previous_time() {
        let observer = Observer::new(5);
        let imp = Impression::new("k1", "f1", "on", "l1", 1, 1000);
        let out = observer.test_and_set(&imp);
        assert_eq!(out.previous_time, None);
    }

    #[test]
    fn repeated_sighting_reports_the_last_seen_time() {
        let observer = Observer::new(5);
        let imp1 = Impression::new("k1", "f1", "on", "l1", 1, 1000);
        observer.test_and_set(&imp1);

        let imp2 = Impression::new("k1", "f1", "on", "l1", 1, 2000);
        let out = observer.test_and_set(&imp2);
        assert_eq!(out.previous_time, Some(1000));
    }

    #[test]
    fn eviction_is_strict_lru_past_capacity() {
        let observer = Observer::new(5);
        for (i, key) in ["k1", "k2", "k3", "k4", "k5", "k6"].iter().enumerate() {
            let imp = Impression::new(*key, "f1", "on", "l1", 1, 1000 + i as i64);
            observer.test_and_set(&imp);
        }
        // k1 was the first-inserted fingerprint; with capacity 5 and 6
        // distinct insertions it must have been evicted.
        let reobserve_k1 = Impression::new("k1", "f1", "on", "l1", 1, 9999);
        let out = observer.test_and_set(&reobserve_k1);
        assert_eq!(out.previous_time, None);
    }
}
