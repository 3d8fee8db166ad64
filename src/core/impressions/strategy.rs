// src/core/impressions/strategy.rs

//! The three impression strategies (§4.4.4). The manager runs the observer
//! once per pair regardless of which strategy is active (§4.4.5); a
//! strategy only decides what else happens: counting, unique-keys
//! tracking, and which of the already-observed impressions get queued for
//! upload.

use crate::core::impressions::counter::Counter;
use crate::core::impressions::unique_keys::UniqueKeysTracker;
use crate::core::model::Impression;
use crate::time::truncate_hour;

/// Closed set of upload strategies, selected once at SDK configuration time.
pub enum Strategy {
    /// Queues every impression. No counting, no deduplication.
    Debug,
    /// Queues only impressions not seen in the current hour bucket, and
    /// tracks per-feature, per-hour counts for every impression seen.
    Optimized,
    /// Queues nothing; tracks counts and per-feature unique keys only.
    None,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Debug => "debug",
            Strategy::Optimized => "optimized",
            Strategy::None => "none",
        }
    }

    /// `observed` has already been annotated with `previous_time` by the
    /// manager's observer; this only decides side effects and the emitted
    /// subset.
    pub fn process(
        &self,
        observed: &[Impression],
        counter: &Counter,
        unique_keys: &UniqueKeysTracker,
    ) -> Vec<Impression> {
        match self {
            Strategy::Debug => observed.to_vec(),
            Strategy::Optimized => {
                counter.track(observed);
                observed
                    .iter()
                    .filter(|imp| is_earlier_hour_bucket(imp))
                    .cloned()
                    .collect()
            }
            Strategy::None => {
                for imp in observed {
                    counter.track(std::slice::from_ref(imp));
                    unique_keys.track(&imp.feature, &imp.key);
                }
                Vec::new()
            }
        }
    }
}

fn is_earlier_hour_bucket(imp: &Impression) -> bool {
    match imp.previous_time {
        None => true,
        Some(previous_time) => truncate_hour(previous_time) < truncate_hour(imp.time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imp(key: &str, feature: &str, time: i64, previous_time: Option<i64>) -> Impression {
        Impression {
            key: key.to_string(),
            feature: feature.to_string(),
            treatment: "on".to_string(),
            label: "l1".to_string(),
            change_number: 1,
            bucketing_key: None,
            time,
            previous_time,
        }
    }

    #[test]
    fn debug_emits_everything_untouched() {
        let counter = Counter::new();
        let unique_keys = UniqueKeysTracker::new();
        let observed = vec![imp("k1", "f1", 1000, None), imp("k1", "f2", 1000, Some(999))];
        let emitted = Strategy::Debug.process(&observed, &counter, &unique_keys);
        assert_eq!(emitted, observed);
        assert!(counter.pop_all().is_empty());
    }

    #[test]
    fn optimized_drops_impressions_seen_in_the_same_hour_bucket() {
        let counter = Counter::new();
        let unique_keys = UniqueKeysTracker::new();
        let hour = crate::time::HOUR_IN_MS;
        let observed = vec![
            imp("k1", "f1", 10, None),
            imp("k1", "f1", 20, Some(10)),
            imp("k1", "f1", hour + 5, Some(20)),
        ];
        let emitted = Strategy::Optimized.process(&observed, &counter, &unique_keys);
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].time, 10);
        assert_eq!(emitted[1].time, hour + 5);

        let rows = counter.pop_all();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn none_emits_nothing_but_tracks_counter_and_unique_keys() {
        let counter = Counter::new();
        let unique_keys = UniqueKeysTracker::new();
        let observed = vec![imp("k1", "f1", 1000, None), imp("k2", "f1", 1000, None)];
        let emitted = Strategy::None.process(&observed, &counter, &unique_keys);
        assert!(emitted.is_empty());
        assert_eq!(counter.pop_all().len(), 1);
        let keys = unique_keys.pop_all();
        assert_eq!(keys["f1"].len(), 2);
    }
}
