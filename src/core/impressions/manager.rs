// src/core/impressions/manager.rs

//! The impression manager (§4.4.5): composes an optional listener with a
//! strategy, and owns the observer shared by every strategy.

use crate::core::fetch::Listener;
use crate::core::impressions::counter::Counter;
use crate::core::impressions::observer::Observer;
use crate::core::impressions::strategy::Strategy;
use crate::core::impressions::unique_keys::UniqueKeysTracker;
use crate::core::metrics::{IMPRESSIONS_DROPPED_TOTAL, IMPRESSIONS_EMITTED_TOTAL};
use crate::core::model::Impression;
use serde_json::Value;

pub struct Manager {
    listener: Option<Box<dyn Listener>>,
    strategy: Strategy,
    observer: Observer,
    counter: Counter,
    unique_keys: UniqueKeysTracker,
}

impl Manager {
    pub fn new(listener: Option<Box<dyn Listener>>, strategy: Strategy) -> Self {
        Self {
            listener,
            strategy,
            observer: Observer::default(),
            counter: Counter::new(),
            unique_keys: UniqueKeysTracker::new(),
        }
    }

    pub fn with_observer_cache_size(
        listener: Option<Box<dyn Listener>>,
        strategy: Strategy,
        observer_cache_size: usize,
    ) -> Self {
        Self {
            listener,
            strategy,
            observer: Observer::new(observer_cache_size),
            counter: Counter::new(),
            unique_keys: UniqueKeysTracker::new(),
        }
    }

    /// Runs the observer over every pair, then the strategy, then calls the
    /// listener exactly once per input pair with the observer-annotated
    /// impression, regardless of what the strategy emitted (§4.4.5). Returns
    /// the strategy's emitted list unchanged.
    pub fn process_impressions(&self, pairs: &[(Impression, Option<Value>)]) -> Vec<Impression> {
        let observed: Vec<Impression> = pairs
            .iter()
            .map(|(imp, _)| self.observer.test_and_set(imp))
            .collect();

        let emitted = self.strategy.process(&observed, &self.counter, &self.unique_keys);

        if let Some(listener) = &self.listener {
            for ((_, attributes), imp) in pairs.iter().zip(observed.iter()) {
                listener.log(imp, attributes.as_ref());
            }
        }

        let label = self.strategy.name();
        IMPRESSIONS_EMITTED_TOTAL.with_label_values(&[label]).inc_by(emitted.len() as u64);
        let dropped = pairs.len().saturating_sub(emitted.len());
        IMPRESSIONS_DROPPED_TOTAL.with_label_values(&[label]).inc_by(dropped as u64);

        emitted
    }

    pub fn pop_counter(&self) -> Vec<crate::core::impressions::counter::CountPerFeature> {
        self.counter.pop_all()
    }

    pub fn pop_unique_keys(&self) -> std::collections::HashMap<String, std::collections::HashSet<String>> {
        self.unique_keys.pop_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn imp(key: &str, feature: &str, time: i64) -> Impression {
        Impression::new(key, feature, "on", "l1", 1, time)
    }

    struct RecordingListener {
        seen: Arc<Mutex<Vec<Impression>>>,
    }

    impl Listener for RecordingListener {
        fn log(&self, impression: &Impression, _attributes: Option<&Value>) {
            self.seen.lock().push(impression.clone());
        }
    }

    #[test]
    fn debug_mode_emits_and_notifies_listener_for_every_pair() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let manager = Manager::new(Some(Box::new(RecordingListener { seen: seen.clone() })), Strategy::Debug);

        let emitted = manager.process_impressions(&[
            (imp("k1", "f1", 1000), None),
            (imp("k2", "f1", 1001), None),
        ]);
        assert_eq!(emitted.len(), 2);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn none_mode_returns_empty_but_still_notifies_listener_once_per_pair() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let manager = Manager::new(Some(Box::new(RecordingListener { seen: seen.clone() })), Strategy::None);

        let emitted = manager.process_impressions(&[(imp("k1", "f1", 1000), None)]);
        assert!(emitted.is_empty());
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(manager.pop_unique_keys()["f1"].len(), 1);
    }

    #[test]
    fn works_without_a_listener() {
        let manager = Manager::new(None, Strategy::Optimized);
        let emitted = manager.process_impressions(&[(imp("k1", "f1", 1000), None)]);
        assert_eq!(emitted.len(), 1);
    }
}
