// src/core/storage.rs

//! The storage interface consumed by the synchronizer (§6), plus a simple
//! in-memory reference implementation used by this crate's own tests and
//! demo binary.
//!
//! Persistence layouts for in-memory storage are explicitly a non-goal
//! (§1); `InMemorySplitStorage` below is deliberately the simplest
//! `Mutex`-guarded `HashMap` that satisfies the trait's contract, not a
//! specified storage backend.

use crate::core::model::{ChangeNumber, Flag};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

/// Storage interface consumed by the synchronizer (§6).
#[async_trait]
pub trait SplitStorage: Send + Sync {
    async fn get_change_number(&self) -> Option<ChangeNumber>;
    async fn set_change_number(&self, change_number: ChangeNumber);
    async fn put(&self, flag: Flag);
    async fn remove(&self, name: &str);
    async fn get_split_names(&self) -> HashSet<String>;
    async fn kill_locally(&self, name: &str, default_treatment: &str, change_number: ChangeNumber);
}

#[derive(Debug, Default)]
struct Inner {
    flags: HashMap<String, Flag>,
    change_number: Option<ChangeNumber>,
}

/// A `Mutex`-guarded in-memory `SplitStorage`, following the same
/// "single mutex around the whole map" shape `spineldb`'s `DbShard` uses
/// around its `ShardCache`, scaled down since this storage has no
/// per-key memory accounting to do.
#[derive(Debug, Default)]
pub struct InMemorySplitStorage {
    inner: Mutex<Inner>,
}

impl InMemorySplitStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SplitStorage for InMemorySplitStorage {
    async fn get_change_number(&self) -> Option<ChangeNumber> {
        self.inner.lock().await.change_number
    }

    async fn set_change_number(&self, change_number: ChangeNumber) {
        self.inner.lock().await.change_number = Some(change_number);
    }

    async fn put(&self, flag: Flag) {
        self.inner.lock().await.flags.insert(flag.name.clone(), flag);
    }

    async fn remove(&self, name: &str) {
        self.inner.lock().await.flags.remove(name);
    }

    async fn get_split_names(&self) -> HashSet<String> {
        self.inner.lock().await.flags.keys().cloned().collect()
    }

    async fn kill_locally(&self, name: &str, default_treatment: &str, change_number: ChangeNumber) {
        let mut guard = self.inner.lock().await;
        if let Some(flag) = guard.flags.get_mut(name) {
            flag.killed = true;
            flag.default_treatment = default_treatment.to_string();
        }
        // Per §9 Open Question: kill_locally only advances the change
        // number, it never regresses it.
        let advances = guard.change_number.is_none_or(|current| change_number > current);
        if advances {
            guard.change_number = Some(change_number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Combiner, Condition, ConditionType, Matcher, MatcherGroup, Status};

    fn sample_flag(name: &str) -> Flag {
        Flag {
            name: name.to_string(),
            traffic_type_name: "user".to_string(),
            traffic_allocation: 100,
            traffic_allocation_seed: 1,
            seed: 1,
            status: Status::Active,
            killed: false,
            default_treatment: "off".to_string(),
            change_number: 1,
            algo: 2,
            conditions: vec![Condition {
                condition_type: ConditionType::Rollout,
                matcher_group: MatcherGroup {
                    combiner: Combiner::And,
                    matchers: vec![Matcher::all_keys()],
                },
                partitions: vec![],
                label: "default rule".to_string(),
            }],
            configurations: None,
        }
    }

    #[tokio::test]
    async fn put_get_remove_round_trip() {
        let storage = InMemorySplitStorage::new();
        assert_eq!(storage.get_change_number().await, None);
        storage.put(sample_flag("f1")).await;
        assert_eq!(storage.get_split_names().await, HashSet::from(["f1".to_string()]));
        storage.remove("f1").await;
        assert!(storage.get_split_names().await.is_empty());
    }

    #[tokio::test]
    async fn kill_locally_advances_change_number_only_forward() {
        let storage = InMemorySplitStorage::new();
        storage.put(sample_flag("f1")).await;
        storage.set_change_number(10).await;

        storage.kill_locally("f1", "control", 5).await;
        assert_eq!(storage.get_change_number().await, Some(10));

        storage.kill_locally("f1", "control", 20).await;
        assert_eq!(storage.get_change_number().await, Some(20));
    }
}
