// src/core/sync/local.rs

//! `LocalSplitSynchronizer` (§4.3.2): reads flag definitions from a file
//! instead of the remote fetch API, in one of three on-disk formats
//! selected at construction.

use crate::core::errors::SdkResult;
use crate::core::model::ChangeNumber;
use crate::core::storage::SplitStorage;
use crate::core::sync::{local_json, local_legacy, local_yaml};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// The three on-disk localhost formats (§4.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalhostMode {
    Legacy,
    Yaml,
    Json,
}

/// The fixed `changeNumber` local-mode flags carry (§4.3.2, confirmed by
/// `original_source/splitio/sync/split.py`'s `_make_split`).
pub(crate) const LOCALHOST_CHANGE_NUMBER: ChangeNumber = 123;
/// Fixed `trafficAllocationSeed`, also pinned by the Python original.
pub(crate) const LOCALHOST_TRAFFIC_ALLOCATION_SEED: i64 = 123_456;
/// Fixed `seed`, also pinned by the Python original.
pub(crate) const LOCALHOST_SEED: i64 = 321_654;
/// The label synthesized conditions carry in local mode.
pub(crate) const LOCALHOST_CONDITION_LABEL: &str = "some_other_label";

pub struct LocalSplitSynchronizer<S: SplitStorage> {
    filename: PathBuf,
    storage: Arc<S>,
    mode: LocalhostMode,
    current_json_sha: Mutex<String>,
}

impl<S: SplitStorage> LocalSplitSynchronizer<S> {
    pub fn new(filename: impl Into<PathBuf>, storage: Arc<S>, mode: LocalhostMode) -> Self {
        Self {
            filename: filename.into(),
            storage,
            mode,
            current_json_sha: Mutex::new("-1".to_string()),
        }
    }

    /// Updates splits in storage from the file (§4.3.2). `till` is accepted
    /// for interface parity with the remote synchronizer but unused, as in
    /// the Python original's `LocalSplitSynchronizer.synchronize_splits`.
    pub async fn synchronize(&self, _till: Option<ChangeNumber>) -> SdkResult<HashSet<String>> {
        info!(mode = ?self.mode, "synchronizing splits from local file");
        let result = match self.mode {
            LocalhostMode::Legacy => local_legacy::synchronize(&self.filename, &self.storage).await,
            LocalhostMode::Yaml => local_yaml::synchronize(&self.filename, &self.storage).await,
            LocalhostMode::Json => {
                local_json::synchronize(&self.filename, &self.storage, &self.current_json_sha).await
            }
        };
        result.map_err(|e| e.into_fetching_splits_error())
    }

    pub async fn kill_split(&self, name: &str, default_treatment: &str, change_number: ChangeNumber) {
        self.storage.kill_locally(name, default_treatment, change_number).await;
    }
}

/// Shared builders for the legacy and YAML parsers (§4.3.2), grounded on
/// `original_source/splitio/sync/split.py`'s `_make_split`,
/// `_make_all_keys_condition`, and `_make_whitelist_condition`.
pub(crate) mod builders {
    use super::*;
    use crate::core::model::{
        Combiner, Condition, ConditionType, Flag, Matcher, MatcherGroup, Partition, Status,
    };
    use std::collections::HashMap;

    pub fn all_keys_condition(treatment: &str) -> Condition {
        Condition {
            condition_type: ConditionType::Whitelist,
            matcher_group: MatcherGroup {
                combiner: Combiner::And,
                matchers: vec![Matcher::all_keys()],
            },
            partitions: vec![Partition {
                treatment: treatment.to_string(),
                size: 100,
            }],
            label: LOCALHOST_CONDITION_LABEL.to_string(),
        }
    }

    pub fn whitelist_condition(keys: Vec<String>, treatment: &str) -> Condition {
        Condition {
            condition_type: ConditionType::Whitelist,
            matcher_group: MatcherGroup {
                combiner: Combiner::And,
                matchers: vec![Matcher::whitelist(keys)],
            },
            partitions: vec![Partition {
                treatment: treatment.to_string(),
                size: 100,
            }],
            label: LOCALHOST_CONDITION_LABEL.to_string(),
        }
    }

    pub fn make_split(name: &str, conditions: Vec<Condition>, configurations: Option<HashMap<String, String>>) -> Flag {
        Flag {
            name: name.to_string(),
            traffic_type_name: "user".to_string(),
            traffic_allocation: 100,
            traffic_allocation_seed: LOCALHOST_TRAFFIC_ALLOCATION_SEED,
            seed: LOCALHOST_SEED,
            status: Status::Active,
            killed: false,
            default_treatment: "control".to_string(),
            change_number: LOCALHOST_CHANGE_NUMBER,
            algo: 2,
            conditions,
            configurations,
        }
    }
}
