// src/core/sanitize.rs

//! The sanitizer (§4.2): coerces an untrusted, loosely-typed fetch response
//! into the normalized shape described in §3, silently logging every
//! coercion it applies (mirroring the Python original's
//! `_LOGGER.debug("Sanitized element [%s] ...")` calls in
//! `LocalSplitSynchronizer._sanitize_split_element`).
//!
//! Pure: no I/O, no storage mutation (§4.2).

use crate::core::model::{Combiner, Condition, ConditionType, FetchResponse, Flag, Matcher, MatcherGroup, RawFetchResponse, Status};
use serde_json::Value;
use tracing::{debug, warn};

const DEFAULT_TRAFFIC_TYPE: &str = "user";
const DEFAULT_TRAFFIC_ALLOCATION: u32 = 100;
const DEFAULT_DEFAULT_TREATMENT: &str = "on";
const DEFAULT_ALGO: u32 = 2;
const DEFAULT_ROLLOUT_LABEL: &str = "default rule";

/// Sanitizes a raw fetch response into the normalized shape storage expects.
///
/// `now_ms` supplies the "current-epoch-ms" default used for
/// `trafficAllocationSeed`/`seed` (§4.2 field table), injected rather than
/// read from the system clock directly, per the crate-wide "time must be
/// injectable" design note (§9).
pub fn sanitize_fetch_response(raw: RawFetchResponse, now_ms: i64) -> FetchResponse {
    let mut till = raw.till.unwrap_or(-1);
    if till < -1 {
        debug!(till, "sanitized till to -1 (missing, null, or < -1)");
        till = -1;
    }

    let since = match raw.since {
        Some(s) if s >= -1 && s <= till => s,
        other => {
            debug!(?other, till, "sanitized since to till");
            till
        }
    };

    let splits = raw
        .splits
        .into_iter()
        .filter_map(|v| sanitize_split(v, now_ms))
        .collect();

    FetchResponse { splits, since, till }
}

fn sanitize_split(value: Value, now_ms: i64) -> Option<Flag> {
    let mut obj = match value {
        Value::Object(map) => map,
        _ => {
            warn!("dropping split: not a JSON object");
            return None;
        }
    };

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if name.is_empty() {
        warn!("dropping split: name missing or blank");
        return None;
    }
    let name = name.to_string();

    sanitize_str_field(&mut obj, &name, "trafficTypeName", DEFAULT_TRAFFIC_TYPE, None);
    sanitize_u32_field(
        &mut obj,
        &name,
        "trafficAllocation",
        DEFAULT_TRAFFIC_ALLOCATION,
        Some(0),
        Some(100),
    );
    sanitize_i64_field(&mut obj, &name, "trafficAllocationSeed", now_ms, Some(0), None);
    sanitize_i64_field(&mut obj, &name, "seed", now_ms, Some(0), None);
    sanitize_status_field(&mut obj, &name);
    sanitize_bool_field(&mut obj, &name, "killed", false);
    sanitize_default_treatment_field(&mut obj, &name);
    sanitize_i64_field(&mut obj, &name, "changeNumber", 0, Some(0), None);
    sanitize_algo_field(&mut obj, &name);
    sanitize_conditions_field(&mut obj, &name);

    match serde_json::from_value::<Flag>(Value::Object(obj)) {
        Ok(flag) => Some(flag),
        Err(e) => {
            warn!(split = %name, error = %e, "dropping split: failed to parse after sanitization");
            None
        }
    }
}

fn sanitize_str_field(
    obj: &mut serde_json::Map<String, Value>,
    split_name: &str,
    field: &str,
    default: &str,
    not_in: Option<&[&str]>,
) {
    let needs_default = match obj.get(field) {
        Some(Value::String(s)) => not_in.is_some_and(|blacklist| blacklist.contains(&s.as_str())),
        _ => true,
    };
    if needs_default {
        debug!(split = split_name, field, default, "sanitized field to default");
        obj.insert(field.to_string(), Value::String(default.to_string()));
    }
}

fn sanitize_default_treatment_field(obj: &mut serde_json::Map<String, Value>, split_name: &str) {
    sanitize_str_field(
        obj,
        split_name,
        "defaultTreatment",
        DEFAULT_DEFAULT_TREATMENT,
        Some(&["", " "]),
    );
}

fn sanitize_bool_field(
    obj: &mut serde_json::Map<String, Value>,
    split_name: &str,
    field: &str,
    default: bool,
) {
    if !matches!(obj.get(field), Some(Value::Bool(_))) {
        debug!(split = split_name, field, default, "sanitized field to default");
        obj.insert(field.to_string(), Value::Bool(default));
    }
}

fn sanitize_i64_field(
    obj: &mut serde_json::Map<String, Value>,
    split_name: &str,
    field: &str,
    default: i64,
    lower: Option<i64>,
    upper: Option<i64>,
) {
    let current = obj.get(field).and_then(Value::as_i64);
    let out_of_range = current.is_some_and(|v| {
        lower.is_some_and(|lo| v < lo) || upper.is_some_and(|hi| v > hi)
    });
    if current.is_none() || out_of_range {
        debug!(split = split_name, field, default, "sanitized field to default");
        obj.insert(field.to_string(), Value::Number(default.into()));
    }
}

fn sanitize_u32_field(
    obj: &mut serde_json::Map<String, Value>,
    split_name: &str,
    field: &str,
    default: u32,
    lower: Option<u32>,
    upper: Option<u32>,
) {
    let current = obj.get(field).and_then(Value::as_u64).map(|v| v as u32);
    let out_of_range = current.is_some_and(|v| {
        lower.is_some_and(|lo| v < lo) || upper.is_some_and(|hi| v > hi)
    });
    if current.is_none() || out_of_range {
        debug!(split = split_name, field, default, "sanitized field to default");
        obj.insert(field.to_string(), Value::Number(default.into()));
    }
}

fn sanitize_status_field(obj: &mut serde_json::Map<String, Value>, split_name: &str) {
    let valid = matches!(
        obj.get("status").and_then(Value::as_str),
        Some("ACTIVE") | Some("ARCHIVED")
    );
    if !valid {
        debug!(split = split_name, field = "status", default = "ACTIVE", "sanitized field to default");
        obj.insert("status".to_string(), Value::String("ACTIVE".to_string()));
    }
}

fn sanitize_algo_field(obj: &mut serde_json::Map<String, Value>, split_name: &str) {
    let valid = obj.get("algo").and_then(Value::as_i64) == Some(2);
    if !valid {
        debug!(split = split_name, field = "algo", default = DEFAULT_ALGO, "sanitized field to default");
        obj.insert("algo".to_string(), Value::Number(DEFAULT_ALGO.into()));
    }
}

fn sanitize_conditions_field(obj: &mut serde_json::Map<String, Value>, split_name: &str) {
    let has_valid_conditions = matches!(obj.get("conditions"), Some(Value::Array(_)));
    if !has_valid_conditions {
        obj.insert("conditions".to_string(), Value::Array(Vec::new()));
    }

    let has_all_keys_rollout = obj
        .get("conditions")
        .and_then(Value::as_array)
        .map(|conditions| conditions.iter().any(is_all_keys_rollout_condition))
        .unwrap_or(false);

    if !has_all_keys_rollout {
        debug!(
            split = split_name,
            "missing ROLLOUT+ALL_KEYS condition, appending default rule (100% off)"
        );
        let guard = default_rollout_guard();
        match obj.get_mut("conditions") {
            Some(Value::Array(conditions)) => {
                conditions.push(serde_json::to_value(guard).expect("guard condition serializes"));
            }
            _ => unreachable!("conditions field was just normalized to an array"),
        }
    }
}

fn is_all_keys_rollout_condition(condition: &Value) -> bool {
    let condition_type = condition.get("conditionType").and_then(Value::as_str);
    if condition_type != Some("ROLLOUT") {
        return false;
    }
    condition
        .get("matcherGroup")
        .and_then(|mg| mg.get("matchers"))
        .and_then(Value::as_array)
        .map(|matchers| {
            matchers
                .iter()
                .any(|m| m.get("matcherType").and_then(Value::as_str) == Some("ALL_KEYS"))
        })
        .unwrap_or(false)
}

/// The default-rule guard condition appended when a flag has no
/// `ROLLOUT`+`ALL_KEYS` condition (§3 invariant): 100% off.
fn default_rollout_guard() -> Condition {
    Condition {
        condition_type: ConditionType::Rollout,
        matcher_group: MatcherGroup {
            combiner: Combiner::And,
            matchers: vec![Matcher::all_keys()],
        },
        partitions: vec![
            crate::core::model::Partition {
                treatment: "on".to_string(),
                size: 0,
            },
            crate::core::model::Partition {
                treatment: "off".to_string(),
                size: 100,
            },
        ],
        label: DEFAULT_ROLLOUT_LABEL.to_string(),
    }
}
