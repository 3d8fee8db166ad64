// tests/sanitize_test.rs

//! Property-based tests for the sanitizer (§4.2): for all generated raw
//! fetch responses, every sanitized field lands within its declared bound.

use flagcore::core::model::RawFetchResponse;
use flagcore::core::sanitize::sanitize_fetch_response;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn since_and_till_are_always_within_bounds(
        since in prop::option::of(-1000i64..1000),
        till in prop::option::of(-1000i64..1000),
    ) {
        let raw = RawFetchResponse { splits: vec![], since, till };
        let resp = sanitize_fetch_response(raw, 0);

        prop_assert!(resp.till >= -1);
        prop_assert!(resp.since >= -1);
        prop_assert!(resp.since <= resp.till);
    }

    #[test]
    fn traffic_allocation_is_always_between_0_and_100(
        traffic_allocation in any::<i64>(),
        name in "[a-zA-Z0-9_]{1,20}",
    ) {
        let raw: RawFetchResponse = serde_json::from_value(json!({
            "splits": [{"name": name, "trafficAllocation": traffic_allocation}],
            "till": 5
        })).unwrap();
        let resp = sanitize_fetch_response(raw, 0);

        prop_assert_eq!(resp.splits.len(), 1);
        prop_assert!(resp.splits[0].traffic_allocation <= 100);
    }

    #[test]
    fn every_sanitized_split_has_an_all_keys_rollout_condition(
        name in "[a-zA-Z0-9_]{1,20}",
        status in prop::option::of("(ACTIVE|ARCHIVED|garbage)"),
    ) {
        let raw: RawFetchResponse = serde_json::from_value(json!({
            "splits": [{"name": name, "status": status}],
            "till": 5
        })).unwrap();
        let resp = sanitize_fetch_response(raw, 0);

        prop_assert_eq!(resp.splits.len(), 1);
        let has_guard = resp.splits[0].conditions.iter().any(|c| {
            c.condition_type == flagcore::core::model::ConditionType::Rollout
                && c.matcher_group.matchers.iter().any(|m| {
                    m.matcher_type == flagcore::core::model::MatcherType::AllKeys
                })
        });
        prop_assert!(has_guard);
    }
}
