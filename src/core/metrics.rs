// src/core/metrics.rs

//! Defines and registers the Prometheus metrics for the synchronizer and
//! impression pipeline.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only
//! once globally for the process lifetime, the way `spineldb::core::metrics`
//! does it.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, register_counter, register_counter_vec};

lazy_static! {
    /// Bumped by the auth collaborator on every HTTP 401 (§4.5).
    pub static ref AUTH_REJECTIONS_TOTAL: Counter = register_counter!(
        "flagcore_auth_rejections_total",
        "Total number of 401 responses received while authenticating for streaming."
    )
    .unwrap();

    /// One increment per `fetch_until` iteration, across all synchronizers.
    pub static ref SYNC_ATTEMPTS_TOTAL: Counter = register_counter!(
        "flagcore_sync_attempts_total",
        "Total number of fetch attempts issued by the split synchronizer."
    )
    .unwrap();

    /// One increment per exhausted `attempt_sync` pass (backoff retries used up
    /// without convergence).
    pub static ref SYNC_FAILURES_TOTAL: Counter = register_counter!(
        "flagcore_sync_failures_total",
        "Total number of attempt_sync passes that exhausted their retry budget."
    )
    .unwrap();

    /// Impressions returned to the caller for upload, labeled by strategy.
    pub static ref IMPRESSIONS_EMITTED_TOTAL: CounterVec = register_counter_vec!(
        "flagcore_impressions_emitted_total",
        "Total number of impressions returned for upload, labeled by strategy.",
        &["strategy"]
    )
    .unwrap();

    /// Impressions deduplicated/dropped by the strategy, labeled by strategy.
    pub static ref IMPRESSIONS_DROPPED_TOTAL: CounterVec = register_counter_vec!(
        "flagcore_impressions_dropped_total",
        "Total number of input impressions not returned for upload, labeled by strategy.",
        &["strategy"]
    )
    .unwrap();
}
