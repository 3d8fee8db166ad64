// src/bin/flagcore-demo.rs

//! A thin demo binary wiring a `RemoteSplitSynchronizer` and an impression
//! `Manager` against the in-memory reference implementations, for manual
//! smoke-testing. Not part of the specified surface, the way `spineldb`'s
//! `main.rs` wires `Config` + `server::run` for its own binary.

use async_trait::async_trait;
use flagcore::config::SdkConfig;
use flagcore::core::backoff::Backoff;
use flagcore::core::errors::SdkResult;
use flagcore::core::fetch::{FetchOptions, SplitFetcher};
use flagcore::core::impressions::{Manager, Strategy};
use flagcore::core::model::{ChangeNumber, Impression, RawFetchResponse};
use flagcore::core::storage::InMemorySplitStorage;
use flagcore::core::sync::RemoteSplitSynchronizer;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// An in-memory fetcher that converges after a single response, standing in
/// for a real HTTP transport (out of scope, §1).
struct StaticFetcher;

#[async_trait]
impl SplitFetcher for StaticFetcher {
    async fn fetch(&self, change_number: ChangeNumber, _options: FetchOptions) -> SdkResult<RawFetchResponse> {
        if change_number >= 100 {
            return Ok(RawFetchResponse { splits: vec![], since: Some(100), till: Some(100) });
        }
        Ok(RawFetchResponse {
            splits: vec![json!({
                "name": "demo_feature",
                "status": "ACTIVE",
                "trafficTypeName": "user",
                "trafficAllocation": 100,
                "trafficAllocationSeed": 1,
                "seed": 1,
                "killed": false,
                "defaultTreatment": "off",
                "changeNumber": 100,
                "algo": 2,
                "conditions": [],
            })],
            since: Some(-1),
            till: Some(100),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    if std::env::args().any(|arg| arg == "--version") {
        println!("flagcore-demo version {VERSION}");
        return Ok(());
    }

    tracing_subscriber::fmt().with_env_filter("info").init();
    info!(version = VERSION, "starting flagcore-demo");

    let config = SdkConfig::default();
    let storage = Arc::new(InMemorySplitStorage::new());
    let fetcher = Arc::new(StaticFetcher);
    let synchronizer = RemoteSplitSynchronizer::with_backoff(
        fetcher,
        storage.clone(),
        Backoff::new(config.backoff_base_secs, config.backoff_max_wait_secs),
        config.on_demand_fetch_max_retries,
    );

    synchronizer.synchronize(None).await?;
    info!(splits = ?storage.get_split_names().await, "synchronizer converged");

    let manager = Manager::with_observer_cache_size(None, Strategy::Optimized, config.observer_cache_size);
    let impression = Impression::new("user-1", "demo_feature", "off", "default rule", 100, flagcore::time::current_epoch_time_ms());
    let emitted = manager.process_impressions(&[(impression, None)]);
    info!(emitted = emitted.len(), "impression pipeline processed one evaluation");

    Ok(())
}
