// tests/sync_test.rs

//! End-to-end scenarios for `RemoteSplitSynchronizer` (§8 scenarios 1-3):
//! remote convergence, CDN-bypass escalation, and backoff exhaustion.

use async_trait::async_trait;
use flagcore::core::backoff::Backoff;
use flagcore::core::errors::SdkResult;
use flagcore::core::fetch::{FetchOptions, SplitFetcher};
use flagcore::core::model::{ChangeNumber, RawFetchResponse};
use flagcore::core::storage::{InMemorySplitStorage, SplitStorage};
use flagcore::core::sync::RemoteSplitSynchronizer;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn active_flag(name: &str, change_number: i64) -> serde_json::Value {
    json!({
        "name": name,
        "status": "ACTIVE",
        "trafficTypeName": "user",
        "trafficAllocation": 100,
        "trafficAllocationSeed": 1,
        "seed": 1,
        "killed": false,
        "defaultTreatment": "off",
        "changeNumber": change_number,
        "algo": 2,
        "conditions": [],
    })
}

struct ScriptedFetcher {
    calls: AtomicU32,
    responses: Vec<RawFetchResponse>,
}

#[async_trait]
impl SplitFetcher for ScriptedFetcher {
    async fn fetch(&self, _change_number: ChangeNumber, _options: FetchOptions) -> SdkResult<RawFetchResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(self.responses[n.min(self.responses.len() - 1)].clone())
    }
}

#[tokio::test]
async fn remote_convergence_applies_the_flag_and_advances_change_number() {
    let storage = Arc::new(InMemorySplitStorage::new());
    let fetcher = Arc::new(ScriptedFetcher {
        calls: AtomicU32::new(0),
        responses: vec![
            RawFetchResponse { splits: vec![active_flag("A", 100)], since: Some(-1), till: Some(100) },
            RawFetchResponse { splits: vec![], since: Some(100), till: Some(100) },
        ],
    });

    let synchronizer = RemoteSplitSynchronizer::with_backoff(fetcher.clone(), storage.clone(), Backoff::new(0, 0), 10);
    synchronizer.synchronize(None).await.unwrap();

    assert_eq!(storage.get_split_names().await, std::collections::HashSet::from(["A".to_string()]));
    assert_eq!(storage.get_change_number().await, Some(100));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cdn_bypass_escalation_converges_on_the_second_pass() {
    let storage = Arc::new(InMemorySplitStorage::new());
    // The first 10 calls (the normal pass's full retry budget) converge
    // internally at till=150, short of the requested till=200, so the
    // first attempt_sync pass exhausts its retries without reaching 200.
    // The bypass pass then gets fresh data and reaches 200 in two calls.
    let mut responses = vec![RawFetchResponse { splits: vec![], since: Some(150), till: Some(150) }; 10];
    responses.push(RawFetchResponse { splits: vec![], since: Some(150), till: Some(200) });
    responses.push(RawFetchResponse { splits: vec![], since: Some(200), till: Some(200) });
    let fetcher = Arc::new(ScriptedFetcher { calls: AtomicU32::new(0), responses });

    let synchronizer = RemoteSplitSynchronizer::with_backoff(fetcher.clone(), storage.clone(), Backoff::new(0, 0), 10);
    synchronizer.synchronize(Some(200)).await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 12);
    assert_eq!(storage.get_change_number().await, Some(200));
}

#[tokio::test]
async fn backoff_exhaustion_gives_up_after_the_retry_budget_on_both_passes() {
    let storage = Arc::new(InMemorySplitStorage::new());
    // Never converges: every fetch reports till=100 while the caller wants 200.
    let fetcher = Arc::new(ScriptedFetcher {
        calls: AtomicU32::new(0),
        responses: vec![RawFetchResponse { splits: vec![], since: Some(100), till: Some(100) }],
    });

    let synchronizer = RemoteSplitSynchronizer::with_backoff(fetcher.clone(), storage.clone(), Backoff::new(0, 0), 10);
    synchronizer.synchronize(Some(200)).await.unwrap();

    // 10 attempts in the first pass, 10 more in the CDN-bypass pass.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 20);
    assert_eq!(storage.get_change_number().await, Some(100));
}
