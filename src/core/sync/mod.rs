// src/core/sync/mod.rs

//! The split synchronizer (§4.3): `RemoteSplitSynchronizer` drives
//! fetch-until-converged convergence over the remote fetch API with
//! bounded exponential backoff and CDN-bypass escalation;
//! `LocalSplitSynchronizer` (in `local.rs`) dispatches to one of three
//! on-disk file formats instead.

pub mod local;
pub mod local_json;
pub mod local_legacy;
pub mod local_yaml;

use crate::core::backoff::Backoff;
use crate::core::errors::SdkResult;
use crate::core::fetch::{FetchOptions, SplitFetcher};
use crate::core::model::{ChangeNumber, Flag};
use crate::core::sanitize::sanitize_fetch_response;
use crate::core::storage::SplitStorage;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info};

pub use local::{LocalSplitSynchronizer, LocalhostMode};

const ON_DEMAND_FETCH_BACKOFF_MAX_RETRIES: u32 = 10;

/// Drives fetch-until-converged convergence against the remote fetch API
/// (§4.3.1), with bounded exponential retry and CDN-bypass escalation.
pub struct RemoteSplitSynchronizer<F: SplitFetcher, S: SplitStorage> {
    api: Arc<F>,
    storage: Arc<S>,
    backoff: Backoff,
    max_retries: u32,
    now_ms: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl<F: SplitFetcher, S: SplitStorage> RemoteSplitSynchronizer<F, S> {
    pub fn new(api: Arc<F>, storage: Arc<S>) -> Self {
        Self::with_backoff(api, storage, Backoff::default(), ON_DEMAND_FETCH_BACKOFF_MAX_RETRIES)
    }

    pub fn with_backoff(
        api: Arc<F>,
        storage: Arc<S>,
        backoff: Backoff,
        max_retries: u32,
    ) -> Self {
        Self {
            api,
            storage,
            backoff,
            max_retries,
            now_ms: Box::new(crate::time::current_epoch_time_ms),
        }
    }

    /// Overrides the clock used for sanitization defaults (tests only).
    pub fn with_clock(mut self, now_ms: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.now_ms = Box::new(now_ms);
        self
    }

    /// Public entry point (§4.3.1): attempts a normal sync, and if it
    /// doesn't converge within the retry budget, retries once more with
    /// CDN bypass using the last observed change number as a hint.
    pub async fn synchronize(&self, till: Option<ChangeNumber>) -> SdkResult<HashSet<String>> {
        let mut segments = HashSet::new();

        let first = self
            .attempt_sync(FetchOptions::no_cache(), till)
            .await?;
        segments.extend(first.segments);
        if first.converged {
            debug!(attempts = first.attempts, "refresh completed");
            return Ok(segments);
        }

        let bypass_opts = FetchOptions::no_cache_with_hint(first.change_number);
        let second = self.attempt_sync(bypass_opts, till).await?;
        segments.extend(second.segments);
        if second.converged {
            debug!(attempts = second.attempts, "refresh completed bypassing the CDN");
        } else {
            crate::core::metrics::SYNC_FAILURES_TOTAL.inc();
            debug!(
                attempts = second.attempts,
                "no changes fetched after exhausting retries with CDN bypass"
            );
        }
        Ok(segments)
    }

    /// A single `kill_split` passthrough to storage (§4.3.1).
    pub async fn kill_split(&self, name: &str, default_treatment: &str, change_number: ChangeNumber) {
        self.storage.kill_locally(name, default_treatment, change_number).await;
    }

    /// The bounded retry wrapper (§4.3.1 pseudocode).
    async fn attempt_sync(
        &self,
        options: FetchOptions,
        till: Option<ChangeNumber>,
    ) -> SdkResult<AttemptOutcome> {
        self.backoff.reset();
        let mut remaining = self.max_retries as i64;
        let mut segments = HashSet::new();
        let mut attempts = 0u32;

        loop {
            remaining -= 1;
            attempts += 1;
            let (change_number, fetched_segments) = self.fetch_until(options, till).await?;
            segments.extend(fetched_segments);

            if till.is_none_or(|t| t <= change_number) {
                return Ok(AttemptOutcome {
                    converged: true,
                    change_number,
                    segments,
                    attempts,
                });
            }
            if remaining <= 0 {
                return Ok(AttemptOutcome {
                    converged: false,
                    change_number,
                    segments,
                    attempts,
                });
            }
            sleep(self.backoff.next()).await;
        }
    }

    /// Drives convergence for a single pass (§4.3.1 pseudocode).
    async fn fetch_until(
        &self,
        options: FetchOptions,
        till: Option<ChangeNumber>,
    ) -> SdkResult<(ChangeNumber, HashSet<String>)> {
        let mut segments = HashSet::new();
        loop {
            let change_number = self.storage.get_change_number().await.unwrap_or(-1);
            if let Some(t) = till {
                if t < change_number {
                    return Ok((change_number, segments));
                }
            }

            crate::core::metrics::SYNC_ATTEMPTS_TOTAL.inc();
            let raw = self.api.fetch(change_number, options).await?;
            let resp = sanitize_fetch_response(raw, (self.now_ms)());

            for flag in resp.splits {
                debug!(split = %flag.name, status = %flag.status, "applying split update");
                if flag.status == crate::core::model::Status::Active {
                    segments.extend(flag.segment_names());
                    apply_put(&self.storage, flag).await;
                } else {
                    self.storage.remove(&flag.name).await;
                }
            }
            self.storage.set_change_number(resp.till).await;

            if resp.till == resp.since {
                info!(till = resp.till, "splits converged");
                return Ok((resp.till, segments));
            }
        }
    }
}

async fn apply_put<S: SplitStorage>(storage: &Arc<S>, flag: Flag) {
    storage.put(flag).await;
}

struct AttemptOutcome {
    converged: bool,
    change_number: ChangeNumber,
    segments: HashSet<String>,
    attempts: u32,
}
