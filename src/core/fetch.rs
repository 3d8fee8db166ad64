// src/core/fetch.rs

//! The external collaborator interfaces consumed by the synchronizer (§6):
//! the fetch API, the auth collaborator, and the impression listener.
//!
//! HTTP transport itself (headers, auth, retries at the socket layer) is a
//! non-goal (§1); only the shape of the contract is specified here, the way
//! `spineldb`'s command layer depends on a `Storage`/`ExecutionContext`
//! abstraction rather than embedding persistence details.

use crate::core::errors::SdkResult;
use crate::core::model::{ChangeNumber, RawFetchResponse};
use async_trait::async_trait;

/// Options threaded through a fetch call (§6).
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Forces the request to bypass any intermediate HTTP cache.
    pub cache_control_no_cache: bool,
    /// When set, upstream uses this as a `?till=<n>` query argument to
    /// defeat CDN caching during the CDN-bypass escalation (§4.3.1).
    pub till_hint: Option<ChangeNumber>,
}

impl FetchOptions {
    pub fn no_cache() -> Self {
        Self {
            cache_control_no_cache: true,
            till_hint: None,
        }
    }

    pub fn no_cache_with_hint(till_hint: ChangeNumber) -> Self {
        Self {
            cache_control_no_cache: true,
            till_hint: Some(till_hint),
        }
    }
}

/// The fetch API consumed by the remote synchronizer (§6).
#[async_trait]
pub trait SplitFetcher: Send + Sync {
    async fn fetch(
        &self,
        change_number: ChangeNumber,
        options: FetchOptions,
    ) -> SdkResult<RawFetchResponse>;
}

/// A short-lived streaming auth token. Token contents beyond existence are
/// out of scope (§4.5).
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub raw: String,
}

/// The auth collaborator (§4.5): exchanges an API key for a streaming
/// token. On HTTP 401 it must increment the `auth_rejections` telemetry
/// counter before raising; on 2xx the body parses to a token.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn authenticate(&self) -> SdkResult<AuthToken>;
}

/// Records an HTTP 401 from the auth collaborator, per §4.5. A free
/// function (rather than a method with a default body) so any `AuthClient`
/// implementation (real HTTP client or test double) calls the exact same
/// counter increment, matching the Python original's
/// `telemetry_runtime_producer.record_auth_rejections()` call in
/// `AuthAPI.authenticate` (`original_source/splitio/api/auth.py`).
pub fn record_auth_rejection() {
    crate::core::metrics::AUTH_REJECTIONS_TOTAL.inc();
}

/// The impression listener (§6), called exactly once per input pair to
/// `Manager::process_impressions` regardless of what the strategy returns
/// (§4.4.5).
pub trait Listener: Send + Sync {
    fn log(&self, impression: &crate::core::model::Impression, attributes: Option<&serde_json::Value>);
}
