// src/core/errors.rs

//! Defines the primary error type for the synchronizer and impression
//! pipeline.

use std::sync::Arc;
use thiserror::Error;

/// The unified error type surfaced across the synchronize boundary (§7).
///
/// `Api` and `Parse` are kept as distinct variants internally so local-file
/// parsing failures carry a useful message while they're being constructed,
/// but `LocalSplitSynchronizer::synchronize` maps any `Parse` into an `Api`
/// before returning, so callers only ever need to handle one error kind at
/// the public boundary, per §7.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("api error (status {status:?}): {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),
}

impl SdkError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        SdkError::Api {
            status,
            message: message.into(),
        }
    }

    /// Maps any error kind to the single opaque "error fetching splits
    /// information" `Api` failure local-mode callers are expected to see
    /// (§4.3.2, §7).
    pub fn into_fetching_splits_error(self) -> Self {
        match self {
            api @ SdkError::Api { .. } => api,
            other => SdkError::Api {
                status: None,
                message: format!("error fetching splits information: {other}"),
            },
        }
    }
}

impl Clone for SdkError {
    fn clone(&self) -> Self {
        match self {
            SdkError::Api { status, message } => SdkError::Api {
                status: *status,
                message: message.clone(),
            },
            SdkError::Parse(s) => SdkError::Parse(s.clone()),
            SdkError::Io(e) => SdkError::Io(Arc::clone(e)),
        }
    }
}

impl PartialEq for SdkError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                SdkError::Api { status: s1, message: m1 },
                SdkError::Api { status: s2, message: m2 },
            ) => s1 == s2 && m1 == m2,
            (SdkError::Parse(a), SdkError::Parse(b)) => a == b,
            (SdkError::Io(a), SdkError::Io(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for SdkError {
    fn from(e: std::io::Error) -> Self {
        SdkError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Parse(e.to_string())
    }
}

impl From<serde_yaml::Error> for SdkError {
    fn from(e: serde_yaml::Error) -> Self {
        SdkError::Parse(e.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
