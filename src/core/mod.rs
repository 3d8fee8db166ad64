// src/core/mod.rs

//! The central module containing the core logic and data structures of
//! the flag synchronization and impression pipeline.

pub mod backoff;
pub mod errors;
pub mod fetch;
pub mod impressions;
pub mod metrics;
pub mod model;
pub mod sanitize;
pub mod storage;
pub mod sync;

pub use errors::SdkError;
pub use model::{Flag, FetchResponse, Impression};
pub use storage::{InMemorySplitStorage, SplitStorage};
