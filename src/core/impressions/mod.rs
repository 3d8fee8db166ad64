// src/core/impressions/mod.rs

//! The impression pipeline (§4.4): observer, counter, unique-keys tracker,
//! strategies and the manager that composes them.

pub mod counter;
pub mod fingerprint;
pub mod manager;
pub mod observer;
pub mod strategy;
pub mod unique_keys;

pub use counter::{CountPerFeature, Counter};
pub use fingerprint::{fingerprint, Fingerprint};
pub use manager::Manager;
pub use observer::Observer;
pub use strategy::Strategy;
pub use unique_keys::UniqueKeysTracker;
