// src/config.rs

//! Ambient SDK configuration: the tunables the core components take as
//! constructor arguments, loaded from a TOML file the way
//! `spineldb::config::Config` is.

use crate::core::sync::LocalhostMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// The fixed size of an hour bucket in milliseconds (§3). Kept as a
/// configuration field rather than a bare constant so call sites don't
/// read as magic numbers, even though the spec fixes the value.
fn default_counter_bucket_size_ms() -> u64 {
    3_600_000
}

fn default_backoff_base_secs() -> u64 {
    10
}

fn default_backoff_max_wait_secs() -> u64 {
    30
}

fn default_on_demand_fetch_max_retries() -> u32 {
    10
}

fn default_observer_cache_size() -> usize {
    500
}

fn default_localhost_mode() -> LocalhostMode {
    LocalhostMode::Yaml
}

/// The resolved, validated SDK configuration (§4.1, §4.3.1, §4.4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    #[serde(default = "default_backoff_max_wait_secs")]
    pub backoff_max_wait_secs: u64,
    #[serde(default = "default_on_demand_fetch_max_retries")]
    pub on_demand_fetch_max_retries: u32,
    #[serde(default = "default_observer_cache_size")]
    pub observer_cache_size: usize,
    #[serde(default = "default_counter_bucket_size_ms")]
    pub counter_bucket_size_ms: u64,
    #[serde(default = "default_localhost_mode")]
    pub localhost_mode: LocalhostMode,
    #[serde(default)]
    pub localhost_file: Option<PathBuf>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            backoff_base_secs: default_backoff_base_secs(),
            backoff_max_wait_secs: default_backoff_max_wait_secs(),
            on_demand_fetch_max_retries: default_on_demand_fetch_max_retries(),
            observer_cache_size: default_observer_cache_size(),
            counter_bucket_size_ms: default_counter_bucket_size_ms(),
            localhost_mode: default_localhost_mode(),
            localhost_file: None,
        }
    }
}

impl SdkConfig {
    /// Reads and parses a TOML config file, falling back to defaults for any
    /// field it omits.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: SdkConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;
        Ok(config)
    }
}
