// src/core/sync/local_legacy.rs

//! The legacy, line-oriented local file format (§4.3.2): blank lines and
//! `^#.*$` comment lines are skipped; each remaining line matching
//! `^(?P<feature>[\w_-]+)\s+(?P<treatment>[\w_-]+)$` becomes a flag with a
//! single `WHITELIST`/`ALL_KEYS` condition at 100%.

use crate::core::errors::SdkResult;
use crate::core::storage::SplitStorage;
use crate::core::sync::local::builders;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

static COMMENT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#.*$").unwrap());
static DEFINITION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<feature>[\w_-]+)\s+(?P<treatment>[\w_-]+)$").unwrap());

pub async fn synchronize<S: SplitStorage>(filename: &Path, storage: &S) -> SdkResult<HashSet<String>> {
    let contents = tokio::fs::read_to_string(filename).await?;
    let fetched = parse(&contents);

    let existing = storage.get_split_names().await;
    let to_delete: Vec<&String> = existing.iter().filter(|name| !fetched.contains_key(*name)).collect();

    for (name, _) in &fetched {
        let condition = builders::all_keys_condition(&fetched[name]);
        storage.put(builders::make_split(name, vec![condition], None)).await;
    }
    for name in to_delete {
        storage.remove(name).await;
    }

    Ok(HashSet::new())
}

/// Parses the legacy format into `feature -> treatment`. Exposed for direct
/// unit testing without touching the filesystem.
fn parse(contents: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();
    for line in contents.lines() {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() || COMMENT_LINE.is_match(trimmed) {
            continue;
        }
        match DEFINITION_LINE.captures(trimmed) {
            Some(caps) => {
                result.insert(caps["feature"].to_string(), caps["treatment"].to_string());
            }
            None => warn!(line = trimmed, "invalid line in localhost split definition file"),
        }
    }
    result
}
