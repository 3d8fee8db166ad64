// src/core/sync/local_json.rs

//! The JSON local file format (§4.3.2): a full `{splits, since, till}`
//! document. A SHA-256 of the serialized, *pre-sanitization* `splits`
//! array (§9 Open Question, resolved) gates whether anything is applied at
//! all; when it changes, the file's `till` is only applied if it is `>=`
//! the storage's current change number.

use crate::core::errors::SdkResult;
use crate::core::model::RawFetchResponse;
use crate::core::sanitize::sanitize_fetch_response;
use crate::core::storage::SplitStorage;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

pub async fn synchronize<S: SplitStorage>(
    filename: &Path,
    storage: &S,
    current_json_sha: &Mutex<String>,
) -> SdkResult<HashSet<String>> {
    let contents = tokio::fs::read_to_string(filename).await?;
    let raw: RawFetchResponse = serde_json::from_str(&contents)?;

    let pre_sanitization_splits_json = serde_json::to_string(&raw.splits)?;
    let fetched_sha = sha256_hex(&pre_sanitization_splits_json);

    let mut sha_guard = current_json_sha.lock().await;
    if *sha_guard == fetched_sha {
        debug!("local JSON file unchanged since last read, skipping");
        return Ok(HashSet::new());
    }
    *sha_guard = fetched_sha;
    drop(sha_guard);

    let sanitized = sanitize_fetch_response(raw, crate::time::current_epoch_time_ms());
    let mut segments = HashSet::new();

    let current_change_number = storage.get_change_number().await.unwrap_or(-1);
    if current_change_number <= sanitized.till {
        for flag in sanitized.splits {
            if flag.status == crate::core::model::Status::Active {
                segments.extend(flag.segment_names());
                debug!(split = %flag.name, "split updated from local JSON file");
                storage.put(flag).await;
            } else {
                storage.remove(&flag.name).await;
            }
        }
        storage.set_change_number(sanitized.till).await;
    }

    Ok(segments)
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::InMemorySplitStorage;
    use std::io::Write;

    #[tokio::test]
    async fn applies_active_and_removes_inactive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"splits": [{{"name": "f1", "status": "ACTIVE"}}, {{"name": "f2", "status": "ARCHIVED"}}], "since": -1, "till": 5}}"#
        )
        .unwrap();

        let storage = InMemorySplitStorage::new();
        let sha = Mutex::new("-1".to_string());
        let segments = synchronize(file.path(), &storage, &sha).await.unwrap();
        assert!(segments.is_empty());

        assert_eq!(storage.get_split_names().await, HashSet::from(["f1".to_string()]));
        assert_eq!(storage.get_change_number().await, Some(5));
    }

    #[tokio::test]
    async fn unchanged_content_is_a_no_op() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"splits": [{{"name": "f1", "status": "ACTIVE"}}], "since": -1, "till": 5}}"#
        )
        .unwrap();

        let storage = InMemorySplitStorage::new();
        let sha = Mutex::new("-1".to_string());
        synchronize(file.path(), &storage, &sha).await.unwrap();
        storage.remove("f1").await;

        synchronize(file.path(), &storage, &sha).await.unwrap();
        assert!(storage.get_split_names().await.is_empty(), "second read should be a no-op");
    }

    #[tokio::test]
    async fn till_not_applied_if_storage_is_already_ahead() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"splits": [{{"name": "f1", "status": "ACTIVE"}}], "since": -1, "till": 5}}"#
        )
        .unwrap();

        let storage = InMemorySplitStorage::new();
        storage.set_change_number(10).await;
        let sha = Mutex::new("-1".to_string());
        synchronize(file.path(), &storage, &sha).await.unwrap();

        assert!(storage.get_split_names().await.is_empty());
        assert_eq!(storage.get_change_number().await, Some(10));
    }
}
