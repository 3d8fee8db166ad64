// src/core/sync/local_yaml.rs

//! The YAML local file format (§4.3.2): a sequence of single-key mappings
//! `{feature: {treatment, keys?, config?}}`. Entries sharing a feature are
//! grouped; within a group, `WHITELIST` conditions (entries with `keys`)
//! precede `ALL_KEYS` conditions (entries without), per §9's Open Question
//! resolution.

use crate::core::errors::{SdkError, SdkResult};
use crate::core::storage::SplitStorage;
use crate::core::sync::local::builders;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlKeys {
    One(String),
    Many(Vec<String>),
}

impl YamlKeys {
    fn into_vec(self) -> Vec<String> {
        match self {
            YamlKeys::One(s) => vec![s],
            YamlKeys::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YamlEntryData {
    treatment: String,
    #[serde(default)]
    keys: Option<YamlKeys>,
    #[serde(default)]
    config: Option<String>,
}

type YamlEntry = HashMap<String, YamlEntryData>;

pub async fn synchronize<S: SplitStorage>(filename: &Path, storage: &S) -> SdkResult<HashSet<String>> {
    let contents = tokio::fs::read_to_string(filename).await?;
    let fetched = parse(&contents)?;

    let existing = storage.get_split_names().await;
    let to_delete: Vec<&String> = existing.iter().filter(|name| !fetched.contains_key(*name)).collect();

    for (_name, flag) in fetched {
        storage.put(flag).await;
    }
    for name in to_delete {
        storage.remove(name).await;
    }

    Ok(HashSet::new())
}

fn parse(contents: &str) -> SdkResult<HashMap<String, crate::core::model::Flag>> {
    let entries: Vec<YamlEntry> = serde_yaml::from_str(contents)?;

    // Group by feature name, preserving first-seen order both across
    // features and within each feature's entries (a stable grouping,
    // matching the Python original's `sorted(..., key=...)` +
    // `itertools.groupby`, which is also stable).
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<YamlEntryData>> = HashMap::new();
    for entry in entries {
        let (name, data) = entry
            .into_iter()
            .next()
            .ok_or_else(|| SdkError::Parse("empty YAML split entry".to_string()))?;
        if !groups.contains_key(&name) {
            order.push(name.clone());
        }
        groups.entry(name).or_default().push(data);
    }

    let mut result = HashMap::new();
    for name in order {
        let statements = groups.remove(&name).unwrap_or_default();
        let mut whitelist_conditions = Vec::new();
        let mut all_keys_conditions = Vec::new();
        let mut configs: HashMap<String, String> = HashMap::new();

        for statement in statements {
            if let Some(keys) = statement.keys {
                whitelist_conditions.push(builders::whitelist_condition(keys.into_vec(), &statement.treatment));
            } else {
                all_keys_conditions.push(builders::all_keys_condition(&statement.treatment));
            }
            if let Some(config) = statement.config {
                configs.insert(statement.treatment.clone(), config);
            }
        }

        let mut conditions = whitelist_conditions;
        conditions.extend(all_keys_conditions);
        let configurations = if configs.is_empty() { None } else { Some(configs) };
        result.insert(name.clone(), builders::make_split(&name, conditions, configurations));
    }

    Ok(result)
}
