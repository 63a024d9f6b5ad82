//! Runtime history of sources, kept apart from the declarative manifest.

use crate::utils::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

const STATE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum SourceStateError {
    #[error("Failed to read source metadata: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse source metadata: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceState {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_id: String,
    pub added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
}

impl SourceState {
    fn new(added: DateTime<Utc>) -> Self {
        Self {
            source_id: String::new(),
            added,
            last_synced: None,
        }
    }
}

/// Contents of `.metadata/sources.json`, keyed by source name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceStateFile {
    pub version: u32,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceState>,
}

impl Default for SourceStateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            sources: BTreeMap::new(),
        }
    }
}

#[must_use]
pub fn get_source_state_path(repo_path: &Path) -> PathBuf {
    repo_path.join(".metadata").join("sources.json")
}

/// Read the state file; an absent file is an empty state.
pub async fn load_source_state(repo_path: &Path) -> Result<SourceStateFile, SourceStateError> {
    let path = get_source_state_path(repo_path);
    if !path.exists() {
        return Ok(SourceStateFile::default());
    }
    let content = fs::read_to_string(&path).await?;
    Ok(serde_json::from_str(&content)?)
}

pub async fn save_source_state(
    repo_path: &Path,
    state: &SourceStateFile,
) -> Result<(), SourceStateError> {
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&get_source_state_path(repo_path), &content).await?;
    Ok(())
}

impl SourceStateFile {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SourceState> {
        self.sources.get(name)
    }

    pub fn set_added(&mut self, name: &str, added: DateTime<Utc>) {
        self.sources
            .entry(name.to_string())
            .and_modify(|s| s.added = added)
            .or_insert_with(|| SourceState::new(added));
    }

    /// Record a sync. A source seen for the first time is also marked added.
    pub fn set_last_synced(&mut self, name: &str, synced: DateTime<Utc>) {
        self.sources
            .entry(name.to_string())
            .or_insert_with(|| SourceState::new(synced))
            .last_synced = Some(synced);
    }

    pub fn set_source_id(&mut self, name: &str, source_id: &str) {
        self.sources
            .entry(name.to_string())
            .or_insert_with(|| SourceState::new(Utc::now()))
            .source_id = source_id.to_string();
    }

    pub fn delete(&mut self, name: &str) -> Option<SourceState> {
        self.sources.remove(name)
    }

    /// Move the state recorded under `old_name` to `new_name`. Returns false
    /// when nothing was recorded for `old_name`.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        match self.sources.remove(old_name) {
            Some(state) => {
                self.sources.insert(new_name.to_string(), state);
                true
            }
            None => false,
        }
    }
}
