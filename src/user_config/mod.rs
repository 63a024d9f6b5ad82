mod loader;

pub use loader::{load_user_config, load_user_config_from, resolve_repo_path};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable overriding the repository location.
pub const REPO_PATH_ENV: &str = "AIMGR_REPO_PATH";

#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("Failed to read user config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse user config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// `[repo]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `[install]` table; `targets` is the fallback tool list for projects
/// that have neither tool directories nor manifest targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InstallDefaults {
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

fn default_targets() -> Vec<String> {
    vec!["claude".to_string()]
}

impl Default for InstallDefaults {
    fn default() -> Self {
        Self {
            targets: default_targets(),
        }
    }
}

/// `[log]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,
}

/// Top-level user configuration, deserialized from `~/.aimgr/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserConfig {
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub install: InstallDefaults,
    #[serde(default)]
    pub log: LogSettings,
}

/// Resolve the canonical path for the user config file.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".aimgr").join("config.toml"))
}

/// Repository location used when nothing else names one.
#[must_use]
pub fn default_repo_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("aimgr")
        .join("repo")
}

#[cfg(test)]
#[path = "../user_config_tests.rs"]
mod user_config_tests;
