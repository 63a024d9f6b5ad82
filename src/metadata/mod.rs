//! Provenance sidecars kept next to (but outside of) the resource files.
//!
//! Each resource has at most one sidecar at
//! `<repo>/.metadata/<type>s/<flattened-name>-metadata.json`.

use crate::resource::{PackageMetadata, ResourceType};
use crate::utils::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Directory under the repository root holding all sidecars
pub const METADATA_DIR: &str = ".metadata";

/// Suffix of every sidecar file name
pub const METADATA_SUFFIX: &str = "-metadata.json";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read metadata file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse metadata: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a resource came from and when it was installed.
///
/// `source_id` is the authoritative link to a manifest source;
/// `source_name` is a cached label that can go stale after a rename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub source_type: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_id: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    pub first_installed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ResourceMetadata {
    /// Fresh metadata with both timestamps set to `now`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        resource_type: ResourceType,
        source_type: impl Into<String>,
        source_url: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            resource_type,
            source_type: source_type.into(),
            source_url: source_url.into(),
            source_name: String::new(),
            source_id: String::new(),
            git_ref: None,
            first_installed: now,
            last_updated: now,
        }
    }

    /// True when `identifier` equals the recorded source ID or, for
    /// sidecars written before IDs existed, the source name.
    #[must_use]
    pub fn matches_source(&self, identifier: &str) -> bool {
        if identifier.is_empty() {
            return false;
        }
        (!self.source_id.is_empty() && self.source_id == identifier)
            || (!self.source_name.is_empty() && self.source_name == identifier)
    }
}

/// Sidecar file name for a resource name, nested `/` flattened to `-`.
#[must_use]
pub fn metadata_file_name(name: &str) -> String {
    format!("{}{METADATA_SUFFIX}", name.replace('/', "-"))
}

#[must_use]
pub fn get_metadata_dir(resource_type: ResourceType, repo_path: &Path) -> PathBuf {
    repo_path.join(METADATA_DIR).join(resource_type.dir_name())
}

#[must_use]
pub fn get_metadata_path(name: &str, resource_type: ResourceType, repo_path: &Path) -> PathBuf {
    get_metadata_dir(resource_type, repo_path).join(metadata_file_name(name))
}

#[must_use]
pub fn get_package_metadata_path(name: &str, repo_path: &Path) -> PathBuf {
    get_metadata_path(name, ResourceType::Package, repo_path)
}

/// Write a sidecar, creating or replacing it. A non-empty `source_name`
/// overrides the one recorded in `metadata`.
pub async fn save(
    metadata: &ResourceMetadata,
    repo_path: &Path,
    source_name: &str,
) -> Result<(), MetadataError> {
    let mut metadata = metadata.clone();
    if !source_name.is_empty() {
        metadata.source_name = source_name.to_string();
    }
    let path = get_metadata_path(&metadata.name, metadata.resource_type, repo_path);
    let content = serde_json::to_string_pretty(&metadata)?;
    atomic_write(&path, &content).await?;
    Ok(())
}

pub async fn load(
    name: &str,
    resource_type: ResourceType,
    repo_path: &Path,
) -> Result<ResourceMetadata, MetadataError> {
    load_file(&get_metadata_path(name, resource_type, repo_path)).await
}

/// Parse a sidecar at an explicit path.
pub async fn load_file(path: &Path) -> Result<ResourceMetadata, MetadataError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MetadataError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

/// Remove a sidecar. Absent sidecars are not an error.
pub async fn delete(
    name: &str,
    resource_type: ResourceType,
    repo_path: &Path,
) -> Result<(), MetadataError> {
    match fs::remove_file(get_metadata_path(name, resource_type, repo_path)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[must_use]
pub fn exists(name: &str, resource_type: ResourceType, repo_path: &Path) -> bool {
    get_metadata_path(name, resource_type, repo_path).is_file()
}

/// Whether the resource's sidecar links it to `identifier` (source ID or,
/// failing that, source name). Missing or unreadable sidecars never match.
pub async fn has_source(
    name: &str,
    resource_type: ResourceType,
    identifier: &str,
    repo_path: &Path,
) -> bool {
    load(name, resource_type, repo_path)
        .await
        .is_ok_and(|m| m.matches_source(identifier))
}

pub async fn save_package_metadata(
    metadata: &PackageMetadata,
    repo_path: &Path,
) -> Result<(), MetadataError> {
    let content = serde_json::to_string_pretty(metadata)?;
    atomic_write(&get_package_metadata_path(&metadata.name, repo_path), &content).await?;
    Ok(())
}

pub async fn load_package_metadata(
    name: &str,
    repo_path: &Path,
) -> Result<PackageMetadata, MetadataError> {
    let path = get_package_metadata_path(name, repo_path);
    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MetadataError::NotFound(path))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

/// Human-readable source label derived from a source URL or path.
///
/// - `gh:owner/repo` and `https://github.com/owner/repo` give `owner-repo`
/// - `file://` URLs and absolute or dot-relative paths give their base name
/// - other http(s) URLs give their last path segment
#[must_use]
pub fn derive_source_name(source_url: &str) -> String {
    if source_url.is_empty() {
        return "unknown".to_string();
    }

    if let Some(rest) = source_url.strip_prefix("gh:") {
        let mut parts = rest.split('/');
        return match (parts.next(), parts.next()) {
            (Some(owner), Some(repo)) => format!("{owner}-{repo}"),
            _ => rest.replace('/', "-"),
        };
    }

    if let Some(path) = source_url.strip_prefix("file://") {
        return base_name(path);
    }

    if let Some(rest) = source_url.strip_prefix("https://github.com/") {
        let mut parts = rest.split('/');
        if let (Some(owner), Some(repo)) = (parts.next(), parts.next()) {
            return format!("{owner}-{repo}");
        }
    }

    if source_url.starts_with("http://") || source_url.starts_with("https://") {
        return source_url.rsplit('/').next().unwrap_or_default().to_string();
    }

    if source_url.starts_with('/') || source_url.starts_with("./") || source_url.starts_with("../")
    {
        return base_name(source_url);
    }

    source_url.replace('/', "-")
}

/// Last non-empty path element, `/` for the root, `.` for nothing.
fn base_name(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" }.to_string();
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
