//! Consistency checks between resource files, sidecars and packages.

mod repair;

pub use repair::{repair_repository, RepairFailure, RepoRepairResult};

use crate::metadata::get_metadata_path;
use crate::repository::{missing_refs, Repository, RepositoryError, StoredResource};
use crate::resource::ResourceType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A resource present on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceIssue {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub path: PathBuf,
    #[serde(skip)]
    pub modified: DateTime<Utc>,
}

/// A sidecar, and for missing-source findings the source path it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataIssue {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMismatch {
    pub name: String,
    pub resource_type: ResourceType,
    pub metadata_type: ResourceType,
    pub resource_path: PathBuf,
    pub metadata_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageIssue {
    pub name: String,
    pub path: PathBuf,
    pub missing_resources: Vec<String>,
    pub total_resources: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyResult {
    pub resources_without_metadata: Vec<ResourceIssue>,
    pub orphaned_metadata: Vec<MetadataIssue>,
    pub missing_source_paths: Vec<MetadataIssue>,
    pub type_mismatches: Vec<TypeMismatch>,
    /// Packages none of whose references resolve
    pub packages_with_missing_refs: Vec<PackageIssue>,
    /// Packages with some, but not all, references missing
    pub partial_packages: Vec<PackageIssue>,
    pub has_errors: bool,
    pub has_warnings: bool,
}

/// Restricts a verify run to a type and/or a name pattern, written as
/// `type/pattern` (`skill/*`, `command/test*`) or a bare name pattern.
#[derive(Debug, Clone, Default)]
pub struct VerifyFilter {
    pub resource_type: Option<ResourceType>,
    pattern: Option<glob::Pattern>,
}

impl VerifyFilter {
    pub fn parse(spec: &str) -> Result<Self, VerifyError> {
        let (resource_type, name_pattern) = match spec.split_once('/') {
            Some((prefix, rest)) => match prefix.parse::<ResourceType>() {
                Ok(t) => (Some(t), rest),
                Err(_) => (None, spec),
            },
            None => (None, spec),
        };

        let pattern = if name_pattern.is_empty() || name_pattern == "*" {
            None
        } else {
            Some(
                glob::Pattern::new(name_pattern).map_err(|e| VerifyError::InvalidPattern {
                    pattern: spec.to_string(),
                    reason: e.to_string(),
                })?,
            )
        };

        Ok(Self {
            resource_type,
            pattern,
        })
    }

    #[must_use]
    pub fn allows_type(&self, resource_type: ResourceType) -> bool {
        self.resource_type.map_or(true, |t| t == resource_type)
    }

    #[must_use]
    pub fn matches(&self, resource_type: ResourceType, name: &str) -> bool {
        self.allows_type(resource_type) && self.pattern.as_ref().map_or(true, |p| p.matches(name))
    }
}

const SCANNED_TYPES: [ResourceType; 3] = ResourceType::INSTALLABLE;

/// Scan the repository and classify drift without changing anything.
#[instrument(skip_all, fields(root = %repo.root().display()))]
pub async fn verify_repository(
    repo: &dyn Repository,
    filter: &VerifyFilter,
) -> Result<VerifyResult, VerifyError> {
    let mut result = VerifyResult::default();

    for resource_type in SCANNED_TYPES {
        if !filter.allows_type(resource_type) {
            continue;
        }
        for stored in repo.list_resources(resource_type).await? {
            if filter.matches(resource_type, &stored.name) {
                check_resource(repo, &stored, &mut result).await;
            }
        }
    }

    for sidecar in repo.list_sidecars().await? {
        if !filter.matches(sidecar.resource_type, &sidecar.name) {
            continue;
        }
        let backed = sidecar.readable
            && match sidecar.resource_type {
                ResourceType::Package => repo.package_exists(&sidecar.name).await,
                t => repo.resource_exists(t, &sidecar.name).await,
            };
        if !backed {
            result.orphaned_metadata.push(MetadataIssue {
                name: sidecar.name,
                resource_type: sidecar.resource_type,
                path: sidecar.path,
                source_path: None,
            });
        }
    }

    if filter.allows_type(ResourceType::Package) {
        for package in repo.list_packages().await? {
            if !filter.matches(ResourceType::Package, &package.name) {
                continue;
            }
            let missing = missing_refs(repo, &package).await;
            if missing.is_empty() {
                continue;
            }
            let issue = PackageIssue {
                path: repo.resource_path(ResourceType::Package, &package.name),
                name: package.name.clone(),
                total_resources: package.resources.len(),
                missing_resources: missing,
            };
            if issue.missing_resources.len() == issue.total_resources {
                result.packages_with_missing_refs.push(issue);
            } else {
                result.partial_packages.push(issue);
            }
        }
    }

    result.has_errors = !result.orphaned_metadata.is_empty()
        || !result.type_mismatches.is_empty()
        || !result.packages_with_missing_refs.is_empty();
    result.has_warnings = !result.resources_without_metadata.is_empty()
        || !result.missing_source_paths.is_empty()
        || !result.partial_packages.is_empty();

    debug!(
        errors = result.has_errors,
        warnings = result.has_warnings,
        "verified repository"
    );
    Ok(result)
}

async fn check_resource(
    repo: &dyn Repository,
    stored: &StoredResource,
    result: &mut VerifyResult,
) {
    let resource_type = stored.resource_type;
    let meta = match repo.get_metadata(resource_type, &stored.name).await {
        Ok(Some(meta)) => meta,
        Ok(None) | Err(_) => {
            result.resources_without_metadata.push(ResourceIssue {
                name: stored.name.clone(),
                resource_type,
                path: stored.path.clone(),
                modified: stored.modified,
            });
            return;
        }
    };

    if meta.resource_type != resource_type {
        result.type_mismatches.push(TypeMismatch {
            name: stored.name.clone(),
            resource_type,
            metadata_type: meta.resource_type,
            resource_path: stored.path.clone(),
            metadata_path: get_metadata_path(&stored.name, resource_type, repo.root()),
        });
    }

    if let Some(source_path) = meta.source_url.strip_prefix("file://") {
        if fs::metadata(source_path).await.is_err() {
            result.missing_source_paths.push(MetadataIssue {
                name: meta.name.clone(),
                resource_type,
                path: get_metadata_path(&stored.name, resource_type, repo.root()),
                source_path: Some(PathBuf::from(source_path)),
            });
        }
    }
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
