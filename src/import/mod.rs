//! Bulk import of candidate resource paths into the repository.
//!
//! Each candidate is processed on its own: a malformed file or a name
//! conflict is recorded in [`BulkImportResult::failed`] and the batch moves
//! on. Only a fatal error (the repository itself going away) stops it.

mod discover;
mod sources;

pub use discover::discover_candidates;
pub use sources::{
    remove_resources, resources_from_source, sync_source, SourceSyncError, SyncOptions,
};

use crate::errors::{self, ErrorCategory, TypedError};
use crate::metadata::{derive_source_name, ResourceMetadata};
use crate::repository::{missing_refs, ImportMode, Repository, RepositoryError};
use crate::resource::{
    detect_type, load_package, load_resource, PackageMetadata, ResourceType, PACKAGE_SUFFIX,
};
use crate::utils::absolute_path;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct BulkImportOptions {
    /// Replace resources that already exist
    pub force: bool,
    /// Leave existing resources alone and report them as skipped
    pub skip_existing: bool,
    /// Classify everything but write nothing
    pub dry_run: bool,
    pub source_url: Option<String>,
    pub source_type: Option<String>,
    /// Name recorded in metadata; derived from the source URL when absent
    pub source_name: Option<String>,
    pub source_id: Option<String>,
    pub git_ref: Option<String>,
    pub import_mode: ImportMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// A package whose references did not all resolve at import time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageWarning {
    pub package: String,
    pub missing_refs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkImportResult {
    pub added: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<ImportFailure>,
    pub command_count: usize,
    pub skill_count: usize,
    pub agent_count: usize,
    pub package_count: usize,
    pub package_warnings: Vec<PackageWarning>,
}

impl BulkImportResult {
    fn count(&mut self, resource_type: ResourceType) {
        let counter = match resource_type {
            ResourceType::Command => &mut self.command_count,
            ResourceType::Skill => &mut self.skill_count,
            ResourceType::Agent => &mut self.agent_count,
            ResourceType::Package => &mut self.package_count,
        };
        *counter = counter.saturating_add(1);
    }
}

/// A fatal error stopped the batch; `partial` holds what was done before.
#[derive(Error, Debug)]
#[error("import aborted: {error}")]
pub struct ImportAborted {
    pub partial: BulkImportResult,
    #[source]
    pub error: TypedError,
}

enum Outcome {
    Added,
    Updated,
    Skipped,
}

fn categorized(err: RepositoryError, context: &str) -> TypedError {
    match err.category() {
        ErrorCategory::Fatal => errors::fatal(err, context),
        ErrorCategory::Validation => errors::validation(err, context),
        ErrorCategory::Resource => errors::resource(err, context),
    }
}

/// Import every candidate path into `repo`.
#[instrument(skip_all, fields(candidates = candidates.len(), dry_run = opts.dry_run))]
pub async fn add_bulk(
    repo: &dyn Repository,
    candidates: &[PathBuf],
    opts: &BulkImportOptions,
) -> Result<BulkImportResult, ImportAborted> {
    let mut result = BulkImportResult::default();

    if !opts.dry_run {
        if let Err(e) = repo.init().await {
            return Err(ImportAborted {
                partial: result,
                error: errors::fatal(e, "failed to initialize repository"),
            });
        }
    }

    for path in candidates {
        match import_candidate(repo, path, opts, &mut result).await {
            Ok((Outcome::Skipped, _)) => result.skipped.push(path.clone()),
            Ok((Outcome::Added, resource_type)) => {
                result.count(resource_type);
                result.added.push(path.clone());
            }
            Ok((Outcome::Updated, resource_type)) => {
                result.count(resource_type);
                result.updated.push(path.clone());
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "import failed");
                result.failed.push(ImportFailure {
                    path: path.clone(),
                    message: error.to_string(),
                });
                if error.is_fatal() {
                    return Err(ImportAborted {
                        partial: result,
                        error,
                    });
                }
            }
        }
    }

    info!(
        added = result.added.len(),
        updated = result.updated.len(),
        skipped = result.skipped.len(),
        failed = result.failed.len(),
        "bulk import finished"
    );
    Ok(result)
}

/// Source URL, type and ref recorded for a candidate. Explicit options win;
/// otherwise the candidate's own location is used.
fn source_of(path: &Path, opts: &BulkImportOptions) -> (String, String, Option<String>) {
    match (opts.source_url.as_deref(), opts.source_type.as_deref()) {
        (Some(url), Some(kind)) if !url.is_empty() && !kind.is_empty() => {
            (url.to_string(), kind.to_string(), opts.git_ref.clone())
        }
        _ => (
            format!("file://{}", absolute_path(path).display()),
            "file".to_string(),
            None,
        ),
    }
}

fn source_name_of(opts: &BulkImportOptions, source_url: &str) -> String {
    opts.source_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| derive_source_name(source_url))
}

async fn import_candidate(
    repo: &dyn Repository,
    path: &Path,
    opts: &BulkImportOptions,
    result: &mut BulkImportResult,
) -> Result<(Outcome, ResourceType), TypedError> {
    let is_package = path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with(PACKAGE_SUFFIX));
    if is_package {
        return import_package(repo, path, opts, result).await;
    }

    let resource_type = detect_type(path)
        .await
        .map_err(|e| errors::validation(e, "failed to detect resource type"))?;
    let resource = load_resource(path)
        .await
        .map_err(|e| errors::validation(e, "failed to load resource"))?;

    let exists = repo.resource_exists(resource_type, &resource.name).await;
    if exists {
        if opts.force {
            if !opts.dry_run {
                repo.delete_resource(resource_type, &resource.name)
                    .await
                    .map_err(|e| categorized(e, "failed to remove existing resource"))?;
            }
        } else if opts.skip_existing {
            debug!(resource = %resource.name, "skipping existing resource");
            return Ok((Outcome::Skipped, resource_type));
        } else {
            return Err(errors::validation(
                anyhow::anyhow!("resource '{}' already exists in repository", resource.name),
                "",
            ));
        }
    }

    if !opts.dry_run {
        let (source_url, source_type, git_ref) = source_of(path, opts);
        repo.put_resource(&resource, opts.import_mode)
            .await
            .map_err(|e| categorized(e, "failed to import resource"))?;

        let mut meta = ResourceMetadata::new(
            resource.name.as_str(),
            resource_type,
            source_type,
            source_url.as_str(),
            Utc::now(),
        );
        meta.source_name = source_name_of(opts, &source_url);
        meta.source_id = opts.source_id.clone().unwrap_or_default();
        meta.git_ref = git_ref;
        repo.put_metadata(&meta)
            .await
            .map_err(|e| categorized(e, "failed to write metadata"))?;
        debug!(resource = %resource.name, resource_type = %resource_type, "imported resource");
    }

    let outcome = if exists {
        Outcome::Updated
    } else {
        Outcome::Added
    };
    Ok((outcome, resource_type))
}

async fn import_package(
    repo: &dyn Repository,
    path: &Path,
    opts: &BulkImportOptions,
    result: &mut BulkImportResult,
) -> Result<(Outcome, ResourceType), TypedError> {
    let package = load_package(path)
        .await
        .map_err(|e| errors::validation(e, "failed to load package"))?;

    let exists = repo.package_exists(&package.name).await;
    if exists {
        if opts.force {
            if !opts.dry_run {
                repo.delete_package(&package.name)
                    .await
                    .map_err(|e| categorized(e, "failed to remove existing package"))?;
            }
        } else if opts.skip_existing {
            return Ok((Outcome::Skipped, ResourceType::Package));
        } else {
            return Err(errors::validation(
                anyhow::anyhow!("package '{}' already exists in repository", package.name),
                "",
            ));
        }
    }

    let missing = missing_refs(repo, &package).await;
    if !missing.is_empty() {
        warn!(
            package = %package.name,
            missing = ?missing,
            "package references resources not in the repository"
        );
        result.package_warnings.push(PackageWarning {
            package: package.name.clone(),
            missing_refs: missing,
        });
    }

    if !opts.dry_run {
        let (source_url, source_type, git_ref) = source_of(path, opts);
        repo.put_package(&package)
            .await
            .map_err(|e| categorized(e, "failed to import package"))?;

        let now = Utc::now();
        let meta = PackageMetadata {
            name: package.name.clone(),
            source_type,
            source_url: Some(source_url),
            source_ref: git_ref,
            first_added: now,
            last_updated: now,
            resource_count: package.resources.len(),
        };
        repo.put_package_metadata(&meta)
            .await
            .map_err(|e| categorized(e, "failed to write package metadata"))?;
    }

    let outcome = if exists {
        Outcome::Updated
    } else {
        Outcome::Added
    };
    Ok((outcome, ResourceType::Package))
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
