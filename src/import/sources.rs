//! Operations over every resource tied to one declared source.

use super::{add_bulk, discover_candidates, BulkImportOptions, BulkImportResult, ImportAborted};
use crate::errors::ErrorCategory;
use crate::manifest::Source;
use crate::metadata::{get_metadata_path, has_source};
use crate::repository::{ImportMode, Repository, RepositoryError, Sidecar};
use crate::resource::{ResourceRef, ResourceType};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum SourceSyncError {
    #[error("source '{0}' is remote; only local path sources can be synced")]
    Remote(String),

    #[error("source '{name}' path not found: {}", path.display())]
    PathNotFound { name: String, path: PathBuf },

    #[error(transparent)]
    Aborted(#[from] ImportAborted),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Keep resources that already exist instead of replacing them
    pub skip_existing: bool,
    pub dry_run: bool,
}

/// Re-import everything found under a local source.
///
/// Resources are linked from the source directory and their sidecars carry
/// the source's current name and its ID, so a renamed source keeps its
/// resources and updates the recorded name.
#[instrument(skip(repo, opts), fields(source = %source.name))]
pub async fn sync_source(
    repo: &dyn Repository,
    source: &Source,
    opts: SyncOptions,
) -> Result<BulkImportResult, SourceSyncError> {
    let Some(location) = source.local_path() else {
        return Err(SourceSyncError::Remote(source.name.clone()));
    };
    let root = PathBuf::from(location);
    if fs::metadata(&root).await.is_err() {
        return Err(SourceSyncError::PathNotFound {
            name: source.name.clone(),
            path: root,
        });
    }

    let candidates = discover_candidates(&root);
    let import = BulkImportOptions {
        force: !opts.skip_existing,
        skip_existing: opts.skip_existing,
        dry_run: opts.dry_run,
        source_name: Some(source.name.clone()),
        source_id: Some(source.id.clone()).filter(|id| !id.is_empty()),
        import_mode: ImportMode::Symlink,
        ..BulkImportOptions::default()
    };
    let result = add_bulk(repo, &candidates, &import).await?;
    info!(
        candidates = candidates.len(),
        failed = result.failed.len(),
        "synced source"
    );
    Ok(result)
}

/// Resources whose sidecar ties them to `source`, matched by source ID and
/// then by source name. Packages carry no source and are never included.
pub async fn resources_from_source(
    repo: &dyn Repository,
    source: &Source,
) -> Result<Vec<ResourceRef>, RepositoryError> {
    let mut found = Vec::new();
    for resource_type in ResourceType::INSTALLABLE {
        for stored in repo.list_resources(resource_type).await? {
            let by_id = !source.id.is_empty()
                && has_source(&stored.name, resource_type, &source.id, repo.root()).await;
            if by_id || has_source(&stored.name, resource_type, &source.name, repo.root()).await {
                found.push(ResourceRef::new(resource_type, stored.name));
            }
        }
    }
    Ok(found)
}

/// Delete resources and their sidecars, returning the ones removed.
///
/// A resource that fails to delete is logged and skipped; only a vanished
/// repository stops the loop.
#[instrument(skip_all, fields(count = refs.len()))]
pub async fn remove_resources(
    repo: &dyn Repository,
    refs: &[ResourceRef],
) -> Result<Vec<ResourceRef>, RepositoryError> {
    let mut removed = Vec::new();
    for reference in refs {
        let sidecar = Sidecar {
            resource_type: reference.resource_type,
            name: reference.name.clone(),
            path: get_metadata_path(&reference.name, reference.resource_type, repo.root()),
            readable: true,
        };
        let outcome = match repo
            .delete_resource(reference.resource_type, &reference.name)
            .await
        {
            Ok(()) => repo.delete_sidecar(&sidecar).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => {
                info!(resource = %reference, "removed resource");
                removed.push(reference.clone());
            }
            Err(e) if e.category() == ErrorCategory::Fatal => return Err(e),
            Err(e) => warn!(resource = %reference, error = %e, "failed to remove resource"),
        }
    }
    Ok(removed)
}
