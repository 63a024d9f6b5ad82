use super::{
    verify_repository, MetadataIssue, PackageIssue, ResourceIssue, TypeMismatch, VerifyError,
    VerifyFilter,
};
use crate::errors::ErrorCategory;
use crate::metadata::{get_metadata_path, ResourceMetadata};
use crate::repository::{Repository, Sidecar};
use crate::resource::ResourceType;
use crate::utils::absolute_path;
use serde::Serialize;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairFailure {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub message: String,
}

/// What a repository repair did. Type mismatches and package findings are
/// carried through untouched; they need a human to decide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoRepairResult {
    pub metadata_created: Vec<ResourceIssue>,
    pub orphaned_removed: Vec<MetadataIssue>,
    pub type_mismatches: Vec<TypeMismatch>,
    pub packages_with_missing_refs: Vec<PackageIssue>,
    pub partial_packages: Vec<PackageIssue>,
    pub failed: Vec<RepairFailure>,
    pub dry_run: bool,
    pub fixed_count: usize,
    pub failed_count: usize,
    pub unfixable_count: usize,
}

/// Sidecar synthesized for a resource that has none: a local source
/// pointing at the resource itself, timestamped with its modification time.
fn synthesize_metadata(issue: &ResourceIssue) -> ResourceMetadata {
    ResourceMetadata::new(
        issue.name.as_str(),
        issue.resource_type,
        "local",
        format!("file://{}", absolute_path(&issue.path).display()),
        issue.modified,
    )
}

/// Fix what can be fixed safely: remove orphaned sidecars, then create
/// sidecars for resources lacking one. With `dry_run` nothing is written
/// and the result lists what would be done.
#[instrument(skip_all, fields(root = %repo.root().display(), dry_run = dry_run))]
pub async fn repair_repository(
    repo: &dyn Repository,
    dry_run: bool,
) -> Result<RepoRepairResult, VerifyError> {
    let verify = verify_repository(repo, &VerifyFilter::default()).await?;
    let mut result = RepoRepairResult {
        dry_run,
        type_mismatches: verify.type_mismatches,
        packages_with_missing_refs: verify.packages_with_missing_refs,
        partial_packages: verify.partial_packages,
        ..RepoRepairResult::default()
    };

    // Orphans go first: an unreadable sidecar can sit at the very path a
    // synthesized one is about to be written to.
    for orphan in verify.orphaned_metadata {
        if !dry_run {
            let sidecar = Sidecar {
                resource_type: orphan.resource_type,
                name: orphan.name.clone(),
                path: orphan.path.clone(),
                readable: true,
            };
            if let Err(e) = repo.delete_sidecar(&sidecar).await {
                if e.category() == ErrorCategory::Fatal {
                    return Err(e.into());
                }
                warn!(name = %orphan.name, error = %e, "failed to remove orphaned metadata");
                result.failed.push(RepairFailure {
                    name: orphan.name,
                    resource_type: orphan.resource_type,
                    message: format!("failed to remove orphaned metadata: {e}"),
                });
                continue;
            }
        }
        result.orphaned_removed.push(orphan);
    }

    for issue in verify.resources_without_metadata {
        if !dry_run {
            let meta = synthesize_metadata(&issue);
            if let Err(e) = repo.put_metadata(&meta).await {
                if e.category() == ErrorCategory::Fatal {
                    return Err(e.into());
                }
                warn!(name = %issue.name, error = %e, "failed to create metadata");
                result.failed.push(RepairFailure {
                    name: issue.name,
                    resource_type: issue.resource_type,
                    message: format!(
                        "failed to create metadata at {}: {e}",
                        get_metadata_path(&meta.name, meta.resource_type, repo.root()).display()
                    ),
                });
                continue;
            }
        }
        result.metadata_created.push(issue);
    }

    result.fixed_count = result
        .metadata_created
        .len()
        .saturating_add(result.orphaned_removed.len());
    result.failed_count = result.failed.len();
    result.unfixable_count = result
        .type_mismatches
        .len()
        .saturating_add(result.packages_with_missing_refs.len());

    info!(
        fixed = result.fixed_count,
        failed = result.failed_count,
        unfixable = result.unfixable_count,
        "repository repair finished"
    );
    Ok(result)
}
