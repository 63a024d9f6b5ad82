use super::{
    detect_tools, parse_resource_from_issue, Installer, IssueType, ProjectError, VerifyIssue,
    PROJECT_MANIFEST_FILE,
};
use crate::repository::Repository;
use crate::resource::{ResourceRef, ResourceType};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// What was done, or why nothing could be, for one issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairAction {
    pub resource: String,
    pub tool: String,
    pub issue_type: IssueType,
    pub description: String,
}

impl RepairAction {
    fn for_issue(issue: &VerifyIssue, description: String) -> Self {
        Self {
            resource: issue.resource.clone(),
            tool: issue.tool.clone(),
            issue_type: issue.issue_type,
            description,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub fixed: usize,
    pub failed: usize,
    pub hints: usize,
}

/// Outcome of a project repair. Hints are never applied automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairResult {
    pub fixed: Vec<RepairAction>,
    pub failed: Vec<RepairAction>,
    pub hints: Vec<RepairAction>,
    pub summary: RepairSummary,
}

impl RepairResult {
    fn refresh_summary(&mut self) {
        self.summary = RepairSummary {
            fixed: self.fixed.len(),
            failed: self.failed.len(),
            hints: self.hints.len(),
        };
    }

    /// Record files removed by a reset as fixes.
    pub fn record_unmanaged_removed(&mut self, removed: &[PathBuf]) {
        self.fixed.extend(removed.iter().map(|path| RepairAction {
            resource: path.display().to_string(),
            tool: String::new(),
            issue_type: IssueType::Unmanaged,
            description: format!("Removed unmanaged file: {}", path.display()),
        }));
        self.refresh_summary();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.failed.is_empty() && self.hints.is_empty()
    }
}

/// Remove a broken or foreign link and reinstall the resource from the
/// repository. `Err` carries the failure description.
async fn repair_link(
    issue: &VerifyIssue,
    installer: &Installer,
    repo: &dyn Repository,
) -> Result<(), String> {
    fs::remove_file(&issue.path)
        .await
        .map_err(|e| format!("Failed to remove symlink: {e}"))?;

    let reference = parse_resource_from_issue(issue);
    if !repo
        .resource_exists(reference.resource_type, &reference.name)
        .await
    {
        warn!(resource = %reference, "removed broken symlink, resource gone from repository");
        return Err(format!(
            "Resource '{}' no longer exists in repository; consider removing from {PROJECT_MANIFEST_FILE}",
            reference.name
        ));
    }

    installer
        .install(repo, reference.resource_type, &reference.name)
        .await
        .map_err(|e| format!("Failed to reinstall: {e}"))?;
    info!(resource = %reference, "reinstalled");
    Ok(())
}

async fn install_missing(
    issue: &VerifyIssue,
    installer: &Installer,
    repo: &dyn Repository,
) -> Result<(), String> {
    let reference = ResourceRef::parse(&issue.resource).map_err(|e| {
        format!(
            "Cannot parse resource reference '{}': {e}",
            issue.resource
        )
    })?;

    let present = if reference.resource_type == ResourceType::Package {
        repo.package_exists(&reference.name).await
    } else {
        repo.resource_exists(reference.resource_type, &reference.name)
            .await
    };
    if !present {
        return Err(format!(
            "Resource '{}' not found in repository; remove from {PROJECT_MANIFEST_FILE} or run 'aimgr repo add'",
            issue.resource
        ));
    }

    installer
        .install_ref(repo, &reference)
        .await
        .map_err(|e| format!("Failed to install: {e}"))?;
    info!(resource = %reference, "installed");
    Ok(())
}

/// Apply the safe fix for each issue.
///
/// Broken and wrong-repo links are replaced by a fresh install, references
/// listed but not installed are installed. Orphans only get a hint and
/// unreadable links are reported as failures; neither is touched.
#[instrument(skip_all, fields(project = %project.display(), issues = issues.len()))]
pub async fn apply_repair_fixes(
    project: &Path,
    issues: &[VerifyIssue],
    repo: &dyn Repository,
) -> Result<RepairResult, ProjectError> {
    let installer = Installer::new(project, detect_tools(project).await?);
    let mut result = RepairResult::default();

    for issue in issues {
        match issue.issue_type {
            IssueType::Broken | IssueType::WrongRepo => {
                match repair_link(issue, &installer, repo).await {
                    Ok(()) => result.fixed.push(RepairAction::for_issue(
                        issue,
                        format!("Reinstalled {}", issue.resource),
                    )),
                    Err(msg) => result.failed.push(RepairAction::for_issue(issue, msg)),
                }
            }
            IssueType::NotInstalled => match install_missing(issue, &installer, repo).await {
                Ok(()) => result.fixed.push(RepairAction::for_issue(
                    issue,
                    format!("Installed {}", issue.resource),
                )),
                Err(msg) => result.failed.push(RepairAction::for_issue(issue, msg)),
            },
            IssueType::Orphaned => {
                let reference = parse_resource_from_issue(issue);
                result.hints.push(RepairAction::for_issue(
                    issue,
                    format!(
                        "Run 'aimgr uninstall {reference}' to remove, or run 'aimgr install {reference}' to add to {PROJECT_MANIFEST_FILE}"
                    ),
                ));
            }
            IssueType::Unreadable => result.failed.push(RepairAction::for_issue(
                issue,
                format!(
                    "Unreadable symlink at {}; manual intervention required",
                    issue.path.display()
                ),
            )),
            IssueType::Unmanaged => {}
        }
    }

    result.refresh_summary();
    Ok(result)
}
