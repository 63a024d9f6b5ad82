use super::{link_path, ProjectError, ProjectManifest, Tool, PROJECT_MANIFEST_FILE};
use crate::project::installer::resolve_link_target;
use crate::project::manifest::project_manifest_path;
use crate::repository::Repository;
use crate::resource::{ResourceRef, ResourceType};
use crate::utils::absolute_path;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Broken,
    WrongRepo,
    NotInstalled,
    Orphaned,
    Unreadable,
    Unmanaged,
}

impl IssueType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Broken => "broken",
            IssueType::WrongRepo => "wrong-repo",
            IssueType::NotInstalled => "not-installed",
            IssueType::Orphaned => "orphaned",
            IssueType::Unreadable => "unreadable",
            IssueType::Unmanaged => "unmanaged",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found in a project.
///
/// For link issues `resource` is the entry name relative to the tool's
/// resource directory (`deploy.md`, `api/deploy.md`, `pdf`). For manifest
/// issues it is the `type/name` reference. `resource_type` is the kind of
/// directory the link was found in, or the kind named by the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyIssue {
    pub resource: String,
    pub resource_type: ResourceType,
    pub tool: String,
    pub issue_type: IssueType,
    pub description: String,
    pub path: PathBuf,
    pub severity: Severity,
}

/// Type and name of the resource an issue is about. Manifest issues carry
/// their reference; for link issues `.md` is stripped from command and agent
/// names.
#[must_use]
pub fn parse_resource_from_issue(issue: &VerifyIssue) -> ResourceRef {
    if issue.issue_type == IssueType::NotInstalled {
        if let Ok(parsed) = ResourceRef::parse(&issue.resource) {
            return parsed;
        }
    }
    let name = match issue.resource_type {
        ResourceType::Command | ResourceType::Agent => issue
            .resource
            .strip_suffix(".md")
            .unwrap_or(&issue.resource),
        _ => issue.resource.as_str(),
    };
    ResourceRef::new(issue.resource_type, name)
}

/// Entries of a directory, sorted. A missing directory has none.
async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ProjectError> {
    let mut read = match fs::read_dir(dir).await {
        Ok(r) => r,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ProjectError::io(dir, e)),
    };
    let mut entries = Vec::new();
    while let Some(entry) = read
        .next_entry()
        .await
        .map_err(|e| ProjectError::io(dir, e))?
    {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// What a symlink in a resource directory looks like from the outside.
enum LinkState {
    Unreadable,
    Broken(PathBuf),
    Outside(PathBuf),
    Managed,
}

async fn inspect_link(link: &Path, repo_root: &Path) -> LinkState {
    let Ok(target) = fs::read_link(link).await else {
        return LinkState::Unreadable;
    };
    if fs::metadata(link).await.is_err() {
        return LinkState::Broken(target);
    }
    let resolved = resolve_link_target(link, &target);
    if resolved.starts_with(repo_root) {
        LinkState::Managed
    } else {
        LinkState::Outside(target)
    }
}

/// Symlinks directly in `dir`, plus those one level down in namespace
/// directories when `namespaced`. Each comes with its name relative to
/// `dir`.
async fn links_in(dir: &Path, namespaced: bool) -> Result<Vec<(String, PathBuf)>, ProjectError> {
    let mut links = Vec::new();
    for path in sorted_entries(dir).await? {
        let Ok(meta) = fs::symlink_metadata(&path).await else {
            continue;
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if meta.file_type().is_symlink() {
            links.push((name, path));
        } else if namespaced && meta.is_dir() {
            for sub in sorted_entries(&path).await? {
                let Ok(sub_meta) = fs::symlink_metadata(&sub).await else {
                    continue;
                };
                let Some(sub_name) = sub.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if sub_meta.file_type().is_symlink() {
                    links.push((format!("{name}/{sub_name}"), sub));
                }
            }
        }
    }
    Ok(links)
}

async fn verify_directory(
    dir: &Path,
    tool: Tool,
    resource_type: ResourceType,
    repo_root: &Path,
) -> Result<Vec<VerifyIssue>, ProjectError> {
    let namespaced = resource_type == ResourceType::Command;
    let mut issues = Vec::new();
    for (name, path) in links_in(dir, namespaced).await? {
        let issue = |issue_type, description: String, severity| VerifyIssue {
            resource: name.clone(),
            resource_type,
            tool: tool.to_string(),
            issue_type,
            description,
            path: path.clone(),
            severity,
        };
        match inspect_link(&path, repo_root).await {
            LinkState::Unreadable => issues.push(issue(
                IssueType::Unreadable,
                "Cannot read symlink target".to_string(),
                Severity::Error,
            )),
            LinkState::Broken(target) => issues.push(issue(
                IssueType::Broken,
                format!("Symlink target doesn't exist: {}", target.display()),
                Severity::Error,
            )),
            LinkState::Outside(target) => issues.push(issue(
                IssueType::WrongRepo,
                format!(
                    "Points to wrong repo: {} (expected: {})",
                    target.display(),
                    repo_root.display()
                ),
                Severity::Warning,
            )),
            LinkState::Managed => {}
        }
    }
    Ok(issues)
}

/// Check every installed symlink of every detected tool: unreadable,
/// broken and wrong-repo links are reported. Command directories are
/// searched one namespace level deep.
pub async fn scan_project_issues(
    project: &Path,
    tools: &[Tool],
    repo_root: &Path,
) -> Result<Vec<VerifyIssue>, ProjectError> {
    let repo_root = absolute_path(repo_root);
    let mut issues = Vec::new();
    for tool in tools {
        for resource_type in ResourceType::INSTALLABLE {
            let Some(dir) = tool.dir_in(project, resource_type) else {
                continue;
            };
            issues.extend(verify_directory(&dir, *tool, resource_type, &repo_root).await?);
        }
    }
    Ok(issues)
}

async fn is_installed(
    project: &Path,
    tools: &[Tool],
    resource_type: ResourceType,
    name: &str,
) -> bool {
    for tool in tools {
        let Some(link) = link_path(project, *tool, resource_type, name) else {
            continue;
        };
        let bare = link.with_file_name(
            Path::new(name)
                .file_name()
                .unwrap_or_default(),
        );
        for candidate in [&link, &bare] {
            if fs::symlink_metadata(candidate).await.is_ok() {
                return true;
            }
        }
    }
    false
}

/// Compare the project manifest with what is installed.
///
/// References not installed in any detected tool are reported
/// `not-installed` (a package counts as installed only when all its members
/// are). Managed links whose resource is not wanted by the manifest, either
/// directly or through a package, are reported `orphaned`, once per
/// resource. Without a manifest there is nothing to compare.
pub async fn check_manifest_sync(
    project: &Path,
    tools: &[Tool],
    repo: &dyn Repository,
) -> Result<Vec<VerifyIssue>, ProjectError> {
    let manifest_path = project_manifest_path(project);
    let manifest = match ProjectManifest::load(&manifest_path).await {
        Ok(m) => m,
        Err(ProjectError::ManifestNotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let not_installed =
        |parsed: &ResourceRef, reference: &str, description: String| VerifyIssue {
            resource: reference.to_string(),
            resource_type: parsed.resource_type,
            tool: "any".to_string(),
            issue_type: IssueType::NotInstalled,
            description,
            path: manifest_path.clone(),
            severity: Severity::Warning,
        };

    let mut issues = Vec::new();
    let mut wanted: HashSet<String> = HashSet::new();

    for reference in &manifest.resources {
        let Ok(parsed) = ResourceRef::parse(reference) else {
            continue;
        };

        if parsed.resource_type == ResourceType::Package {
            let package = match repo.get_package(&parsed.name).await {
                Ok(Some(p)) => p,
                Ok(None) => {
                    issues.push(not_installed(
                        &parsed,
                        reference,
                        format!(
                            "Package definition not found in repository: package '{}' does not exist",
                            parsed.name
                        ),
                    ));
                    continue;
                }
                Err(e) => {
                    issues.push(not_installed(
                        &parsed,
                        reference,
                        format!("Package definition not found in repository: {e}"),
                    ));
                    continue;
                }
            };

            let mut all_installed = true;
            for member in package.resources.iter().filter_map(|m| ResourceRef::parse(m).ok()) {
                if member.resource_type == ResourceType::Package {
                    continue;
                }
                wanted.insert(member.to_string());
                if all_installed
                    && !is_installed(project, tools, member.resource_type, &member.name).await
                {
                    all_installed = false;
                }
            }
            if !all_installed {
                issues.push(not_installed(
                    &parsed,
                    reference,
                    format!(
                        "Listed in {PROJECT_MANIFEST_FILE} but not all package resources are installed"
                    ),
                ));
            }
            continue;
        }

        wanted.insert(parsed.to_string());
        if !is_installed(project, tools, parsed.resource_type, &parsed.name).await {
            issues.push(not_installed(
                &parsed,
                reference,
                format!("Listed in {PROJECT_MANIFEST_FILE} but not installed"),
            ));
        }
    }

    issues.extend(find_orphans(project, tools, &absolute_path(repo.root()), &wanted).await?);
    Ok(issues)
}

async fn find_orphans(
    project: &Path,
    tools: &[Tool],
    repo_root: &Path,
    wanted: &HashSet<String>,
) -> Result<Vec<VerifyIssue>, ProjectError> {
    // Keyed by reference so one resource linked into several tools is one
    // finding.
    let mut orphans: BTreeMap<String, (VerifyIssue, BTreeSet<String>)> = BTreeMap::new();

    for tool in tools {
        for resource_type in ResourceType::INSTALLABLE {
            let Some(dir) = tool.dir_in(project, resource_type) else {
                continue;
            };
            let namespaced = resource_type == ResourceType::Command;
            for (name, path) in links_in(&dir, namespaced).await? {
                if !matches!(inspect_link(&path, repo_root).await, LinkState::Managed) {
                    continue;
                }
                let mut issue = VerifyIssue {
                    resource: name,
                    resource_type,
                    tool: String::new(),
                    issue_type: IssueType::Orphaned,
                    description: format!("Installed but not listed in {PROJECT_MANIFEST_FILE}"),
                    path,
                    severity: Severity::Warning,
                };
                let reference = parse_resource_from_issue(&issue).to_string();
                if wanted.contains(&reference) {
                    continue;
                }
                debug!(resource = %reference, tool = %tool, "orphaned installation");
                issue.tool = tool.to_string();
                orphans
                    .entry(reference)
                    .or_insert_with(|| (issue, BTreeSet::new()))
                    .1
                    .insert(tool.to_string());
            }
        }
    }

    Ok(orphans
        .into_values()
        .map(|(mut issue, tools)| {
            issue.tool = tools.into_iter().collect::<Vec<_>>().join(",");
            issue
        })
        .collect())
}

/// The resource an issue is about, as a `type/name` reference.
fn issue_key(issue: &VerifyIssue) -> String {
    parse_resource_from_issue(issue).to_string()
}

/// Append manifest findings to link findings, dropping manifest findings
/// about a resource the link scan already reported.
#[must_use]
pub fn deduplicate_issues(
    scan: Vec<VerifyIssue>,
    manifest: Vec<VerifyIssue>,
) -> Vec<VerifyIssue> {
    let seen: HashSet<String> = scan.iter().map(issue_key).collect();
    let mut merged = scan;
    merged.extend(
        manifest
            .into_iter()
            .filter(|issue| !seen.contains(&issue_key(issue))),
    );
    merged
}
