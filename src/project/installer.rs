use super::{ProjectError, ProjectManifest, Tool};
use crate::project::manifest::project_manifest_path;
use crate::project::tools::detect_tools;
use crate::repository::Repository;
use crate::resource::{ResourceRef, ResourceType};
use crate::utils::absolute_path;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Where `tool` expects the link for `(resource_type, name)` in `project`.
///
/// Commands and agents are `<name>.md` files (nested command names become
/// nested directories), skills are directories named after the skill.
#[must_use]
pub fn link_path(
    project: &Path,
    tool: Tool,
    resource_type: ResourceType,
    name: &str,
) -> Option<PathBuf> {
    let dir = tool.dir_in(project, resource_type)?;
    match resource_type {
        ResourceType::Command | ResourceType::Agent => Some(dir.join(format!("{name}.md"))),
        ResourceType::Skill => Some(dir.join(name)),
        ResourceType::Package => None,
    }
}

/// Resolve a link target against the directory holding the link.
pub(crate) fn resolve_link_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return absolute_path(target);
    }
    let base = link.parent().unwrap_or(Path::new(""));
    absolute_path(&base.join(target))
}

/// Decide whether a link must be (re)created at `link`.
///
/// A missing path needs one. A broken link, or a link leaving `repo_root`,
/// is removed so it can be recreated. A valid link into the repository and
/// anything that is not a symlink are left alone.
async fn ensure_valid_symlink(
    link: &Path,
    expected: &Path,
    repo_root: &Path,
) -> Result<bool, ProjectError> {
    let meta = match fs::symlink_metadata(link).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(ProjectError::io(link, e)),
    };

    if !meta.file_type().is_symlink() {
        debug!(path = %link.display(), "not a symlink, leaving in place");
        return Ok(false);
    }

    if fs::metadata(link).await.is_err() {
        fs::remove_file(link)
            .await
            .map_err(|e| ProjectError::io(link, e))?;
        return Ok(true);
    }

    let target = fs::read_link(link)
        .await
        .map_err(|e| ProjectError::io(link, e))?;
    let target = resolve_link_target(link, &target);
    if target != expected && !target.starts_with(repo_root) {
        fs::remove_file(link)
            .await
            .map_err(|e| ProjectError::io(link, e))?;
        return Ok(true);
    }

    Ok(false)
}

/// Installs repository resources into a project by symlinking them into
/// each target tool's directories.
#[derive(Debug, Clone)]
pub struct Installer {
    project: PathBuf,
    targets: Vec<Tool>,
}

impl Installer {
    #[must_use]
    pub fn new(project: &Path, targets: Vec<Tool>) -> Self {
        Self {
            project: absolute_path(project),
            targets,
        }
    }

    /// Choose targets the way `install` does: every tool already present in
    /// the project, else the manifest's `install.targets`, else `defaults`.
    pub async fn detect(project: &Path, defaults: &[Tool]) -> Result<Self, ProjectError> {
        let project = absolute_path(project);
        let existing = detect_tools(&project).await?;
        if !existing.is_empty() {
            return Ok(Self::new(&project, existing));
        }

        let manifest_path = project_manifest_path(&project);
        if ProjectManifest::exists(&manifest_path).await {
            match ProjectManifest::load(&manifest_path).await {
                Ok(m) if !m.install.targets.is_empty() => {
                    return Ok(Self::new(&project, m.target_tools()));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "ignoring unreadable project manifest"),
            }
        }

        Ok(Self::new(&project, defaults.to_vec()))
    }

    #[must_use]
    pub fn project(&self) -> &Path {
        &self.project
    }

    #[must_use]
    pub fn targets(&self) -> &[Tool] {
        &self.targets
    }

    /// Link one resource into every target tool that supports its type.
    /// Returns the links created; links that were already valid are not
    /// listed.
    #[instrument(skip(self, repo), fields(project = %self.project.display()))]
    pub async fn install(
        &self,
        repo: &dyn Repository,
        resource_type: ResourceType,
        name: &str,
    ) -> Result<Vec<PathBuf>, ProjectError> {
        if !repo.resource_exists(resource_type, name).await {
            return Err(ProjectError::NotInRepository(format!(
                "{resource_type} '{name}'"
            )));
        }

        let repo_root = absolute_path(repo.root());
        let source = absolute_path(&repo.resource_path(resource_type, name));
        let mut created = Vec::new();

        for tool in &self.targets {
            let Some(link) = link_path(&self.project, *tool, resource_type, name) else {
                continue;
            };
            if let Some(parent) = link.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ProjectError::io(parent, e))?;
            }

            if !ensure_valid_symlink(&link, &source, &repo_root).await? {
                continue;
            }

            fs::symlink(&source, &link)
                .await
                .map_err(|e| ProjectError::io(&link, e))?;
            info!(
                resource = %name,
                resource_type = %resource_type,
                tool = %tool,
                path = %link.display(),
                "resource installed"
            );
            created.push(link);
        }

        Ok(created)
    }

    /// Install a `type/name` reference. Packages install each member;
    /// members missing from the repository are skipped with a warning.
    pub async fn install_ref(
        &self,
        repo: &dyn Repository,
        reference: &ResourceRef,
    ) -> Result<Vec<PathBuf>, ProjectError> {
        if reference.resource_type != ResourceType::Package {
            return self
                .install(repo, reference.resource_type, &reference.name)
                .await;
        }

        let package = repo
            .get_package(&reference.name)
            .await?
            .ok_or_else(|| ProjectError::NotInRepository(format!("package '{}'", reference.name)))?;

        let mut created = Vec::new();
        for member in &package.resources {
            let Ok(member_ref) = ResourceRef::parse(member) else {
                warn!(package = %package.name, member = %member, "skipping malformed package member");
                continue;
            };
            if member_ref.resource_type == ResourceType::Package {
                continue;
            }
            match self
                .install(repo, member_ref.resource_type, &member_ref.name)
                .await
            {
                Ok(links) => created.extend(links),
                Err(ProjectError::NotInRepository(what)) => {
                    warn!(package = %package.name, member = %what, "package member missing from repository");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }
}
