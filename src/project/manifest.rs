use super::{ProjectError, Tool};
use crate::resource::ResourceRef;
use crate::utils::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const PROJECT_MANIFEST_FILE: &str = "ai.package.yaml";

#[must_use]
pub fn project_manifest_path(project: &Path) -> PathBuf {
    project.join(PROJECT_MANIFEST_FILE)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default)]
    pub targets: Vec<String>,
}

impl InstallConfig {
    fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A project's declared resources, as `type/name` references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "InstallConfig::is_empty")]
    pub install: InstallConfig,

    /// Older manifests kept targets at the top level
    #[serde(default, skip_serializing)]
    targets: Vec<String>,
}

impl ProjectManifest {
    /// Load and validate a manifest. A missing file is
    /// [`ProjectError::ManifestNotFound`].
    pub async fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProjectError::ManifestNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(ProjectError::io(path, e)),
        };

        let mut manifest: ProjectManifest = if content.trim().is_empty() {
            ProjectManifest::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        if !manifest.targets.is_empty() && manifest.install.targets.is_empty() {
            manifest.install.targets = std::mem::take(&mut manifest.targets);
        }

        manifest.validate()?;
        Ok(manifest)
    }

    /// Like [`ProjectManifest::load`], but a missing file yields an empty
    /// manifest.
    pub async fn load_or_default(path: &Path) -> Result<Self, ProjectError> {
        match Self::load(path).await {
            Err(ProjectError::ManifestNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), ProjectError> {
        self.validate()?;
        let yaml = serde_yaml::to_string(self)?;
        atomic_write(path, &yaml)
            .await
            .map_err(|e| ProjectError::io(path, e))
    }

    pub fn validate(&self) -> Result<(), ProjectError> {
        for reference in &self.resources {
            validate_reference(reference).map_err(|reason| {
                ProjectError::InvalidManifest(format!("invalid resource '{reference}': {reason}"))
            })?;
        }
        for target in self.install.targets.iter().chain(&self.targets) {
            if target.parse::<Tool>().is_err() {
                return Err(ProjectError::InvalidManifest(format!(
                    "invalid install.targets '{target}': must be 'claude', 'opencode', or 'copilot'"
                )));
            }
        }
        Ok(())
    }

    /// Add a reference; adding one already present is a no-op.
    pub fn add(&mut self, reference: &str) -> Result<(), ProjectError> {
        validate_reference(reference).map_err(|reason| {
            ProjectError::InvalidManifest(format!("invalid resource: {reason}"))
        })?;
        if !self.has(reference) {
            self.resources.push(reference.to_string());
        }
        Ok(())
    }

    /// Remove a reference. Returns whether anything was removed.
    pub fn remove(&mut self, reference: &str) -> bool {
        let before = self.resources.len();
        self.resources.retain(|r| r != reference);
        self.resources.len() != before
    }

    #[must_use]
    pub fn has(&self, reference: &str) -> bool {
        self.resources.iter().any(|r| r == reference)
    }

    /// Install targets parsed into tools. Unknown names are rejected by
    /// validation, so they are skipped here.
    #[must_use]
    pub fn target_tools(&self) -> Vec<Tool> {
        self.install
            .targets
            .iter()
            .filter_map(|t| t.parse().ok())
            .collect()
    }

    pub async fn exists(path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }
}

fn validate_reference(reference: &str) -> Result<(), String> {
    if reference.is_empty() {
        return Err("resource reference cannot be empty".to_string());
    }
    ResourceRef::parse(reference)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
