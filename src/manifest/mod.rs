mod migrate;
mod state;
mod types;

pub use state::{
    get_source_state_path, load_source_state, save_source_state, SourceState, SourceStateError,
    SourceStateFile,
};
pub use types::{RepoManifest, Source};

use crate::resource::is_valid_segment;
use crate::source_id::generate_source_id;
use crate::utils::atomic_write;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

/// The name of the manifest file at the repository root
pub const MANIFEST_FILE: &str = "ai.repo.yaml";

/// Current manifest schema version
pub const MANIFEST_VERSION: u32 = 1;

const MAX_SOURCE_NAME_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse manifest YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("invalid version: {0} (expected 1)")]
    InvalidVersion(u32),

    #[error("unsupported manifest version {0}; this build understands version {MANIFEST_VERSION}")]
    UnsupportedVersion(u32),

    #[error("invalid source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },

    #[error("duplicate source name: {0}")]
    DuplicateName(String),

    #[error("duplicate source ID: {0}")]
    DuplicateId(String),

    #[error("source with same location already exists as '{name}' (ID: {id})")]
    LocationConflict { name: String, id: String },

    #[error("source with name '{0}' already exists")]
    NameConflict(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("source identifier cannot be empty")]
    EmptyIdentifier,

    #[error("Failed to migrate source state: {0}")]
    StateError(#[from] SourceStateError),
}

/// Get the path to the manifest file
#[must_use]
pub fn get_manifest_path(repo_path: &Path) -> PathBuf {
    repo_path.join(MANIFEST_FILE)
}

/// Load the manifest from the repository root.
///
/// A missing file yields an empty manifest. Legacy files are migrated and
/// sources without an ID get one; persisting those IDs is best effort.
pub async fn load_manifest(repo_path: &Path) -> Result<RepoManifest, ManifestError> {
    let manifest_path = get_manifest_path(repo_path);

    if !manifest_path.exists() {
        return Ok(RepoManifest::default());
    }

    let content = fs::read_to_string(&manifest_path).await?;
    let mut manifest = migrate::migrate_if_needed(repo_path, &content).await?;

    if backfill_source_ids(&mut manifest) {
        if let Err(e) = save_manifest(repo_path, &manifest).await {
            warn!(
                path = %manifest_path.display(),
                error = %e,
                "could not persist migrated source IDs"
            );
        } else {
            debug!(path = %manifest_path.display(), "persisted backfilled source IDs");
        }
    }

    manifest.validate()?;
    Ok(manifest)
}

/// Validate and write the manifest to the repository root.
pub async fn save_manifest(repo_path: &Path, manifest: &RepoManifest) -> Result<(), ManifestError> {
    manifest.validate()?;
    let content = serde_yaml::to_string(manifest)?;
    atomic_write(&get_manifest_path(repo_path), &content).await?;
    Ok(())
}

/// Give every source lacking an ID its generated one. Returns whether
/// anything changed.
fn backfill_source_ids(manifest: &mut RepoManifest) -> bool {
    let mut changed = false;
    for source in &mut manifest.sources {
        if source.id.is_empty() {
            source.id = generate_source_id(source);
            changed |= !source.id.is_empty();
        }
    }
    changed
}

/// Source names follow the resource slug grammar: 1-64 lowercase
/// alphanumerics and single hyphens.
#[must_use]
pub fn is_valid_source_name(name: &str) -> bool {
    is_valid_segment(name)
}

fn validate_source(source: &Source) -> Result<(), ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidSource {
        name: source.name.clone(),
        reason: reason.to_string(),
    };

    if source.name.is_empty() {
        return Err(invalid("source name cannot be empty"));
    }
    if !is_valid_source_name(&source.name) {
        return Err(invalid(
            "must be lowercase alphanumeric with hyphens, 1-64 chars",
        ));
    }
    match (source.local_path(), source.remote_url()) {
        (None, None) => Err(invalid("source must have either path or url")),
        (Some(_), Some(_)) => Err(invalid("source cannot have both path and url")),
        _ => Ok(()),
    }
}

/// Derive a filesystem-safe source name from the path's last component or
/// the repository part of the URL.
#[must_use]
pub fn generate_source_name(source: &Source) -> String {
    let base = if let Some(path) = source.local_path() {
        Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else if let Some(url) = source.remote_url() {
        let trimmed = url.strip_suffix(".git").unwrap_or(url);
        let tail = trimmed.rsplit('/').next().unwrap_or_default();
        tail.rsplit(':').next().unwrap_or_default().to_string()
    } else {
        String::new()
    };

    let slugged = slug::slugify(&base);
    let truncated: String = slugged.chars().take(MAX_SOURCE_NAME_LEN).collect();
    let name = truncated.trim_matches('-');
    if name.is_empty() {
        "source".to_string()
    } else {
        name.to_string()
    }
}

impl RepoManifest {
    /// Check version, per-source shape, and uniqueness of names and IDs.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestError::InvalidVersion(self.version));
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for source in &self.sources {
            validate_source(source)?;
            if !names.insert(source.name.as_str()) {
                return Err(ManifestError::DuplicateName(source.name.clone()));
            }
            if !source.id.is_empty() && !ids.insert(source.id.as_str()) {
                return Err(ManifestError::DuplicateId(source.id.clone()));
            }
        }
        Ok(())
    }

    /// Add a source, generating its name and ID when absent.
    ///
    /// Rejects a source whose location is already declared under another
    /// name, and a source whose name is taken.
    pub fn add_source(&mut self, mut source: Source) -> Result<Source, ManifestError> {
        if source.name.is_empty() {
            source.name = generate_source_name(&source);
        }
        if source.id.is_empty() {
            source.id = generate_source_id(&source);
        }

        validate_source(&source)?;

        if !source.id.is_empty() {
            if let Some(existing) = self
                .sources
                .iter()
                .find(|s| s.id == source.id && s.name != source.name)
            {
                return Err(ManifestError::LocationConflict {
                    name: existing.name.clone(),
                    id: existing.id.clone(),
                });
            }
        }

        if self.has_source(&source.name) {
            return Err(ManifestError::NameConflict(source.name));
        }

        self.sources.push(source.clone());
        Ok(source)
    }

    /// Remove a source by ID, falling back to name, path or URL.
    pub fn remove_source(&mut self, identifier: &str) -> Result<Source, ManifestError> {
        if identifier.is_empty() {
            return Err(ManifestError::EmptyIdentifier);
        }
        let index = self
            .find_index(identifier)
            .ok_or_else(|| ManifestError::SourceNotFound(identifier.to_string()))?;
        Ok(self.sources.remove(index))
    }

    /// Find a source by ID, falling back to name, path or URL.
    #[must_use]
    pub fn get_source(&self, identifier: &str) -> Option<&Source> {
        self.find_index(identifier)
            .and_then(|index| self.sources.get(index))
    }

    #[must_use]
    pub fn has_source(&self, identifier: &str) -> bool {
        self.get_source(identifier).is_some()
    }

    /// Give a source a new name. Its ID is untouched, so resources imported
    /// from it keep matching.
    pub fn rename_source(&mut self, identifier: &str, new_name: &str) -> Result<Source, ManifestError> {
        if identifier.is_empty() {
            return Err(ManifestError::EmptyIdentifier);
        }
        let index = self
            .find_index(identifier)
            .ok_or_else(|| ManifestError::SourceNotFound(identifier.to_string()))?;

        if self
            .sources
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.name == new_name)
        {
            return Err(ManifestError::NameConflict(new_name.to_string()));
        }

        let source = self
            .sources
            .get_mut(index)
            .ok_or_else(|| ManifestError::SourceNotFound(identifier.to_string()))?;
        let mut renamed = source.clone();
        renamed.name = new_name.to_string();
        if renamed.id.is_empty() {
            renamed.id = generate_source_id(&renamed);
        }
        validate_source(&renamed)?;
        *source = renamed.clone();
        Ok(renamed)
    }

    /// ID matches win over name, path or URL matches.
    fn find_index(&self, identifier: &str) -> Option<usize> {
        if identifier.is_empty() {
            return None;
        }
        self.sources
            .iter()
            .position(|s| !s.id.is_empty() && s.id == identifier)
            .or_else(|| {
                self.sources.iter().position(|s| {
                    s.name == identifier
                        || s.local_path() == Some(identifier)
                        || s.remote_url() == Some(identifier)
                })
            })
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
