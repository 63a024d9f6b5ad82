//! Storage seam for the resource repository.
//!
//! Import and reconciliation code talks to a [`Repository`] rather than to
//! paths directly. [`FsRepository`] is the real on-disk layout;
//! [`MemoryRepository`] keeps everything in memory for tests.

mod disk;
mod memory;

pub use disk::FsRepository;
pub use memory::MemoryRepository;

use crate::errors::ErrorCategory;
use crate::metadata::{MetadataError, ResourceMetadata};
use crate::resource::{
    package_file_name, Package, PackageMetadata, Resource, ResourceError, ResourceRef,
    ResourceType,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("repository not available at {}", .0.display())]
    Unavailable(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("{0}")]
    Resource(#[from] ResourceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RepositoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepositoryError::Io {
            path: path.into(),
            source,
        }
    }

    /// A vanished repository root stops a batch; anything else is scoped to
    /// the item being processed.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            RepositoryError::Unavailable(_) => ErrorCategory::Fatal,
            RepositoryError::Resource(_) => ErrorCategory::Validation,
            _ => ErrorCategory::Resource,
        }
    }
}

/// How a resource's files land in the repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    Copy,
    Symlink,
}

/// A resource present in the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResource {
    pub resource_type: ResourceType,
    pub name: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// A sidecar file found in one of the metadata directories.
///
/// `name` is the name recorded inside the sidecar, or the file name minus
/// its suffix when the sidecar could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    pub resource_type: ResourceType,
    pub name: String,
    pub path: PathBuf,
    pub readable: bool,
}

/// Path of a resource inside a repository rooted at `root`.
#[must_use]
pub fn resource_path(root: &Path, resource_type: ResourceType, name: &str) -> PathBuf {
    let dir = root.join(resource_type.dir_name());
    match resource_type {
        ResourceType::Command | ResourceType::Agent => dir.join(format!("{name}.md")),
        ResourceType::Skill => dir.join(name),
        ResourceType::Package => dir.join(package_file_name(name)),
    }
}

/// References of `package` that do not resolve in `repo`, in declaration
/// order. Malformed references count as missing.
pub async fn missing_refs(repo: &dyn Repository, package: &Package) -> Vec<String> {
    let mut missing = Vec::new();
    for reference in &package.resources {
        let found = match ResourceRef::parse(reference) {
            Ok(r) if r.resource_type == ResourceType::Package => repo.package_exists(&r.name).await,
            Ok(r) => repo.resource_exists(r.resource_type, &r.name).await,
            Err(_) => false,
        };
        if !found {
            missing.push(reference.clone());
        }
    }
    missing
}

#[async_trait]
pub trait Repository: Send + Sync {
    fn root(&self) -> &Path;

    /// Create the root and the per-type directories.
    async fn init(&self) -> Result<(), RepositoryError>;

    fn resource_path(&self, resource_type: ResourceType, name: &str) -> PathBuf {
        resource_path(self.root(), resource_type, name)
    }

    async fn resource_exists(&self, resource_type: ResourceType, name: &str) -> bool;

    /// Store a loaded resource under its name, replacing what is there.
    async fn put_resource(
        &self,
        resource: &Resource,
        mode: ImportMode,
    ) -> Result<(), RepositoryError>;

    /// Remove a resource's files. Its sidecar is left alone.
    async fn delete_resource(
        &self,
        resource_type: ResourceType,
        name: &str,
    ) -> Result<(), RepositoryError>;

    async fn list_resources(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<StoredResource>, RepositoryError>;

    /// The sidecar stored at the path for `(resource_type, name)`, if any.
    async fn get_metadata(
        &self,
        resource_type: ResourceType,
        name: &str,
    ) -> Result<Option<ResourceMetadata>, RepositoryError>;

    async fn put_metadata(&self, metadata: &ResourceMetadata) -> Result<(), RepositoryError>;

    async fn delete_sidecar(&self, sidecar: &Sidecar) -> Result<(), RepositoryError>;

    /// Every sidecar under the command, skill, agent and package metadata
    /// directories.
    async fn list_sidecars(&self) -> Result<Vec<Sidecar>, RepositoryError>;

    async fn package_exists(&self, name: &str) -> bool;

    async fn get_package(&self, name: &str) -> Result<Option<Package>, RepositoryError>;

    async fn put_package(&self, package: &Package) -> Result<(), RepositoryError>;

    async fn delete_package(&self, name: &str) -> Result<(), RepositoryError>;

    async fn list_packages(&self) -> Result<Vec<Package>, RepositoryError>;

    async fn put_package_metadata(&self, metadata: &PackageMetadata)
        -> Result<(), RepositoryError>;
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
