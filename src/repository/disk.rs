use super::{ImportMode, Repository, RepositoryError, Sidecar, StoredResource};
use crate::metadata::{self, MetadataError, ResourceMetadata, METADATA_DIR, METADATA_SUFFIX};
use crate::resource::{
    load_package, Package, PackageMetadata, Resource, ResourceType,
    PACKAGE_SUFFIX,
};
use crate::utils::atomic_write;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

const ALL_TYPES: [ResourceType; 4] = [
    ResourceType::Command,
    ResourceType::Skill,
    ResourceType::Agent,
    ResourceType::Package,
];

/// The repository as laid out on disk: `commands/`, `skills/`, `agents/`,
/// `packages/` and `.metadata/` under one root.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes need an existing root directory.
    async fn ensure_available(&self) -> Result<(), RepositoryError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(RepositoryError::Unavailable(self.root.clone())),
        }
    }

    async fn remove_path(path: &Path) -> Result<(), RepositoryError> {
        let meta = match fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(RepositoryError::io(path, e)),
        };
        let result = if meta.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };
        result.map_err(|e| RepositoryError::io(path, e))
    }
}

fn modified_time(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified().map_or_else(|_| Utc::now(), DateTime::<Utc>::from)
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Recursively copy a skill directory.
fn copy_dir(src: &Path, dest: &Path) -> Result<(), RepositoryError> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            RepositoryError::io(path, e.into())
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| RepositoryError::io(&target, e))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| RepositoryError::io(&target, e))?;
        }
    }
    Ok(())
}

async fn read_dir_entries(
    dir: &Path,
) -> Result<Vec<(PathBuf, std::fs::Metadata)>, RepositoryError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RepositoryError::io(dir, e)),
    };
    let mut out = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| RepositoryError::io(dir, e))?
    {
        let path = entry.path();
        if name_of(&path).starts_with('.') {
            continue;
        }
        // Follows symlinks; dangling links are skipped.
        if let Ok(meta) = fs::metadata(&path).await {
            out.push((path, meta));
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

fn list_commands(dir: &Path) -> Vec<StoredResource> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !path.extension().is_some_and(|e| e == "md") {
            continue;
        }
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let modified = entry
            .metadata()
            .map_or_else(|_| Utc::now(), |m| modified_time(&m));
        out.push(StoredResource {
            resource_type: ResourceType::Command,
            name,
            path: path.to_path_buf(),
            modified,
        });
    }
    out
}

#[async_trait]
impl Repository for FsRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn init(&self) -> Result<(), RepositoryError> {
        for dir in ALL_TYPES
            .iter()
            .map(|t| self.root.join(t.dir_name()))
            .chain(std::iter::once(self.root.join(METADATA_DIR)))
        {
            fs::create_dir_all(&dir)
                .await
                .map_err(|_| RepositoryError::Unavailable(self.root.clone()))?;
        }
        debug!(root = %self.root.display(), "initialized repository");
        Ok(())
    }

    async fn resource_exists(&self, resource_type: ResourceType, name: &str) -> bool {
        fs::metadata(self.resource_path(resource_type, name))
            .await
            .is_ok()
    }

    async fn put_resource(
        &self,
        resource: &Resource,
        mode: ImportMode,
    ) -> Result<(), RepositoryError> {
        self.ensure_available().await?;

        let dest = self.resource_path(resource.resource_type, &resource.name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::io(parent, e))?;
        }
        Self::remove_path(&dest).await?;

        match mode {
            ImportMode::Symlink => {
                let target = crate::utils::absolute_path(&resource.path);
                fs::symlink(&target, &dest)
                    .await
                    .map_err(|e| RepositoryError::io(&dest, e))?;
            }
            ImportMode::Copy if resource.resource_type == ResourceType::Skill => {
                let (src, target) = (resource.path.clone(), dest.clone());
                tokio::task::spawn_blocking(move || copy_dir(&src, &target))
                    .await
                    .map_err(|e| RepositoryError::io(&dest, std::io::Error::other(e)))??;
            }
            ImportMode::Copy => {
                fs::copy(&resource.path, &dest)
                    .await
                    .map_err(|e| RepositoryError::io(&dest, e))?;
            }
        }

        debug!(
            resource = %resource.name,
            resource_type = %resource.resource_type,
            path = %dest.display(),
            "stored resource"
        );
        Ok(())
    }

    async fn delete_resource(
        &self,
        resource_type: ResourceType,
        name: &str,
    ) -> Result<(), RepositoryError> {
        self.ensure_available().await?;
        Self::remove_path(&self.resource_path(resource_type, name)).await
    }

    async fn list_resources(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<StoredResource>, RepositoryError> {
        let dir = self.root.join(resource_type.dir_name());
        if resource_type == ResourceType::Command {
            return Ok(list_commands(&dir));
        }

        let mut out = Vec::new();
        for (path, meta) in read_dir_entries(&dir).await? {
            let file_name = name_of(&path);
            let name = match resource_type {
                ResourceType::Skill if meta.is_dir() => file_name,
                ResourceType::Agent if meta.is_file() => match file_name.strip_suffix(".md") {
                    Some(stem) => stem.to_string(),
                    None => continue,
                },
                ResourceType::Package if meta.is_file() => {
                    match file_name.strip_suffix(PACKAGE_SUFFIX) {
                        Some(stem) => stem.to_string(),
                        None => continue,
                    }
                }
                _ => continue,
            };
            out.push(StoredResource {
                resource_type,
                name,
                modified: modified_time(&meta),
                path,
            });
        }
        Ok(out)
    }

    async fn get_metadata(
        &self,
        resource_type: ResourceType,
        name: &str,
    ) -> Result<Option<ResourceMetadata>, RepositoryError> {
        match metadata::load(name, resource_type, &self.root).await {
            Ok(meta) => Ok(Some(meta)),
            Err(MetadataError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_metadata(&self, metadata: &ResourceMetadata) -> Result<(), RepositoryError> {
        self.ensure_available().await?;
        metadata::save(metadata, &self.root, "").await?;
        Ok(())
    }

    async fn delete_sidecar(&self, sidecar: &Sidecar) -> Result<(), RepositoryError> {
        self.ensure_available().await?;
        match fs::remove_file(&sidecar.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepositoryError::io(&sidecar.path, e)),
        }
    }

    async fn list_sidecars(&self) -> Result<Vec<Sidecar>, RepositoryError> {
        let mut out = Vec::new();
        for resource_type in ALL_TYPES {
            let dir = metadata::get_metadata_dir(resource_type, &self.root);
            for (path, meta) in read_dir_entries(&dir).await? {
                let file_name = name_of(&path);
                let Some(stem) = file_name.strip_suffix(METADATA_SUFFIX) else {
                    continue;
                };
                if !meta.is_file() {
                    continue;
                }

                let recorded = fs::read_to_string(&path)
                    .await
                    .ok()
                    .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
                    .and_then(|v| v.get("name").and_then(|n| n.as_str()).map(String::from));
                if recorded.is_none() {
                    warn!(path = %path.display(), "unreadable metadata sidecar");
                }

                out.push(Sidecar {
                    resource_type,
                    readable: recorded.is_some(),
                    name: recorded.unwrap_or_else(|| stem.to_string()),
                    path,
                });
            }
        }
        Ok(out)
    }

    async fn package_exists(&self, name: &str) -> bool {
        fs::metadata(self.resource_path(ResourceType::Package, name))
            .await
            .is_ok_and(|m| m.is_file())
    }

    async fn get_package(&self, name: &str) -> Result<Option<Package>, RepositoryError> {
        let path = self.resource_path(ResourceType::Package, name);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(load_package(&path).await?))
    }

    async fn put_package(&self, package: &Package) -> Result<(), RepositoryError> {
        self.ensure_available().await?;
        package.validate()?;
        let path = self.resource_path(ResourceType::Package, &package.name);
        let content = serde_json::to_string_pretty(package)?;
        atomic_write(&path, &content)
            .await
            .map_err(|e| RepositoryError::io(&path, e))?;
        Ok(())
    }

    async fn delete_package(&self, name: &str) -> Result<(), RepositoryError> {
        self.ensure_available().await?;
        Self::remove_path(&self.resource_path(ResourceType::Package, name)).await
    }

    async fn list_packages(&self) -> Result<Vec<Package>, RepositoryError> {
        let mut out = Vec::new();
        for stored in self.list_resources(ResourceType::Package).await? {
            match load_package(&stored.path).await {
                Ok(package) => out.push(package),
                Err(e) => {
                    warn!(path = %stored.path.display(), error = %e, "skipping invalid package");
                }
            }
        }
        Ok(out)
    }

    async fn put_package_metadata(
        &self,
        metadata: &PackageMetadata,
    ) -> Result<(), RepositoryError> {
        self.ensure_available().await?;
        metadata::save_package_metadata(metadata, &self.root).await?;
        Ok(())
    }
}
