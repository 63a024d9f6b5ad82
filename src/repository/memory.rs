use super::{ImportMode, Repository, RepositoryError, Sidecar, StoredResource};
use crate::metadata::{get_metadata_path, ResourceMetadata};
use crate::resource::{Package, PackageMetadata, Resource, ResourceType};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
enum SidecarEntry {
    Resource(ResourceMetadata),
    Package(PackageMetadata),
    Unreadable,
}

#[derive(Debug, Default)]
struct State {
    available: bool,
    resources: BTreeMap<(ResourceType, String), StoredResource>,
    sidecars: BTreeMap<(ResourceType, String), SidecarEntry>,
    packages: BTreeMap<String, Package>,
}

/// In-memory [`Repository`] used to exercise import and reconciliation
/// logic without touching the filesystem.
#[derive(Debug)]
pub struct MemoryRepository {
    root: PathBuf,
    state: Mutex<State>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(State {
                available: true,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self, state: &State) -> Result<(), RepositoryError> {
        if state.available {
            Ok(())
        } else {
            Err(RepositoryError::Unavailable(self.root.clone()))
        }
    }

    /// Simulate the repository root disappearing (or coming back).
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Store a sidecar under `dir_type` regardless of the type it declares.
    pub fn insert_sidecar(&self, dir_type: ResourceType, metadata: ResourceMetadata) {
        self.lock().sidecars.insert(
            (dir_type, metadata.name.clone()),
            SidecarEntry::Resource(metadata),
        );
    }

    /// Store a sidecar whose content cannot be parsed.
    pub fn insert_unreadable_sidecar(&self, dir_type: ResourceType, name: &str) {
        self.lock()
            .sidecars
            .insert((dir_type, name.to_string()), SidecarEntry::Unreadable);
    }

    #[must_use]
    pub fn sidecar_count(&self) -> usize {
        self.lock().sidecars.len()
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.lock().resources.len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn init(&self) -> Result<(), RepositoryError> {
        let state = self.lock();
        self.check_available(&state)
    }

    async fn resource_exists(&self, resource_type: ResourceType, name: &str) -> bool {
        self.lock()
            .resources
            .contains_key(&(resource_type, name.to_string()))
    }

    async fn put_resource(
        &self,
        resource: &Resource,
        _mode: ImportMode,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        self.check_available(&state)?;
        let stored = StoredResource {
            resource_type: resource.resource_type,
            name: resource.name.clone(),
            path: self.resource_path(resource.resource_type, &resource.name),
            modified: Utc::now(),
        };
        state
            .resources
            .insert((resource.resource_type, resource.name.clone()), stored);
        Ok(())
    }

    async fn delete_resource(
        &self,
        resource_type: ResourceType,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        self.check_available(&state)?;
        state.resources.remove(&(resource_type, name.to_string()));
        Ok(())
    }

    async fn list_resources(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<StoredResource>, RepositoryError> {
        let state = self.lock();
        if resource_type == ResourceType::Package {
            let now = Utc::now();
            return Ok(state
                .packages
                .keys()
                .map(|name| StoredResource {
                    resource_type,
                    name: name.clone(),
                    path: self.resource_path(resource_type, name),
                    modified: now,
                })
                .collect());
        }
        Ok(state
            .resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .cloned()
            .collect())
    }

    async fn get_metadata(
        &self,
        resource_type: ResourceType,
        name: &str,
    ) -> Result<Option<ResourceMetadata>, RepositoryError> {
        match self.lock().sidecars.get(&(resource_type, name.to_string())) {
            Some(SidecarEntry::Resource(meta)) => Ok(Some(meta.clone())),
            Some(SidecarEntry::Unreadable) => Err(RepositoryError::Json(
                serde::de::Error::custom("unreadable sidecar"),
            )),
            Some(SidecarEntry::Package(_)) | None => Ok(None),
        }
    }

    async fn put_metadata(&self, metadata: &ResourceMetadata) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        self.check_available(&state)?;
        state.sidecars.insert(
            (metadata.resource_type, metadata.name.clone()),
            SidecarEntry::Resource(metadata.clone()),
        );
        Ok(())
    }

    async fn delete_sidecar(&self, sidecar: &Sidecar) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        self.check_available(&state)?;
        state
            .sidecars
            .remove(&(sidecar.resource_type, sidecar.name.clone()));
        Ok(())
    }

    async fn list_sidecars(&self) -> Result<Vec<Sidecar>, RepositoryError> {
        Ok(self
            .lock()
            .sidecars
            .iter()
            .map(|((resource_type, key), entry)| {
                let recorded = match entry {
                    SidecarEntry::Resource(meta) => Some(&meta.name),
                    SidecarEntry::Package(meta) => Some(&meta.name),
                    SidecarEntry::Unreadable => None,
                };
                Sidecar {
                    resource_type: *resource_type,
                    name: recorded.unwrap_or(key).clone(),
                    path: get_metadata_path(key, *resource_type, &self.root),
                    readable: recorded.is_some(),
                }
            })
            .collect())
    }

    async fn package_exists(&self, name: &str) -> bool {
        self.lock().packages.contains_key(name)
    }

    async fn get_package(&self, name: &str) -> Result<Option<Package>, RepositoryError> {
        Ok(self.lock().packages.get(name).cloned())
    }

    async fn put_package(&self, package: &Package) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        self.check_available(&state)?;
        package.validate()?;
        state.packages.insert(package.name.clone(), package.clone());
        Ok(())
    }

    async fn delete_package(&self, name: &str) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        self.check_available(&state)?;
        state.packages.remove(name);
        Ok(())
    }

    async fn list_packages(&self) -> Result<Vec<Package>, RepositoryError> {
        Ok(self.lock().packages.values().cloned().collect())
    }

    async fn put_package_metadata(
        &self,
        metadata: &PackageMetadata,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        self.check_available(&state)?;
        state.sidecars.insert(
            (ResourceType::Package, metadata.name.clone()),
            SidecarEntry::Package(metadata.clone()),
        );
        Ok(())
    }
}
