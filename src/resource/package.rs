use super::{validate_name, ResourceError, ResourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Suffix of package definition files
pub const PACKAGE_SUFFIX: &str = ".package.json";

/// A named bundle of `type/name` references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub resources: Vec<String>,
}

impl Package {
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.name.is_empty() {
            return Err(ResourceError::MissingPackageField("name"));
        }
        if self.description.is_empty() {
            return Err(ResourceError::MissingPackageField("description"));
        }
        validate_name(&self.name)
    }
}

/// Provenance of a package, stored under `.metadata/packages/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    pub first_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub resource_count: usize,
}

#[must_use]
pub fn package_file_name(name: &str) -> String {
    format!("{name}{PACKAGE_SUFFIX}")
}

/// Read and validate a package definition file.
pub async fn load_package(path: &Path) -> Result<Package, ResourceError> {
    let content = fs::read_to_string(path).await?;
    let package: Package = serde_json::from_str(&content)?;
    package.validate()?;
    Ok(package)
}

/// A `type/name` reference as used in packages and project manifests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub name: String,
}

impl ResourceRef {
    #[must_use]
    pub fn new(resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            resource_type,
            name: name.into(),
        }
    }

    /// Split on the first `/`, so nested command names survive intact.
    pub fn parse(reference: &str) -> Result<Self, ResourceError> {
        let (type_str, name) = reference
            .split_once('/')
            .ok_or_else(|| ResourceError::InvalidReference(reference.to_string()))?;
        let resource_type = type_str
            .parse::<ResourceType>()
            .map_err(ResourceError::Unrecognized)?;
        if name.is_empty() {
            return Err(ResourceError::Unrecognized(format!(
                "resource name cannot be empty in: {reference:?}"
            )));
        }
        Ok(Self::new(resource_type, name))
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.name)
    }
}
