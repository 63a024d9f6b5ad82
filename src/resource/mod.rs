//! Commands, skills, agents and packages as they appear on disk.

mod frontmatter;
mod load;
mod name;
mod package;
mod types;

pub use frontmatter::{parse_frontmatter, Frontmatter, FrontmatterError};
pub use load::{detect_type, load_agent, load_command, load_resource, load_skill, SKILL_FILE};
pub use name::{is_valid_segment, validate_description, validate_name};
pub use package::{
    load_package, package_file_name, Package, PackageMetadata, ResourceRef, PACKAGE_SUFFIX,
};
pub use types::{Resource, ResourceType};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to read resource: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid description: {0}")]
    InvalidDescription(String),

    #[error("skill name '{name}' must match directory name '{dir}'")]
    SkillNameMismatch { name: String, dir: String },

    #[error("invalid frontmatter: {0}")]
    Frontmatter(#[from] FrontmatterError),

    #[error("{0}")]
    Unrecognized(String),

    #[error("invalid resource format: {0:?} (expected type/name)")]
    InvalidReference(String),

    #[error("failed to parse package JSON: {0}")]
    PackageJson(#[from] serde_json::Error),

    #[error("package {0} is required")]
    MissingPackageField(&'static str),

    /// A load or validation failure annotated with what was being loaded
    #[error("{resource_type} '{name}' in {}: {source}", path.display())]
    Invalid {
        resource_type: ResourceType,
        name: String,
        path: PathBuf,
        #[source]
        source: Box<ResourceError>,
    },
}

impl ResourceError {
    pub(crate) fn invalid(
        resource_type: ResourceType,
        name: &str,
        path: impl Into<PathBuf>,
        source: ResourceError,
    ) -> Self {
        ResourceError::Invalid {
            resource_type,
            name: name.to_string(),
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl Resource {
    /// Check name grammar, description, and that the type is installable.
    pub fn validate(&self) -> Result<(), ResourceError> {
        validate_name(&self.name)?;
        validate_description(&self.description, self.resource_type)?;
        if self.resource_type == ResourceType::Package {
            return Err(ResourceError::Unrecognized(format!(
                "invalid resource type: {} (must be 'command', 'skill', or 'agent')",
                self.resource_type
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
