use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Kind of asset stored in the repository
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Command,
    Skill,
    Agent,
    Package,
}

impl ResourceType {
    /// The installable kinds, in scan order.
    pub const INSTALLABLE: [ResourceType; 3] =
        [ResourceType::Command, ResourceType::Skill, ResourceType::Agent];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Command => "command",
            ResourceType::Skill => "skill",
            ResourceType::Agent => "agent",
            ResourceType::Package => "package",
        }
    }

    /// Directory name under the repository root (and under `.metadata/`).
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            ResourceType::Command => "commands",
            ResourceType::Skill => "skills",
            ResourceType::Agent => "agents",
            ResourceType::Package => "packages",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(ResourceType::Command),
            "skill" => Ok(ResourceType::Skill),
            "agent" => Ok(ResourceType::Agent),
            "package" => Ok(ResourceType::Package),
            _ => Err(format!(
                "invalid resource type: {s:?} (expected command/skill/agent/package)"
            )),
        }
    }
}

/// A command, skill or agent loaded from disk.
///
/// For nested commands `name` holds the full `ns/name` path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}
