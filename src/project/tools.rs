use super::ProjectError;
use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// An AI coding tool that reads resources from a project directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Claude,
    Opencode,
    Copilot,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Claude, Tool::Opencode, Tool::Copilot];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Claude => "claude",
            Tool::Opencode => "opencode",
            Tool::Copilot => "copilot",
        }
    }

    /// Directory marking the tool as present in a project
    #[must_use]
    pub fn marker_dir(self) -> &'static str {
        match self {
            Tool::Claude => ".claude",
            Tool::Opencode => ".opencode",
            Tool::Copilot => ".github/skills",
        }
    }

    /// Project-relative directory holding resources of `resource_type`, or
    /// `None` when the tool does not support that type.
    #[must_use]
    pub fn resource_dir(self, resource_type: ResourceType) -> Option<&'static str> {
        match (self, resource_type) {
            (Tool::Claude, ResourceType::Command) => Some(".claude/commands"),
            (Tool::Claude, ResourceType::Skill) => Some(".claude/skills"),
            (Tool::Claude, ResourceType::Agent) => Some(".claude/agents"),
            (Tool::Opencode, ResourceType::Command) => Some(".opencode/commands"),
            (Tool::Opencode, ResourceType::Skill) => Some(".opencode/skills"),
            (Tool::Opencode, ResourceType::Agent) => Some(".opencode/agents"),
            (Tool::Copilot, ResourceType::Skill) => Some(".github/skills"),
            _ => None,
        }
    }

    #[must_use]
    pub fn supports(self, resource_type: ResourceType) -> bool {
        self.resource_dir(resource_type).is_some()
    }

    /// Absolute resource directory for this tool inside `project`.
    #[must_use]
    pub fn dir_in(self, project: &Path, resource_type: ResourceType) -> Option<PathBuf> {
        self.resource_dir(resource_type).map(|dir| project.join(dir))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(Tool::Claude),
            "opencode" => Ok(Tool::Opencode),
            "copilot" | "vscode" => Ok(Tool::Copilot),
            _ => Err(ProjectError::UnknownTool(s.to_string())),
        }
    }
}

async fn dir_exists(path: &Path) -> Result<bool, ProjectError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProjectError::io(path, e)),
    }
}

/// Tools whose marker directory exists in `project`, in [`Tool::ALL`] order.
///
/// Copilot is detected by `.github/skills` rather than `.github`, which most
/// repositories carry for CI alone.
pub async fn detect_tools(project: &Path) -> Result<Vec<Tool>, ProjectError> {
    let mut detected = Vec::new();
    for tool in Tool::ALL {
        if dir_exists(&project.join(tool.marker_dir())).await? {
            detected.push(tool);
        }
    }
    Ok(detected)
}
