//! Consumer side: projects that install repository resources as symlinks
//! into tool directories (`.claude/`, `.opencode/`, `.github/skills`).
//!
//! The project manifest (`ai.package.yaml`) says what should be installed;
//! [`scan_project_issues`] and [`check_manifest_sync`] find drift between
//! it, the links on disk and the repository, and [`apply_repair_fixes`]
//! resolves what can be resolved without losing data. Reset and prune are
//! opt-in passes on top of that.

mod installer;
mod manifest;
mod prompt;
mod prune;
mod repair;
mod reset;
mod scan;
mod tools;

pub use installer::{link_path, Installer};
pub use manifest::{project_manifest_path, InstallConfig, ProjectManifest, PROJECT_MANIFEST_FILE};
pub use prompt::{LineReader, ScriptedReader, StdinReader};
pub use prune::{
    find_invalid_manifest_refs, ref_is_valid, resolve_invalid_refs, PartialPackageWarning,
    PruneOutcome,
};
pub use repair::{apply_repair_fixes, RepairAction, RepairResult, RepairSummary};
pub use reset::{
    cleanup_empty_namespace_dirs, find_unmanaged_files, remove_unmanaged, ResetMode, ResetOutcome,
};
pub use scan::{
    check_manifest_sync, deduplicate_issues, parse_resource_from_issue, scan_project_issues,
    IssueType, Severity, VerifyIssue,
};
pub use tools::{detect_tools, Tool};

use crate::repository::RepositoryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest file not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("failed to parse manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("unknown tool: {0} (must be: claude, opencode, copilot, or vscode)")]
    UnknownTool(String),

    #[error("{0} not found in repository")]
    NotInRepository(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] std::io::Error),
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
