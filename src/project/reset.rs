use super::{LineReader, ProjectError, Tool};
use crate::project::installer::resolve_link_target;
use crate::resource::ResourceType;
use crate::utils::absolute_path;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// How a destructive pass applies its changes. Shared by reset and prune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Report only
    DryRun,
    /// Apply without asking
    Force,
    /// Ask on the reader first
    Interactive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetOutcome {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    pub cancelled: bool,
}

/// A link is managed when it points into the repository, dangling or not.
async fn is_unmanaged(link: &Path, repo_root: &Path) -> bool {
    match fs::read_link(link).await {
        Ok(target) => !resolve_link_target(link, &target).starts_with(repo_root),
        Err(_) => true,
    }
}

async fn scan_dir_for_unmanaged(
    dir: &Path,
    repo_root: &Path,
    namespaced: bool,
) -> Result<Vec<PathBuf>, ProjectError> {
    let mut read = match fs::read_dir(dir).await {
        Ok(r) => r,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ProjectError::io(dir, e)),
    };
    let mut entries = Vec::new();
    while let Some(entry) = read
        .next_entry()
        .await
        .map_err(|e| ProjectError::io(dir, e))?
    {
        entries.push(entry.path());
    }
    entries.sort();

    let mut unmanaged = Vec::new();
    for path in entries {
        let Ok(meta) = fs::symlink_metadata(&path).await else {
            continue;
        };
        if meta.file_type().is_symlink() {
            if is_unmanaged(&path, repo_root).await {
                unmanaged.push(path);
            }
        } else if meta.is_dir() && namespaced {
            let Ok(mut sub_read) = fs::read_dir(&path).await else {
                continue;
            };
            let mut subs = Vec::new();
            while let Ok(Some(sub)) = sub_read.next_entry().await {
                subs.push(sub.path());
            }
            subs.sort();
            for sub in subs {
                let Ok(sub_meta) = fs::symlink_metadata(&sub).await else {
                    continue;
                };
                if sub_meta.is_dir() {
                    continue;
                }
                if !sub_meta.file_type().is_symlink() || is_unmanaged(&sub, repo_root).await {
                    unmanaged.push(sub);
                }
            }
        } else {
            unmanaged.push(path);
        }
    }
    Ok(unmanaged)
}

/// Files in the detected tools' resource directories that were not put
/// there by an install: plain files and directories, and symlinks that are
/// unreadable or point outside the repository. Command directories are
/// searched one namespace level deep.
pub async fn find_unmanaged_files(
    project: &Path,
    tools: &[Tool],
    repo_root: &Path,
) -> Result<Vec<PathBuf>, ProjectError> {
    let repo_root = absolute_path(repo_root);
    let mut unmanaged = Vec::new();
    for tool in tools {
        for resource_type in ResourceType::INSTALLABLE {
            let Some(dir) = tool.dir_in(project, resource_type) else {
                continue;
            };
            let namespaced = resource_type == ResourceType::Command;
            unmanaged.extend(scan_dir_for_unmanaged(&dir, &repo_root, namespaced).await?);
        }
    }
    Ok(unmanaged)
}

/// Remove what [`find_unmanaged_files`] found.
///
/// In [`ResetMode::Interactive`] one confirmation covers the whole batch;
/// anything but `y` or `yes` (or end of input) cancels. Empty namespace
/// directories left behind are removed afterwards.
#[instrument(skip_all, fields(count = paths.len(), mode = ?mode))]
pub async fn remove_unmanaged(
    paths: &[PathBuf],
    mode: ResetMode,
    reader: &mut dyn LineReader,
    out: &mut dyn Write,
) -> Result<ResetOutcome, ProjectError> {
    let mut outcome = ResetOutcome::default();
    if paths.is_empty() {
        return Ok(outcome);
    }

    if mode == ResetMode::DryRun {
        writeln!(out, "\nWould remove {} unmanaged file(s):", paths.len())?;
        for path in paths {
            writeln!(out, "  Would remove: {}", path.display())?;
        }
        return Ok(outcome);
    }

    writeln!(out, "\nFound {} unmanaged file(s) in resource directories:", paths.len())?;
    for path in paths {
        writeln!(out, "  {}", path.display())?;
    }
    writeln!(out)?;

    if mode == ResetMode::Interactive {
        write!(out, "Remove all {} unmanaged files? [y/N]: ", paths.len())?;
        out.flush()?;
        let answer = reader.read_line()?.unwrap_or_default();
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            writeln!(out, "Reset cancelled.")?;
            outcome.cancelled = true;
            return Ok(outcome);
        }
    }

    for path in paths {
        let removal = match fs::symlink_metadata(path).await {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
            Ok(_) => fs::remove_file(path).await,
            Err(e) => Err(e),
        };
        match removal {
            Ok(()) => {
                writeln!(out, "  Removed: {}", path.display())?;
                outcome.removed.push(path.clone());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove unmanaged file");
                writeln!(out, "  Failed to remove {}: {e}", path.display())?;
                outcome.failed.push(path.clone());
            }
        }
    }

    outcome.removed_dirs = cleanup_empty_namespace_dirs(&outcome.removed).await;
    for dir in &outcome.removed_dirs {
        writeln!(out, "  Removed empty directory: {}", dir.display())?;
    }
    info!(removed = outcome.removed.len(), "reset complete");
    writeln!(out, "\nRemoved {} unmanaged file(s)", outcome.removed.len())?;
    Ok(outcome)
}

/// Remove parent directories of `removed` that are now empty. Returns the
/// directories removed.
pub async fn cleanup_empty_namespace_dirs(removed: &[PathBuf]) -> Vec<PathBuf> {
    let parents: BTreeSet<&Path> = removed.iter().filter_map(|p| p.parent()).collect();
    let mut cleaned = Vec::new();
    for dir in parents {
        let Ok(mut read) = fs::read_dir(dir).await else {
            continue;
        };
        if !matches!(read.next_entry().await, Ok(None)) {
            continue;
        }
        if fs::remove_dir(dir).await.is_ok() {
            cleaned.push(dir.to_path_buf());
        }
    }
    cleaned
}
