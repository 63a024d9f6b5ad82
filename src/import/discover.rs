use crate::resource::{PACKAGE_SUFFIX, SKILL_FILE};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with('.') || n == "node_modules")
}

fn under_type_dir(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .is_some_and(|rel| {
            rel.components()
                .any(|c| matches!(c.as_os_str().to_str(), Some("commands" | "agents")))
        })
        || root
            .file_name()
            .is_some_and(|n| n == "commands" || n == "agents")
}

/// Candidate resource paths under `root`, sorted and deduplicated, with
/// package files after everything else so their references resolve.
///
/// A file, or a directory holding `SKILL.md`, is its own only candidate.
/// Otherwise the tree is walked for skill directories, package files, and
/// markdown files below a `commands` or `agents` directory. Hidden
/// directories and `node_modules` are not entered.
#[must_use]
pub fn discover_candidates(root: &Path) -> Vec<PathBuf> {
    if root.is_file() || root.join(SKILL_FILE).is_file() {
        return vec![root.to_path_buf()];
    }

    let mut found = BTreeSet::new();
    let mut packages = BTreeSet::new();
    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else {
            continue;
        };
        if is_skipped_dir(&entry) {
            walker.skip_current_dir();
            continue;
        }
        let path = entry.path();
        if entry.file_type().is_dir() {
            if entry.depth() > 0 && path.join(SKILL_FILE).is_file() {
                found.insert(path.to_path_buf());
                walker.skip_current_dir();
            }
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(PACKAGE_SUFFIX) {
            packages.insert(path.to_path_buf());
        } else if name.ends_with(".md") && under_type_dir(root, path) {
            found.insert(path.to_path_buf());
        }
    }
    found.into_iter().chain(packages).collect()
}
