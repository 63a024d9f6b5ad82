mod atomic;
mod hash;

pub use atomic::atomic_write;
pub use hash::compute_hash;

use std::path::{Component, Path, PathBuf};

/// Format a path for display, replacing home directory with ~/
#[must_use]
pub fn format_display_path(path: &str) -> String {
    replace_homedir::replace_homedir(path, "~")
}

/// Expand a leading `~/` to the user's home directory.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding named component. Leading `..` components are kept, and `..`
/// at the root is dropped. Does not touch the filesystem.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                match out.components().next_back() {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    _ => out.push(".."),
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Resolve a path to an absolute, cleaned path. Falls back to the cleaned
/// input when the current directory cannot be determined.
#[must_use]
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return clean_path(path);
    }
    std::env::current_dir().map_or_else(|_| clean_path(path), |cwd| clean_path(&cwd.join(path)))
}

#[cfg(test)]
#[path = "utils_tests_1.rs"]
mod tests;
