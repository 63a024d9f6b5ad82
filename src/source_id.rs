//! Deterministic identifiers for sources.
//!
//! An ID is `src-` followed by the first 12 hex characters of the SHA-256 of
//! the source's canonical location. The name plays no part, so renaming a
//! source keeps its ID while moving it produces a new one.

use crate::manifest::Source;
use crate::utils::{absolute_path, compute_hash};
use std::path::Path;

pub const SOURCE_ID_PREFIX: &str = "src-";
const SOURCE_ID_HASH_LEN: usize = 12;

/// Generate the ID for `source`, or an empty string when it has neither a
/// path nor a URL. A URL wins when both are present.
#[must_use]
pub fn generate_source_id(source: &Source) -> String {
    let canonical = if let Some(url) = source.remote_url() {
        normalize_url(url)
    } else if let Some(path) = source.local_path() {
        normalize_path(path)
    } else {
        return String::new();
    };

    let hash = compute_hash(&canonical);
    let short: String = hash.chars().take(SOURCE_ID_HASH_LEN).collect();
    format!("{SOURCE_ID_PREFIX}{short}")
}

/// Lowercase, then strip one trailing `/` and a trailing `.git`.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let lower = url.to_lowercase();
    let trimmed = lower.strip_suffix('/').unwrap_or(&lower);
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}

/// Absolute, lexically cleaned form of `path`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    absolute_path(Path::new(path)).to_string_lossy().into_owned()
}

#[cfg(test)]
#[path = "source_id_tests.rs"]
mod tests;
