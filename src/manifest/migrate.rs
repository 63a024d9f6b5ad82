//! Upgrade of manifests written before runtime fields moved out.
//!
//! Old manifests carried `mode`, `added` and `last_synced` on each source and
//! had no `version` key. The timestamps move to the source state file and the
//! manifest is rewritten without them.

use super::state::{load_source_state, save_source_state};
use super::{save_manifest, ManifestError, RepoManifest, Source, MANIFEST_VERSION};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct StoredManifest {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    sources: Vec<StoredSource>,
}

#[derive(Debug, Deserialize)]
struct StoredSource {
    #[serde(flatten)]
    source: Source,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    added: Option<String>,
    #[serde(default)]
    last_synced: Option<String>,
}

impl StoredSource {
    fn is_legacy(&self) -> bool {
        self.mode.is_some() || self.added.is_some() || self.last_synced.is_some()
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Parse manifest content, migrating it on disk when it is in a legacy
/// shape.
pub(super) async fn migrate_if_needed(
    repo_path: &Path,
    content: &str,
) -> Result<RepoManifest, ManifestError> {
    if content.trim().is_empty() {
        return Ok(RepoManifest::default());
    }

    let stored: StoredManifest = serde_yaml::from_str(content)?;

    if let Some(version) = stored.version {
        if version > MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(version));
        }
    }

    let needs_migration =
        stored.version.is_none() || stored.sources.iter().any(StoredSource::is_legacy);

    let manifest = RepoManifest {
        version: stored.version.unwrap_or(MANIFEST_VERSION),
        sources: stored.sources.iter().map(|s| s.source.clone()).collect(),
    };

    if !needs_migration {
        return Ok(manifest);
    }

    let mut state = load_source_state(repo_path).await?;
    for stored_source in &stored.sources {
        let name = stored_source.source.name.as_str();
        if name.is_empty() {
            continue;
        }
        if let Some(added) = parse_timestamp(stored_source.added.as_deref()) {
            state.set_added(name, added);
        }
        if let Some(synced) = parse_timestamp(stored_source.last_synced.as_deref()) {
            state.set_last_synced(name, synced);
        }
    }
    save_source_state(repo_path, &state).await?;
    save_manifest(repo_path, &manifest).await?;

    info!(
        path = %repo_path.display(),
        sources = manifest.sources.len(),
        "migrated legacy manifest"
    );
    Ok(manifest)
}
