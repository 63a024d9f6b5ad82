use serde::{Deserialize, Serialize};

/// A declared upstream location resources are imported from.
///
/// Exactly one of `path` or `url` is set. `id` is derived from that location
/// and stays stable when the source is renamed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
}

impl Source {
    #[must_use]
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// The local path, ignoring an empty value.
    #[must_use]
    pub fn local_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    /// The remote URL, ignoring an empty value.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    /// Import mode implied by the location: local paths are symlinked,
    /// remote sources are copied.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        if self.local_path().is_some() {
            "symlink"
        } else if self.remote_url().is_some() {
            "copy"
        } else {
            ""
        }
    }
}

/// Contents of `ai.repo.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoManifest {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl Default for RepoManifest {
    fn default() -> Self {
        Self {
            version: super::MANIFEST_VERSION,
            sources: Vec::new(),
        }
    }
}
