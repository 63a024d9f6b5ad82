use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{default_repo_path, user_config_path, UserConfig, UserConfigError};
use crate::utils::expand_home;

/// Load the user configuration from `~/.aimgr/config.toml`.
///
/// Returns `Ok(UserConfig::default())` if the file does not exist.
///
/// # Errors
///
/// Returns [`UserConfigError`] if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig, UserConfigError> {
    let Some(path) = user_config_path() else {
        warn!("Could not determine user config directory; using defaults");
        return Ok(UserConfig::default());
    };
    load_user_config_from(&path)
}

/// Load the user configuration from an explicit file.
pub fn load_user_config_from(path: &Path) -> Result<UserConfig, UserConfigError> {
    if !path.exists() {
        debug!("User config not found at {}; using defaults", path.display());
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: UserConfig = toml::from_str(&content)?;
    debug!("Loaded user config from {}", path.display());
    Ok(config)
}

/// Pick the repository root: the override if set and non-empty, else
/// `repo.path` from the config, else the default location. `~/` is
/// expanded in both explicit forms.
#[must_use]
pub fn resolve_repo_path(override_value: Option<&str>, config: &UserConfig) -> PathBuf {
    if let Some(value) = override_value.map(str::trim).filter(|v| !v.is_empty()) {
        return expand_home(value);
    }
    if let Some(path) = config.repo.path.as_deref().filter(|p| !p.trim().is_empty()) {
        return expand_home(path.trim());
    }
    default_repo_path()
}
