use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_empty_toml_produces_defaults() {
    let cfg: UserConfig = toml::from_str("").expect("Should parse empty TOML");
    assert_eq!(cfg, UserConfig::default());
    assert_eq!(cfg.install.targets, vec!["claude"]);
    assert!(cfg.repo.path.is_none());
}

#[test]
fn test_full_config() {
    let toml_str = r#"
[repo]
path = "~/ai-repo"

[install]
targets = ["claude", "opencode"]

[log]
level = "debug"
json = true
rotation = "hourly"
"#;
    let cfg: UserConfig = toml::from_str(toml_str).expect("Should parse config");
    assert_eq!(cfg.repo.path.as_deref(), Some("~/ai-repo"));
    assert_eq!(cfg.install.targets, vec!["claude", "opencode"]);
    assert_eq!(cfg.log.level.as_deref(), Some("debug"));
    assert!(cfg.log.json);
    assert_eq!(cfg.log.rotation.as_deref(), Some("hourly"));
}

#[test]
fn test_unknown_repo_key_is_rejected() {
    let result: Result<UserConfig, _> = toml::from_str("[repo]\nlocation = \"/x\"\n");
    assert!(result.is_err());
}

#[test]
fn test_roundtrip_serialization() {
    let cfg = UserConfig {
        repo: RepoConfig {
            path: Some("/srv/repo".to_string()),
        },
        ..UserConfig::default()
    };
    let serialized = toml::to_string(&cfg).expect("Should serialize");
    let deserialized: UserConfig = toml::from_str(&serialized).expect("Should deserialize");
    assert_eq!(cfg, deserialized);
}

#[test]
fn test_load_from_absent_file_is_default() {
    let dir = tempdir().expect("tempdir");
    let cfg = load_user_config_from(&dir.path().join("config.toml")).expect("Should default");
    assert_eq!(cfg, UserConfig::default());
}

#[test]
fn test_load_from_file_and_bad_toml() {
    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("config.toml");

    fs::write(&config_path, "[repo]\npath = \"/data/repo\"\n").expect("write config");
    let cfg = load_user_config_from(&config_path).expect("Should load");
    assert_eq!(cfg.repo.path.as_deref(), Some("/data/repo"));

    fs::write(&config_path, "[repo\n").expect("write config");
    let err = load_user_config_from(&config_path).expect_err("Should fail to parse");
    assert!(matches!(err, UserConfigError::Toml(_)));
}

#[test]
fn test_resolve_repo_path_precedence() {
    let cfg = UserConfig {
        repo: RepoConfig {
            path: Some("/from/config".to_string()),
        },
        ..UserConfig::default()
    };
    assert_eq!(
        resolve_repo_path(Some("/from/env"), &cfg),
        PathBuf::from("/from/env")
    );
    assert_eq!(resolve_repo_path(Some("  "), &cfg), PathBuf::from("/from/config"));
    assert_eq!(resolve_repo_path(None, &cfg), PathBuf::from("/from/config"));
    assert_eq!(
        resolve_repo_path(None, &UserConfig::default()),
        default_repo_path()
    );
    assert!(default_repo_path().ends_with("aimgr/repo"));
}
