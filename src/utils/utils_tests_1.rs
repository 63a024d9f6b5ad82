use super::*;
use std::path::Path;

#[test]
fn test_compute_hash_is_sha256_hex() {
    let hash = compute_hash("hello");
    assert_eq!(
        hash,
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(hash.len(), 64);
}

#[test]
fn test_format_display_path_non_home() {
    let path = "/tmp/some/path";
    assert_eq!(format_display_path(path), path);
}

#[test]
fn test_format_display_path_home() {
    if let Some(home) = dirs::home_dir() {
        let home_str = home.to_string_lossy();
        let test_path = format!("{home_str}/projects/myapp");
        assert_eq!(format_display_path(&test_path), "~/projects/myapp");
    }
}

#[test]
fn test_expand_home_leaves_absolute_paths() {
    assert_eq!(expand_home("/var/repo"), Path::new("/var/repo"));
}

#[test]
fn test_expand_home_expands_tilde() {
    if let Some(home) = dirs::home_dir() {
        assert_eq!(expand_home("~/repo"), home.join("repo"));
    }
}

#[test]
fn test_clean_path_folds_dots() {
    assert_eq!(clean_path(Path::new("/a/./b/../c")), Path::new("/a/c"));
    assert_eq!(clean_path(Path::new("a/b/")), Path::new("a/b"));
    assert_eq!(clean_path(Path::new("./")), Path::new("."));
    assert_eq!(clean_path(Path::new("../x")), Path::new("../x"));
}

#[test]
fn test_clean_path_keeps_leading_parent_dirs() {
    assert_eq!(clean_path(Path::new("../..")), Path::new("../.."));
    assert_eq!(clean_path(Path::new("../../a/b/..")), Path::new("../../a"));
    assert_eq!(clean_path(Path::new("a/../../b")), Path::new("../b"));
    assert_eq!(clean_path(Path::new("/../a")), Path::new("/a"));
}

#[test]
fn test_absolute_path_joins_cwd() {
    let cwd = std::env::current_dir().expect("Should have a cwd");
    assert_eq!(absolute_path(Path::new("sub/dir")), cwd.join("sub/dir"));
    assert_eq!(absolute_path(Path::new("/x/y/../z")), Path::new("/x/z"));
}
