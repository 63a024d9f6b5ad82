use super::*;
use crate::manifest::Source;

fn url_id(url: &str) -> String {
    generate_source_id(&Source::from_url(url))
}

#[test]
fn test_id_format() {
    let id = url_id("https://github.com/owner/repo");
    assert!(id.starts_with("src-"), "ID should carry the prefix");
    assert_eq!(id.len(), 16, "ID should be prefix plus 12 hex chars");
    assert!(id
        .trim_start_matches("src-")
        .chars()
        .all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_url_variants_collide() {
    let base = url_id("https://github.com/owner/repo");
    assert_eq!(base, url_id("https://github.com/owner/repo.git"));
    assert_eq!(base, url_id("https://github.com/owner/repo/"));
    assert_eq!(base, url_id("https://GitHub.com/Owner/Repo"));
}

#[test]
fn test_different_locations_differ() {
    let base = url_id("https://github.com/owner/repo");
    assert_ne!(base, url_id("https://github.com/owner/other"));
    assert_ne!(base, url_id("https://gitlab.com/owner/repo"));
    assert_ne!(base, url_id("https://github.com/someone/repo"));
}

#[test]
fn test_name_does_not_affect_id() {
    let mut a = Source::from_url("https://github.com/owner/repo");
    a.name = "first".to_string();
    let mut b = a.clone();
    b.name = "renamed".to_string();
    assert_eq!(generate_source_id(&a), generate_source_id(&b));
}

#[test]
fn test_path_sources_resolve_to_absolute() {
    let cwd = std::env::current_dir().expect("Should have a cwd");
    let relative = generate_source_id(&Source::from_path("some/dir"));
    let absolute = generate_source_id(&Source::from_path(
        cwd.join("some/dir").to_string_lossy().as_ref(),
    ));
    assert_eq!(relative, absolute);
}

#[test]
fn test_changing_path_changes_id() {
    let a = generate_source_id(&Source::from_path("/home/user/resources"));
    let b = generate_source_id(&Source::from_path("/home/user/other-resources"));
    assert_ne!(a, b);
}

#[test]
fn test_empty_source_yields_empty_id() {
    assert_eq!(generate_source_id(&Source::default()), "");
    let empty_strings = Source {
        path: Some(String::new()),
        url: Some(String::new()),
        ..Source::default()
    };
    assert_eq!(generate_source_id(&empty_strings), "");
}

#[test]
fn test_url_takes_precedence_over_path() {
    let both = Source {
        path: Some("/tmp/x".to_string()),
        url: Some("https://github.com/owner/repo".to_string()),
        ..Source::default()
    };
    assert_eq!(generate_source_id(&both), url_id("https://github.com/owner/repo"));
}

#[test]
fn test_normalize_url_strips_one_slash() {
    assert_eq!(normalize_url("https://h/o/r/"), "https://h/o/r");
    assert_eq!(normalize_url("https://h/o/r.git"), "https://h/o/r");
    assert_eq!(normalize_url("https://h/o/r.git/"), "https://h/o/r");
}
