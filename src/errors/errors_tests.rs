use super::*;

#[test]
fn test_display_with_context() {
    let err = validation(anyhow::anyhow!("name too long"), "failed to load resource");
    assert_eq!(err.to_string(), "failed to load resource: name too long");
}

#[test]
fn test_display_without_context() {
    let err = validation(anyhow::anyhow!("resource 'x' already exists in repository"), "");
    assert_eq!(err.to_string(), "resource 'x' already exists in repository");
}

#[test]
fn test_untyped_errors_default_to_validation() {
    let err = anyhow::anyhow!("plain failure");
    assert_eq!(category_of(&err), ErrorCategory::Validation);
    assert!(!is_fatal(&err));
}

#[test]
fn test_category_survives_anyhow_wrapping() {
    let typed = fatal(std::io::Error::other("disk gone"), "init");
    let wrapped = anyhow::Error::new(typed).context("outer");
    assert_eq!(category_of(&wrapped), ErrorCategory::Fatal);
    assert!(is_fatal(&wrapped));
}

#[test]
fn test_resource_category() {
    let err = resource(std::io::Error::other("permission denied"), "remove");
    assert_eq!(err.category, ErrorCategory::Resource);
    assert!(!err.is_fatal());
    assert_eq!(err.category.to_string(), "resource");
}

#[test]
fn test_source_is_exposed() {
    use std::error::Error as _;
    let err = resource(std::io::Error::other("boom"), "ctx");
    let source = err.source().expect("Should expose the wrapped error");
    assert_eq!(source.to_string(), "boom");
}
