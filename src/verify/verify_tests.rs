use super::*;
use crate::import::{add_bulk, BulkImportOptions};
use crate::metadata::ResourceMetadata;
use crate::repository::{FsRepository, MemoryRepository};
use crate::resource::{Package, Resource};
use std::path::Path;
use tempfile::tempdir;

fn resource(resource_type: ResourceType, name: &str) -> Resource {
    Resource {
        name: name.to_string(),
        resource_type,
        description: "test".to_string(),
        version: None,
        author: None,
        license: None,
        path: PathBuf::from(format!("/src/{name}")),
        metadata: std::collections::BTreeMap::new(),
    }
}

fn meta(resource_type: ResourceType, name: &str) -> ResourceMetadata {
    ResourceMetadata::new(name, resource_type, "github", "https://github.com/o/r", Utc::now())
}

async fn seed(repo: &MemoryRepository, resource_type: ResourceType, name: &str) {
    repo.put_resource(&resource(resource_type, name), crate::repository::ImportMode::Copy)
        .await
        .expect("Should store resource");
    repo.put_metadata(&meta(resource_type, name))
        .await
        .expect("Should store metadata");
}

#[tokio::test]
async fn test_clean_repository_has_no_findings() {
    let repo = MemoryRepository::new("/repo");
    seed(&repo, ResourceType::Command, "build").await;
    seed(&repo, ResourceType::Skill, "pdf").await;

    let result = verify_repository(&repo, &VerifyFilter::default())
        .await
        .expect("Should verify");
    assert_eq!(result, VerifyResult::default());
}

#[tokio::test]
async fn test_orphaned_metadata_is_an_error_and_repair_removes_only_it() {
    let repo = MemoryRepository::new("/repo");
    seed(&repo, ResourceType::Command, "build").await;
    seed(&repo, ResourceType::Command, "gone").await;
    repo.delete_resource(ResourceType::Command, "gone")
        .await
        .expect("Should delete resource");

    let result = verify_repository(&repo, &VerifyFilter::default())
        .await
        .expect("Should verify");
    assert_eq!(result.orphaned_metadata.len(), 1);
    assert_eq!(result.orphaned_metadata[0].name, "gone");
    assert!(result.has_errors);

    let repaired = repair_repository(&repo, false)
        .await
        .expect("Should repair");
    assert_eq!(repaired.orphaned_removed.len(), 1);
    assert_eq!(repaired.fixed_count, 1);
    assert_eq!(repo.sidecar_count(), 1);
    assert!(repo
        .get_metadata(ResourceType::Command, "build")
        .await
        .expect("Should read metadata")
        .is_some());
}

#[tokio::test]
async fn test_missing_metadata_is_a_warning_and_repair_synthesizes() {
    let repo = MemoryRepository::new("/repo");
    repo.put_resource(&resource(ResourceType::Agent, "helper"), crate::repository::ImportMode::Copy)
        .await
        .expect("Should store resource");

    let result = verify_repository(&repo, &VerifyFilter::default())
        .await
        .expect("Should verify");
    assert_eq!(result.resources_without_metadata.len(), 1);
    assert!(result.has_warnings);
    assert!(!result.has_errors);

    let repaired = repair_repository(&repo, false)
        .await
        .expect("Should repair");
    assert_eq!(repaired.metadata_created.len(), 1);

    let created = repo
        .get_metadata(ResourceType::Agent, "helper")
        .await
        .expect("Should read metadata")
        .expect("Should have metadata");
    assert_eq!(created.name, "helper");
    assert_eq!(created.resource_type, ResourceType::Agent);
    assert_eq!(created.source_type, "local");
    assert_eq!(created.source_url, "file:///repo/agents/helper.md");
}

#[tokio::test]
async fn test_dry_run_repair_changes_nothing() {
    let repo = MemoryRepository::new("/repo");
    repo.put_resource(&resource(ResourceType::Skill, "pdf"), crate::repository::ImportMode::Copy)
        .await
        .expect("Should store resource");
    repo.insert_sidecar(ResourceType::Skill, meta(ResourceType::Skill, "old"));

    let repaired = repair_repository(&repo, true)
        .await
        .expect("Should preview repair");
    assert!(repaired.dry_run);
    assert_eq!(repaired.metadata_created.len(), 1);
    assert_eq!(repaired.orphaned_removed.len(), 1);
    assert_eq!(repo.sidecar_count(), 1);
    assert!(repo
        .get_metadata(ResourceType::Skill, "pdf")
        .await
        .expect("Should read metadata")
        .is_none());
}

#[tokio::test]
async fn test_type_mismatch_is_unfixable() {
    let repo = MemoryRepository::new("/repo");
    repo.put_resource(&resource(ResourceType::Command, "dual"), crate::repository::ImportMode::Copy)
        .await
        .expect("Should store resource");
    repo.insert_sidecar(ResourceType::Command, meta(ResourceType::Skill, "dual"));

    let result = verify_repository(&repo, &VerifyFilter::default())
        .await
        .expect("Should verify");
    assert_eq!(result.type_mismatches.len(), 1);
    assert_eq!(result.type_mismatches[0].metadata_type, ResourceType::Skill);
    assert!(result.has_errors);

    let repaired = repair_repository(&repo, false)
        .await
        .expect("Should repair");
    assert_eq!(repaired.unfixable_count, 1);
    assert_eq!(repaired.fixed_count, 0);
    assert_eq!(
        repo.get_metadata(ResourceType::Command, "dual")
            .await
            .expect("Should read metadata")
            .map(|m| m.resource_type),
        Some(ResourceType::Skill)
    );
}

#[tokio::test]
async fn test_unreadable_sidecar_is_orphaned() {
    let repo = MemoryRepository::new("/repo");
    repo.insert_unreadable_sidecar(ResourceType::Agent, "junk");

    let result = verify_repository(&repo, &VerifyFilter::default())
        .await
        .expect("Should verify");
    assert_eq!(result.orphaned_metadata.len(), 1);
    assert_eq!(result.orphaned_metadata[0].name, "junk");
}

#[tokio::test]
async fn test_package_findings_split_by_severity() {
    let repo = MemoryRepository::new("/repo");
    seed(&repo, ResourceType::Command, "build").await;
    for (name, refs) in [
        ("partial", vec!["command/build", "skill/missing"]),
        ("dangling", vec!["agent/nobody"]),
        ("whole", vec!["command/build"]),
    ] {
        repo.put_package(&Package {
            name: name.to_string(),
            description: "pkg".to_string(),
            resources: refs.into_iter().map(String::from).collect(),
        })
        .await
        .expect("Should store package");
    }

    let result = verify_repository(&repo, &VerifyFilter::default())
        .await
        .expect("Should verify");
    assert_eq!(result.partial_packages.len(), 1);
    assert_eq!(result.partial_packages[0].name, "partial");
    assert_eq!(result.partial_packages[0].missing_resources, vec!["skill/missing"]);
    assert_eq!(result.packages_with_missing_refs.len(), 1);
    assert_eq!(result.packages_with_missing_refs[0].name, "dangling");
    assert!(result.has_errors);
    assert!(result.has_warnings);
}

#[tokio::test]
async fn test_filter_limits_scan() {
    let repo = MemoryRepository::new("/repo");
    for name in ["test-one", "test-two", "other"] {
        repo.put_resource(&resource(ResourceType::Command, name), crate::repository::ImportMode::Copy)
            .await
            .expect("Should store resource");
    }
    repo.put_resource(&resource(ResourceType::Skill, "test-skill"), crate::repository::ImportMode::Copy)
        .await
        .expect("Should store resource");

    let filter = VerifyFilter::parse("command/test*").expect("Should parse filter");
    let result = verify_repository(&repo, &filter)
        .await
        .expect("Should verify");
    let names: Vec<&str> = result
        .resources_without_metadata
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(names, vec!["test-one", "test-two"]);

    let filter = VerifyFilter::parse("skill/*").expect("Should parse filter");
    let result = verify_repository(&repo, &filter)
        .await
        .expect("Should verify");
    assert_eq!(result.resources_without_metadata.len(), 1);
}

#[test]
fn test_filter_parse() {
    let filter = VerifyFilter::parse("agent/re?iew").expect("Should parse");
    assert_eq!(filter.resource_type, Some(ResourceType::Agent));
    assert!(filter.matches(ResourceType::Agent, "review"));
    assert!(!filter.matches(ResourceType::Command, "review"));

    let bare = VerifyFilter::parse("api/*").expect("Should parse");
    assert_eq!(bare.resource_type, None);
    assert!(bare.matches(ResourceType::Command, "api/deploy"));

    assert!(VerifyFilter::parse("command/[").is_err());
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Should create parent dir");
    }
    std::fs::write(path, content).expect("Should write file");
}

#[tokio::test]
async fn test_missing_source_path_on_disk() {
    let temp = tempdir().expect("Should create temp dir");
    let source = temp.path().join("src").join("commands").join("lint.md");
    write(&source, "---\ndescription: Lint\n---\n");

    let repo = FsRepository::new(temp.path().join("repo"));
    add_bulk(&repo, &[source.clone()], &BulkImportOptions::default())
        .await
        .expect("Should import");
    std::fs::remove_file(&source).expect("Should remove source");

    let result = verify_repository(&repo, &VerifyFilter::default())
        .await
        .expect("Should verify");
    assert_eq!(result.missing_source_paths.len(), 1);
    assert_eq!(result.missing_source_paths[0].source_path.as_deref(), Some(source.as_path()));
    assert!(result.has_warnings);
    assert!(!result.has_errors);
}
