#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use aimgr::import::{
    add_bulk, remove_resources, resources_from_source, sync_source, BulkImportOptions,
    SourceSyncError, SyncOptions,
};
use aimgr::manifest::{
    load_manifest, load_source_state, save_manifest, save_source_state, Source,
};
use aimgr::metadata;
use aimgr::repository::{FsRepository, Repository};
use aimgr::resource::{ResourceRef, ResourceType};
use chrono::Utc;
use common::{create_source_tree, create_test_dir, write_file};
use std::path::Path;

/// Declare `location` as a source named `name` and persist the manifest.
async fn declare_source(repo_root: &Path, location: &Path, name: &str) -> Source {
    let mut manifest = load_manifest(repo_root).await.expect("Should load manifest");
    let mut source = Source::from_path(location.display().to_string());
    source.name = name.to_string();
    let added = manifest.add_source(source).expect("Should add source");
    save_manifest(repo_root, &manifest)
        .await
        .expect("Should save manifest");
    added
}

fn refs(found: &[ResourceRef]) -> Vec<String> {
    let mut names: Vec<String> = found.iter().map(ToString::to_string).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_sync_records_source_and_survives_rename() {
    let source_dir = create_test_dir();
    let repo_dir = create_test_dir();
    create_source_tree(source_dir.path());
    let repo = FsRepository::new(repo_dir.path());
    let source = declare_source(repo.root(), source_dir.path(), "team").await;
    assert!(!source.id.is_empty());

    let result = sync_source(&repo, &source, SyncOptions::default())
        .await
        .expect("Should sync source");
    assert!(result.failed.is_empty(), "Unexpected failures: {:?}", result.failed);
    assert_eq!(result.added.len(), 5);

    let mut state = load_source_state(repo.root())
        .await
        .expect("Should load source state");
    state.set_last_synced(&source.name, Utc::now());
    state.set_source_id(&source.name, &source.id);
    save_source_state(repo.root(), &state)
        .await
        .expect("Should save source state");

    assert!(
        metadata::has_source("build", ResourceType::Command, &source.id, repo.root()).await
    );
    let meta = metadata::load("pdf", ResourceType::Skill, repo.root())
        .await
        .expect("Should load skill metadata");
    assert_eq!(meta.source_name, "team");
    assert_eq!(meta.source_id, source.id);

    // Rename the source in the manifest and carry its runtime state along.
    let mut manifest = load_manifest(repo.root()).await.expect("Should load manifest");
    let renamed = manifest
        .rename_source("team", "platform")
        .expect("Should rename source");
    save_manifest(repo.root(), &manifest)
        .await
        .expect("Should save manifest");
    let mut state = load_source_state(repo.root())
        .await
        .expect("Should load source state");
    assert!(state.rename("team", "platform"));
    save_source_state(repo.root(), &state)
        .await
        .expect("Should save source state");

    assert_eq!(renamed.id, source.id);
    for (name, resource_type) in [
        ("build", ResourceType::Command),
        ("api/deploy", ResourceType::Command),
        ("pdf", ResourceType::Skill),
        ("reviewer", ResourceType::Agent),
    ] {
        assert!(
            metadata::has_source(name, resource_type, &renamed.id, repo.root()).await,
            "{resource_type}/{name} should still belong to the renamed source"
        );
    }
    assert_eq!(
        refs(&resources_from_source(&repo, &renamed)
            .await
            .expect("Should collect resources")),
        vec![
            "agent/reviewer",
            "command/api/deploy",
            "command/build",
            "skill/pdf"
        ]
    );

    let state = load_source_state(repo.root())
        .await
        .expect("Should load source state");
    let recorded = state.get("platform").expect("State should follow the rename");
    assert!(recorded.last_synced.is_some());
    assert_eq!(recorded.source_id, source.id);

    // The next sync records the new name without touching the ID.
    let result = sync_source(&repo, &renamed, SyncOptions::default())
        .await
        .expect("Should sync renamed source");
    assert_eq!(result.updated.len(), 5);
    let meta = metadata::load("reviewer", ResourceType::Agent, repo.root())
        .await
        .expect("Should load agent metadata");
    assert_eq!(meta.source_name, "platform");
    assert_eq!(meta.source_id, source.id);
}

#[tokio::test]
async fn test_sync_dry_run_and_skip_existing() {
    let source_dir = create_test_dir();
    let repo_dir = create_test_dir();
    create_source_tree(source_dir.path());
    let repo = FsRepository::new(repo_dir.path().join("repo"));
    let source = declare_source(repo_dir.path(), source_dir.path(), "team").await;

    let preview = sync_source(
        &repo,
        &source,
        SyncOptions {
            skip_existing: false,
            dry_run: true,
        },
    )
    .await
    .expect("Should preview sync");
    assert_eq!(preview.added.len(), 5);
    assert!(!repo.root().exists(), "A dry run should write nothing");

    sync_source(&repo, &source, SyncOptions::default())
        .await
        .expect("Should sync source");
    let again = sync_source(
        &repo,
        &source,
        SyncOptions {
            skip_existing: true,
            dry_run: false,
        },
    )
    .await
    .expect("Should sync again");
    assert_eq!(again.skipped.len(), 5);
    assert!(again.updated.is_empty());
}

#[tokio::test]
async fn test_sync_rejects_remote_and_missing_sources() {
    let repo_dir = create_test_dir();
    let repo = FsRepository::new(repo_dir.path());

    let mut remote = Source::from_url("https://github.com/owner/repo");
    remote.name = "remote".to_string();
    let err = sync_source(&repo, &remote, SyncOptions::default())
        .await
        .expect_err("Remote sources should not sync");
    assert!(matches!(err, SourceSyncError::Remote(ref name) if name == "remote"));

    let mut gone = Source::from_path(repo_dir.path().join("missing").display().to_string());
    gone.name = "gone".to_string();
    let err = sync_source(&repo, &gone, SyncOptions::default())
        .await
        .expect_err("Missing paths should not sync");
    assert!(matches!(err, SourceSyncError::PathNotFound { .. }));
}

#[tokio::test]
async fn test_removing_source_resources_keeps_others() {
    let source_dir = create_test_dir();
    let other_dir = create_test_dir();
    let repo_dir = create_test_dir();
    create_source_tree(source_dir.path());
    let repo = FsRepository::new(repo_dir.path());
    let source = declare_source(repo.root(), source_dir.path(), "team").await;
    sync_source(&repo, &source, SyncOptions::default())
        .await
        .expect("Should sync source");

    let helper = other_dir.path().join("agents/helper.md");
    write_file(&helper, "---\ndescription: Helps\n---\n");
    add_bulk(&repo, &[helper], &BulkImportOptions::default())
        .await
        .expect("Should import unrelated agent");

    let owned = resources_from_source(&repo, &source)
        .await
        .expect("Should collect resources");
    assert_eq!(owned.len(), 4);
    assert!(!owned.iter().any(|r| r.name == "helper"));

    let removed = remove_resources(&repo, &owned)
        .await
        .expect("Should remove resources");
    assert_eq!(refs(&removed), refs(&owned));

    for reference in &owned {
        assert!(
            !repo
                .resource_exists(reference.resource_type, &reference.name)
                .await,
            "{reference} should be gone"
        );
        assert!(!metadata::exists(
            &reference.name,
            reference.resource_type,
            repo.root()
        ));
    }
    assert!(repo.resource_exists(ResourceType::Agent, "helper").await);
    assert!(metadata::exists("helper", ResourceType::Agent, repo.root()));
    // Linked resources are unlinked; the source tree itself is untouched.
    assert!(source_dir.path().join("skills/pdf/SKILL.md").is_file());
    assert!(source_dir.path().join("commands/build.md").is_file());
}

#[tokio::test]
async fn test_sidecar_written_before_ids_matches_by_name() {
    let source_dir = create_test_dir();
    let repo_dir = create_test_dir();
    create_source_tree(source_dir.path());
    let repo = FsRepository::new(repo_dir.path());
    let source = declare_source(repo.root(), source_dir.path(), "team").await;
    sync_source(&repo, &source, SyncOptions::default())
        .await
        .expect("Should sync source");

    let mut meta = metadata::load("build", ResourceType::Command, repo.root())
        .await
        .expect("Should load metadata");
    meta.source_id = String::new();
    metadata::save(&meta, repo.root(), "")
        .await
        .expect("Should save metadata");

    let owned = resources_from_source(&repo, &source)
        .await
        .expect("Should collect resources");
    assert!(owned.contains(&ResourceRef::new(ResourceType::Command, "build")));
}
