#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use aimgr::import::{add_bulk, BulkImportOptions};
use aimgr::metadata::{get_metadata_path, get_package_metadata_path};
use aimgr::repository::{FsRepository, ImportMode};
use aimgr::resource::ResourceType;
use common::{create_source_tree, create_test_dir, seeded_repo};

#[tokio::test]
async fn test_import_lays_out_repository() {
    let source = create_test_dir();
    let repo_dir = create_test_dir();
    let root = repo_dir.path().join("repo");

    let (_repo, result) = seeded_repo(source.path(), &root).await;

    assert_eq!(result.added.len(), 5);
    assert!(result.failed.is_empty(), "Unexpected failures: {:?}", result.failed);
    assert!(
        result.package_warnings.is_empty(),
        "Package should resolve once its members are imported"
    );
    assert_eq!(result.command_count, 2);
    assert_eq!(result.skill_count, 1);
    assert_eq!(result.agent_count, 1);
    assert_eq!(result.package_count, 1);

    assert!(root.join("commands/build.md").is_file());
    assert!(root.join("commands/api/deploy.md").is_file());
    assert!(root.join("skills/pdf/SKILL.md").is_file());
    assert!(root.join("skills/pdf/scripts/extract.py").is_file());
    assert!(root.join("agents/reviewer.md").is_file());
    assert!(root.join("packages/kit.package.json").is_file());

    assert!(get_metadata_path("api/deploy", ResourceType::Command, &root).is_file());
    assert!(get_metadata_path("pdf", ResourceType::Skill, &root).is_file());
    assert!(get_package_metadata_path("kit", &root).is_file());
}

#[tokio::test]
async fn test_forced_reimport_updates_everything() {
    let source = create_test_dir();
    let repo_dir = create_test_dir();
    let candidates = create_source_tree(source.path());
    let repo = FsRepository::new(repo_dir.path());
    let opts = BulkImportOptions {
        force: true,
        ..BulkImportOptions::default()
    };

    let first = add_bulk(&repo, &candidates, &opts)
        .await
        .expect("Should import");
    assert_eq!(first.added.len(), candidates.len());

    let second = add_bulk(&repo, &candidates, &opts)
        .await
        .expect("Should reimport");
    assert!(second.added.is_empty());
    assert_eq!(second.updated, candidates);
    assert!(second.failed.is_empty());
}

#[tokio::test]
async fn test_skip_existing_leaves_repository_alone() {
    let source = create_test_dir();
    let repo_dir = create_test_dir();
    let (repo, _) = seeded_repo(source.path(), repo_dir.path()).await;
    let candidates = create_source_tree(source.path());

    let result = add_bulk(
        &repo,
        &candidates,
        &BulkImportOptions {
            skip_existing: true,
            ..BulkImportOptions::default()
        },
    )
    .await
    .expect("Should import");
    assert_eq!(result.skipped, candidates);
    assert!(result.added.is_empty());
}

#[tokio::test]
async fn test_dry_run_does_not_touch_disk() {
    let source = create_test_dir();
    let repo_dir = create_test_dir();
    let root = repo_dir.path().join("repo");
    let candidates = create_source_tree(source.path());
    let repo = FsRepository::new(&root);

    let result = add_bulk(
        &repo,
        &candidates,
        &BulkImportOptions {
            dry_run: true,
            ..BulkImportOptions::default()
        },
    )
    .await
    .expect("Should plan import");

    assert_eq!(result.added.len(), candidates.len());
    assert!(!root.exists(), "Dry run should not create the repository");
}

#[tokio::test]
async fn test_symlink_mode_links_sources() {
    let source = create_test_dir();
    let repo_dir = create_test_dir();
    let candidates = create_source_tree(source.path());
    let repo = FsRepository::new(repo_dir.path());

    add_bulk(
        &repo,
        &candidates,
        &BulkImportOptions {
            import_mode: ImportMode::Symlink,
            ..BulkImportOptions::default()
        },
    )
    .await
    .expect("Should import");

    let skill = repo_dir.path().join("skills/pdf");
    let meta = std::fs::symlink_metadata(&skill).expect("Skill should exist");
    assert!(meta.file_type().is_symlink());
    assert_eq!(
        std::fs::read_link(&skill).expect("Should read link"),
        source.path().join("skills/pdf")
    );
}

#[tokio::test]
async fn test_invalid_resource_does_not_stop_batch() {
    let source = create_test_dir();
    let repo_dir = create_test_dir();
    common::write_file(
        &source.path().join("commands/Bad_Name.md"),
        "---\ndescription: nope\n---\n",
    );
    let candidates = create_source_tree(source.path());
    let repo = FsRepository::new(repo_dir.path());

    let result = add_bulk(&repo, &candidates, &BulkImportOptions::default())
        .await
        .expect("Validation failures should not abort");
    assert_eq!(result.failed.len(), 1);
    assert!(result.failed[0].path.ends_with("commands/Bad_Name.md"));
    assert_eq!(result.added.len(), 5);
}
