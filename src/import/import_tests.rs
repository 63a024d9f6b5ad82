use super::*;
use crate::repository::{FsRepository, MemoryRepository};
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Should create parent dir");
    }
    std::fs::write(path, content).expect("Should write file");
}

fn command_files(dir: &Path) -> Vec<PathBuf> {
    let cmd1 = dir.join("commands").join("cmd1.md");
    let cmd2 = dir.join("commands").join("cmd2.md");
    write(&cmd1, "---\ndescription: First\n---\n");
    write(&cmd2, "---\ndescription: Second\n---\n");
    vec![cmd1, cmd2]
}

#[tokio::test]
async fn test_add_then_conflict_without_flags() {
    let temp = tempdir().expect("Should create temp dir");
    let candidates = command_files(temp.path());
    let repo = MemoryRepository::new("/repo");
    let opts = BulkImportOptions::default();

    let first = add_bulk(&repo, &candidates, &opts)
        .await
        .expect("Should import");
    assert_eq!(first.added.len(), 2);
    assert_eq!(first.failed.len(), 0);
    assert_eq!(first.command_count, 2);

    let second = add_bulk(&repo, &candidates, &opts)
        .await
        .expect("Conflicts should not abort the batch");
    assert_eq!(second.added.len(), 0);
    assert_eq!(second.failed.len(), 2);
    assert_eq!(
        second.failed[0].message,
        "resource 'cmd1' already exists in repository"
    );
}

#[tokio::test]
async fn test_force_reports_updates() {
    let temp = tempdir().expect("Should create temp dir");
    let candidates = command_files(temp.path());
    let repo = MemoryRepository::new("/repo");
    let opts = BulkImportOptions {
        force: true,
        ..BulkImportOptions::default()
    };

    add_bulk(&repo, &candidates, &opts)
        .await
        .expect("Should import");
    let second = add_bulk(&repo, &candidates, &opts)
        .await
        .expect("Should reimport");
    assert_eq!(second.added.len(), 0);
    assert_eq!(second.updated, candidates);
    assert_eq!(repo.resource_count(), 2);
}

#[tokio::test]
async fn test_skip_existing() {
    let temp = tempdir().expect("Should create temp dir");
    let candidates = command_files(temp.path());
    let repo = MemoryRepository::new("/repo");

    add_bulk(&repo, &candidates, &BulkImportOptions::default())
        .await
        .expect("Should import");
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
    assert_eq!(result.skipped.len(), 2);
    assert_eq!(result.command_count, 0);
}

#[tokio::test]
async fn test_invalid_candidate_does_not_stop_batch() {
    let temp = tempdir().expect("Should create temp dir");
    let mut candidates = command_files(temp.path());
    let broken = temp.path().join("commands").join("broken.md");
    write(&broken, "---\nmodel: x\n---\n");
    candidates.insert(0, broken.clone());

    let repo = MemoryRepository::new("/repo");
    let result = add_bulk(&repo, &candidates, &BulkImportOptions::default())
        .await
        .expect("Should import");
    assert_eq!(result.added.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].path, broken);
    assert!(result.failed[0]
        .message
        .starts_with("failed to load resource: command 'broken'"));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let temp = tempdir().expect("Should create temp dir");
    let candidates = command_files(temp.path());
    let repo_root = temp.path().join("repo");
    let repo = FsRepository::new(&repo_root);

    let result = add_bulk(
        &repo,
        &candidates,
        &BulkImportOptions {
            dry_run: true,
            ..BulkImportOptions::default()
        },
    )
    .await
    .expect("Should preview import");
    assert_eq!(result.added.len(), 2);
    assert_eq!(result.command_count, 2);
    assert!(!repo_root.exists());
}

#[tokio::test]
async fn test_metadata_records_source() {
    let temp = tempdir().expect("Should create temp dir");
    let candidates = command_files(temp.path());
    let repo = MemoryRepository::new("/repo");

    add_bulk(&repo, &candidates, &BulkImportOptions::default())
        .await
        .expect("Should import");
    let meta = repo
        .get_metadata(ResourceType::Command, "cmd1")
        .await
        .expect("Should read metadata")
        .expect("Should have metadata");
    assert_eq!(meta.source_type, "file");
    assert!(meta.source_url.starts_with("file://"));
    assert!(meta.source_url.ends_with("cmd1.md"));
    assert_eq!(meta.source_name, "cmd1.md");

    let opts = BulkImportOptions {
        force: true,
        source_url: Some("https://github.com/owner/tools".to_string()),
        source_type: Some("github".to_string()),
        source_id: Some("src-abcdefabcdef".to_string()),
        git_ref: Some("main".to_string()),
        ..BulkImportOptions::default()
    };
    add_bulk(&repo, &candidates, &opts)
        .await
        .expect("Should reimport");
    let meta = repo
        .get_metadata(ResourceType::Command, "cmd2")
        .await
        .expect("Should read metadata")
        .expect("Should have metadata");
    assert_eq!(meta.source_name, "owner-tools");
    assert_eq!(meta.source_id, "src-abcdefabcdef");
    assert_eq!(meta.git_ref.as_deref(), Some("main"));
}

#[tokio::test]
async fn test_package_with_missing_ref_is_stored() {
    let temp = tempdir().expect("Should create temp dir");
    let mut candidates = command_files(temp.path());
    let package = temp.path().join("web.package.json");
    write(
        &package,
        r#"{"name":"web","description":"Web","resources":["command/cmd1","skill/missing"]}"#,
    );
    candidates.push(package);

    let repo = MemoryRepository::new("/repo");
    let result = add_bulk(&repo, &candidates, &BulkImportOptions::default())
        .await
        .expect("Should import");
    assert_eq!(result.package_count, 1);
    assert_eq!(
        result.package_warnings,
        vec![PackageWarning {
            package: "web".to_string(),
            missing_refs: vec!["skill/missing".to_string()],
        }]
    );
    assert!(repo.package_exists("web").await);
}

#[tokio::test]
async fn test_unavailable_repository_aborts() {
    let temp = tempdir().expect("Should create temp dir");
    let candidates = command_files(temp.path());
    let repo = MemoryRepository::new("/repo");
    repo.set_available(false);

    let aborted = add_bulk(&repo, &candidates, &BulkImportOptions::default())
        .await
        .expect_err("Should abort");
    assert!(aborted.error.is_fatal());
    assert!(aborted.partial.added.is_empty());
}

#[test]
fn test_discover_candidates_walks_layout() {
    let temp = tempdir().expect("Should create temp dir");
    let root = temp.path();
    write(&root.join("commands/build.md"), "x");
    write(&root.join("commands/api/deploy.md"), "x");
    write(&root.join("agents/reviewer.md"), "x");
    write(&root.join("skills/pdf/SKILL.md"), "x");
    write(&root.join("skills/pdf/notes.md"), "x");
    write(&root.join("packages/kit.package.json"), "{}");
    write(&root.join("README.md"), "x");
    write(&root.join(".git/commands/hidden.md"), "x");

    let found = discover_candidates(root);
    assert_eq!(
        found,
        vec![
            root.join("agents/reviewer.md"),
            root.join("commands/api/deploy.md"),
            root.join("commands/build.md"),
            root.join("skills/pdf"),
            root.join("packages/kit.package.json"),
        ]
    );
}

#[test]
fn test_discover_candidates_single_targets() {
    let temp = tempdir().expect("Should create temp dir");
    let skill = temp.path().join("pdf");
    write(&skill.join("SKILL.md"), "x");
    assert_eq!(discover_candidates(&skill), vec![skill.clone()]);

    let file = temp.path().join("loose.md");
    write(&file, "x");
    assert_eq!(discover_candidates(&file), vec![file.clone()]);
}
