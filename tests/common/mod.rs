//! Common test utilities

use aimgr::import::{add_bulk, discover_candidates, BulkImportOptions, BulkImportResult};
use aimgr::repository::FsRepository;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write `content` to `path`, creating parent directories
pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

/// Lay out a source tree with two commands (one nested), a skill, an agent
/// and a package over `command/build` and `skill/pdf`. Returns the
/// discovered candidates.
pub fn create_source_tree(root: &Path) -> Vec<PathBuf> {
    write_file(
        &root.join("commands/build.md"),
        "---\ndescription: Build the project\n---\nRun the build.\n",
    );
    write_file(
        &root.join("commands/api/deploy.md"),
        "---\ndescription: Deploy the API\n---\n",
    );
    write_file(
        &root.join("skills/pdf/SKILL.md"),
        "---\nname: pdf\ndescription: Work with PDF files\n---\n",
    );
    write_file(&root.join("skills/pdf/scripts/extract.py"), "print('x')\n");
    write_file(
        &root.join("agents/reviewer.md"),
        "---\ndescription: Reviews code\n---\n",
    );
    write_file(
        &root.join("packages/kit.package.json"),
        r#"{"name":"kit","description":"Starter kit","resources":["command/build","skill/pdf"]}"#,
    );
    discover_candidates(root)
}

/// Import the standard source tree into a repository rooted at `repo_root`
#[allow(dead_code)] // Test utility for integration tests
pub async fn seeded_repo(source_root: &Path, repo_root: &Path) -> (FsRepository, BulkImportResult) {
    let candidates = create_source_tree(source_root);
    let repo = FsRepository::new(repo_root);
    let result = add_bulk(&repo, &candidates, &BulkImportOptions::default())
        .await
        .expect("Failed to import source tree");
    (repo, result)
}
