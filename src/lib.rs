// Allow panic/unwrap/expect in tests (denied globally via Cargo.toml lints)
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing
    )
)]

pub mod errors;
pub mod import;
pub mod logging;
pub mod manifest;
pub mod metadata;
pub mod project;
pub mod repository;
pub mod resource;
pub mod source_id;
pub mod user_config;
pub mod utils;
pub mod verify;

// Re-export commonly used types
pub use errors::{ErrorCategory, TypedError};
pub use import::{add_bulk, BulkImportOptions, BulkImportResult, ImportAborted, ImportFailure};
pub use manifest::{load_manifest, save_manifest, ManifestError, RepoManifest, Source};
pub use metadata::{MetadataError, ResourceMetadata};
pub use project::{
    apply_repair_fixes, check_manifest_sync, deduplicate_issues, detect_tools,
    find_invalid_manifest_refs, find_unmanaged_files, remove_unmanaged, resolve_invalid_refs,
    scan_project_issues, Installer, ProjectError, ProjectManifest, RepairResult, ResetMode, Tool,
    VerifyIssue,
};
pub use repository::{FsRepository, ImportMode, MemoryRepository, Repository, RepositoryError};
pub use resource::{Package, Resource, ResourceError, ResourceRef, ResourceType};
pub use source_id::generate_source_id;
pub use verify::{repair_repository, verify_repository, RepoRepairResult, VerifyFilter, VerifyResult};
