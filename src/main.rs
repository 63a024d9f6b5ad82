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

use aimgr::import::{
    add_bulk, discover_candidates, remove_resources, resources_from_source, sync_source,
    BulkImportOptions, BulkImportResult, SyncOptions,
};
use aimgr::logging::{default_log_dir, init_logging, parse_level, parse_rotation, LogConfig};
use aimgr::manifest::{load_manifest, load_source_state, save_manifest, save_source_state, Source};
use aimgr::project::{
    apply_repair_fixes, check_manifest_sync, deduplicate_issues, detect_tools,
    find_invalid_manifest_refs, find_unmanaged_files, project_manifest_path, remove_unmanaged,
    resolve_invalid_refs, scan_project_issues, Installer, ProjectManifest, RepairResult,
    ResetMode, StdinReader, Tool, VerifyIssue, PROJECT_MANIFEST_FILE,
};
use aimgr::repository::{FsRepository, ImportMode, Repository};
use aimgr::resource::ResourceRef;
use aimgr::user_config::{load_user_config, resolve_repo_path, UserConfig, REPO_PATH_ENV};
use aimgr::utils::{absolute_path, format_display_path};
use aimgr::verify::{repair_repository, verify_repository, RepoRepairResult, VerifyFilter, VerifyResult};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, Result, WrapErr};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// aimgr - manage a local repository of AI tool resources
#[derive(Parser, Debug)]
#[command(name = "aimgr", author, version, about, long_about = None)]
struct Args {
    /// Repository root (default: config `repo.path`, then ~/.local/share/aimgr/repo)
    #[arg(long, global = true, env = REPO_PATH_ENV)]
    repo: Option<String>,

    /// Enable JSON log format
    #[arg(long, global = true, env = "AIMGR_LOG_JSON", default_value = "false")]
    log_json: bool,

    /// Log rotation period: daily, hourly, or never
    #[arg(long, global = true, env = "AIMGR_LOG_ROTATION")]
    log_rotation: Option<String>,

    /// Custom log directory (default: ~/.aimgr/logs)
    #[arg(long, global = true, env = "AIMGR_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level for the log file
    #[arg(long, global = true, env = "AIMGR_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the resource repository
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },
    /// Manage declared sources
    Source {
        #[command(subcommand)]
        command: SourceCommand,
    },
    /// Verify installed resources in a project
    Verify {
        #[arg(long)]
        project_path: Option<PathBuf>,
        /// Repair issues after reporting them
        #[arg(long)]
        fix: bool,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// Repair installed resources in a project
    Repair {
        #[arg(long)]
        project_path: Option<PathBuf>,
        /// Also remove files in tool directories that aimgr did not install
        #[arg(long)]
        reset: bool,
        /// Also check ai.package.yaml references against the repository
        #[arg(long)]
        prune_package: bool,
        /// Apply reset and prune without asking
        #[arg(long)]
        force: bool,
        /// Show what reset and prune would do
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// Install resources into a project and record them in ai.package.yaml
    Install {
        /// References such as skill/pdf or package/kit
        #[arg(required = true)]
        refs: Vec<String>,
        #[arg(long)]
        project_path: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum RepoCommand {
    /// Create the repository layout
    Init,
    /// Import resources from files or directories
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, conflicts_with = "skip_existing")]
        force: bool,
        #[arg(long)]
        skip_existing: bool,
        #[arg(long)]
        dry_run: bool,
        /// Link resources instead of copying them
        #[arg(long)]
        symlink: bool,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// Check repository consistency; exits 1 when errors are found
    Verify {
        /// Limit the check, e.g. `skill/*` or `command/test*`
        pattern: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// Fix missing and orphaned metadata
    Repair {
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
}

#[derive(Subcommand, Debug)]
enum SourceCommand {
    /// Declare a local path or Git URL as a source
    Add {
        location: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "ref")]
        git_ref: Option<String>,
        #[arg(long)]
        subpath: Option<String>,
    },
    /// Remove a source by ID, name, path or URL, and the resources it added
    Remove {
        identifier: String,
        /// Leave the source's resources in the repository
        #[arg(long)]
        keep_resources: bool,
        /// Show what would be removed
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-import resources from local sources
    Sync {
        /// Only sync this source (ID, name, path or URL)
        identifier: Option<String>,
        #[arg(long)]
        skip_existing: bool,
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// List declared sources
    List {
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
}

/// Write `value` as JSON or YAML, or hand off to `table` for plain lines.
fn emit<T: Serialize>(
    out: &mut dyn Write,
    format: Format,
    value: &T,
    table: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
) -> Result<()> {
    match format {
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
        Format::Yaml => write!(out, "{}", serde_yaml::to_string(value)?)?,
        Format::Table => table(out)?,
    }
    Ok(())
}

fn project_dir(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(absolute_path(p)),
        None => std::env::current_dir().wrap_err("failed to get current directory"),
    }
}

fn is_remote(location: &str) -> bool {
    location.contains("://") || location.starts_with("git@") || location.starts_with("gh:")
}

fn write_import_table(out: &mut dyn Write, result: &BulkImportResult) -> std::io::Result<()> {
    writeln!(
        out,
        "Added: {}  Updated: {}  Skipped: {}  Failed: {}",
        result.added.len(),
        result.updated.len(),
        result.skipped.len(),
        result.failed.len()
    )?;
    writeln!(
        out,
        "Commands: {}  Skills: {}  Agents: {}  Packages: {}",
        result.command_count, result.skill_count, result.agent_count, result.package_count
    )?;
    for failure in &result.failed {
        writeln!(out, "  FAILED {}: {}", failure.path.display(), failure.message)?;
    }
    for warning in &result.package_warnings {
        writeln!(
            out,
            "  WARNING package '{}' has missing references: {}",
            warning.package,
            warning.missing_refs.join(", ")
        )?;
    }
    Ok(())
}

fn write_verify_table(out: &mut dyn Write, result: &VerifyResult) -> std::io::Result<()> {
    if !result.has_errors && !result.has_warnings {
        return writeln!(out, "Repository is consistent");
    }
    for issue in &result.resources_without_metadata {
        writeln!(out, "WARNING {} '{}' has no metadata", issue.resource_type, issue.name)?;
    }
    for issue in &result.missing_source_paths {
        let source = issue
            .source_path
            .as_ref()
            .map_or_else(String::new, |p| p.display().to_string());
        writeln!(
            out,
            "WARNING {} '{}' source path no longer exists: {source}",
            issue.resource_type, issue.name
        )?;
    }
    for issue in &result.orphaned_metadata {
        writeln!(
            out,
            "ERROR   {} '{}' has metadata but no resource ({})",
            issue.resource_type,
            issue.name,
            issue.path.display()
        )?;
    }
    for mismatch in &result.type_mismatches {
        writeln!(
            out,
            "ERROR   '{}' is a {} but its metadata says {}",
            mismatch.name, mismatch.resource_type, mismatch.metadata_type
        )?;
    }
    for package in &result.packages_with_missing_refs {
        writeln!(
            out,
            "ERROR   package '{}' references nothing that exists: {}",
            package.name,
            package.missing_resources.join(", ")
        )?;
    }
    for package in &result.partial_packages {
        writeln!(
            out,
            "WARNING package '{}' is missing {} of {} resources: {}",
            package.name,
            package.missing_resources.len(),
            package.total_resources,
            package.missing_resources.join(", ")
        )?;
    }
    writeln!(out, "\nRun 'aimgr repo repair' to fix what can be fixed automatically")
}

fn write_repo_repair_table(out: &mut dyn Write, result: &RepoRepairResult) -> std::io::Result<()> {
    let verb = if result.dry_run { "Would create" } else { "Created" };
    for issue in &result.metadata_created {
        writeln!(out, "{verb} metadata for {} '{}'", issue.resource_type, issue.name)?;
    }
    let verb = if result.dry_run { "Would remove" } else { "Removed" };
    for issue in &result.orphaned_removed {
        writeln!(out, "{verb} orphaned metadata {}", issue.path.display())?;
    }
    for failure in &result.failed {
        writeln!(
            out,
            "FAILED {} '{}': {}",
            failure.resource_type, failure.name, failure.message
        )?;
    }
    for mismatch in &result.type_mismatches {
        writeln!(
            out,
            "UNFIXABLE type mismatch for '{}' ({} vs {})",
            mismatch.name, mismatch.resource_type, mismatch.metadata_type
        )?;
    }
    for package in result
        .packages_with_missing_refs
        .iter()
        .chain(&result.partial_packages)
    {
        writeln!(
            out,
            "UNFIXABLE package '{}' missing: {}",
            package.name,
            package.missing_resources.join(", ")
        )?;
    }
    writeln!(
        out,
        "Fixed: {}  Failed: {}  Unfixable: {}",
        result.fixed_count, result.failed_count, result.unfixable_count
    )
}

fn write_issues_table(out: &mut dyn Write, issues: &[VerifyIssue]) -> std::io::Result<()> {
    if issues.is_empty() {
        return writeln!(out, "All installed resources are valid");
    }
    writeln!(out, "Found {} issue(s):\n", issues.len())?;
    for issue in issues {
        writeln!(
            out,
            "  [{}] {} ({}): {}",
            issue.issue_type, issue.resource, issue.tool, issue.description
        )?;
    }
    Ok(())
}

fn write_repair_table(out: &mut dyn Write, result: &RepairResult) -> std::io::Result<()> {
    for action in &result.fixed {
        writeln!(out, "  fixed: {}", action.description)?;
    }
    for action in &result.failed {
        writeln!(out, "  failed: {}", action.description)?;
    }
    if !result.hints.is_empty() {
        writeln!(
            out,
            "\n{} orphaned resource(s) found (not auto-removed):",
            result.hints.len()
        )?;
        for action in &result.hints {
            writeln!(out, "  {}", action.description)?;
        }
    }
    writeln!(
        out,
        "\nFixed: {}  Failed: {}  Hints: {}",
        result.summary.fixed, result.summary.failed, result.summary.hints
    )
}

async fn run_repo(repo: &FsRepository, command: &RepoCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        RepoCommand::Init => {
            repo.init().await?;
            writeln!(
                out,
                "Initialized repository at {}",
                format_display_path(&repo.root().display().to_string())
            )?;
        }
        RepoCommand::Add {
            paths,
            force,
            skip_existing,
            dry_run,
            symlink,
            format,
        } => {
            let candidates: Vec<PathBuf> = paths
                .iter()
                .flat_map(|p| discover_candidates(&absolute_path(p)))
                .collect();
            if candidates.is_empty() {
                bail!("no resources found in the given paths");
            }
            let opts = BulkImportOptions {
                force: *force,
                skip_existing: *skip_existing,
                dry_run: *dry_run,
                import_mode: if *symlink {
                    ImportMode::Symlink
                } else {
                    ImportMode::Copy
                },
                ..BulkImportOptions::default()
            };
            match add_bulk(repo, &candidates, &opts).await {
                Ok(result) => emit(out, *format, &result, |o| write_import_table(o, &result))?,
                Err(aborted) => {
                    emit(out, *format, &aborted.partial, |o| {
                        write_import_table(o, &aborted.partial)
                    })?;
                    return Err(aborted.into());
                }
            }
        }
        RepoCommand::Verify { pattern, format } => {
            let filter = match pattern.as_deref() {
                Some(p) => VerifyFilter::parse(p)?,
                None => VerifyFilter::default(),
            };
            let result = verify_repository(repo, &filter).await?;
            emit(out, *format, &result, |o| write_verify_table(o, &result))?;
            if result.has_errors {
                out.flush()?;
                std::process::exit(1);
            }
        }
        RepoCommand::Repair { dry_run, format } => {
            let result = repair_repository(repo, *dry_run).await?;
            emit(out, *format, &result, |o| write_repo_repair_table(o, &result))?;
        }
    }
    Ok(())
}

/// Outcome of syncing one source
#[derive(Debug, Serialize)]
struct SourceSyncReport {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<BulkImportResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn write_sync_table(out: &mut dyn Write, reports: &[SourceSyncReport]) -> std::io::Result<()> {
    for report in reports {
        match (&report.result, &report.error) {
            (Some(result), _) => writeln!(
                out,
                "{:<24} added {}, updated {}, skipped {}, failed {}",
                report.source,
                result.added.len(),
                result.updated.len(),
                result.skipped.len(),
                result.failed.len()
            )?,
            (None, Some(error)) => writeln!(out, "{:<24} failed: {error}", report.source)?,
            (None, None) => {}
        }
    }
    Ok(())
}

async fn run_source(repo: &FsRepository, command: SourceCommand, out: &mut dyn Write) -> Result<()> {
    let root = repo.root();
    let mut manifest = load_manifest(root).await?;
    let mut state = load_source_state(root).await?;
    match command {
        SourceCommand::Add {
            location,
            name,
            git_ref,
            subpath,
        } => {
            let mut source = if is_remote(&location) {
                Source::from_url(location)
            } else {
                Source::from_path(absolute_path(Path::new(&location)).display().to_string())
            };
            source.name = name.unwrap_or_default();
            source.git_ref = git_ref;
            source.subpath = subpath;

            let added = manifest.add_source(source)?;
            save_manifest(root, &manifest).await?;
            state.set_added(&added.name, Utc::now());
            state.set_source_id(&added.name, &added.id);
            save_source_state(root, &state).await?;
            writeln!(out, "Added source '{}' (ID: {})", added.name, added.id)?;
        }
        SourceCommand::Remove {
            identifier,
            keep_resources,
            dry_run,
        } => {
            let Some(source) = manifest.get_source(&identifier).cloned() else {
                bail!("source not found: {identifier}");
            };
            let owned = if keep_resources {
                Vec::new()
            } else {
                resources_from_source(repo, &source).await?
            };

            if dry_run {
                writeln!(out, "Would remove source '{}'", source.name)?;
                if keep_resources {
                    writeln!(out, "Resources would be kept")?;
                }
                for reference in &owned {
                    writeln!(out, "  would remove {reference}")?;
                }
                return Ok(());
            }

            let removed = manifest.remove_source(&identifier)?;
            save_manifest(root, &manifest).await?;
            state.delete(&removed.name);
            save_source_state(root, &state).await?;
            writeln!(out, "Removed source '{}'", removed.name)?;

            if !keep_resources {
                let deleted = remove_resources(repo, &owned).await?;
                for reference in &deleted {
                    writeln!(out, "  removed {reference}")?;
                }
                writeln!(out, "Removed {} resource(s)", deleted.len())?;
            }
        }
        SourceCommand::Sync {
            identifier,
            skip_existing,
            dry_run,
            format,
        } => {
            let targets: Vec<Source> = match identifier.as_deref() {
                Some(id) => match manifest.get_source(id) {
                    Some(source) => vec![source.clone()],
                    None => bail!("source not found: {id}"),
                },
                None => manifest.sources.clone(),
            };
            if targets.is_empty() {
                bail!("no sources configured; add one with 'aimgr source add'");
            }

            let opts = SyncOptions {
                skip_existing,
                dry_run,
            };
            let mut reports = Vec::new();
            for source in &targets {
                match sync_source(repo, source, opts).await {
                    Ok(result) => {
                        if !dry_run {
                            state.set_last_synced(&source.name, Utc::now());
                            state.set_source_id(&source.name, &source.id);
                        }
                        reports.push(SourceSyncReport {
                            source: source.name.clone(),
                            result: Some(result),
                            error: None,
                        });
                    }
                    Err(e) => {
                        warn!(source = %source.name, error = %e, "source sync failed");
                        reports.push(SourceSyncReport {
                            source: source.name.clone(),
                            result: None,
                            error: Some(e.to_string()),
                        });
                    }
                }
            }

            let synced = reports.iter().filter(|r| r.result.is_some()).count();
            if !dry_run && synced > 0 {
                save_source_state(root, &state).await?;
            }
            emit(out, format, &reports, |o| write_sync_table(o, &reports))?;
            if synced == 0 {
                bail!("all sources failed to sync");
            }
        }
        SourceCommand::List { format } => {
            emit(out, format, &manifest.sources, |o| {
                if manifest.sources.is_empty() {
                    return writeln!(o, "No sources configured");
                }
                for source in &manifest.sources {
                    let location = source
                        .local_path()
                        .or_else(|| source.remote_url())
                        .unwrap_or_default();
                    writeln!(
                        o,
                        "{:<24} {:<14} {:<8} {location}",
                        source.name,
                        source.id,
                        source.mode()
                    )?;
                }
                Ok(())
            })?;
        }
    }
    Ok(())
}

/// Link scan plus manifest comparison, merged. A failed manifest check is
/// logged and the link findings still returned.
async fn diagnose(project: &Path, tools: &[Tool], repo: &FsRepository) -> Result<Vec<VerifyIssue>> {
    let issues = scan_project_issues(project, tools, repo.root()).await?;
    match check_manifest_sync(project, tools, repo).await {
        Ok(manifest_issues) => Ok(deduplicate_issues(issues, manifest_issues)),
        Err(e) => {
            warn!(error = %e, "failed to check manifest sync");
            Ok(issues)
        }
    }
}

async fn run_project_verify(
    repo: &FsRepository,
    project: &Path,
    fix: bool,
    format: Format,
    out: &mut dyn Write,
) -> Result<()> {
    let tools = detect_tools(project).await?;
    if tools.is_empty() {
        writeln!(out, "No tool directories found in this project.")?;
        return Ok(());
    }
    let issues = diagnose(project, &tools, repo).await?;
    emit(out, format, &issues, |o| write_issues_table(o, &issues))?;

    if issues.is_empty() {
        return Ok(());
    }
    if fix {
        let result = apply_repair_fixes(project, &issues, repo).await?;
        emit(out, format, &result, |o| write_repair_table(o, &result))?;
    } else if matches!(format, Format::Table) {
        writeln!(out, "\nRun 'aimgr verify --fix' to automatically fix these issues")?;
    }
    Ok(())
}

async fn run_project_repair(
    repo: &FsRepository,
    project: &Path,
    reset: bool,
    prune: bool,
    mode: ResetMode,
    format: Format,
    out: &mut dyn Write,
) -> Result<()> {
    let tools = detect_tools(project).await?;
    if tools.is_empty() && !prune {
        writeln!(out, "No tool directories found in this project.")?;
        return Ok(());
    }

    let mut result = RepairResult::default();
    if !tools.is_empty() {
        let issues = diagnose(project, &tools, repo).await?;
        if !issues.is_empty() {
            result = apply_repair_fixes(project, &issues, repo).await?;
        }
    }

    let mut reader = StdinReader;
    if reset {
        let unmanaged = find_unmanaged_files(project, &tools, repo.root()).await?;
        if unmanaged.is_empty() {
            writeln!(out, "No unmanaged files found.")?;
        } else {
            let outcome = remove_unmanaged(&unmanaged, mode, &mut reader, out).await?;
            result.record_unmanaged_removed(&outcome.removed);
        }
    }

    if prune {
        let path = project_manifest_path(project);
        if ProjectManifest::exists(&path).await {
            let mut manifest = ProjectManifest::load(&path).await?;
            if manifest.resources.is_empty() {
                writeln!(out, "{PROJECT_MANIFEST_FILE} has no resource entries; nothing to prune")?;
            } else {
                let (invalid, partial) = find_invalid_manifest_refs(&manifest, repo).await;
                for package in &partial {
                    writeln!(
                        out,
                        "package/{} exists but has missing members: {}",
                        package.package_name,
                        package.missing_members.join(", ")
                    )?;
                    writeln!(
                        out,
                        "  This is a repo issue. Run 'aimgr repo repair' to fix package definitions."
                    )?;
                }
                if invalid.is_empty() {
                    writeln!(out, "All manifest references are valid")?;
                } else {
                    resolve_invalid_refs(&invalid, &mut manifest, &path, repo, mode, &mut reader, out)
                        .await?;
                }
            }
        } else {
            writeln!(out, "No {PROJECT_MANIFEST_FILE} found; nothing to prune")?;
        }
    }

    if result.is_empty() {
        if !reset && !prune {
            emit(out, format, &result, |o| writeln!(o, "No issues found"))?;
        }
        return Ok(());
    }
    emit(out, format, &result, |o| write_repair_table(o, &result))
}

async fn run_install(
    repo: &FsRepository,
    project: &Path,
    refs: &[String],
    config: &UserConfig,
    out: &mut dyn Write,
) -> Result<()> {
    let defaults: Vec<Tool> = config
        .install
        .targets
        .iter()
        .filter_map(|t| t.parse().ok())
        .collect();
    let installer = Installer::detect(project, &defaults).await?;
    let manifest_path = project_manifest_path(installer.project());
    let mut manifest = ProjectManifest::load_or_default(&manifest_path).await?;

    for reference in refs {
        let parsed = ResourceRef::parse(reference)?;
        let links = installer.install_ref(repo, &parsed).await?;
        manifest.add(&parsed.to_string())?;
        writeln!(out, "Installed {parsed} ({} link(s) created)", links.len())?;
    }
    manifest.save(&manifest_path).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let user_cfg = load_user_config().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load user config, using defaults: {e}");
        UserConfig::default()
    });

    let log_config = LogConfig {
        log_dir: args.log_dir.clone().unwrap_or_else(default_log_dir),
        log_level: parse_level(
            args.log_level
                .as_deref()
                .or(user_cfg.log.level.as_deref())
                .unwrap_or("info"),
        ),
        json_format: args.log_json || user_cfg.log.json,
        rotation: parse_rotation(
            args.log_rotation
                .as_deref()
                .or(user_cfg.log.rotation.as_deref())
                .unwrap_or("daily"),
        ),
        ..LogConfig::default()
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let repo = FsRepository::new(resolve_repo_path(args.repo.as_deref(), &user_cfg));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Repo { command } => run_repo(&repo, &command, &mut out).await,
        Command::Source { command } => run_source(&repo, command, &mut out).await,
        Command::Verify {
            project_path,
            fix,
            format,
        } => {
            let project = project_dir(project_path.as_deref())?;
            run_project_verify(&repo, &project, fix, format, &mut out).await
        }
        Command::Repair {
            project_path,
            reset,
            prune_package,
            force,
            dry_run,
            format,
        } => {
            let project = project_dir(project_path.as_deref())?;
            let mode = if dry_run {
                ResetMode::DryRun
            } else if force {
                ResetMode::Force
            } else {
                ResetMode::Interactive
            };
            run_project_repair(&repo, &project, reset, prune_package, mode, format, &mut out).await
        }
        Command::Install { refs, project_path } => {
            let project = project_dir(project_path.as_deref())?;
            run_install(&repo, &project, &refs, &user_cfg, &mut out).await
        }
    }
}
