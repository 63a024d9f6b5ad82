use super::{LineReader, ProjectError, ProjectManifest, ResetMode, PROJECT_MANIFEST_FILE};
use crate::repository::{missing_refs, Repository};
use crate::resource::{ResourceRef, ResourceType};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

/// A package the manifest references that exists but is missing members.
/// The repository needs repairing, not the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialPackageWarning {
    pub package_name: String,
    pub missing_members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneOutcome {
    /// Removed from the manifest, or that would be in dry-run mode
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
    /// Found valid again after a repo sync or repair
    pub revalidated: Vec<String>,
}

/// Whether `reference` currently resolves in the repository.
pub async fn ref_is_valid(reference: &str, repo: &dyn Repository) -> bool {
    match ResourceRef::parse(reference) {
        Ok(r) if r.resource_type == ResourceType::Package => repo.package_exists(&r.name).await,
        Ok(r) => repo.resource_exists(r.resource_type, &r.name).await,
        Err(_) => false,
    }
}

/// Manifest references that do not resolve, and referenced packages that
/// resolve but have missing members.
pub async fn find_invalid_manifest_refs(
    manifest: &ProjectManifest,
    repo: &dyn Repository,
) -> (Vec<String>, Vec<PartialPackageWarning>) {
    let mut invalid = Vec::new();
    let mut partial = Vec::new();

    for reference in &manifest.resources {
        let Ok(parsed) = ResourceRef::parse(reference) else {
            invalid.push(reference.clone());
            continue;
        };

        if parsed.resource_type != ResourceType::Package {
            if !repo.resource_exists(parsed.resource_type, &parsed.name).await {
                invalid.push(reference.clone());
            }
            continue;
        }

        match repo.get_package(&parsed.name).await {
            Ok(Some(package)) => {
                let missing = missing_refs(repo, &package).await;
                if !missing.is_empty() {
                    partial.push(PartialPackageWarning {
                        package_name: parsed.name,
                        missing_members: missing,
                    });
                }
            }
            Ok(None) | Err(_) => invalid.push(reference.clone()),
        }
    }

    (invalid, partial)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Sync,
    Repair,
    Remove,
    Skip,
}

impl Choice {
    fn label(self) -> &'static str {
        match self {
            Choice::Sync => "Run repo sync first (repo sources may be outdated)",
            Choice::Repair => "Run repo repair first (repo metadata may be broken)",
            Choice::Remove => "Remove from ai.package.yaml",
            Choice::Skip => "Skip (do nothing)",
        }
    }
}

/// Escalation paths already tried during this run
#[derive(Debug, Default)]
struct Escalation {
    sync_tried: bool,
    repair_tried: bool,
}

impl Escalation {
    fn options(&self) -> Vec<Choice> {
        let mut options = Vec::with_capacity(4);
        if !self.sync_tried {
            options.push(Choice::Sync);
        }
        if !self.repair_tried {
            options.push(Choice::Repair);
        }
        options.push(Choice::Remove);
        options.push(Choice::Skip);
        options
    }
}

/// Ask until a valid choice arrives. End of input means skip.
fn ask(
    reference: &str,
    options: &[Choice],
    reader: &mut dyn LineReader,
    out: &mut dyn Write,
) -> Result<Choice, ProjectError> {
    loop {
        writeln!(out, "\n{reference} not found in repo\n")?;
        writeln!(out, "? How to resolve:")?;
        for (number, option) in (1..).zip(options) {
            writeln!(out, "  [{number}] {}", option.label())?;
        }
        write!(out, "Choice [1-{}]: ", options.len())?;
        out.flush()?;

        let Some(line) = reader.read_line()? else {
            return Ok(Choice::Skip);
        };
        let picked = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i));
        match picked {
            Some(choice) => return Ok(*choice),
            None => writeln!(out, "Invalid choice, please try again.")?,
        }
    }
}

/// Wait for Enter after asking the user to run `command`, then re-check.
async fn recheck_after(
    command: &str,
    reference: &str,
    repo: &dyn Repository,
    reader: &mut dyn LineReader,
    out: &mut dyn Write,
) -> Result<bool, ProjectError> {
    writeln!(
        out,
        "\nPlease run 'aimgr {command}' in another terminal, then press Enter to re-check..."
    )?;
    out.flush()?;
    reader.read_line()?;
    if ref_is_valid(reference, repo).await {
        writeln!(out, "  {reference} is now valid after {command}")?;
        Ok(true)
    } else {
        writeln!(out, "  {reference} still not found after {command}")?;
        Ok(false)
    }
}

/// Resolve invalid manifest references.
///
/// Dry-run lists what would be removed. Force removes everything.
/// Interactive mode offers, per reference, to try a repo sync, try a repo
/// repair, remove the reference, or skip it. Sync and repair are offered
/// until tried once in this run. The manifest at `path` is written only if
/// something was removed.
#[instrument(skip_all, fields(path = %path.display(), refs = refs.len(), mode = ?mode))]
pub async fn resolve_invalid_refs(
    refs: &[String],
    manifest: &mut ProjectManifest,
    path: &Path,
    repo: &dyn Repository,
    mode: ResetMode,
    reader: &mut dyn LineReader,
    out: &mut dyn Write,
) -> Result<PruneOutcome, ProjectError> {
    let mut outcome = PruneOutcome::default();

    match mode {
        ResetMode::DryRun => {
            writeln!(out, "\nWould remove from {PROJECT_MANIFEST_FILE}:")?;
            for reference in refs {
                writeln!(out, "  Would remove: {reference}")?;
                outcome.removed.push(reference.clone());
            }
            return Ok(outcome);
        }
        ResetMode::Force => {
            for reference in refs {
                manifest.remove(reference);
                writeln!(out, "  Removed {reference} from {PROJECT_MANIFEST_FILE}")?;
                outcome.removed.push(reference.clone());
            }
        }
        ResetMode::Interactive => {
            let mut escalation = Escalation::default();
            for reference in refs {
                loop {
                    match ask(reference, &escalation.options(), reader, out)? {
                        Choice::Sync => {
                            escalation.sync_tried = true;
                            if recheck_after("repo sync", reference, repo, reader, out).await? {
                                outcome.revalidated.push(reference.clone());
                                break;
                            }
                        }
                        Choice::Repair => {
                            escalation.repair_tried = true;
                            if recheck_after("repo repair", reference, repo, reader, out).await? {
                                outcome.revalidated.push(reference.clone());
                                break;
                            }
                        }
                        Choice::Remove => {
                            manifest.remove(reference);
                            writeln!(out, "  Removed {reference} from {PROJECT_MANIFEST_FILE}")?;
                            outcome.removed.push(reference.clone());
                            break;
                        }
                        Choice::Skip => {
                            writeln!(out, "  Skipped {reference}")?;
                            outcome.skipped.push(reference.clone());
                            break;
                        }
                    }
                }
            }
        }
    }

    if !outcome.removed.is_empty() {
        manifest.save(path).await?;
        info!(removed = outcome.removed.len(), "manifest pruned");
        writeln!(out, "\nSaved {PROJECT_MANIFEST_FILE}")?;
    }
    Ok(outcome)
}
