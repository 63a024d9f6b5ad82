use super::{parse_frontmatter, Frontmatter, Resource, ResourceError, ResourceType, PACKAGE_SUFFIX};
use std::path::{Component, Path};
use tokio::fs;
use tracing::debug;

/// Marker file that makes a directory a skill
pub const SKILL_FILE: &str = "SKILL.md";

const AGENT_KEYS: [&str; 3] = ["type", "instructions", "capabilities"];
const COMMAND_KEYS: [&str; 3] = ["agent", "model", "allowed-tools"];

fn has_component(path: &Path, dir: &str) -> bool {
    path.parent()
        .is_some_and(|p| p.components().any(|c| c == Component::Normal(dir.as_ref())))
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Classify a candidate path by its shape.
///
/// Markdown files are agents or commands depending on an enclosing
/// `agents/` or `commands/` directory, then on telltale frontmatter keys.
/// Ambiguous markdown is a command.
pub async fn detect_type(path: &Path) -> Result<ResourceType, ResourceError> {
    let meta = fs::metadata(path).await?;

    if meta.is_dir() {
        if fs::metadata(path.join(SKILL_FILE)).await.is_ok() {
            return Ok(ResourceType::Skill);
        }
        return Err(ResourceError::Unrecognized(format!(
            "directory does not contain {SKILL_FILE}: {}",
            path.display()
        )));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if file_name.ends_with(PACKAGE_SUFFIX) {
        return Ok(ResourceType::Package);
    }

    if !is_markdown(path) {
        return Err(ResourceError::Unrecognized(format!(
            "unrecognized resource file: {}",
            path.display()
        )));
    }

    if has_component(path, "agents") {
        return Ok(ResourceType::Agent);
    }
    if has_component(path, "commands") {
        return Ok(ResourceType::Command);
    }

    let Ok(content) = fs::read_to_string(path).await else {
        return Ok(ResourceType::Command);
    };
    let Ok((frontmatter, _)) = parse_frontmatter(&content) else {
        return Ok(ResourceType::Command);
    };

    if AGENT_KEYS.iter().any(|k| frontmatter.has_key(k)) {
        debug!(path = %path.display(), "detected agent from frontmatter keys");
        return Ok(ResourceType::Agent);
    }
    if COMMAND_KEYS.iter().any(|k| frontmatter.has_key(k)) {
        debug!(path = %path.display(), "detected command from frontmatter keys");
    }
    Ok(ResourceType::Command)
}

/// Command name: the path below the nearest enclosing `commands` directory
/// without `.md`, or the file stem when there is none.
fn command_name(path: &Path) -> String {
    let base = path
        .ancestors()
        .skip(1)
        .find(|a| a.file_name().is_some_and(|n| n == "commands"));

    let relative = base.and_then(|b| path.strip_prefix(b).ok());
    match relative {
        Some(rel) => {
            let segments: Vec<String> = rel
                .with_extension("")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            segments.join("/")
        }
        None => file_stem(path),
    }
}

async fn read_frontmatter(path: &Path) -> Result<Frontmatter, ResourceError> {
    let content = fs::read_to_string(path).await?;
    let (frontmatter, _) = parse_frontmatter(&content)?;
    Ok(frontmatter)
}

fn build(
    name: String,
    resource_type: ResourceType,
    path: &Path,
    frontmatter: &Frontmatter,
) -> Resource {
    Resource {
        name,
        resource_type,
        description: frontmatter.get_string("description").unwrap_or_default(),
        version: frontmatter.get_string("version"),
        author: frontmatter.get_string("author"),
        license: frontmatter.get_string("license"),
        path: path.to_path_buf(),
        metadata: frontmatter.get_map("metadata"),
    }
}

async fn load_markdown(
    path: &Path,
    resource_type: ResourceType,
    name: String,
) -> Result<Resource, ResourceError> {
    let wrap = |e: ResourceError| ResourceError::invalid(resource_type, &name, path, e);

    if !is_markdown(path) {
        return Err(wrap(ResourceError::Unrecognized(format!(
            "{resource_type} must be a .md file"
        ))));
    }
    let frontmatter = read_frontmatter(path).await.map_err(wrap)?;
    let resource = build(name.clone(), resource_type, path, &frontmatter);
    resource.validate().map_err(wrap)?;
    Ok(resource)
}

pub async fn load_command(path: &Path) -> Result<Resource, ResourceError> {
    load_markdown(path, ResourceType::Command, command_name(path)).await
}

pub async fn load_agent(path: &Path) -> Result<Resource, ResourceError> {
    load_markdown(path, ResourceType::Agent, file_stem(path)).await
}

/// Load a skill directory. A `name` in `SKILL.md` must equal the directory
/// name; without one the directory name is used.
pub async fn load_skill(dir: &Path) -> Result<Resource, ResourceError> {
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let wrap =
        |name: &str, e: ResourceError| ResourceError::invalid(ResourceType::Skill, name, dir, e);

    let meta = fs::metadata(dir).await.map_err(|e| wrap(&dir_name, e.into()))?;
    if !meta.is_dir() {
        return Err(wrap(
            &dir_name,
            ResourceError::Unrecognized("skill must be a directory".to_string()),
        ));
    }

    let skill_md = dir.join(SKILL_FILE);
    if fs::metadata(&skill_md).await.is_err() {
        return Err(wrap(
            &dir_name,
            ResourceError::Unrecognized(format!("directory must contain {SKILL_FILE}")),
        ));
    }

    let frontmatter = read_frontmatter(&skill_md)
        .await
        .map_err(|e| wrap(&dir_name, e))?;

    let name = frontmatter
        .get_string("name")
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| dir_name.clone());
    if name != dir_name {
        return Err(wrap(
            &name,
            ResourceError::SkillNameMismatch {
                name: name.clone(),
                dir: dir_name.clone(),
            },
        ));
    }

    let resource = build(name, ResourceType::Skill, dir, &frontmatter);
    resource.validate().map_err(|e| wrap(&resource.name, e))?;
    Ok(resource)
}

/// Load a command, skill or agent, detecting which from the path.
pub async fn load_resource(path: &Path) -> Result<Resource, ResourceError> {
    match detect_type(path).await? {
        ResourceType::Skill => load_skill(path).await,
        ResourceType::Agent => load_agent(path).await,
        ResourceType::Command => load_command(path).await,
        ResourceType::Package => Err(ResourceError::Unrecognized(format!(
            "packages are not loaded as resources: {}",
            path.display()
        ))),
    }
}
