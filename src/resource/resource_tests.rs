use super::*;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Should create parent dir");
    }
    std::fs::write(path, content).expect("Should write file");
}

#[test]
fn test_validate_name() {
    assert!(validate_name("deploy").is_ok());
    assert!(validate_name("api/deploy-prod").is_ok());
    assert!(validate_name("a1").is_ok());

    assert!(validate_name("").is_err());
    assert!(validate_name("Deploy").is_err());
    assert!(validate_name("-deploy").is_err());
    assert!(validate_name("deploy-").is_err());
    assert!(validate_name("de--ploy").is_err());
    assert!(validate_name("api//deploy").is_err());
    assert!(validate_name(&"a".repeat(65)).is_err());
    assert!(validate_name(&"a".repeat(64)).is_ok());
}

#[test]
fn test_validate_description_skill_limit() {
    assert!(validate_description("", ResourceType::Command).is_err());
    let long = "x".repeat(1025);
    assert!(validate_description(&long, ResourceType::Command).is_ok());
    assert!(validate_description(&long, ResourceType::Skill).is_err());
}

#[test]
fn test_parse_frontmatter() {
    let content = "---\ndescription: Deploy things\nmetadata:\n  team: infra\n  count: 3\n---\nBody line\n";
    let (fm, body) = parse_frontmatter(content).expect("Should parse frontmatter");
    assert_eq!(fm.get_string("description").as_deref(), Some("Deploy things"));
    assert_eq!(fm.get_map("metadata").get("team").map(String::as_str), Some("infra"));
    assert!(!fm.get_map("metadata").contains_key("count"));
    assert_eq!(body, "Body line");
}

#[test]
fn test_parse_frontmatter_empty_block() {
    let (fm, _) = parse_frontmatter("---\n---\n").expect("Should parse empty frontmatter");
    assert!(!fm.has_key("description"));
}

#[test]
fn test_parse_frontmatter_errors() {
    assert!(matches!(parse_frontmatter(""), Err(FrontmatterError::Empty)));
    assert!(matches!(
        parse_frontmatter("# Title\n"),
        Err(FrontmatterError::MissingOpening)
    ));
    assert!(matches!(
        parse_frontmatter("---\ndescription: x\n"),
        Err(FrontmatterError::MissingClosing)
    ));
}

#[tokio::test]
async fn test_detect_type_by_directory_hints() {
    let temp = tempdir().expect("Should create temp dir");
    let agent = temp.path().join("agents").join("reviewer.md");
    let command = temp.path().join("commands").join("ns").join("build.md");
    write(&agent, "---\ndescription: Reviews\n---\n");
    write(&command, "---\ndescription: Builds\n---\n");

    assert_eq!(
        detect_type(&agent).await.expect("Should detect"),
        ResourceType::Agent
    );
    assert_eq!(
        detect_type(&command).await.expect("Should detect"),
        ResourceType::Command
    );
}

#[tokio::test]
async fn test_detect_type_by_frontmatter_keys() {
    let temp = tempdir().expect("Should create temp dir");
    let agent = temp.path().join("helper.md");
    let plain = temp.path().join("plain.md");
    write(&agent, "---\ndescription: Helps\ninstructions: be nice\n---\n");
    write(&plain, "no frontmatter at all\n");

    assert_eq!(
        detect_type(&agent).await.expect("Should detect"),
        ResourceType::Agent
    );
    assert_eq!(
        detect_type(&plain).await.expect("Should detect"),
        ResourceType::Command
    );
}

#[tokio::test]
async fn test_detect_type_skill_package_and_unknown() {
    let temp = tempdir().expect("Should create temp dir");
    let skill = temp.path().join("pdf");
    write(&skill.join(SKILL_FILE), "---\ndescription: PDFs\n---\n");
    let package = temp.path().join("web.package.json");
    write(&package, "{}");
    let other = temp.path().join("notes.txt");
    write(&other, "hi");
    let empty_dir = temp.path().join("empty");
    std::fs::create_dir_all(&empty_dir).expect("Should create dir");

    assert_eq!(
        detect_type(&skill).await.expect("Should detect"),
        ResourceType::Skill
    );
    assert_eq!(
        detect_type(&package).await.expect("Should detect"),
        ResourceType::Package
    );
    assert!(detect_type(&other).await.is_err());
    assert!(detect_type(&empty_dir).await.is_err());
}

#[tokio::test]
async fn test_load_command_nested_name() {
    let temp = tempdir().expect("Should create temp dir");
    let path = temp.path().join("commands").join("api").join("deploy.md");
    write(&path, "---\ndescription: Deploy the API\nversion: \"1.2\"\n---\nRun it\n");

    let resource = load_command(&path).await.expect("Should load command");
    assert_eq!(resource.name, "api/deploy");
    assert_eq!(resource.resource_type, ResourceType::Command);
    assert_eq!(resource.version.as_deref(), Some("1.2"));
}

#[tokio::test]
async fn test_load_command_without_commands_dir_uses_stem() {
    let temp = tempdir().expect("Should create temp dir");
    let path = temp.path().join("lint.md");
    write(&path, "---\ndescription: Lint\n---\n");

    let resource = load_command(&path).await.expect("Should load command");
    assert_eq!(resource.name, "lint");
}

#[tokio::test]
async fn test_load_command_requires_description() {
    let temp = tempdir().expect("Should create temp dir");
    let path = temp.path().join("lint.md");
    write(&path, "---\nmodel: fast\n---\n");

    let err = load_command(&path).await.expect_err("Should reject command");
    let message = err.to_string();
    assert!(message.starts_with("command 'lint' in "));
    assert!(message.contains("description cannot be empty"));
}

#[tokio::test]
async fn test_load_agent() {
    let temp = tempdir().expect("Should create temp dir");
    let path = temp.path().join("agents").join("reviewer.md");
    write(&path, "---\ndescription: Reviews code\nauthor: me\n---\n");

    let resource = load_agent(&path).await.expect("Should load agent");
    assert_eq!(resource.name, "reviewer");
    assert_eq!(resource.author.as_deref(), Some("me"));
}

#[tokio::test]
async fn test_load_skill_name_must_match_directory() {
    let temp = tempdir().expect("Should create temp dir");
    let dir = temp.path().join("pdf-tools");
    write(&dir.join(SKILL_FILE), "---\nname: other\ndescription: PDFs\n---\n");

    let err = load_skill(&dir).await.expect_err("Should reject skill");
    assert!(err
        .to_string()
        .contains("skill name 'other' must match directory name 'pdf-tools'"));

    write(&dir.join(SKILL_FILE), "---\ndescription: PDFs\n---\n");
    let skill = load_skill(&dir).await.expect("Should load skill");
    assert_eq!(skill.name, "pdf-tools");
}

#[tokio::test]
async fn test_load_resource_dispatches() {
    let temp = tempdir().expect("Should create temp dir");
    let skill = temp.path().join("notes");
    write(&skill.join(SKILL_FILE), "---\ndescription: Notes\n---\n");

    let resource = load_resource(&skill).await.expect("Should load");
    assert_eq!(resource.resource_type, ResourceType::Skill);
}

#[tokio::test]
async fn test_load_package_validates() {
    let temp = tempdir().expect("Should create temp dir");
    let good = temp.path().join("web.package.json");
    write(
        &good,
        r#"{"name":"web","description":"Web tools","resources":["command/build","skill/pdf"]}"#,
    );
    let bad = temp.path().join("bad.package.json");
    write(&bad, r#"{"name":"bad","description":""}"#);

    let package = load_package(&good).await.expect("Should load package");
    assert_eq!(package.resources.len(), 2);

    let err = load_package(&bad).await.expect_err("Should reject package");
    assert_eq!(err.to_string(), "package description is required");
}

#[test]
fn test_resource_ref_parse() {
    let r = ResourceRef::parse("command/api/deploy").expect("Should parse");
    assert_eq!(r.resource_type, ResourceType::Command);
    assert_eq!(r.name, "api/deploy");
    assert_eq!(r.to_string(), "command/api/deploy");

    assert!(ResourceRef::parse("package/web").is_ok());
    assert!(ResourceRef::parse("deploy").is_err());
    assert!(ResourceRef::parse("widget/x").is_err());
    assert!(ResourceRef::parse("skill/").is_err());
}
