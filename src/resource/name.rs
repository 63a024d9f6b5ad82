use super::{ResourceError, ResourceType};
use std::sync::LazyLock;

const MAX_SEGMENT_LEN: usize = 64;
const MAX_SKILL_DESCRIPTION_LEN: usize = 1024;

#[expect(
    clippy::expect_used,
    reason = "Regex literal is compile-time constant and cannot fail"
)]
static NAME_SEGMENT_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$")
        .expect("NAME_SEGMENT_REGEX is a valid regex literal")
});

/// One slug segment: 1-64 lowercase alphanumerics and hyphens, no leading,
/// trailing or doubled hyphen.
#[must_use]
pub fn is_valid_segment(segment: &str) -> bool {
    segment.len() <= MAX_SEGMENT_LEN
        && !segment.contains("--")
        && NAME_SEGMENT_REGEX.is_match(segment)
}

/// Validate a resource name. Nested names are checked per `/` segment.
pub fn validate_name(name: &str) -> Result<(), ResourceError> {
    let invalid = |reason: String| Err(ResourceError::InvalidName(reason));

    if name.is_empty() {
        return invalid("name cannot be empty".to_string());
    }
    if name.contains("--") {
        return invalid("name cannot contain consecutive hyphens".to_string());
    }

    for (position, segment) in name.split('/').enumerate() {
        if segment.is_empty() {
            return invalid(format!("empty segment in path at position {position}"));
        }
        if segment.len() > MAX_SEGMENT_LEN {
            return invalid(format!(
                "segment '{segment}' too long ({} chars, max {MAX_SEGMENT_LEN})",
                segment.len()
            ));
        }
        if !is_valid_segment(segment) {
            return invalid(format!(
                "segment '{segment}' invalid: must be lowercase alphanumeric + hyphens, cannot start/end with hyphen"
            ));
        }
    }
    Ok(())
}

pub fn validate_description(
    description: &str,
    resource_type: ResourceType,
) -> Result<(), ResourceError> {
    if description.is_empty() {
        return Err(ResourceError::InvalidDescription(
            "description cannot be empty".to_string(),
        ));
    }
    let len = description.chars().count();
    if resource_type == ResourceType::Skill && len > MAX_SKILL_DESCRIPTION_LEN {
        return Err(ResourceError::InvalidDescription(format!(
            "skill description too long ({len} chars, max {MAX_SKILL_DESCRIPTION_LEN})"
        )));
    }
    Ok(())
}
