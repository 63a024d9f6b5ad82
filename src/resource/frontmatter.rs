use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("empty file")]
    Empty,
    #[error("no frontmatter found (must start with '---')")]
    MissingOpening,
    #[error("no closing frontmatter delimiter found")]
    MissingClosing,
    #[error("frontmatter must be a YAML mapping")]
    NotAMapping,
    #[error("failed to parse frontmatter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The YAML mapping between the `---` delimiters of a markdown file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter(Mapping);

impl Frontmatter {
    /// String value of `key`; absent or non-string values read as `None`.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }

    /// String entries of the mapping under `key`. Non-string values are
    /// dropped.
    #[must_use]
    pub fn get_map(&self, key: &str) -> BTreeMap<String, String> {
        self.0
            .get(key)
            .and_then(Value::as_mapping)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// Split markdown content into its frontmatter and body.
///
/// ```markdown
/// ---
/// description: Deploy the app
/// ---
/// Body...
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let mut lines = content.lines();

    let first = lines.next().ok_or(FrontmatterError::Empty)?;
    if first.trim() != "---" {
        return Err(FrontmatterError::MissingOpening);
    }

    let mut yaml_lines = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == "---" {
            closed = true;
            break;
        }
        yaml_lines.push(line);
    }
    if !closed {
        return Err(FrontmatterError::MissingClosing);
    }

    let yaml = yaml_lines.join("\n");
    let mapping = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(&yaml)? {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            _ => return Err(FrontmatterError::NotAMapping),
        }
    };

    let body = lines.collect::<Vec<_>>().join("\n");
    Ok((Frontmatter(mapping), body))
}
