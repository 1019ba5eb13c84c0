//! Front matter extraction and parsing.

use std::collections::BTreeMap;

use serde_yaml::Value;

/// Metadata parsed from the front matter block of a page.
///
/// Scalar values are kept as their string form. Sequences and mappings keep
/// their YAML text so nothing is silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: BTreeMap<String, String>,
}

impl FrontMatter {
    /// Look up a key. Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Page title.
    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    /// Page description for the document head.
    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    /// Name of the layout this page asks for.
    pub fn layout(&self) -> Option<&str> {
        self.get("layout")
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Extract front matter from a Markdown source.
///
/// The block must open on the very first line with `---` and close with a
/// line of `---` or `...`. Without a closing line the whole source is body.
/// Returns the parsed front matter and the remaining content after the block.
pub fn extract_front_matter(source: &str) -> Result<(Option<FrontMatter>, &str), FrontMatterError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((None, source));
    };
    if first.trim_end_matches(['\r', '\n']) != "---" {
        return Ok((None, source));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;

    for line in lines {
        let end = offset + line.len();
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let front_matter = parse_yaml(&text[yaml_start..offset])?;
            return Ok((Some(front_matter), &text[end..]));
        }
        offset = end;
    }

    Ok((None, source))
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    let mut front_matter = FrontMatter::default();

    if yaml.trim().is_empty() {
        return Ok(front_matter);
    }

    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::InvalidYaml(e.to_string()))?;

    match value {
        Value::Null => {}
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                let Some(key) = scalar_to_string(&key) else {
                    continue;
                };
                if let Some(value) = value_to_string(&value) {
                    front_matter.insert(key, value);
                }
            }
        }
        other => {
            tracing::warn!(
                "Front matter is a {} rather than a mapping, ignoring it",
                kind_name(&other)
            );
        }
    }

    Ok(front_matter)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Tagged(tagged) => value_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(value)
            .ok()
            .map(|s| s.trim_end().to_string()),
        scalar => scalar_to_string(scalar),
    }
}

/// Errors that can occur when parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),
}
