//! YAML frontmatter extraction
//!
//! Frontmatter is a YAML block at the very start of a note, opened by a `---`
//! line and closed by `---` or `...`. Its top-level keys become note
//! properties.

use loam_core::{PropertyMap, PropertyValue};
use serde_yaml::Value as YamlValue;
use tracing::warn;

/// Location of a frontmatter block inside a note's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// YAML between the delimiters
    pub yaml: &'a str,
    /// Byte offset of the first character after the closing delimiter line
    pub body_offset: usize,
}

/// Find the frontmatter block, if the text opens with one
pub fn split_frontmatter(text: &str) -> Option<Frontmatter<'_>> {
    let text_no_bom = text.strip_prefix('\u{feff}').unwrap_or(text);
    let bom_len = text.len() - text_no_bom.len();

    let first_end = text_no_bom.find('\n')?;
    if text_no_bom[..first_end].trim_end() != "---" {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut line_start = yaml_start;
    loop {
        let rest = &text_no_bom[line_start..];
        let (line, next) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], Some(line_start + idx + 1)),
            None => (rest, None),
        };

        if matches!(line.trim_end(), "---" | "...") {
            return Some(Frontmatter {
                yaml: &text_no_bom[yaml_start..line_start],
                body_offset: bom_len + next.unwrap_or(text_no_bom.len()),
            });
        }

        line_start = next?;
    }
}

/// Parse frontmatter YAML into properties.
///
/// Malformed YAML is logged and yields no properties. Null values are
/// dropped; nested mappings and non-finite numbers are kept as their YAML text.
pub fn parse_properties(yaml: &str) -> PropertyMap {
    let mut properties = PropertyMap::new();
    if yaml.trim().is_empty() {
        return properties;
    }

    let value: YamlValue = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring malformed frontmatter: {}", e);
            return properties;
        }
    };

    let YamlValue::Mapping(mapping) = value else {
        warn!("Ignoring frontmatter that is not a mapping");
        return properties;
    };

    for (key, value) in mapping {
        let Some(key) = key_to_string(&key) else {
            continue;
        };
        if let Some(value) = to_property(value) {
            properties.insert(key, value);
        }
    }

    properties
}

fn key_to_string(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_property(value: YamlValue) -> Option<PropertyValue> {
    match value {
        YamlValue::Null => None,
        YamlValue::Bool(b) => Some(PropertyValue::Bool(b)),
        YamlValue::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Some(PropertyValue::Number(f)),
            _ => Some(PropertyValue::String(n.to_string())),
        },
        YamlValue::String(s) => Some(PropertyValue::String(s)),
        YamlValue::Sequence(items) => Some(PropertyValue::List(
            items.into_iter().filter_map(to_property).collect(),
        )),
        YamlValue::Mapping(_) => serde_yaml::to_string(&value)
            .ok()
            .map(|s| PropertyValue::String(s.trim_end().to_string())),
        YamlValue::Tagged(tagged) => to_property(tagged.value),
    }
}

/// Tags declared in a `tags` property (list, or comma/space separated string)
pub fn property_tags(properties: &PropertyMap) -> Vec<String> {
    let Some(value) = properties.get("tags") else {
        return Vec::new();
    };

    let raw: Vec<&str> = match value {
        PropertyValue::String(s) => s.split([',', ' ']).collect(),
        PropertyValue::List(items) => items.iter().filter_map(PropertyValue::as_str).collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
