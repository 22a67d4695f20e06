//! YAML front matter of Markdown sources.
//!
//! A source may start with a `---` line, a YAML mapping and a closing `---`
//! line; everything after that is the Markdown body.

use crate::error::{Error, Result};
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Standard metadata fields, in template order.
pub const STANDARD_FIELDS: [&str; 8] = [
    "title",
    "author",
    "department",
    "doc_number",
    "current_revision",
    "regulatory_rep",
    "quality_rep",
    "department_head",
];

/// Metadata and body of a Markdown source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Parsed metadata
    pub metadata: Metadata,
    /// Markdown body following the front matter
    pub body: String,
}

/// Document metadata from front matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Author
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Owning department
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Document number
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,

    /// Current revision label
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub current_revision: Option<String>,

    /// Regulatory representative
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub regulatory_rep: Option<String>,

    /// Quality representative
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub quality_rep: Option<String>,

    /// Department head
    #[serde(default, deserialize_with = "scalar_opt", skip_serializing_if = "Option::is_none")]
    pub department_head: Option<String>,

    /// Revision history, oldest first
    #[serde(default, deserialize_with = "revision_list", skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<Revision>,

    /// Any other keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Value of a standard field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "title" => &self.title,
            "author" => &self.author,
            "department" => &self.department,
            "doc_number" => &self.doc_number,
            "current_revision" => &self.current_revision,
            "regulatory_rep" => &self.regulatory_rep,
            "quality_rep" => &self.quality_rep,
            "department_head" => &self.department_head,
            _ => return None,
        };
        value.as_deref()
    }

    /// Resolve a dotted path (`title`, `revisions.0.number`, `owner.name`)
    /// to display text.
    pub fn lookup(&self, path: &str) -> Option<String> {
        let mut parts = path.split('.');
        let head = parts.next()?;

        if let Some(value) = self.field(head) {
            return parts.next().is_none().then(|| value.to_string());
        }

        if head == "revisions" {
            let Some(index) = parts.next() else {
                return Some(self.revisions.len().to_string());
            };
            let revision = self.revisions.get(index.parse::<usize>().ok()?)?;
            let field = parts.next()?;
            if parts.next().is_some() {
                return None;
            }
            return revision.field(field).map(str::to_string);
        }

        let mut value = self.extra.get(head)?;
        for part in parts {
            value = match value {
                Value::Mapping(map) => map.get(part)?,
                Value::Sequence(seq) => seq.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        scalar_text(value)
    }

    /// Keys present in the front matter.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = STANDARD_FIELDS
            .iter()
            .filter(|f| self.field(f).is_some())
            .map(|f| f.to_string())
            .collect();
        if !self.revisions.is_empty() {
            keys.push("revisions".to_string());
        }
        keys.extend(self.extra.keys().cloned());
        keys
    }

    /// Standard fields that are absent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        STANDARD_FIELDS
            .iter()
            .copied()
            .filter(|f| self.field(f).is_none())
            .collect()
    }
}

/// One entry of the revision history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision label (e.g. `A`, `1.0`)
    #[serde(default, deserialize_with = "scalar")]
    pub number: String,

    /// Description of the change
    #[serde(default, deserialize_with = "scalar")]
    pub description: String,

    /// Engineering change order number
    #[serde(default, deserialize_with = "scalar")]
    pub eco_number: String,

    /// Engineering change order date
    #[serde(default, deserialize_with = "scalar")]
    pub eco_date: String,
}

impl Revision {
    /// Create a revision record.
    pub fn new(
        number: impl Into<String>,
        description: impl Into<String>,
        eco_number: impl Into<String>,
        eco_date: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            description: description.into(),
            eco_number: eco_number.into(),
            eco_date: eco_date.into(),
        }
    }

    /// Value of a field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "number" => Some(&self.number),
            "description" => Some(&self.description),
            "eco_number" => Some(&self.eco_number),
            "eco_date" => Some(&self.eco_date),
            _ => None,
        }
    }
}

fn front_matter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n(.*)\z").unwrap())
}

/// Split a Markdown source into metadata and body.
///
/// A source without front matter yields default metadata and the whole
/// source as body.
pub fn extract(source: &str) -> Result<FrontMatter> {
    let Some(caps) = front_matter_re().captures(source) else {
        return Ok(FrontMatter {
            metadata: Metadata::default(),
            body: source.to_string(),
        });
    };

    let yaml = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    Ok(FrontMatter {
        metadata: parse_metadata(yaml)?,
        body: body.to_string(),
    })
}

/// Read and split a Markdown file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<FrontMatter> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    extract(&std::fs::read_to_string(path)?)
}

/// Parse a YAML metadata block.
pub fn parse_metadata(yaml: &str) -> Result<Metadata> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::default());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Ok(Metadata::default()),
        value @ Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
        _ => Err(Error::FrontMatter(
            "front matter must be a mapping of keys to values".to_string(),
        )),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn scalar_opt<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_text(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom("expected a scalar value")),
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(scalar_opt(deserializer)?.unwrap_or_default())
}

fn revision_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<Revision>, D::Error> {
    Ok(Option::<Vec<Revision>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "---
title: Pump Controller Requirements
author: J. Smith
doc_number: MAP-00001
current_revision: 2
approved: true
owner:
  name: Systems
revisions:
  - number: 1
    description: Initial release
    eco_number: ECO-100
    eco_date: 2024-01-15
  - number: 2
    description: Added alarms
---
# Scope

Body text.
";

    #[test]
    fn test_extract() {
        let fm = extract(SOURCE).unwrap();
        let meta = &fm.metadata;

        assert_eq!(meta.title.as_deref(), Some("Pump Controller Requirements"));
        assert_eq!(meta.current_revision.as_deref(), Some("2"));
        assert_eq!(meta.revisions.len(), 2);
        assert_eq!(meta.revisions[0].eco_date, "2024-01-15");
        assert_eq!(meta.revisions[1].eco_number, "");
        assert!(fm.body.starts_with("# Scope"));
    }

    #[test]
    fn test_no_front_matter() {
        let fm = extract("# Just markdown\n").unwrap();
        assert_eq!(fm.metadata, Metadata::default());
        assert_eq!(fm.body, "# Just markdown\n");
    }

    #[test]
    fn test_empty_front_matter() {
        let fm = extract("---\n\n---\nbody").unwrap();
        assert_eq!(fm.metadata, Metadata::default());
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_invalid_front_matter() {
        assert!(matches!(extract("---\n- a\n- b\n---\nbody"), Err(Error::FrontMatter(_))));
        assert!(matches!(extract("---\ntitle: [oops\n---\nbody"), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_lookup() {
        let meta = extract(SOURCE).unwrap().metadata;
        assert_eq!(meta.lookup("title").as_deref(), Some("Pump Controller Requirements"));
        assert_eq!(meta.lookup("approved").as_deref(), Some("true"));
        assert_eq!(meta.lookup("owner.name").as_deref(), Some("Systems"));
        assert_eq!(meta.lookup("revisions.1.description").as_deref(), Some("Added alarms"));
        assert_eq!(meta.lookup("revisions").as_deref(), Some("2"));
        assert_eq!(meta.lookup("owner"), None);
        assert_eq!(meta.lookup("missing"), None);
        assert_eq!(meta.lookup("title.sub"), None);
    }

    #[test]
    fn test_keys_and_missing_fields() {
        let meta = extract(SOURCE).unwrap().metadata;
        let keys = meta.keys();
        assert!(keys.contains(&"title".to_string()));
        assert!(keys.contains(&"revisions".to_string()));
        assert!(keys.contains(&"owner".to_string()));

        let missing = meta.missing_fields();
        assert!(missing.contains(&"department"));
        assert!(!missing.contains(&"title"));
    }

    #[test]
    fn test_current_revision_is_not_reconciled() {
        let meta = parse_metadata("current_revision: C\nrevisions:\n  - number: A\n").unwrap();
        assert_eq!(meta.current_revision.as_deref(), Some("C"));
        assert_eq!(meta.revisions[0].number, "A");
    }
}
