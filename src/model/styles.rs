//! Style sheet types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a style definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    /// Paragraph style
    Paragraph,
    /// Character (run) style
    Character,
    /// Table style
    Table,
    /// Numbering style
    Numbering,
}

impl StyleKind {
    /// Parse a WordprocessingML `w:type` value.
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(StyleKind::Paragraph),
            "character" => Some(StyleKind::Character),
            "table" => Some(StyleKind::Table),
            "numbering" => Some(StyleKind::Numbering),
            _ => None,
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StyleKind::Paragraph => "paragraph",
            StyleKind::Character => "character",
            StyleKind::Table => "table",
            StyleKind::Numbering => "numbering",
        };
        f.write_str(name)
    }
}

/// A single style definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDefinition {
    /// Style id referenced from content
    pub id: String,

    /// Display name
    pub name: Option<String>,

    /// Style kind
    pub kind: StyleKind,

    /// Source XML of the `w:style` element
    pub xml: String,
}

/// The styles defined by a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheet {
    styles: Vec<StyleDefinition>,
}

impl StyleSheet {
    /// Create an empty style sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a style definition.
    pub fn add(&mut self, style: StyleDefinition) {
        self.styles.push(style);
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if the sheet has no definitions.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterate over the definitions.
    pub fn iter(&self) -> impl Iterator<Item = &StyleDefinition> {
        self.styles.iter()
    }

    /// Look up a definition by style id.
    pub fn by_id(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles.iter().find(|s| s.id == id)
    }

    /// Display name of a style id, falling back to the id itself.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.by_id(id)
            .and_then(|s| s.name.as_deref())
            .unwrap_or(id)
    }

    /// Resolve a style name to the id to write into content.
    ///
    /// Matches display names first, then ids. A sheet without definitions
    /// accepts every name as an id.
    pub fn resolve(&self, name: &str, kind: StyleKind) -> Result<String> {
        if self.is_empty() {
            return Ok(name.to_string());
        }

        let found = self
            .styles
            .iter()
            .find(|s| s.name.as_deref() == Some(name))
            .or_else(|| self.by_id(name))
            .ok_or_else(|| Error::StyleNotFound(name.to_string()))?;

        if found.kind != kind {
            return Err(Error::StyleKindMismatch {
                name: name.to_string(),
                expected: kind.to_string(),
                actual: found.kind.to_string(),
            });
        }
        Ok(found.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(id: &str, name: &str, kind: StyleKind) -> StyleDefinition {
        StyleDefinition {
            id: id.to_string(),
            name: Some(name.to_string()),
            kind,
            xml: String::new(),
        }
    }

    #[test]
    fn test_resolve_by_name_then_id() {
        let mut sheet = StyleSheet::new();
        sheet.add(style("SourceCode", "Source Code", StyleKind::Paragraph));
        sheet.add(style("ChartTable", "Chart", StyleKind::Table));

        assert_eq!(sheet.resolve("Source Code", StyleKind::Paragraph).unwrap(), "SourceCode");
        assert_eq!(sheet.resolve("SourceCode", StyleKind::Paragraph).unwrap(), "SourceCode");
        assert_eq!(sheet.resolve("Chart", StyleKind::Table).unwrap(), "ChartTable");
    }

    #[test]
    fn test_resolve_failures() {
        let mut sheet = StyleSheet::new();
        sheet.add(style("VerbatimChar", "Verbatim Char", StyleKind::Character));

        assert!(matches!(
            sheet.resolve("Missing", StyleKind::Paragraph),
            Err(Error::StyleNotFound(_))
        ));
        assert!(matches!(
            sheet.resolve("Verbatim Char", StyleKind::Table),
            Err(Error::StyleKindMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_sheet_accepts_names() {
        let sheet = StyleSheet::new();
        assert_eq!(sheet.resolve("Note", StyleKind::Paragraph).unwrap(), "Note");
    }

    #[test]
    fn test_display_name() {
        let mut sheet = StyleSheet::new();
        sheet.add(style("VerbatimChar", "Verbatim Char", StyleKind::Character));
        assert_eq!(sheet.display_name("VerbatimChar"), "Verbatim Char");
        assert_eq!(sheet.display_name("Other"), "Other");
    }
}
