//! Document inspection: statistics and JSON dumps of the model.

use crate::docx::Docx;
use crate::error::Result;
use crate::model::{Block, Document};
use crate::style::marker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document body to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc)?,
        JsonFormat::Compact => serde_json::to_string(doc)?,
    };
    Ok(json)
}

/// Statistics of a document body.
///
/// Counts are over top-level body blocks, the same view the style
/// post-processor works on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of paragraphs
    pub paragraphs: usize,

    /// Number of tables
    pub tables: usize,

    /// Tables carrying a table style
    pub styled_tables: usize,

    /// Tables without a table style
    pub unstyled_tables: usize,

    /// Blocks kept as verbatim XML
    pub raw_blocks: usize,

    /// Whitespace-separated words in paragraphs
    pub words: usize,

    /// Paragraph indices whose text still holds a style marker
    pub residual_markers: Vec<usize>,

    /// Paragraph count per paragraph style id (`""` for unstyled)
    pub paragraph_styles: BTreeMap<String, usize>,

    /// Table count per table style id (`""` for unstyled)
    pub table_styles: BTreeMap<String, usize>,
}

impl DocumentStats {
    /// Collect statistics from a document body.
    pub fn collect(doc: &Document) -> Self {
        let mut stats = Self::default();

        for block in &doc.body {
            match block {
                Block::Paragraph(p) => {
                    let text = p.text();
                    if marker::contains_marker(&text) {
                        stats.residual_markers.push(stats.paragraphs);
                    }
                    stats.words += text.split_whitespace().count();
                    *stats
                        .paragraph_styles
                        .entry(p.style().unwrap_or_default().to_string())
                        .or_default() += 1;
                    stats.paragraphs += 1;
                }
                Block::Table(t) => {
                    stats.tables += 1;
                    match t.style() {
                        Some(_) => stats.styled_tables += 1,
                        None => stats.unstyled_tables += 1,
                    }
                    *stats
                        .table_styles
                        .entry(t.style().unwrap_or_default().to_string())
                        .or_default() += 1;
                }
                Block::Raw { .. } => stats.raw_blocks += 1,
            }
        }

        stats
    }

    /// Check whether any marker text survived post-processing.
    pub fn has_residual_markers(&self) -> bool {
        !self.residual_markers.is_empty()
    }
}

/// Summary of a `.docx` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    /// Main document part name
    pub main_part: String,

    /// Number of style definitions
    pub style_count: usize,

    /// Number of header and footer parts
    pub header_footer_parts: usize,

    /// Number of package parts
    pub part_count: usize,

    /// Body statistics
    pub stats: DocumentStats,
}

impl Inspection {
    /// Inspect an open document.
    pub fn of(docx: &Docx) -> Self {
        Self {
            main_part: docx.main_part().to_string(),
            style_count: docx.styles().len(),
            header_footer_parts: docx.header_footer_parts().len(),
            part_count: docx.package().part_names().count(),
            stats: DocumentStats::collect(docx.document()),
        }
    }
}

/// Open and inspect a `.docx` file.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<Inspection> {
    Ok(Inspection::of(&Docx::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Table};

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::styled("Scope of work", "Heading1"));
        doc.add_paragraph(Paragraph::with_text("left over @@@END_STYLE@@@"));
        let mut styled = Table::new();
        styled.properties.style = Some("Chart".into());
        doc.add_table(styled);
        doc.add_table(Table::new());
        doc.add_block(Block::Raw {
            xml: "<w:sdt/>".into(),
        });
        doc
    }

    #[test]
    fn test_collect() {
        let stats = DocumentStats::collect(&sample());

        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.tables, 2);
        assert_eq!(stats.styled_tables, 1);
        assert_eq!(stats.unstyled_tables, 1);
        assert_eq!(stats.raw_blocks, 1);
        assert_eq!(stats.words, 6);
        assert_eq!(stats.residual_markers, vec![1]);
        assert!(stats.has_residual_markers());
        assert_eq!(stats.paragraph_styles.get("Heading1"), Some(&1));
        assert_eq!(stats.table_styles.get("Chart"), Some(&1));
        assert_eq!(stats.table_styles.get(""), Some(&1));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"Scope of work\""));
        assert!(json.contains("\"Chart\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));

        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_inspection_of_blank() {
        let inspection = Inspection::of(&Docx::blank().unwrap());
        assert_eq!(inspection.main_part, "word/document.xml");
        assert_eq!(inspection.style_count, 3);
        assert_eq!(inspection.stats, DocumentStats::default());
    }
}
