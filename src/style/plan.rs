//! Operation plan produced by the scanner.

use crate::model::TableHandle;
use std::collections::BTreeMap;

use super::StyleWarning;

/// Style assignment for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOperation {
    /// Target table
    pub table: TableHandle,
    /// Requested style name
    pub style: String,
    /// Requested by a marker rather than the fallback
    pub explicit: bool,
}

/// Paragraph style assignment over an inclusive index range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphRange {
    /// First paragraph index
    pub start: usize,
    /// Last paragraph index (inclusive)
    pub end: usize,
    /// Requested style name
    pub style: String,
}

impl ParagraphRange {
    /// Paragraph indices covered by the range.
    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// What to do with a marker paragraph's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimAction {
    /// Replace the text with the cleaned text
    Replace(String),
    /// Remove the paragraph
    Delete,
}

impl TrimAction {
    /// Action for cleaned text: empty text deletes the paragraph.
    pub fn for_cleaned(cleaned: String) -> Self {
        if cleaned.is_empty() {
            TrimAction::Delete
        } else {
            TrimAction::Replace(cleaned)
        }
    }
}

/// Everything the scanner decided, applied later in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePlan {
    /// Table operations, explicit ones first
    pub tables: Vec<TableOperation>,
    /// Paragraph range operations in scan order
    pub ranges: Vec<ParagraphRange>,
    /// Trim operations keyed by paragraph index
    pub trims: BTreeMap<usize, TrimAction>,
    /// Diagnostics raised while scanning
    pub warnings: Vec<StyleWarning>,
}

impl StylePlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the plan changes nothing.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.ranges.is_empty() && self.trims.is_empty()
    }

    /// Number of tables styled by markers.
    pub fn explicit_table_count(&self) -> usize {
        self.tables.iter().filter(|t| t.explicit).count()
    }

    /// Trim operations from the highest paragraph index down.
    pub fn trims_descending(&self) -> impl Iterator<Item = (usize, &TrimAction)> {
        self.trims.iter().rev().map(|(&i, a)| (i, a))
    }
}
