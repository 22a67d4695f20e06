//! Table types.

use super::{Alignment, Block, Paragraph, RawProperty, Run};
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table properties
    pub properties: TableProperties,

    /// Column widths in twentieths of a point
    pub grid: Vec<u32>,

    /// Rows in the table
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given column widths (twips).
    pub fn with_grid(grid: Vec<u32>) -> Self {
        Self {
            grid,
            ..Self::new()
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of grid columns.
    pub fn column_count(&self) -> usize {
        if !self.grid.is_empty() {
            return self.grid.len();
        }
        self.rows
            .first()
            .map(|r| r.cells.iter().map(|c| c.span() as usize).sum())
            .unwrap_or(0)
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table style id, if any.
    pub fn style(&self) -> Option<&str> {
        self.properties.style.as_deref()
    }

    /// Get plain text representation of the table.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Table-level properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableProperties {
    /// Table style id
    pub style: Option<String>,

    /// Conditional formatting flags
    pub look: Option<TableLook>,

    /// Table alignment on the page
    pub alignment: Option<Alignment>,

    /// Properties kept verbatim from the source
    pub extra: Vec<RawProperty>,
}

/// Conditional formatting flags of a table (`w:tblLook`).
///
/// Controls which parts of the table style apply: header row, total row,
/// first/last column emphasis and row/column banding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLook {
    /// Emphasize the header row
    pub first_row: bool,
    /// Emphasize the last row
    pub last_row: bool,
    /// Emphasize the first column
    pub first_column: bool,
    /// Emphasize the last column
    pub last_column: bool,
    /// Disable horizontal banding
    pub no_h_band: bool,
    /// Disable vertical banding
    pub no_v_band: bool,
}

impl TableLook {
    const FIRST_ROW: u16 = 0x0020;
    const LAST_ROW: u16 = 0x0040;
    const FIRST_COLUMN: u16 = 0x0080;
    const LAST_COLUMN: u16 = 0x0100;
    const NO_H_BAND: u16 = 0x0200;
    const NO_V_BAND: u16 = 0x0400;

    /// Header row and first column emphasized, horizontal banding only.
    pub fn chart() -> Self {
        Self {
            first_row: true,
            first_column: true,
            no_v_band: true,
            ..Default::default()
        }
    }

    /// Header row emphasized, horizontal banding only.
    pub fn list() -> Self {
        Self {
            first_row: true,
            no_v_band: true,
            ..Default::default()
        }
    }

    /// Legacy bitmask form of the flags.
    pub fn val(&self) -> u16 {
        let mut val = 0;
        for (flag, bit) in [
            (self.first_row, Self::FIRST_ROW),
            (self.last_row, Self::LAST_ROW),
            (self.first_column, Self::FIRST_COLUMN),
            (self.last_column, Self::LAST_COLUMN),
            (self.no_h_band, Self::NO_H_BAND),
            (self.no_v_band, Self::NO_V_BAND),
        ] {
            if flag {
                val |= bit;
            }
        }
        val
    }

    /// Decode flags from the legacy bitmask.
    pub fn from_val(val: u16) -> Self {
        Self {
            first_row: val & Self::FIRST_ROW != 0,
            last_row: val & Self::LAST_ROW != 0,
            first_column: val & Self::FIRST_COLUMN != 0,
            last_column: val & Self::LAST_COLUMN != 0,
            no_h_band: val & Self::NO_H_BAND != 0,
            no_v_band: val & Self::NO_V_BAND != 0,
        }
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Row properties (`w:trPr`) kept verbatim
    pub properties: Option<String>,

    /// Cells in the row
    pub cells: Vec<TableCell>,

    /// Other row children kept verbatim, written after the cells
    pub raw_items: Vec<String>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            ..Default::default()
        }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::with_text).collect())
    }

    /// Get plain text representation.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell properties
    pub properties: CellProperties,

    /// Cell content (paragraphs and nested tables)
    pub content: Vec<Block>,
}

impl TableCell {
    /// Create a cell holding one paragraph of plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_paragraph(Paragraph::with_text(text))
    }

    /// Create a cell holding a single paragraph.
    pub fn with_paragraph(paragraph: Paragraph) -> Self {
        Self {
            properties: CellProperties::default(),
            content: vec![Block::Paragraph(paragraph)],
        }
    }

    /// Create a cell holding a single run.
    pub fn with_run(run: Run) -> Self {
        let mut paragraph = Paragraph::new();
        paragraph.add_run(run);
        Self::with_paragraph(paragraph)
    }

    /// Number of grid columns spanned.
    pub fn span(&self) -> u32 {
        self.properties.grid_span.unwrap_or(1)
    }

    /// Set grid span and return self.
    pub fn colspan(mut self, span: u32) -> Self {
        self.properties.grid_span = (span > 1).then_some(span);
        self
    }

    /// Set background fill (hex RGB) and return self.
    pub fn shaded(mut self, fill: impl Into<String>) -> Self {
        self.properties.shading = Some(fill.into());
        self
    }

    /// Set width in twips and return self.
    pub fn width(mut self, twips: u32) -> Self {
        self.properties.width = Some(twips);
        self
    }

    /// Set alignment of every paragraph in the cell and return self.
    pub fn align(mut self, alignment: Alignment) -> Self {
        for block in &mut self.content {
            if let Block::Paragraph(p) = block {
                p.properties.alignment = Some(alignment);
            }
        }
        self
    }

    /// Iterate over the direct paragraphs of the cell.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Get plain text content.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Cell-level properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellProperties {
    /// Preferred width in twips
    pub width: Option<u32>,

    /// Number of grid columns spanned
    pub grid_span: Option<u32>,

    /// Background fill (hex RGB, e.g. `C0C0C0`)
    pub shading: Option<String>,

    /// Properties kept verbatim from the source
    pub extra: Vec<RawProperty>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_table_with_data() {
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["Name", "Age"]));
        table.add_row(TableRow::from_strings(["Alice", "30"]));

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.text(), "Name\tAge\nAlice\t30");
    }

    #[test]
    fn test_column_count_with_span() {
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![TableCell::with_text("Title").colspan(4)]));
        assert_eq!(table.column_count(), 4);

        let table = Table::with_grid(vec![100, 200]);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_table_look_bits() {
        assert_eq!(TableLook::chart().val(), 0x04A0);
        assert_eq!(TableLook::list().val(), 0x0420);
        assert_eq!(TableLook::from_val(0x04A0), TableLook::chart());
        assert_eq!(TableLook::from_val(0), TableLook::default());
    }

    #[test]
    fn test_cell_builders() {
        let cell = TableCell::with_text("REV #")
            .shaded("C0C0C0")
            .width(864)
            .align(Alignment::Center);
        assert_eq!(cell.properties.shading.as_deref(), Some("C0C0C0"));
        assert_eq!(cell.properties.width, Some(864));
        assert_eq!(
            cell.paragraphs().next().unwrap().properties.alignment,
            Some(Alignment::Center)
        );
        assert_eq!(cell.text(), "REV #");
    }
}
