//! Document-level types.

use super::{Inline, Paragraph, RunContent, Table};
use serde::{Deserialize, Serialize};

/// A Word document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Body content in document order
    pub body: Vec<Block>,

    /// Final section properties (`w:sectPr`) kept verbatim
    pub section: Option<String>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block to the body.
    pub fn add_block(&mut self, block: Block) {
        self.body.push(block);
    }

    /// Add a paragraph to the body.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(Block::Paragraph(paragraph));
    }

    /// Add a table to the body.
    pub fn add_table(&mut self, table: Table) {
        self.body.push(Block::Table(table));
    }

    /// Iterate over the top-level paragraphs in body order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Iterate over the top-level tables in body order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Number of top-level paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Number of top-level tables.
    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Build the position index of this body.
    pub fn index(&self) -> BodyIndex {
        BodyIndex::build(self)
    }

    /// Mutable access to the table behind a handle.
    pub fn table_mut(&mut self, handle: TableHandle) -> Option<&mut Table> {
        match self.body.get_mut(handle.position()) {
            Some(Block::Table(t)) => Some(t),
            _ => None,
        }
    }

    /// Mutable access to the paragraph at a body position.
    pub fn paragraph_at_mut(&mut self, position: usize) -> Option<&mut Paragraph> {
        match self.body.get_mut(position) {
            Some(Block::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    /// Remove the block at a body position.
    pub fn remove_block(&mut self, position: usize) -> Option<Block> {
        (position < self.body.len()).then(|| self.body.remove(position))
    }

    /// Get plain text content of the body.
    pub fn text(&self) -> String {
        self.body
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(p) => Some(p.text()),
                Block::Table(t) => Some(t.text()),
                Block::Raw { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Visit every paragraph, including paragraphs inside table cells.
    pub fn visit_paragraphs_mut(&mut self, f: &mut dyn FnMut(&mut Paragraph)) {
        visit_paragraphs_in(&mut self.body, f);
    }

    /// Visit every piece of verbatim XML held by the body.
    ///
    /// Covers raw blocks, raw inline and run content, raw properties and
    /// row-level XML. The final section properties are not visited.
    pub fn visit_raw_xml_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        visit_raw_blocks_mut(&mut self.body, f);
    }
}

/// Visit every paragraph in a block sequence, including table cells.
pub fn visit_paragraphs_in(blocks: &mut [Block], f: &mut dyn FnMut(&mut Paragraph)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(t) => {
                for row in &mut t.rows {
                    for cell in &mut row.cells {
                        visit_paragraphs_in(&mut cell.content, f);
                    }
                }
            }
            Block::Raw { .. } => {}
        }
    }
}

fn visit_raw_blocks_mut(blocks: &mut [Block], f: &mut dyn FnMut(&mut String)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => {
                p.properties.extra.iter_mut().for_each(|prop| f(&mut prop.xml));
                for inline in &mut p.content {
                    match inline {
                        Inline::Run(run) => {
                            run.properties
                                .extra
                                .iter_mut()
                                .for_each(|prop| f(&mut prop.xml));
                            for content in &mut run.content {
                                if let RunContent::Raw(xml) = content {
                                    f(xml);
                                }
                            }
                        }
                        Inline::Raw { xml, .. } => f(xml),
                    }
                }
            }
            Block::Table(t) => {
                t.properties.extra.iter_mut().for_each(|prop| f(&mut prop.xml));
                for row in &mut t.rows {
                    if let Some(xml) = row.properties.as_mut() {
                        f(xml);
                    }
                    row.raw_items.iter_mut().for_each(|xml| f(xml));
                    for cell in &mut row.cells {
                        cell.properties
                            .extra
                            .iter_mut()
                            .for_each(|prop| f(&mut prop.xml));
                        visit_raw_blocks_mut(&mut cell.content, f);
                    }
                }
            }
            Block::Raw { xml } => f(xml),
        }
    }
}

/// A block in a document body or table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),

    /// A table
    Table(Table),

    /// Body XML kept verbatim (content controls, custom XML)
    Raw {
        /// Source XML
        xml: String,
    },
}

impl Block {
    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }
}

/// Stable reference to a top-level table.
///
/// A handle is the table's position in the body at the time the index was
/// built. It stays valid as long as no block before it is inserted or
/// removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableHandle(usize);

impl TableHandle {
    /// Body position of the table.
    pub fn position(&self) -> usize {
        self.0
    }
}

/// Body positions of the top-level paragraphs and tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyIndex {
    paragraphs: Vec<usize>,
    tables: Vec<usize>,
    body_len: usize,
    table_positions: Vec<bool>,
}

impl BodyIndex {
    /// Index a document body.
    pub fn build(doc: &Document) -> Self {
        let mut index = Self {
            body_len: doc.body.len(),
            table_positions: vec![false; doc.body.len()],
            ..Default::default()
        };
        for (position, block) in doc.body.iter().enumerate() {
            match block {
                Block::Paragraph(_) => index.paragraphs.push(position),
                Block::Table(_) => {
                    index.tables.push(position);
                    index.table_positions[position] = true;
                }
                Block::Raw { .. } => {}
            }
        }
        index
    }

    /// Number of indexed paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Body position of the paragraph with the given index.
    pub fn paragraph_position(&self, paragraph: usize) -> Option<usize> {
        self.paragraphs.get(paragraph).copied()
    }

    /// Handles of every top-level table, in body order.
    pub fn tables(&self) -> impl Iterator<Item = TableHandle> + '_ {
        self.tables.iter().map(|&p| TableHandle(p))
    }

    /// The table immediately following a paragraph in body order, if the
    /// next body element is a table.
    pub fn table_after(&self, paragraph: usize) -> Option<TableHandle> {
        let next = self.paragraph_position(paragraph)? + 1;
        (next < self.body_len && self.table_positions[next]).then_some(TableHandle(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("intro"));
        doc.add_paragraph(Paragraph::with_text("marker"));
        doc.add_table(Table::new());
        doc.add_block(Block::Raw {
            xml: "<w:sdt/>".into(),
        });
        doc.add_paragraph(Paragraph::with_text("outro"));
        doc.add_table(Table::new());
        doc
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.paragraph_count(), 0);
    }

    #[test]
    fn test_body_index() {
        let doc = sample();
        let index = doc.index();
        assert_eq!(index.paragraph_count(), 3);
        assert_eq!(index.paragraph_position(2), Some(4));
        assert_eq!(index.tables().count(), 2);
        assert_eq!(index.table_after(1).map(|h| h.position()), Some(2));
        assert_eq!(index.table_after(0), None);
        assert_eq!(index.table_after(2).map(|h| h.position()), Some(5));
        assert_eq!(index.table_after(7), None);
    }

    #[test]
    fn test_table_handle_access() {
        let mut doc = sample();
        let handle = doc.index().table_after(1).unwrap();
        doc.table_mut(handle).unwrap().properties.style = Some("Chart".into());
        assert_eq!(doc.tables().next().unwrap().style(), Some("Chart"));
        assert!(doc.paragraph_at_mut(handle.position()).is_none());
    }

    #[test]
    fn test_visit_paragraphs_reaches_cells() {
        use crate::model::{TableCell, TableRow};

        let mut doc = Document::new();
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![TableCell::with_text("cell")]));
        doc.add_table(table);
        doc.add_paragraph(Paragraph::with_text("body"));

        let mut seen = Vec::new();
        doc.visit_paragraphs_mut(&mut |p| seen.push(p.text()));
        assert_eq!(seen, vec!["cell".to_string(), "body".to_string()]);
    }

    #[test]
    fn test_remove_block() {
        let mut doc = sample();
        assert!(doc.remove_block(1).is_some());
        assert!(doc.remove_block(42).is_none());
        assert_eq!(doc.paragraph_count(), 2);
    }
}
