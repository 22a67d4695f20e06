//! Document model types for Word content.
//!
//! This module defines the in-memory representation that the DOCX codec
//! reads into and writes from, and that the style post-processor, template
//! renderer and composer operate on. Content the model does not interpret
//! is kept as verbatim XML so a read/write cycle does not lose it.

mod document;
mod paragraph;
mod styles;
mod table;

pub use document::{visit_paragraphs_in, Block, BodyIndex, Document, TableHandle};
pub use paragraph::{
    Alignment, Inline, Paragraph, ParagraphProperties, RawProperty, Run, RunContent,
    RunProperties,
};
pub use styles::{StyleDefinition, StyleKind, StyleSheet};
pub use table::{CellProperties, Table, TableCell, TableLook, TableProperties, TableRow};
