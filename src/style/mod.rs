//! Marker-driven style post-processing.
//!
//! A converted body fragment carries style markers as plain paragraph text.
//! Processing runs in two phases: a read-only [`Scanner`] pass that builds a
//! [`StylePlan`], then an [`Executor`] that applies the plan.
//!
//! ```no_run
//! use docforge::style::{apply_styles, StyleOptions};
//!
//! let report = apply_styles("body.docx", &StyleOptions::default())?;
//! for warning in &report.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! # Ok::<(), docforge::Error>(())
//! ```

mod executor;
pub mod marker;
mod plan;
mod resolver;
mod scanner;

pub use executor::Executor;
pub use plan::{ParagraphRange, StylePlan, TableOperation, TrimAction};
pub use resolver::{ResolvedTableStyle, TableStyleResolver};
pub use scanner::Scanner;

use crate::docx::Docx;
use crate::error::Result;
use crate::model::{Document, StyleSheet, TableLook};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Default name of the chart table style.
pub const DEFAULT_CHART_STYLE: &str = "Chart";

/// Default name of the list table style.
pub const DEFAULT_LIST_STYLE: &str = "List";

/// Options for style post-processing.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Name of the chart table style
    pub chart_style: String,

    /// Name of the list table style
    pub list_style: String,

    /// Fallback style for tables without a marker (defaults to the list style)
    pub default_table_style: Option<String>,

    /// Keep the existing style of unmarked tables instead of replacing it
    /// with the fallback (off by default)
    pub keep_table_styles: bool,

    /// Table styles the converter assigns by itself; with
    /// `keep_table_styles` set, tables carrying one still receive the fallback
    pub generic_table_styles: Vec<String>,

    /// Substring of a character style name that marks code paragraphs
    pub verbatim_marker: String,

    /// Additional table looks by style name
    pub table_looks: Vec<(String, TableLook)>,
}

impl StyleOptions {
    /// Create new style options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chart table style name.
    pub fn with_chart_style(mut self, name: impl Into<String>) -> Self {
        self.chart_style = name.into();
        self
    }

    /// Set the list table style name.
    pub fn with_list_style(mut self, name: impl Into<String>) -> Self {
        self.list_style = name.into();
        self
    }

    /// Set the fallback table style name.
    pub fn with_default_table_style(mut self, name: impl Into<String>) -> Self {
        self.default_table_style = Some(name.into());
        self
    }

    /// Keep existing styles on unmarked tables.
    pub fn with_keep_table_styles(mut self, keep: bool) -> Self {
        self.keep_table_styles = keep;
        self
    }

    /// Set the generic table styles.
    pub fn with_generic_table_styles<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.generic_table_styles = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the verbatim style marker.
    pub fn with_verbatim_marker(mut self, marker: impl Into<String>) -> Self {
        self.verbatim_marker = marker.into();
        self
    }

    /// Register a table look for a style name.
    pub fn with_table_look(mut self, name: impl Into<String>, look: TableLook) -> Self {
        self.table_looks.push((name.into(), look));
        self
    }

    /// Fallback style for tables without a marker.
    pub fn default_table_style(&self) -> &str {
        self.default_table_style
            .as_deref()
            .unwrap_or(self.list_style.as_str())
    }

    /// Whether a style name is one the converter assigns by itself.
    pub fn is_generic_table_style(&self, name: &str) -> bool {
        self.generic_table_styles.iter().any(|g| g == name)
    }

    /// Build the table style resolver for these options.
    pub fn resolver(&self) -> TableStyleResolver {
        let mut resolver = TableStyleResolver::new(&self.chart_style, &self.list_style);
        for (name, look) in &self.table_looks {
            resolver.register(name.as_str(), *look);
        }
        resolver
    }
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            chart_style: DEFAULT_CHART_STYLE.to_string(),
            list_style: DEFAULT_LIST_STYLE.to_string(),
            default_table_style: None,
            keep_table_styles: false,
            generic_table_styles: vec!["Table".to_string()],
            verbatim_marker: "Verbatim".to_string(),
            table_looks: Vec::new(),
        }
    }
}

/// A recoverable problem found while processing markers.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleWarning {
    /// A table marker is not directly followed by a table.
    #[error("Table marker '{style}' at paragraph {paragraph} is not followed by a table")]
    TableNotFollowed {
        /// Marker paragraph index
        paragraph: usize,
        /// Requested style
        style: String,
    },

    /// A span was opened but never closed.
    #[error("Style marker '{style}' at paragraph {start} has no matching end marker")]
    UnterminatedSpan {
        /// Start paragraph index
        start: usize,
        /// Requested style
        style: String,
    },

    /// Text starts like a marker but does not match the grammar.
    #[error("Malformed marker at paragraph {paragraph}: {text}")]
    MalformedMarker {
        /// Paragraph index
        paragraph: usize,
        /// Paragraph text
        text: String,
    },

    /// An opening marker inside an open span, ignored.
    #[error("Marker at paragraph {paragraph} ignored inside open '{style}' span")]
    NestedMarker {
        /// Paragraph index
        paragraph: usize,
        /// Style of the open span
        style: String,
    },

    /// A planned operation could not be applied.
    #[error("Could not apply style '{style}' to {target}: {reason}")]
    ApplyFailed {
        /// Requested style
        style: String,
        /// Description of the target
        target: String,
        /// Underlying error
        reason: String,
    },
}

/// Outcome of a post-processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleReport {
    /// Tables styled by markers
    pub explicit_tables: usize,

    /// Tables given the fallback style
    pub default_tables: usize,

    /// Paragraphs given a span style
    pub styled_paragraphs: usize,

    /// Paragraphs whose marker text was stripped
    pub trimmed_paragraphs: usize,

    /// Marker-only paragraphs removed
    pub deleted_paragraphs: usize,

    /// Recoverable problems, in the order found
    pub warnings: Vec<StyleWarning>,
}

impl StyleReport {
    /// Check if the run produced no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Total number of tables styled.
    pub fn styled_tables(&self) -> usize {
        self.explicit_tables + self.default_tables
    }

    /// Record and log a warning.
    pub fn push_warning(&mut self, warning: StyleWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Scan a document and return the plan without applying it.
pub fn plan(doc: &Document, styles: &StyleSheet, options: &StyleOptions) -> StylePlan {
    Scanner::new(doc, styles, options).scan()
}

/// Process the markers of a document body in memory.
pub fn process_document(
    doc: &mut Document,
    styles: &StyleSheet,
    options: &StyleOptions,
) -> StyleReport {
    let plan = plan(doc, styles, options);
    let resolver = options.resolver();
    let report = Executor::new(styles, &resolver).execute(doc, plan);

    log::info!(
        "Styled {} tables ({} by marker), {} paragraphs; removed {} marker paragraphs",
        report.styled_tables(),
        report.explicit_tables,
        report.styled_paragraphs,
        report.deleted_paragraphs
    );
    report
}

/// Process the markers of an open document.
pub fn process(docx: &mut Docx, options: &StyleOptions) -> StyleReport {
    let (doc, styles) = docx.parts_mut();
    process_document(doc, styles, options)
}

/// Process a `.docx` file in place.
///
/// Only failures to read or write the file are errors; marker problems are
/// reported in the returned [`StyleReport`].
pub fn apply_styles<P: AsRef<Path>>(path: P, options: &StyleOptions) -> Result<StyleReport> {
    let path = path.as_ref();
    let mut docx = Docx::open(path)?;
    let report = process(&mut docx, options);
    docx.save(path)?;
    Ok(report)
}
