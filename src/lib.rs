//! # docforge
//!
//! Compile Markdown sources with YAML front matter into styled Word documents.
//!
//! A generated document is a signature page and a title page rendered from
//! Word templates, a revision history table built from the front matter,
//! and the Markdown body converted to Word. Authors steer the body's
//! styling with plain-text markers that survive conversion:
//!
//! ```text
//! @@@TABLE_STYLE:Chart@@@        style the next table
//! @@@STYLE:Note@@@               open a paragraph style span
//! ...
//! @@@END_STYLE@@@                close it
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use docforge::Docforge;
//!
//! fn main() -> docforge::Result<()> {
//!     let report = Docforge::new()
//!         .with_template_dir("./templates")
//!         .with_chart_style("DilonTable_Chart")
//!         .with_list_style("DilonTable_List")
//!         .generate("requirements.md", "requirements.docx")?;
//!
//!     for warning in &report.style.warnings {
//!         eprintln!("warning: {}", warning);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Style markers**: table and paragraph styles chosen from Markdown
//! - **Templates**: `{{ field }}` substitution in body, headers and footers
//! - **Revision history**: generated table from front matter records
//! - **Composition**: styles, numbering and media merged across parts
//! - **Inspection**: statistics and JSON dumps of any `.docx` body

pub mod compose;
pub mod convert;
pub mod docx;
pub mod error;
pub mod frontmatter;
pub mod inspect;
pub mod model;
pub mod pipeline;
pub mod revision;
pub mod style;
pub mod template;

// Re-export commonly used types
pub use compose::Composer;
pub use convert::{BodyConverter, PandocConverter};
pub use docx::Docx;
pub use error::{Error, Result};
pub use frontmatter::{FrontMatter, Metadata, Revision};
pub use inspect::{inspect_file, DocumentStats, Inspection, JsonFormat};
pub use model::{
    Alignment, Block, Document, Inline, Paragraph, Run, StyleKind, StyleSheet, Table, TableCell,
    TableLook, TableRow,
};
pub use pipeline::{GenerateOptions, GenerateReport, Generator, Step};
pub use style::{apply_styles, StyleOptions, StyleReport, StyleWarning};

use std::path::{Path, PathBuf};

/// Generate a Word document from a Markdown file using the standard
/// templates in `template_dir`.
///
/// # Example
///
/// ```no_run
/// use docforge::generate;
///
/// let report = generate("spec.md", "spec.docx", "./templates").unwrap();
/// println!("Saved {}", report.output.display());
/// ```
pub fn generate<P, Q, T>(input: P, output: Q, template_dir: T) -> Result<GenerateReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    T: AsRef<Path>,
{
    Generator::new(GenerateOptions::from_template_dir(template_dir)).generate(input, output)
}

/// Convert the body of a `.docx` file to JSON.
///
/// # Example
///
/// ```no_run
/// use docforge::{to_json, JsonFormat};
///
/// let json = to_json("body.docx", JsonFormat::Pretty).unwrap();
/// std::fs::write("body.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let docx = Docx::open(path)?;
    inspect::to_json(docx.document(), format)
}

/// Builder for generating documents.
///
/// # Example
///
/// ```no_run
/// use docforge::Docforge;
///
/// let report = Docforge::new()
///     .with_signature_template("sig.docx")
///     .with_content_template("title.docx")
///     .without_toc()
///     .generate("spec.md", "spec.docx")?;
/// # Ok::<(), docforge::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Docforge {
    options: GenerateOptions,
    pandoc: PandocConverter,
}

impl Docforge {
    /// Create a builder using the standard template names in the current directory.
    pub fn new() -> Self {
        Self {
            options: GenerateOptions::from_template_dir("."),
            pandoc: PandocConverter::new(),
        }
    }

    /// Use the standard template file names in a directory.
    pub fn with_template_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let from_dir = GenerateOptions::from_template_dir(dir);
        self.options.signature_template = from_dir.signature_template;
        self.options.content_template = from_dir.content_template;
        self
    }

    /// Set the signature page template.
    pub fn with_signature_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.signature_template = path.into();
        self
    }

    /// Set the title page template.
    pub fn with_content_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.content_template = path.into();
        self
    }

    /// Set the reference document for body conversion.
    pub fn with_reference_doc(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.reference_doc = Some(path.into());
        self
    }

    /// Set the chart table style name.
    pub fn with_chart_style(mut self, name: impl Into<String>) -> Self {
        self.options.style = self.options.style.with_chart_style(name);
        self
    }

    /// Set the list table style name.
    pub fn with_list_style(mut self, name: impl Into<String>) -> Self {
        self.options.style = self.options.style.with_list_style(name);
        self
    }

    /// Set the fallback style for tables without a marker.
    pub fn with_default_table_style(mut self, name: impl Into<String>) -> Self {
        self.options.style = self.options.style.with_default_table_style(name);
        self
    }

    /// Set the pandoc executable.
    pub fn with_pandoc(mut self, program: impl Into<PathBuf>) -> Self {
        self.pandoc = self.pandoc.with_program(program);
        self
    }

    /// Omit the table of contents.
    pub fn without_toc(mut self) -> Self {
        self.pandoc = self.pandoc.with_toc(false);
        self
    }

    /// Generation options built so far.
    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Build the generator.
    pub fn build(self) -> Generator {
        Generator::new(self.options).with_converter(self.pandoc)
    }

    /// Build the generator and generate one document.
    pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(self, input: P, output: Q) -> Result<GenerateReport> {
        self.build().generate(input, output)
    }
}

impl Default for Docforge {
    fn default() -> Self {
        Self::new()
    }
}
