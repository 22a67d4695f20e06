//! Error types for docforge library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docforge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or post-processing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a readable zip package.
    #[error("Package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML.
    #[error("XML error in {part}: {message}")]
    Xml {
        /// Part name inside the package
        part: String,
        /// Parser message
        message: String,
    },

    /// A part required to read the document is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// YAML front matter could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Front matter is structurally invalid.
    #[error("Front matter error: {0}")]
    FrontMatter(String),

    /// A style name is not defined in the document's style sheet.
    #[error("Style '{0}' is not defined in the document")]
    StyleNotFound(String),

    /// A style exists but cannot be used on the target element.
    #[error("Style '{name}' is a {actual} style, expected a {expected} style")]
    StyleKindMismatch {
        /// Requested style name
        name: String,
        /// Kind the target needs
        expected: String,
        /// Kind found in the style sheet
        actual: String,
    },

    /// A paragraph index does not exist in the document.
    #[error("Paragraph {0} is out of range (document has {1} paragraphs)")]
    ParagraphOutOfRange(usize, usize),

    /// A table handle does not point at a table.
    #[error("No table at body position {0}")]
    TableNotFound(usize),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(String),

    /// A template file does not exist.
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The Markdown input does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The body converter failed.
    #[error("Conversion failed: {0}")]
    Converter(String),

    /// The body converter program could not be started.
    #[error("Converter program not found: {0}")]
    ConverterNotFound(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an XML error for the given part.
    pub fn xml(part: impl Into<String>, message: impl ToString) -> Self {
        Error::Xml {
            part: part.into(),
            message: message.to_string(),
        }
    }
}
