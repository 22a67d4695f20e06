//! Markdown body conversion.
//!
//! The body of a source is turned into a Word fragment by an external
//! converter. The fragment is then post-processed by [`crate::style`], so a
//! converter only has to keep style marker text as ordinary paragraphs.
//!
//! # Example
//!
//! ```no_run
//! use docforge::convert::{BodyConverter, PandocConverter};
//! use std::path::Path;
//!
//! fn main() -> docforge::Result<()> {
//!     let converter = PandocConverter::new().with_toc(false);
//!     converter.convert("# Scope\n", Path::new("body.docx"), None)?;
//!     Ok(())
//! }
//! ```

mod pandoc;

pub use pandoc::{PandocConverter, DEFAULT_TOC_DEPTH, MARKDOWN_FORMAT};

use crate::error::Result;
use std::path::Path;

/// Trait for Markdown-to-Word converters.
///
/// Implement this trait to plug in a different conversion backend, or a
/// stand-in for tests.
pub trait BodyConverter: Send + Sync {
    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert Markdown to a `.docx` file at `output`.
    ///
    /// When `reference` is given, the output takes its styles from that
    /// document.
    fn convert(&self, markdown: &str, output: &Path, reference: Option<&Path>) -> Result<()>;
}

impl<C: BodyConverter + ?Sized> BodyConverter for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn convert(&self, markdown: &str, output: &Path, reference: Option<&Path>) -> Result<()> {
        (**self).convert(markdown, output, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    impl BodyConverter for Named {
        fn name(&self) -> &str {
            "named"
        }

        fn convert(&self, _markdown: &str, _output: &Path, _reference: Option<&Path>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_boxed_converter() {
        let boxed: Box<dyn BodyConverter> = Box::new(Named);
        assert_eq!(boxed.name(), "named");
        assert!(boxed.convert("", Path::new("x.docx"), None).is_ok());
    }
}
