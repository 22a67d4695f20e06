//! End-to-end document generation.
//!
//! A generated document is assembled from four parts, in order:
//!
//! 1. the signature page, rendered from the signature template,
//! 2. the revision history table,
//! 3. the title page, rendered from the content template,
//! 4. the Markdown body, converted and then post-processed for style markers.
//!
//! The body is converted with the signature template as reference document
//! so that every part shares one set of style definitions.

use crate::compose::Composer;
use crate::convert::{BodyConverter, PandocConverter};
use crate::docx::Docx;
use crate::error::{Error, Result};
use crate::frontmatter;
use crate::revision;
use crate::style::{self, StyleOptions, StyleReport};
use crate::template;
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the signature page template.
pub const SIGNATURE_TEMPLATE: &str = "TEMPLATE_Word_Signature.docx";

/// File name of the title page template.
pub const CONTENT_TEMPLATE: &str = "TEMPLATE_Word_Content.docx";

/// Options for document generation.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Signature page template
    pub signature_template: PathBuf,

    /// Title page template
    pub content_template: PathBuf,

    /// Reference document for body conversion (defaults to the signature template)
    pub reference_doc: Option<PathBuf>,

    /// Style post-processing options
    pub style: StyleOptions,
}

impl GenerateOptions {
    /// Create options with explicit template paths.
    pub fn new(signature_template: impl Into<PathBuf>, content_template: impl Into<PathBuf>) -> Self {
        Self {
            signature_template: signature_template.into(),
            content_template: content_template.into(),
            reference_doc: None,
            style: StyleOptions::default(),
        }
    }

    /// Create options using the standard template file names in a directory.
    pub fn from_template_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(SIGNATURE_TEMPLATE), dir.join(CONTENT_TEMPLATE))
    }

    /// Set the reference document used for body conversion.
    pub fn with_reference_doc(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_doc = Some(path.into());
        self
    }

    /// Set style post-processing options.
    pub fn with_style_options(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }

    /// Reference document for body conversion.
    pub fn reference_doc(&self) -> &Path {
        self.reference_doc
            .as_deref()
            .unwrap_or(self.signature_template.as_path())
    }
}

/// A stage of generation, reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reading the Markdown source
    FrontMatter,
    /// Rendering the signature page
    Signature,
    /// Building the revision history
    Revisions,
    /// Rendering the title page
    Title,
    /// Converting the Markdown body
    Body,
    /// Applying style markers to the body
    Styles,
    /// Assembling and saving the document
    Compose,
}

impl Step {
    /// All steps in execution order.
    pub const ALL: [Step; 7] = [
        Step::FrontMatter,
        Step::Signature,
        Step::Revisions,
        Step::Title,
        Step::Body,
        Step::Styles,
        Step::Compose,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Step::FrontMatter => "Reading front matter",
            Step::Signature => "Rendering signature page",
            Step::Revisions => "Building revision history",
            Step::Title => "Rendering title page",
            Step::Body => "Converting body",
            Step::Styles => "Applying style markers",
            Step::Compose => "Composing document",
        };
        f.write_str(text)
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    /// Path of the generated document
    pub output: PathBuf,

    /// Front matter keys found in the source
    pub metadata_keys: Vec<String>,

    /// Number of revision records
    pub revisions: usize,

    /// Placeholders substituted across both templates
    pub placeholders: usize,

    /// Style post-processing outcome
    pub style: StyleReport,

    /// Non-fatal problems besides style warnings
    pub warnings: Vec<String>,
}

impl GenerateReport {
    /// Check if the run produced no warnings of any kind.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.style.is_clean()
    }
}

/// Generates Word documents from Markdown sources.
pub struct Generator {
    options: GenerateOptions,
    converter: Box<dyn BodyConverter>,
}

impl Generator {
    /// Create a generator converting bodies with pandoc.
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            converter: Box::new(PandocConverter::new()),
        }
    }

    /// Replace the body converter.
    pub fn with_converter(mut self, converter: impl BodyConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Get the generation options.
    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Get the body converter.
    pub fn converter(&self) -> &dyn BodyConverter {
        self.converter.as_ref()
    }

    /// Generate `output` from the Markdown file `input`.
    pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<GenerateReport> {
        self.generate_with_progress(input, output, |_| {})
    }

    /// Generate `output` from `input`, calling `progress` before each step.
    pub fn generate_with_progress<P, Q, F>(
        &self,
        input: P,
        output: Q,
        mut progress: F,
    ) -> Result<GenerateReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        F: FnMut(Step),
    {
        let input = input.as_ref();
        let output = output.as_ref();
        self.validate(input)?;

        progress(Step::FrontMatter);
        let source = frontmatter::read_file(input)?;
        let metadata = source.metadata;
        let mut warnings = Vec::new();
        let missing = metadata.missing_fields();
        if !missing.is_empty() {
            let warning = format!("Front matter has no value for: {}", missing.join(", "));
            log::warn!("{}", warning);
            warnings.push(warning);
        }
        log::info!(
            "Read {} ({} metadata keys, {} revisions)",
            input.display(),
            metadata.keys().len(),
            metadata.revisions.len()
        );

        progress(Step::Signature);
        let mut signature = Docx::open(&self.options.signature_template)?;
        let mut placeholders = template::render(&mut signature, &metadata)?;
        log::info!("Rendered signature page");

        progress(Step::Revisions);
        let revisions = revision::revision_part(&metadata.revisions)?;
        log::info!("Built revision history ({} records)", metadata.revisions.len());

        progress(Step::Title);
        let mut title = Docx::open(&self.options.content_template)?;
        placeholders += template::render(&mut title, &metadata)?;
        log::info!("Rendered title page");

        progress(Step::Body);
        let work_dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let scratch = tempfile::Builder::new()
            .prefix(".docforge-")
            .tempdir_in(&work_dir)?;
        let body_path = scratch.path().join("body.docx");
        self.converter
            .convert(&source.body, &body_path, Some(self.options.reference_doc()))?;
        if !body_path.exists() {
            return Err(Error::Converter(format!(
                "{} produced no output",
                self.converter.name()
            )));
        }
        log::info!("Converted body with {}", self.converter.name());

        progress(Step::Styles);
        let style_report = style::apply_styles(&body_path, &self.options.style)?;
        let body = Docx::open(&body_path)?;

        progress(Step::Compose);
        let mut composer = Composer::new(signature);
        composer.append(revisions)?;
        composer.append(title)?;
        composer.append(body)?;
        let mut document = composer.into_docx();
        document.set_modified(Utc::now())?;
        document.save(output)?;
        log::info!("Saved {}", output.display());

        Ok(GenerateReport {
            output: output.to_path_buf(),
            metadata_keys: metadata.keys(),
            revisions: metadata.revisions.len(),
            placeholders,
            style: style_report,
            warnings,
        })
    }

    fn validate(&self, input: &Path) -> Result<()> {
        if !input.exists() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }
        for template in [
            &self.options.signature_template,
            &self.options.content_template,
        ] {
            if !template.exists() {
                return Err(Error::TemplateNotFound(template.clone()));
            }
        }
        if let Some(reference) = &self.options.reference_doc {
            if !reference.exists() {
                return Err(Error::TemplateNotFound(reference.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("options", &self.options)
            .field("converter", &self.converter.name())
            .finish()
    }
}
