//! Pandoc-backed body converter.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::BodyConverter;

/// Pandoc input format: Markdown with the extensions the sources rely on.
pub const MARKDOWN_FORMAT: &str =
    "markdown+smart+backtick_code_blocks+fenced_code_attributes+raw_html";

/// Default table of contents depth.
pub const DEFAULT_TOC_DEPTH: u8 = 6;

/// Converts Markdown by running `pandoc`.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    toc: bool,
    toc_depth: u8,
    extra_args: Vec<String>,
}

impl PandocConverter {
    /// Create a converter running `pandoc` from `PATH`, with a table of contents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pandoc executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Enable or disable the table of contents.
    pub fn with_toc(mut self, toc: bool) -> Self {
        self.toc = toc;
        self
    }

    /// Set the table of contents depth (1-9).
    pub fn with_toc_depth(mut self, depth: u8) -> Self {
        self.toc_depth = depth.clamp(1, 9);
        self
    }

    /// Append an extra command-line argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// The pandoc executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for one conversion.
    pub fn args(&self, input: &Path, output: &Path, reference: Option<&Path>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.into(),
            "-o".into(),
            output.into(),
            "--standalone".into(),
        ];
        if self.toc {
            args.push("--toc".into());
            args.push(format!("--toc-depth={}", self.toc_depth).into());
        }
        args.push(format!("--from={}", MARKDOWN_FORMAT).into());
        args.push("--wrap=preserve".into());
        if let Some(reference) = reference {
            args.push("--reference-doc".into());
            args.push(reference.into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pandoc"),
            toc: true,
            toc_depth: DEFAULT_TOC_DEPTH,
            extra_args: Vec::new(),
        }
    }
}

impl BodyConverter for PandocConverter {
    fn name(&self) -> &str {
        "pandoc"
    }

    fn convert(&self, markdown: &str, output: &Path, reference: Option<&Path>) -> Result<()> {
        let dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut input = tempfile::Builder::new()
            .prefix("docforge-body-")
            .suffix(".md")
            .tempfile_in(&dir)?;
        input.write_all(markdown.as_bytes())?;
        input.flush()?;

        let args = self.args(input.path(), output, reference);
        log::debug!("Running {} with {} arguments", self.program.display(), args.len());

        let result = Command::new(&self.program).args(&args).output();
        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ConverterNotFound(self.program.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(Error::Converter(if stderr.is_empty() {
                format!("pandoc exited with {}", out.status)
            } else {
                stderr
            }));
        }
        Ok(())
    }
}
