//! Integration tests for document generation with a stand-in converter.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docforge::model::{Block, Paragraph, StyleDefinition, StyleKind, Table, TableRow};
use docforge::{
    revision, BodyConverter, Docx, Error, GenerateOptions, Generator, Result, Step, StyleOptions,
};
use tempfile::{tempdir, TempDir};

const SOURCE: &str = r#"---
title: Pump Controller
author: Jane Doe
department: R&D
doc_number: DOC-042
current_revision: B
regulatory_rep: A. Reg
quality_rep: Q. Lead
department_head: H. Ead
revisions:
  - number: A
    description: Initial release
    eco_number: ECO-1
    eco_date: 2024-01-10
  - number: B
    description: Added alarms
    eco_number: ECO-7
    eco_date: 2024-06-02
---
intro
@@@TABLE_STYLE:Chart@@@
[table]
@@@STYLE:Note@@@
line A
line B@@@END_STYLE@@@
outro
"#;

#[derive(Default)]
struct Seen {
    markdown: String,
    reference: Option<PathBuf>,
}

/// Turns each non-empty line into a paragraph and `[table]` into a table.
struct MockConverter {
    seen: Arc<Mutex<Seen>>,
}

impl BodyConverter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    fn convert(&self, markdown: &str, output: &Path, reference: Option<&Path>) -> Result<()> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.markdown = markdown.to_string();
            seen.reference = reference.map(Path::to_path_buf);
        }

        let mut docx = Docx::blank()?;
        docx.add_styles(&[
            definition("Chart", StyleKind::Table),
            definition("List", StyleKind::Table),
            definition("Note", StyleKind::Paragraph),
        ])?;
        let doc = docx.document_mut();
        for line in markdown.lines().filter(|l| !l.trim().is_empty()) {
            if line == "[table]" {
                let mut table = Table::new();
                table.add_row(TableRow::from_strings(["Signal", "Range"]));
                table.add_row(TableRow::from_strings(["Pressure", "0-10 bar"]));
                doc.add_table(table);
            } else {
                doc.add_paragraph(Paragraph::with_text(line));
            }
        }
        docx.save(output)
    }
}

/// Succeeds without writing anything.
struct SilentConverter;

impl BodyConverter for SilentConverter {
    fn name(&self) -> &str {
        "silent"
    }

    fn convert(&self, _markdown: &str, _output: &Path, _reference: Option<&Path>) -> Result<()> {
        Ok(())
    }
}

fn definition(id: &str, kind: StyleKind) -> StyleDefinition {
    StyleDefinition {
        id: id.to_string(),
        name: Some(id.to_string()),
        kind,
        xml: format!(
            r#"<w:style w:type="{}" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
            kind, id, id
        ),
    }
}

fn template(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let mut docx = Docx::blank().unwrap();
    for line in lines {
        docx.document_mut().add_paragraph(Paragraph::with_text(*line));
    }
    let path = dir.join(name);
    docx.save(&path).unwrap();
    path
}

struct Fixture {
    dir: TempDir,
    options: GenerateOptions,
}

impl Fixture {
    fn new(source: &str) -> Self {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("source.md"), source).unwrap();
        let signature = template(dir.path(), "signature.docx", &["Signed: {{ author }}"]);
        let content = template(
            dir.path(),
            "content.docx",
            &["{{ title }}", "Document {{ doc_number }}"],
        );
        Self {
            options: GenerateOptions::new(signature, content),
            dir,
        }
    }

    fn input(&self) -> PathBuf {
        self.dir.path().join("source.md")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out").join("document.docx")
    }
}

#[test]
fn test_generate_composes_parts_in_order() {
    let fixture = Fixture::new(SOURCE);
    fs::create_dir_all(fixture.output().parent().unwrap()).unwrap();
    let seen = Arc::new(Mutex::new(Seen::default()));
    let generator = Generator::new(fixture.options.clone()).with_converter(MockConverter {
        seen: Arc::clone(&seen),
    });

    let report = generator.generate(fixture.input(), fixture.output()).unwrap();

    assert_eq!(report.output, fixture.output());
    assert_eq!(report.revisions, 2);
    assert_eq!(report.placeholders, 3);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(report.style.is_clean(), "{:?}", report.style.warnings);
    assert_eq!(report.style.explicit_tables, 1);

    let seen = seen.lock().unwrap();
    assert!(seen.markdown.starts_with("intro\n"));
    assert!(!seen.markdown.contains("doc_number"));
    assert_eq!(seen.reference.as_deref(), Some(fixture.options.signature_template.as_path()));

    let docx = Docx::open(fixture.output()).unwrap();
    let body = &docx.document().body;
    let summary: Vec<String> = body
        .iter()
        .map(|block| match block {
            Block::Paragraph(p) => p.text(),
            Block::Table(t) if t.text().contains(revision::TITLE) => "<revisions>".to_string(),
            Block::Table(t) => format!("<table:{}>", t.style().unwrap_or_default()),
            Block::Raw { .. } => "<raw>".to_string(),
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            "Signed: Jane Doe",
            "<revisions>",
            "Pump Controller",
            "Document DOC-042",
            "intro",
            "<table:Chart>",
            "line A",
            "line B",
            "outro",
        ]
    );

    let revisions = docx.document().tables().next().unwrap();
    assert_eq!(revisions.row_count(), 4);
    assert!(revisions.text().contains("Added alarms"));

    let styled: Vec<_> = docx
        .document()
        .paragraphs()
        .filter(|p| p.style() == Some("Note"))
        .map(|p| p.text())
        .collect();
    assert_eq!(styled, vec!["line A", "line B"]);
    assert!(docx.styles().by_id("Chart").is_some());
    assert!(docx.styles().by_id("Note").is_some());
}

#[test]
fn test_progress_reports_every_step() {
    let fixture = Fixture::new(SOURCE);
    let generator = Generator::new(fixture.options.clone()).with_converter(MockConverter {
        seen: Arc::default(),
    });

    let mut steps = Vec::new();
    let output = fixture.dir.path().join("progress.docx");
    generator
        .generate_with_progress(fixture.input(), &output, |step| steps.push(step))
        .unwrap();

    assert_eq!(steps, Step::ALL.to_vec());
}

#[test]
fn test_missing_metadata_is_a_warning() {
    let fixture = Fixture::new("---\ntitle: Only a title\n---\nbody text\n");
    let generator = Generator::new(fixture.options.clone()).with_converter(MockConverter {
        seen: Arc::default(),
    });
    let output = fixture.dir.path().join("partial.docx");

    let report = generator.generate(fixture.input(), &output).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("author"));
    assert!(!report.warnings[0].contains("title"));

    let docx = Docx::open(&output).unwrap();
    let texts: Vec<String> = docx.document().paragraphs().map(|p| p.text()).collect();
    assert_eq!(texts[0], "Signed: ");
    assert!(texts.contains(&revision::EMPTY_TEXT.to_string()));
    assert_eq!(texts.last().map(String::as_str), Some("body text"));
}

#[test]
fn test_converter_without_output() {
    let fixture = Fixture::new(SOURCE);
    let generator = Generator::new(fixture.options.clone()).with_converter(SilentConverter);
    let output = fixture.dir.path().join("never.docx");

    let result = generator.generate(fixture.input(), &output);

    assert!(matches!(result, Err(Error::Converter(msg)) if msg.contains("silent")));
    assert!(!output.exists());
    let leftovers: Vec<_> = fs::read_dir(fixture.dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".docforge-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_style_options_are_applied() {
    let fixture = Fixture::new("---\ntitle: T\n---\n[table]\n");
    let options = fixture
        .options
        .clone()
        .with_style_options(StyleOptions::new().with_default_table_style("Chart"));
    let generator = Generator::new(options).with_converter(MockConverter {
        seen: Arc::default(),
    });
    let output = fixture.dir.path().join("chart.docx");

    let report = generator.generate(fixture.input(), &output).unwrap();

    assert_eq!(report.style.default_tables, 1);
    let docx = Docx::open(&output).unwrap();
    let styles: Vec<_> = docx
        .document()
        .tables()
        .filter_map(|t| t.style())
        .map(str::to_string)
        .collect();
    assert_eq!(styles.last().map(String::as_str), Some("Chart"));
}
