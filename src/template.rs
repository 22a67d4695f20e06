//! `{{ field }}` substitution in Word templates.
//!
//! Placeholders are matched over the concatenated text of a paragraph's
//! runs, so a placeholder Word split across several runs is still found.
//! The replacement is written into the run where the placeholder starts and
//! keeps that run's formatting.

use crate::docx::Docx;
use crate::error::{Error, Result};
use crate::frontmatter::Metadata;
use crate::model::{visit_paragraphs_in, Inline, Paragraph, RunContent};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][\w.]*)\s*\}\}").unwrap())
}

/// Open a template file and render it.
pub fn render_file<P: AsRef<Path>>(path: P, metadata: &Metadata) -> Result<Docx> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::TemplateNotFound(path.to_path_buf()));
    }
    let mut docx = Docx::open(path)?;
    let count = render(&mut docx, metadata)?;
    log::debug!("Rendered {} placeholders in {}", count, path.display());
    Ok(docx)
}

/// Substitute placeholders in the body, headers and footers of a document.
///
/// Returns the number of placeholders replaced. Unknown fields render as
/// empty text.
pub fn render(docx: &mut Docx, metadata: &Metadata) -> Result<usize> {
    let mut count = 0;
    docx.document_mut()
        .visit_paragraphs_mut(&mut |p| count += render_paragraph(p, metadata));

    for part in docx.header_footer_parts() {
        let (root, mut blocks) = docx.read_story(&part)?;
        let mut replaced = 0;
        visit_paragraphs_in(&mut blocks, &mut |p| replaced += render_paragraph(p, metadata));
        if replaced > 0 {
            docx.write_story(&part, &root, &blocks);
            count += replaced;
        }
    }

    Ok(count)
}

struct Segment {
    inline: usize,
    content: usize,
    start: usize,
    end: usize,
}

/// Substitute placeholders in one paragraph and return how many were replaced.
pub fn render_paragraph(paragraph: &mut Paragraph, metadata: &Metadata) -> usize {
    let mut full = String::new();
    let mut segments = Vec::new();

    for (i, inline) in paragraph.content.iter().enumerate() {
        let Inline::Run(run) = inline else {
            full.push('\0');
            continue;
        };
        for (j, content) in run.content.iter().enumerate() {
            match content {
                RunContent::Text(text) => {
                    let start = full.len();
                    full.push_str(text);
                    segments.push(Segment {
                        inline: i,
                        content: j,
                        start,
                        end: full.len(),
                    });
                }
                _ => full.push('\0'),
            }
        }
    }

    if !full.contains("{{") {
        return 0;
    }

    let matches: Vec<(usize, usize, String)> = placeholder_re()
        .captures_iter(&full)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let path = caps.get(1)?.as_str();
            let value = metadata.lookup(path).unwrap_or_else(|| {
                log::debug!("No value for template field '{}'", path);
                String::new()
            });
            Some((whole.start(), whole.end(), value))
        })
        .collect();

    for (start, end, value) in matches.iter().rev() {
        let (start, end) = (*start, *end);
        for seg in segments.iter().filter(|s| s.start < end && s.end > start) {
            let Some(Inline::Run(run)) = paragraph.content.get_mut(seg.inline) else {
                continue;
            };
            let Some(RunContent::Text(text)) = run.content.get_mut(seg.content) else {
                continue;
            };

            let from = start.saturating_sub(seg.start);
            let to = (end - seg.start).min(text.len());
            let mut replaced = String::with_capacity(text.len() + value.len());
            replaced.push_str(&text[..from]);
            if seg.start <= start {
                replaced.push_str(value);
            }
            replaced.push_str(&text[to..]);
            *text = replaced;
        }
    }

    matches.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse_metadata;
    use crate::model::Run;

    fn metadata() -> Metadata {
        parse_metadata("title: Pump Spec\ndoc_number: MAP-7\nowner:\n  name: QA\n").unwrap()
    }

    #[test]
    fn test_single_run() {
        let mut p = Paragraph::with_text("Doc {{ doc_number }}: {{title}}");
        assert_eq!(render_paragraph(&mut p, &metadata()), 2);
        assert_eq!(p.text(), "Doc MAP-7: Pump Spec");
    }

    #[test]
    fn test_placeholder_split_across_runs() {
        let mut p = Paragraph::new();
        p.add_run(Run::bold("Title: {{ ti"));
        p.add_text("tle }} (");
        p.add_text("{{owner.name}})");

        assert_eq!(render_paragraph(&mut p, &metadata()), 2);
        assert_eq!(p.text(), "Title: Pump Spec (QA)");
        assert_eq!(p.runs().next().unwrap().text(), "Title: Pump Spec");
        assert_eq!(p.runs().next().unwrap().properties.bold, Some(true));
    }

    #[test]
    fn test_missing_field_is_empty() {
        let mut p = Paragraph::with_text("[{{ approver }}]");
        assert_eq!(render_paragraph(&mut p, &metadata()), 1);
        assert_eq!(p.text(), "[]");
    }

    #[test]
    fn test_no_placeholders() {
        let mut p = Paragraph::with_text("plain { text }");
        assert_eq!(render_paragraph(&mut p, &metadata()), 0);
        assert_eq!(p.text(), "plain { text }");
    }

    #[test]
    fn test_placeholder_does_not_cross_raw_inline() {
        let mut p = Paragraph::new();
        p.add_text("{{ ti");
        p.add_raw("<w:bookmarkStart w:id=\"0\" w:name=\"b\"/>", "");
        p.add_text("tle }}");
        assert_eq!(render_paragraph(&mut p, &metadata()), 0);
    }

    #[test]
    fn test_render_missing_template() {
        assert!(matches!(
            render_file("/nonexistent/template.docx", &metadata()),
            Err(Error::TemplateNotFound(_))
        ));
    }
}
