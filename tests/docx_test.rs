//! Integration tests for the DOCX codec.

use chrono::{TimeZone, Utc};
use docforge::docx::{Docx, Package, R_NS, W_NS};
use docforge::model::{Inline, Paragraph, Run, StyleDefinition, StyleKind};
use docforge::Error;
use tempfile::tempdir;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn body_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml"><w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/><w:spacing w:before="240"/></w:pPr><w:r><w:t>Scope</w:t></w:r></w:p><w:p><w:r><w:rPr><w:b/><w:i/><w:sz w:val="28"/><w:color w:val="FF0000"/></w:rPr><w:t xml:space="preserve">Bold &amp; red </w:t></w:r><w:hyperlink r:id="rId9"><w:r><w:t>here</w:t></w:r></w:hyperlink></w:p><w:sdt><w:sdtContent><w:p><w:r><w:t>control</w:t></w:r></w:p></w:sdtContent></w:sdt><w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr><w:tblGrid><w:gridCol w:w="2000"/></w:tblGrid><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
    )
}

fn sample_package() -> Package {
    let blank = Docx::blank().unwrap();
    let mut package = blank.package().clone();
    package.set_part("word/document.xml", body_xml().into_bytes());
    package.set_part("word/media/image1.png", PNG.to_vec());
    package.set_part(
        "customXml/item1.xml",
        b"<?xml version=\"1.0\"?><data><value>42</value></data>".to_vec(),
    );
    package.set_part(
        "docProps/core.xml",
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dcterms:modified xsi:type="dcterms:W3CDTF">2020-01-01T00:00:00Z</dcterms:modified></cp:coreProperties>"#
            .to_vec(),
    );
    package
}

#[test]
fn test_round_trip_preserves_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("round.docx");

    let mut docx = Docx::from_bytes(&sample_package().to_bytes().unwrap()).unwrap();
    docx.save(&path).unwrap();
    let reopened = Docx::open(&path).unwrap();

    assert_eq!(reopened.document(), docx.document());

    let doc = reopened.document();
    let texts: Vec<String> = doc.paragraphs().map(|p| p.text()).collect();
    assert_eq!(texts, vec!["Scope", "Bold & red here"]);
    assert_eq!(doc.table_count(), 1);
    assert_eq!(doc.body.len(), 4);

    let heading = doc.paragraphs().next().unwrap();
    assert_eq!(heading.style(), Some("Heading1"));
    assert_eq!(heading.properties.extra[0].name, "spacing");

    let formatted = doc.paragraphs().nth(1).unwrap();
    let run = formatted.first_run().unwrap();
    assert_eq!(run.properties.bold, Some(true));
    assert_eq!(run.properties.italic, Some(true));
    assert_eq!(run.properties.size, Some(28));
    assert_eq!(run.properties.extra[0].name, "color");
    assert!(matches!(
        &formatted.content[1],
        Inline::Raw { xml, text } if xml.contains(r#"r:id="rId9""#) && text == "here"
    ));

    assert!(doc.section.as_deref().unwrap().contains("11906"));
}

#[test]
fn test_round_trip_preserves_other_parts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("parts.docx");

    let mut docx = Docx::from_bytes(&sample_package().to_bytes().unwrap()).unwrap();
    docx.save(&path).unwrap();
    let reopened = Docx::open(&path).unwrap();

    let package = reopened.package();
    assert_eq!(package.part("word/media/image1.png"), Some(PNG));
    assert_eq!(
        package.part_text("customXml/item1.xml").unwrap().as_deref(),
        Some("<?xml version=\"1.0\"?><data><value>42</value></data>")
    );
    let xml = package.part_text("word/document.xml").unwrap().unwrap();
    assert!(xml.contains("xmlns:w14="));
    assert!(xml.contains("<w:sdt>"));
    assert_eq!(reopened.styles().len(), docx.styles().len());
}

#[test]
fn test_edits_survive_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("edited.docx");

    let mut docx = Docx::blank().unwrap();
    docx.add_styles(&[StyleDefinition {
        id: "Note".into(),
        name: Some("Note".into()),
        kind: StyleKind::Paragraph,
        xml: r#"<w:style w:type="paragraph" w:styleId="Note"><w:name w:val="Note"/></w:style>"#
            .into(),
    }])
    .unwrap();

    let mut p = Paragraph::styled("Remember", "Note");
    p.add_run(Run::bold(" this").size_pt(12));
    docx.document_mut().add_paragraph(p);
    docx.save(&path).unwrap();

    let reopened = Docx::open(&path).unwrap();
    let p = reopened.document().paragraphs().next().unwrap();
    assert_eq!(p.text(), "Remember this");
    assert_eq!(p.style(), Some("Note"));
    assert_eq!(p.runs().nth(1).unwrap().properties.size, Some(24));
    assert_eq!(reopened.styles().display_name("Note"), "Note");
}

#[test]
fn test_set_modified() {
    let mut docx = Docx::from_bytes(&sample_package().to_bytes().unwrap()).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap();
    docx.set_modified(at).unwrap();

    let core = docx.package().part_text("docProps/core.xml").unwrap().unwrap();
    assert!(core.contains(">2024-03-05T10:30:00Z</dcterms:modified>"));
    assert!(!core.contains("2020-01-01"));
}

#[test]
fn test_open_errors() {
    assert!(Docx::open("/nonexistent/file.docx").is_err());

    let dir = tempdir().unwrap();
    let path = dir.path().join("not-a-zip.docx");
    std::fs::write(&path, b"plain text").unwrap();
    assert!(matches!(Docx::open(&path), Err(Error::Zip(_))));
}
