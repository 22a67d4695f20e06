//! WordprocessingML writer.
//!
//! Property elements are emitted in schema order. Typed fields take the
//! slot of their element, verbatim properties fill the remaining slots in
//! source order.

use crate::model::{
    Block, CellProperties, Document, Inline, Paragraph, ParagraphProperties, RawProperty, Run,
    RunContent, RunProperties, Table, TableCell, TableLook, TableProperties, TableRow,
};

use super::reader::XmlRoot;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle",
    "rPr", "sectPr", "pPrChange",
];

const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath", "rPrChange",
];

const TBLPR_ORDER: &[&str] = &[
    "tblStyle", "tblpPr", "tblOverlap", "bidiVisual", "tblStyleRowBandSize",
    "tblStyleColBandSize", "tblW", "jc", "tblCellSpacing", "tblInd", "tblBorders", "shd",
    "tblLayout", "tblCellMar", "tblLook", "tblCaption", "tblDescription", "tblPrChange",
];

const TCPR_ORDER: &[&str] = &[
    "cnfStyle", "tcW", "gridSpan", "hMerge", "vMerge", "tcBorders", "shd", "noWrap", "tcMar",
    "textDirection", "tcFitText", "vAlign", "hideMark", "headers", "cellIns", "cellDel",
    "cellMerge", "tcPrChange",
];

/// Serialize a main document part.
pub fn write_document(root: &XmlRoot, doc: &Document) -> String {
    let mut out = String::with_capacity(4096);
    open_root(&mut out, root);
    for xml in &root.leading {
        out.push_str(xml);
    }
    out.push_str("<w:body>");
    write_blocks(&mut out, &doc.body);
    if let Some(section) = &doc.section {
        out.push_str(section);
    }
    out.push_str("</w:body>");
    close_root(&mut out, root);
    out
}

/// Serialize a story part (header, footer).
pub fn write_story(root: &XmlRoot, blocks: &[Block]) -> String {
    let mut out = String::with_capacity(1024);
    open_root(&mut out, root);
    write_blocks(&mut out, blocks);
    close_root(&mut out, root);
    out
}

fn open_root(out: &mut String, root: &XmlRoot) {
    out.push_str(XML_DECLARATION);
    out.push('<');
    out.push_str(&root.name);
    for (prefix, uri) in &root.namespaces {
        if prefix.is_empty() {
            out.push_str(&format!(" xmlns=\"{}\"", escape_attr(uri)));
        } else {
            out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape_attr(uri)));
        }
    }
    for (name, value) in &root.attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
    }
    out.push('>');
}

fn close_root(out: &mut String, root: &XmlRoot) {
    out.push_str("</");
    out.push_str(&root.name);
    out.push('>');
}

/// Serialize a sequence of blocks.
pub fn write_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        write_block(out, block);
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph(p) => write_paragraph(out, p),
        Block::Table(t) => write_table(out, t),
        Block::Raw { xml } => out.push_str(xml),
    }
}

/// Serialize a paragraph.
pub fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    out.push_str("<w:p>");
    write_paragraph_properties(out, &paragraph.properties);
    for inline in &paragraph.content {
        match inline {
            Inline::Run(run) => write_run(out, run),
            Inline::Raw { xml, .. } => out.push_str(xml),
        }
    }
    out.push_str("</w:p>");
}

fn write_paragraph_properties(out: &mut String, props: &ParagraphProperties) {
    if props.is_empty() {
        return;
    }
    out.push_str("<w:pPr>");
    write_ordered(out, PPR_ORDER, &props.extra, |out, name| match name {
        "pStyle" => props.style.as_ref().map(|s| val_element(out, "pStyle", s)).is_some(),
        "jc" => props
            .alignment
            .map(|a| val_element(out, "jc", a.as_xml()))
            .is_some(),
        _ => false,
    });
    out.push_str("</w:pPr>");
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str("<w:r>");
    write_run_properties(out, &run.properties);
    for content in &run.content {
        match content {
            RunContent::Text(text) => write_text(out, text),
            RunContent::Tab => out.push_str("<w:tab/>"),
            RunContent::Break => out.push_str("<w:br/>"),
            RunContent::Raw(xml) => out.push_str(xml),
        }
    }
    out.push_str("</w:r>");
}

fn write_text(out: &mut String, text: &str) {
    let mut segment = String::new();
    let flush = |out: &mut String, segment: &mut String| {
        if !segment.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escape_text(segment));
            out.push_str("</w:t>");
            segment.clear();
        }
    };

    for c in text.chars() {
        match c {
            '\t' => {
                flush(out, &mut segment);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush(out, &mut segment);
                out.push_str("<w:br/>");
            }
            '\r' => {}
            c => segment.push(c),
        }
    }
    flush(out, &mut segment);
}

fn write_run_properties(out: &mut String, props: &RunProperties) {
    if props.is_empty() {
        return;
    }
    out.push_str("<w:rPr>");
    write_ordered(out, RPR_ORDER, &props.extra, |out, name| match name {
        "rStyle" => props.style.as_ref().map(|s| val_element(out, "rStyle", s)).is_some(),
        "b" => props.bold.map(|b| toggle_element(out, "b", b)).is_some(),
        "i" => props.italic.map(|i| toggle_element(out, "i", i)).is_some(),
        "sz" => props
            .size
            .map(|s| val_element(out, "sz", &s.to_string()))
            .is_some(),
        _ => false,
    });
    out.push_str("</w:rPr>");
}

fn write_table(out: &mut String, table: &Table) {
    out.push_str("<w:tbl>");
    write_table_properties(out, &table.properties);

    out.push_str("<w:tblGrid>");
    if table.grid.is_empty() {
        for _ in 0..table.column_count() {
            out.push_str("<w:gridCol/>");
        }
    } else {
        for width in &table.grid {
            out.push_str(&format!("<w:gridCol w:w=\"{}\"/>", width));
        }
    }
    out.push_str("</w:tblGrid>");

    for row in &table.rows {
        write_row(out, row);
    }
    out.push_str("</w:tbl>");
}

fn write_table_properties(out: &mut String, props: &TableProperties) {
    out.push_str("<w:tblPr>");
    write_ordered(out, TBLPR_ORDER, &props.extra, |out, name| match name {
        "tblStyle" => props
            .style
            .as_ref()
            .map(|s| val_element(out, "tblStyle", s))
            .is_some(),
        "jc" => props
            .alignment
            .map(|a| val_element(out, "jc", a.as_xml()))
            .is_some(),
        "tblLook" => props.look.map(|l| write_table_look(out, &l)).is_some(),
        _ => false,
    });
    out.push_str("</w:tblPr>");
}

fn write_table_look(out: &mut String, look: &TableLook) {
    let flag = |b: bool| if b { "1" } else { "0" };
    out.push_str(&format!(
        "<w:tblLook w:val=\"{:04X}\" w:firstRow=\"{}\" w:lastRow=\"{}\" w:firstColumn=\"{}\" w:lastColumn=\"{}\" w:noHBand=\"{}\" w:noVBand=\"{}\"/>",
        look.val(),
        flag(look.first_row),
        flag(look.last_row),
        flag(look.first_column),
        flag(look.last_column),
        flag(look.no_h_band),
        flag(look.no_v_band),
    ));
}

fn write_row(out: &mut String, row: &TableRow) {
    out.push_str("<w:tr>");
    if let Some(props) = &row.properties {
        out.push_str(props);
    }
    for cell in &row.cells {
        write_cell(out, cell);
    }
    for xml in &row.raw_items {
        out.push_str(xml);
    }
    out.push_str("</w:tr>");
}

fn write_cell(out: &mut String, cell: &TableCell) {
    out.push_str("<w:tc>");
    write_cell_properties(out, &cell.properties);
    write_blocks(out, &cell.content);
    // A cell must end with a paragraph.
    if !matches!(cell.content.last(), Some(Block::Paragraph(_))) {
        out.push_str("<w:p/>");
    }
    out.push_str("</w:tc>");
}

fn write_cell_properties(out: &mut String, props: &CellProperties) {
    if props.width.is_none()
        && props.grid_span.is_none()
        && props.shading.is_none()
        && props.extra.is_empty()
    {
        return;
    }
    out.push_str("<w:tcPr>");
    write_ordered(out, TCPR_ORDER, &props.extra, |out, name| match name {
        "tcW" => props
            .width
            .map(|w| out.push_str(&format!("<w:tcW w:w=\"{}\" w:type=\"dxa\"/>", w)))
            .is_some(),
        "gridSpan" => props
            .grid_span
            .map(|s| val_element(out, "gridSpan", &s.to_string()))
            .is_some(),
        "shd" => props
            .shading
            .as_ref()
            .map(|fill| {
                out.push_str(&format!(
                    "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{}\"/>",
                    escape_attr(fill)
                ))
            })
            .is_some(),
        _ => false,
    });
    out.push_str("</w:tcPr>");
}

/// Emit property elements in schema order.
///
/// `typed` writes the typed field for a slot and reports whether it did;
/// a typed field shadows verbatim properties of the same name.
fn write_ordered(
    out: &mut String,
    order: &[&str],
    extra: &[RawProperty],
    mut typed: impl FnMut(&mut String, &str) -> bool,
) {
    for &name in order {
        if typed(&mut *out, name) {
            continue;
        }
        for prop in extra.iter().filter(|p| p.name == name) {
            out.push_str(&prop.xml);
        }
    }
    for prop in extra.iter().filter(|p| !order.contains(&p.name.as_str())) {
        out.push_str(&prop.xml);
    }
}

fn val_element(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!("<w:{} w:val=\"{}\"/>", name, escape_attr(value)));
}

fn toggle_element(out: &mut String, name: &str, on: bool) {
    if on {
        out.push_str(&format!("<w:{}/>", name));
    } else {
        out.push_str(&format!("<w:{} w:val=\"0\"/>", name));
    }
}

/// Escape character data.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape an attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::reader::read_document;
    use crate::model::{Alignment, TableCell};

    fn paragraph_xml(p: &Paragraph) -> String {
        let mut out = String::new();
        write_paragraph(&mut out, p);
        out
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr("\"x\""), "&quot;x&quot;");
    }

    #[test]
    fn test_text_splits_tabs_and_breaks() {
        let p = Paragraph::with_text("a\tb\nc");
        assert_eq!(
            paragraph_xml(&p),
            "<w:p><w:r><w:t xml:space=\"preserve\">a</w:t><w:tab/><w:t xml:space=\"preserve\">b</w:t><w:br/><w:t xml:space=\"preserve\">c</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_properties_in_schema_order() {
        let mut p = Paragraph::styled("x", "Note");
        p.properties.alignment = Some(Alignment::Center);
        p.properties.extra.push(RawProperty::new("rPr", "<w:rPr/>"));
        p.properties
            .extra
            .push(RawProperty::new("spacing", "<w:spacing w:after=\"0\"/>"));
        p.properties.extra.push(RawProperty::new("keepNext", "<w:keepNext/>"));

        let xml = paragraph_xml(&p);
        let pos = |needle: &str| xml.find(needle).unwrap();
        assert!(pos("w:pStyle") < pos("w:keepNext"));
        assert!(pos("w:keepNext") < pos("w:spacing"));
        assert!(pos("w:spacing") < pos("w:jc"));
        assert!(pos("w:jc") < pos("<w:rPr/>"));
    }

    #[test]
    fn test_typed_property_shadows_raw() {
        let mut p = Paragraph::styled("x", "New");
        p.properties
            .extra
            .push(RawProperty::new("pStyle", "<w:pStyle w:val=\"Old\"/>"));
        let xml = paragraph_xml(&p);
        assert!(xml.contains("w:val=\"New\""));
        assert!(!xml.contains("Old"));
    }

    #[test]
    fn test_cell_ends_with_paragraph() {
        let mut inner = Table::new();
        inner.add_row(TableRow::from_strings(["x"]));
        let cell = TableCell {
            content: vec![Block::Table(inner)],
            ..Default::default()
        };
        let mut out = String::new();
        write_cell(&mut out, &cell);
        assert!(out.ends_with("</w:tbl><w:p/></w:tc>"));
    }

    #[test]
    fn test_table_look_written_both_ways() {
        let mut out = String::new();
        write_table_look(&mut out, &TableLook::list());
        assert!(out.contains("w:val=\"0420\""));
        assert!(out.contains("w:firstRow=\"1\""));
        assert!(out.contains("w:firstColumn=\"0\""));
        assert!(out.contains("w:noVBand=\"1\""));
    }

    #[test]
    fn test_document_round_trip() {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body><w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Hello &amp; welcome</w:t></w:r><w:bookmarkStart w:id="0" w:name="x"/></w:p><w:tbl><w:tblPr><w:tblStyle w:val="Table"/></w:tblPr><w:tblGrid><w:gridCol w:w="100"/></w:tblGrid><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl><w:sectPr/></w:body></w:document>"#,
            crate::docx::W_NS
        );
        let (root, doc) = read_document(&xml, "doc").unwrap();
        let written = write_document(&root, &doc);
        let (root2, doc2) = read_document(&written, "doc").unwrap();

        assert_eq!(root, root2);
        assert_eq!(doc, doc2);
        assert!(written.contains("Hello &amp; welcome"));
    }
}
