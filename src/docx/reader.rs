//! WordprocessingML reader.
//!
//! Parses `document.xml` and story parts (headers, footers) into the
//! document model. Elements the model does not interpret are captured as
//! slices of the source text, so writing them back is lossless.

use crate::error::{Error, Result};
use crate::model::{
    Alignment, Block, CellProperties, Document, Inline, Paragraph, ParagraphProperties,
    RawProperty, Run, RunContent, RunProperties, Table, TableCell, TableLook, TableProperties,
    TableRow,
};
use roxmltree::Node;

use super::W_NS;

/// Opening tag information of a part's root element.
///
/// Namespace declarations must be written back unchanged, since verbatim
/// XML slices reference their prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlRoot {
    /// Qualified element name (e.g. `w:document`)
    pub name: String,

    /// Namespace declarations as (prefix, uri); an empty prefix is the default namespace
    pub namespaces: Vec<(String, String)>,

    /// Other attributes as (qualified name, value)
    pub attributes: Vec<(String, String)>,

    /// Root children before the body, kept verbatim
    pub leading: Vec<String>,
}

impl XmlRoot {
    /// Root of a new main document part.
    pub fn document() -> Self {
        let mut root = Self {
            name: "w:document".to_string(),
            ..Default::default()
        };
        root.ensure_namespace("w", W_NS);
        root.ensure_namespace("r", super::R_NS);
        root
    }

    /// Declare a namespace unless the prefix is already bound.
    pub fn ensure_namespace(&mut self, prefix: &str, uri: &str) {
        if !self.namespaces.iter().any(|(p, _)| p == prefix) {
            self.namespaces.push((prefix.to_string(), uri.to_string()));
        }
    }

    /// Add every namespace declaration of `other` that is missing here.
    ///
    /// `mc:Ignorable` prefixes are merged as well, so that content copied
    /// from `other` keeps its markup-compatibility semantics.
    pub fn merge_namespaces(&mut self, other: &XmlRoot) {
        for (prefix, uri) in &other.namespaces {
            self.ensure_namespace(prefix, uri);
        }

        let Some(theirs) = other.ignorable() else {
            return;
        };
        let mut ignorable: Vec<String> = self
            .ignorable()
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        for prefix in theirs.split_whitespace() {
            if !ignorable.iter().any(|p| p == prefix) {
                ignorable.push(prefix.to_string());
            }
        }
        let value = ignorable.join(" ");
        match self.attributes.iter_mut().find(|(n, _)| n == "mc:Ignorable") {
            Some((_, v)) => *v = value,
            None => self.attributes.push(("mc:Ignorable".to_string(), value)),
        }
    }

    fn ignorable(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == "mc:Ignorable")
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a main document part.
pub fn read_document(xml: &str, part: &str) -> Result<(XmlRoot, Document)> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::xml(part, e))?;
    let src = doc.input_text();
    let root = doc.root_element();

    let mut xml_root = read_root(root);
    let mut body = None;
    for child in root.children().filter(Node::is_element) {
        if is_w(child, "body") {
            body = Some(child);
        } else if body.is_none() {
            xml_root.leading.push(raw(src, child));
        }
    }
    let body = body.ok_or_else(|| Error::xml(part, "missing w:body"))?;

    let mut document = Document::new();
    for child in body.children().filter(Node::is_element) {
        if is_w(child, "sectPr") {
            document.section = Some(raw(src, child));
        } else {
            document.add_block(read_block(src, child));
        }
    }

    Ok((xml_root, document))
}

/// Parse a story part (header, footer, footnotes) whose root holds blocks.
pub fn read_story(xml: &str, part: &str) -> Result<(XmlRoot, Vec<Block>)> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::xml(part, e))?;
    let src = doc.input_text();
    let root = doc.root_element();
    let blocks = read_blocks(src, root.children());
    Ok((read_root(root), blocks))
}

fn read_root(root: Node) -> XmlRoot {
    let namespaces = root
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .map(|ns| (ns.name().unwrap_or_default().to_string(), ns.uri().to_string()))
        .collect();
    let attributes = root
        .attributes()
        .map(|a| (qualified(root, a.namespace(), a.name()), a.value().to_string()))
        .collect();

    XmlRoot {
        name: qualified(root, root.tag_name().namespace(), root.tag_name().name()),
        namespaces,
        attributes,
        leading: Vec::new(),
    }
}

fn qualified(node: Node, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

fn is_w(node: Node, local: &str) -> bool {
    node.tag_name().namespace() == Some(W_NS) && node.tag_name().name() == local
}

fn raw(src: &str, node: Node) -> String {
    src[node.range()].to_string()
}

fn w_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((W_NS, name))
}

fn read_blocks<'a, 'i: 'a>(src: &str, nodes: impl Iterator<Item = Node<'a, 'i>>) -> Vec<Block> {
    nodes
        .filter(Node::is_element)
        .map(|n| read_block(src, n))
        .collect()
}

fn read_block(src: &str, node: Node) -> Block {
    if is_w(node, "p") {
        Block::Paragraph(read_paragraph(src, node))
    } else if is_w(node, "tbl") {
        Block::Table(read_table(src, node))
    } else {
        Block::Raw { xml: raw(src, node) }
    }
}

fn read_paragraph(src: &str, node: Node) -> Paragraph {
    let mut paragraph = Paragraph::new();

    for child in node.children().filter(Node::is_element) {
        if is_w(child, "pPr") {
            paragraph.properties = read_paragraph_properties(src, child);
        } else if is_w(child, "r") {
            paragraph.add_run(read_run(src, child));
        } else {
            paragraph.content.push(Inline::Raw {
                xml: raw(src, child),
                text: visible_text(child),
            });
        }
    }

    paragraph
}

fn read_paragraph_properties(src: &str, node: Node) -> ParagraphProperties {
    let mut props = ParagraphProperties::default();

    for child in node.children().filter(Node::is_element) {
        let alignment = is_w(child, "jc")
            .then(|| w_attr(child, "val").and_then(Alignment::from_xml))
            .flatten();

        if is_w(child, "pStyle") && w_attr(child, "val").is_some() {
            props.style = w_attr(child, "val").map(str::to_string);
        } else if alignment.is_some() {
            props.alignment = alignment;
        } else {
            props.extra.push(raw_property(src, child));
        }
    }

    props
}

fn read_run(src: &str, node: Node) -> Run {
    let mut run = Run::default();

    for child in node.children().filter(Node::is_element) {
        if is_w(child, "rPr") {
            run.properties = read_run_properties(src, child);
        } else if is_w(child, "t") {
            run.content
                .push(RunContent::Text(child.text().unwrap_or_default().to_string()));
        } else if is_w(child, "tab") {
            run.content.push(RunContent::Tab);
        } else if is_w(child, "cr") || is_text_wrapping_break(child) {
            run.content.push(RunContent::Break);
        } else {
            run.content.push(RunContent::Raw(raw(src, child)));
        }
    }

    run
}

fn is_text_wrapping_break(node: Node) -> bool {
    is_w(node, "br")
        && matches!(w_attr(node, "type"), None | Some("textWrapping"))
        && w_attr(node, "clear").is_none()
}

fn read_run_properties(src: &str, node: Node) -> RunProperties {
    let mut props = RunProperties::default();

    for child in node.children().filter(Node::is_element) {
        let size = is_w(child, "sz")
            .then(|| w_attr(child, "val").and_then(|v| v.parse::<u32>().ok()))
            .flatten();

        if is_w(child, "rStyle") && w_attr(child, "val").is_some() {
            props.style = w_attr(child, "val").map(str::to_string);
        } else if is_w(child, "b") {
            props.bold = Some(on_off(child));
        } else if is_w(child, "i") {
            props.italic = Some(on_off(child));
        } else if size.is_some() {
            props.size = size;
        } else {
            props.extra.push(raw_property(src, child));
        }
    }

    props
}

fn on_off(node: Node) -> bool {
    !matches!(w_attr(node, "val"), Some("0" | "false" | "off"))
}

fn raw_property(src: &str, node: Node) -> RawProperty {
    RawProperty::new(node.tag_name().name(), raw(src, node))
}

fn read_table(src: &str, node: Node) -> Table {
    let mut table = Table::new();

    for child in node.children().filter(Node::is_element) {
        if is_w(child, "tblPr") {
            table.properties = read_table_properties(src, child);
        } else if is_w(child, "tblGrid") {
            table.grid = child
                .children()
                .filter(|c| is_w(*c, "gridCol"))
                .map(|c| w_attr(c, "w").and_then(parse_twips).unwrap_or(0))
                .collect();
        } else if is_w(child, "tr") {
            table.add_row(read_row(src, child));
        } else {
            log::debug!("Skipping unsupported table child <{}>", child.tag_name().name());
        }
    }

    table
}

fn parse_twips(value: &str) -> Option<u32> {
    value
        .parse::<u32>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|v| v.max(0.0).round() as u32))
}

fn read_table_properties(src: &str, node: Node) -> TableProperties {
    let mut props = TableProperties::default();

    for child in node.children().filter(Node::is_element) {
        let alignment = is_w(child, "jc")
            .then(|| w_attr(child, "val").and_then(Alignment::from_xml))
            .flatten();

        if is_w(child, "tblStyle") && w_attr(child, "val").is_some() {
            props.style = w_attr(child, "val").map(str::to_string);
        } else if is_w(child, "tblLook") {
            props.look = Some(read_table_look(child));
        } else if alignment.is_some() {
            props.alignment = alignment;
        } else {
            props.extra.push(raw_property(src, child));
        }
    }

    props
}

fn read_table_look(node: Node) -> TableLook {
    const FLAGS: [&str; 6] = [
        "firstRow",
        "lastRow",
        "firstColumn",
        "lastColumn",
        "noHBand",
        "noVBand",
    ];

    if !FLAGS.iter().any(|f| w_attr(node, f).is_some()) {
        let val = w_attr(node, "val")
            .and_then(|v| u16::from_str_radix(v, 16).ok())
            .unwrap_or(0);
        return TableLook::from_val(val);
    }

    let flag = |name: &str| matches!(w_attr(node, name), Some("1" | "true" | "on"));
    TableLook {
        first_row: flag("firstRow"),
        last_row: flag("lastRow"),
        first_column: flag("firstColumn"),
        last_column: flag("lastColumn"),
        no_h_band: flag("noHBand"),
        no_v_band: flag("noVBand"),
    }
}

fn read_row(src: &str, node: Node) -> TableRow {
    let mut row = TableRow::default();
    let mut preamble = String::new();

    for child in node.children().filter(Node::is_element) {
        if is_w(child, "tblPrEx") || is_w(child, "trPr") {
            preamble.push_str(&raw(src, child));
        } else if is_w(child, "tc") {
            row.cells.push(read_cell(src, child));
        } else {
            row.raw_items.push(raw(src, child));
        }
    }

    if !preamble.is_empty() {
        row.properties = Some(preamble);
    }
    row
}

fn read_cell(src: &str, node: Node) -> TableCell {
    let mut cell = TableCell::default();

    let (props, content): (Vec<_>, Vec<_>) = node
        .children()
        .filter(Node::is_element)
        .partition(|c| is_w(*c, "tcPr"));

    if let Some(props) = props.first() {
        cell.properties = read_cell_properties(src, *props);
    }
    cell.content = read_blocks(src, content.into_iter());
    cell
}

fn read_cell_properties(src: &str, node: Node) -> CellProperties {
    let mut props = CellProperties::default();

    for child in node.children().filter(Node::is_element) {
        let width = (is_w(child, "tcW") && matches!(w_attr(child, "type"), None | Some("dxa")))
            .then(|| w_attr(child, "w").and_then(parse_twips))
            .flatten();
        let span = is_w(child, "gridSpan")
            .then(|| w_attr(child, "val").and_then(|v| v.parse::<u32>().ok()))
            .flatten();
        let plain_fill = is_w(child, "shd")
            && w_attr(child, "val") == Some("clear")
            && child.attributes().count() <= 3;

        if width.is_some() {
            props.width = width;
        } else if span.is_some() {
            props.grid_span = span;
        } else if plain_fill && w_attr(child, "fill").is_some() {
            props.shading = w_attr(child, "fill").map(str::to_string);
        } else {
            props.extra.push(raw_property(src, child));
        }
    }

    props
}

/// Visible text inside an element.
///
/// Collects `w:t` content with tabs and breaks; deleted text, field codes
/// and drawing content are skipped.
pub fn visible_text(node: Node) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: Node, out: &mut String) {
    for child in node.children().filter(Node::is_element) {
        let local = child.tag_name().name();
        if child.tag_name().namespace() == Some(W_NS) {
            match local {
                "t" => out.push_str(child.text().unwrap_or_default()),
                "tab" => out.push('\t'),
                "br" | "cr" => out.push('\n'),
                "drawing" | "pict" | "object" | "del" | "delText" | "instrText" => {}
                _ => collect_text(child, out),
            }
        } else if local != "AlternateContent" {
            collect_text(child, out);
        }
    }
}
