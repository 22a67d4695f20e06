//! Styles part (`styles.xml`).

use crate::error::{Error, Result};
use crate::model::{StyleDefinition, StyleKind, StyleSheet};
use roxmltree::Node;

use super::W_NS;

/// Parse the style definitions of a styles part.
///
/// Definitions with an unknown `w:type` are skipped; document defaults and
/// latent styles are not part of the sheet.
pub fn read_styles(xml: &str, part: &str) -> Result<StyleSheet> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::xml(part, e))?;
    let src = doc.input_text();
    let mut sheet = StyleSheet::new();

    for node in doc
        .root_element()
        .children()
        .filter(|n| n.tag_name().namespace() == Some(W_NS) && n.tag_name().name() == "style")
    {
        let Some(id) = node.attribute((W_NS, "styleId")) else {
            continue;
        };
        let Some(kind) = StyleKind::from_xml(node.attribute((W_NS, "type")).unwrap_or("paragraph"))
        else {
            log::debug!("Skipping style {} with unknown type", id);
            continue;
        };

        sheet.add(StyleDefinition {
            id: id.to_string(),
            name: style_name(node),
            kind,
            xml: src[node.range()].to_string(),
        });
    }

    Ok(sheet)
}

fn style_name(node: Node) -> Option<String> {
    node.children()
        .find(|c| c.tag_name().namespace() == Some(W_NS) && c.tag_name().name() == "name")
        .and_then(|c| c.attribute((W_NS, "val")))
        .map(str::to_string)
}

/// Append style definitions to a styles part.
pub fn append_styles(xml: &str, part: &str, styles: &[StyleDefinition]) -> Result<String> {
    let at = xml
        .rfind("</w:styles>")
        .ok_or_else(|| Error::xml(part, "missing </w:styles>"))?;

    let mut out = String::with_capacity(xml.len() + styles.iter().map(|s| s.xml.len()).sum::<usize>());
    out.push_str(&xml[..at]);
    for style in styles {
        out.push_str(&style.xml);
    }
    out.push_str(&xml[at..]);
    Ok(out)
}
