//! Appending whole documents to a base document.
//!
//! The base keeps its final section properties, headers and footers.
//! Appended documents contribute their body blocks together with whatever
//! those blocks reference: style definitions missing from the base,
//! numbering definitions (under shifted ids) and related parts such as
//! images and hyperlinks (under fresh relationship ids).
//!
//! ```no_run
//! use docforge::compose::Composer;
//! use docforge::docx::Docx;
//!
//! let mut composer = Composer::new(Docx::open("cover.docx")?);
//! composer.append(Docx::open("body.docx")?)?;
//! composer.save("full.docx")?;
//! # Ok::<(), docforge::Error>(())
//! ```

use crate::docx::{
    escape_attr, rels_part_name, Docx, CT_NUMBERING, REL_NUMBERING, REL_STYLES, W_NS,
};
use crate::error::{Error, Result};
use crate::model::StyleDefinition;
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

fn num_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(<w:numId\s+w:val=")(\d+)(")"#).unwrap())
}

fn rel_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\sr:(?:id|embed|link|pict)=")([^"]*)(")"#).unwrap())
}

fn abstract_id_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\sw:abstractNumId=")(\d+)(")"#).unwrap())
}

fn num_id_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\sw:numId=")(\d+)(")"#).unwrap())
}

fn abstract_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(<w:abstractNumId\s+w:val=")(\d+)(")"#).unwrap())
}

/// Builds one document out of several.
#[derive(Debug)]
pub struct Composer {
    base: Docx,
    appended: usize,
}

impl Composer {
    /// Start from a base document.
    pub fn new(base: Docx) -> Self {
        Self { base, appended: 0 }
    }

    /// Start from a base document on disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Docx::open(path)?))
    }

    /// The document built so far.
    pub fn docx(&self) -> &Docx {
        &self.base
    }

    /// Number of documents appended so far.
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Append the body of another document.
    pub fn append(&mut self, mut other: Docx) -> Result<()> {
        self.base.root_mut().merge_namespaces(other.root());

        let num_ids = self.merge_numbering(&other)?;
        if !num_ids.is_empty() {
            other
                .document_mut()
                .visit_raw_xml_mut(&mut |xml| remap(xml, num_id_re(), &num_ids));
        }

        self.copy_styles(&other, &num_ids)?;

        let mut referenced = BTreeSet::new();
        other.document_mut().visit_raw_xml_mut(&mut |xml| {
            for caps in rel_ref_re().captures_iter(xml) {
                referenced.insert(caps[2].to_string());
            }
        });
        let rel_ids = self.copy_relationships(&other, &referenced)?;
        if !rel_ids.is_empty() {
            other
                .document_mut()
                .visit_raw_xml_mut(&mut |xml| remap(xml, rel_ref_re(), &rel_ids));
        }

        let blocks = std::mem::take(&mut other.document_mut().body);
        log::debug!(
            "Appending {} blocks from {} ({} numbering ids, {} relationships remapped)",
            blocks.len(),
            other.main_part(),
            num_ids.len(),
            rel_ids.len()
        );
        self.base.document_mut().body.extend(blocks);
        self.appended += 1;
        Ok(())
    }

    /// Save the composed document.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.base.save(path)
    }

    /// Finish composing and return the document.
    pub fn into_docx(self) -> Docx {
        self.base
    }

    fn copy_styles(&mut self, other: &Docx, num_ids: &HashMap<String, String>) -> Result<()> {
        let mut styles: Vec<StyleDefinition> = other
            .styles()
            .iter()
            .filter(|s| self.base.styles().by_id(&s.id).is_none())
            .cloned()
            .collect();
        if styles.is_empty() {
            return Ok(());
        }
        for style in &mut styles {
            remap(&mut style.xml, num_id_re(), num_ids);
        }

        if let (Some(theirs), Some(ours)) = (
            other.related_part(REL_STYLES),
            self.base.related_part(REL_STYLES),
        ) {
            if let (Some(their_xml), Some(our_xml)) = (
                other.package().part_text(&theirs)?,
                self.base.package().part_text(&ours)?,
            ) {
                let namespaces = part_namespaces(&their_xml, &theirs)?;
                let declared = declare_namespaces(&our_xml, &namespaces);
                self.base.package_mut().set_part(&ours, declared.into_bytes());
            }
        }

        let added = self.base.add_styles(&styles)?;
        log::debug!("Copied {} styles from {}", added, other.main_part());
        Ok(())
    }

    fn merge_numbering(&mut self, other: &Docx) -> Result<HashMap<String, String>> {
        let Some(theirs) = other.related_part(REL_NUMBERING) else {
            return Ok(HashMap::new());
        };
        let Some(their_xml) = other.package().part_text(&theirs)? else {
            return Ok(HashMap::new());
        };

        let ours = match self.base.related_part(REL_NUMBERING) {
            Some(part) => part,
            None => self.create_numbering_part()?,
        };
        let our_xml = self
            .base
            .package()
            .part_text(&ours)?
            .ok_or_else(|| Error::MissingPart(ours.clone()))?;

        let our_xml = declare_namespaces(&our_xml, &part_namespaces(&their_xml, &theirs)?);
        let (merged, num_ids) = merge_numbering(&our_xml, &their_xml, &ours)?;
        self.base.package_mut().set_part(&ours, merged.into_bytes());
        Ok(num_ids)
    }

    fn create_numbering_part(&mut self) -> Result<String> {
        let main_dir = self
            .base
            .main_part()
            .rsplit_once('/')
            .map_or("", |(dir, _)| dir)
            .to_string();
        let part = self
            .base
            .package()
            .unique_name(&main_dir, "numbering.xml")
            .trim_start_matches('/')
            .to_string();

        self.base.package_mut().set_part(
            &part,
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:numbering xmlns:w=\"{}\"></w:numbering>",
                W_NS
            )
            .into_bytes(),
        );
        self.base
            .package_mut()
            .add_override_content_type(&part, CT_NUMBERING)?;
        let target = relative_target(self.base.main_part(), &part);
        self.base
            .relationships_mut()
            .add(REL_NUMBERING, &target, false);
        log::debug!("Created numbering part {}", part);
        Ok(part)
    }

    fn copy_relationships(
        &mut self,
        other: &Docx,
        referenced: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>> {
        let mut ids = HashMap::new();

        for id in referenced {
            let Some(rel) = other.relationships().get(id) else {
                log::debug!("Reference to unknown relationship {} left as is", id);
                continue;
            };

            let new_id = if rel.external {
                self.base
                    .relationships_mut()
                    .add(&rel.rel_type, &rel.target, true)
            } else {
                let source = other.resolve(&rel.target);
                let Some(data) = other.package().part(&source) else {
                    log::warn!("Relationship {} points at missing part {}", id, source);
                    continue;
                };
                if other.package().contains(&rels_part_name(&source)) {
                    log::debug!("Relationships of {} are not copied", source);
                }

                let (dir, file) = source.rsplit_once('/').unwrap_or(("", source.as_str()));
                let dest = self
                    .base
                    .package()
                    .unique_name(dir, file)
                    .trim_start_matches('/')
                    .to_string();
                let data = data.to_vec();
                self.base.package_mut().set_part(&dest, data);

                if let Some(content_type) = other.package().content_type(&source)? {
                    if content_type.is_override {
                        self.base
                            .package_mut()
                            .add_override_content_type(&dest, &content_type.value)?;
                    } else if let Some((_, ext)) = dest.rsplit_once('.') {
                        self.base
                            .package_mut()
                            .add_default_content_type(ext, &content_type.value)?;
                    }
                }

                let target = relative_target(self.base.main_part(), &dest);
                self.base
                    .relationships_mut()
                    .add(&rel.rel_type, &target, false)
            };

            ids.insert(id.clone(), new_id);
        }

        Ok(ids)
    }
}

/// Replace the second capture group of every match through `map`.
fn remap(xml: &mut String, re: &Regex, map: &HashMap<String, String>) {
    if map.is_empty() {
        return;
    }
    let replaced = re.replace_all(xml.as_str(), |caps: &Captures| match map.get(&caps[2]) {
        Some(new) => format!("{}{}{}", &caps[1], new, &caps[3]),
        None => caps[0].to_string(),
    });
    if let std::borrow::Cow::Owned(updated) = replaced {
        *xml = updated;
    }
}

/// Relationship target for `part` as seen from `source_part`.
fn relative_target(source_part: &str, part: &str) -> String {
    let dir = source_part.rsplit_once('/').map_or("", |(dir, _)| dir);
    if dir.is_empty() {
        return part.to_string();
    }
    match part.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(relative) => relative.to_string(),
        None => format!("/{}", part),
    }
}

/// Namespace declarations of a part's root element.
fn part_namespaces(xml: &str, part: &str) -> Result<Vec<(String, String)>> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::xml(part, e))?;
    Ok(doc
        .root_element()
        .namespaces()
        .filter_map(|ns| {
            let prefix = ns.name()?;
            (prefix != "xml").then(|| (prefix.to_string(), ns.uri().to_string()))
        })
        .collect())
}

/// Add namespace declarations missing from the root start tag.
///
/// Works on text so that the part may already hold content using the
/// prefixes being declared.
fn declare_namespaces(xml: &str, namespaces: &[(String, String)]) -> String {
    let Some(start) = xml
        .match_indices('<')
        .map(|(i, _)| i)
        .find(|&i| !matches!(xml.as_bytes().get(i + 1), Some(b'?') | Some(b'!')))
    else {
        return xml.to_string();
    };
    let Some(tag_len) = xml[start..].find('>') else {
        return xml.to_string();
    };
    let tag = &xml[start..start + tag_len];

    let mut declarations = String::new();
    for (prefix, uri) in namespaces {
        let attr = format!("xmlns:{}=", prefix);
        if tag.contains(&attr) || declarations.contains(&attr) {
            continue;
        }
        declarations.push_str(&format!(" {}\"{}\"", attr, escape_attr(uri)));
    }
    if declarations.is_empty() {
        return xml.to_string();
    }

    let name_end = tag
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(tag.len());
    let at = start + name_end;
    let mut out = String::with_capacity(xml.len() + declarations.len());
    out.push_str(&xml[..at]);
    out.push_str(&declarations);
    out.push_str(&xml[at..]);
    out
}

/// Append the numbering definitions of `other` to `base`.
///
/// Abstract numbering ids are shifted past the highest id in `base`, and so
/// are numbering instance ids. Returns the merged part and the map from old
/// to new instance ids.
fn merge_numbering(
    base: &str,
    other: &str,
    part: &str,
) -> Result<(String, HashMap<String, String>)> {
    let base_doc = roxmltree::Document::parse(base).map_err(|e| Error::xml(part, e))?;
    let other_doc = roxmltree::Document::parse(other).map_err(|e| Error::xml(part, e))?;
    let other_src = other_doc.input_text();

    fn max_id(node: roxmltree::Node, element: &str, attr: &str) -> Option<u32> {
        w_children(node, element)
            .filter_map(|n| n.attribute((W_NS, attr))?.parse::<u32>().ok())
            .max()
    }
    let abstract_offset =
        max_id(base_doc.root_element(), "abstractNum", "abstractNumId").map_or(0, |m| m + 1);
    let num_offset = max_id(base_doc.root_element(), "num", "numId").unwrap_or(0);

    let shift = |value: &str, offset: u32| -> Option<String> {
        value.parse::<u32>().ok().map(|v| (v + offset).to_string())
    };

    let mut abstract_ids = HashMap::new();
    let mut abstracts = String::new();
    for node in w_children(other_doc.root_element(), "abstractNum") {
        let Some(old) = node.attribute((W_NS, "abstractNumId")) else {
            continue;
        };
        let Some(new) = shift(old, abstract_offset) else {
            continue;
        };
        let slice = &other_src[node.range()];
        abstracts.push_str(&abstract_id_attr_re().replace(slice, |caps: &Captures| {
            format!("{}{}{}", &caps[1], new, &caps[3])
        }));
        abstract_ids.insert(old.to_string(), new);
    }

    let mut num_ids = HashMap::new();
    let mut nums = String::new();
    for node in w_children(other_doc.root_element(), "num") {
        let Some(old) = node.attribute((W_NS, "numId")) else {
            continue;
        };
        let Some(new) = shift(old, num_offset) else {
            continue;
        };
        let slice = &other_src[node.range()];
        let slice = num_id_attr_re().replace(slice, |caps: &Captures| {
            format!("{}{}{}", &caps[1], new, &caps[3])
        });
        let mut slice = slice.into_owned();
        remap(&mut slice, abstract_ref_re(), &abstract_ids);
        nums.push_str(&slice);
        num_ids.insert(old.to_string(), new);
    }

    let root = base_doc.root_element();
    let close = format!("</{}>", root_qname(base, root.range().start));
    let end = base
        .rfind(&close)
        .ok_or_else(|| Error::xml(part, "numbering part has no closing tag"))?;
    let num_at = w_children(root, "numIdMacAtCleanup")
        .next()
        .map_or(end, |n| n.range().start);
    let abstract_at = w_children(root, "num")
        .next()
        .map_or(num_at, |n| n.range().start);

    let mut out = String::with_capacity(base.len() + abstracts.len() + nums.len());
    out.push_str(&base[..abstract_at]);
    out.push_str(&abstracts);
    out.push_str(&base[abstract_at..num_at]);
    out.push_str(&nums);
    out.push_str(&base[num_at..]);

    // numId 0 means "no numbering" and is never remapped
    num_ids.remove("0");
    Ok((out, num_ids))
}

fn w_children<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.tag_name().namespace() == Some(W_NS) && n.tag_name().name() == name)
}

fn root_qname(xml: &str, start: usize) -> &str {
    let tag = &xml[start + 1..];
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len());
    &tag[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{REL_HYPERLINK, REL_IMAGE};
    use crate::model::{Paragraph, RawProperty, Run, RunContent, StyleKind};

    fn numbering_xml(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:numbering xmlns:w=\"{}\">{}</w:numbering>",
            W_NS, body
        )
    }

    fn with_numbering(docx: &mut Docx, body: &str) {
        docx.package_mut()
            .set_part("word/numbering.xml", numbering_xml(body).into_bytes());
        docx.package_mut()
            .add_override_content_type("word/numbering.xml", CT_NUMBERING)
            .unwrap();
        docx.relationships_mut()
            .add(REL_NUMBERING, "numbering.xml", false);
    }

    fn numbered(text: &str, num_id: u32) -> Paragraph {
        let mut p = Paragraph::with_text(text);
        p.properties.extra.push(RawProperty::new(
            "numPr",
            format!(
                "<w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"{}\"/></w:numPr>",
                num_id
            ),
        ));
        p
    }

    #[test]
    fn test_body_order_and_section() {
        let mut a = Docx::blank().unwrap();
        a.document_mut().add_paragraph(Paragraph::with_text("A"));
        a.document_mut().section = Some("<w:sectPr><w:titlePg/></w:sectPr>".into());
        let mut b = Docx::blank().unwrap();
        b.document_mut().add_paragraph(Paragraph::with_text("B"));
        let mut c = Docx::blank().unwrap();
        c.document_mut().add_paragraph(Paragraph::with_text("C"));

        let mut composer = Composer::new(a);
        composer.append(b).unwrap();
        composer.append(c).unwrap();
        assert_eq!(composer.appended(), 2);

        let docx = composer.into_docx();
        assert_eq!(docx.document().text(), "A\nB\nC");
        assert_eq!(
            docx.document().section.as_deref(),
            Some("<w:sectPr><w:titlePg/></w:sectPr>")
        );
    }

    #[test]
    fn test_missing_styles_copied() {
        let base = Docx::blank().unwrap();
        let mut other = Docx::blank().unwrap();
        other
            .add_styles(&[StyleDefinition {
                id: "Note".into(),
                name: Some("Note".into()),
                kind: StyleKind::Paragraph,
                xml: r#"<w:style w:type="paragraph" w:styleId="Note"><w:name w:val="Note"/></w:style>"#
                    .into(),
            }])
            .unwrap();

        let mut composer = Composer::new(base);
        composer.append(other).unwrap();
        let mut docx = composer.into_docx();
        assert!(docx.styles().by_id("Note").is_some());

        let back = Docx::from_bytes(&docx.to_bytes().unwrap()).unwrap();
        assert_eq!(back.styles().resolve("Note", StyleKind::Paragraph).unwrap(), "Note");
    }

    #[test]
    fn test_numbering_ids_shifted() {
        let mut base = Docx::blank().unwrap();
        with_numbering(
            &mut base,
            r#"<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"/></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#,
        );
        base.document_mut().add_paragraph(numbered("base item", 1));

        let mut other = Docx::blank().unwrap();
        with_numbering(
            &mut other,
            r#"<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"/></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#,
        );
        other.document_mut().add_paragraph(numbered("other item", 1));

        let mut composer = Composer::new(base);
        composer.append(other).unwrap();
        let docx = composer.into_docx();

        let numbering = docx.package().part_text("word/numbering.xml").unwrap().unwrap();
        assert!(numbering.contains(r#"<w:abstractNum w:abstractNumId="1">"#));
        assert!(numbering.contains(r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>"#));
        let first_num = numbering.find("<w:num ").unwrap();
        assert!(numbering.rfind("<w:abstractNum ").unwrap() < first_num);

        let props: Vec<&str> = docx
            .document()
            .paragraphs()
            .map(|p| p.properties.extra[0].xml.as_str())
            .collect();
        assert!(props[0].contains(r#"<w:numId w:val="1"/>"#));
        assert!(props[1].contains(r#"<w:numId w:val="2"/>"#));
    }

    #[test]
    fn test_numbering_part_created() {
        let base = Docx::blank().unwrap();
        let mut other = Docx::blank().unwrap();
        with_numbering(
            &mut other,
            r#"<w:abstractNum w:abstractNumId="3"/><w:num w:numId="4"><w:abstractNumId w:val="3"/></w:num>"#,
        );
        other.document_mut().add_paragraph(numbered("item", 4));

        let mut composer = Composer::new(base);
        composer.append(other).unwrap();
        let mut docx = composer.into_docx();

        assert_eq!(docx.related_part(REL_NUMBERING).as_deref(), Some("word/numbering.xml"));
        let numbering = docx.package().part_text("word/numbering.xml").unwrap().unwrap();
        assert!(numbering.contains(r#"w:abstractNumId="3""#));
        assert!(numbering.contains(r#"w:numId="4""#));

        let back = Docx::from_bytes(&docx.to_bytes().unwrap()).unwrap();
        assert!(back.related_part(REL_NUMBERING).is_some());
    }

    #[test]
    fn test_relationships_copied_and_remapped() {
        let mut base = Docx::blank().unwrap();
        base.package_mut()
            .set_part("word/media/image1.png", b"base".to_vec());
        base.relationships_mut()
            .add(REL_IMAGE, "media/image1.png", false);

        let mut other = Docx::blank().unwrap();
        other
            .package_mut()
            .set_part("word/media/image1.png", b"other".to_vec());
        other
            .package_mut()
            .add_default_content_type("png", "image/png")
            .unwrap();
        let image = other
            .relationships_mut()
            .add(REL_IMAGE, "media/image1.png", false);
        let link = other
            .relationships_mut()
            .add(REL_HYPERLINK, "https://example.com/", true);

        let mut p = Paragraph::new();
        p.add_raw(
            format!("<w:hyperlink r:id=\"{}\"><w:r><w:t>site</w:t></w:r></w:hyperlink>", link),
            "site",
        );
        p.add_run(Run {
            properties: Default::default(),
            content: vec![RunContent::Raw(format!(
                "<w:drawing><a:blip xmlns:a=\"urn:a\" r:embed=\"{}\"/></w:drawing>",
                image
            ))],
        });
        other.document_mut().add_paragraph(p);

        let mut composer = Composer::new(base);
        composer.append(other).unwrap();
        let docx = composer.into_docx();

        assert_eq!(
            docx.package().part("word/media/image1_2.png"),
            Some(&b"other"[..])
        );
        assert_eq!(docx.package().part("word/media/image1.png"), Some(&b"base"[..]));
        let png = docx.package().content_type("word/media/image1_2.png").unwrap().unwrap();
        assert_eq!(png.value, "image/png");

        let images: Vec<_> = docx.relationships().all_of_type(REL_IMAGE).collect();
        assert_eq!(images.len(), 2);
        let copied = images
            .iter()
            .find(|r| r.target == "media/image1_2.png")
            .unwrap();

        let Some(crate::model::Block::Paragraph(p)) = docx.document().body.last() else {
            panic!("expected paragraph");
        };
        let Some(crate::model::Inline::Run(run)) = p.content.last() else {
            panic!("expected run");
        };
        let RunContent::Raw(xml) = &run.content[0] else {
            panic!("expected raw content");
        };
        assert!(xml.contains(&format!("r:embed=\"{}\"", copied.id)));

        let hyperlink = docx
            .relationships()
            .find_by_type(REL_HYPERLINK)
            .unwrap();
        assert!(hyperlink.external);
        assert_eq!(hyperlink.target, "https://example.com/");
    }

    #[test]
    fn test_declare_namespaces() {
        let xml = "<?xml version=\"1.0\"?>\n<w:styles xmlns:w=\"w\"><w14:x/></w:styles>";
        let out = declare_namespaces(
            xml,
            &[("w".into(), "w".into()), ("w14".into(), "urn:w14".into())],
        );
        assert_eq!(
            out,
            "<?xml version=\"1.0\"?>\n<w:styles xmlns:w14=\"urn:w14\" xmlns:w=\"w\"><w14:x/></w:styles>"
        );
        assert_eq!(declare_namespaces(xml, &[("w".into(), "w".into())]), xml);
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(relative_target("word/document.xml", "word/media/a.png"), "media/a.png");
        assert_eq!(relative_target("word/document.xml", "customXml/item.xml"), "/customXml/item.xml");
        assert_eq!(relative_target("document.xml", "media/a.png"), "media/a.png");
    }
}
