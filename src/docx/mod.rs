//! DOCX package codec.
//!
//! A [`Docx`] holds the whole package in memory. The main document part and
//! its style sheet are parsed into the model; every other part is carried
//! through unchanged unless explicitly rewritten.
//!
//! ```no_run
//! use docforge::docx::Docx;
//!
//! let mut docx = Docx::open("report.docx")?;
//! println!("{} paragraphs", docx.document().paragraph_count());
//! docx.save("report.docx")?;
//! # Ok::<(), docforge::Error>(())
//! ```

mod package;
mod reader;
mod relationships;
mod styles;
mod writer;

pub use package::{ContentType, Package, Part};
pub use reader::{read_document, read_story, visible_text, XmlRoot};
pub use relationships::{
    rels_part_name, resolve_target, Relationship, Relationships, REL_CORE_PROPERTIES,
    REL_FOOTER, REL_HEADER, REL_HYPERLINK, REL_IMAGE, REL_NUMBERING, REL_OFFICE_DOCUMENT,
    REL_STYLES,
};
pub use styles::{append_styles, read_styles};
pub use writer::{escape_attr, escape_text, write_blocks, write_document, write_story};

use crate::error::{Error, Result};
use crate::model::{Block, Document, StyleDefinition, StyleSheet};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Office document relationships namespace.
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CORE_PART: &str = "docProps/core.xml";

const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";

/// Content type of a numbering part.
pub const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";

/// An open Word document.
#[derive(Debug, Clone)]
pub struct Docx {
    package: Package,
    main_part: String,
    root: XmlRoot,
    document: Document,
    styles: StyleSheet,
    styles_part: Option<String>,
    relationships: Relationships,
}

impl Docx {
    /// Open a `.docx` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        Self::from_package(Package::open(path)?)
    }

    /// Read a document from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(data)?)
    }

    /// Read a document from a loaded package.
    pub fn from_package(package: Package) -> Result<Self> {
        let main_part = package.main_document_name()?;
        let xml = package
            .part_text(&main_part)?
            .ok_or_else(|| Error::MissingPart(main_part.clone()))?;
        let (root, document) = read_document(&xml, &main_part)?;

        let rels_part = rels_part_name(&main_part);
        let relationships = match package.part_text(&rels_part)? {
            Some(xml) => Relationships::parse(&xml, &rels_part)?,
            None => Relationships::new(),
        };

        let styles_part = relationships
            .find_by_type(REL_STYLES)
            .map(|r| resolve_target(&main_part, &r.target));
        let styles = match &styles_part {
            Some(part) => match package.part_text(part)? {
                Some(xml) => read_styles(&xml, part)?,
                None => StyleSheet::new(),
            },
            None => StyleSheet::new(),
        };

        log::debug!(
            "Loaded {} ({} blocks, {} styles)",
            main_part,
            document.body.len(),
            styles.len()
        );

        Ok(Self {
            package,
            main_part,
            root,
            document,
            styles,
            styles_part,
            relationships,
        })
    }

    /// A minimal document with `Normal` and `Table Grid` styles.
    pub fn blank() -> Result<Self> {
        let mut package = Package::new();
        package.set_part("[Content_Types].xml", BLANK_CONTENT_TYPES.as_bytes().to_vec());
        package.set_part("_rels/.rels", BLANK_PACKAGE_RELS.as_bytes().to_vec());
        package.set_part(
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body><w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#
            )
            .into_bytes(),
        );
        package.set_part(
            "word/_rels/document.xml.rels",
            BLANK_DOCUMENT_RELS.as_bytes().to_vec(),
        );
        package.set_part(
            "word/styles.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{W_NS}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style><w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style></w:styles>"#
            )
            .into_bytes(),
        );
        Self::from_package(package)
    }

    /// The document body.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the document body.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The document's style sheet.
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Body and style sheet together, for passes that read one and write the other.
    pub fn parts_mut(&mut self) -> (&mut Document, &StyleSheet) {
        (&mut self.document, &self.styles)
    }

    /// Root element information of the main part.
    pub fn root(&self) -> &XmlRoot {
        &self.root
    }

    /// Mutable root element information of the main part.
    pub fn root_mut(&mut self) -> &mut XmlRoot {
        &mut self.root
    }

    /// Relationships of the main part.
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Mutable relationships of the main part.
    pub fn relationships_mut(&mut self) -> &mut Relationships {
        &mut self.relationships
    }

    /// The underlying package. Main part content is stale until [`Docx::flush`].
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Mutable access to the underlying package.
    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Resolve a main-part relationship target to a part name.
    pub fn resolve(&self, target: &str) -> String {
        resolve_target(&self.main_part, target)
    }

    /// Part name of the first relationship of a type.
    pub fn related_part(&self, rel_type: &str) -> Option<String> {
        self.relationships
            .find_by_type(rel_type)
            .filter(|r| !r.external)
            .map(|r| self.resolve(&r.target))
    }

    /// Header and footer part names referenced by the main part.
    pub fn header_footer_parts(&self) -> Vec<String> {
        let mut parts: Vec<String> = self
            .relationships
            .all_of_type(REL_HEADER)
            .chain(self.relationships.all_of_type(REL_FOOTER))
            .filter(|r| !r.external)
            .map(|r| self.resolve(&r.target))
            .collect();
        parts.dedup();
        parts
    }

    /// Parse a story part of the package.
    pub fn read_story(&self, part: &str) -> Result<(XmlRoot, Vec<Block>)> {
        let xml = self
            .package
            .part_text(part)?
            .ok_or_else(|| Error::MissingPart(part.to_string()))?;
        read_story(&xml, part)
    }

    /// Replace a story part of the package.
    pub fn write_story(&mut self, part: &str, root: &XmlRoot, blocks: &[Block]) {
        self.package
            .set_part(part, write_story(root, blocks).into_bytes());
    }

    /// Add style definitions to the document.
    ///
    /// Definitions whose id already exists are skipped. Returns the number
    /// of styles added.
    pub fn add_styles(&mut self, styles: &[StyleDefinition]) -> Result<usize> {
        let new: Vec<StyleDefinition> = styles
            .iter()
            .filter(|s| self.styles.by_id(&s.id).is_none())
            .cloned()
            .collect();
        if new.is_empty() {
            return Ok(0);
        }

        let part = match &self.styles_part {
            Some(part) => part.clone(),
            None => self.create_styles_part()?,
        };
        let xml = self
            .package
            .part_text(&part)?
            .ok_or_else(|| Error::MissingPart(part.clone()))?;
        let updated = append_styles(&xml, &part, &new)?;
        self.package.set_part(&part, updated.into_bytes());

        let count = new.len();
        for style in new {
            self.styles.add(style);
        }
        Ok(count)
    }

    fn create_styles_part(&mut self) -> Result<String> {
        let part = self.resolve("styles.xml");
        self.package.set_part(
            &part,
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:styles xmlns:w=\"{}\"></w:styles>",
                W_NS
            )
            .into_bytes(),
        );
        self.package.add_override_content_type(&part, CT_STYLES)?;
        self.relationships.add(REL_STYLES, "styles.xml", false);
        self.styles_part = Some(part.clone());
        Ok(part)
    }

    /// Stamp the last-modified time in the core properties, if present.
    pub fn set_modified(&mut self, at: DateTime<Utc>) -> Result<()> {
        static MODIFIED: OnceLock<Regex> = OnceLock::new();
        let re = MODIFIED.get_or_init(|| {
            Regex::new(r"(<dcterms:modified[^>]*>)[^<]*(</dcterms:modified>)").unwrap()
        });

        let Some(xml) = self.package.part_text(CORE_PART)? else {
            return Ok(());
        };
        let stamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let updated = re.replace(&xml, |caps: &regex::Captures| {
            format!("{}{}{}", &caps[1], stamp, &caps[2])
        });
        self.package
            .set_part(CORE_PART, updated.into_owned().into_bytes());
        Ok(())
    }

    /// Write the main part and its relationships back into the package.
    pub fn flush(&mut self) {
        let xml = write_document(&self.root, &self.document);
        self.package.set_part(&self.main_part, xml.into_bytes());
        if !self.relationships.is_empty() {
            self.package.set_part(
                &rels_part_name(&self.main_part),
                self.relationships.to_xml().into_bytes(),
            );
        }
    }

    /// Serialize the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush();
        self.package.to_bytes()
    }

    /// Save the document to a file.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush();
        self.package.save(path.as_ref())?;
        log::debug!("Saved {}", path.as_ref().display());
        Ok(())
    }
}

const BLANK_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const BLANK_PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const BLANK_DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;
