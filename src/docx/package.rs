//! Zip package access for `.docx` files.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::relationships::{Relationships, REL_OFFICE_DOCUMENT};

const CONTENT_TYPES: &str = "[Content_Types].xml";
const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// A single part of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part name without leading slash (e.g. `word/document.xml`)
    pub name: String,
    /// Raw part content
    pub data: Vec<u8>,
}

/// A registered content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// MIME type
    pub value: String,
    /// Registered for the part itself rather than its extension
    pub is_override: bool,
}

/// An OPC package held in memory.
///
/// Part order is preserved so that `[Content_Types].xml` stays the first
/// entry when the package is written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a package from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Read a package from a seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push(Part {
                name: entry.name().trim_start_matches('/').to_string(),
                data,
            });
        }

        Ok(Self { parts })
    }

    /// Write the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to a file, replacing it if it exists.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Check whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Raw content of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = name.trim_start_matches('/');
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Content of a part decoded as UTF-8.
    pub fn part_text(&self, name: &str) -> Result<Option<String>> {
        match self.part(name) {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| Error::xml(name, e)),
            None => Ok(None),
        }
    }

    /// Insert or replace a part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        let name = name.trim_start_matches('/');
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Names of all parts.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// A part name in `dir` not used yet, derived from `file_name`.
    pub fn unique_name(&self, dir: &str, file_name: &str) -> String {
        let candidate = format!("{}/{}", dir.trim_end_matches('/'), file_name);
        if !self.contains(&candidate) {
            return candidate;
        }

        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (file_name, String::new()),
        };
        (2..)
            .map(|n| format!("{}/{}_{}{}", dir.trim_end_matches('/'), stem, n, ext))
            .find(|name| !self.contains(name))
            .unwrap_or(candidate)
    }

    /// Name of the main document part, from the package relationships.
    pub fn main_document_name(&self) -> Result<String> {
        let Some(rels) = self.part_text(PACKAGE_RELS)? else {
            return Ok(DEFAULT_MAIN_PART.to_string());
        };
        let rels = Relationships::parse(&rels, PACKAGE_RELS)?;
        Ok(rels
            .find_by_type(REL_OFFICE_DOCUMENT)
            .map(|r| r.target.trim_start_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
    }

    /// Register a default content type for a file extension.
    pub fn add_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let types = self.content_types()?;
        let needle = format!("Extension=\"{}\"", extension);
        let lower = format!("Extension=\"{}\"", extension.to_lowercase());
        if types.contains(&needle) || types.contains(&lower) {
            return Ok(());
        }
        let entry = format!(
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            extension, content_type
        );
        self.insert_content_type(types, &entry)
    }

    /// Register a content type override for a part.
    pub fn add_override_content_type(&mut self, part: &str, content_type: &str) -> Result<()> {
        let types = self.content_types()?;
        let part_name = format!("/{}", part.trim_start_matches('/'));
        if types.contains(&format!("PartName=\"{}\"", part_name)) {
            return Ok(());
        }
        let entry = format!(
            "<Override PartName=\"{}\" ContentType=\"{}\"/>",
            part_name, content_type
        );
        self.insert_content_type(types, &entry)
    }

    /// Content type of a part: its override if any, else the default for
    /// its extension.
    pub fn content_type(&self, part: &str) -> Result<Option<ContentType>> {
        let Some(types) = self.part_text(CONTENT_TYPES)? else {
            return Ok(None);
        };
        let doc = roxmltree::Document::parse(&types).map_err(|e| Error::xml(CONTENT_TYPES, e))?;
        let part_name = format!("/{}", part.trim_start_matches('/'));
        let extension = part
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        let mut default = None;
        for node in doc.root_element().children().filter(|n| n.is_element()) {
            let Some(value) = node.attribute("ContentType") else {
                continue;
            };
            match node.tag_name().name() {
                "Override" if node.attribute("PartName") == Some(part_name.as_str()) => {
                    return Ok(Some(ContentType {
                        value: value.to_string(),
                        is_override: true,
                    }));
                }
                "Default"
                    if node
                        .attribute("Extension")
                        .is_some_and(|e| e.eq_ignore_ascii_case(&extension)) =>
                {
                    default = Some(ContentType {
                        value: value.to_string(),
                        is_override: false,
                    });
                }
                _ => {}
            }
        }
        Ok(default)
    }

    fn content_types(&self) -> Result<String> {
        self.part_text(CONTENT_TYPES)?
            .ok_or_else(|| Error::MissingPart(CONTENT_TYPES.to_string()))
    }

    fn insert_content_type(&mut self, mut types: String, entry: &str) -> Result<()> {
        let at = types
            .rfind("</Types>")
            .ok_or_else(|| Error::xml(CONTENT_TYPES, "missing </Types>"))?;
        types.insert_str(at, entry);
        self.set_part(CONTENT_TYPES, types.into_bytes());
        Ok(())
    }
}
