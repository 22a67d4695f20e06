//! Paragraph and run-level types.

use serde::{Deserialize, Serialize};

/// A paragraph of text content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph properties
    pub properties: ParagraphProperties,

    /// Runs and other inline content, in document order
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single plain run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create a paragraph with plain text and a paragraph style.
    pub fn styled(text: impl Into<String>, style: impl Into<String>) -> Self {
        let mut p = Self::with_text(text);
        p.properties.style = Some(style.into());
        p
    }

    /// Add plain text as a new run.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(Inline::Run(Run::new(text)));
    }

    /// Add a run.
    pub fn add_run(&mut self, run: Run) {
        self.content.push(Inline::Run(run));
    }

    /// Add raw inline XML that carries the given visible text.
    pub fn add_raw(&mut self, xml: impl Into<String>, text: impl Into<String>) {
        self.content.push(Inline::Raw {
            xml: xml.into(),
            text: text.into(),
        });
    }

    /// Paragraph style id, if any.
    pub fn style(&self) -> Option<&str> {
        self.properties.style.as_deref()
    }

    /// Set the paragraph style id.
    pub fn set_style(&mut self, style: impl Into<String>) {
        self.properties.style = Some(style.into());
    }

    /// Iterate over the direct runs of the paragraph.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|c| match c {
            Inline::Run(run) => Some(run),
            Inline::Raw { .. } => None,
        })
    }

    /// First direct run, if any.
    pub fn first_run(&self) -> Option<&Run> {
        self.runs().next()
    }

    /// Visible text of the paragraph.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                Inline::Run(run) => run.text(),
                Inline::Raw { text, .. } => text.clone(),
            })
            .collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Replace all text-bearing content with a single run holding `text`.
    ///
    /// The new run takes the properties of the first removed run and is
    /// placed where the first text-bearing item was. Inline items without
    /// visible text (bookmarks, field markers) are kept.
    pub fn replace_text(&mut self, text: impl Into<String>) {
        let mut properties = None;
        let mut insert_at = None;
        let mut kept = Vec::with_capacity(self.content.len());

        for item in self.content.drain(..) {
            let bears_text = match &item {
                Inline::Run(run) => {
                    if properties.is_none() {
                        properties = Some(run.properties.clone());
                    }
                    true
                }
                Inline::Raw { text, .. } => !text.is_empty(),
            };
            if bears_text {
                insert_at.get_or_insert(kept.len());
            } else {
                kept.push(item);
            }
        }

        let run = Run {
            properties: properties.unwrap_or_default(),
            content: vec![RunContent::Text(text.into())],
        };
        let at = insert_at.unwrap_or(kept.len());
        kept.insert(at, Inline::Run(run));
        self.content = kept;
    }
}

/// Paragraph-level properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphProperties {
    /// Paragraph style id
    pub style: Option<String>,

    /// Horizontal alignment
    pub alignment: Option<Alignment>,

    /// Properties kept verbatim from the source
    pub extra: Vec<RawProperty>,
}

impl ParagraphProperties {
    /// Check if no property is set.
    pub fn is_empty(&self) -> bool {
        self.style.is_none() && self.alignment.is_none() && self.extra.is_empty()
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// A text run
    Run(Run),

    /// Inline XML kept verbatim (hyperlinks, bookmarks, fields)
    Raw {
        /// Source XML
        xml: String,
        /// Visible text inside the element
        text: String,
    },
}

/// A run of content with consistent formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Run properties
    pub properties: RunProperties,

    /// Run content
    pub content: Vec<RunContent>,
}

impl Run {
    /// Create a new run with default formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            properties: RunProperties::default(),
            content: vec![RunContent::Text(text.into())],
        }
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        let mut run = Self::new(text);
        run.properties.bold = Some(true);
        run
    }

    /// Set the font size in points and return self.
    pub fn size_pt(mut self, points: u32) -> Self {
        self.properties.size = Some(points * 2);
        self
    }

    /// Set the character style id and return self.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.properties.style = Some(style.into());
        self
    }

    /// Visible text of the run.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                RunContent::Text(t) => t.as_str(),
                RunContent::Tab => "\t",
                RunContent::Break => "\n",
                RunContent::Raw(_) => "",
            })
            .collect()
    }

    /// Check if this run has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// Content of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RunContent {
    /// Literal text
    Text(String),
    /// Tab character
    Tab,
    /// Line break
    Break,
    /// Run child kept verbatim (drawings, field characters)
    Raw(String),
}

/// Run-level properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunProperties {
    /// Character style id
    pub style: Option<String>,

    /// Bold toggle
    pub bold: Option<bool>,

    /// Italic toggle
    pub italic: Option<bool>,

    /// Font size in half-points
    pub size: Option<u32>,

    /// Properties kept verbatim from the source
    pub extra: Vec<RawProperty>,
}

impl RunProperties {
    /// Check if no property is set.
    pub fn is_empty(&self) -> bool {
        self.style.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.size.is_none()
            && self.extra.is_empty()
    }
}

/// A property element kept as source XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProperty {
    /// Local element name (e.g. `spacing`)
    pub name: String,

    /// Source XML of the element
    pub xml: String,
}

impl RawProperty {
    /// Create a raw property.
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml: xml.into(),
        }
    }
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// Parse a WordprocessingML `jc` value.
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// WordprocessingML `jc` value.
    pub fn as_xml(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}
