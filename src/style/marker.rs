//! Marker grammar.
//!
//! Markers are byte-exact, case-sensitive annotations forming the trimmed
//! text of a paragraph:
//!
//! - `@@@TABLE_STYLE:<name>@@@` styles the table that follows the paragraph
//! - `@@@STYLE:<name>@@@` opens a paragraph style span
//! - `@@@END_STYLE@@@` closes the open span
//!
//! `<name>` is one or more word characters.

use regex::Regex;
use std::sync::OnceLock;

/// Common prefix of every marker, used as a cheap pre-check.
pub const MARKER_SIGIL: &str = "@@@";

/// Prefix of a table style marker.
pub const TABLE_STYLE_PREFIX: &str = "@@@TABLE_STYLE:";

/// Prefix of a span start marker.
pub const STYLE_PREFIX: &str = "@@@STYLE:";

/// Span end marker.
pub const END_STYLE: &str = "@@@END_STYLE@@@";

fn table_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@@@TABLE_STYLE:(\w+)@@@").unwrap())
}

fn style_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\A@@@STYLE:(\w+)@@@").unwrap())
}

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@@@(?:TABLE_STYLE|STYLE):\w+@@@|@@@END_STYLE@@@").unwrap())
}

/// Classification of a paragraph's trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker<'a> {
    /// No marker syntax at all
    None,
    /// `@@@TABLE_STYLE:<name>@@@`
    TableStyle(&'a str),
    /// `@@@STYLE:<name>@@@ ... @@@END_STYLE@@@` on one paragraph
    StyleSpan(&'a str),
    /// `@@@STYLE:<name>@@@` without an end marker
    StyleStart(&'a str),
    /// Starts like a marker but does not match the grammar
    Malformed,
    /// Contains the sigil somewhere but is not a marker paragraph
    Other,
}

/// Cheap check whether text can hold a marker at all.
pub fn has_sigil(text: &str) -> bool {
    text.contains(MARKER_SIGIL)
}

/// Whether text ends with the span end marker.
pub fn ends_span(text: &str) -> bool {
    text.ends_with(END_STYLE)
}

/// Whether text starts with an opening marker prefix.
pub fn starts_marker(text: &str) -> bool {
    text.starts_with(TABLE_STYLE_PREFIX) || text.starts_with(STYLE_PREFIX)
}

/// Classify trimmed paragraph text.
pub fn classify(text: &str) -> Marker<'_> {
    if !has_sigil(text) {
        return Marker::None;
    }

    if text.starts_with(TABLE_STYLE_PREFIX) {
        return match table_style_re().captures(text).and_then(|c| c.get(1)) {
            Some(name) => Marker::TableStyle(name.as_str()),
            None => Marker::Malformed,
        };
    }

    if text.starts_with(STYLE_PREFIX) {
        return match style_start_re().captures(text).and_then(|c| c.get(1)) {
            Some(name) if ends_span(text) => Marker::StyleSpan(name.as_str()),
            Some(name) => Marker::StyleStart(name.as_str()),
            None => Marker::Malformed,
        };
    }

    Marker::Other
}

/// Whether a well-formed marker occurs anywhere in the text.
pub fn contains_marker(text: &str) -> bool {
    has_sigil(text) && strip_re().is_match(text)
}

/// Remove every marker substring and trim the result.
pub fn strip_markers(text: &str) -> String {
    strip_re().replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("plain text"), Marker::None);
        assert_eq!(classify("@@@TABLE_STYLE:Chart@@@"), Marker::TableStyle("Chart"));
        assert_eq!(classify("@@@STYLE:Note@@@"), Marker::StyleStart("Note"));
        assert_eq!(
            classify("@@@STYLE:Note@@@ text @@@END_STYLE@@@"),
            Marker::StyleSpan("Note")
        );
        assert_eq!(classify("@@@TABLE_STYLE:bad-name@@@"), Marker::Malformed);
        assert_eq!(classify("@@@STYLE:@@@"), Marker::Malformed);
        assert_eq!(classify("see @@@STYLE:Note@@@"), Marker::Other);
        assert_eq!(classify("@@@END_STYLE@@@"), Marker::Other);
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        assert_eq!(classify("@@@table_style:Chart@@@"), Marker::Other);
        assert_eq!(classify("@@@Style:Note@@@"), Marker::Other);
    }

    #[test]
    fn test_word_characters_in_names() {
        assert_eq!(
            classify("@@@TABLE_STYLE:DilonTable_Chart2@@@"),
            Marker::TableStyle("DilonTable_Chart2")
        );
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("@@@STYLE:Note@@@ body @@@END_STYLE@@@"), "body");
        assert_eq!(strip_markers("line B@@@END_STYLE@@@"), "line B");
        assert_eq!(strip_markers("@@@STYLE:Note@@@"), "");
        assert_eq!(strip_markers("@@@TABLE_STYLE:Chart@@@"), "");
        assert_eq!(strip_markers("  keep @@@ this  "), "keep @@@ this");
    }

    #[test]
    fn test_contains_marker() {
        assert!(contains_marker("text @@@END_STYLE@@@ more"));
        assert!(contains_marker("@@@TABLE_STYLE:Chart@@@"));
        assert!(!contains_marker("email@@@example"));
        assert!(!contains_marker("@@@STYLE:@@@"));
    }
}
