//! Single-pass marker scanner.
//!
//! The scanner walks the top-level paragraphs once and records what should
//! happen in a [`StylePlan`]. It never mutates the document, so paragraph
//! indices and table handles stay valid until the plan is executed.

use crate::model::{Block, BodyIndex, Document, Paragraph, StyleSheet, TableHandle};
use std::collections::HashSet;

use super::marker::{self, Marker};
use super::plan::{ParagraphRange, StylePlan, TableOperation, TrimAction};
use super::{StyleOptions, StyleWarning};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    NoMarker,
    ParagraphMarker { start: usize, style: String },
}

/// Scans a document body for style markers.
pub struct Scanner<'a> {
    doc: &'a Document,
    paragraphs: Vec<&'a Paragraph>,
    index: BodyIndex,
    styles: &'a StyleSheet,
    options: &'a StyleOptions,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over a document.
    pub fn new(doc: &'a Document, styles: &'a StyleSheet, options: &'a StyleOptions) -> Self {
        Self {
            doc,
            paragraphs: doc.paragraphs().collect(),
            index: doc.index(),
            styles,
            options,
        }
    }

    /// Run the scan and plan the default table styles.
    pub fn scan(&self) -> StylePlan {
        let mut plan = StylePlan::new();
        let mut styled: HashSet<TableHandle> = HashSet::new();
        let mut state = ScanState::NoMarker;

        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            let full = paragraph.text();
            let text = full.trim();

            state = match std::mem::replace(&mut state, ScanState::NoMarker) {
                ScanState::NoMarker => {
                    if !marker::has_sigil(text) || self.is_verbatim(paragraph) {
                        continue;
                    }
                    self.scan_idle(i, text, &mut plan, &mut styled)
                }
                ScanState::ParagraphMarker { start, style } => {
                    if self.is_verbatim(paragraph) {
                        ScanState::ParagraphMarker { start, style }
                    } else if marker::ends_span(text) {
                        self.close_span(start, i, style, &mut plan);
                        ScanState::NoMarker
                    } else {
                        if marker::starts_marker(text) {
                            self.warn(
                                &mut plan,
                                StyleWarning::NestedMarker {
                                    paragraph: i,
                                    style: style.clone(),
                                },
                            );
                        }
                        ScanState::ParagraphMarker { start, style }
                    }
                }
            };
        }

        if let ScanState::ParagraphMarker { start, style } = state {
            self.warn(&mut plan, StyleWarning::UnterminatedSpan { start, style });
        }

        self.plan_defaults(&styled, &mut plan);
        plan
    }

    fn scan_idle(
        &self,
        i: usize,
        text: &str,
        plan: &mut StylePlan,
        styled: &mut HashSet<TableHandle>,
    ) -> ScanState {
        match marker::classify(text) {
            Marker::TableStyle(name) => {
                match self.index.table_after(i) {
                    Some(table) => {
                        log::debug!("Table marker '{}' at paragraph {}", name, i);
                        plan.tables.push(TableOperation {
                            table,
                            style: name.to_string(),
                            explicit: true,
                        });
                        styled.insert(table);
                    }
                    None => self.warn(
                        plan,
                        StyleWarning::TableNotFollowed {
                            paragraph: i,
                            style: name.to_string(),
                        },
                    ),
                }
                plan.trims.insert(i, TrimAction::Delete);
                ScanState::NoMarker
            }
            Marker::StyleSpan(name) => {
                plan.ranges.push(ParagraphRange {
                    start: i,
                    end: i,
                    style: name.to_string(),
                });
                plan.trims
                    .insert(i, TrimAction::for_cleaned(marker::strip_markers(text)));
                ScanState::NoMarker
            }
            Marker::StyleStart(name) => ScanState::ParagraphMarker {
                start: i,
                style: name.to_string(),
            },
            Marker::Malformed => {
                self.warn(
                    plan,
                    StyleWarning::MalformedMarker {
                        paragraph: i,
                        text: text.to_string(),
                    },
                );
                ScanState::NoMarker
            }
            Marker::None | Marker::Other => ScanState::NoMarker,
        }
    }

    fn close_span(&self, start: usize, end: usize, style: String, plan: &mut StylePlan) {
        log::debug!("Style span '{}' over paragraphs {}..={}", style, start, end);

        for k in start..=end {
            let paragraph = self.paragraphs[k];
            if self.is_verbatim(paragraph) {
                continue;
            }
            let original = paragraph.text();
            let original = original.trim();
            let cleaned = marker::strip_markers(original);
            if cleaned != original {
                plan.trims.insert(k, TrimAction::for_cleaned(cleaned));
            }
        }

        plan.ranges.push(ParagraphRange { start, end, style });
    }

    fn plan_defaults(&self, styled: &HashSet<TableHandle>, plan: &mut StylePlan) {
        let fallback = self.options.default_table_style();

        for handle in self.index.tables() {
            if styled.contains(&handle) {
                continue;
            }
            if self.options.keep_table_styles && !self.is_generic(handle) {
                continue;
            }
            plan.tables.push(TableOperation {
                table: handle,
                style: fallback.to_string(),
                explicit: false,
            });
        }
    }

    /// Whether a table has no style or one the converter assigned by itself.
    fn is_generic(&self, handle: TableHandle) -> bool {
        let current = match self.doc.body.get(handle.position()) {
            Some(Block::Table(t)) => t.style(),
            _ => None,
        };
        match current {
            None => true,
            Some(id) => {
                self.options
                    .is_generic_table_style(self.styles.display_name(id))
                    || self.options.is_generic_table_style(id)
            }
        }
    }

    fn is_verbatim(&self, paragraph: &Paragraph) -> bool {
        paragraph
            .first_run()
            .and_then(|run| run.properties.style.as_deref())
            .map(|id| {
                self.styles
                    .display_name(id)
                    .contains(self.options.verbatim_marker.as_str())
            })
            .unwrap_or(false)
    }

    fn warn(&self, plan: &mut StylePlan, warning: StyleWarning) {
        log::warn!("{}", warning);
        plan.warnings.push(warning);
    }
}
