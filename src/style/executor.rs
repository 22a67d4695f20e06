//! Plan execution.
//!
//! Table styles first, then paragraph ranges, then trims from the highest
//! paragraph index down. Each operation is isolated: a failure becomes a
//! warning and the remaining operations still run.

use crate::error::{Error, Result};
use crate::model::{BodyIndex, Document, StyleKind, StyleSheet};

use super::plan::{ParagraphRange, StylePlan, TableOperation, TrimAction};
use super::resolver::TableStyleResolver;
use super::{StyleReport, StyleWarning};

/// Applies a [`StylePlan`] to a document.
pub struct Executor<'a> {
    styles: &'a StyleSheet,
    resolver: &'a TableStyleResolver,
}

impl<'a> Executor<'a> {
    /// Create an executor resolving names against a style sheet.
    pub fn new(styles: &'a StyleSheet, resolver: &'a TableStyleResolver) -> Self {
        Self { styles, resolver }
    }

    /// Apply the plan and report what was done.
    pub fn execute(&self, doc: &mut Document, plan: StylePlan) -> StyleReport {
        let mut report = StyleReport {
            warnings: plan.warnings.clone(),
            ..Default::default()
        };
        let index = doc.index();

        for op in &plan.tables {
            match self.apply_table(doc, op) {
                Ok(()) if op.explicit => report.explicit_tables += 1,
                Ok(()) => report.default_tables += 1,
                Err(e) => report.push_warning(StyleWarning::ApplyFailed {
                    style: op.style.clone(),
                    target: format!("table at body position {}", op.table.position()),
                    reason: e.to_string(),
                }),
            }
        }

        for range in &plan.ranges {
            match self.apply_range(doc, &index, range) {
                Ok(count) => report.styled_paragraphs += count,
                Err(e) => report.push_warning(StyleWarning::ApplyFailed {
                    style: range.style.clone(),
                    target: format!("paragraphs {}-{}", range.start, range.end),
                    reason: e.to_string(),
                }),
            }
        }

        for (i, action) in plan.trims_descending() {
            let Some(position) = index.paragraph_position(i) else {
                report.push_warning(StyleWarning::ApplyFailed {
                    style: String::new(),
                    target: format!("paragraph {}", i),
                    reason: Error::ParagraphOutOfRange(i, index.paragraph_count()).to_string(),
                });
                continue;
            };
            match action {
                TrimAction::Replace(text) => {
                    if let Some(p) = doc.paragraph_at_mut(position) {
                        p.replace_text(text.as_str());
                        report.trimmed_paragraphs += 1;
                    }
                }
                TrimAction::Delete => {
                    if doc.remove_block(position).is_some() {
                        report.deleted_paragraphs += 1;
                    }
                }
            }
        }

        report
    }

    fn apply_table(&self, doc: &mut Document, op: &TableOperation) -> Result<()> {
        let resolved = self.resolver.resolve(&op.style);
        let id = self.styles.resolve(&resolved.style, StyleKind::Table)?;
        let table = doc
            .table_mut(op.table)
            .ok_or(Error::TableNotFound(op.table.position()))?;

        log::debug!(
            "Table at {} -> {} ({})",
            op.table.position(),
            id,
            if op.explicit { "marker" } else { "default" }
        );
        table.properties.style = Some(id);
        if let Some(look) = resolved.look {
            table.properties.look = Some(look);
        }
        Ok(())
    }

    fn apply_range(
        &self,
        doc: &mut Document,
        index: &BodyIndex,
        range: &ParagraphRange,
    ) -> Result<usize> {
        let id = self.styles.resolve(&range.style, StyleKind::Paragraph)?;
        let positions = range
            .indices()
            .map(|i| {
                index
                    .paragraph_position(i)
                    .ok_or(Error::ParagraphOutOfRange(i, index.paragraph_count()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &position in &positions {
            if let Some(p) = doc.paragraph_at_mut(position) {
                p.set_style(id.as_str());
            }
        }
        log::debug!("Paragraphs {}-{} -> {}", range.start, range.end, id);
        Ok(positions.len())
    }
}
