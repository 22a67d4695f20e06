//! Table style resolution.

use crate::model::TableLook;

/// A table style name with the look flags it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTableStyle {
    /// Style name to assign
    pub style: String,
    /// Look flags to set; `None` leaves the table's flags unchanged
    pub look: Option<TableLook>,
}

/// Maps table style names to their look flags.
///
/// Unknown names resolve to a plain assignment without flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStyleResolver {
    looks: Vec<(String, TableLook)>,
}

impl TableStyleResolver {
    /// Resolver with the chart and list styles registered under the given names.
    pub fn new(chart: impl Into<String>, list: impl Into<String>) -> Self {
        Self {
            looks: vec![(chart.into(), TableLook::chart()), (list.into(), TableLook::list())],
        }
    }

    /// Register (or replace) the look of a style name.
    pub fn register(&mut self, name: impl Into<String>, look: TableLook) {
        let name = name.into();
        match self.looks.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = look,
            None => self.looks.push((name, look)),
        }
    }

    /// Resolve a style name.
    pub fn resolve(&self, name: &str) -> ResolvedTableStyle {
        ResolvedTableStyle {
            style: name.to_string(),
            look: self
                .looks
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, look)| *look),
        }
    }
}

impl Default for TableStyleResolver {
    fn default() -> Self {
        Self::new(super::DEFAULT_CHART_STYLE, super::DEFAULT_LIST_STYLE)
    }
}
