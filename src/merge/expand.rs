//! Repeating group expansion: one table row per group item.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{substitute_with, TokenPattern};
use crate::error::{Error, Result};
use crate::model::{Document, TableRow};
use crate::record::ItemRecord;

/// The position of a template row: table index in document order, then
/// row index within that table. Both are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowBinding {
    /// Table index in document order
    pub table: usize,
    /// Row index within the table
    pub row: usize,
}

impl RowBinding {
    /// Create a binding.
    pub fn new(table: usize, row: usize) -> Self {
        Self { table, row }
    }
}

impl fmt::Display for RowBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.row)
    }
}

/// Parses `table:row`, e.g. `0:1`.
impl FromStr for RowBinding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| part.trim().parse::<usize>().ok();
        s.split_once(':')
            .and_then(|(t, r)| Some(Self::new(parse(t)?, parse(r)?)))
            .ok_or_else(|| Error::Other(format!("Invalid row binding '{}', expected TABLE:ROW", s)))
    }
}

/// The outcome of expanding one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupExpansion {
    /// Group key
    pub group: String,
    /// Where the template row was
    pub at: RowBinding,
    /// Whether the row came from an explicit binding
    pub bound: bool,
    /// Rows inserted (one per item)
    pub rows_inserted: usize,
    /// Tokens replaced across the inserted rows
    pub substitutions: usize,
}

/// Find the template row for a group.
///
/// The first row, scanning tables in document order and rows top to
/// bottom, whose cell text contains a token for any key of the group's
/// first item. Later qualifying rows are never considered.
pub fn find_template_row(
    doc: &Document,
    items: &[ItemRecord],
    pattern: &TokenPattern,
) -> Option<RowBinding> {
    let first = items.first()?;
    let wrapped: Vec<String> = first.keys().map(|k| pattern.wrap(k)).collect();
    if wrapped.is_empty() {
        return None;
    }

    doc.tables().enumerate().find_map(|(t, table)| {
        table.rows.iter().position(|row| {
            let text = row_text(row);
            wrapped.iter().any(|token| text.contains(token.as_str()))
        })
        .map(|r| RowBinding::new(t, r))
    })
}

/// Expand a group with the default markers and the discovery heuristic.
///
/// Returns `None` when the group is empty or no row qualifies.
pub fn expand_group(doc: &mut Document, group: &str, items: &[ItemRecord]) -> Option<GroupExpansion> {
    // Without a binding the only error path is unreachable.
    expand_group_with(doc, group, items, TokenPattern::guillemets(), None)
        .ok()
        .flatten()
}

/// Expand a group at an explicit row, or at the discovered row.
///
/// The template row is replaced in place by one clone per item, in item
/// order, each substituted with its own item. Item keys missing from the
/// row, and row tokens missing from an item, are left alone.
pub fn expand_group_with(
    doc: &mut Document,
    group: &str,
    items: &[ItemRecord],
    pattern: &TokenPattern,
    binding: Option<RowBinding>,
) -> Result<Option<GroupExpansion>> {
    if items.is_empty() {
        debug!("group '{}' has no items; nothing to expand", group);
        return Ok(None);
    }

    let (at, bound) = match binding {
        Some(b) => (b, true),
        None => match find_template_row(doc, items, pattern) {
            Some(b) => (b, false),
            None => {
                debug!("no template row found for group '{}'", group);
                return Ok(None);
            }
        },
    };

    let invalid = || Error::InvalidBinding {
        group: group.to_string(),
        table: at.table,
        row: at.row,
    };
    let table = doc.tables_mut().nth(at.table).ok_or_else(invalid)?;
    let template = table.rows.get(at.row).cloned().ok_or_else(invalid)?;

    let mut substitutions = 0;
    let rows: Vec<TableRow> = items
        .iter()
        .map(|item| {
            let mut row = template.clone();
            for paragraph in row.paragraphs_mut() {
                substitutions += substitute_with(paragraph, item, pattern);
            }
            row
        })
        .collect();

    let rows_inserted = rows.len();
    table.rows.splice(at.row..=at.row, rows);

    debug!(
        "expanded group '{}' at table {} row {}: {} row(s), {} substitution(s)",
        group, at.table, at.row, rows_inserted, substitutions
    );

    Ok(Some(GroupExpansion {
        group: group.to_string(),
        at,
        bound,
        rows_inserted,
        substitutions,
    }))
}

fn row_text(row: &TableRow) -> String {
    row.cells
        .iter()
        .map(|cell| cell.plain_text())
        .collect::<Vec<_>>()
        .join(" ")
}
