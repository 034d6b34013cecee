//! Table types.

use super::{Alignment, Paragraph};
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    #[serde(default)]
    pub rows: Vec<TableRow>,

    /// Number of header rows (0 = no header)
    #[serde(default)]
    pub header_rows: u8,

    /// Table caption
    #[serde(default)]
    pub caption: Option<String>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with header.
    pub fn with_header(header_rows: u8) -> Self {
        Self {
            header_rows,
            ..Self::new()
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (based on first row).
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get header rows.
    pub fn header(&self) -> &[TableRow] {
        let n = (self.header_rows as usize).min(self.rows.len());
        &self.rows[..n]
    }

    /// Get body rows (non-header).
    pub fn body(&self) -> &[TableRow] {
        let n = (self.header_rows as usize).min(self.rows.len());
        &self.rows[n..]
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    /// Get plain text representation, cells separated by tabs.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }

    /// Iterate over every paragraph in the row.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.cells.iter().flat_map(|c| c.content.iter())
    }

    /// Iterate mutably over every paragraph in the row.
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.cells.iter_mut().flat_map(|c| c.content.iter_mut())
    }
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content (paragraphs)
    #[serde(default)]
    pub content: Vec<Paragraph>,

    /// Number of rows this cell spans
    #[serde(default = "one")]
    pub rowspan: u8,

    /// Number of columns this cell spans
    #[serde(default = "one")]
    pub colspan: u8,

    /// Cell alignment
    #[serde(default)]
    pub alignment: Alignment,
}

fn one() -> u8 {
    1
}

impl Default for TableCell {
    fn default() -> Self {
        Self::empty()
    }
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Paragraph::with_text(text)])
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        Self::with_content(Vec::new())
    }

    /// Create a cell with multiple paragraphs.
    pub fn with_content(content: Vec<Paragraph>) -> Self {
        Self {
            content,
            rowspan: 1,
            colspan: 1,
            alignment: Alignment::Left,
        }
    }

    /// Set colspan and return self.
    pub fn colspan(mut self, span: u8) -> Self {
        self.colspan = span;
        self
    }

    /// Set alignment and return self.
    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Get plain text content.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|p| p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_table_with_data() {
        let mut table = Table::with_header(1);
        table.add_row(TableRow::from_strings(["Line", "Part No"]));
        table.add_row(TableRow::from_strings(["«line_no»", "«part_number»"]));

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.header().len(), 1);
        assert_eq!(table.body().len(), 1);
        assert_eq!(table.plain_text(), "Line\tPart No\n«line_no»\t«part_number»");
    }

    #[test]
    fn test_header_rows_beyond_len() {
        let mut table = Table::with_header(3);
        table.add_row(TableRow::from_strings(["a"]));
        assert_eq!(table.header().len(), 1);
        assert!(table.body().is_empty());
    }

    #[test]
    fn test_row_paragraphs() {
        let mut row = TableRow::new(vec![
            TableCell::with_content(vec![Paragraph::with_text("a"), Paragraph::with_text("b")]),
            TableCell::text("c"),
        ]);
        assert_eq!(row.paragraphs().count(), 3);
        for p in row.paragraphs_mut() {
            p.add_text("!");
        }
        assert_eq!(row.plain_text(), "a! b!\tc!");
    }

    #[test]
    fn test_cell_defaults_from_json() {
        let cell: TableCell = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(cell.colspan, 1);
        assert_eq!(cell.rowspan, 1);
        assert!(cell.is_empty());
    }
}
