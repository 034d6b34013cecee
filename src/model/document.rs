//! Document-level types.

use super::{Block, Paragraph, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A structured document: the tree a template is parsed into and a merge
/// produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Block-level content in reading order
    #[serde(default)]
    pub body: Vec<Block>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block to the body.
    pub fn add_block(&mut self, block: Block) {
        self.body.push(block);
    }

    /// Add a paragraph to the body.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(Block::Paragraph(paragraph));
    }

    /// Add a table to the body.
    pub fn add_table(&mut self, table: Table) {
        self.body.push(Block::Table(table));
    }

    /// Check if the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Every paragraph in document order: top-level paragraphs and those
    /// nested in table cells.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        for block in &self.body {
            match block {
                Block::Paragraph(p) => out.push(p),
                Block::Table(t) => {
                    for row in &t.rows {
                        out.extend(row.paragraphs());
                    }
                }
                Block::PageBreak => {}
            }
        }
        out
    }

    /// Mutable counterpart of [`Document::paragraphs`].
    pub fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut out = Vec::new();
        for block in &mut self.body {
            match block {
                Block::Paragraph(p) => out.push(p),
                Block::Table(t) => {
                    for row in &mut t.rows {
                        out.extend(row.paragraphs_mut());
                    }
                }
                Block::PageBreak => {}
            }
        }
        out
    }

    /// Tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Mutable tables in document order.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.body.iter_mut().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Get the number of tables.
    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.body
            .iter()
            .filter_map(|b| b.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document family the template belongs to (e.g. "packing_list")
    pub family: Option<String>,

    /// Template file the document was loaded from
    pub source: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Create metadata with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}
