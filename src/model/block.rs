//! Block-level document nodes.

use super::{Paragraph, Table};
use serde::{Deserialize, Serialize};

/// A block-level node in the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),

    /// A table
    Table(Table),

    /// A page break marker
    PageBreak,
}

impl Block {
    /// Check if this block is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    /// Get plain text of the block, if it carries any.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Block::Paragraph(p) => Some(p.plain_text()),
            Block::Table(t) => Some(t.plain_text()),
            Block::PageBreak => None,
        }
    }
}

impl From<Paragraph> for Block {
    fn from(p: Paragraph) -> Self {
        Block::Paragraph(p)
    }
}

impl From<Table> for Block {
    fn from(t: Table) -> Self {
        Block::Table(t)
    }
}
