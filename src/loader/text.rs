//! Plain text templates.
//!
//! The format is line oriented:
//!
//! - a non-empty line is a paragraph; leading `#` marks make it a heading
//! - consecutive lines containing tabs form one table, one row per line,
//!   cells split on `\t`
//! - a line holding only a form feed (`\f`) is a page break
//! - blank lines separate blocks and are otherwise ignored

use log::debug;
use std::fs;
use std::path::Path;

use super::TemplateLoader;
use crate::error::{Error, Result};
use crate::model::{Block, Document, Paragraph, Table, TableRow};

/// Loader for `.txt` templates.
#[derive(Debug, Clone, Default)]
pub struct TextTemplateLoader {
    _private: (),
}

impl TextTemplateLoader {
    /// Create a new text template loader.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Parse template text into a document.
    pub fn parse(&self, text: &str) -> Document {
        let mut doc = Document::new();
        let mut table: Option<Table> = None;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');

            if line.contains('\t') {
                table
                    .get_or_insert_with(Table::new)
                    .add_row(TableRow::from_strings(line.split('\t')));
                continue;
            }

            if let Some(t) = table.take() {
                doc.add_table(t);
            }

            if line.trim_matches(' ') == "\u{c}" {
                doc.add_block(Block::PageBreak);
            } else if !line.trim().is_empty() {
                doc.add_paragraph(parse_paragraph(line));
            }
        }

        if let Some(t) = table.take() {
            doc.add_table(t);
        }

        doc
    }
}

fn parse_paragraph(line: &str) -> Paragraph {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&hashes) && line[hashes..].starts_with(' ') {
        Paragraph::heading(line[hashes..].trim(), hashes as u8)
    } else {
        Paragraph::with_text(line)
    }
}

impl TemplateLoader for TextTemplateLoader {
    fn supported_extensions(&self) -> &[&str] {
        &["txt", "text"]
    }

    fn name(&self) -> &str {
        "text"
    }

    fn load(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path)?;
        let mut doc = self.load_bytes(&bytes)?;
        doc.metadata.source = Some(path.display().to_string());
        debug!("loaded text template {} ({} blocks)", path.display(), doc.body.len());
        Ok(doc)
    }

    fn load_bytes(&self, bytes: &[u8]) -> Result<Document> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::TemplateLoad(format!("template is not UTF-8: {}", e)))?;
        Ok(self.parse(text))
    }
}
