//! Plain text rendering for documents.

use crate::model::{Block, Document};

/// Convert a document to plain text.
///
/// Paragraphs are separated by blank lines, table rows are one line each
/// with tab-separated cells, and a page break becomes a form feed.
pub fn to_text(doc: &Document) -> String {
    let mut output = String::new();

    for block in &doc.body {
        match block {
            Block::Paragraph(p) => {
                output.push_str(&p.plain_text());
                output.push_str("\n\n");
            }
            Block::Table(t) => {
                for row in &t.rows {
                    output.push_str(&row.plain_text().replace('\n', " "));
                    output.push('\n');
                }
                output.push('\n');
            }
            Block::PageBreak => output.push_str("\u{c}\n"),
        }
    }

    output.trim().to_string()
}
