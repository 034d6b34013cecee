//! Markdown rendering for documents.

use crate::model::{Alignment, Block, Document, Paragraph, Table, TextRun, TextStyle};

use super::RenderOptions;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(doc)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &Document) -> String {
        let mut output = String::new();

        if self.options.include_title {
            if let Some(ref title) = doc.metadata.title {
                output.push_str("# ");
                output.push_str(&self.escape(title));
                output.push_str("\n\n");
            }
        }

        for block in &doc.body {
            self.render_block(&mut output, block);
        }

        output.trim().to_string()
    }

    fn render_block(&self, output: &mut String, block: &Block) {
        match block {
            Block::Paragraph(p) => self.render_paragraph(output, p),
            Block::Table(t) => self.render_table(output, t),
            Block::PageBreak => output.push_str("---\n\n"),
        }
    }

    fn render_paragraph(&self, output: &mut String, para: &Paragraph) {
        if para.is_empty() {
            return;
        }

        if let Some(level) = para.heading_level() {
            let level = level.min(self.options.max_heading_level).max(1);
            output.push_str(&"#".repeat(level as usize));
            output.push(' ');
            self.render_runs(output, para, false);
            output.push_str("\n\n");
            return;
        }

        self.render_runs(output, para, self.options.preserve_line_breaks);
        output.push_str("\n\n");
    }

    fn render_runs(&self, output: &mut String, para: &Paragraph, line_breaks: bool) {
        let mut text = String::new();
        for run in &para.runs {
            self.render_text_run(&mut text, run);
        }
        let text = text.trim_end_matches('\n');
        if line_breaks {
            output.push_str(&text.replace('\n', "  \n"));
        } else {
            output.push_str(&text.replace('\n', " "));
        }
    }

    fn render_text_run(&self, output: &mut String, run: &TextRun) {
        if run.text.trim().is_empty() {
            output.push_str(&run.text);
            return;
        }

        let text = self.escape(&run.text);

        // Keep surrounding whitespace outside the emphasis markers.
        let trimmed = text.trim();
        let lead = &text[..text.len() - text.trim_start().len()];
        let trail = &text[text.trim_end().len()..];

        output.push_str(lead);
        output.push_str(&apply_text_style(trimmed, &run.style));
        output.push_str(trail);
    }

    fn render_table(&self, output: &mut String, table: &Table) {
        let col_count = table.column_count();
        if table.is_empty() || col_count == 0 {
            return;
        }

        let header_rows = (table.header_rows as usize).max(1);
        for (i, row) in table.rows.iter().enumerate() {
            output.push('|');
            for c in 0..col_count {
                let content = row
                    .cells
                    .get(c)
                    .map(|cell| {
                        let text = cell.plain_text();
                        if self.options.escape_special_chars {
                            escape_markdown(&text)
                        } else {
                            text.replace('|', "\\|")
                        }
                    })
                    .unwrap_or_default();
                output.push_str(&format!(" {} |", content.trim().replace('\n', "<br>")));
            }
            output.push('\n');

            if i + 1 == header_rows {
                output.push('|');
                for c in 0..col_count {
                    let alignment = table.rows[0]
                        .cells
                        .get(c)
                        .map(|cell| cell.alignment)
                        .unwrap_or_default();
                    output.push_str(match alignment {
                        Alignment::Left | Alignment::Justify => " --- |",
                        Alignment::Center => " :---: |",
                        Alignment::Right => " ---: |",
                    });
                }
                output.push('\n');
            }
        }

        output.push('\n');
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

fn apply_text_style(text: &str, style: &TextStyle) -> String {
    let mut result = text.to_string();

    if style.italic {
        result = format!("*{}*", result);
    }
    if style.bold {
        result = format!("**{}**", result);
    }
    if style.underline {
        result = format!("<u>{}</u>", result);
    }

    result
}

/// Escape characters that could be misread as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
