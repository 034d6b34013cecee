//! Word (`.docx`) templates.
//!
//! Only `word/document.xml` is read. Paragraphs (`w:p`), runs (`w:r`) and
//! tables (`w:tbl`, `w:tr`, `w:tc`) map onto the document model; bold,
//! italic, underline, font, size and color survive on each run. Headers,
//! footers, drawings and field codes are ignored.

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use super::TemplateLoader;
use crate::error::{Error, Result};
use crate::model::{Alignment, Block, Document, Paragraph, Table, TableCell, TableRow, TextRun};

const DOCUMENT_PART: &str = "word/document.xml";

/// Loader for `.docx` templates.
#[derive(Debug, Clone, Default)]
pub struct DocxTemplateLoader {
    _private: (),
}

impl DocxTemplateLoader {
    /// Create a new docx template loader.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Parse the main document part of a package.
    pub fn parse_document_xml(&self, xml: &str) -> Result<Document> {
        let mut reader = Reader::from_str(xml);
        let mut builder = Builder::default();

        loop {
            match reader.read_event().map_err(load_error)? {
                Event::Start(e) => builder.start(&e, false)?,
                Event::Empty(e) => builder.start(&e, true)?,
                Event::End(e) => builder.end(e.name().as_ref()),
                Event::Text(t) if builder.in_text => {
                    let text = t.unescape().map_err(load_error)?;
                    builder.push_text(&text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(builder.doc)
    }
}

impl TemplateLoader for DocxTemplateLoader {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn load(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path)?;
        let mut doc = self.load_bytes(&bytes)?;
        doc.metadata.source = Some(path.display().to_string());
        debug!("loaded docx template {} ({} blocks)", path.display(), doc.body.len());
        Ok(doc)
    }

    fn load_bytes(&self, bytes: &[u8]) -> Result<Document> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(load_error)?;
        let mut part = archive.by_name(DOCUMENT_PART).map_err(load_error)?;
        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| Error::TemplateLoad(format!("{}: {}", DOCUMENT_PART, e)))?;
        self.parse_document_xml(&xml)
    }
}

fn load_error(e: impl std::fmt::Display) -> Error {
    Error::TemplateLoad(format!("docx: {}", e))
}

/// A table being read, with its open row and cell.
#[derive(Default)]
struct OpenTable {
    table: Table,
    row: Option<TableRow>,
    cell: Option<TableCell>,
}

#[derive(Default)]
struct Builder {
    doc: Document,
    tables: Vec<OpenTable>,
    paragraph: Option<Paragraph>,
    run: Option<TextRun>,
    in_text: bool,
    page_break: bool,
}

impl Builder {
    fn start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = e.name();
        match name.as_ref() {
            b"w:tbl" => self.tables.push(OpenTable::default()),
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    t.row = Some(TableRow::default());
                }
            }
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    t.cell = Some(TableCell::empty());
                }
            }
            b"w:tblHeader" => {
                if let Some(t) = self.tables.last_mut() {
                    if t.table.header_rows as usize == t.table.rows.len() && on(e)? {
                        t.table.header_rows += 1;
                    }
                }
            }
            b"w:gridSpan" => {
                let span = val(e)?.and_then(|v| v.parse::<u8>().ok());
                if let (Some(cell), Some(span)) = (self.open_cell(), span) {
                    cell.colspan = span.max(1);
                }
            }
            b"w:p" => self.paragraph = Some(Paragraph::new()),
            b"w:pStyle" => {
                if let (Some(p), Some(style)) = (self.paragraph.as_mut(), val(e)?) {
                    match heading_level(&style) {
                        Some(level) => p.style.heading_level = Some(level),
                        None => p.style.style_name = Some(style),
                    }
                }
            }
            b"w:jc" if self.run.is_none() => {
                if let (Some(p), Some(jc)) = (self.paragraph.as_mut(), val(e)?) {
                    p.style.alignment = alignment(&jc);
                }
            }
            b"w:r" => self.run = Some(TextRun::new("")),
            b"w:b" | b"w:i" | b"w:u" => {
                let set = on(e)?;
                if let Some(run) = self.run.as_mut() {
                    match name.as_ref() {
                        b"w:b" => run.style.bold = set,
                        b"w:i" => run.style.italic = set,
                        _ => run.style.underline = set,
                    }
                }
            }
            b"w:rFonts" => {
                let font = match attr(e, b"w:ascii")? {
                    Some(font) => Some(font),
                    None => attr(e, b"w:hAnsi")?,
                };
                if let (Some(run), Some(font)) = (self.run.as_mut(), font) {
                    run.style.font_name = Some(font);
                }
            }
            b"w:sz" => {
                let half_points = val(e)?.and_then(|v| v.parse::<f32>().ok());
                if let (Some(run), Some(hp)) = (self.run.as_mut(), half_points) {
                    run.style.font_size = Some(hp / 2.0);
                }
            }
            b"w:color" => {
                let color = val(e)?.filter(|c| c != "auto");
                if let (Some(run), Some(color)) = (self.run.as_mut(), color) {
                    run.style.color = Some(format!("#{}", color));
                }
            }
            b"w:t" => self.in_text = !empty,
            b"w:tab" if self.run.is_some() => self.push_text("\t"),
            b"w:br" | b"w:cr" if self.run.is_some() => {
                if attr(e, b"w:type")?.as_deref() == Some("page") {
                    self.page_break = true;
                } else {
                    self.push_text("\n");
                }
            }
            _ => {}
        }

        if empty {
            self.end(name.as_ref());
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => {
                if let (Some(p), Some(run)) = (self.paragraph.as_mut(), self.run.take()) {
                    if !run.text.is_empty() {
                        p.add_run(run);
                    }
                }
            }
            b"w:p" => self.finish_paragraph(),
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    if let (Some(row), Some(cell)) = (t.row.as_mut(), t.cell.take()) {
                        row.cells.push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    if let Some(row) = t.row.take() {
                        t.table.add_row(row);
                    }
                }
            }
            b"w:tbl" => {
                if let Some(t) = self.tables.pop() {
                    self.place_table(t.table);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn open_cell(&mut self) -> Option<&mut TableCell> {
        self.tables.last_mut().and_then(|t| t.cell.as_mut())
    }

    fn finish_paragraph(&mut self) {
        let Some(p) = self.paragraph.take() else {
            return;
        };
        let page_break = std::mem::take(&mut self.page_break);

        if let Some(cell) = self.open_cell() {
            cell.content.push(p);
            return;
        }
        // A paragraph that only carries a page break becomes the break.
        if !(page_break && p.runs.is_empty()) {
            self.doc.add_paragraph(p);
        }
        if page_break {
            self.doc.add_block(Block::PageBreak);
        }
    }

    fn place_table(&mut self, table: Table) {
        match self.open_cell() {
            // Nested tables are flattened into the enclosing cell's text.
            Some(cell) => {
                for row in &table.rows {
                    cell.content.push(Paragraph::with_text(row.plain_text()));
                }
            }
            None => self.doc.add_table(table),
        }
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    match e.try_get_attribute(key).map_err(load_error)? {
        Some(a) => Ok(Some(a.unescape_value().map_err(load_error)?.into_owned())),
        None => Ok(None),
    }
}

fn val(e: &BytesStart<'_>) -> Result<Option<String>> {
    attr(e, b"w:val")
}

/// Toggle properties are on unless `w:val` switches them off.
fn on(e: &BytesStart<'_>) -> Result<bool> {
    Ok(!matches!(
        val(e)?.as_deref(),
        Some("0" | "false" | "off" | "none")
    ))
}

fn heading_level(style: &str) -> Option<u8> {
    style
        .strip_prefix("Heading")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
}

fn alignment(jc: &str) -> Alignment {
    match jc {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" | "distribute" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Document {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        );
        DocxTemplateLoader::new().parse_document_xml(&xml).unwrap()
    }

    #[test]
    fn test_paragraph_runs_keep_style() {
        let doc = parse(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/><w:jc w:val="center"/><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>PACKING LIST</w:t></w:r></w:p>
               <w:p><w:r><w:rPr><w:b/><w:sz w:val="24"/></w:rPr><w:t xml:space="preserve">PO: </w:t></w:r><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>«po_no» &amp; co</w:t></w:r></w:p>"#,
        );

        assert_eq!(doc.body.len(), 2);
        let Block::Paragraph(heading) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(heading.heading_level(), Some(2));
        assert_eq!(heading.style.alignment, Alignment::Center);
        assert!(!heading.runs[0].style.bold);

        let Block::Paragraph(p) = &doc.body[1] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].text, "PO: ");
        assert!(p.runs[0].style.bold);
        assert_eq!(p.runs[0].style.font_size, Some(12.0));
        assert_eq!(p.runs[1].text, "«po_no» & co");
        assert!(!p.runs[1].style.bold);
    }

    #[test]
    fn test_split_token_stays_split() {
        let doc = parse(r#"<w:p><w:r><w:t>«po</w:t></w:r><w:r><w:t>_no»</w:t></w:r></w:p>"#);
        let Block::Paragraph(p) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.plain_text(), "«po_no»");
    }

    #[test]
    fn test_table_rows_and_cells() {
        let doc = parse(
            r#"<w:tbl><w:tblPr/><w:tr><w:trPr><w:tblHeader/></w:trPr><w:tc><w:p><w:r><w:t>No</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Material</w:t></w:r></w:p></w:tc></w:tr>
               <w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>«item_number»</w:t></w:r></w:p><w:p/></w:tc></w:tr></w:tbl>"#,
        );

        let table = doc.tables().next().unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.header_rows, 1);
        assert_eq!(table.rows[0].plain_text(), "No\tMaterial");
        let cell = &table.rows[1].cells[0];
        assert_eq!(cell.colspan, 2);
        assert_eq!(cell.content.len(), 2);
        assert_eq!(cell.plain_text(), "«item_number» ");
    }

    #[test]
    fn test_breaks_tabs_and_page_break() {
        let doc = parse(
            r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>
               <w:p><w:r><w:br w:type="page"/></w:r></w:p>
               <w:p><w:r><w:t>next</w:t></w:r></w:p>"#,
        );

        assert_eq!(doc.body.len(), 3);
        assert_eq!(doc.paragraphs()[0].plain_text(), "a\tb\nc");
        assert_eq!(doc.body[1], Block::PageBreak);
        assert_eq!(doc.paragraphs()[1].plain_text(), "next");
    }

    #[test]
    fn test_ignores_deleted_text_and_field_codes() {
        let doc = parse(
            r#"<w:p><w:r><w:instrText> PAGE </w:instrText></w:r><w:del><w:r><w:delText>old</w:delText></w:r></w:del><w:r><w:t>kept</w:t></w:r></w:p>"#,
        );
        assert_eq!(doc.plain_text(), "kept");
    }

    #[test]
    fn test_not_a_package() {
        let err = DocxTemplateLoader::new().load_bytes(b"plain text").unwrap_err();
        assert!(matches!(err, Error::TemplateLoad(_)));
    }

    #[test]
    fn test_round_trip_through_writer() {
        use crate::render::to_docx;

        let doc = parse(
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:rPr><w:i/><w:u w:val="single"/><w:color w:val="FF0000"/></w:rPr><w:t>Invoice «invoice_no»</w:t></w:r></w:p>
               <w:tbl><w:tr><w:tc><w:p><w:r><w:t>«material»</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let reloaded = DocxTemplateLoader::new()
            .load_bytes(&to_docx(&doc).unwrap())
            .unwrap();

        assert_eq!(reloaded.body, doc.body);
        let p = reloaded.paragraphs()[0];
        assert_eq!(p.style.style_name.as_deref(), Some("Title"));
        assert!(p.runs[0].style.italic && p.runs[0].style.underline);
        assert_eq!(p.runs[0].style.color.as_deref(), Some("#FF0000"));
    }
}
