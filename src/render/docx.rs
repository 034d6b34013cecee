//! WordprocessingML (`.docx`) output.
//!
//! The package holds the three parts Word needs to open a document:
//! `[Content_Types].xml`, `_rels/.rels` and `word/document.xml`. Headings
//! use the built-in `Heading1`..`Heading6` style ids.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::{Alignment, Block, Document, Paragraph, Table, TextRun};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Convert a document to a `.docx` package.
pub fn to_docx(doc: &Document) -> Result<Vec<u8>> {
    let body = document_xml(doc)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/document.xml", body.as_slice()),
    ] {
        zip.start_file(name, options).map_err(package_error)?;
        zip.write_all(content)?;
    }
    let cursor = zip.finish().map_err(package_error)?;
    Ok(cursor.into_inner())
}

/// Serialize the body of `doc` as `word/document.xml`.
pub fn document_xml(doc: &Document) -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    emit(
        &mut w,
        Event::Start(BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)])),
    )?;
    open(&mut w, "w:body")?;

    for block in &doc.body {
        match block {
            Block::Paragraph(p) => write_paragraph(&mut w, p)?,
            Block::Table(t) => write_table(&mut w, t)?,
            Block::PageBreak => {
                open(&mut w, "w:p")?;
                open(&mut w, "w:r")?;
                empty_with(&mut w, "w:br", &[("w:type", "page")])?;
                close(&mut w, "w:r")?;
                close(&mut w, "w:p")?;
            }
        }
    }

    close(&mut w, "w:body")?;
    close(&mut w, "w:document")?;
    Ok(w.into_inner())
}

fn write_paragraph(w: &mut Writer<Vec<u8>>, p: &Paragraph) -> Result<()> {
    open(w, "w:p")?;

    let style = p
        .style
        .heading_level
        .map(|level| format!("Heading{}", level.clamp(1, 6)))
        .or_else(|| p.style.style_name.clone());
    let jc = match p.style.alignment {
        Alignment::Left => None,
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
        Alignment::Justify => Some("both"),
    };
    if style.is_some() || jc.is_some() {
        open(w, "w:pPr")?;
        if let Some(style) = &style {
            empty_with(w, "w:pStyle", &[("w:val", style.as_str())])?;
        }
        if let Some(jc) = jc {
            empty_with(w, "w:jc", &[("w:val", jc)])?;
        }
        close(w, "w:pPr")?;
    }

    for run in &p.runs {
        write_run(w, run)?;
    }
    close(w, "w:p")
}

fn write_run(w: &mut Writer<Vec<u8>>, run: &TextRun) -> Result<()> {
    open(w, "w:r")?;

    let s = &run.style;
    let size = s.font_size.map(|pt| ((pt * 2.0).round() as u32).to_string());
    let color = s.color.as_deref().map(|c| c.trim_start_matches('#'));
    if s.has_styling() || s.font_name.is_some() || size.is_some() || color.is_some() {
        open(w, "w:rPr")?;
        if let Some(font) = &s.font_name {
            empty_with(w, "w:rFonts", &[("w:ascii", font.as_str()), ("w:hAnsi", font.as_str())])?;
        }
        if s.bold {
            empty_with(w, "w:b", &[])?;
        }
        if s.italic {
            empty_with(w, "w:i", &[])?;
        }
        if let Some(color) = color {
            empty_with(w, "w:color", &[("w:val", color)])?;
        }
        if let Some(size) = &size {
            empty_with(w, "w:sz", &[("w:val", size.as_str())])?;
        }
        if s.underline {
            empty_with(w, "w:u", &[("w:val", "single")])?;
        }
        close(w, "w:rPr")?;
    }

    // Line breaks and tabs are elements of their own in a run.
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            empty_with(w, "w:br", &[])?;
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                empty_with(w, "w:tab", &[])?;
            }
            if !piece.is_empty() {
                emit(
                    w,
                    Event::Start(
                        BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
                    ),
                )?;
                emit(w, Event::Text(BytesText::new(piece)))?;
                close(w, "w:t")?;
            }
        }
    }
    close(w, "w:r")
}

fn write_table(w: &mut Writer<Vec<u8>>, table: &Table) -> Result<()> {
    open(w, "w:tbl")?;
    open(w, "w:tblPr")?;
    empty_with(w, "w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    close(w, "w:tblPr")?;

    for (i, row) in table.rows.iter().enumerate() {
        open(w, "w:tr")?;
        if i < table.header_rows as usize {
            open(w, "w:trPr")?;
            empty_with(w, "w:tblHeader", &[])?;
            close(w, "w:trPr")?;
        }
        for cell in &row.cells {
            open(w, "w:tc")?;
            if cell.colspan > 1 {
                open(w, "w:tcPr")?;
                let span = cell.colspan.to_string();
                empty_with(w, "w:gridSpan", &[("w:val", span.as_str())])?;
                close(w, "w:tcPr")?;
            }
            // A cell must end with a paragraph.
            if cell.content.is_empty() {
                write_paragraph(w, &Paragraph::new())?;
            }
            for p in &cell.content {
                write_paragraph(w, p)?;
            }
            close(w, "w:tc")?;
        }
        close(w, "w:tr")?;
    }
    close(w, "w:tbl")
}

fn emit(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    w.write_event(event)
        .map_err(|e| Error::Serialization(format!("docx: {}", e)))
}

fn open(w: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(w, Event::Start(BytesStart::new(name)))
}

fn close(w: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(w, Event::End(BytesEnd::new(name)))
}

fn empty_with(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    emit(
        w,
        Event::Empty(BytesStart::new(name).with_attributes(attrs.iter().copied())),
    )
}

fn package_error(e: zip::result::ZipError) -> Error {
    Error::Serialization(format!("docx package: {}", e))
}
