//! Integration tests for template loading and document output.

use serde_json::json;
use shipdoc::loader::{LoaderRegistry, TemplateLoader};
use shipdoc::{
    load_template, merge, save_document, Block, DataRecord, Document, Error, MergeEngine,
    MergeOptions, Paragraph, Result, Table, TableRow, TextRun,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Loader for a made-up `.tpl` format: every line is a paragraph.
struct LineLoader;

impl TemplateLoader for LineLoader {
    fn supported_extensions(&self) -> &[&str] {
        &["tpl"]
    }

    fn name(&self) -> &str {
        "lines"
    }

    fn load(&self, path: &Path) -> Result<Document> {
        self.load_bytes(&fs::read(path)?)
    }

    fn load_bytes(&self, bytes: &[u8]) -> Result<Document> {
        let mut doc = Document::new();
        for line in String::from_utf8_lossy(bytes).lines() {
            doc.add_paragraph(Paragraph::with_text(line));
        }
        Ok(doc)
    }
}

const PROFORMA_TEMPLATE: &str = "# PROFORMA INVOICE\n\
Invoice «invoice_no» dated «date»\n\
\n\
Description\tQty\tRate\tTotal\n\
«description»\t«quantity»\t«unit_rate»\t«total»\n\
Total: «total_amount»\n";

fn proforma() -> DataRecord {
    DataRecord::from_json(json!({
        "invoice_no": "PI-118",
        "date": "16-10-2026",
        "line_items": [
            {"description": "Valve", "quantity": "2", "unit_rate": "10.00", "total": "20.00"},
            {"description": "Pump", "quantity": "1", "unit_rate": "99.50", "total": "99.50"}
        ],
        "total_amount": "119.50"
    }))
    .unwrap()
}

#[test]
fn test_text_template_merge_and_save_formats() {
    let dir = TempDir::new().unwrap();
    let template_path = dir.path().join("proforma_invoice.txt");
    fs::write(&template_path, PROFORMA_TEMPLATE).unwrap();

    let template = load_template(&template_path).unwrap();
    assert_eq!(
        template.metadata.source.as_deref(),
        Some(template_path.display().to_string().as_str())
    );

    let merged = merge(template, &proforma());

    let txt = dir.path().join("out.txt");
    save_document(&merged, &txt).unwrap();
    let text = fs::read_to_string(&txt).unwrap();
    assert!(text.contains("Invoice PI-118 dated 16-10-2026"));
    assert!(text.contains("Valve\t2\t10.00\t20.00\nPump\t1\t99.50\t99.50"));
    assert!(text.ends_with("Total: 119.50"));

    let md = dir.path().join("out.md");
    save_document(&merged, &md).unwrap();
    let markdown = fs::read_to_string(&md).unwrap();
    assert!(markdown.contains("# PROFORMA INVOICE"));
    assert!(markdown.contains("| Pump | 1 | 99.50 | 99.50 |"));
}

#[test]
fn test_json_output_reloads_as_template() {
    let dir = TempDir::new().unwrap();
    let template_path = dir.path().join("proforma_invoice.txt");
    fs::write(&template_path, PROFORMA_TEMPLATE).unwrap();

    let merged = merge(load_template(&template_path).unwrap(), &proforma());
    let json_path = dir.path().join("merged.json");
    save_document(&merged, &json_path).unwrap();

    let reloaded = load_template(&json_path).unwrap();
    assert_eq!(reloaded.body, merged.body);
    assert_eq!(reloaded.tables().next().unwrap().row_count(), 3);
}

/// A Word packing list whose PO token was split by the editor.
fn word_template() -> Document {
    let mut doc = Document::new();
    doc.add_paragraph(Paragraph::heading("PACKING LIST", 1));
    let mut po = Paragraph::new();
    po.add_run(TextRun::bold("PO No: «po"));
    po.add_text("_no»");
    doc.add_paragraph(po);
    let mut table = Table::with_header(1);
    table.add_row(TableRow::from_strings(["No", "Material"]));
    table.add_row(TableRow::from_strings(["«item_number»", "«material»"]));
    doc.add_table(table);
    doc
}

#[test]
fn test_docx_template_merge_round_trip() {
    let dir = TempDir::new().unwrap();
    let template_path = dir.path().join("packing_list.docx");
    save_document(&word_template(), &template_path).unwrap();

    let template = load_template(&template_path).unwrap();
    assert_eq!(template.body, word_template().body);

    let data = DataRecord::from_json(json!({
        "po_no": "PO-12",
        "items": [
            {"item_number": "1", "material": "GRP"},
            {"item_number": "2", "material": "Steel"}
        ]
    }))
    .unwrap();
    let engine = MergeEngine::new(MergeOptions::new().coalesce()).unwrap();
    let (merged, report) = engine.merge(template, &data).unwrap();
    assert!(report.unresolved.is_empty());

    let out = dir.path().join("merged.docx");
    save_document(&merged, &out).unwrap();
    let reloaded = load_template(&out).unwrap();

    assert_eq!(reloaded.body, merged.body);
    let Block::Paragraph(po) = &reloaded.body[1] else {
        panic!("expected paragraph");
    };
    assert_eq!(po.plain_text(), "PO No: PO-12");
    assert!(po.runs[0].style.bold);
    let rows: Vec<String> = reloaded
        .tables()
        .next()
        .unwrap()
        .rows
        .iter()
        .map(|r| r.plain_text())
        .collect();
    assert_eq!(rows, vec!["No\tMaterial", "1\tGRP", "2\tSteel"]);
}

#[test]
fn test_corrupt_docx_template() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.docx");
    fs::write(&path, b"not a zip").unwrap();
    assert!(matches!(load_template(&path), Err(Error::TemplateLoad(_))));
}

#[test]
fn test_save_unknown_extension_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.pdf");
    let err = save_document(&Document::new(), &path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert!(!path.exists());
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("out.json");
    let err = save_document(&Document::new(), &path).unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[test]
fn test_malformed_json_template() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"body\": [").unwrap();
    assert!(matches!(load_template(&path), Err(Error::TemplateLoad(_))));
}

#[test]
fn test_custom_loader_registration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("note.tpl");
    fs::write(&path, "Dear «consignee»\nRegards").unwrap();

    let mut registry = LoaderRegistry::with_defaults();
    assert!(registry.load(&path).is_err());

    registry.register(Arc::new(LineLoader));
    assert!(registry.supports("TPL"));
    assert_eq!(registry.get_by_name("lines").unwrap().name(), "lines");

    let doc = registry.load(&path).unwrap();
    let merged = merge(
        doc,
        &DataRecord::from_json(json!({"consignee": "Acme"})).unwrap(),
    );
    assert_eq!(merged.plain_text(), "Dear Acme\n\nRegards");
}

#[cfg(feature = "async")]
mod async_io {
    use super::*;
    use shipdoc::{load_template_async, save_document_async};

    #[tokio::test]
    async fn test_async_round_trip() {
        let dir = TempDir::new().unwrap();
        let template_path = dir.path().join("proforma_invoice.txt");
        tokio::fs::write(&template_path, PROFORMA_TEMPLATE).await.unwrap();

        let template = load_template_async(&template_path).await.unwrap();
        let merged = merge(template, &proforma());

        let out = dir.path().join("merged.txt");
        save_document_async(&merged, &out).await.unwrap();
        let text = tokio::fs::read_to_string(&out).await.unwrap();
        assert!(text.contains("Pump\t1\t99.50\t99.50"));
    }

    #[tokio::test]
    async fn test_async_missing_template() {
        let err = load_template_async("/nonexistent/template.json").await.unwrap_err();
        assert!(matches!(err, Error::TemplateLoad(_)));
    }
}
