//! The print workflow: stored record in, merged document file out.

use chrono::{DateTime, Local};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::loader::{save_document, LoaderRegistry};
use crate::merge::{MergeEngine, MergeOptions, ScanReport};
use crate::record::DocumentFamily;
use crate::store::RecordStore;

/// Print a stored record now. See [`print_record_at`].
pub fn print_record(
    store: &dyn RecordStore,
    config: &Config,
    family: DocumentFamily,
    id: &str,
    options: &MergeOptions,
) -> Result<PathBuf> {
    print_record_at(store, config, family, id, options, Local::now())
}

/// Fetch a record, merge it into its family template, and write the result.
///
/// The file lands in `config.output_dir` under the family's dated file
/// name. Token markers come from `config` unless `options` sets its own,
/// which may be the default guillemets.
/// Nothing is written if any step fails.
pub fn print_record_at(
    store: &dyn RecordStore,
    config: &Config,
    family: DocumentFamily,
    id: &str,
    options: &MergeOptions,
    at: DateTime<Local>,
) -> Result<PathBuf> {
    let stored = store.get(family, id)?;

    let template_path = config.template_path(family);
    let template = LoaderRegistry::with_defaults().load(&template_path)?;

    let markers = options.markers_or(&config.markers).clone();
    let engine = MergeEngine::new(options.clone().with_markers(markers))?;

    let report = ScanReport::with_pattern(&template, &stored.data, engine.pattern());
    if !report.missing.is_empty() {
        warn!(
            "{} has no value for: {}",
            stored.id,
            report.missing.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    let (mut merged, merge_report) = engine.merge(template, &stored.data)?;
    merged.metadata.title = Some(family.title().to_string());
    merged.metadata.family = Some(family.as_str().to_string());
    merged.metadata.created = Some(at.with_timezone(&chrono::Utc));

    fs::create_dir_all(&config.output_dir)?;
    let path = config
        .output_dir
        .join(family.output_file_name(&at, config.output_format.extension()));
    save_document(&merged, &path)?;

    info!(
        "printed {}/{} to {} ({} substitutions, {} rows)",
        family,
        stored.id,
        path.display(),
        merge_report.total_substitutions(),
        merge_report.rows_inserted()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::loader::OutputFormat;
    use crate::model::{Document, Paragraph, Table, TableRow};
    use crate::record::DataRecord;
    use crate::render::{to_json, JsonFormat};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_template(dir: &std::path::Path) {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("PO «po_no»"));
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["«item_number»", "«material»"]));
        doc.add_table(table);
        fs::write(
            dir.join("packing_list.json"),
            to_json(&doc, JsonFormat::Pretty).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_print_record_writes_dated_file() {
        let dir = TempDir::new().unwrap();
        write_template(dir.path());
        let config = Config::default()
            .with_template_dir(dir.path())
            .with_output_dir(dir.path().join("out"))
            .with_output_format(OutputFormat::Text);

        let store = MemoryStore::new();
        let data = DataRecord::from_json(json!({
            "po_no": "PO-9",
            "items": [
                {"item_number": "1", "material": "GRP"},
                {"item_number": "2", "material": "Steel"}
            ]
        }))
        .unwrap();
        let stored = store.insert(DocumentFamily::PackingList, data).unwrap();

        let at = Local.with_ymd_and_hms(2026, 10, 16, 15, 5, 0).unwrap();
        let path = print_record_at(
            &store,
            &config,
            DocumentFamily::PackingList,
            &stored.id,
            &MergeOptions::default(),
            at,
        )
        .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "Packaging-List-16October2026-3.05pm.txt"
        );
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "PO PO-9\n\n1\tGRP\n2\tSteel");
    }

    #[test]
    fn test_print_marker_override() {
        use crate::merge::TokenMarkers;

        let dir = TempDir::new().unwrap();
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("«po_no» {{po_no}}"));
        fs::write(
            dir.path().join("packing_list.json"),
            to_json(&doc, JsonFormat::Compact).unwrap(),
        )
        .unwrap();

        let config = Config::default()
            .with_template_dir(dir.path())
            .with_output_dir(dir.path().join("out"))
            .with_output_format(OutputFormat::Text)
            .with_markers(TokenMarkers::new("{{", "}}").unwrap());
        let store = MemoryStore::new();
        let data = DataRecord::from_json(json!({"po_no": "PO-3"})).unwrap();
        let id = store.insert(DocumentFamily::PackingList, data).unwrap().id;
        let family = DocumentFamily::PackingList;

        let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let path = print_record_at(&store, &config, family, &id, &MergeOptions::default(), at).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "«po_no» PO-3");

        let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 1, 0).unwrap();
        let guillemets = MergeOptions::new().with_markers(TokenMarkers::default());
        let path = print_record_at(&store, &config, family, &id, &guillemets, at).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "PO-3 {{po_no}}");
    }

    #[test]
    fn test_print_missing_template_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let config = Config::default()
            .with_template_dir(dir.path())
            .with_output_dir(&out);
        let store = MemoryStore::new();
        let stored = store
            .insert(DocumentFamily::ExportInvoice, DataRecord::new())
            .unwrap();

        let err = print_record(
            &store,
            &config,
            DocumentFamily::ExportInvoice,
            &stored.id,
            &MergeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TemplateLoad(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_print_unknown_record() {
        let config = Config::default();
        let err = print_record(
            &MemoryStore::new(),
            &config,
            DocumentFamily::PackingList,
            "nope",
            &MergeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(_)));
    }
}
