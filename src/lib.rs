//! # shipdoc
//!
//! Records and template merging for trade-shipping documents: packing
//! lists, proforma invoices, and export invoices (form ZC/IN/07).
//!
//! Records are captured against a declared schema, persisted to a record
//! store, and "printed" by substituting their values into the `«key»`
//! placeholder tokens of a document template.
//!
//! ## Quick Start
//!
//! ```no_run
//! use shipdoc::{load_record, load_template, merge, render};
//!
//! fn main() -> shipdoc::Result<()> {
//!     let template = load_template("templates/packing_list.json")?;
//!     let record = load_record("packing_list.json")?;
//!
//!     let merged = merge(template, &record);
//!     println!("{}", render::to_markdown(&merged, &render::RenderOptions::default()));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Merge engine**: flat token substitution plus repeating-group row
//!   expansion, with explicit row bindings and split-run coalescing
//! - **Schemas**: typed form fields (text, date, number, choice) validated
//!   at the input boundary
//! - **Record store**: in-memory and JSON-file stores, one collection per
//!   document family
//! - **Templates**: Word (`.docx`), JSON, and plain text
//! - **Output**: Word, JSON, plain text, and Markdown
//! - **Parallel batches**: uses Rayon to merge many records at once

pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod model;
pub mod print;
pub mod record;
pub mod render;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use loader::{
    render_bytes, render_document, save_document, DocxTemplateLoader, JsonTemplateLoader,
    LoaderRegistry, OutputFormat, TemplateLoader, TextTemplateLoader,
};
#[cfg(feature = "async")]
pub use loader::{load_template_async, save_document_async};
pub use merge::{
    merge, merge_batch, scan, MergeEngine, MergeOptions, MergeReport, RowBinding, RunMode,
    ScanReport, TokenMarkers,
};
pub use model::{
    Alignment, Block, Document, Metadata, Paragraph, ParagraphStyle, Table, TableCell, TableRow,
    TextRun, TextStyle,
};
pub use print::{print_record, print_record_at};
pub use record::{DataRecord, DocumentFamily, ItemRecord, Schema, ValidationIssue, Value};
pub use render::{JsonFormat, RenderOptions};
pub use store::{JsonFileStore, MemoryStore, RecordStore, StoredRecord};

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Load a template, picking the loader from the file extension.
///
/// # Example
///
/// ```no_run
/// use shipdoc::load_template;
///
/// let template = load_template("templates/proforma_invoice.json").unwrap();
/// println!("Tables: {}", template.table_count());
/// ```
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<Document> {
    LoaderRegistry::with_defaults().load(path.as_ref())
}

/// Load a record from a JSON file holding one object.
pub fn load_record<P: AsRef<Path>>(path: P) -> Result<DataRecord> {
    let content = fs::read_to_string(path)?;
    DataRecord::from_json_str(&content)
}

/// Load records from a JSON file holding one object or an array of them.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<DataRecord>> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        serde_json::Value::Array(values) => values.into_iter().map(DataRecord::from_json).collect(),
        other => Ok(vec![DataRecord::from_json(other)?]),
    }
}

/// List the unique token keys of a template file.
///
/// # Example
///
/// ```no_run
/// use shipdoc::scan_file;
///
/// for key in scan_file("templates/export_invoice.json").unwrap() {
///     println!("{}", key);
/// }
/// ```
pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<BTreeSet<String>> {
    let doc = load_template(path)?;
    Ok(scan(&doc))
}

/// Merge a record file into a template file with default options.
pub fn merge_file<P: AsRef<Path>, Q: AsRef<Path>>(template: P, data: Q) -> Result<Document> {
    Ok(Merger::new().merge_files(template, data)?.document)
}

/// Builder for merging records into templates.
///
/// # Example
///
/// ```no_run
/// use shipdoc::{Merger, RowBinding};
///
/// let markdown = Merger::new()
///     .coalesce()
///     .bind("items", RowBinding::new(0, 1))
///     .merge_files("templates/packing_list.json", "record.json")?
///     .to_markdown();
/// # Ok::<(), shipdoc::Error>(())
/// ```
pub struct Merger {
    merge_options: MergeOptions,
    render_options: RenderOptions,
}

impl Merger {
    /// Create a new merger with default options.
    pub fn new() -> Self {
        Self {
            merge_options: MergeOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Use custom token markers.
    pub fn with_markers(mut self, markers: TokenMarkers) -> Self {
        self.merge_options = self.merge_options.with_markers(markers);
        self
    }

    /// Coalesce runs so split tokens resolve.
    pub fn coalesce(mut self) -> Self {
        self.merge_options = self.merge_options.coalesce();
        self
    }

    /// Bind a group to a fixed template row.
    pub fn bind(mut self, group: impl Into<String>, binding: RowBinding) -> Self {
        self.merge_options = self.merge_options.bind(group, binding);
        self
    }

    /// Disable parallel batch merges.
    pub fn sequential(mut self) -> Self {
        self.merge_options = self.merge_options.sequential();
        self
    }

    /// Set render options for the output.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Merge an in-memory record into an in-memory template.
    pub fn merge(self, template: Document, record: &DataRecord) -> Result<MergeOutput> {
        let engine = MergeEngine::new(self.merge_options)?;
        let (document, report) = engine.merge(template, record)?;
        Ok(MergeOutput {
            document,
            report,
            render_options: self.render_options,
        })
    }

    /// Merge a record file into a template file.
    pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        template: P,
        data: Q,
    ) -> Result<MergeOutput> {
        let template = load_template(template)?;
        let record = load_record(data)?;
        self.merge(template, &record)
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

/// A merged document with its report.
pub struct MergeOutput {
    /// The merged document
    pub document: Document,
    /// What the merge did
    pub report: MergeReport,
    render_options: RenderOptions,
}

impl MergeOutput {
    /// Convert to Markdown.
    pub fn to_markdown(&self) -> String {
        render::to_markdown(&self.document, &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> String {
        render::to_text(&self.document)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Write the document, choosing the format from the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_document(&self.document, path.as_ref())
    }
}
