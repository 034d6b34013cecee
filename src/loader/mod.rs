//! Template loading and merged document output.
//!
//! Loaders turn a template file into a [`Document`]; the registry picks a
//! loader by file extension. Templates are parsed once per merge and the
//! merged result is written once with [`save_document`].
//!
//! # Example
//!
//! ```no_run
//! use shipdoc::loader::LoaderRegistry;
//! use std::path::Path;
//!
//! fn main() -> shipdoc::Result<()> {
//!     let registry = LoaderRegistry::with_defaults();
//!     let template = registry.load(Path::new("templates/packing_list.json"))?;
//!     println!("{} blocks", template.body.len());
//!     Ok(())
//! }
//! ```

mod docx;
mod json;
mod text;

pub use docx::DocxTemplateLoader;
pub use json::JsonTemplateLoader;
pub use text::TextTemplateLoader;

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Document;
use crate::render::{to_docx, to_json, to_markdown, to_text, JsonFormat, RenderOptions};

/// Trait for template loaders.
///
/// Implement this trait to accept templates in a new file format.
pub trait TemplateLoader: Send + Sync {
    /// Get the supported file extensions for this loader.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["json"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this loader.
    fn name(&self) -> &str;

    /// Load a template file.
    fn load(&self, path: &Path) -> Result<Document>;

    /// Load a template from bytes.
    fn load_bytes(&self, bytes: &[u8]) -> Result<Document>;

    /// Check if this loader supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for template loaders, keyed by extension and by name.
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn TemplateLoader>>,
    by_name: HashMap<String, Arc<dyn TemplateLoader>>,
}

impl LoaderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the docx, JSON and text loaders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocxTemplateLoader::new()));
        registry.register(Arc::new(JsonTemplateLoader::new()));
        registry.register(Arc::new(TextTemplateLoader::new()));
        registry
    }

    /// Register a loader for all its supported extensions.
    pub fn register(&mut self, loader: Arc<dyn TemplateLoader>) {
        for ext in loader.supported_extensions() {
            self.loaders.insert(ext.to_lowercase(), loader.clone());
        }
        self.by_name.insert(loader.name().to_lowercase(), loader);
    }

    /// Get a loader by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn TemplateLoader>> {
        self.loaders.get(&ext.to_lowercase()).cloned()
    }

    /// Get a loader by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn TemplateLoader>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.loaders.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.loaders.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Load a template with the loader for its extension.
    pub fn load(&self, path: &Path) -> Result<Document> {
        let ext = extension(path)?;
        let loader = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("no template loader for .{}", ext)))?;

        loader.load(path).map_err(|e| match e {
            Error::Io(io) => Error::TemplateLoad(format!("{}: {}", path.display(), io)),
            other => other,
        })
    }

    /// Load template bytes with the loader for `ext`.
    pub fn load_bytes(&self, bytes: &[u8], ext: &str) -> Result<Document> {
        let loader = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("no template loader for .{}", ext)))?;
        loader.load_bytes(bytes)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Output format for merged documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON structure (re-loadable as a template)
    #[default]
    Json,

    /// Plain text
    Text,

    /// Markdown
    Markdown,

    /// Word document
    Docx,
}

impl OutputFormat {
    /// Pick the format for a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "txt" | "text" => Some(OutputFormat::Text),
            "md" | "markdown" => Some(OutputFormat::Markdown),
            "docx" => Some(OutputFormat::Docx),
            _ => None,
        }
    }

    /// The canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
            OutputFormat::Markdown => "md",
            OutputFormat::Docx => "docx",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s.trim_start_matches('.'))
            .ok_or_else(|| Error::UnsupportedFormat(format!("unknown output format '{}'", s)))
    }
}

/// Render a document in one of the text formats.
///
/// `Docx` is binary and fails with [`Error::UnsupportedFormat`]; use
/// [`render_bytes`] for it.
pub fn render_document(doc: &Document, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(doc, JsonFormat::Pretty),
        OutputFormat::Text => Ok(to_text(doc)),
        OutputFormat::Markdown => Ok(to_markdown(doc, &RenderOptions::default())),
        OutputFormat::Docx => Err(Error::UnsupportedFormat(
            "docx output is binary; write it to a file".to_string(),
        )),
    }
}

/// Render a document to the bytes of a file in the given format.
pub fn render_bytes(doc: &Document, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Docx => to_docx(doc),
        text => render_document(doc, text).map(String::into_bytes),
    }
}

/// Write a document, choosing the format from the file extension.
pub fn save_document(doc: &Document, path: &Path) -> Result<()> {
    let format = output_format(path)?;
    let content = render_bytes(doc, format)?;
    fs::write(path, content)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
    info!("wrote {} ({})", path.display(), format.extension());
    Ok(())
}

/// Load a template asynchronously with the default loaders.
#[cfg(feature = "async")]
pub async fn load_template_async(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let ext = extension(path)?.to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::TemplateLoad(format!("{}: {}", path.display(), e)))?;
    let mut doc = LoaderRegistry::with_defaults().load_bytes(&bytes, &ext)?;
    doc.metadata.source = Some(path.display().to_string());
    Ok(doc)
}

/// Write a document asynchronously, choosing the format from the extension.
#[cfg(feature = "async")]
pub async fn save_document_async(doc: &Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = output_format(path)?;
    let content = render_bytes(doc, format)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
    info!("wrote {} ({})", path.display(), format.extension());
    Ok(())
}

fn extension(path: &Path) -> Result<&str> {
    path.extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnsupportedFormat(format!("{} has no extension", path.display())))
}

fn output_format(path: &Path) -> Result<OutputFormat> {
    let ext = extension(path)?;
    OutputFormat::from_extension(ext)
        .ok_or_else(|| Error::UnsupportedFormat(format!("cannot write .{} files", ext)))
}
