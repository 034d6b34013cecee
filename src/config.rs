//! Configuration for stores, templates, and output.
//!
//! Every external location is injected through [`Config`]; nothing in the
//! library hard-codes a path or connection string.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::loader::OutputFormat;
use crate::merge::TokenMarkers;
use crate::record::DocumentFamily;

/// Suite configuration, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the JSON record store
    pub store_dir: PathBuf,

    /// Directory holding the family templates
    pub template_dir: PathBuf,

    /// Directory printed documents are written to
    pub output_dir: PathBuf,

    /// Format of printed documents
    pub output_format: OutputFormat,

    /// Token markers used by the templates
    pub markers: TokenMarkers,

    /// Per-family template file names, overriding the defaults
    pub templates: BTreeMap<DocumentFamily, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("records"),
            template_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("output"),
            output_format: OutputFormat::Json,
            markers: TokenMarkers::default(),
            templates: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Other(format!("Failed to read config {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Other(format!("Failed to parse config {}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Check the configuration before use.
    pub fn validate(&self) -> Result<()> {
        self.markers.validate()
    }

    /// Set the record store directory.
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    /// Set the template directory.
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the output format.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the token markers.
    pub fn with_markers(mut self, markers: TokenMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Override the template file for a family.
    pub fn with_template(mut self, family: DocumentFamily, file: impl Into<String>) -> Self {
        self.templates.insert(family, file.into());
        self
    }

    /// Full path of a family's template.
    pub fn template_path(&self, family: DocumentFamily) -> PathBuf {
        let file = self
            .templates
            .get(&family)
            .cloned()
            .unwrap_or_else(|| family.template_file());
        self.template_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_and_template_path() {
        let config = Config::default();
        assert_eq!(
            config.template_path(DocumentFamily::PackingList),
            PathBuf::from("templates/packing_list.json")
        );

        let config = config
            .with_template_dir("/srv/tpl")
            .with_template(DocumentFamily::ExportInvoice, "zc_in_07.txt");
        assert_eq!(
            config.template_path(DocumentFamily::ExportInvoice),
            PathBuf::from("/srv/tpl/zc_in_07.txt")
        );
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"store_dir": "/data/records", "output_format": "markdown",
                "templates": {{"proforma_invoice": "pi.json"}}}}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/data/records"));
        assert_eq!(config.output_format, OutputFormat::Markdown);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.markers.is_default());
        assert_eq!(
            config.template_path(DocumentFamily::ProformaInvoice),
            PathBuf::from("templates/pi.json")
        );
    }

    #[test]
    fn test_load_rejects_bad_markers() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"markers": {{"open": "%", "close": "%"}}}}"#).unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(Error::InvalidMarkers(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/shipdoc.json").is_err());
    }
}
