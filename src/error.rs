//! Error types for the shipdoc library.

use std::io;
use thiserror::Error;

use crate::record::ValidationIssue;

/// Result type alias for shipdoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, merging, or storing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A template could not be loaded or parsed.
    #[error("Template load error: {0}")]
    TemplateLoad(String),

    /// A merged document could not be written.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No loader or writer is registered for the file extension.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Record data does not have the expected shape.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Record failed schema validation.
    #[error("Record failed validation ({} issue(s)): {}", .0.len(), join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// An explicit row binding points outside the document.
    #[error("Binding for group '{group}' points to table {table}, row {row}, which does not exist")]
    InvalidBinding {
        /// Repeating group key
        group: String,
        /// Table index (0-based, document order)
        table: usize,
        /// Row index within the table
        row: usize,
    },

    /// Record lookup failed.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Token markers are empty or identical.
    #[error("Invalid token markers: {0}")]
    InvalidMarkers(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
