//! JSON rendering for documents.

use crate::error::{Error, Result};
use crate::model::Document;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Serialization(format!("JSON serialization error: {}", e)))
}

/// Parse a document from its JSON form.
pub fn from_json(s: &str) -> Result<Document> {
    serde_json::from_str(s).map_err(|e| Error::TemplateLoad(format!("invalid document JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Table, TableRow};

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.metadata.title = Some("Packing List".to_string());
        doc.add_paragraph(Paragraph::with_text("Consignee: «consignee_address»"));
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["«item_number»", "«material»"]));
        doc.add_table(table);
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("Packing List"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_from_json_restores_document() {
        let doc = sample();
        let json = to_json(&doc, JsonFormat::Compact).unwrap();
        assert_eq!(from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_from_json_error_kind() {
        let err = from_json("{\"body\": 3}").unwrap_err();
        assert!(matches!(err, Error::TemplateLoad(_)));
    }
}
