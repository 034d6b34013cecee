//! Templates stored as the JSON form of a [`Document`].

use log::debug;
use std::fs;
use std::path::Path;

use super::TemplateLoader;
use crate::error::{Error, Result};
use crate::model::Document;
use crate::render::from_json;

/// Loader for `.json` templates.
#[derive(Debug, Clone, Default)]
pub struct JsonTemplateLoader {
    _private: (),
}

impl JsonTemplateLoader {
    /// Create a new JSON template loader.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl TemplateLoader for JsonTemplateLoader {
    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn name(&self) -> &str {
        "json"
    }

    fn load(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path)?;
        let mut doc = self.load_bytes(&bytes)?;
        if doc.metadata.source.is_none() {
            doc.metadata.source = Some(path.display().to_string());
        }
        debug!("loaded JSON template {} ({} blocks)", path.display(), doc.body.len());
        Ok(doc)
    }

    fn load_bytes(&self, bytes: &[u8]) -> Result<Document> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::TemplateLoad(format!("template is not UTF-8: {}", e)))?;
        from_json(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_bytes() {
        let json = r#"{
            "metadata": {"title": "Packing List"},
            "body": [
                {"type": "paragraph", "runs": [{"text": "To: «consignee_address»"}]},
                {"type": "page_break"}
            ]
        }"#;
        let doc = JsonTemplateLoader::new().load_bytes(json.as_bytes()).unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("Packing List"));
        assert_eq!(doc.body.len(), 2);
        assert_eq!(doc.paragraphs()[0].plain_text(), "To: «consignee_address»");
    }

    #[test]
    fn test_load_bytes_rejects_garbage() {
        let loader = JsonTemplateLoader::new();
        assert!(matches!(
            loader.load_bytes(b"not json"),
            Err(Error::TemplateLoad(_))
        ));
        assert!(matches!(
            loader.load_bytes(&[0xff, 0xfe]),
            Err(Error::TemplateLoad(_))
        ));
    }
}
