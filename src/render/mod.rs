//! Rendering module for converting merged documents to output formats.

mod docx;
mod json;
mod markdown;
mod options;
mod text;

pub use docx::{document_xml, to_docx};
pub use json::{from_json, to_json, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::RenderOptions;
pub use text::to_text;
