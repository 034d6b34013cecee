//! Document model types for template and merged-document representation.
//!
//! Templates are parsed into this tree by a [`crate::loader::TemplateLoader`],
//! mutated in place by the merge engine, and handed to a writer. Run
//! formatting is carried through untouched.

mod block;
mod document;
mod paragraph;
mod table;

pub use block::Block;
pub use document::{Document, Metadata};
pub use paragraph::{Alignment, Paragraph, ParagraphStyle, TextRun, TextStyle};
pub use table::{Table, TableCell, TableRow};
