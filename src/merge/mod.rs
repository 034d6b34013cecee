//! The template merge engine.
//!
//! A merge takes a parsed [`Document`](crate::model::Document) and a
//! [`DataRecord`](crate::record::DataRecord) and replaces `«key»` tokens
//! with record values:
//!
//! 1. Flat substitution of every scalar entry, run by run, over top-level
//!    and table-cell paragraphs.
//! 2. Expansion of every repeating group, in record order: the template
//!    row is replaced by one substituted clone per item.
//!
//! Unmatched tokens are left verbatim and surface in [`ScanReport`] and
//! [`MergeReport::unresolved`].

mod engine;
mod expand;
mod options;
mod scanner;
mod substitute;
mod token;

pub use engine::{merge, merge_batch, MergeEngine, MergeReport};
pub use expand::{expand_group, expand_group_with, find_template_row, GroupExpansion, RowBinding};
pub use options::{MergeOptions, RunMode};
pub use scanner::{scan, scan_with, ScanReport};
pub use substitute::{coalesce_runs, substitute, substitute_with, Lookup};
pub use token::{TokenMarkers, TokenPattern, DEFAULT_CLOSE, DEFAULT_OPEN};
