//! Data records and the document families that produce them.
//!
//! A [`DataRecord`] is the flat key/value mapping handed to the merge
//! engine. Each [`DocumentFamily`] declares a [`Schema`] for its records
//! and computes derived totals with [`apply_totals`].

mod data;
mod family;
mod schema;
mod totals;
mod value;

pub use data::DataRecord;
pub use family::DocumentFamily;
pub use schema::{parse_date, FieldKind, FieldSpec, GroupSpec, Schema, ValidationIssue, DATE_FORMATS};
pub use totals::{apply_totals, format_money, number_to_words, parse_number};
pub use value::{ItemRecord, Value};
