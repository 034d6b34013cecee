//! Token discovery and the found / missing / unused report.

use serde::Serialize;
use std::collections::BTreeSet;

use super::TokenPattern;
use crate::model::Document;
use crate::record::DataRecord;

/// Collect the unique keys of every default-marker token in `doc`.
///
/// Top-level paragraphs and the paragraphs of every table cell are
/// scanned on their full text, so a token split across runs is still
/// reported here even though per-run substitution will not resolve it.
pub fn scan(doc: &Document) -> BTreeSet<String> {
    scan_with(doc, TokenPattern::guillemets())
}

/// Collect the unique keys of every token matched by `pattern`.
pub fn scan_with(doc: &Document, pattern: &TokenPattern) -> BTreeSet<String> {
    doc.paragraphs()
        .into_iter()
        .flat_map(|p| {
            let text = p.plain_text();
            pattern.keys(&text).map(str::to_string).collect::<Vec<_>>()
        })
        .collect()
}

/// Which template tokens a record can fill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Template keys the record provides a value for
    pub found: BTreeSet<String>,
    /// Template keys the record has no value for; they stay verbatim
    pub missing: BTreeSet<String>,
    /// Record keys no template token refers to
    pub unused: BTreeSet<String>,
}

impl ScanReport {
    /// Compare a template against a record using the default markers.
    pub fn new(doc: &Document, record: &DataRecord) -> Self {
        Self::with_pattern(doc, record, TokenPattern::guillemets())
    }

    /// Compare a template against a record.
    ///
    /// A key counts as found when it is a scalar of the record or a field
    /// of any item in one of its groups. A group is unused when none of its
    /// item fields appear in the template.
    pub fn with_pattern(doc: &Document, record: &DataRecord, pattern: &TokenPattern) -> Self {
        let tokens = scan_with(doc, pattern);
        let mut report = ScanReport::default();

        let provides = |key: &str| {
            record.scalar(key).is_some()
                || record
                    .groups()
                    .any(|(_, items)| items.iter().any(|item| item.contains_key(key)))
        };

        for key in &tokens {
            if provides(key) {
                report.found.insert(key.clone());
            } else {
                report.missing.insert(key.clone());
            }
        }

        for (key, _) in record.scalars() {
            if !tokens.contains(key) {
                report.unused.insert(key.to_string());
            }
        }
        for (key, items) in record.groups() {
            let referenced = items
                .iter()
                .flat_map(|item| item.keys())
                .any(|k| tokens.contains(k));
            if !referenced {
                report.unused.insert(key.to_string());
            }
        }

        report
    }

    /// Check whether every template token can be filled.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
