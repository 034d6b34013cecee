//! Merge orchestration.

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

use super::{
    coalesce_runs, expand_group_with, scan_with, substitute_with, GroupExpansion, MergeOptions,
    RunMode, TokenPattern,
};
use crate::error::Result;
use crate::model::Document;
use crate::record::DataRecord;

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Tokens replaced by flat substitution
    pub substitutions: usize,
    /// Runs folded away in coalesce mode
    pub coalesced_runs: usize,
    /// One entry per group that expanded
    pub groups: Vec<GroupExpansion>,
    /// Token keys still present in the merged document
    pub unresolved: BTreeSet<String>,
}

impl MergeReport {
    /// Total rows inserted across all groups.
    pub fn rows_inserted(&self) -> usize {
        self.groups.iter().map(|g| g.rows_inserted).sum()
    }

    /// Total tokens replaced, flat and inside expanded rows.
    pub fn total_substitutions(&self) -> usize {
        self.substitutions + self.groups.iter().map(|g| g.substitutions).sum::<usize>()
    }
}

/// A configured merge engine.
///
/// The token pattern is compiled once, so one engine can merge any number
/// of records, including concurrently.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    options: MergeOptions,
    pattern: TokenPattern,
}

impl MergeEngine {
    /// Create an engine, compiling the token pattern.
    pub fn new(options: MergeOptions) -> Result<Self> {
        let pattern = match &options.markers {
            Some(markers) if !markers.is_default() => TokenPattern::new(markers.clone())?,
            _ => TokenPattern::guillemets().clone(),
        };
        Ok(Self { options, pattern })
    }

    /// The engine's options.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// The compiled token pattern.
    pub fn pattern(&self) -> &TokenPattern {
        &self.pattern
    }

    /// Merge a record into a template, consuming the template.
    ///
    /// Flat substitution of every scalar runs first, over top-level and
    /// table-cell paragraphs. Groups then expand in record order. The only
    /// failure is an explicit binding outside the document; the partial
    /// document is dropped in that case.
    pub fn merge(&self, mut template: Document, record: &DataRecord) -> Result<(Document, MergeReport)> {
        let report = self.merge_in_place(&mut template, record)?;
        Ok((template, report))
    }

    /// Merge a record into a document in place.
    ///
    /// On error the document may be partially merged and must not be
    /// serialized.
    pub fn merge_in_place(&self, doc: &mut Document, record: &DataRecord) -> Result<MergeReport> {
        let mut report = MergeReport::default();

        for paragraph in doc.paragraphs_mut() {
            if self.options.run_mode == RunMode::Coalesce {
                report.coalesced_runs += coalesce_runs(paragraph, &self.pattern);
            }
            report.substitutions += substitute_with(paragraph, record, &self.pattern);
        }
        debug!("flat substitution replaced {} token(s)", report.substitutions);

        for group in self.options.bindings.keys() {
            if record.group(group).is_none() {
                warn!("binding declared for '{}' but the record has no such group", group);
            }
        }

        for (group, items) in record.groups() {
            let binding = self.options.binding(group);
            if let Some(expansion) = expand_group_with(doc, group, items, &self.pattern, binding)? {
                report.groups.push(expansion);
            }
        }

        report.unresolved = scan_with(doc, &self.pattern);
        if !report.unresolved.is_empty() {
            warn!(
                "{} token(s) left unresolved: {}",
                report.unresolved.len(),
                report
                    .unresolved
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(report)
    }

    /// Merge each record into its own copy of the template.
    ///
    /// Results keep the order of `records`. Runs on the rayon pool unless
    /// the engine is sequential.
    pub fn merge_batch(
        &self,
        template: &Document,
        records: &[DataRecord],
    ) -> Vec<Result<(Document, MergeReport)>> {
        if self.options.parallel {
            records
                .par_iter()
                .map(|record| self.merge(template.clone(), record))
                .collect()
        } else {
            records
                .iter()
                .map(|record| self.merge(template.clone(), record))
                .collect()
        }
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self {
            options: MergeOptions::default(),
            pattern: TokenPattern::default(),
        }
    }
}

/// Merge a record with default markers and discovery.
///
/// Without bindings nothing can fail, so this returns the document
/// directly.
pub fn merge(mut template: Document, record: &DataRecord) -> Document {
    if let Err(e) = MergeEngine::default().merge_in_place(&mut template, record) {
        warn!("merge failed without bindings: {}", e);
    }
    template
}

/// Merge every record into a copy of the template, in parallel.
pub fn merge_batch(template: &Document, records: &[DataRecord]) -> Vec<Document> {
    records
        .par_iter()
        .map(|record| merge(template.clone(), record))
        .collect()
}
