//! Flat substitution of tokens inside paragraph runs.

use indexmap::IndexMap;
use log::debug;
use std::collections::{BTreeMap, HashMap};

use super::TokenPattern;
use crate::model::Paragraph;

/// A source of token values.
///
/// Implemented for the record types and for plain string maps so callers
/// can substitute from whatever they already hold.
pub trait Lookup {
    /// Resolve a key to its display value.
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl Lookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Lookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Lookup for IndexMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<L: Lookup + ?Sized> Lookup for &L {
    fn lookup(&self, key: &str) -> Option<&str> {
        (**self).lookup(key)
    }
}

/// Substitute default-marker tokens in every run of `paragraph`.
///
/// Returns the number of tokens replaced.
pub fn substitute<L: Lookup + ?Sized>(paragraph: &mut Paragraph, values: &L) -> usize {
    substitute_with(paragraph, values, TokenPattern::guillemets())
}

/// Substitute tokens matched by `pattern` in every run of `paragraph`.
///
/// Each run is matched on its own: a token split across two runs is left
/// untouched. Run formatting is never modified.
pub fn substitute_with<L: Lookup + ?Sized>(
    paragraph: &mut Paragraph,
    values: &L,
    pattern: &TokenPattern,
) -> usize {
    let mut total = 0;
    for run in &mut paragraph.runs {
        if !pattern.is_match(&run.text) {
            continue;
        }
        let (text, count) = pattern.replace(&run.text, |key| values.lookup(key));
        if count > 0 {
            run.text = text;
            total += count;
        }
    }
    total
}

/// Merge runs so that no token spans a run boundary.
///
/// The runs a token touches are folded into the first of them, which keeps
/// its formatting. Returns the number of runs removed.
pub fn coalesce_runs(paragraph: &mut Paragraph, pattern: &TokenPattern) -> usize {
    let mut removed = 0;
    while let Some((first, last)) = first_split_token(paragraph, pattern) {
        let tail: String = paragraph
            .runs
            .drain(first + 1..=last)
            .map(|run| run.text)
            .collect();
        paragraph.runs[first].text.push_str(&tail);
        removed += last - first;
    }
    if removed > 0 {
        debug!("coalesced {} run(s) to rejoin split tokens", removed);
    }
    removed
}

/// Find the run range of the first token that crosses a run boundary.
fn first_split_token(paragraph: &Paragraph, pattern: &TokenPattern) -> Option<(usize, usize)> {
    if paragraph.runs.len() < 2 {
        return None;
    }

    let mut ends = Vec::with_capacity(paragraph.runs.len());
    let mut offset = 0;
    for run in &paragraph.runs {
        offset += run.text.len();
        ends.push(offset);
    }
    let run_at = |pos: usize| ends.iter().position(|&end| pos < end);

    let text = paragraph.plain_text();
    let open = &pattern.markers().open;
    pattern.spans(&text).into_iter().find_map(|(start, end)| {
        // A stray open marker before a real token widens the match; the
        // token proper starts at the last open marker in the span.
        let inner = &text[start + open.len()..end];
        let start = match inner.rfind(open.as_str()) {
            Some(pos) => start + open.len() + pos,
            None => start,
        };
        let first = run_at(start)?;
        let last = run_at(end - 1)?;
        (first != last).then_some((first, last))
    })
}
