//! Token markers and the compiled token pattern.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default opening marker.
pub const DEFAULT_OPEN: &str = "«";

/// Default closing marker.
pub const DEFAULT_CLOSE: &str = "»";

static DEFAULT_PATTERN: Lazy<TokenPattern> = Lazy::new(|| TokenPattern {
    markers: TokenMarkers::default(),
    regex: Regex::new("«(.*?)»").unwrap(),
});

/// The open/close marker pair that delimits a token, e.g. `«invoice_no»`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenMarkers {
    /// Opening marker
    pub open: String,
    /// Closing marker
    pub close: String,
}

impl Default for TokenMarkers {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN.to_string(),
            close: DEFAULT_CLOSE.to_string(),
        }
    }
}

impl TokenMarkers {
    /// Create a validated marker pair.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self> {
        let markers = Self {
            open: open.into(),
            close: close.into(),
        };
        markers.validate()?;
        Ok(markers)
    }

    /// Check that both markers are non-empty and distinct.
    pub fn validate(&self) -> Result<()> {
        if self.open.is_empty() || self.close.is_empty() {
            return Err(Error::InvalidMarkers(
                "token markers must not be empty".to_string(),
            ));
        }
        if self.open == self.close {
            return Err(Error::InvalidMarkers(format!(
                "open and close markers are both '{}'",
                self.open
            )));
        }
        Ok(())
    }

    /// Wrap a key in the markers.
    pub fn wrap(&self, key: &str) -> String {
        format!("{}{}{}", self.open, key, self.close)
    }

    /// Check whether these are the default guillemets.
    pub fn is_default(&self) -> bool {
        self.open == DEFAULT_OPEN && self.close == DEFAULT_CLOSE
    }
}

/// A compiled token pattern: `open(.*?)close` with both markers escaped.
///
/// Matching is non-greedy, so `«a»-«b»` yields the keys `a` and `b`.
#[derive(Debug, Clone)]
pub struct TokenPattern {
    markers: TokenMarkers,
    regex: Regex,
}

impl TokenPattern {
    /// Compile a pattern for the given markers.
    pub fn new(markers: TokenMarkers) -> Result<Self> {
        markers.validate()?;
        let source = format!(
            "{}(.*?){}",
            regex::escape(&markers.open),
            regex::escape(&markers.close)
        );
        let regex = Regex::new(&source)
            .map_err(|e| Error::InvalidMarkers(format!("cannot compile token pattern: {}", e)))?;
        Ok(Self { markers, regex })
    }

    /// The shared pattern for the default guillemets.
    pub fn guillemets() -> &'static TokenPattern {
        &DEFAULT_PATTERN
    }

    /// The markers this pattern was compiled from.
    pub fn markers(&self) -> &TokenMarkers {
        &self.markers
    }

    /// Wrap a key in this pattern's markers.
    pub fn wrap(&self, key: &str) -> String {
        self.markers.wrap(key)
    }

    /// Iterate over the keys of every token in `text`.
    pub fn keys<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }

    /// Byte spans of every token in `text`.
    pub fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    /// Check whether `text` contains at least one token.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replace every token whose key `resolve` maps to a value.
    ///
    /// Unresolved tokens are copied verbatim. Returns the new text and the
    /// number of tokens replaced; values are never re-scanned.
    pub fn replace<'a, F>(&self, text: &str, mut resolve: F) -> (String, usize)
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut count = 0;
        let replaced = self.regex.replace_all(text, |caps: &Captures<'_>| {
            match caps.get(1).and_then(|key| resolve(key.as_str())) {
                Some(value) => {
                    count += 1;
                    value.to_string()
                }
                None => caps[0].to_string(),
            }
        });
        (replaced.into_owned(), count)
    }
}

impl Default for TokenPattern {
    fn default() -> Self {
        Self::guillemets().clone()
    }
}
