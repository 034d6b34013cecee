//! Merge options and configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{RowBinding, TokenMarkers};

/// Options for merging a record into a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Token delimiters; `None` defers to the caller's configuration,
    /// falling back to guillemets
    pub markers: Option<TokenMarkers>,

    /// How tokens are matched against paragraph runs
    pub run_mode: RunMode,

    /// Explicit template rows per group key, overriding discovery
    pub bindings: IndexMap<String, RowBinding>,

    /// Whether batch merges run on the rayon pool
    pub parallel: bool,
}

impl MergeOptions {
    /// Create new merge options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token markers.
    pub fn with_markers(mut self, markers: TokenMarkers) -> Self {
        self.markers = Some(markers);
        self
    }

    /// The markers in effect, given a fallback for when none are set.
    pub fn markers_or<'a>(&'a self, fallback: &'a TokenMarkers) -> &'a TokenMarkers {
        self.markers.as_ref().unwrap_or(fallback)
    }

    /// Set the run mode.
    pub fn with_run_mode(mut self, mode: RunMode) -> Self {
        self.run_mode = mode;
        self
    }

    /// Coalesce runs so split tokens can be resolved.
    pub fn coalesce(mut self) -> Self {
        self.run_mode = RunMode::Coalesce;
        self
    }

    /// Bind a group to a fixed template row.
    pub fn bind(mut self, group: impl Into<String>, binding: RowBinding) -> Self {
        self.bindings.insert(group.into(), binding);
        self
    }

    /// Enable or disable parallel batch merges.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Merge batches on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// The binding declared for a group, if any.
    pub fn binding(&self, group: &str) -> Option<RowBinding> {
        self.bindings.get(group).copied()
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            markers: None,
            run_mode: RunMode::PerRun,
            bindings: IndexMap::new(),
            parallel: true,
        }
    }
}

/// How tokens are matched against the runs of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Match each run on its own; tokens split across runs stay verbatim
    #[default]
    PerRun,
    /// Fold runs together wherever a token crosses a run boundary
    Coalesce,
}
