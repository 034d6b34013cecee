//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};

/// A paragraph: an ordered sequence of formatted text runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text runs in the paragraph
    #[serde(default)]
    pub runs: Vec<TextRun>,

    /// Paragraph style
    #[serde(default)]
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph holding a single unstyled run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create a paragraph from several unstyled runs.
    pub fn with_runs<S: Into<String>>(runs: impl IntoIterator<Item = S>) -> Self {
        Self {
            runs: runs.into_iter().map(TextRun::new).collect(),
            style: ParagraphStyle::default(),
        }
    }

    /// Create a heading paragraph.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        let mut p = Self::with_text(text);
        p.style.heading_level = Some(level.clamp(1, 6));
        p
    }

    /// Add plain text as a new run.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.runs.push(TextRun::new(text));
    }

    /// Add a styled text run.
    pub fn add_run(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    /// Get the concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        self.style.heading_level.is_some()
    }

    /// Get the heading level (1-6) or None.
    pub fn heading_level(&self) -> Option<u8> {
        self.style.heading_level
    }
}

/// A run of text with consistent formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    #[serde(default)]
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                bold: true,
                ..Default::default()
            },
        }
    }

    /// Create an italic text run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                italic: true,
                ..Default::default()
            },
        }
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Text formatting carried through a merge untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Font name
    pub font_name: Option<String>,

    /// Font size in points
    pub font_size: Option<f32>,

    /// Text color (hex format, e.g., "#FF0000")
    pub color: Option<String>,
}

impl TextStyle {
    /// Check if any emphasis is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic || self.underline
    }
}

/// Paragraph styling properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphStyle {
    /// Heading level (1-6) or None for normal paragraph
    pub heading_level: Option<u8>,

    /// Text alignment
    pub alignment: Alignment,

    /// Named style from the source template (e.g. "Title")
    pub style_name: Option<String>,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let mut p = Paragraph::new();
        p.add_text("Invoice ");
        p.add_run(TextRun::bold("«invoice_no»"));
        p.add_text("!");

        assert_eq!(p.plain_text(), "Invoice «invoice_no»!");
        assert_eq!(p.runs.len(), 3);
    }

    #[test]
    fn test_heading() {
        let h1 = Paragraph::heading("PACKING LIST", 1);
        assert!(h1.is_heading());
        assert_eq!(h1.heading_level(), Some(1));

        let clamped = Paragraph::heading("x", 9);
        assert_eq!(clamped.heading_level(), Some(6));
    }

    #[test]
    fn test_is_empty() {
        assert!(Paragraph::new().is_empty());
        assert!(Paragraph::with_runs(["  ", ""]).is_empty());
        assert!(!Paragraph::with_text("a").is_empty());
    }

    #[test]
    fn test_style_defaults_from_json() {
        let p: Paragraph = serde_json::from_str(r#"{"runs":[{"text":"hi"}]}"#).unwrap();
        assert_eq!(p.plain_text(), "hi");
        assert!(!p.runs[0].style.has_styling());
        assert_eq!(p.style.alignment, Alignment::Left);
    }
}
