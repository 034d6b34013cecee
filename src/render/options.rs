//! Rendering options and configuration.

/// Options for rendering a merged document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Emit the document title as a top-level heading
    pub include_title: bool,

    /// Maximum heading level (1-6)
    pub max_heading_level: u8,

    /// Keep line breaks inside paragraphs (multi-line addresses)
    pub preserve_line_breaks: bool,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the title heading.
    pub fn with_title(mut self, include: bool) -> Self {
        self.include_title = include;
        self
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Enable or disable line break preservation.
    pub fn with_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_title: false,
            max_heading_level: 6,
            preserve_line_breaks: true,
            escape_special_chars: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_title(true)
            .with_max_heading(9)
            .with_escaping(false);

        assert!(options.include_title);
        assert_eq!(options.max_heading_level, 6);
        assert!(!options.escape_special_chars);
        assert!(options.preserve_line_breaks);
    }
}
