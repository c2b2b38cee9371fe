//! Rendering configuration.

/// Indentation used by formatted rendering.
///
/// Non-formatted rendering ignores this entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Character repeated for one indentation step. Default `' '`.
    pub indent_char: char,
    /// How many `indent_char`s make one nesting level. Default `4`.
    pub indent_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_char: ' ',
            indent_width: 4,
        }
    }
}

impl FormatConfig {
    /// Create a new configuration with defaults (four spaces per level).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation character (e.g. `'\t'`).
    pub fn with_indent_char(mut self, indent_char: char) -> Self {
        self.indent_char = indent_char;
        self
    }

    /// Set how many characters make one indentation level.
    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }

    /// Indentation prefix for the given nesting depth.
    pub fn indent(&self, depth: usize) -> String {
        std::iter::repeat_n(self.indent_char, depth * self.indent_width).collect()
    }
}
