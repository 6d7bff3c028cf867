//! Configuration options for reading, writing and parsing documents.
//!
//! - [`ReaderOptions`]: grammar relaxations and limits for the [`Reader`](crate::Reader)
//! - [`WriterOptions`]: formatting choices for the [`Writer`](crate::Writer)
//! - [`DocumentOptions`]: reader options plus document-level validation
//!
//! All option types derive `Serialize`/`Deserialize`, so they can be loaded
//! from a host application's configuration.
//!
//! ## Examples
//!
//! ```rust
//! use rdn::{CommentHandling, ReaderOptions, WriterOptions};
//!
//! let reader = ReaderOptions::new()
//!     .with_comment_handling(CommentHandling::Skip)
//!     .with_trailing_commas(true);
//! assert_eq!(reader.max_depth(), 64);
//!
//! let writer = WriterOptions::pretty().with_indent(4);
//! assert!(writer.indented);
//! ```

use serde::{Deserialize, Serialize};

/// Nesting limit used when `max_depth` is left at zero.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How the reader treats `//` and `/* */` comments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentHandling {
    /// Comments are a syntax error.
    #[default]
    Disallow,
    /// Comments are treated like whitespace.
    Skip,
}

/// Options for the low-level [`Reader`](crate::Reader).
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    pub comment_handling: CommentHandling,
    pub allow_trailing_commas: bool,
    /// Zero means [`DEFAULT_MAX_DEPTH`].
    pub max_depth: usize,
    /// Accept whitespace-separated top-level values.
    pub allow_multiple_values: bool,
}

impl ReaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective nesting limit.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        if self.max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            self.max_depth
        }
    }

    #[must_use]
    pub fn with_comment_handling(mut self, handling: CommentHandling) -> Self {
        self.comment_handling = handling;
        self
    }

    #[must_use]
    pub fn with_trailing_commas(mut self, allow: bool) -> Self {
        self.allow_trailing_commas = allow;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_multiple_values(mut self, allow: bool) -> Self {
        self.allow_multiple_values = allow;
        self
    }
}

/// Options for the low-level [`Writer`](crate::Writer).
///
/// # Examples
///
/// ```rust
/// use rdn::WriterOptions;
///
/// let options = WriterOptions::new();
/// assert_eq!(options.indent, 2);
/// assert!(!options.indented);
/// assert!(!options.always_write_type_name);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Pretty-print with newlines and indentation.
    pub indented: bool,
    /// Spaces per nesting level when `indented` is set.
    pub indent: usize,
    /// Emit `Set{`/`Map{` even for non-empty sets and maps.
    pub always_write_type_name: bool,
    /// Zero means [`DEFAULT_MAX_DEPTH`].
    pub max_depth: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            indented: false,
            indent: 2,
            always_write_type_name: false,
            max_depth: 0,
        }
    }
}

impl WriterOptions {
    /// Creates default options (compact output, implicit set/map braces).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for indented output.
    #[must_use]
    pub fn pretty() -> Self {
        WriterOptions {
            indented: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        if self.max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            self.max_depth
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Only affects indented output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_always_write_type_name(mut self, always: bool) -> Self {
        self.always_write_type_name = always;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Options for [`Document::parse_with_options`](crate::Document::parse_with_options).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    pub reader: ReaderOptions,
    /// When `false`, parsing fails if any object repeats a property name.
    pub allow_duplicate_properties: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            reader: ReaderOptions::default(),
            allow_duplicate_properties: true,
        }
    }
}

impl DocumentOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reader_options(mut self, reader: ReaderOptions) -> Self {
        self.reader = reader;
        self
    }

    #[must_use]
    pub fn with_duplicate_properties(mut self, allow: bool) -> Self {
        self.allow_duplicate_properties = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_depth_means_default() {
        assert_eq!(ReaderOptions::new().max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(ReaderOptions::new().with_max_depth(3).max_depth(), 3);
        assert_eq!(WriterOptions::new().max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_options_load_from_config() {
        let options: DocumentOptions = serde_json::from_str(
            r#"{"reader": {"comment_handling": "skip"}, "allow_duplicate_properties": false}"#,
        )
        .unwrap();
        assert_eq!(options.reader.comment_handling, CommentHandling::Skip);
        assert!(!options.reader.allow_trailing_commas);
        assert!(!options.allow_duplicate_properties);
    }
}
