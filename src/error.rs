//! Error types for RDN reading, writing and document navigation.
//!
//! ## Error Categories
//!
//! - **Syntax Errors**: malformed input detected by the [`Reader`](crate::Reader),
//!   always carrying the byte offset of the offending token
//! - **Capacity Errors**: nesting deeper than the configured maximum depth
//! - **Type Mismatches**: an accessor asked for a shape the data does not have
//! - **Disposed**: a [`Document`](crate::Document) was used after [`dispose`](crate::Document::dispose)
//! - **Invalid Operations**: a [`Writer`](crate::Writer) call that would emit invalid RDN
//!
//! ## Examples
//!
//! ```rust
//! use rdn::Document;
//!
//! let err = Document::parse_str("[1, 2}").unwrap_err();
//! assert!(err.is_syntax());
//! assert_eq!(err.offset(), Some(5));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed input.
    #[error("Syntax error at offset {offset}: {msg} (expected {expected}, found {found})")]
    Syntax {
        offset: usize,
        msg: String,
        expected: String,
        found: String,
    },

    /// Input ended inside a token or an open container.
    #[error("Unexpected end of input at offset {offset}, expected {expected}")]
    UnexpectedEof { offset: usize, expected: String },

    /// Nesting went deeper than the configured limit.
    #[error("Maximum depth of {max} exceeded at offset {offset}")]
    DepthExceeded { offset: usize, max: usize },

    /// The value has a different kind than the one requested.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Index past the end of an array, set or map.
    #[error("Index {index} is out of range for a container of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// No property with the requested name.
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// An object declares the same property twice.
    #[error("Duplicate property '{name}' at offset {offset}")]
    DuplicateProperty { name: String, offset: usize },

    /// A writer call that would produce structurally invalid output.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A value that cannot be represented in RDN.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The document was disposed.
    #[error("Cannot access a disposed document")]
    Disposed,

    /// IO error while writing to a sink
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error at `offset`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rdn::Error;
    ///
    /// let err = Error::syntax(7, "invalid escape", "one of \"\\/bfnrtu", "'q'");
    /// assert!(err.to_string().contains("offset 7"));
    /// ```
    pub fn syntax(offset: usize, msg: &str, expected: &str, found: &str) -> Self {
        Error::Syntax {
            offset,
            msg: msg.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(offset: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            offset,
            expected: expected.to_string(),
        }
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rdn::Error;
    ///
    /// let err = Error::type_mismatch("Number", "String");
    /// assert!(err.to_string().contains("expected Number"));
    /// ```
    pub fn type_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn invalid_operation<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidOperation(msg.to_string())
    }

    pub fn invalid_value<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidValue(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for errors raised while tokenizing input, including depth limits.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Error::Syntax { .. } | Error::UnexpectedEof { .. } | Error::DepthExceeded { .. }
        )
    }

    #[must_use]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(self, Error::Disposed)
    }

    /// Byte offset into the input, for errors that have one.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Syntax { offset, .. }
            | Error::UnexpectedEof { offset, .. }
            | Error::DepthExceeded { offset, .. }
            | Error::DuplicateProperty { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Moves a buffer-relative offset to an absolute one.
    pub(crate) fn shift_offset(mut self, by: usize) -> Self {
        match &mut self {
            Error::Syntax { offset, .. }
            | Error::UnexpectedEof { offset, .. }
            | Error::DepthExceeded { offset, .. }
            | Error::DuplicateProperty { offset, .. } => *offset += by,
            _ => {}
        }
        self
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::syntax(0, "x", "a", "b").is_syntax());
        assert!(Error::DepthExceeded { offset: 3, max: 2 }.is_syntax());
        assert!(!Error::type_mismatch("Array", "Number").is_syntax());
        assert!(Error::Disposed.is_disposed());
    }

    #[test]
    fn test_offsets() {
        assert_eq!(Error::unexpected_eof(12, "'}'").offset(), Some(12));
        assert_eq!(Error::Disposed.offset(), None);
    }
}
