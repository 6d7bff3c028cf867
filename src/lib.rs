//! # rdn
//!
//! A reader, writer and indexed read-only document for RDN, a JSON superset.
//!
//! ## What is RDN?
//!
//! RDN accepts every JSON text and adds the value types JSON is missing:
//!
//! - **Big integers**: `12345678901234567890n`
//! - **Special numbers**: `NaN`, `Infinity`, `-Infinity`
//! - **Date-times, times and durations**: `@2024-01-15T10:30:00.000Z`, `@14:30:00`, `@P1Y2M3DT4H`
//! - **Regular expressions**: `/^[a-z]+$/gi`
//! - **Binary**: `b"SGVsbG8="` (base64) and `x"48656c6c6f"` (hex)
//! - **Sets**: `Set{1, 2, 3}` or `{1, 2, 3}`
//! - **Maps with arbitrary keys**: `Map{1 => "one"}` or `{1 => "one"}`
//! - **Tuples**: `(1, 2)`, read as arrays
//!
//! ## Layers
//!
//! - [`Reader`]: a forward-only pull tokenizer over a byte slice. It never
//!   allocates per token and can resume across input blocks.
//! - [`Writer`]: a validating emitter that rejects call sequences producing
//!   invalid output.
//! - [`Document`]: parses once into a compact row index, then answers
//!   navigation queries by slicing the original bytes.
//! - [`RdnValue`]: an owned value tree for callers that want one.
//!
//! ## Quick Start
//!
//! ```rust
//! use rdn::{Document, ValueKind};
//!
//! let doc = Document::parse_str(r#"{"name": "Alice", "tags": Set{"admin", "dev"}}"#).unwrap();
//! let root = doc.root_element().unwrap();
//!
//! assert_eq!(root.get_property("name").unwrap().get_string().unwrap(), "Alice");
//! let tags = root.get_property("tags").unwrap();
//! assert_eq!(tags.value_kind().unwrap(), ValueKind::Set);
//! assert_eq!(tags.get_array_length().unwrap(), 2);
//! ```
//!
//! ### Writing
//!
//! ```rust
//! use rdn::{Writer, WriterOptions};
//!
//! let mut writer = Writer::new(WriterOptions::default());
//! writer.write_start_map().unwrap();
//! writer.write_i64_value(1).unwrap();
//! writer.write_string_value("one").unwrap();
//! writer.write_end_map().unwrap();
//! assert_eq!(writer.into_string().unwrap(), r#"{1=>"one"}"#);
//! ```
//!
//! ### Owned values
//!
//! ```rust
//! let value = rdn::parse(r#"[1, 2n, @P1D]"#).unwrap();
//! assert_eq!(rdn::to_string(&value).unwrap(), "[1,2n,@P1D]");
//! ```
//!
//! ### Bridging to other formats
//!
//! [`Element`] and [`RdnValue`] implement `serde::Serialize`, so a parsed
//! document can be handed to any serde format. Types without a serde
//! counterpart are lowered to strings or byte sequences; see the `ser` module.
//!
//! ## Error Handling
//!
//! Every fallible call returns [`Result`]. Syntax errors carry the byte
//! offset of the offending token:
//!
//! ```rust
//! let err = rdn::Document::parse_str("[1, 2,]").unwrap_err();
//! assert!(err.is_syntax());
//! assert_eq!(err.offset(), Some(5));
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events at `debug` level for parse completion,
//! subtree clones, disposal and rejected duplicate properties, and at `trace`
//! level when a duplicate-property check passes. It never installs a
//! subscriber.

mod db;
mod escape;
mod literal;
mod tables;

pub mod document;
pub mod error;
pub mod map;
pub mod options;
pub mod reader;
pub mod ser;
pub mod token;
pub mod types;
pub mod value;
pub mod writer;

pub use document::{ArrayIter, Document, Element, FromElement, MapIter, Property, PropertyIter};
pub use error::{Error, Result};
pub use escape::unescape;
pub use map::RdnMap;
pub use options::{
    CommentHandling, DocumentOptions, ReaderOptions, WriterOptions, DEFAULT_MAX_DEPTH,
};
pub use reader::{Reader, ReaderState};
pub use token::{ContainerKind, TokenType, ValueKind};
pub use types::{RdnDuration, RdnRegExp};
pub use value::{Number, RdnValue};
pub use writer::Writer;

use std::io;

/// Parses RDN text into an owned [`RdnValue`].
///
/// # Examples
///
/// ```rust
/// use rdn::RdnValue;
///
/// let value = rdn::parse(r#"{"a": Map{"k" => true}}"#).unwrap();
/// let entries = value.get("a").unwrap().as_map().unwrap();
/// assert_eq!(entries[0], (RdnValue::from("k"), RdnValue::Bool(true)));
/// ```
///
/// # Errors
///
/// Returns an error if the text is not a single well-formed RDN value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(text: &str) -> Result<RdnValue> {
    Document::parse_str(text)?.to_value()
}

/// Extracts a `T` from the root of an RDN text.
///
/// # Examples
///
/// ```rust
/// let when: chrono::DateTime<chrono::Utc> = rdn::from_str("@2024-01-15T10:30:00Z").unwrap();
/// assert_eq!(when.to_rfc3339(), "2024-01-15T10:30:00+00:00");
///
/// let missing: Option<i64> = rdn::from_str("null").unwrap();
/// assert_eq!(missing, None);
/// ```
///
/// # Errors
///
/// Returns an error if the text is malformed or its root is not a `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T: FromElement>(text: &str) -> Result<T> {
    from_slice(text.as_bytes())
}

/// Extracts a `T` from the root of RDN bytes.
///
/// # Examples
///
/// ```rust
/// let n: num_bigint::BigInt = rdn::from_slice(b"-9007199254740993n").unwrap();
/// assert_eq!(n.to_string(), "-9007199254740993");
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8 RDN or the root is not a `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T: FromElement>(bytes: &[u8]) -> Result<T> {
    let doc = Document::parse(bytes)?;
    let root = doc.root_element()?;
    root.get::<T>()
}

/// Writes a value as compact RDN text.
///
/// # Examples
///
/// ```rust
/// use rdn::RdnValue;
///
/// let value = RdnValue::Set(vec![RdnValue::from(1), RdnValue::from(2)]);
/// assert_eq!(rdn::to_string(&value).unwrap(), "{1,2}");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written, for example a date-time
/// outside years 0001-9999.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(value: &RdnValue) -> Result<String> {
    to_string_with_options(value, WriterOptions::default())
}

/// Writes a value as indented RDN text.
///
/// # Examples
///
/// ```rust
/// let value = rdn::parse(r#"{"a": [1]}"#).unwrap();
/// assert_eq!(rdn::to_string_pretty(&value).unwrap(), "{\n  \"a\": [\n    1\n  ]\n}");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty(value: &RdnValue) -> Result<String> {
    to_string_with_options(value, WriterOptions::pretty())
}

/// Writes a value as RDN text with custom options.
///
/// # Examples
///
/// ```rust
/// use rdn::{RdnValue, WriterOptions};
///
/// let value = RdnValue::Set(vec![RdnValue::from("x")]);
/// let options = WriterOptions::new().with_always_write_type_name(true);
/// assert_eq!(rdn::to_string_with_options(&value, options).unwrap(), r#"Set{"x"}"#);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options(value: &RdnValue, options: WriterOptions) -> Result<String> {
    let mut writer = Writer::new(options);
    value.write_to(&mut writer)?;
    writer.into_string()
}

/// Writes a value as compact RDN to an I/O sink.
///
/// # Errors
///
/// Returns an error if the value cannot be written or the sink fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W: io::Write>(out: W, value: &RdnValue) -> Result<()> {
    to_writer_with_options(out, value, WriterOptions::default())
}

/// Writes a value as RDN to an I/O sink with custom options.
///
/// # Errors
///
/// Returns an error if the value cannot be written or the sink fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W: io::Write>(
    out: W,
    value: &RdnValue,
    options: WriterOptions,
) -> Result<()> {
    let mut writer = Writer::with_output(out, options);
    value.write_to(&mut writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": 123,
        "name": "Alice",
        "joined": @2024-01-15T10:30:00.000Z,
        "roles": Set{"admin", "dev"},
        "limits": Map{"daily" => 10, 7 => @PT1H},
        "pattern": /^a+$/i,
        "avatar": b"AQID"
    }"#;

    #[test]
    fn test_parse_and_write_back() {
        let value = parse(SAMPLE).unwrap();
        let text = to_string(&value).unwrap();
        assert_eq!(
            text,
            r#"{"id":123,"name":"Alice","joined":@2024-01-15T10:30:00.000Z,"roles":{"admin","dev"},"limits":{"daily"=>10,7=>@PT1H},"pattern":/^a+$/i,"avatar":b"AQID"}"#
        );
        assert_eq!(parse(&text).unwrap(), value);
    }

    #[test]
    fn test_pretty_round_trip() {
        let value = parse(SAMPLE).unwrap();
        let pretty = to_string_pretty(&value).unwrap();
        assert!(pretty.contains("\n  \"roles\": {\n    \"admin\",\n"));
        assert_eq!(parse(&pretty).unwrap(), value);
    }

    #[test]
    fn test_from_str_typed() {
        assert_eq!(from_str::<i64>("42").unwrap(), 42);
        assert_eq!(from_str::<String>(r#""a\nb""#).unwrap(), "a\nb");
        assert_eq!(from_str::<Vec<u8>>(r#"x"ff00""#).unwrap(), vec![0xff, 0x00]);
        assert!(from_str::<i64>(r#""42""#).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_to_writer() {
        let value = parse("[true, null]").unwrap();
        let mut out = Vec::new();
        to_writer(&mut out, &value).unwrap();
        assert_eq!(out, b"[true,null]");
    }

    #[test]
    fn test_custom_options() {
        let value = RdnValue::Map(Vec::new());
        assert_eq!(to_string(&value).unwrap(), "Map{}");
        let options = WriterOptions::pretty().with_indent(4);
        let value = parse("[[1]]").unwrap();
        assert_eq!(
            to_string_with_options(&value, options).unwrap(),
            "[\n    [\n        1\n    ]\n]"
        );
    }
}
