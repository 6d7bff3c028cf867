//! The read-only, randomly navigable document.
//!
//! [`Document::parse`] drains a [`Reader`] once, recording every token in a
//! [`MetadataDb`]. Navigation afterwards only reads the index and slices the
//! original bytes; nothing is materialized until a typed getter asks for it.
//!
//! ## Usage
//!
//! ```rust
//! use rdn::{Document, ValueKind};
//!
//! let doc = Document::parse_str(r#"{"tags": Set{"a", "b"}, "count": 42n}"#).unwrap();
//! let root = doc.root_element().unwrap();
//!
//! let count = root.get_property("count").unwrap();
//! assert_eq!(count.value_kind().unwrap(), ValueKind::BigInteger);
//! assert_eq!(count.get_big_integer().unwrap().to_string(), "42");
//!
//! let tags = root.get_property("tags").unwrap();
//! assert_eq!(tags.get_array_length().unwrap(), 2);
//! assert_eq!(tags.get_index(1).unwrap().get_string().unwrap(), "b");
//! ```
//!
//! ## Lifetime
//!
//! [`Document::dispose`] marks the document unusable; every accessor then
//! fails with [`Error::Disposed`]. Exactly one `dispose` call reports `true`,
//! even when several threads race. The buffers are freed on drop.

use crate::db::{MetadataDb, StackRow, MAX_ROWS};
use crate::escape;
use crate::literal;
use crate::options::DocumentOptions;
use crate::reader::Reader;
use crate::token::{ContainerKind, TokenType, ValueKind};
use crate::types::{RdnDuration, RdnRegExp};
use crate::value::{Number, RdnValue};
use crate::writer::Writer;
use crate::{Error, RdnMap, Result};
use chrono::{DateTime, NaiveTime, Utc};
use num_bigint::BigInt;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, trace};

/// A parsed RDN document.
pub struct Document {
    bytes: Vec<u8>,
    db: MetadataDb,
    disposed: AtomicBool,
}

impl Document {
    /// Parses a copy of `bytes` with default options.
    pub fn parse(bytes: &[u8]) -> Result<Document> {
        Self::from_vec_with_options(bytes.to_vec(), &DocumentOptions::default())
    }

    pub fn parse_str(text: &str) -> Result<Document> {
        Self::parse(text.as_bytes())
    }

    pub fn parse_with_options(bytes: &[u8], options: &DocumentOptions) -> Result<Document> {
        Self::from_vec_with_options(bytes.to_vec(), options)
    }

    /// Parses `bytes`, taking ownership instead of copying.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Document> {
        Self::from_vec_with_options(bytes, &DocumentOptions::default())
    }

    pub fn from_vec_with_options(bytes: Vec<u8>, options: &DocumentOptions) -> Result<Document> {
        let started = Instant::now();
        let db = build_index(&bytes, options)?;
        debug!(
            bytes = bytes.len(),
            rows = db.len(),
            index_bytes = db.byte_length(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "parsed document"
        );
        let doc = Document {
            bytes,
            db,
            disposed: AtomicBool::new(false),
        };
        if !options.allow_duplicate_properties {
            doc.check_duplicate_properties()?;
        }
        Ok(doc)
    }

    fn check(&self) -> Result<()> {
        if self.disposed.load(Ordering::Acquire) {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    /// The top-level value.
    pub fn root_element(&self) -> Result<Element<'_>> {
        self.check()?;
        Ok(Element { doc: self, index: 0 })
    }

    /// Marks the document disposed. Returns `true` for the one call that
    /// actually disposed it.
    pub fn dispose(&self) -> bool {
        let first = !self.disposed.swap(true, Ordering::AcqRel);
        if first {
            debug!(bytes = self.bytes.len(), rows = self.db.len(), "disposed document");
        }
        first
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// The input bytes the document indexes.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.check()?;
        Ok(&self.bytes)
    }

    /// Re-emits the whole document.
    pub fn write_to<W: io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        self.root_element()?.write_to(writer)
    }

    pub fn to_value(&self) -> Result<RdnValue> {
        self.root_element()?.to_value()
    }

    /// Bytes of the value range recorded on row `index`.
    fn value_bytes(&self, index: usize) -> &[u8] {
        let row = self.db.row(index);
        &self.bytes[row.location()..row.location() + row.size_or_length()]
    }

    /// Raw bytes of row `index`, including quotes, prefixes and for containers
    /// everything up to the closing bracket.
    fn raw_bytes(&self, index: usize, include_delimiters: bool) -> &[u8] {
        let row = self.db.row(index);
        let token = row.token_type();
        if token.is_start() {
            let end = self.db.row(self.db.end_index(index, false));
            return &self.bytes[row.location()..=end.location()];
        }
        let (before, after) = if include_delimiters {
            token.delimiter_lengths()
        } else {
            (0, 0)
        };
        &self.bytes[row.location() - before..row.location() + row.size_or_length() + after]
    }

    /// Walks every object and fails on the first repeated property name.
    fn check_duplicate_properties(&self) -> Result<()> {
        let mut scopes: Vec<Option<HashSet<Cow<'_, str>>>> = Vec::new();
        let mut objects = 0usize;
        for index in 0..self.db.len() {
            let row = self.db.row(index);
            match row.token_type() {
                TokenType::StartObject => {
                    objects += 1;
                    scopes.push(Some(HashSet::new()));
                }
                t if t.is_start() => scopes.push(None),
                t if t.is_end() => {
                    scopes.pop();
                }
                TokenType::PropertyName => {
                    let name = escape::unescape(self.value_bytes(index))?;
                    if let Some(Some(names)) = scopes.last_mut() {
                        if names.contains(&name) {
                            debug!(name = %name, offset = row.location() - 1, "duplicate property");
                            return Err(Error::DuplicateProperty {
                                name: name.into_owned(),
                                offset: row.location() - 1,
                            });
                        }
                        names.insert(name);
                    }
                }
                _ => {}
            }
        }
        trace!(objects, "no duplicate properties");
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("bytes", &self.bytes.len())
            .field("rows", &self.db.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Drains a reader over `bytes` into a finished index.
fn build_index(bytes: &[u8], options: &DocumentOptions) -> Result<MetadataDb> {
    let mut db = MetadataDb::with_capacity(bytes.len())?;
    let mut reader_options = options.reader.clone();
    reader_options.allow_multiple_values = false;
    let mut reader = Reader::new(bytes, reader_options);

    let mut stack: Vec<StackRow> = Vec::new();
    let mut count = 0usize;
    let mut escaped_names = false;

    while reader.read()? {
        let token = reader.token_type();

        if token != TokenType::PropertyName && !token.is_end() {
            if let Some(scope) = stack.last() {
                if scope.kind != ContainerKind::Object {
                    count += 1;
                }
            }
        }

        match token {
            TokenType::StartObject
            | TokenType::StartArray
            | TokenType::StartSet
            | TokenType::StartMap => {
                let start_index = db.append(token, reader.token_start_index(), 0, false);
                stack.push(StackRow {
                    start_index,
                    kind: token.container_kind().unwrap_or(ContainerKind::Array),
                    prior_count: count,
                    prior_escaped_names: escaped_names,
                });
                count = 0;
                escaped_names = false;
            }
            TokenType::EndObject | TokenType::EndArray | TokenType::EndSet | TokenType::EndMap => {
                let Some(scope) = stack.pop() else {
                    return Err(Error::syntax(
                        reader.token_start_index(),
                        "closing bracket without an open container",
                        "a value",
                        "a closing bracket",
                    ));
                };
                let end_index = db.append(token, reader.token_start_index(), 0, false);
                let rows = end_index - scope.start_index;
                if rows > MAX_ROWS {
                    return Err(Error::invalid_value(format!(
                        "container at offset {} spans more than {MAX_ROWS} tokens",
                        db.row(scope.start_index).location()
                    )));
                }
                let (length, complex) = match scope.kind {
                    ContainerKind::Object => (count, escaped_names),
                    ContainerKind::Map => (count / 2, rows != count + 1),
                    ContainerKind::Array | ContainerKind::Set => (count, rows != count + 1),
                };
                db.set_length(scope.start_index, length);
                db.set_number_of_rows(scope.start_index, rows);
                db.set_number_of_rows(end_index, rows);
                if complex {
                    db.set_has_complex_children(scope.start_index);
                }
                count = scope.prior_count;
                escaped_names = scope.prior_escaped_names;
            }
            TokenType::PropertyName => {
                count += 1;
                escaped_names |= reader.value_is_escaped();
                db.append(
                    token,
                    reader.value_start_index(),
                    reader.value_span().len(),
                    reader.value_is_escaped(),
                );
            }
            _ => {
                db.append(
                    token,
                    reader.value_start_index(),
                    reader.value_span().len(),
                    reader.value_is_escaped(),
                );
            }
        }
    }
    db.shrink_to_fit();
    Ok(db)
}

/// A handle to one value inside a [`Document`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    index: usize,
}

impl<'a> Element<'a> {
    fn token(&self) -> Result<TokenType> {
        self.doc.check()?;
        Ok(self.doc.db.row(self.index).token_type())
    }

    fn kind_of(token: TokenType) -> ValueKind {
        ValueKind::from_token(token).unwrap_or(ValueKind::Null)
    }

    fn expect(&self, expected: ValueKind) -> Result<()> {
        let kind = Self::kind_of(self.token()?);
        if kind == expected {
            Ok(())
        } else {
            Err(Error::type_mismatch(expected, kind))
        }
    }

    fn child(&self, index: usize) -> Element<'a> {
        Element {
            doc: self.doc,
            index,
        }
    }

    pub fn value_kind(&self) -> Result<ValueKind> {
        self.token().map(Self::kind_of)
    }

    pub fn is_null(&self) -> Result<bool> {
        Ok(self.token()? == TokenType::Null)
    }

    /// Element count of an array or set.
    pub fn get_array_length(&self) -> Result<usize> {
        match self.token()? {
            TokenType::StartArray | TokenType::StartSet => {
                Ok(self.doc.db.row(self.index).size_or_length())
            }
            other => Err(Error::type_mismatch("Array", Self::kind_of(other))),
        }
    }

    pub fn get_property_count(&self) -> Result<usize> {
        self.expect(ValueKind::Object)?;
        Ok(self.doc.db.row(self.index).size_or_length())
    }

    /// Entry count of a map.
    pub fn get_map_length(&self) -> Result<usize> {
        self.expect(ValueKind::Map)?;
        Ok(self.doc.db.row(self.index).size_or_length())
    }

    /// Index of the `n`-th direct child row of a container, `stride` rows per member.
    fn nth_child(&self, n: usize, stride: usize) -> usize {
        let row = self.doc.db.row(self.index);
        if !row.has_complex_children() {
            return self.index + 1 + n * stride;
        }
        let mut i = self.index + 1;
        for _ in 0..n * stride {
            i = self.doc.db.end_index(i, true);
        }
        i
    }

    /// The `n`-th element of an array or set.
    ///
    /// Constant time when every element is a single token, otherwise a walk
    /// that skips nested subtrees.
    pub fn get_index(&self, n: usize) -> Result<Element<'a>> {
        let len = self.get_array_length()?;
        if n >= len {
            return Err(Error::OutOfRange { index: n, len });
        }
        Ok(self.child(self.nth_child(n, 1)))
    }

    /// The `n`-th key/value pair of a map.
    pub fn get_map_entry(&self, n: usize) -> Result<(Element<'a>, Element<'a>)> {
        let len = self.get_map_length()?;
        if n >= len {
            return Err(Error::OutOfRange { index: n, len });
        }
        let key = self.nth_child(n, 2);
        Ok((self.child(key), self.child(self.doc.db.end_index(key, true))))
    }

    /// Looks up a property; when a name repeats, the last one wins.
    pub fn try_get_property(&self, name: &str) -> Result<Option<Element<'a>>> {
        self.expect(ValueKind::Object)?;
        let db = &self.doc.db;
        let mut i = db.end_index(self.index, false) - 1;
        while i > self.index {
            let row = db.row(i);
            let value = if row.token_type().is_end() {
                i - row.number_of_rows()
            } else {
                i
            };
            let name_index = value - 1;
            if self.doc.name_equals(name_index, name) {
                return Ok(Some(self.child(value)));
            }
            i = name_index - 1;
        }
        Ok(None)
    }

    pub fn get_property(&self, name: &str) -> Result<Element<'a>> {
        self.try_get_property(name)?
            .ok_or_else(|| Error::PropertyNotFound(name.to_string()))
    }

    /// Elements of an array or set, in order.
    pub fn array_iter(&self) -> Result<ArrayIter<'a>> {
        let remaining = self.get_array_length()?;
        Ok(ArrayIter {
            doc: self.doc,
            next: self.index + 1,
            remaining,
        })
    }

    /// Properties of an object, in document order.
    pub fn properties(&self) -> Result<PropertyIter<'a>> {
        let remaining = self.get_property_count()?;
        Ok(PropertyIter {
            doc: self.doc,
            next: self.index + 1,
            remaining,
        })
    }

    /// Key/value pairs of a map, in document order.
    pub fn map_iter(&self) -> Result<MapIter<'a>> {
        let remaining = self.get_map_length()?;
        Ok(MapIter {
            doc: self.doc,
            next: self.index + 1,
            remaining,
        })
    }

    /// The exact input bytes of this value.
    ///
    /// With `include_delimiters`, scalars keep their quotes and literal
    /// prefixes (`"`, `@`, `/`, `b"`, `x"`, the `n` suffix). Containers always
    /// span their brackets.
    pub fn get_raw_value(&self, include_delimiters: bool) -> Result<&'a [u8]> {
        self.doc.check()?;
        Ok(self.doc.raw_bytes(self.index, include_delimiters))
    }

    pub fn get_string(&self) -> Result<Cow<'a, str>> {
        self.expect(ValueKind::String)?;
        let raw = self.doc.value_bytes(self.index);
        if self.doc.db.row(self.index).has_complex_children() {
            escape::unescape(raw)
        } else {
            std::str::from_utf8(raw)
                .map(Cow::Borrowed)
                .map_err(|e| Error::invalid_value(e))
        }
    }

    /// Compares a string value with `text` without unescaping into a buffer.
    pub fn text_equals(&self, text: &str) -> Result<bool> {
        self.expect(ValueKind::String)?;
        Ok(self.doc.text_equals(self.index, text))
    }

    pub fn get_bool(&self) -> Result<bool> {
        match self.token()? {
            TokenType::True => Ok(true),
            TokenType::False => Ok(false),
            other => Err(Error::type_mismatch("Boolean", Self::kind_of(other))),
        }
    }

    fn number_bytes(&self) -> Result<&'a [u8]> {
        self.expect(ValueKind::Number)?;
        Ok(self.doc.value_bytes(self.index))
    }

    pub fn get_i64(&self) -> Result<i64> {
        literal::parse_i64(self.number_bytes()?)
    }

    pub fn get_i32(&self) -> Result<i32> {
        let value = self.get_i64()?;
        i32::try_from(value).map_err(|_| Error::invalid_value(format!("{value} does not fit in i32")))
    }

    pub fn get_u64(&self) -> Result<u64> {
        literal::parse_u64(self.number_bytes()?)
    }

    pub fn get_f64(&self) -> Result<f64> {
        literal::parse_f64(self.number_bytes()?)
    }

    /// Big integer literals, or integral plain numbers.
    pub fn get_big_integer(&self) -> Result<BigInt> {
        match self.token()? {
            TokenType::BigInteger | TokenType::Number => {
                literal::parse_big_integer(self.doc.value_bytes(self.index))
            }
            other => Err(Error::type_mismatch(ValueKind::BigInteger, Self::kind_of(other))),
        }
    }

    pub fn get_date_time(&self) -> Result<DateTime<Utc>> {
        self.expect(ValueKind::DateTime)?;
        literal::parse_date_time(self.doc.value_bytes(self.index))
    }

    pub fn get_time_only(&self) -> Result<NaiveTime> {
        self.expect(ValueKind::TimeOnly)?;
        literal::parse_time_only(self.doc.value_bytes(self.index))
    }

    pub fn get_duration(&self) -> Result<RdnDuration> {
        self.expect(ValueKind::Duration)?;
        literal::parse_duration(self.doc.value_bytes(self.index))
    }

    pub fn get_regexp(&self) -> Result<RdnRegExp> {
        self.expect(ValueKind::RegExp)?;
        literal::parse_regexp(self.doc.value_bytes(self.index))
    }

    /// Decoded bytes of a `b"..."` or `x"..."` literal.
    pub fn get_binary(&self) -> Result<Vec<u8>> {
        self.expect(ValueKind::Binary)?;
        let is_hex = self.doc.db.row(self.index).has_complex_children();
        literal::decode_binary(self.doc.value_bytes(self.index), is_hex)
    }

    /// Converts this value with [`FromElement`].
    pub fn get<T: FromElement>(&self) -> Result<T> {
        T::from_element(self)
    }

    /// Like [`get`](Self::get), but a value of another kind or out of range
    /// for `T` gives `Ok(None)`. Only a disposed document is an error.
    pub fn try_get<T: FromElement>(&self) -> Result<Option<T>> {
        match T::from_element(self) {
            Ok(value) => Ok(Some(value)),
            Err(Error::Disposed) => Err(Error::Disposed),
            Err(_) => Ok(None),
        }
    }

    /// Copies this value into a new, independently owned document.
    pub fn clone_element(&self) -> Result<Document> {
        self.doc.check()?;
        let raw = self.doc.raw_bytes(self.index, true);
        let base = raw.as_ptr() as usize - self.doc.bytes.as_ptr() as usize;
        let end = self.doc.db.end_index(self.index, true);
        let db = self.doc.db.copy_segment(self.index, end, base);
        debug!(bytes = raw.len(), rows = db.len(), "cloned element");
        Ok(Document {
            bytes: raw.to_vec(),
            db,
            disposed: AtomicBool::new(false),
        })
    }

    /// Re-emits this value through `writer`, copying scalar tokens verbatim.
    pub fn write_to<W: io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        struct Frame {
            is_map: bool,
            next_is_value: bool,
        }

        self.doc.check()?;
        let db = &self.doc.db;
        let end = db.end_index(self.index, true);
        let mut frames: Vec<Frame> = Vec::new();

        for index in self.index..end {
            let token = db.row(index).token_type();
            if token.is_end() {
                frames.pop();
                match token {
                    TokenType::EndObject => writer.write_end_object()?,
                    TokenType::EndArray => writer.write_end_array()?,
                    TokenType::EndSet => writer.write_end_set()?,
                    _ => writer.write_end_map()?,
                }
            } else if token == TokenType::PropertyName {
                writer.write_raw_property_name(self.doc.value_bytes(index))?;
                continue;
            } else {
                if let Some(frame) = frames.last() {
                    if frame.is_map && frame.next_is_value {
                        writer.write_map_arrow()?;
                    }
                }
                match token {
                    TokenType::StartObject => writer.write_start_object()?,
                    TokenType::StartArray => writer.write_start_array()?,
                    TokenType::StartSet => writer.write_start_set()?,
                    TokenType::StartMap => writer.write_start_map()?,
                    _ => writer.write_raw_scalar(self.doc.raw_bytes(index, true))?,
                }
                if token.is_start() {
                    frames.push(Frame {
                        is_map: token == TokenType::StartMap,
                        next_is_value: false,
                    });
                    continue;
                }
            }
            // A value just completed in the enclosing container.
            if let Some(frame) = frames.last_mut() {
                if frame.is_map {
                    frame.next_is_value = !frame.next_is_value;
                }
            }
        }
        Ok(())
    }

    /// Materializes this value and everything below it.
    pub fn to_value(&self) -> Result<RdnValue> {
        Ok(match self.value_kind()? {
            ValueKind::Null => RdnValue::Null,
            ValueKind::True => RdnValue::Bool(true),
            ValueKind::False => RdnValue::Bool(false),
            ValueKind::Number => {
                let raw = self.doc.value_bytes(self.index);
                RdnValue::Number(Number::from_literal(raw)?)
            }
            ValueKind::BigInteger => RdnValue::BigInt(self.get_big_integer()?),
            ValueKind::String => RdnValue::String(self.get_string()?.into_owned()),
            ValueKind::DateTime => RdnValue::DateTime(self.get_date_time()?),
            ValueKind::TimeOnly => RdnValue::TimeOnly(self.get_time_only()?),
            ValueKind::Duration => RdnValue::Duration(self.get_duration()?),
            ValueKind::RegExp => RdnValue::RegExp(self.get_regexp()?),
            ValueKind::Binary => RdnValue::Binary(self.get_binary()?),
            ValueKind::Array => RdnValue::Array(
                self.array_iter()?
                    .map(|e| e.to_value())
                    .collect::<Result<_>>()?,
            ),
            ValueKind::Set => RdnValue::Set(
                self.array_iter()?
                    .map(|e| e.to_value())
                    .collect::<Result<_>>()?,
            ),
            ValueKind::Map => RdnValue::Map(
                self.map_iter()?
                    .map(|(k, v)| Ok((k.to_value()?, v.to_value()?)))
                    .collect::<Result<_>>()?,
            ),
            ValueKind::Object => {
                let mut map = RdnMap::with_capacity(self.get_property_count()?);
                for property in self.properties()? {
                    map.insert(property.name()?.into_owned(), property.value().to_value()?);
                }
                RdnValue::Object(map)
            }
        })
    }
}

impl Document {
    fn text_equals(&self, index: usize, text: &str) -> bool {
        let raw = self.value_bytes(index);
        if self.db.row(index).has_complex_children() {
            escape::unescaped_eq(raw, text.as_bytes())
        } else {
            raw == text.as_bytes()
        }
    }

    fn name_equals(&self, index: usize, name: &str) -> bool {
        self.text_equals(index, name)
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.doc.raw_bytes(self.index, true);
        f.debug_struct("Element")
            .field("kind", &self.value_kind().ok())
            .field("raw", &String::from_utf8_lossy(raw))
            .finish()
    }
}

/// One property of an object.
#[derive(Clone, Copy)]
pub struct Property<'a> {
    doc: &'a Document,
    name_index: usize,
}

impl<'a> Property<'a> {
    pub fn name(&self) -> Result<Cow<'a, str>> {
        self.doc.check()?;
        let raw = self.doc.value_bytes(self.name_index);
        if self.doc.db.row(self.name_index).has_complex_children() {
            escape::unescape(raw)
        } else {
            std::str::from_utf8(raw)
                .map(Cow::Borrowed)
                .map_err(|e| Error::invalid_value(e))
        }
    }

    /// Compares the name with `text` without unescaping into a buffer.
    pub fn name_equals(&self, text: &str) -> Result<bool> {
        self.doc.check()?;
        Ok(self.doc.name_equals(self.name_index, text))
    }

    pub fn value(&self) -> Element<'a> {
        Element {
            doc: self.doc,
            index: self.name_index + 1,
        }
    }
}

pub struct ArrayIter<'a> {
    doc: &'a Document,
    next: usize,
    remaining: usize,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let element = Element {
            doc: self.doc,
            index: self.next,
        };
        self.next = self.doc.db.end_index(self.next, true);
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ArrayIter<'_> {}

pub struct PropertyIter<'a> {
    doc: &'a Document,
    next: usize,
    remaining: usize,
}

impl<'a> Iterator for PropertyIter<'a> {
    type Item = Property<'a>;

    fn next(&mut self) -> Option<Property<'a>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let property = Property {
            doc: self.doc,
            name_index: self.next,
        };
        self.next = self.doc.db.end_index(self.next + 1, true);
        Some(property)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PropertyIter<'_> {}

pub struct MapIter<'a> {
    doc: &'a Document,
    next: usize,
    remaining: usize,
}

impl<'a> Iterator for MapIter<'a> {
    type Item = (Element<'a>, Element<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let value = self.doc.db.end_index(self.next, true);
        let entry = (
            Element {
                doc: self.doc,
                index: self.next,
            },
            Element {
                doc: self.doc,
                index: value,
            },
        );
        self.next = self.doc.db.end_index(value, true);
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for MapIter<'_> {}

/// Types that can be read out of an [`Element`].
pub trait FromElement: Sized {
    fn from_element(element: &Element<'_>) -> Result<Self>;
}

macro_rules! from_element {
    ($($ty:ty => $getter:ident),* $(,)?) => {
        $(
            impl FromElement for $ty {
                fn from_element(element: &Element<'_>) -> Result<Self> {
                    element.$getter()
                }
            }
        )*
    };
}

from_element! {
    bool => get_bool,
    i32 => get_i32,
    i64 => get_i64,
    u64 => get_u64,
    f64 => get_f64,
    BigInt => get_big_integer,
    DateTime<Utc> => get_date_time,
    NaiveTime => get_time_only,
    RdnDuration => get_duration,
    RdnRegExp => get_regexp,
    Vec<u8> => get_binary,
    RdnValue => to_value,
}

impl FromElement for u32 {
    fn from_element(element: &Element<'_>) -> Result<Self> {
        let value = element.get_i64()?;
        u32::try_from(value).map_err(|_| Error::invalid_value(format!("{value} does not fit in u32")))
    }
}

impl FromElement for String {
    fn from_element(element: &Element<'_>) -> Result<Self> {
        element.get_string().map(Cow::into_owned)
    }
}

impl<T: FromElement> FromElement for Option<T> {
    fn from_element(element: &Element<'_>) -> Result<Self> {
        if element.is_null()? {
            Ok(None)
        } else {
            T::from_element(element).map(Some)
        }
    }
}
