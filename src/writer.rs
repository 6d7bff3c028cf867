//! The low-level forward-only writer.
//!
//! [`Writer`] mirrors the reader's container stack: it inserts commas,
//! colons and map arrows itself and rejects any call that would produce
//! invalid RDN before a single byte of it is written.
//!
//! ## Usage
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
//! Empty sets and maps always keep their type name, since `{}` alone reads
//! back as an object:
//!
//! ```rust
//! use rdn::{Writer, WriterOptions};
//!
//! let mut writer = Writer::new(WriterOptions::default());
//! writer.write_start_set().unwrap();
//! writer.write_end_set().unwrap();
//! assert_eq!(writer.into_string().unwrap(), "Set{}");
//! ```

use crate::escape;
use crate::literal;
use crate::options::WriterOptions;
use crate::tables::{
    MAP_ARROW, MAP_PREFIX, MAX_DATE_TIME_LENGTH, MAX_TIME_ONLY_LENGTH, SET_PREFIX,
};
use crate::token::ContainerKind;
use crate::types::{RdnDuration, RdnRegExp};
use crate::{Error, Result};
use chrono::{DateTime, NaiveTime, Utc};
use num_bigint::BigInt;
use std::io::{self, Write as _};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Expecting a new member or the end of the container.
    Member,
    /// Map key written, arrow pending.
    Arrow,
    /// Property name or map arrow written, value pending.
    Value,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    kind: ContainerKind,
    count: usize,
    phase: Phase,
    /// Sets and maps emit their opening bytes only once the first member
    /// arrives, so that an empty one can be written as `Set{}` / `Map{}`.
    opened: bool,
}

/// A forward-only RDN emitter.
pub struct Writer<W: io::Write = Vec<u8>> {
    out: W,
    options: WriterOptions,
    stack: Vec<Frame>,
    root_written: bool,
    bytes_written: usize,
}

impl Writer<Vec<u8>> {
    /// Creates a writer over a growable buffer.
    #[must_use]
    pub fn new(options: WriterOptions) -> Self {
        Self::with_output(Vec::with_capacity(256), options)
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// Consumes the writer, returning the output as text.
    pub fn into_string(self) -> Result<String> {
        String::from_utf8(self.out).map_err(|e| Error::invalid_value(e))
    }
}

impl<W: io::Write> Writer<W> {
    /// Creates a writer over an external sink.
    pub fn with_output(out: W, options: WriterOptions) -> Self {
        Writer {
            out,
            options,
            stack: Vec::new(),
            root_written: false,
            bytes_written: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Number of open containers.
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// `true` once a complete top-level value has been written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.root_written && self.stack.is_empty()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    fn emit_escaped(&mut self, text: &str) -> Result<()> {
        let mut counted = Counted {
            inner: &mut self.out,
            count: &mut self.bytes_written,
        };
        escape::write_escaped(&mut counted, text.as_bytes())?;
        Ok(())
    }

    fn newline(&mut self, depth: usize) -> Result<()> {
        if !self.options.indented {
            return Ok(());
        }
        self.emit(b"\n")?;
        for _ in 0..depth * self.options.indent {
            self.emit(b" ")?;
        }
        Ok(())
    }

    /// Emits the deferred `{` or `Set{` / `Map{` of the innermost container.
    fn open_pending(&mut self) -> Result<()> {
        let Some(frame) = self.stack.last_mut() else {
            return Ok(());
        };
        if frame.opened {
            return Ok(());
        }
        frame.opened = true;
        let prefix: &[u8] = match (frame.kind, self.options.always_write_type_name) {
            (ContainerKind::Set, true) => SET_PREFIX,
            (ContainerKind::Map, true) => MAP_PREFIX,
            _ => b"{",
        };
        self.emit(prefix)
    }

    /// Checks that a value may be written here, then emits whatever separator
    /// precedes it.
    fn before_value(&mut self, what: &str) -> Result<()> {
        let Some(frame) = self.stack.last().copied() else {
            if self.root_written {
                return Err(Error::invalid_operation(format!(
                    "cannot write {what}: the top-level value is already complete"
                )));
            }
            return Ok(());
        };
        match (frame.kind, frame.phase) {
            (ContainerKind::Object, Phase::Member) => Err(Error::invalid_operation(format!(
                "cannot write {what} in an object before its property name"
            ))),
            (_, Phase::Value) => Ok(()),
            (ContainerKind::Map, Phase::Arrow) => {
                self.write_arrow()?;
                if let Some(top) = self.stack.last_mut() {
                    top.phase = Phase::Value;
                }
                Ok(())
            }
            _ => {
                self.open_pending()?;
                if frame.count > 0 {
                    self.emit(b",")?;
                }
                self.newline(self.stack.len())
            }
        }
    }

    /// Records a completed value in the innermost container.
    fn after_value(&mut self) {
        let Some(frame) = self.stack.last_mut() else {
            self.root_written = true;
            return;
        };
        match (frame.kind, frame.phase) {
            (ContainerKind::Map, Phase::Member) => frame.phase = Phase::Arrow,
            (ContainerKind::Array | ContainerKind::Set, _) => frame.count += 1,
            _ => {
                frame.phase = Phase::Member;
                frame.count += 1;
            }
        }
    }

    fn write_arrow(&mut self) -> Result<()> {
        if self.options.indented {
            self.emit(b" => ")
        } else {
            self.emit(MAP_ARROW)
        }
    }

    fn write_start(&mut self, kind: ContainerKind) -> Result<()> {
        let max = self.options.max_depth();
        if self.stack.len() >= max {
            return Err(Error::DepthExceeded {
                offset: self.bytes_written,
                max,
            });
        }
        self.before_value("a container")?;
        let opened = match kind {
            ContainerKind::Object => {
                self.emit(b"{")?;
                true
            }
            ContainerKind::Array => {
                self.emit(b"[")?;
                true
            }
            ContainerKind::Set | ContainerKind::Map => false,
        };
        self.stack.push(Frame {
            kind,
            count: 0,
            phase: Phase::Member,
            opened,
        });
        Ok(())
    }

    fn write_end(&mut self, kind: ContainerKind) -> Result<()> {
        let Some(frame) = self.stack.last().copied() else {
            return Err(Error::invalid_operation(format!(
                "cannot end a {kind}: no container is open"
            )));
        };
        if frame.kind != kind {
            return Err(Error::invalid_operation(format!(
                "cannot end a {kind} while a {} is open",
                frame.kind
            )));
        }
        if frame.phase != Phase::Member {
            let pending = if kind == ContainerKind::Object {
                "property value"
            } else {
                "map value"
            };
            return Err(Error::invalid_operation(format!(
                "cannot end a {kind} with a pending {pending}"
            )));
        }
        let closer: &[u8] = if kind == ContainerKind::Array { b"]" } else { b"}" };
        if !frame.opened {
            let prefix = if kind == ContainerKind::Set {
                SET_PREFIX
            } else {
                MAP_PREFIX
            };
            self.emit(prefix)?;
        } else if frame.count > 0 {
            self.newline(self.stack.len() - 1)?;
        }
        self.emit(closer)?;
        self.stack.pop();
        self.after_value();
        Ok(())
    }

    pub fn write_start_object(&mut self) -> Result<()> {
        self.write_start(ContainerKind::Object)
    }

    pub fn write_end_object(&mut self) -> Result<()> {
        self.write_end(ContainerKind::Object)
    }

    pub fn write_start_array(&mut self) -> Result<()> {
        self.write_start(ContainerKind::Array)
    }

    pub fn write_end_array(&mut self) -> Result<()> {
        self.write_end(ContainerKind::Array)
    }

    /// Starts a set. A non-empty set is written as bare `{...}` unless
    /// [`WriterOptions::always_write_type_name`] is set.
    pub fn write_start_set(&mut self) -> Result<()> {
        self.write_start(ContainerKind::Set)
    }

    pub fn write_end_set(&mut self) -> Result<()> {
        self.write_end(ContainerKind::Set)
    }

    /// Starts a map. Keys and values are written as ordinary values; the
    /// `=>` between them is inserted automatically.
    pub fn write_start_map(&mut self) -> Result<()> {
        self.write_start(ContainerKind::Map)
    }

    pub fn write_end_map(&mut self) -> Result<()> {
        self.write_end(ContainerKind::Map)
    }

    fn check_property_position(&self) -> Result<()> {
        match self.stack.last() {
            Some(Frame {
                kind: ContainerKind::Object,
                phase: Phase::Member,
                ..
            }) => Ok(()),
            Some(Frame {
                kind: ContainerKind::Object,
                ..
            }) => Err(Error::invalid_operation(
                "cannot write a property name while a property value is pending",
            )),
            Some(frame) => Err(Error::invalid_operation(format!(
                "cannot write a property name inside a {}",
                frame.kind
            ))),
            None => Err(Error::invalid_operation(
                "cannot write a property name outside an object",
            )),
        }
    }

    fn property_prelude(&mut self) -> Result<()> {
        self.check_property_position()?;
        let count = self.stack.last().map_or(0, |f| f.count);
        if count > 0 {
            self.emit(b",")?;
        }
        self.newline(self.stack.len())?;
        self.emit(b"\"")
    }

    fn property_postlude(&mut self) -> Result<()> {
        self.emit(if self.options.indented { b"\": " } else { b"\":" })?;
        if let Some(frame) = self.stack.last_mut() {
            frame.phase = Phase::Value;
        }
        Ok(())
    }

    pub fn write_property_name(&mut self, name: &str) -> Result<()> {
        self.property_prelude()?;
        self.emit_escaped(name)?;
        self.property_postlude()
    }

    /// Writes a property name whose bytes are already escaped.
    pub(crate) fn write_raw_property_name(&mut self, escaped: &[u8]) -> Result<()> {
        self.property_prelude()?;
        self.emit(escaped)?;
        self.property_postlude()
    }

    /// Writes the `=>` between a map key and its value explicitly.
    ///
    /// Optional: writing the value right after the key inserts it too.
    pub fn write_map_arrow(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame {
                kind: ContainerKind::Map,
                phase: Phase::Arrow,
                ..
            }) => {}
            _ => {
                return Err(Error::invalid_operation(
                    "'=>' is only valid after a map key",
                ))
            }
        }
        self.write_arrow()?;
        if let Some(frame) = self.stack.last_mut() {
            frame.phase = Phase::Value;
        }
        Ok(())
    }

    fn scalar(&mut self, what: &str, bytes: &[u8]) -> Result<()> {
        self.before_value(what)?;
        self.emit(bytes)?;
        self.after_value();
        Ok(())
    }

    /// Writes a scalar token verbatim, delimiters included.
    pub(crate) fn write_raw_scalar(&mut self, raw: &[u8]) -> Result<()> {
        self.scalar("a value", raw)
    }

    pub fn write_string_value(&mut self, value: &str) -> Result<()> {
        self.before_value("a string")?;
        self.emit(b"\"")?;
        self.emit_escaped(value)?;
        self.emit(b"\"")?;
        self.after_value();
        Ok(())
    }

    pub fn write_null_value(&mut self) -> Result<()> {
        self.scalar("null", b"null")
    }

    pub fn write_bool_value(&mut self, value: bool) -> Result<()> {
        self.scalar("a boolean", if value { b"true" } else { b"false" })
    }

    pub fn write_i64_value(&mut self, value: i64) -> Result<()> {
        let mut buf = [0u8; 20];
        let len = format_into(&mut buf, format_args!("{value}"))?;
        self.scalar("a number", &buf[..len])
    }

    pub fn write_u64_value(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; 20];
        let len = format_into(&mut buf, format_args!("{value}"))?;
        self.scalar("a number", &buf[..len])
    }

    /// Non-finite values are written as `NaN`, `Infinity` and `-Infinity`.
    pub fn write_f64_value(&mut self, value: f64) -> Result<()> {
        if value.is_nan() {
            return self.scalar("a number", b"NaN");
        }
        if value.is_infinite() {
            let text: &[u8] = if value > 0.0 { b"Infinity" } else { b"-Infinity" };
            return self.scalar("a number", text);
        }
        // Debug keeps a `.0` or exponent on integral values, so they read back as floats.
        let mut buf = [0u8; 32];
        let len = format_into(&mut buf, format_args!("{value:?}"))?;
        self.scalar("a number", &buf[..len])
    }

    /// Writes `<digits>n`.
    pub fn write_big_integer_value(&mut self, value: &BigInt) -> Result<()> {
        let mut text = value.to_string();
        text.push('n');
        self.scalar("a big integer", text.as_bytes())
    }

    /// Writes `@YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub fn write_date_time_value(&mut self, value: &DateTime<Utc>) -> Result<()> {
        let mut buf = [0u8; MAX_DATE_TIME_LENGTH];
        literal::format_date_time(value, &mut buf)?;
        self.scalar("a date-time", &buf)
    }

    /// Writes `@HH:MM:SS`, with `.mmm` when the time has milliseconds.
    pub fn write_time_only_value(&mut self, value: &NaiveTime) -> Result<()> {
        let mut buf = [0u8; MAX_TIME_ONLY_LENGTH];
        let len = literal::format_time_only(value, &mut buf);
        self.scalar("a time", &buf[..len])
    }

    pub fn write_duration_value(&mut self, value: &RdnDuration) -> Result<()> {
        let text = format!("@{value}");
        self.scalar("a duration", text.as_bytes())
    }

    pub fn write_regexp_value(&mut self, value: &RdnRegExp) -> Result<()> {
        let text = value.to_string();
        self.scalar("a regular expression", text.as_bytes())
    }

    /// Writes `b"<base64>"`.
    pub fn write_binary_value(&mut self, bytes: &[u8]) -> Result<()> {
        let text = format!("b\"{}\"", literal::encode_base64(bytes));
        self.scalar("binary data", text.as_bytes())
    }

    /// Writes `x"<hex>"`.
    pub fn write_binary_hex_value(&mut self, bytes: &[u8]) -> Result<()> {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut text = Vec::with_capacity(bytes.len() * 2 + 3);
        text.extend_from_slice(b"x\"");
        for &b in bytes {
            text.push(HEX[(b >> 4) as usize]);
            text.push(HEX[(b & 0xF) as usize]);
        }
        text.push(b'"');
        self.scalar("binary data", &text)
    }
}

struct Counted<'a, W> {
    inner: &'a mut W,
    count: &'a mut usize,
}

impl<W: io::Write> io::Write for Counted<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        *self.count += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Formats into a stack buffer, returning the length used.
fn format_into(buf: &mut [u8], args: std::fmt::Arguments<'_>) -> Result<usize> {
    let mut cursor = io::Cursor::new(buf);
    cursor.write_fmt(args)?;
    Ok(cursor.position() as usize)
}
