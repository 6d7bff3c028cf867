//! The low-level pull reader.
//!
//! [`Reader`] walks a byte slice forward one token at a time without building
//! any object graph. It tracks the stack of open containers, validates the
//! grammar as it goes and exposes the current token's raw bytes and typed
//! values.
//!
//! ## Usage
//!
//! ```rust
//! use rdn::{Reader, ReaderOptions, TokenType};
//!
//! let mut reader = Reader::new(b"Set{1, 2, 3}", ReaderOptions::default());
//! let mut tokens = Vec::new();
//! while reader.read().unwrap() {
//!     tokens.push(reader.token_type());
//! }
//! assert_eq!(
//!     tokens,
//!     [
//!         TokenType::StartSet,
//!         TokenType::Number,
//!         TokenType::Number,
//!         TokenType::Number,
//!         TokenType::EndSet,
//!     ]
//! );
//! ```
//!
//! ## Incremental input
//!
//! A reader built with [`Reader::partial`] over a non-final block returns
//! `Ok(false)` when a token is cut off. [`Reader::bytes_consumed`] marks where
//! to resume and [`Reader::state`] carries the grammar state into
//! [`Reader::resume`] over the unconsumed bytes plus the next block.
//!
//! ```rust
//! use rdn::{Reader, ReaderOptions, TokenType};
//!
//! let input = br#"{"big": 12345678901234567890n}"#;
//! let (first, second) = input.split_at(14);
//!
//! let mut reader = Reader::partial(first, false, ReaderOptions::default());
//! assert!(reader.read().unwrap()); // {
//! assert!(reader.read().unwrap()); // "big"
//! assert!(!reader.read().unwrap()); // the number is cut off
//!
//! let mut rest = first[reader.bytes_consumed()..].to_vec();
//! rest.extend_from_slice(second);
//! let mut reader = Reader::resume(&rest, true, reader.state());
//! assert!(reader.read().unwrap());
//! assert_eq!(reader.token_type(), TokenType::BigInteger);
//! assert_eq!(reader.value_span(), b"12345678901234567890");
//! ```

use crate::escape;
use crate::literal;
use crate::options::{CommentHandling, ReaderOptions};
use crate::tables::{
    describe_byte, is_value_terminator, is_whitespace, is_temporal_byte, BASE64_PREFIX,
    BIG_INTEGER_SUFFIX, FALSE, HEX_PREFIX, INFINITY, MAP_PREFIX, NAN, NEG_INFINITY, NULL,
    REGEXP_DELIMITER, SET_PREFIX, TEMPORAL_PREFIX, TRUE,
};
use crate::token::{ContainerKind, TokenType};
use crate::types::{RdnDuration, RdnRegExp};
use crate::{Error, Result};
use chrono::{DateTime, NaiveTime, Utc};
use memchr::{memchr, memchr2, memmem};
use num_bigint::BigInt;
use std::borrow::Cow;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frame {
    kind: ContainerKind,
    closer: u8,
    /// In a map: the key of the current entry has been read.
    after_key: bool,
}

/// Grammar state carried across [`Reader::resume`].
#[derive(Clone, Debug, Default)]
pub struct ReaderState {
    stack: Vec<Frame>,
    token: TokenType,
    consumed: usize,
    options: ReaderOptions,
}

impl ReaderState {
    #[must_use]
    pub fn new(options: ReaderOptions) -> Self {
        ReaderState {
            options,
            ..Default::default()
        }
    }

    /// Open containers at the resume point.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Total bytes consumed before the resume point.
    #[must_use]
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }
}

enum Action {
    None,
    Push(Frame),
    Pop,
}

struct Scanned {
    token: TokenType,
    token_start: usize,
    value_start: usize,
    value_len: usize,
    escaped: bool,
    end: usize,
    action: Action,
}

impl Scanned {
    fn scalar(token: TokenType, token_start: usize, value_start: usize, value_end: usize, end: usize) -> Self {
        Scanned {
            token,
            token_start,
            value_start,
            value_len: value_end - value_start,
            escaped: false,
            end,
            action: Action::None,
        }
    }
}

/// A forward-only tokenizer over RDN text.
pub struct Reader<'a> {
    buf: &'a [u8],
    is_final_block: bool,
    options: ReaderOptions,
    /// Absolute offset of `buf[0]`.
    base: usize,
    pos: usize,
    token: TokenType,
    token_start: usize,
    value_start: usize,
    value_len: usize,
    value_is_escaped: bool,
    stack: Vec<Frame>,
}

impl<'a> Reader<'a> {
    /// Creates a reader over complete input.
    #[must_use]
    pub fn new(buf: &'a [u8], options: ReaderOptions) -> Self {
        Self::partial(buf, true, options)
    }

    /// Creates a reader over the first block of possibly incomplete input.
    #[must_use]
    pub fn partial(buf: &'a [u8], is_final_block: bool, options: ReaderOptions) -> Self {
        Self::resume(buf, is_final_block, ReaderState::new(options))
    }

    /// Continues reading where a previous reader stopped.
    ///
    /// `buf` must start at the previous reader's [`bytes_consumed`](Self::bytes_consumed).
    #[must_use]
    pub fn resume(buf: &'a [u8], is_final_block: bool, state: ReaderState) -> Self {
        Reader {
            buf,
            is_final_block,
            options: state.options,
            base: state.consumed,
            pos: 0,
            token: state.token,
            token_start: 0,
            value_start: 0,
            value_len: 0,
            value_is_escaped: false,
            stack: state.stack,
        }
    }

    /// Snapshot of the grammar state at the current position.
    #[must_use]
    pub fn state(&self) -> ReaderState {
        ReaderState {
            stack: self.stack.clone(),
            token: self.token,
            consumed: self.base + self.pos,
            options: self.options.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn token_type(&self) -> TokenType {
        self.token
    }

    /// The current token's value bytes, without quotes or literal prefixes.
    #[inline]
    #[must_use]
    pub fn value_span(&self) -> &'a [u8] {
        &self.buf[self.value_start..self.value_start + self.value_len]
    }

    /// `true` when a string contains escapes, or a binary literal is hex-encoded.
    #[inline]
    #[must_use]
    pub fn value_is_escaped(&self) -> bool {
        self.value_is_escaped
    }

    /// Absolute offset of the first byte of the current token.
    #[inline]
    #[must_use]
    pub fn token_start_index(&self) -> usize {
        self.base + self.token_start
    }

    /// Absolute offset of the current token's value bytes.
    #[inline]
    #[must_use]
    pub fn value_start_index(&self) -> usize {
        self.base + self.value_start
    }

    /// Bytes of this reader's buffer consumed so far.
    #[inline]
    #[must_use]
    pub fn bytes_consumed(&self) -> usize {
        self.pos
    }

    /// Number of open containers.
    #[inline]
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_final_block(&self) -> bool {
        self.is_final_block
    }

    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Advances to the next token.
    ///
    /// Returns `Ok(false)` at the legitimate end of input, or when the current
    /// block ends mid-token and more input may follow. On error the reader
    /// stays at the start of the offending token.
    pub fn read(&mut self) -> Result<bool> {
        match self.scan_next() {
            Ok(Some(scanned)) => {
                self.commit(scanned);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => Err(err.shift_offset(self.base)),
        }
    }

    /// Skips the children of the current container, leaving the reader on its end token.
    ///
    /// On a property name the value is skipped. Returns `Ok(false)`, with the
    /// reader unchanged, if the block ends before the value does.
    pub fn try_skip(&mut self) -> Result<bool> {
        let saved = (
            self.pos,
            self.token,
            self.token_start,
            self.value_start,
            self.value_len,
            self.value_is_escaped,
            self.stack.clone(),
        );
        match self.skip_inner() {
            Ok(true) => Ok(true),
            outcome => {
                (
                    self.pos,
                    self.token,
                    self.token_start,
                    self.value_start,
                    self.value_len,
                    self.value_is_escaped,
                    self.stack,
                ) = saved;
                outcome
            }
        }
    }

    /// Like [`try_skip`](Self::try_skip), but incomplete input is an error.
    pub fn skip(&mut self) -> Result<()> {
        if self.try_skip()? {
            Ok(())
        } else {
            Err(Error::unexpected_eof(self.base + self.buf.len(), "the end of the skipped value"))
        }
    }

    fn skip_inner(&mut self) -> Result<bool> {
        if self.token == TokenType::PropertyName && !self.read()? {
            return Ok(false);
        }
        if !self.token.is_start() {
            return Ok(true);
        }
        let depth = self.stack.len();
        while self.stack.len() >= depth {
            if !self.read()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn commit(&mut self, s: Scanned) {
        self.token = s.token;
        self.token_start = s.token_start;
        self.value_start = s.value_start;
        self.value_len = s.value_len;
        self.value_is_escaped = s.escaped;
        self.pos = s.end;
        match s.action {
            Action::Push(frame) => self.stack.push(frame),
            Action::Pop => {
                self.stack.pop();
                self.complete_value();
            }
            Action::None if s.token != TokenType::PropertyName => self.complete_value(),
            Action::None => {}
        }
    }

    /// A value finished in the current frame.
    fn complete_value(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            if frame.kind == ContainerKind::Map {
                frame.after_key = !frame.after_key;
            }
        }
    }

    fn incomplete<T>(&self, offset: usize, expected: &str) -> Result<Option<T>> {
        if self.is_final_block {
            Err(Error::unexpected_eof(offset, expected))
        } else {
            Ok(None)
        }
    }

    fn scan_next(&self) -> Result<Option<Scanned>> {
        let mut start = self.pos;
        if self.base == 0 && start == 0 && self.token == TokenType::None && self.buf.starts_with(UTF8_BOM) {
            start = UTF8_BOM.len();
        }
        let Some(pos) = self.skip_insignificant(start)? else {
            return Ok(None);
        };

        let Some(frame) = self.stack.last().copied() else {
            if pos >= self.buf.len() {
                if self.token == TokenType::None {
                    return self.incomplete(pos, "a value");
                }
                return Ok(None);
            }
            if self.token != TokenType::None && !self.options.allow_multiple_values {
                return Err(Error::syntax(
                    pos,
                    "unexpected data after the top-level value",
                    "end of input",
                    &describe_byte(Some(self.buf[pos])),
                ));
            }
            return self.scan_value(pos);
        };

        if pos >= self.buf.len() {
            return self.incomplete(pos, &format!("'{}'", frame.closer as char));
        }
        let b = self.buf[pos];

        if self.token.is_start() {
            if b == frame.closer {
                return Ok(Some(Self::end_token(pos, frame)));
            }
            self.reject_foreign_closer(pos, frame)?;
            return if frame.kind == ContainerKind::Object {
                self.scan_property_name(pos)
            } else {
                self.scan_value(pos)
            };
        }

        if self.token == TokenType::PropertyName {
            return self.scan_value(pos);
        }

        if frame.kind == ContainerKind::Map && frame.after_key {
            if b != b'=' {
                return Err(Error::syntax(
                    pos,
                    "map key must be followed by '=>'",
                    "'=>'",
                    &describe_byte(Some(b)),
                ));
            }
            match self.buf.get(pos + 1) {
                None => return self.incomplete(pos, "'=>'"),
                Some(b'>') => {}
                Some(&other) => {
                    return Err(Error::syntax(
                        pos + 1,
                        "map key must be followed by '=>'",
                        "'>'",
                        &describe_byte(Some(other)),
                    ))
                }
            }
            let Some(value_pos) = self.skip_insignificant(pos + 2)? else {
                return Ok(None);
            };
            if value_pos >= self.buf.len() {
                return self.incomplete(value_pos, "a map value");
            }
            return self.scan_value(value_pos);
        }

        if b == frame.closer {
            return Ok(Some(Self::end_token(pos, frame)));
        }
        if b == b',' {
            let Some(next) = self.skip_insignificant(pos + 1)? else {
                return Ok(None);
            };
            if next >= self.buf.len() {
                return self.incomplete(next, "a value after ','");
            }
            if self.buf[next] == frame.closer {
                if self.options.allow_trailing_commas {
                    return Ok(Some(Self::end_token(next, frame)));
                }
                return Err(Error::syntax(
                    pos,
                    "trailing comma is not allowed",
                    "a value",
                    &describe_byte(Some(frame.closer)),
                ));
            }
            self.reject_foreign_closer(next, frame)?;
            return if frame.kind == ContainerKind::Object {
                self.scan_property_name(next)
            } else {
                self.scan_value(next)
            };
        }
        self.reject_foreign_closer(pos, frame)?;
        Err(Error::syntax(
            pos,
            &format!("unexpected character in {}", frame.kind),
            &format!("',' or '{}'", frame.closer as char),
            &describe_byte(Some(b)),
        ))
    }

    fn reject_foreign_closer(&self, pos: usize, frame: Frame) -> Result<()> {
        let b = self.buf[pos];
        if matches!(b, b'}' | b']' | b')') && b != frame.closer {
            return Err(Error::syntax(
                pos,
                &format!("mismatched closing bracket for {}", frame.kind),
                &format!("'{}'", frame.closer as char),
                &describe_byte(Some(b)),
            ));
        }
        Ok(())
    }

    fn end_token(pos: usize, frame: Frame) -> Scanned {
        Scanned {
            token: frame.kind.end_token(),
            token_start: pos,
            value_start: pos,
            value_len: 1,
            escaped: false,
            end: pos + 1,
            action: Action::Pop,
        }
    }

    /// Skips whitespace and, when enabled, comments. `None` means a comment is cut off.
    fn skip_insignificant(&self, mut i: usize) -> Result<Option<usize>> {
        let buf = self.buf;
        loop {
            while i < buf.len() && is_whitespace(buf[i]) {
                i += 1;
            }
            if self.options.comment_handling != CommentHandling::Skip
                || i >= buf.len()
                || buf[i] != b'/'
            {
                return Ok(Some(i));
            }
            match buf.get(i + 1) {
                None if self.is_final_block => return Ok(Some(i)),
                None => return Ok(None),
                Some(b'/') => match memchr(b'\n', &buf[i + 2..]) {
                    Some(nl) => i += 2 + nl + 1,
                    None if self.is_final_block => i = buf.len(),
                    None => return Ok(None),
                },
                Some(b'*') => match memmem::find(&buf[i + 2..], b"*/") {
                    Some(end) => i += 2 + end + 2,
                    None => return self.incomplete(i, "'*/'"),
                },
                Some(_) => return Ok(Some(i)),
            }
        }
    }

    fn scan_property_name(&self, pos: usize) -> Result<Option<Scanned>> {
        if self.buf[pos] != b'"' {
            return Err(Error::syntax(
                pos,
                "property names must be strings",
                "'\"'",
                &describe_byte(Some(self.buf[pos])),
            ));
        }
        let Some((end, escaped)) = self.scan_string(pos)? else {
            return Ok(None);
        };
        let Some(colon) = self.skip_insignificant(end)? else {
            return Ok(None);
        };
        match self.buf.get(colon) {
            None => self.incomplete(colon, "':'"),
            Some(b':') => Ok(Some(Scanned {
                token: TokenType::PropertyName,
                token_start: pos,
                value_start: pos + 1,
                value_len: end - 1 - (pos + 1),
                escaped,
                end: colon + 1,
                action: Action::None,
            })),
            Some(&other) => Err(Error::syntax(
                colon,
                "property name must be followed by ':'",
                "':'",
                &describe_byte(Some(other)),
            )),
        }
    }

    /// Scans a quoted string starting at `start`; returns the offset past the
    /// closing quote and whether the body contains escapes.
    fn scan_string(&self, start: usize) -> Result<Option<(usize, bool)>> {
        let buf = self.buf;
        let mut i = start + 1;
        let mut escaped = false;
        loop {
            let Some(&b) = buf.get(i) else {
                return self.incomplete(start, "closing '\"'");
            };
            match b {
                b'"' => break,
                b'\\' => {
                    escaped = true;
                    i += 2;
                }
                0x00..=0x1F => {
                    return Err(Error::syntax(
                        i,
                        "control characters must be escaped in strings",
                        "an escaped character",
                        &describe_byte(Some(b)),
                    ))
                }
                _ => i += 1,
            }
        }
        let body = &buf[start + 1..i];
        if escaped {
            escape::validate_escapes(body).map_err(|offset| {
                Error::syntax(
                    start + 1 + offset,
                    "invalid escape sequence",
                    "one of \\\" \\\\ \\/ \\b \\f \\n \\r \\t \\uXXXX",
                    &String::from_utf8_lossy(&body[offset..(offset + 2).min(body.len())]),
                )
            })?;
        }
        std::str::from_utf8(body).map_err(|e| {
            Error::syntax(
                start + 1 + e.valid_up_to(),
                "invalid UTF-8 in string",
                "UTF-8 text",
                "invalid byte sequence",
            )
        })?;
        Ok(Some((i + 1, escaped)))
    }

    fn scan_value(&self, pos: usize) -> Result<Option<Scanned>> {
        let buf = self.buf;
        match buf[pos] {
            b'"' => {
                let Some((end, escaped)) = self.scan_string(pos)? else {
                    return Ok(None);
                };
                let mut s = Scanned::scalar(TokenType::String, pos, pos + 1, end - 1, end);
                s.escaped = escaped;
                Ok(Some(s))
            }
            b'{' => match self.classify_brace(pos)? {
                Some(kind) => self.start_container(pos, pos + 1, kind, b'}').map(Some),
                None => Ok(None),
            },
            b'[' => self.start_container(pos, pos + 1, ContainerKind::Array, b']').map(Some),
            b'(' => self.start_container(pos, pos + 1, ContainerKind::Array, b')').map(Some),
            b'S' => match self.match_prefix(pos, SET_PREFIX)? {
                Some(()) => self
                    .start_container(pos, pos + SET_PREFIX.len(), ContainerKind::Set, b'}')
                    .map(Some),
                None => Ok(None),
            },
            b'M' => match self.match_prefix(pos, MAP_PREFIX)? {
                Some(()) => self
                    .start_container(pos, pos + MAP_PREFIX.len(), ContainerKind::Map, b'}')
                    .map(Some),
                None => Ok(None),
            },
            b't' => self.scan_keyword(pos, TRUE, TokenType::True),
            b'f' => self.scan_keyword(pos, FALSE, TokenType::False),
            b'n' => self.scan_keyword(pos, NULL, TokenType::Null),
            b'N' => self.scan_keyword(pos, NAN, TokenType::Number),
            b'I' => self.scan_keyword(pos, INFINITY, TokenType::Number),
            b'-' if buf.get(pos + 1) == Some(&b'I') => {
                self.scan_keyword(pos, NEG_INFINITY, TokenType::Number)
            }
            b'-' | b'0'..=b'9' => self.scan_number(pos),
            TEMPORAL_PREFIX => self.scan_temporal(pos),
            REGEXP_DELIMITER => self.scan_regexp(pos),
            BASE64_PREFIX | HEX_PREFIX => match buf.get(pos + 1) {
                Some(b'"') => self.scan_binary(pos, buf[pos] == HEX_PREFIX),
                None => self.incomplete(pos, "'\"'"),
                Some(&other) => Err(Error::syntax(
                    pos + 1,
                    "binary literal must be quoted",
                    "'\"'",
                    &describe_byte(Some(other)),
                )),
            },
            other => Err(Error::syntax(
                pos,
                "unexpected character",
                "a value",
                &describe_byte(Some(other)),
            )),
        }
    }

    fn start_container(&self, pos: usize, end: usize, kind: ContainerKind, closer: u8) -> Result<Scanned> {
        let max = self.options.max_depth();
        if self.stack.len() >= max {
            return Err(Error::DepthExceeded { offset: pos, max });
        }
        Ok(Scanned {
            token: kind.start_token(),
            token_start: pos,
            value_start: pos,
            value_len: end - pos,
            escaped: false,
            end,
            action: Action::Push(Frame {
                kind,
                closer,
                after_key: false,
            }),
        })
    }

    /// `Some(())` when `literal` is present at `pos`, `None` when the block ends inside it.
    fn match_prefix(&self, pos: usize, literal: &[u8]) -> Result<Option<()>> {
        let available = &self.buf[pos..];
        let n = available.len().min(literal.len());
        if available[..n] != literal[..n] {
            let found_end = (pos + literal.len()).min(self.buf.len());
            return Err(Error::syntax(
                pos,
                "invalid literal",
                &format!("'{}'", String::from_utf8_lossy(literal)),
                &format!("'{}'", String::from_utf8_lossy(&self.buf[pos..found_end])),
            ));
        }
        if n < literal.len() {
            return self.incomplete(pos, &format!("'{}'", String::from_utf8_lossy(literal)));
        }
        Ok(Some(()))
    }

    /// Checks that an unquoted literal ends at `i`.
    fn check_terminator(&self, i: usize) -> Result<Option<()>> {
        match self.buf.get(i) {
            None if self.is_final_block => Ok(Some(())),
            None => Ok(None),
            Some(&b) if is_value_terminator(b) => Ok(Some(())),
            Some(&b) => Err(Error::syntax(
                i,
                "unexpected character after literal",
                "a delimiter",
                &describe_byte(Some(b)),
            )),
        }
    }

    fn scan_keyword(&self, pos: usize, literal: &[u8], token: TokenType) -> Result<Option<Scanned>> {
        if self.match_prefix(pos, literal)?.is_none() {
            return Ok(None);
        }
        let end = pos + literal.len();
        Ok(self
            .check_terminator(end)?
            .map(|()| Scanned::scalar(token, pos, pos, end, end)))
    }

    fn scan_number(&self, pos: usize) -> Result<Option<Scanned>> {
        let buf = self.buf;
        let mut i = pos;
        if buf[i] == b'-' {
            i += 1;
        }
        let digits = |mut i: usize| {
            while i < buf.len() && buf[i].is_ascii_digit() {
                i += 1;
            }
            i
        };
        let expect_digit = |i: usize, what: &str| -> Result<Option<()>> {
            match buf.get(i) {
                None => self.incomplete(i, what),
                Some(b) if b.is_ascii_digit() => Ok(Some(())),
                Some(&b) => Err(Error::syntax(i, "invalid number", what, &describe_byte(Some(b)))),
            }
        };

        if expect_digit(i, "a digit")?.is_none() {
            return Ok(None);
        }
        i = if buf[i] == b'0' { i + 1 } else { digits(i) };
        let mut integral = true;
        if buf.get(i) == Some(&b'.') {
            if expect_digit(i + 1, "a digit after '.'")?.is_none() {
                return Ok(None);
            }
            i = digits(i + 1);
            integral = false;
        }
        if matches!(buf.get(i), Some(b'e' | b'E')) {
            i += 1;
            if matches!(buf.get(i), Some(b'+' | b'-')) {
                i += 1;
            }
            if expect_digit(i, "a digit in the exponent")?.is_none() {
                return Ok(None);
            }
            i = digits(i);
            integral = false;
        }

        if i >= buf.len() && !self.is_final_block {
            return Ok(None);
        }
        if buf.get(i) == Some(&BIG_INTEGER_SUFFIX) {
            if !integral {
                return Err(Error::syntax(
                    i,
                    "big integer literal must be an integer",
                    "digits before 'n'",
                    "a fraction or exponent",
                ));
            }
            let end = i + 1;
            return Ok(self
                .check_terminator(end)?
                .map(|()| Scanned::scalar(TokenType::BigInteger, pos, pos, i, end)));
        }
        Ok(self
            .check_terminator(i)?
            .map(|()| Scanned::scalar(TokenType::Number, pos, pos, i, i)))
    }

    fn scan_temporal(&self, pos: usize) -> Result<Option<Scanned>> {
        let buf = self.buf;
        let mut i = pos + 1;
        while i < buf.len() && is_temporal_byte(buf[i]) {
            i += 1;
        }
        if self.check_terminator(i)?.is_none() {
            return Ok(None);
        }
        let body = &buf[pos + 1..i];
        if body.is_empty() {
            return Err(Error::syntax(
                pos,
                "empty '@' literal",
                "a date, time, duration or timestamp",
                &describe_byte(buf.get(i).copied()),
            ));
        }
        let token = literal::validate_temporal(body).map_err(|e| {
            let msg = match e {
                Error::InvalidValue(msg) => msg,
                other => other.to_string(),
            };
            Error::syntax(pos, &msg, "a valid temporal literal", &String::from_utf8_lossy(body))
        })?;
        Ok(Some(Scanned::scalar(token, pos, pos + 1, i, i)))
    }

    fn scan_regexp(&self, pos: usize) -> Result<Option<Scanned>> {
        let buf = self.buf;
        if matches!(buf.get(pos + 1), Some(b'/' | b'*')) {
            return Err(Error::syntax(
                pos,
                "comments are not allowed",
                "a value",
                "a comment",
            ));
        }
        let Some(close) = self.regexp_close(pos)? else {
            return Ok(None);
        };
        let mut end = close + 1;
        while end < buf.len() && buf[end].is_ascii_alphabetic() {
            end += 1;
        }
        if self.check_terminator(end)?.is_none() {
            return Ok(None);
        }
        let flags = &buf[close + 1..end];
        literal::validate_regexp_flags(flags).map_err(|flag| {
            Error::syntax(
                close + 1,
                "invalid regular expression flag",
                "flags from 'dgimsuvy', each at most once",
                &format!("'{}'", flag as char),
            )
        })?;
        std::str::from_utf8(&buf[pos + 1..close]).map_err(|e| {
            Error::syntax(
                pos + 1 + e.valid_up_to(),
                "invalid UTF-8 in regular expression",
                "UTF-8 text",
                "invalid byte sequence",
            )
        })?;
        Ok(Some(Scanned::scalar(TokenType::RegExp, pos, pos + 1, end, end)))
    }

    /// Offset of the `/` closing the pattern that opens at `pos`.
    fn regexp_close(&self, pos: usize) -> Result<Option<usize>> {
        let buf = self.buf;
        let mut i = pos + 1;
        let mut in_class = false;
        loop {
            let Some(&b) = buf.get(i) else {
                return self.incomplete(pos, "closing '/'");
            };
            match b {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'\n' | b'\r' => {
                    return Err(Error::syntax(
                        i,
                        "line break in regular expression",
                        "closing '/'",
                        &describe_byte(Some(b)),
                    ))
                }
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    if i == pos + 1 {
                        return Err(Error::syntax(pos, "empty regular expression", "a pattern", "'/'"));
                    }
                    return Ok(Some(i));
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn scan_binary(&self, pos: usize, is_hex: bool) -> Result<Option<Scanned>> {
        let buf = self.buf;
        let body_start = pos + 2;
        let Some(len) = memchr(b'"', &buf[body_start..]) else {
            return self.incomplete(pos, "closing '\"'");
        };
        let body_end = body_start + len;
        let body = &buf[body_start..body_end];
        let valid = if is_hex {
            literal::validate_hex(body)
        } else {
            literal::validate_base64(body)
        };
        if !valid {
            return Err(Error::syntax(
                pos,
                "invalid binary literal",
                if is_hex {
                    "an even number of hex digits"
                } else {
                    "padded base64"
                },
                &String::from_utf8_lossy(body),
            ));
        }
        if self.check_terminator(body_end + 1)?.is_none() {
            return Ok(None);
        }
        let mut s = Scanned::scalar(TokenType::Binary, pos, body_start, body_end, body_end + 1);
        s.escaped = is_hex;
        Ok(Some(s))
    }

    /// Decides whether the `{` at `open` starts an object, a set or a map by
    /// looking past its first member without consuming anything.
    fn classify_brace(&self, open: usize) -> Result<Option<ContainerKind>> {
        let buf = self.buf;
        let Some(first) = self.skip_insignificant(open + 1)? else {
            return Ok(None);
        };
        if first >= buf.len() {
            return self.incomplete(first, "'}' or a value");
        }
        if buf[first] == b'}' {
            return Ok(Some(ContainerKind::Object));
        }
        let Some(end) = self.value_extent(first)? else {
            return Ok(None);
        };
        let Some(next) = self.skip_insignificant(end)? else {
            return Ok(None);
        };
        match buf.get(next) {
            None => self.incomplete(next, "',', ':', '=>' or '}'"),
            Some(b':') if buf[first] == b'"' => Ok(Some(ContainerKind::Object)),
            Some(b':') => Err(Error::syntax(
                first,
                "property names must be strings",
                "'\"'",
                &describe_byte(Some(buf[first])),
            )),
            Some(b'=') => match buf.get(next + 1) {
                None => self.incomplete(next, "'=>'"),
                Some(b'>') => Ok(Some(ContainerKind::Map)),
                Some(&other) => Err(Error::syntax(
                    next + 1,
                    "expected '=>'",
                    "'>'",
                    &describe_byte(Some(other)),
                )),
            },
            Some(_) => Ok(Some(ContainerKind::Set)),
        }
    }

    /// End offset of the value starting at `pos`, found with a light scan that
    /// only respects quoting and bracket nesting. Full validation happens when
    /// the value is actually read.
    fn value_extent(&self, pos: usize) -> Result<Option<usize>> {
        let buf = self.buf;
        match buf[pos] {
            b'"' => self.quoted_extent(pos),
            BASE64_PREFIX | HEX_PREFIX if buf.get(pos + 1) == Some(&b'"') => {
                self.quoted_extent(pos + 1)
            }
            REGEXP_DELIMITER => self.regexp_extent(pos),
            b'{' | b'[' | b'(' => self.balanced_extent(pos),
            b'S' if buf[pos..].starts_with(SET_PREFIX) => self.balanced_extent(pos + 3),
            b'M' if buf[pos..].starts_with(MAP_PREFIX) => self.balanced_extent(pos + 3),
            first => {
                let temporal = first == TEMPORAL_PREFIX;
                let mut i = pos;
                while i < buf.len() {
                    let b = buf[i];
                    if is_whitespace(b)
                        || matches!(b, b',' | b'}' | b']' | b')' | b'=' | b'/')
                        || (b == b':' && !temporal)
                    {
                        return Ok(Some(i));
                    }
                    i += 1;
                }
                if self.is_final_block {
                    Ok(Some(i))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn quoted_extent(&self, quote: usize) -> Result<Option<usize>> {
        let buf = self.buf;
        let mut i = quote + 1;
        while let Some(offset) = buf.get(i..).and_then(|rest| memchr2(b'\\', b'"', rest)) {
            i += offset;
            if buf[i] == b'"' {
                return Ok(Some(i + 1));
            }
            i += 2;
        }
        self.incomplete(quote, "closing '\"'")
    }

    fn regexp_extent(&self, pos: usize) -> Result<Option<usize>> {
        if matches!(self.buf.get(pos + 1), Some(b'/' | b'*')) {
            // Not a pattern; let the tokenizer report it.
            return Ok(Some(pos + 1));
        }
        let Some(close) = self.regexp_close(pos)? else {
            return Ok(None);
        };
        let mut end = close + 1;
        while end < self.buf.len() && self.buf[end].is_ascii_alphabetic() {
            end += 1;
        }
        Ok(Some(end))
    }

    fn balanced_extent(&self, open: usize) -> Result<Option<usize>> {
        let buf = self.buf;
        let mut depth = 0usize;
        let mut i = open;
        while i < buf.len() {
            match buf[i] {
                b'{' | b'[' | b'(' => depth += 1,
                b'}' | b']' | b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Some(i + 1));
                    }
                }
                b'"' => {
                    let Some(end) = self.quoted_extent(i)? else {
                        return Ok(None);
                    };
                    i = end;
                    continue;
                }
                b'/' => {
                    let Some(after) = self.skip_insignificant(i)? else {
                        return Ok(None);
                    };
                    if after != i {
                        i = after;
                        continue;
                    }
                    let Some(end) = self.regexp_extent(i)? else {
                        return Ok(None);
                    };
                    i = end;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }
        self.incomplete(open, "a closing bracket")
    }

    fn expect_token(&self, expected: &str, accept: &[TokenType]) -> Result<()> {
        if accept.contains(&self.token) {
            Ok(())
        } else {
            Err(Error::type_mismatch(expected, self.token))
        }
    }

    /// The current string or property name, unescaped.
    pub fn get_string(&self) -> Result<Cow<'a, str>> {
        self.expect_token("String", &[TokenType::String, TokenType::PropertyName])?;
        escape::unescape(self.value_span())
    }

    pub fn get_bool(&self) -> Result<bool> {
        self.expect_token("Boolean", &[TokenType::True, TokenType::False])?;
        Ok(self.token == TokenType::True)
    }

    pub fn get_i64(&self) -> Result<i64> {
        self.expect_token("Number", &[TokenType::Number])?;
        literal::parse_i64(self.value_span())
    }

    pub fn get_i32(&self) -> Result<i32> {
        let value = self.get_i64()?;
        i32::try_from(value).map_err(|_| Error::invalid_value(format!("{value} does not fit in i32")))
    }

    pub fn get_u64(&self) -> Result<u64> {
        self.expect_token("Number", &[TokenType::Number])?;
        literal::parse_u64(self.value_span())
    }

    pub fn get_f64(&self) -> Result<f64> {
        self.expect_token("Number", &[TokenType::Number])?;
        literal::parse_f64(self.value_span())
    }

    /// Big integer literals, or integral plain numbers.
    pub fn get_big_integer(&self) -> Result<BigInt> {
        self.expect_token("BigInteger", &[TokenType::BigInteger, TokenType::Number])?;
        literal::parse_big_integer(self.value_span())
    }

    pub fn get_date_time(&self) -> Result<DateTime<Utc>> {
        self.expect_token("DateTime", &[TokenType::DateTime])?;
        literal::parse_date_time(self.value_span())
    }

    pub fn get_time_only(&self) -> Result<NaiveTime> {
        self.expect_token("TimeOnly", &[TokenType::TimeOnly])?;
        literal::parse_time_only(self.value_span())
    }

    pub fn get_duration(&self) -> Result<RdnDuration> {
        self.expect_token("Duration", &[TokenType::Duration])?;
        literal::parse_duration(self.value_span())
    }

    pub fn get_regexp(&self) -> Result<RdnRegExp> {
        self.expect_token("RegExp", &[TokenType::RegExp])?;
        literal::parse_regexp(self.value_span())
    }

    pub fn get_binary(&self) -> Result<Vec<u8>> {
        self.expect_token("Binary", &[TokenType::Binary])?;
        literal::decode_binary(self.value_span(), self.value_is_escaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(input: &str) -> Result<Option<ContainerKind>> {
        let reader = Reader::new(input.as_bytes(), ReaderOptions::default());
        reader.classify_brace(0)
    }

    #[test]
    fn test_brace_disambiguation() {
        let cases = [
            ("{}", ContainerKind::Object),
            ("{ }", ContainerKind::Object),
            (r#"{"k": 1}"#, ContainerKind::Object),
            ("{1}", ContainerKind::Set),
            ("{1, 2}", ContainerKind::Set),
            (r#"{"a", "b"}"#, ContainerKind::Set),
            ("{1 => 2}", ContainerKind::Map),
            (r#"{"k" => 1}"#, ContainerKind::Map),
            ("{[1, {2: 3}], [4]}", ContainerKind::Set),
            ("{[1] => 2}", ContainerKind::Map),
            ("{{} => 1}", ContainerKind::Map),
            ("{{1, 2}}", ContainerKind::Set),
            ("{Set{} => Map{}}", ContainerKind::Map),
            ("{@2024-01-15T10:30:00Z => 1}", ContainerKind::Map),
            ("{@10:30:00, @11:00:00}", ContainerKind::Set),
            ("{/a}b/g, /c/}", ContainerKind::Set),
            (r#"{"}" => "{"}"#, ContainerKind::Map),
            ("{b\"AA==\", x\"ff\"}", ContainerKind::Set),
        ];
        for (input, expected) in cases {
            assert_eq!(kind_of(input).unwrap(), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_brace_non_string_key_with_colon() {
        let err = kind_of("{1: 2}").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.offset(), Some(1));
    }

    #[test]
    fn test_brace_needs_more_input() {
        let reader = Reader::partial(b"{[1, 2", false, ReaderOptions::default());
        assert_eq!(reader.classify_brace(0).unwrap(), None);
        let reader = Reader::partial(b"{\"k\"", false, ReaderOptions::default());
        assert_eq!(reader.classify_brace(0).unwrap(), None);
    }

    #[test]
    fn test_brace_lookahead_skips_escaped_quotes() {
        assert_eq!(
            kind_of(r#"{"a\"}", "b\\"}"#).unwrap(),
            Some(ContainerKind::Set)
        );
        assert_eq!(
            kind_of(r#"{"k\" => \"" => 1}"#).unwrap(),
            Some(ContainerKind::Map)
        );
        let reader = Reader::partial(br#"{"a\"#, false, ReaderOptions::default());
        assert_eq!(reader.classify_brace(0).unwrap(), None);
        let reader = Reader::partial(br#"{"a\""#, false, ReaderOptions::default());
        assert_eq!(reader.classify_brace(0).unwrap(), None);
    }

    #[test]
    fn test_comment_spans() {
        let options = ReaderOptions::new().with_comment_handling(CommentHandling::Skip);
        let mut reader = Reader::new(b"/* a * / b */ // c\n 7 // tail", options.clone());
        assert!(reader.read().unwrap());
        assert_eq!(reader.get_i64().unwrap(), 7);
        assert!(!reader.read().unwrap());

        let mut reader = Reader::partial(b"[1, /* open", false, options);
        assert!(reader.read().unwrap());
        assert!(reader.read().unwrap());
        let consumed = reader.bytes_consumed();
        assert!(!reader.read().unwrap());
        assert_eq!(reader.bytes_consumed(), consumed);
    }

    #[test]
    fn test_error_leaves_position() {
        let mut reader = Reader::new(b"[1, @2024-99-01]", ReaderOptions::default());
        assert!(reader.read().unwrap());
        assert!(reader.read().unwrap());
        let consumed = reader.bytes_consumed();
        assert!(reader.read().is_err());
        assert_eq!(reader.bytes_consumed(), consumed);
        assert_eq!(reader.token_type(), TokenType::Number);
    }

    #[test]
    fn test_bom_is_skipped() {
        let mut reader = Reader::new(b"\xEF\xBB\xBFtrue", ReaderOptions::default());
        assert!(reader.read().unwrap());
        assert_eq!(reader.token_type(), TokenType::True);
    }
}
