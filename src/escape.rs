//! String escaping and unescaping.
//!
//! The writer escapes with the same [`ESCAPE`] table the reader's validation
//! accepts, so `unescape(escape(s)) == s` for every string.

use crate::tables::{needs_escape, ESCAPE, HEX_VALUE};
use crate::{Error, Result};
use memchr::memchr;
use std::borrow::Cow;
use std::io;

/// Decodes the escape sequence starting at `raw[i] == b'\\'`.
///
/// Returns the decoded character and the number of bytes consumed, or `None`
/// if the sequence is malformed (unknown escape, bad hex, unpaired surrogate).
pub(crate) fn decode_escape(raw: &[u8], i: usize) -> Option<(char, usize)> {
    let ch = match *raw.get(i + 1)? {
        b'"' => '"',
        b'\\' => '\\',
        b'/' => '/',
        b'b' => '\u{0008}',
        b'f' => '\u{000C}',
        b'n' => '\n',
        b'r' => '\r',
        b't' => '\t',
        b'u' => {
            let high = read_hex4(raw, i + 2)?;
            return match high {
                0xD800..=0xDBFF => {
                    if raw.get(i + 6) != Some(&b'\\') || raw.get(i + 7) != Some(&b'u') {
                        return None;
                    }
                    let low = read_hex4(raw, i + 8)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return None;
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(code).map(|c| (c, 12))
                }
                0xDC00..=0xDFFF => None,
                _ => char::from_u32(high).map(|c| (c, 6)),
            };
        }
        _ => return None,
    };
    Some((ch, 2))
}

fn read_hex4(raw: &[u8], at: usize) -> Option<u32> {
    let digits = raw.get(at..at + 4)?;
    digits.iter().try_fold(0u32, |acc, &b| {
        let v = HEX_VALUE[b as usize];
        (v != 0xFF).then(|| (acc << 4) | u32::from(v))
    })
}

/// Checks every escape in `raw`; on failure returns the offset of the bad backslash.
pub(crate) fn validate_escapes(raw: &[u8]) -> std::result::Result<(), usize> {
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' {
            let (_, len) = decode_escape(raw, i).ok_or(i)?;
            i += len;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Returns the logical text of a string token.
///
/// Text without backslashes is borrowed unchanged.
pub fn unescape(raw: &[u8]) -> Result<Cow<'_, str>> {
    let Some(first) = memchr(b'\\', raw) else {
        return std::str::from_utf8(raw)
            .map(Cow::Borrowed)
            .map_err(|e| Error::invalid_value(format!("invalid UTF-8 in string: {e}")));
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(
        std::str::from_utf8(&raw[..first])
            .map_err(|e| Error::invalid_value(format!("invalid UTF-8 in string: {e}")))?,
    );
    let mut i = first;
    while i < raw.len() {
        if raw[i] == b'\\' {
            let (ch, len) = decode_escape(raw, i)
                .ok_or_else(|| Error::invalid_value(format!("invalid escape at byte {i}")))?;
            out.push(ch);
            i += len;
        } else {
            let run_end = memchr(b'\\', &raw[i..]).map_or(raw.len(), |p| i + p);
            out.push_str(
                std::str::from_utf8(&raw[i..run_end])
                    .map_err(|e| Error::invalid_value(format!("invalid UTF-8 in string: {e}")))?,
            );
            i = run_end;
        }
    }
    Ok(Cow::Owned(out))
}

/// Compares escaped bytes against `candidate` without allocating.
pub(crate) fn unescaped_eq(raw: &[u8], candidate: &[u8]) -> bool {
    let mut i = 0;
    let mut j = 0;
    let mut utf8 = [0u8; 4];
    while i < raw.len() {
        if raw[i] == b'\\' {
            let Some((ch, len)) = decode_escape(raw, i) else {
                return false;
            };
            let encoded = ch.encode_utf8(&mut utf8).as_bytes();
            if candidate.get(j..j + encoded.len()) != Some(encoded) {
                return false;
            }
            i += len;
            j += encoded.len();
        } else {
            if candidate.get(j) != Some(&raw[i]) {
                return false;
            }
            i += 1;
            j += 1;
        }
    }
    j == candidate.len()
}

/// Writes `text` with every byte flagged in [`ESCAPE`] replaced by its escape.
pub(crate) fn write_escaped<W: io::Write>(out: &mut W, text: &[u8]) -> io::Result<()> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut run_start = 0;
    for (i, &b) in text.iter().enumerate() {
        if !needs_escape(b) {
            continue;
        }
        let action = ESCAPE[b as usize];
        out.write_all(&text[run_start..i])?;
        if action == b'u' {
            out.write_all(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[(b >> 4) as usize],
                HEX[(b & 0xF) as usize],
            ])?;
        } else {
            out.write_all(&[b'\\', action])?;
        }
        run_start = i + 1;
    }
    out.write_all(&text[run_start..])
}
