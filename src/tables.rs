//! Character-class and grammar tables shared by the reader and the writer.

pub(crate) const TRUE: &[u8] = b"true";
pub(crate) const FALSE: &[u8] = b"false";
pub(crate) const NULL: &[u8] = b"null";
pub(crate) const NAN: &[u8] = b"NaN";
pub(crate) const INFINITY: &[u8] = b"Infinity";
pub(crate) const NEG_INFINITY: &[u8] = b"-Infinity";

pub(crate) const SET_PREFIX: &[u8] = b"Set{";
pub(crate) const MAP_PREFIX: &[u8] = b"Map{";
pub(crate) const MAP_ARROW: &[u8] = b"=>";

pub(crate) const TEMPORAL_PREFIX: u8 = b'@';
pub(crate) const REGEXP_DELIMITER: u8 = b'/';
pub(crate) const BASE64_PREFIX: u8 = b'b';
pub(crate) const HEX_PREFIX: u8 = b'x';
pub(crate) const BIG_INTEGER_SUFFIX: u8 = b'n';

/// Flags accepted after a regular expression body.
pub(crate) const REGEXP_FLAGS: &[u8] = b"dgimsuvy";

/// `@YYYY-MM-DDTHH:MM:SS.mmmZ`
pub(crate) const MAX_DATE_TIME_LENGTH: usize = 25;
/// `@HH:MM:SS.mmm`
pub(crate) const MAX_TIME_ONLY_LENGTH: usize = 13;

/// Escape action per byte: `0` copies the byte, `b'u'` emits `\u00XX`,
/// anything else emits a backslash followed by that byte.
pub(crate) static ESCAPE: [u8; 256] = build_escape_table();

/// Value of an ASCII hex digit, `0xFF` otherwise.
pub(crate) static HEX_VALUE: [u8; 256] = build_hex_table();

const fn build_escape_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 0x20 {
        table[i] = b'u';
        i += 1;
    }
    table[0x08] = b'b';
    table[0x09] = b't';
    table[0x0A] = b'n';
    table[0x0C] = b'f';
    table[0x0D] = b'r';
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table
}

const fn build_hex_table() -> [u8; 256] {
    let mut table = [0xFFu8; 256];
    let mut i = 0u8;
    while i < 10 {
        table[(b'0' + i) as usize] = i;
        i += 1;
    }
    let mut i = 0u8;
    while i < 6 {
        table[(b'a' + i) as usize] = 10 + i;
        table[(b'A' + i) as usize] = 10 + i;
        i += 1;
    }
    table
}

#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Bytes that may legally follow an unquoted literal.
#[inline]
pub(crate) fn is_value_terminator(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b',' | b']' | b'}' | b')' | b'=' | b':' | b'/')
}

/// Bytes that make up the body of an `@` literal.
#[inline]
pub(crate) fn is_temporal_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b':' | b'.' | b'+')
}

#[inline]
pub(crate) fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')
}

#[inline]
pub(crate) fn is_hex_digit(b: u8) -> bool {
    HEX_VALUE[b as usize] != 0xFF
}

#[inline]
pub(crate) fn needs_escape(b: u8) -> bool {
    ESCAPE[b as usize] != 0
}

/// Printable form of a byte for error messages.
pub(crate) fn describe_byte(b: Option<u8>) -> String {
    match b {
        None => "end of input".to_string(),
        Some(b) if b.is_ascii_graphic() => format!("'{}'", b as char),
        Some(b) => format!("byte 0x{b:02X}"),
    }
}
