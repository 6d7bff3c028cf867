//! Literal sub-grammars shared by the reader (validation) and the document
//! and reader getters (materialization).

use crate::tables::{is_base64_byte, is_hex_digit, HEX_VALUE, REGEXP_DELIMITER, REGEXP_FLAGS};
use crate::token::TokenType;
use crate::types::RdnDuration;
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use num_bigint::BigInt;

/// Longest all-digit body read as Unix epoch seconds; longer bodies are milliseconds.
const EPOCH_SECONDS_MAX_DIGITS: usize = 10;
const EPOCH_MILLIS_MAX_DIGITS: usize = 13;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Exactly `n` digits.
    fn fixed(&mut self, n: usize) -> Option<u32> {
        let digits = self.bytes.get(self.pos..self.pos + n)?;
        let mut value = 0u32;
        for &d in digits {
            if !d.is_ascii_digit() {
                return None;
            }
            value = value * 10 + u32::from(d - b'0');
        }
        self.pos += n;
        Some(value)
    }

    /// One or more digits.
    fn run(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.bytes[start..self.pos])
    }

    /// Fractional seconds after a `.`, as nanoseconds (digits past the ninth are dropped).
    fn fraction(&mut self) -> Option<u32> {
        let digits = self.run()?;
        let mut nanos = 0u32;
        for i in 0..9 {
            nanos = nanos * 10 + digits.get(i).map_or(0, |d| u32::from(d - b'0'));
        }
        Some(nanos)
    }
}

fn as_str(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|e| Error::invalid_value(e))
}

fn run_to_u64(digits: &[u8]) -> Option<u64> {
    digits.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(10)?.checked_add(u64::from(d - b'0'))
    })
}

/// Decides which temporal token an `@` body produces.
pub(crate) fn classify_temporal(body: &[u8]) -> TokenType {
    if body.first() == Some(&b'P') {
        TokenType::Duration
    } else if body.len() >= 3 && body[2] == b':' {
        TokenType::TimeOnly
    } else {
        TokenType::DateTime
    }
}

/// Validates an `@` body, returning its token type.
pub(crate) fn validate_temporal(body: &[u8]) -> Result<TokenType> {
    let token = classify_temporal(body);
    match token {
        TokenType::Duration => parse_duration(body).map(|_| token),
        TokenType::TimeOnly => parse_time_only(body).map(|_| token),
        _ => parse_date_time(body).map(|_| token),
    }
}

/// Parses a date-time body: ISO 8601 date or date-time, or Unix epoch
/// seconds (up to 10 digits) or milliseconds (11 to 13 digits).
pub(crate) fn parse_date_time(body: &[u8]) -> Result<DateTime<Utc>> {
    if !body.is_empty() && body.iter().all(u8::is_ascii_digit) {
        return parse_epoch(body);
    }
    let invalid = || Error::invalid_value(format!("invalid date-time '@{}'", String::from_utf8_lossy(body)));

    let mut c = Cursor::new(body);
    let year = c.fixed(4).ok_or_else(invalid)?;
    if !c.eat(b'-') {
        return Err(invalid());
    }
    let month = c.fixed(2).ok_or_else(invalid)?;
    if !c.eat(b'-') {
        return Err(invalid());
    }
    let day = c.fixed(2).ok_or_else(invalid)?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)?;
    if c.at_end() {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or_else(invalid);
    }
    if !c.eat(b'T') {
        return Err(invalid());
    }
    let time = time_of_day(&mut c).ok_or_else(invalid)?;
    let naive = date.and_time(time);

    let offset_seconds = if c.eat(b'Z') {
        0
    } else if let Some(sign) = c.peek().filter(|b| matches!(*b, b'+' | b'-')) {
        c.pos += 1;
        let hours = c.fixed(2).ok_or_else(invalid)?;
        if !c.eat(b':') {
            return Err(invalid());
        }
        let minutes = c.fixed(2).ok_or_else(invalid)?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        let seconds = (hours * 3_600 + minutes * 60) as i32;
        if sign == b'-' {
            -seconds
        } else {
            seconds
        }
    } else {
        0
    };
    if !c.at_end() {
        return Err(invalid());
    }
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(invalid)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}

fn parse_epoch(digits: &[u8]) -> Result<DateTime<Utc>> {
    let invalid = || Error::invalid_value(format!("invalid Unix timestamp '@{}'", String::from_utf8_lossy(digits)));
    let value = run_to_u64(digits).ok_or_else(invalid)?;
    let value = i64::try_from(value).map_err(|_| invalid())?;
    match digits.len() {
        n if n <= EPOCH_SECONDS_MAX_DIGITS => Utc.timestamp_opt(value, 0).single(),
        n if n <= EPOCH_MILLIS_MAX_DIGITS => Utc.timestamp_millis_opt(value).single(),
        _ => None,
    }
    .ok_or_else(invalid)
}

fn time_of_day(c: &mut Cursor<'_>) -> Option<NaiveTime> {
    let hour = c.fixed(2)?;
    if !c.eat(b':') {
        return None;
    }
    let minute = c.fixed(2)?;
    let mut second = 0;
    let mut nanos = 0;
    if c.eat(b':') {
        second = c.fixed(2)?;
        if c.eat(b'.') {
            nanos = c.fraction()?;
        }
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .filter(|_| second < 60)
}

/// Parses a time-of-day body: `HH:MM[:SS[.fff]]`.
pub(crate) fn parse_time_only(body: &[u8]) -> Result<NaiveTime> {
    let mut c = Cursor::new(body);
    time_of_day(&mut c)
        .filter(|_| c.at_end())
        .ok_or_else(|| Error::invalid_value(format!("invalid time '@{}'", String::from_utf8_lossy(body))))
}

/// Parses an ISO 8601 duration: `P[nY][nM][nW][nD][T[nH][nM][n[.f]S]]`.
pub(crate) fn parse_duration(body: &[u8]) -> Result<RdnDuration> {
    let invalid = || Error::invalid_value(format!("invalid duration '@{}'", String::from_utf8_lossy(body)));
    let mut c = Cursor::new(body);
    if !c.eat(b'P') {
        return Err(invalid());
    }
    let mut duration = RdnDuration::default();
    let mut any = false;

    // Date part: units must appear in order.
    let date_units = [b'Y', b'M', b'W', b'D'];
    let mut next_unit = 0;
    while c.peek().is_some_and(|b| b.is_ascii_digit()) {
        let value = c.run().and_then(run_to_u64).ok_or_else(invalid)?;
        let unit = c.peek().ok_or_else(invalid)?;
        let slot = date_units[next_unit..]
            .iter()
            .position(|&u| u == unit)
            .ok_or_else(invalid)?
            + next_unit;
        c.pos += 1;
        match unit {
            b'Y' => duration.years = value,
            b'M' => duration.months = value,
            b'W' => duration.weeks = value,
            _ => duration.days = value,
        }
        next_unit = slot + 1;
        any = true;
    }

    if c.eat(b'T') {
        let time_units = [b'H', b'M', b'S'];
        let mut next_unit = 0;
        let mut any_time = false;
        while c.peek().is_some_and(|b| b.is_ascii_digit()) {
            let value = c.run().and_then(run_to_u64).ok_or_else(invalid)?;
            let nanos = if c.eat(b'.') {
                Some(c.fraction().ok_or_else(invalid)?)
            } else {
                None
            };
            let unit = c.peek().ok_or_else(invalid)?;
            let slot = time_units[next_unit..]
                .iter()
                .position(|&u| u == unit)
                .ok_or_else(invalid)?
                + next_unit;
            if nanos.is_some() && unit != b'S' {
                return Err(invalid());
            }
            c.pos += 1;
            match unit {
                b'H' => duration.hours = value,
                b'M' => duration.minutes = value,
                _ => {
                    duration.seconds = value;
                    duration.nanos = nanos.unwrap_or(0);
                }
            }
            next_unit = slot + 1;
            any_time = true;
        }
        if !any_time {
            return Err(invalid());
        }
        any = true;
    }

    if !any || !c.at_end() {
        return Err(invalid());
    }
    Ok(duration)
}

/// Returns the first invalid or repeated flag.
pub(crate) fn validate_regexp_flags(flags: &[u8]) -> std::result::Result<(), u8> {
    let mut seen = [false; 8];
    for &flag in flags {
        let idx = REGEXP_FLAGS.iter().position(|&f| f == flag).ok_or(flag)?;
        if seen[idx] {
            return Err(flag);
        }
        seen[idx] = true;
    }
    Ok(())
}

/// Splits a stored `pattern/flags` body at its last `/`.
pub(crate) fn split_regexp(body: &[u8]) -> Result<(&[u8], &[u8])> {
    let split = body
        .iter()
        .rposition(|&b| b == REGEXP_DELIMITER)
        .ok_or_else(|| Error::invalid_value("regular expression without closing '/'"))?;
    Ok((&body[..split], &body[split + 1..]))
}

pub(crate) fn parse_regexp(body: &[u8]) -> Result<crate::RdnRegExp> {
    let (pattern, flags) = split_regexp(body)?;
    crate::RdnRegExp::new(as_str(pattern)?, as_str(flags)?)
}

/// Checks a base64 body: alphabet, length multiple of four, padding only at the end.
pub(crate) fn validate_base64(body: &[u8]) -> bool {
    if body.len() % 4 != 0 || !body.iter().copied().all(is_base64_byte) {
        return false;
    }
    let data_len = body.iter().rposition(|&b| b != b'=').map_or(0, |p| p + 1);
    body.len() - data_len <= 2 && !body[..data_len].contains(&b'=')
}

pub(crate) fn validate_hex(body: &[u8]) -> bool {
    body.len() % 2 == 0 && body.iter().copied().all(is_hex_digit)
}

pub(crate) fn decode_binary(body: &[u8], is_hex: bool) -> Result<Vec<u8>> {
    if is_hex {
        if !validate_hex(body) {
            return Err(Error::invalid_value("invalid hex binary literal"));
        }
        Ok(body
            .chunks_exact(2)
            .map(|pair| (HEX_VALUE[pair[0] as usize] << 4) | HEX_VALUE[pair[1] as usize])
            .collect())
    } else {
        STANDARD
            .decode(body)
            .map_err(|e| Error::invalid_value(format!("invalid base64 binary literal: {e}")))
    }
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// `NaN`, `Infinity` and `-Infinity` are numbers, but never integers.
fn reject_special(raw: &[u8]) -> Result<()> {
    if matches!(raw, b"NaN" | b"Infinity" | b"-Infinity") {
        return Err(Error::type_mismatch("Integer", String::from_utf8_lossy(raw)));
    }
    Ok(())
}

pub(crate) fn parse_i64(raw: &[u8]) -> Result<i64> {
    reject_special(raw)?;
    as_str(raw)?
        .parse::<i64>()
        .map_err(|_| Error::invalid_value(format!("'{}' is not a 64-bit integer", String::from_utf8_lossy(raw))))
}

pub(crate) fn parse_u64(raw: &[u8]) -> Result<u64> {
    reject_special(raw)?;
    as_str(raw)?
        .parse::<u64>()
        .map_err(|_| Error::invalid_value(format!("'{}' is not an unsigned 64-bit integer", String::from_utf8_lossy(raw))))
}

/// Parses a number token, including `NaN`, `Infinity` and `-Infinity`.
pub(crate) fn parse_f64(raw: &[u8]) -> Result<f64> {
    match raw {
        b"NaN" => Ok(f64::NAN),
        b"Infinity" => Ok(f64::INFINITY),
        b"-Infinity" => Ok(f64::NEG_INFINITY),
        _ => as_str(raw)?
            .parse::<f64>()
            .map_err(|_| Error::invalid_value(format!("'{}' is not a number", String::from_utf8_lossy(raw)))),
    }
}

pub(crate) fn parse_big_integer(digits: &[u8]) -> Result<BigInt> {
    reject_special(digits)?;
    BigInt::parse_bytes(digits, 10)
        .ok_or_else(|| Error::invalid_value(format!("'{}' is not a big integer", String::from_utf8_lossy(digits))))
}

fn put_digits(buf: &mut [u8], mut value: u32) {
    for slot in buf.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

/// Formats `@YYYY-MM-DDTHH:MM:SS.mmmZ` into a fixed buffer.
pub(crate) fn format_date_time(
    dt: &DateTime<Utc>,
    buf: &mut [u8; crate::tables::MAX_DATE_TIME_LENGTH],
) -> Result<()> {
    use chrono::Datelike;
    let year = dt.year();
    if !(0..=9999).contains(&year) {
        return Err(Error::invalid_value(format!(
            "year {year} cannot be written as an RDN date-time"
        )));
    }
    buf.copy_from_slice(b"@0000-00-00T00:00:00.000Z");
    put_digits(&mut buf[1..5], year as u32);
    put_digits(&mut buf[6..8], dt.month());
    put_digits(&mut buf[9..11], dt.day());
    put_digits(&mut buf[12..14], dt.hour());
    put_digits(&mut buf[15..17], dt.minute());
    put_digits(&mut buf[18..20], dt.second());
    put_digits(&mut buf[21..24], dt.timestamp_subsec_millis().min(999));
    Ok(())
}

/// Formats `@HH:MM:SS` (plus `.mmm` when non-zero), returning the used length.
pub(crate) fn format_time_only(
    time: &NaiveTime,
    buf: &mut [u8; crate::tables::MAX_TIME_ONLY_LENGTH],
) -> usize {
    buf.copy_from_slice(b"@00:00:00.000");
    put_digits(&mut buf[1..3], time.hour());
    put_digits(&mut buf[4..6], time.minute());
    put_digits(&mut buf[7..9], time.second());
    let millis = (time.nanosecond() / 1_000_000).min(999);
    if millis == 0 {
        9
    } else {
        put_digits(&mut buf[10..13], millis);
        13
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date_time() {
        let dt = parse_date_time(b"2024-01-15T10:30:00.123Z").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_705_314_600_123);
        let shifted = parse_date_time(b"2024-01-15T12:30:00+02:00").unwrap();
        assert_eq!(shifted.timestamp(), 1_705_314_600);
        let date_only = parse_date_time(b"2024-01-15").unwrap();
        assert_eq!(date_only.timestamp(), 1_705_276_800);
    }

    #[test]
    fn test_epoch_date_time() {
        assert_eq!(parse_date_time(b"1705312200").unwrap().timestamp(), 1_705_312_200);
        assert_eq!(
            parse_date_time(b"1705312200123").unwrap().timestamp_millis(),
            1_705_312_200_123
        );
        assert!(parse_date_time(b"17053122001234").is_err());
    }

    #[test]
    fn test_invalid_date_time() {
        assert!(parse_date_time(b"2024-13-01").is_err());
        assert!(parse_date_time(b"2024-02-30").is_err());
        assert!(parse_date_time(b"2024-01-15T25:00").is_err());
        assert!(parse_date_time(b"2024-01-15X").is_err());
        assert!(parse_date_time(b"").is_err());
    }

    #[test]
    fn test_time_only() {
        let t = parse_time_only(b"23:59:59.999").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (23, 59, 59));
        assert_eq!(t.nanosecond(), 999_000_000);
        assert!(parse_time_only(b"14:30").is_ok());
        assert!(parse_time_only(b"24:00:00").is_err());
        assert!(parse_time_only(b"12:60:00").is_err());
    }

    #[test]
    fn test_durations() {
        let d = parse_duration(b"P1Y2M3DT4H5M6.25S").unwrap();
        assert_eq!((d.years, d.months, d.days), (1, 2, 3));
        assert_eq!((d.hours, d.minutes, d.seconds, d.nanos), (4, 5, 6, 250_000_000));
        assert_eq!(parse_duration(b"P2W").unwrap().weeks, 2);
        assert_eq!(parse_duration(b"PT36H").unwrap().hours, 36);
        for bad in [&b"P"[..], b"PT", b"P1H", b"P1D2Y", b"PT1.5M", b"P1DT", b"P1Dx"] {
            assert!(parse_duration(bad).is_err(), "{}", String::from_utf8_lossy(bad));
        }
    }

    #[test]
    fn test_classify_temporal() {
        assert_eq!(classify_temporal(b"P1D"), TokenType::Duration);
        assert_eq!(classify_temporal(b"14:30:00"), TokenType::TimeOnly);
        assert_eq!(classify_temporal(b"2024-01-15"), TokenType::DateTime);
        assert_eq!(classify_temporal(b"1705312200"), TokenType::DateTime);
    }

    #[test]
    fn test_binary() {
        assert!(validate_base64(b"SGVsbG8="));
        assert!(validate_base64(b""));
        assert!(!validate_base64(b"SGVsbG8"));
        assert!(!validate_base64(b"SG=sbG8="));
        assert!(!validate_base64(b"S==="));
        assert_eq!(decode_binary(b"SGVsbG8=", false).unwrap(), b"Hello");
        assert_eq!(decode_binary(b"48656c6C6f", true).unwrap(), b"Hello");
        assert!(decode_binary(b"486", true).is_err());
        assert_eq!(encode_base64(b"Hello"), "SGVsbG8=");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_i64(b"-42").unwrap(), -42);
        assert!(parse_i64(b"4.2").is_err());
        assert!(parse_f64(b"NaN").unwrap().is_nan());
        assert_eq!(parse_f64(b"-Infinity").unwrap(), f64::NEG_INFINITY);
        assert_eq!(parse_f64(b"1e3").unwrap(), 1000.0);
        assert_eq!(
            parse_big_integer(b"123456789012345678901234567890").unwrap().to_string(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn test_regexp_split() {
        let (pattern, flags) = split_regexp(b"a\\/b/gi").unwrap();
        assert_eq!(pattern, b"a\\/b");
        assert_eq!(flags, b"gi");
        assert_eq!(validate_regexp_flags(b"gg"), Err(b'g'));
        assert_eq!(validate_regexp_flags(b"gz"), Err(b'z'));
    }

    #[test]
    fn test_format_date_time() {
        let dt = parse_date_time(b"2024-01-15T10:30:00.123Z").unwrap();
        let mut buf = [0u8; crate::tables::MAX_DATE_TIME_LENGTH];
        format_date_time(&dt, &mut buf).unwrap();
        assert_eq!(&buf, b"@2024-01-15T10:30:00.123Z");
    }

    #[test]
    fn test_format_time_only() {
        let mut buf = [0u8; crate::tables::MAX_TIME_ONLY_LENGTH];
        let t = NaiveTime::from_hms_opt(14, 30, 5).unwrap();
        let len = format_time_only(&t, &mut buf);
        assert_eq!(&buf[..len], b"@14:30:05");
        let t = NaiveTime::from_hms_milli_opt(1, 2, 3, 45).unwrap();
        let len = format_time_only(&t, &mut buf);
        assert_eq!(&buf[..len], b"@01:02:03.045");
    }
}
