//! RDN-specific scalar types.
//!
//! Date-times and times of day use [`chrono`] directly (`DateTime<Utc>` and
//! `NaiveTime`). Durations keep their calendar components because ISO 8601
//! years and months have no fixed length, and regular expressions are kept as
//! validated source text.

use crate::{Error, Result};
use std::fmt;

/// An ISO 8601 duration such as `P1Y2M3DT4H5M6.5S`.
///
/// # Examples
///
/// ```rust
/// use rdn::RdnDuration;
///
/// let d: RdnDuration = "P1Y2M3DT4H5M6S".parse().unwrap();
/// assert_eq!(d.years, 1);
/// assert_eq!(d.seconds, 6);
/// assert_eq!(d.to_string(), "P1Y2M3DT4H5M6S");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RdnDuration {
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    /// Fractional part of `seconds`.
    pub nanos: u32,
}

impl RdnDuration {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == RdnDuration::default()
    }

    /// Converts to a fixed-length duration, if no calendar components are set.
    #[must_use]
    pub fn to_std(&self) -> Option<std::time::Duration> {
        if self.years != 0 || self.months != 0 {
            return None;
        }
        let secs = self
            .weeks
            .checked_mul(7 * 86_400)?
            .checked_add(self.days.checked_mul(86_400)?)?
            .checked_add(self.hours.checked_mul(3_600)?)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;
        Some(std::time::Duration::new(secs, self.nanos))
    }
}

impl From<std::time::Duration> for RdnDuration {
    fn from(d: std::time::Duration) -> Self {
        let total = d.as_secs();
        RdnDuration {
            hours: total / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
            nanos: d.subsec_nanos(),
            ..Default::default()
        }
    }
}

impl fmt::Display for RdnDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value != 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        if self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.nanos != 0 {
            f.write_str("T")?;
            if self.hours != 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes != 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds != 0 || self.nanos != 0 {
                write!(f, "{}", self.seconds)?;
                if self.nanos != 0 {
                    let frac = format!("{:09}", self.nanos);
                    write!(f, ".{}", frac.trim_end_matches('0'))?;
                }
                f.write_str("S")?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for RdnDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::literal::parse_duration(s.as_bytes())
    }
}

/// A regular expression literal: `/source/flags`.
///
/// # Examples
///
/// ```rust
/// use rdn::RdnRegExp;
///
/// let re = RdnRegExp::new("\\d+", "gi").unwrap();
/// assert_eq!(re.to_string(), "/\\d+/gi");
/// assert!(RdnRegExp::new("a", "gg").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RdnRegExp {
    source: String,
    flags: String,
}

impl RdnRegExp {
    /// Creates a regular expression, validating the flags.
    ///
    /// Flags must come from `d g i m s u v y`, each at most once. The source
    /// must be non-empty, must not contain a line break, must not end in a
    /// lone `\` and must close every `[` class. A `/` outside a class is
    /// stored escaped, as it appears between the delimiters.
    pub fn new(source: &str, flags: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::invalid_value("regular expression source is empty"));
        }
        if source.contains(['\n', '\r']) {
            return Err(Error::invalid_value(
                "regular expression source contains a line break",
            ));
        }
        crate::literal::validate_regexp_flags(flags.as_bytes())
            .map_err(|flag| Error::invalid_value(format!("invalid regex flag: {}", flag as char)))?;
        Ok(RdnRegExp {
            source: escape_slashes(source)?,
            flags: flags.to_string(),
        })
    }

    /// The pattern with `/` outside classes escaped.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

fn escape_slashes(source: &str) -> Result<String> {
    let mut out = String::with_capacity(source.len() + 2);
    let mut escaped = false;
    let mut in_class = false;
    for ch in source.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => out.push('\\'),
            _ => {}
        }
        out.push(ch);
    }
    if escaped {
        return Err(Error::invalid_value(
            "regular expression source ends with a lone '\\'",
        ));
    }
    if in_class {
        return Err(Error::invalid_value(
            "regular expression source has an unclosed '['",
        ));
    }
    Ok(out)
}

impl fmt::Display for RdnRegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_display() {
        let d = RdnDuration {
            days: 3,
            minutes: 5,
            seconds: 6,
            nanos: 500_000_000,
            ..Default::default()
        };
        assert_eq!(d.to_string(), "P3DT5M6.5S");
        assert_eq!(RdnDuration::default().to_string(), "PT0S");
    }

    #[test]
    fn test_duration_to_std() {
        let d: RdnDuration = "P1DT1H".parse().unwrap();
        assert_eq!(d.to_std(), Some(std::time::Duration::from_secs(90_000)));
        let d: RdnDuration = "P1M".parse().unwrap();
        assert_eq!(d.to_std(), None);
        let back = RdnDuration::from(std::time::Duration::from_secs(3_725));
        assert_eq!(back.to_string(), "PT1H2M5S");
    }

    #[test]
    fn test_regexp_validation() {
        assert!(RdnRegExp::new(".", "dgimsuyv").is_ok());
        assert!(RdnRegExp::new(".", "x").is_err());
        assert!(RdnRegExp::new(".", "gig").is_err());
        assert!(RdnRegExp::new("", "g").is_err());
    }

    #[test]
    fn test_regexp_escapes_slashes() {
        let re = RdnRegExp::new("a/b[/]", "").unwrap();
        assert_eq!(re.source(), "a\\/b[/]");
        assert_eq!(re.to_string(), "/a\\/b[/]/");
        assert_eq!(re, RdnRegExp::new("a\\/b[/]", "").unwrap());
    }

    #[test]
    fn test_regexp_rejects_unreadable_sources() {
        assert!(RdnRegExp::new("a\\", "").is_err());
        assert!(RdnRegExp::new("[a-z", "g").is_err());
        assert!(RdnRegExp::new("[\\]", "").is_err());
        assert!(RdnRegExp::new("a\\\\", "").is_ok());
        assert!(RdnRegExp::new("[\\]]", "").is_ok());
    }
}
