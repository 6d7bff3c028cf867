//! Owned value model.
//!
//! [`RdnValue`] holds any RDN value as an ordinary Rust tree. It is built
//! from a [`Document`](crate::Document) with [`parse`](crate::parse) or
//! [`Element::to_value`](crate::Element::to_value) and written back through a
//! [`Writer`].
//!
//! ## Usage
//!
//! ```rust
//! use rdn::{RdnValue, Number};
//!
//! let value: RdnValue = rdn::parse(r#"{"ids": {1, 2}, "when": @2024-01-15}"#).unwrap();
//! let ids = value.get("ids").unwrap();
//! assert!(ids.is_set());
//! assert_eq!(ids.as_set().unwrap()[0], RdnValue::Number(Number::Integer(1)));
//!
//! assert_eq!(
//!     value.to_string(),
//!     r#"{"ids":{1,2},"when":@2024-01-15T00:00:00.000Z}"#
//! );
//! ```

use crate::literal;
use crate::types::{RdnDuration, RdnRegExp};
use crate::writer::Writer;
use crate::{Error, RdnMap, WriterOptions};
use chrono::{DateTime, NaiveTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::io;

/// Any RDN value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum RdnValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    BigInt(BigInt),
    String(String),
    Array(Vec<RdnValue>),
    Object(RdnMap),
    Set(Vec<RdnValue>),
    /// Entries in document order; keys may be any value.
    Map(Vec<(RdnValue, RdnValue)>),
    DateTime(DateTime<Utc>),
    TimeOnly(NaiveTime),
    Duration(RdnDuration),
    RegExp(RdnRegExp),
    Binary(Vec<u8>),
}

/// A plain number, including the non-finite literals.
///
/// # Examples
///
/// ```rust
/// use rdn::Number;
///
/// assert_eq!(Number::Integer(42).as_i64(), Some(42));
/// assert_eq!(Number::Float(42.5).as_i64(), None);
/// assert!(Number::NaN.is_special());
/// assert_eq!(Number::NegativeInfinity.to_string(), "-Infinity");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    /// Interprets the text of a number token.
    pub(crate) fn from_literal(raw: &[u8]) -> crate::Result<Number> {
        Ok(match raw {
            b"NaN" => Number::NaN,
            b"Infinity" => Number::Infinity,
            b"-Infinity" => Number::NegativeInfinity,
            _ if raw.iter().any(|b| matches!(b, b'.' | b'e' | b'E')) => {
                Number::Float(literal::parse_f64(raw)?)
            }
            _ => match literal::parse_i64(raw) {
                Ok(n) => Number::Integer(n),
                Err(_) => Number::Float(literal::parse_f64(raw)?),
            },
        })
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// `true` for `Infinity`, `-Infinity` and `NaN`.
    #[inline]
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(
            self,
            Number::Infinity | Number::NegativeInfinity | Number::NaN
        )
    }

    /// Integers, and floats with no fractional part inside the `i64` range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }

    fn write_to<W: io::Write>(&self, writer: &mut Writer<W>) -> crate::Result<()> {
        match self {
            Number::Integer(i) => writer.write_i64_value(*i),
            other => writer.write_f64_value(other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(fl) => write!(f, "{fl:?}"),
            Number::Infinity => f.write_str("Infinity"),
            Number::NegativeInfinity => f.write_str("-Infinity"),
            Number::NaN => f.write_str("NaN"),
        }
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }
}

macro_rules! number_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Integer(i64::from(value))
                }
            }

            impl From<$ty> for RdnValue {
                fn from(value: $ty) -> Self {
                    RdnValue::Number(Number::from(value))
                }
            }
        )*
    };
}

number_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl RdnValue {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, RdnValue::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, RdnValue::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, RdnValue::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, RdnValue::Set(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, RdnValue::Map(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RdnValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RdnValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RdnValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[RdnValue]> {
        match self {
            RdnValue::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_set(&self) -> Option<&[RdnValue]> {
        match self {
            RdnValue::Set(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&[(RdnValue, RdnValue)]> {
        match self {
            RdnValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&RdnMap> {
        match self {
            RdnValue::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            RdnValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_big_int(&self) -> Option<&BigInt> {
        match self {
            RdnValue::BigInt(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            RdnValue::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Object property by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RdnValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Writes this value as one complete RDN value.
    pub fn write_to<W: io::Write>(&self, writer: &mut Writer<W>) -> crate::Result<()> {
        match self {
            RdnValue::Null => writer.write_null_value(),
            RdnValue::Bool(b) => writer.write_bool_value(*b),
            RdnValue::Number(n) => n.write_to(writer),
            RdnValue::BigInt(n) => writer.write_big_integer_value(n),
            RdnValue::String(s) => writer.write_string_value(s),
            RdnValue::DateTime(dt) => writer.write_date_time_value(dt),
            RdnValue::TimeOnly(t) => writer.write_time_only_value(t),
            RdnValue::Duration(d) => writer.write_duration_value(d),
            RdnValue::RegExp(re) => writer.write_regexp_value(re),
            RdnValue::Binary(bytes) => writer.write_binary_value(bytes),
            RdnValue::Array(items) => {
                writer.write_start_array()?;
                for item in items {
                    item.write_to(writer)?;
                }
                writer.write_end_array()
            }
            RdnValue::Set(items) => {
                writer.write_start_set()?;
                for item in items {
                    item.write_to(writer)?;
                }
                writer.write_end_set()
            }
            RdnValue::Map(entries) => {
                writer.write_start_map()?;
                for (key, value) in entries {
                    key.write_to(writer)?;
                    value.write_to(writer)?;
                }
                writer.write_end_map()
            }
            RdnValue::Object(map) => {
                writer.write_start_object()?;
                for (key, value) in map.iter() {
                    writer.write_property_name(key)?;
                    value.write_to(writer)?;
                }
                writer.write_end_object()
            }
        }
    }
}

impl fmt::Display for RdnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = if f.alternate() {
            WriterOptions::pretty()
        } else {
            WriterOptions::default()
        };
        let mut writer = Writer::new(options);
        self.write_to(&mut writer).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(writer.as_bytes()))
    }
}

impl<'de> Deserialize<'de> for RdnValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct RdnValueVisitor;

        impl<'de> Visitor<'de> for RdnValueVisitor {
            type Value = RdnValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any value representable in RDN")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(RdnValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(RdnValue::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(match i64::try_from(value) {
                    Ok(n) => RdnValue::Number(Number::Integer(n)),
                    Err(_) => RdnValue::BigInt(BigInt::from(value)),
                })
            }

            fn visit_i128<E>(self, value: i128) -> Result<Self::Value, E> {
                Ok(match i64::try_from(value) {
                    Ok(n) => RdnValue::Number(Number::Integer(n)),
                    Err(_) => RdnValue::BigInt(BigInt::from(value)),
                })
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(RdnValue::Number(Number::from(value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(RdnValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(RdnValue::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E> {
                Ok(RdnValue::Binary(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E> {
                Ok(RdnValue::Binary(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(RdnValue::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(RdnValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(RdnValue::Array(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = RdnMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(RdnValue::Object(values))
            }
        }

        deserializer.deserialize_any(RdnValueVisitor)
    }
}

impl TryFrom<RdnValue> for i64 {
    type Error = Error;

    fn try_from(value: RdnValue) -> crate::Result<Self> {
        match &value {
            RdnValue::Number(n) => n
                .as_i64()
                .ok_or_else(|| Error::invalid_value(format!("{n} is not a 64-bit integer"))),
            RdnValue::BigInt(n) => i64::try_from(n)
                .map_err(|_| Error::invalid_value(format!("{n} does not fit in i64"))),
            other => Err(Error::type_mismatch("Number", kind_name(other))),
        }
    }
}

impl TryFrom<RdnValue> for f64 {
    type Error = Error;

    fn try_from(value: RdnValue) -> crate::Result<Self> {
        match value {
            RdnValue::Number(n) => Ok(n.as_f64()),
            other => Err(Error::type_mismatch("Number", kind_name(&other))),
        }
    }
}

impl TryFrom<RdnValue> for bool {
    type Error = Error;

    fn try_from(value: RdnValue) -> crate::Result<Self> {
        match value {
            RdnValue::Bool(b) => Ok(b),
            other => Err(Error::type_mismatch("Boolean", kind_name(&other))),
        }
    }
}

impl TryFrom<RdnValue> for String {
    type Error = Error;

    fn try_from(value: RdnValue) -> crate::Result<Self> {
        match value {
            RdnValue::String(s) => Ok(s),
            other => Err(Error::type_mismatch("String", kind_name(&other))),
        }
    }
}

pub(crate) fn kind_name(value: &RdnValue) -> &'static str {
    match value {
        RdnValue::Null => "Null",
        RdnValue::Bool(_) => "Boolean",
        RdnValue::Number(_) => "Number",
        RdnValue::BigInt(_) => "BigInteger",
        RdnValue::String(_) => "String",
        RdnValue::Array(_) => "Array",
        RdnValue::Object(_) => "Object",
        RdnValue::Set(_) => "Set",
        RdnValue::Map(_) => "Map",
        RdnValue::DateTime(_) => "DateTime",
        RdnValue::TimeOnly(_) => "TimeOnly",
        RdnValue::Duration(_) => "Duration",
        RdnValue::RegExp(_) => "RegExp",
        RdnValue::Binary(_) => "Binary",
    }
}

impl From<bool> for RdnValue {
    fn from(value: bool) -> Self {
        RdnValue::Bool(value)
    }
}

impl From<f64> for RdnValue {
    fn from(value: f64) -> Self {
        RdnValue::Number(Number::from(value))
    }
}

impl From<u64> for RdnValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(n) => RdnValue::Number(Number::Integer(n)),
            Err(_) => RdnValue::BigInt(BigInt::from(value)),
        }
    }
}

impl From<BigInt> for RdnValue {
    fn from(value: BigInt) -> Self {
        RdnValue::BigInt(value)
    }
}

impl From<String> for RdnValue {
    fn from(value: String) -> Self {
        RdnValue::String(value)
    }
}

impl From<&str> for RdnValue {
    fn from(value: &str) -> Self {
        RdnValue::String(value.to_string())
    }
}

impl From<Vec<RdnValue>> for RdnValue {
    fn from(value: Vec<RdnValue>) -> Self {
        RdnValue::Array(value)
    }
}

impl From<RdnMap> for RdnValue {
    fn from(value: RdnMap) -> Self {
        RdnValue::Object(value)
    }
}

impl From<DateTime<Utc>> for RdnValue {
    fn from(value: DateTime<Utc>) -> Self {
        RdnValue::DateTime(value)
    }
}

impl From<NaiveTime> for RdnValue {
    fn from(value: NaiveTime) -> Self {
        RdnValue::TimeOnly(value)
    }
}

impl From<RdnDuration> for RdnValue {
    fn from(value: RdnDuration) -> Self {
        RdnValue::Duration(value)
    }
}

impl From<RdnRegExp> for RdnValue {
    fn from(value: RdnRegExp) -> Self {
        RdnValue::RegExp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_from_literal() {
        assert_eq!(Number::from_literal(b"42").unwrap(), Number::Integer(42));
        assert_eq!(Number::from_literal(b"-1.5e2").unwrap(), Number::Float(-150.0));
        assert_eq!(Number::from_literal(b"-Infinity").unwrap(), Number::NegativeInfinity);
        assert_eq!(
            Number::from_literal(b"18446744073709551616").unwrap(),
            Number::Float(18446744073709551616.0)
        );
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(RdnValue::from(42)).unwrap(), 42);
        assert_eq!(i64::try_from(RdnValue::from(42.0)).unwrap(), 42);
        assert!(i64::try_from(RdnValue::from("x")).unwrap_err().is_type_mismatch());
        assert_eq!(f64::try_from(RdnValue::Number(Number::Infinity)).unwrap(), f64::INFINITY);
        assert!(bool::try_from(RdnValue::from(true)).unwrap());
        assert_eq!(String::try_from(RdnValue::from("hi")).unwrap(), "hi");
    }

    #[test]
    fn test_integral_float_stays_float() {
        for x in [2.0, -0.0, 1e20, 123456789.0] {
            let value = RdnValue::Number(Number::Float(x));
            let text = crate::to_string(&value).unwrap();
            assert_eq!(crate::parse(&text).unwrap(), value, "{text}");
        }
        assert_eq!(Number::Float(2.0).to_string(), "2.0");
    }

    #[test]
    fn test_as_i64_range() {
        assert_eq!(Number::Float(i64::MIN as f64).as_i64(), Some(i64::MIN));
        assert_eq!(Number::Float(9_223_372_036_854_775_808.0).as_i64(), None);
        assert_eq!(Number::Float(-1.0e19).as_i64(), None);
    }

    #[test]
    fn test_u64_beyond_i64_becomes_big_int() {
        assert_eq!(RdnValue::from(u64::MAX), RdnValue::BigInt(BigInt::from(u64::MAX)));
    }

    #[test]
    fn test_display() {
        let value = RdnValue::Map(vec![
            (RdnValue::from(1), RdnValue::Set(vec![])),
            (RdnValue::Null, RdnValue::Binary(vec![1, 2])),
        ]);
        assert_eq!(value.to_string(), r#"{1=>Set{},null=>b"AQI="}"#);
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: RdnValue = serde_json::from_str(r#"{"a": [1, 2.5, null], "b": 18446744073709551615}"#).unwrap();
        assert_eq!(value.get("a").unwrap().as_array().unwrap().len(), 3);
        assert_eq!(value.get("b"), Some(&RdnValue::BigInt(BigInt::from(u64::MAX))));
    }
}
