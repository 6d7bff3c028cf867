//! `serde::Serialize` for documents and values.
//!
//! Lets parsed RDN flow into any serde format. Types without a serde data
//! model counterpart are lowered:
//!
//! - date-times: RFC 3339 strings
//! - times of day and durations: their RDN text without `@`
//! - big integers: decimal strings
//! - regular expressions: `/source/flags` strings
//! - binary: byte sequences
//! - sets: sequences; maps: serde maps with arbitrary keys
//!
//! ```rust
//! use rdn::Document;
//!
//! let doc = Document::parse_str(r#"{"n": 9007199254740993n, "at": @2024-01-15T10:30:00Z}"#).unwrap();
//! let json = serde_json::to_string(&doc.root_element().unwrap()).unwrap();
//! assert_eq!(json, r#"{"n":"9007199254740993","at":"2024-01-15T10:30:00+00:00"}"#);
//! ```

use crate::document::Element;
use crate::token::ValueKind;
use crate::value::{Number, RdnValue};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

fn time_text(time: &chrono::NaiveTime) -> String {
    time.format("%H:%M:%S%.f").to_string()
}

impl Serialize for RdnValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RdnValue::Null => serializer.serialize_unit(),
            RdnValue::Bool(b) => serializer.serialize_bool(*b),
            RdnValue::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            RdnValue::Number(n) => serializer.serialize_f64(n.as_f64()),
            RdnValue::BigInt(n) => serializer.collect_str(n),
            RdnValue::String(s) => serializer.serialize_str(s),
            RdnValue::Array(items) | RdnValue::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            RdnValue::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            RdnValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            RdnValue::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            RdnValue::TimeOnly(t) => serializer.serialize_str(&time_text(t)),
            RdnValue::Duration(d) => serializer.collect_str(d),
            RdnValue::RegExp(re) => serializer.collect_str(re),
            RdnValue::Binary(bytes) => serializer.serialize_bytes(bytes),
        }
    }
}

impl Serialize for Element<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let kind = self.value_kind().map_err(S::Error::custom)?;
        match kind {
            ValueKind::Array | ValueKind::Set => {
                let items = self.array_iter().map_err(S::Error::custom)?;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&item)?;
                }
                seq.end()
            }
            ValueKind::Object => {
                let properties = self.properties().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(properties.len()))?;
                for property in properties {
                    let name = property.name().map_err(S::Error::custom)?;
                    map.serialize_entry(&*name, &property.value())?;
                }
                map.end()
            }
            ValueKind::Map => {
                let entries = self.map_iter().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&key, &value)?;
                }
                map.end()
            }
            ValueKind::String => {
                let text = self.get_string().map_err(S::Error::custom)?;
                serializer.serialize_str(&text)
            }
            // Scalars with no borrowed form go through the owned model.
            _ => self.to_value().map_err(S::Error::custom)?.serialize(serializer),
        }
    }
}
