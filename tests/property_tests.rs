//! Property-based tests for the guarantees the format makes across generated inputs:
//! escaping is lossless, literals survive a write/read cycle, and write-back is stable.

use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use proptest::prelude::*;
use rdn::{unescape, Document, RdnDuration, RdnValue, Writer, WriterOptions};
use std::borrow::Cow;

fn write_one(f: impl FnOnce(&mut Writer) -> rdn::Result<()>) -> Vec<u8> {
    let mut writer = Writer::new(WriterOptions::default());
    f(&mut writer).unwrap();
    writer.as_bytes().to_vec()
}

proptest! {
    #[test]
    fn prop_unescape_plain_is_borrowed(s in "[^\\\\\"]*") {
        let unescaped = unescape(s.as_bytes()).unwrap();
        prop_assert!(matches!(unescaped, Cow::Borrowed(_)));
        prop_assert_eq!(unescaped.as_ref(), s.as_str());
    }

    #[test]
    fn prop_string_round_trip(s in any::<String>()) {
        let bytes = write_one(|w| w.write_string_value(&s));
        let doc = Document::from_vec(bytes).unwrap();
        let root = doc.root_element().unwrap();
        let got = root.get_string().unwrap();
        prop_assert_eq!(got.as_ref(), s.as_str());
        prop_assert!(root.text_equals(&s).unwrap());
    }

    #[test]
    fn prop_property_name_round_trip(name in any::<String>(), n in any::<i64>()) {
        let bytes = write_one(|w| {
            w.write_start_object()?;
            w.write_property_name(&name)?;
            w.write_i64_value(n)?;
            w.write_end_object()
        });
        let doc = Document::from_vec(bytes).unwrap();
        let value = doc.root_element().unwrap().get_property(&name).unwrap();
        prop_assert_eq!(value.get_i64().unwrap(), n);
    }

    #[test]
    fn prop_i64_round_trip(n in any::<i64>()) {
        let bytes = write_one(|w| w.write_i64_value(n));
        prop_assert_eq!(rdn::from_slice::<i64>(&bytes).unwrap(), n);
    }

    #[test]
    fn prop_u64_round_trip(n in any::<u64>()) {
        let bytes = write_one(|w| w.write_u64_value(n));
        prop_assert_eq!(rdn::from_slice::<u64>(&bytes).unwrap(), n);
    }

    #[test]
    fn prop_f64_round_trip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let bytes = write_one(|w| w.write_f64_value(x));
        prop_assert_eq!(rdn::from_slice::<f64>(&bytes).unwrap(), x);
    }

    #[test]
    fn prop_big_integer_round_trip(digits in "-?[1-9][0-9]{0,60}") {
        let n: BigInt = digits.parse().unwrap();
        let bytes = write_one(|w| w.write_big_integer_value(&n));
        prop_assert_eq!(bytes.last(), Some(&b'n'));
        prop_assert_eq!(rdn::from_slice::<BigInt>(&bytes).unwrap(), n);
    }

    #[test]
    fn prop_binary_round_trip(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let base64 = write_one(|w| w.write_binary_value(&data));
        prop_assert_eq!(rdn::from_slice::<Vec<u8>>(&base64).unwrap(), data.clone());
        let hex = write_one(|w| w.write_binary_hex_value(&data));
        prop_assert_eq!(rdn::from_slice::<Vec<u8>>(&hex).unwrap(), data);
    }

    #[test]
    fn prop_date_time_round_trip(millis in 0i64..253_402_300_799_999) {
        let dt = Utc.timestamp_millis_opt(millis).unwrap();
        let bytes = write_one(|w| w.write_date_time_value(&dt));
        prop_assert_eq!(rdn::from_slice::<chrono::DateTime<Utc>>(&bytes).unwrap(), dt);
    }

    #[test]
    fn prop_duration_round_trip(
        years in 0u64..100,
        days in 0u64..400,
        hours in 0u64..48,
        seconds in 0u64..120,
        millis in 0u32..1000,
    ) {
        let duration = RdnDuration {
            years,
            days,
            hours,
            seconds,
            nanos: millis * 1_000_000,
            ..Default::default()
        };
        let bytes = write_one(|w| w.write_duration_value(&duration));
        prop_assert_eq!(rdn::from_slice::<RdnDuration>(&bytes).unwrap(), duration);
    }

    #[test]
    fn prop_set_write_back_is_stable(items in prop::collection::vec(any::<i32>(), 0..16)) {
        let value = RdnValue::Set(items.iter().map(|&n| RdnValue::from(n)).collect());
        let text = rdn::to_string(&value).unwrap();
        if items.is_empty() {
            prop_assert_eq!(text.as_str(), "Set{}");
        } else {
            prop_assert!(!text.starts_with("Set"));
        }
        let doc = Document::parse_str(&text).unwrap();
        let mut writer = Writer::new(WriterOptions::default());
        doc.write_to(&mut writer).unwrap();
        prop_assert_eq!(writer.into_string().unwrap(), text.clone());
        prop_assert_eq!(rdn::parse(&text).unwrap(), value);
    }
}
