use num_bigint::BigInt;
use rdn::{Document, DocumentOptions, Error, RdnValue, ValueKind, Writer, WriterOptions};
use std::sync::atomic::{AtomicUsize, Ordering};

const SAMPLE: &str = r#"{
    "id": 7,
    "name": "Widget \"Pro\"",
    "price": 19.5,
    "stock": 12345678901234567890n,
    "released": @2023-06-01T08:00:00Z,
    "tags": Set{"tools", "garden"},
    "dims": [1, [2, 3], 4],
    "lookup": {"a" => 1, [2] => @PT5M},
    "empty": {},
    "none": null
}"#;

fn rewrite(doc: &Document) -> String {
    let mut writer = Writer::new(WriterOptions::default());
    doc.write_to(&mut writer).unwrap();
    writer.into_string().unwrap()
}

#[test]
fn test_big_integer_property() {
    let doc = Document::parse_str(r#"{"count": 42n}"#).unwrap();
    let count = doc.root_element().unwrap().get_property("count").unwrap();
    assert_eq!(count.value_kind().unwrap(), ValueKind::BigInteger);
    assert_eq!(count.get_big_integer().unwrap(), BigInt::from(42));
    assert!(count.get_i64().unwrap_err().is_type_mismatch());
}

#[test]
fn test_navigation() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(root.value_kind().unwrap(), ValueKind::Object);
    assert_eq!(root.get_property_count().unwrap(), 10);

    assert_eq!(root.get_property("id").unwrap().get_i32().unwrap(), 7);
    assert_eq!(
        root.get_property("name").unwrap().get_string().unwrap(),
        "Widget \"Pro\""
    );
    assert_eq!(root.get_property("price").unwrap().get_f64().unwrap(), 19.5);

    let dims = root.get_property("dims").unwrap();
    assert_eq!(dims.get_array_length().unwrap(), 3);
    assert_eq!(dims.get_index(2).unwrap().get_i64().unwrap(), 4);
    let inner = dims.get_index(1).unwrap();
    assert_eq!(inner.get_index(1).unwrap().get_i64().unwrap(), 3);
    assert!(matches!(
        dims.get_index(3).unwrap_err(),
        Error::OutOfRange { index: 3, len: 3 }
    ));

    let tags = root.get_property("tags").unwrap();
    assert_eq!(tags.value_kind().unwrap(), ValueKind::Set);
    let tags: Vec<String> = tags
        .array_iter()
        .unwrap()
        .map(|t| t.get::<String>().unwrap())
        .collect();
    assert_eq!(tags, ["tools", "garden"]);

    let lookup = root.get_property("lookup").unwrap();
    assert_eq!(lookup.get_map_length().unwrap(), 2);
    let (key, value) = lookup.get_map_entry(1).unwrap();
    assert_eq!(key.value_kind().unwrap(), ValueKind::Array);
    assert_eq!(value.get_duration().unwrap().minutes, 5);

    let empty = root.get_property("empty").unwrap();
    assert_eq!(empty.value_kind().unwrap(), ValueKind::Object);
    assert_eq!(empty.get_property_count().unwrap(), 0);

    assert!(root.get_property("none").unwrap().is_null().unwrap());
    assert!(root.try_get_property("missing").unwrap().is_none());
    assert!(matches!(
        root.get_property("missing").unwrap_err(),
        Error::PropertyNotFound(name) if name == "missing"
    ));
}

#[test]
fn test_kind_mismatches() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let root = doc.root_element().unwrap();
    assert!(root.get_array_length().unwrap_err().is_type_mismatch());
    assert!(root.get_index(0).unwrap_err().is_type_mismatch());
    let name = root.get_property("name").unwrap();
    assert!(name.get_i64().unwrap_err().is_type_mismatch());
    assert!(name.get_property_count().unwrap_err().is_type_mismatch());
    assert!(name.get_date_time().unwrap_err().is_type_mismatch());
}

#[test]
fn test_property_iteration_order() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let names: Vec<String> = doc
        .root_element()
        .unwrap()
        .properties()
        .unwrap()
        .map(|p| p.name().unwrap().into_owned())
        .collect();
    assert_eq!(
        names,
        ["id", "name", "price", "stock", "released", "tags", "dims", "lookup", "empty", "none"]
    );
}

#[test]
fn test_escaped_property_names() {
    let doc = Document::parse_str(r#"{"tab\tkey": 1, "A": 2}"#).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(root.get_property("tab\tkey").unwrap().get_i64().unwrap(), 1);
    assert_eq!(root.get_property("A").unwrap().get_i64().unwrap(), 2);
    let first = root.properties().unwrap().next().unwrap();
    assert!(first.name_equals("tab\tkey").unwrap());
    assert!(!first.name_equals("tab\\tkey").unwrap());
}

#[test]
fn test_repeated_property_last_wins() {
    let doc = Document::parse_str(r#"{"a": 1, "b": [], "a": 2}"#).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(root.get_property("a").unwrap().get_i64().unwrap(), 2);
    assert_eq!(root.get_property_count().unwrap(), 3);
}

#[test]
fn test_duplicate_detection() {
    let strict = DocumentOptions::new().with_duplicate_properties(false);
    let err = Document::parse_with_options(br#"{"a": 1, "a": 2}"#, &strict).unwrap_err();
    match err {
        Error::DuplicateProperty { name, offset } => {
            assert_eq!(name, "a");
            assert_eq!(offset, 9);
        }
        other => panic!("unexpected error: {other}"),
    }

    let inner = br#"{"x": {"k": 1, "k": 2}}"#;
    assert!(matches!(
        Document::parse_with_options(inner, &strict),
        Err(Error::DuplicateProperty { .. })
    ));

    let nested = br#"{"a": {"a": 1}, "b": [{"a": 1}, {"a": 2}], "m": {"a" => 1, "a" => 2}}"#;
    assert!(Document::parse_with_options(nested, &strict).is_ok());
}

#[test]
fn test_raw_values() {
    let doc = Document::parse_str(r#"[ "a\"b", 42n, @P1D, b"AA==", {"k": [1]} ]"#).unwrap();
    let root = doc.root_element().unwrap();
    let raw = |n: usize, delimiters: bool| {
        let bytes = root.get_index(n).unwrap().get_raw_value(delimiters).unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    };
    assert_eq!(raw(0, true), r#""a\"b""#);
    assert_eq!(raw(0, false), r#"a\"b"#);
    assert_eq!(raw(1, true), "42n");
    assert_eq!(raw(1, false), "42");
    assert_eq!(raw(2, true), "@P1D");
    assert_eq!(raw(3, true), r#"b"AA==""#);
    assert_eq!(raw(3, false), "AA==");
    assert_eq!(raw(4, false), r#"{"k": [1]}"#);
    assert_eq!(
        String::from_utf8(root.get_raw_value(true).unwrap().to_vec()).unwrap(),
        r#"[ "a\"b", 42n, @P1D, b"AA==", {"k": [1]} ]"#
    );
}

#[test]
fn test_text_equals() {
    let doc = Document::parse_str(r#"["plain", "esc\u0041ped", 1]"#).unwrap();
    let root = doc.root_element().unwrap();
    assert!(root.get_index(0).unwrap().text_equals("plain").unwrap());
    assert!(!root.get_index(0).unwrap().text_equals("plai").unwrap());
    assert!(root.get_index(1).unwrap().text_equals("escAped").unwrap());
    assert!(root.get_index(2).unwrap().text_equals("1").unwrap_err().is_type_mismatch());
}

#[test]
fn test_write_back_elides_set_prefix() {
    let doc = Document::parse_str("Set{1, 2, 3}").unwrap();
    assert_eq!(doc.root_element().unwrap().get_array_length().unwrap(), 3);
    assert_eq!(rewrite(&doc), "{1,2,3}");

    let doc = Document::parse_str("Set{}").unwrap();
    assert_eq!(rewrite(&doc), "Set{}");

    let doc = Document::parse_str("Map{}").unwrap();
    assert_eq!(rewrite(&doc), "Map{}");
}

#[test]
fn test_write_back_is_stable() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let once = rewrite(&doc);
    assert_eq!(
        once,
        r#"{"id":7,"name":"Widget \"Pro\"","price":19.5,"stock":12345678901234567890n,"released":@2023-06-01T08:00:00Z,"tags":{"tools","garden"},"dims":[1,[2,3],4],"lookup":{"a"=>1,[2]=>@PT5M},"empty":{},"none":null}"#
    );
    let again = Document::parse_str(&once).unwrap();
    assert_eq!(rewrite(&again), once);
}

#[test]
fn test_nested_maps_write_back() {
    let input = r#"{{1 => 2} => Map{}, "k" => {Set{} => [{"x" => 3}]}}"#;
    let doc = Document::parse_str(input).unwrap();
    assert_eq!(
        rewrite(&doc),
        r#"{{1=>2}=>Map{},"k"=>{Set{}=>[{"x"=>3}]}}"#
    );
}

#[test]
fn test_element_write_to() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let lookup = doc.root_element().unwrap().get_property("lookup").unwrap();
    let mut writer = Writer::new(WriterOptions::new().with_always_write_type_name(true));
    lookup.write_to(&mut writer).unwrap();
    assert_eq!(writer.into_string().unwrap(), r#"Map{"a"=>1,[2]=>@PT5M}"#);
}

#[test]
fn test_clone_outlives_parent() {
    let clone = {
        let doc = Document::parse_str(SAMPLE).unwrap();
        let dims = doc.root_element().unwrap().get_property("dims").unwrap();
        dims.clone_element().unwrap()
    };
    let root = clone.root_element().unwrap();
    assert_eq!(root.get_array_length().unwrap(), 3);
    assert_eq!(root.get_index(1).unwrap().get_index(0).unwrap().get_i64().unwrap(), 2);
    assert_eq!(rewrite(&clone), "[1,[2,3],4]");
}

#[test]
fn test_clone_scalar() {
    let doc = Document::parse_str(r#"{"s": "x\ny"}"#).unwrap();
    let clone = doc
        .root_element()
        .unwrap()
        .get_property("s")
        .unwrap()
        .clone_element()
        .unwrap();
    assert_eq!(clone.root_element().unwrap().get_string().unwrap(), "x\ny");
    assert_eq!(clone.as_bytes().unwrap(), br#""x\ny""#);
}

#[test]
fn test_typed_get() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let root = doc.root_element().unwrap();
    let id: u32 = root.get_property("id").unwrap().get().unwrap();
    assert_eq!(id, 7);
    let none: Option<String> = root.get_property("none").unwrap().get().unwrap();
    assert_eq!(none, None);
    let released: chrono::DateTime<chrono::Utc> = root.get_property("released").unwrap().get().unwrap();
    assert_eq!(released.to_rfc3339(), "2023-06-01T08:00:00+00:00");

    let name = root.get_property("name").unwrap();
    assert_eq!(name.try_get::<i64>().unwrap(), None);
    assert_eq!(name.try_get::<String>().unwrap().as_deref(), Some("Widget \"Pro\""));
    let stock = root.get_property("stock").unwrap();
    assert_eq!(stock.try_get::<u64>().unwrap(), None);
    assert!(stock.try_get::<BigInt>().unwrap().is_some());
}

#[test]
fn test_to_value() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let value = doc.to_value().unwrap();
    let tags = value.get("tags").unwrap();
    assert_eq!(
        tags,
        &RdnValue::Set(vec![RdnValue::from("tools"), RdnValue::from("garden")])
    );
    let lookup = value.get("lookup").unwrap().as_map().unwrap();
    assert_eq!(lookup[1].0, RdnValue::Array(vec![RdnValue::from(2)]));
    assert_eq!(value.get("none"), Some(&RdnValue::Null));
}

#[test]
fn test_disposed_document() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let root = doc.root_element().unwrap();
    let name = root.get_property("name").unwrap();
    assert!(!doc.is_disposed());
    assert!(doc.dispose());
    assert!(!doc.dispose());
    assert!(doc.is_disposed());

    assert!(doc.root_element().unwrap_err().is_disposed());
    assert!(doc.as_bytes().unwrap_err().is_disposed());
    assert!(root.get_property_count().unwrap_err().is_disposed());
    assert!(name.get_string().unwrap_err().is_disposed());
    assert!(name.try_get::<String>().unwrap_err().is_disposed());
    assert!(name.get_raw_value(true).unwrap_err().is_disposed());
    assert!(name.clone_element().unwrap_err().is_disposed());
    let mut writer = Writer::new(WriterOptions::default());
    assert!(root.write_to(&mut writer).unwrap_err().is_disposed());
    assert_eq!(writer.bytes_written(), 0);
}

#[test]
fn test_concurrent_dispose() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    let winners = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                if doc.dispose() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });
    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(doc.is_disposed());
}

#[test]
fn test_concurrent_reads() {
    let doc = Document::parse_str(SAMPLE).unwrap();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let root = doc.root_element().unwrap();
                for _ in 0..100 {
                    let dims = root.get_property("dims").unwrap();
                    assert_eq!(dims.get_index(2).unwrap().get_i64().unwrap(), 4);
                }
            });
        }
    });
}

#[test]
fn test_rejected_inputs() {
    for input in ["", "   ", "1 2", "[1, 2}", "Set{1, 2]", "{\"a\" 1}", "[1,]"] {
        let err = Document::parse_str(input).unwrap_err();
        assert!(err.is_syntax(), "{input:?}: {err}");
    }
}

#[test]
fn test_owned_input() {
    let doc = Document::from_vec(b"[true, false]".to_vec()).unwrap();
    let values: Vec<bool> = doc
        .root_element()
        .unwrap()
        .array_iter()
        .unwrap()
        .map(|e| e.get_bool().unwrap())
        .collect();
    assert_eq!(values, [true, false]);
}
