use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_querybind::{Error, FlatMap, RecordShape, ScalarKind, Shape, Value, from_str, parse_query};

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct Item {
    int: i64,
}

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct Form {
    age: i64,
    ratio: f64,
    active: bool,
    name: String,
    items: Vec<Item>,
    grid: Vec<HashMap<i64, i64>>,
    by_id: BTreeMap<i64, String>,
    weights: BTreeMap<String, f64>,
    item: Item,
}

serde_querybind::query_record! {
    Item {
        int: i64,
    }
}

serde_querybind::query_record! {
    Form {
        age: i64,
        ratio: f64,
        active: bool,
        name: String,
        items: Vec<Item> => (query = "slicesub"),
        grid: Vec<HashMap<i64, i64>> => (query = "slicemapintint"),
        by_id: BTreeMap<i64, String>,
        weights: BTreeMap<String, f64>,
        item: Item,
    }
}

fn form_err(query: &str) -> Error {
    match from_str::<Form>(query) {
        Ok(form) => panic!("decoding `{query}` should fail, got {form:?}"),
        Err(err) => err,
    }
}

#[test]
fn append_followed_by_field_is_unsupported() {
    let err = form_err("slicesub[].int=2&slicesub[].int=3");
    assert!(
        matches!(err, Error::UnsupportedPathForm { ref path, ref remainder } if path == "slicesub" && remainder == "[].int"),
        "unexpected error: {err:?}"
    );
}

#[test]
fn append_followed_by_key_is_unsupported() {
    let err = form_err("slicemapintint[][2]=3&slicemapintint[][2]=4");
    assert!(matches!(err, Error::UnsupportedPathForm { .. }), "unexpected error: {err:?}");
}

#[test]
fn invalid_scalars_name_the_raw_text() {
    let err = form_err("age=notanumber");
    assert!(matches!(err, Error::InvalidInteger { ref path, ref raw } if path == "age" && raw == "notanumber"));
    assert_eq!(err.raw(), Some("notanumber"));
    assert_eq!(err.to_string(), "invalid integer `notanumber` at `age`");

    let err = form_err("ratio=1.2.3");
    assert!(matches!(err, Error::InvalidFloat { ref raw, .. } if raw == "1.2.3"));

    let err = form_err("active=maybe");
    assert!(matches!(err, Error::InvalidBoolean { ref raw, .. } if raw == "maybe"));

    let err = form_err("slicesub[2].int=x");
    assert_eq!(err.path(), Some("slicesub[2].int"));
}

#[test]
fn invalid_map_key() {
    let err = form_err("by_id[seven]=x");
    assert!(matches!(
        err,
        Error::InvalidMapKey { ref path, ref raw, kind: ScalarKind::Integer } if path == "by_id[seven]" && raw == "seven"
    ));
}

#[test]
fn malformed_keys() {
    for key in ["a[", "a..b", "a]b", "a[b[c]]", "a.1b", "-a", "a[1]b"] {
        let query = format!("{key}=1");
        let map = parse_query(&query);
        let err = serde_querybind::from_map::<Form>(&map).unwrap_err();
        assert!(
            matches!(err, Error::MalformedPath { key: ref k, .. } if k == key),
            "`{key}` gave {err:?}"
        );
    }

    let err = form_err("items[0]x=1");
    assert!(matches!(
        err,
        Error::MalformedPath { ref consumed, ref remainder, .. } if consumed == "items[0]" && remainder == "x"
    ));
}

#[test]
fn segment_shape_mismatches() {
    let err = form_err("age.x=1");
    assert!(matches!(err, Error::ExpectedRecord { ref path, found: "integer" } if path == "age"));

    let err = form_err("name[0]=1");
    assert!(matches!(err, Error::ExpectedSequence { ref path, found: "string" } if path == "name"));

    let err = form_err("item[k]=1");
    assert!(matches!(err, Error::ExpectedMapping { ref path, found: "record" } if path == "item"));
}

#[test]
fn repeated_scalar_values() {
    let err = form_err("name=a&name=b");
    assert!(matches!(err, Error::MultipleValuesForScalar { ref path, count: 2 } if path == "name"));

    let err = form_err("by_id[1]=a&by_id[1]=b");
    assert!(matches!(err, Error::MultipleValuesForScalar { ref path, count: 2 } if path == "by_id[1]"));
}

#[test]
fn container_at_leaf_has_no_conversion() {
    let err = form_err("item=1");
    assert!(matches!(err, Error::UnsupportedScalarKind { kind: "record", .. }));

    let err = form_err("slicesub=1");
    assert!(matches!(err, Error::UnsupportedScalarKind { kind: "sequence", .. }));
}

#[test]
fn float_map_keys_are_unsupported() {
    let shape = Shape::mapping(ScalarKind::Float, Shape::string());
    let mut target = Value::Null;
    let err = serde_querybind::bind_value(&parse_query("[1.5]=x"), &shape, &mut target).unwrap_err();
    assert!(matches!(err, Error::UnsupportedScalarKind { ref path, .. } if path == "[1.5]"));
}

#[test]
fn destination_must_fit_shape() {
    let shape = Shape::sequence(Shape::integer());
    let mut target = Value::from("not a sequence");
    let err = serde_querybind::bind_value(&FlatMap::new(), &shape, &mut target).unwrap_err();
    assert!(matches!(
        err,
        Error::DestinationNotAssignable { ref path, expected: "sequence", found: "string" } if path.is_empty()
    ));
    assert_eq!(err.to_string(), "destination at the root cannot hold a sequence: found string");

    let other = Shape::Record(RecordShape::new("Other"));
    let mut record = Value::Record(vec![("int".into(), Value::Integer(1))]);
    assert!(serde_querybind::bind_value(&FlatMap::new(), &other, &mut record).is_err());
}

#[test]
fn incompatible_merge_inside_dynamic_mapping() {
    // a slot already holding a sequence cannot take text
    let shape = Shape::mapping(ScalarKind::String, Shape::any());
    let mut entries = BTreeMap::new();
    entries.insert(serde_querybind::MapKey::String("k".into()), Value::Sequence(vec![]));
    let mut target = Value::Mapping(entries);
    let err = serde_querybind::bind_value(&parse_query("[k]=text"), &shape, &mut target).unwrap_err();
    assert!(matches!(
        err,
        Error::IncompatibleMerge { ref path, existing: "sequence", incoming: "string" } if path == "[k]"
    ));
}

#[test]
fn serde_errors_surface_as_messages() {
    let err = from_str::<Vec<u8>>("[0]=300").unwrap_err();
    assert!(matches!(err, Error::Message(_)));
    assert_eq!(err.path(), None);
}

#[test]
fn unsigned_targets_parse_as_signed_integers() {
    let v: Vec<u64> = from_str("[0]=9223372036854775807").unwrap();
    assert_eq!(v, vec![i64::MAX as u64]);

    let err = from_str::<Vec<u64>>("[0]=18446744073709551615").unwrap_err();
    assert!(matches!(err, Error::InvalidInteger { ref raw, .. } if raw == "18446744073709551615"));

    let err = from_str::<Vec<u8>>("[0]=-1").unwrap_err();
    assert!(matches!(err, Error::Message(_)), "got {err:?}");
}
