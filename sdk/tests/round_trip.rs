#![cfg(test)]

use std::collections::{BTreeMap, HashMap};

use gbin::{
    decode, decode_value, encode, record_schema, Dynamic, FromGbin, GbinError, Kind, RecordBuilder,
    RecordReader, Schema, ToGbin, Value,
};
use proptest::prelude::*;

fn round_trip<T: ToGbin + FromGbin + PartialEq + std::fmt::Debug>(data: T) {
    let bytes = encode(&data).expect("encode failed");
    let back: T = decode(&bytes).expect("decode failed");
    assert_eq!(back, data);
}

#[derive(Debug, Clone, PartialEq)]
struct Profile {
    name:   String,
    scores: BTreeMap<String, i32>,
    tags:   Vec<String>,
    parent: Option<Box<Profile>>,
}

impl ToGbin for Profile {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        let builder = RecordBuilder::new()
            .field("name", &self.name)?
            .field("scores", &self.scores)?
            .field("tags", &self.tags)?;
        // An absent parent is left out of the record entirely.
        let builder = match self.parent {
            Some(ref parent) => builder.field("parent", parent)?,
            None => builder,
        };
        Ok(builder.build())
    }
}

impl FromGbin for Profile {
    fn schema() -> Schema {
        record_schema(
            "Profile",
            &[
                ("name", String::schema()),
                ("scores", BTreeMap::<String, i32>::schema()),
                ("tags", Vec::<String>::schema()),
            ],
        )
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        let r = RecordReader::new("Profile", value)?;
        Ok(Profile {
            name:   r.field("name")?,
            scores: r.field("scores")?,
            tags:   r.field("tags")?,
            parent: None,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Abc {
    a: i64,
    b: String,
    c: bool,
}

impl ToGbin for Abc {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(RecordBuilder::new()
            .field("A", &self.a)?
            .field("B", &self.b)?
            .field("C", &self.c)?
            .build())
    }
}

#[derive(Debug, PartialEq)]
struct Ac {
    a: i64,
    c: bool,
}

impl FromGbin for Ac {
    fn schema() -> Schema {
        record_schema("Ac", &[("A", i64::schema()), ("C", bool::schema())])
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        let r = RecordReader::new("Ac", value)?;
        Ok(Ac { a: r.field("A")?, c: r.field("C")? })
    }
}

#[test]
fn test_scalars() {
    round_trip("abcd".to_owned());
    round_trip(622711i64);
    round_trip(1541523.21231f64);
    round_trip(true);
    round_trip(-7i8);
    round_trip(u64::MAX);
    round_trip(1.5f32);
}

#[test]
fn test_reference() {
    round_trip(Box::new("abcdefg".to_owned()));
    round_trip(Some(Box::new(3u8)));
}

#[test]
fn test_list() {
    round_trip(vec!["a", "b", "c", "d", "E", "f"].into_iter().map(String::from).collect::<Vec<_>>());
    round_trip(Vec::<u32>::new());
    round_trip(vec![vec![1i16], vec![], vec![2, 3]]);
}

#[test]
fn test_map() {
    let mut map = HashMap::new();
    map.insert("a".to_owned(), 2i64);
    map.insert("b".to_owned(), 3);
    map.insert("c".to_owned(), 4);
    round_trip(map);
}

#[test]
fn test_record() {
    let mut scores = BTreeMap::new();
    scores.insert("1".to_owned(), 2);
    scores.insert("2".to_owned(), 3);
    scores.insert("2+2".to_owned(), 5);
    round_trip(Profile {
        name: "Hi there".to_owned(),
        scores,
        tags: vec![],
        parent: None,
    });
}

#[test]
fn test_extra_fields_are_dropped() {
    let child = Profile {
        name:   "child".to_owned(),
        scores: BTreeMap::new(),
        tags:   vec!["x".to_owned()],
        parent: Some(Box::new(Profile {
            name:   "root".to_owned(),
            scores: BTreeMap::new(),
            tags:   vec![],
            parent: None,
        })),
    };
    let bytes = encode(&child).unwrap();
    assert_eq!(decode_value(&bytes).unwrap().len(), 4);

    let back: Profile = decode(&bytes).unwrap();
    assert_eq!(back.name, "child");
    assert_eq!(back.tags, ["x"]);
    assert_eq!(back.parent, None);
}

#[test]
fn test_schema_drop() {
    let bytes = encode(&Abc { a: 1, b: "two".to_owned(), c: true }).unwrap();
    assert_eq!(decode::<Ac>(&bytes).unwrap(), Ac { a: 1, c: true });
}

#[test]
fn test_missing_field() {
    let bytes = encode(&RecordBuilder::new().field("A", &1i64).unwrap().build()).unwrap();
    match decode::<Ac>(&bytes) {
        Err(GbinError::MissingField { field, record, path }) => {
            assert_eq!(field, "C");
            assert_eq!(record, "Ac");
            assert_eq!(path, "/record(Ac)/field[C]/");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_heterogeneous_list() {
    let bytes = encode(&Value::List(vec![Value::Int(1), Value::from("two")])).unwrap();
    match decode_value(&bytes) {
        Err(GbinError::InconsistentContainer { expected, found, .. }) => {
            assert_eq!(expected, Kind::Int);
            assert_eq!(found, Kind::String);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_dynamic_fields() {
    // A map of records whose "B" field holds values of differing kinds.
    let entry = |a: &str, b: Value| {
        RecordBuilder::new()
            .field("A", a)
            .and_then(|r| r.field("B", &Dynamic(b)))
            .map(RecordBuilder::build)
            .unwrap()
    };
    let mut data = BTreeMap::new();
    data.insert("a".to_owned(), entry("ma", Value::Int(67)));
    data.insert("b".to_owned(), entry("foo", Value::from("bar")));

    let bytes = encode(&data).unwrap();
    let back: BTreeMap<String, Value> = decode(&bytes).unwrap();
    let b = back.get("b").and_then(|v| v.get("B")).unwrap();
    assert_eq!(b.inner(), Some(&Value::from("bar")));

    // Without the dynamic wrapper the same map is heterogeneous.
    let bare = Value::Map(vec![
        (Value::from("a"), Value::Int(67)),
        (Value::from("b"), Value::from("bar")),
    ]);
    let bytes = encode(&bare).unwrap();
    assert!(matches!(
        decode_value(&bytes),
        Err(GbinError::InconsistentContainer { .. })
    ));
}

#[test]
fn test_raw_values_keep_dynamic_wrappers() {
    let items = vec![
        Value::Dynamic(Box::new(Value::Int(1))),
        Value::Dynamic(Box::new(Value::from("s"))),
    ];
    let bytes = encode(&items).unwrap();
    let back: Vec<Value> = decode(&bytes).unwrap();
    assert_eq!(back, items);

    // The decoded values encode to the same bytes again.
    assert_eq!(encode(&back).unwrap(), bytes);
    let again: Vec<Value> = decode(&encode(&back).unwrap()).unwrap();
    assert_eq!(again, items);

    let root = Value::Dynamic(Box::new(Value::Int(5)));
    let back: Value = decode(&encode(&root).unwrap()).unwrap();
    assert_eq!(back, root);
}

#[test]
fn test_numeric_boundary() {
    let bytes = encode(&300i64).unwrap();
    for result in [decode::<u8>(&bytes).map(i64::from), decode::<i8>(&bytes).map(i64::from)] {
        match result {
            Err(GbinError::UnsafeNumericNarrowing { value, .. }) => assert_eq!(value, "300"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
    assert_eq!(decode::<i64>(&bytes).unwrap(), 300);
    assert_eq!(decode::<u16>(&bytes).unwrap(), 300);

    let bytes = encode(&-1i64).unwrap();
    assert!(decode::<u32>(&bytes).is_err());
    assert_eq!(decode::<u64>(&bytes).unwrap(), u64::MAX);

    let bytes = encode(&0.1f64).unwrap();
    assert!(decode::<f32>(&bytes).is_err());
    assert_eq!(decode::<f64>(&bytes).unwrap(), 0.1);
}

#[test]
fn test_absent_reference() {
    let data: Vec<Option<u8>> = vec![Some(1), None];
    match encode(&data) {
        Err(GbinError::UnsupportedKind { kind, path }) => {
            assert_eq!(kind, "absent reference");
            assert_eq!(path, "/list/el1/");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_truncation() {
    let bytes = encode(&vec![Box::new(1i32), Box::new(2)]).unwrap();
    match decode::<Vec<Box<i32>>>(&bytes[..bytes.len() - 1]) {
        Err(GbinError::TruncatedFrame { .. }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>()
            .prop_filter("NaN never compares equal", |x| !x.is_nan())
            .prop_map(Value::Float),
        ".{0,12}".prop_map(Value::String),
    ]
}

// Homogeneous trees: every list or map repeats the shape of its first element.
fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (inner.clone(), 0..4usize).prop_map(|(v, n)| Value::List(vec![v; n])),
            (arb_scalar(), inner.clone(), 0..3usize).prop_map(|(k, v, n)| Value::Map(vec![(k, v); n])),
            prop::collection::vec(("[a-z]{1,6}", inner.clone()), 0..4).prop_map(Value::Record),
            inner.clone().prop_map(|v| Value::Reference(Box::new(v))),
            inner.prop_map(|v| match v {
                Value::Dynamic(_) => v,
                v => Value::Dynamic(Box::new(v)),
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_value_round_trip(value in arb_value()) {
        let bytes = encode(&value).unwrap();
        prop_assert_eq!(decode_value(&bytes).unwrap(), value);
    }

    #[test]
    fn prop_raw_value_target_round_trip(value in arb_value()) {
        let bytes = encode(&value).unwrap();
        let back: Value = decode(&bytes).unwrap();
        prop_assert_eq!(encode(&back).unwrap(), bytes);
        prop_assert_eq!(back, value);
    }

    #[test]
    fn prop_truncated_buffers_fail(value in arb_value()) {
        let bytes = encode(&value).unwrap();
        let result = decode_value(&bytes[..bytes.len() - 1]);
        prop_assert!(matches!(result, Err(GbinError::TruncatedFrame { .. })), "{:?}", result);
    }

    #[test]
    fn prop_integers_fit_their_width(n in any::<i64>()) {
        let bytes = encode(&n).unwrap();
        prop_assert_eq!(decode::<i8>(&bytes).is_ok(), i8::try_from(n).is_ok());
        prop_assert_eq!(decode::<u16>(&bytes).is_ok(), u16::try_from(n).is_ok());
        prop_assert_eq!(decode::<i32>(&bytes).is_ok(), i32::try_from(n).is_ok());
        prop_assert_eq!(decode::<u64>(&bytes).unwrap(), n as u64);
    }

    #[test]
    fn prop_string_lists(items in prop::collection::vec(".{0,8}", 0..8)) {
        let bytes = encode(&items).unwrap();
        prop_assert_eq!(decode::<Vec<String>>(&bytes).unwrap(), items);
    }
}
