use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use gbin_schema::{FloatWidth, IntWidth, RecordSchema, Schema, Value};

use crate::{error::GbinError, trace::Segment};

/// Types that can be turned into a dynamic [Value] for encoding.
pub trait ToGbin {
    fn to_gbin(&self) -> Result<Value, GbinError>;
}

/// Types that can be rebuilt from a decoded [Value].
///
/// `from_gbin` is handed a tree that has already been reconciled against
/// [schema](FromGbin::schema), so record fields are present and numbers are
/// known to fit.
pub trait FromGbin: Sized {
    fn schema() -> Schema;
    fn from_gbin(value: &Value) -> Result<Self, GbinError>;
}

fn unexpected(expected: &str, found: &Value) -> GbinError {
    GbinError::conversion(format!("expected {}, found {}", expected, found.kind()))
}

macro_rules! int_impl {
    ($($t:ty => $width:ident),* $(,)?) => {$(
        impl ToGbin for $t {
            fn to_gbin(&self) -> Result<Value, GbinError> {
                Ok(Value::Int(i64::from(*self)))
            }
        }

        impl FromGbin for $t {
            fn schema() -> Schema {
                Schema::Int(IntWidth::$width)
            }

            fn from_gbin(value: &Value) -> Result<Self, GbinError> {
                match *value {
                    Value::Int(i) => <$t>::try_from(i).map_err(|_| {
                        GbinError::conversion(format!("{} does not fit {}", i, stringify!($t)))
                    }),
                    _ => Err(unexpected("int", value)),
                }
            }
        }
    )*};
}

int_impl! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
}

// The 64-bit unsigned widths travel as the two's complement bits of an i64.
impl ToGbin for u64 {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(Value::Int(*self as i64))
    }
}

impl FromGbin for u64 {
    fn schema() -> Schema {
        Schema::Int(IntWidth::U64)
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::Int(i) => Ok(i as u64),
            _ => Err(unexpected("int", value)),
        }
    }
}

impl ToGbin for usize {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        (*self as u64).to_gbin()
    }
}

impl FromGbin for usize {
    fn schema() -> Schema {
        Schema::Int(IntWidth::U64)
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        let n = u64::from_gbin(value)?;
        usize::try_from(n).map_err(|_| GbinError::conversion(format!("{} does not fit usize", n)))
    }
}

impl ToGbin for isize {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(Value::Int(*self as i64))
    }
}

impl FromGbin for isize {
    fn schema() -> Schema {
        Schema::Int(IntWidth::I64)
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        let n = i64::from_gbin(value)?;
        isize::try_from(n).map_err(|_| GbinError::conversion(format!("{} does not fit isize", n)))
    }
}

impl ToGbin for f32 {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl FromGbin for f32 {
    fn schema() -> Schema {
        Schema::Float(FloatWidth::F32)
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::Float(x) => Ok(x as f32),
            _ => Err(unexpected("float", value)),
        }
    }
}

impl ToGbin for f64 {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(Value::Float(*self))
    }
}

impl FromGbin for f64 {
    fn schema() -> Schema {
        Schema::Float(FloatWidth::F64)
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::Float(x) => Ok(x),
            _ => Err(unexpected("float", value)),
        }
    }
}

impl ToGbin for bool {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(Value::Bool(*self))
    }
}

impl FromGbin for bool {
    fn schema() -> Schema {
        Schema::Bool
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::Bool(b) => Ok(b),
            _ => Err(unexpected("bool", value)),
        }
    }
}

impl ToGbin for str {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(Value::String(self.to_owned()))
    }
}

impl ToGbin for String {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        self.as_str().to_gbin()
    }
}

impl FromGbin for String {
    fn schema() -> Schema {
        Schema::String
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::String(ref s) => Ok(s.clone()),
            _ => Err(unexpected("string", value)),
        }
    }
}

impl<T: ToGbin + ?Sized> ToGbin for &T {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        (**self).to_gbin()
    }
}

impl<T: ToGbin> ToGbin for [T] {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        let mut items = Vec::with_capacity(self.len());
        for (i, item) in self.iter().enumerate() {
            let item = item
                .to_gbin()
                .map_err(|err| err.nested(Segment::Element(i)).nested(Segment::List))?;
            items.push(item);
        }
        Ok(Value::List(items))
    }
}

impl<T: ToGbin> ToGbin for Vec<T> {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        self.as_slice().to_gbin()
    }
}

impl<T: FromGbin> FromGbin for Vec<T> {
    fn schema() -> Schema {
        Schema::list(T::schema())
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::List(ref items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    T::from_gbin(item).map_err(|err| err.nested(Segment::Element(i)).nested(Segment::List))
                })
                .collect(),
            _ => Err(unexpected("list", value)),
        }
    }
}

fn map_to_gbin<'a, K, V, I>(entries: I) -> Result<Value, GbinError>
where
    K: ToGbin + 'a,
    V: ToGbin + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let mut out = vec![];
    for (key, value) in entries {
        let key = key.to_gbin().map_err(|err| err.nested(Segment::Map))?;
        let label = crate::trace::key_label(&key);
        let value = value
            .to_gbin()
            .map_err(|err| err.nested(Segment::Val(label)).nested(Segment::Map))?;
        out.push((key, value));
    }
    Ok(Value::Map(out))
}

fn map_from_gbin<K, V, C>(value: &Value) -> Result<C, GbinError>
where
    K: FromGbin,
    V: FromGbin,
    C: FromIterator<(K, V)>,
{
    match *value {
        Value::Map(ref entries) => entries
            .iter()
            .map(|(key, entry)| {
                let label = crate::trace::key_label(key);
                let k = K::from_gbin(key)
                    .map_err(|err| err.nested(Segment::Key(label.clone())).nested(Segment::Map))?;
                let v = V::from_gbin(entry)
                    .map_err(|err| err.nested(Segment::Val(label)).nested(Segment::Map))?;
                Ok((k, v))
            })
            .collect(),
        _ => Err(unexpected("map", value)),
    }
}

impl<K: ToGbin, V: ToGbin, S> ToGbin for HashMap<K, V, S> {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        map_to_gbin(self.iter())
    }
}

impl<K, V, S> FromGbin for HashMap<K, V, S>
where
    K: FromGbin + Eq + Hash,
    V: FromGbin,
    S: BuildHasher + Default,
{
    fn schema() -> Schema {
        Schema::map(K::schema(), V::schema())
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        map_from_gbin(value)
    }
}

impl<K: ToGbin, V: ToGbin> ToGbin for BTreeMap<K, V> {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        map_to_gbin(self.iter())
    }
}

impl<K: FromGbin + Ord, V: FromGbin> FromGbin for BTreeMap<K, V> {
    fn schema() -> Schema {
        Schema::map(K::schema(), V::schema())
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        map_from_gbin(value)
    }
}

// Owned references encode as a Reference frame around the pointee.
impl<T: ToGbin + ?Sized> ToGbin for Box<T> {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        let inner = (**self).to_gbin().map_err(|err| err.nested(Segment::Reference))?;
        Ok(Value::Reference(Box::new(inner)))
    }
}

impl<T: FromGbin> FromGbin for Box<T> {
    fn schema() -> Schema {
        Schema::reference(T::schema())
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::Reference(ref inner) => T::from_gbin(inner)
                .map(Box::new)
                .map_err(|err| err.nested(Segment::Reference)),
            _ => Err(unexpected("reference", value)),
        }
    }
}

/// `Some` is a present reference. `None` has no frame kind and cannot be
/// encoded.
impl<T: ToGbin> ToGbin for Option<T> {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        match self {
            Some(inner) => {
                let inner = inner.to_gbin().map_err(|err| err.nested(Segment::Reference))?;
                Ok(Value::Reference(Box::new(inner)))
            }
            None => Err(GbinError::UnsupportedKind {
                kind: "absent reference".to_owned(),
                path: "/".to_owned(),
            }),
        }
    }
}

impl<T: FromGbin> FromGbin for Option<T> {
    fn schema() -> Schema {
        Schema::reference(T::schema())
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        Box::<T>::from_gbin(value).map(|inner| Some(*inner))
    }
}

/// A raw [Value] is written as-is and read back through a dynamic target
/// unchanged, dynamic wrappers included, so any shape round-trips.
impl ToGbin for Value {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(self.clone())
    }
}

impl FromGbin for Value {
    fn schema() -> Schema {
        Schema::Dynamic
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        Ok(value.clone())
    }
}

/// A single-level "any" slot. Unlike a bare [Value], it is written inside a
/// dynamic frame so that elements of one list may differ in kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Dynamic(pub Value);

impl ToGbin for Dynamic {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(Value::Dynamic(Box::new(self.0.clone())))
    }
}

impl FromGbin for Dynamic {
    fn schema() -> Schema {
        Schema::Dynamic
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        match *value {
            Value::Dynamic(ref inner) => Ok(Dynamic((**inner).clone())),
            // A node written without a dynamic frame still fills the slot.
            _ => Ok(Dynamic(value.clone())),
        }
    }
}

/// Collects named fields, in order, into a [Value::Record].
///
/// ```
/// use gbin_codec::RecordBuilder;
///
/// let value = RecordBuilder::new()
///     .field("x", &1.5f64).unwrap()
///     .field("label", "origin").unwrap()
///     .build();
/// assert_eq!(value.get("label").map(|v| v.as_string()), Some("origin"));
/// ```
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: Vec<(String, Value)>,
}

impl RecordBuilder {
    pub fn new() -> RecordBuilder {
        RecordBuilder::default()
    }

    pub fn field<T: ToGbin + ?Sized>(mut self, name: &str, value: &T) -> Result<RecordBuilder, GbinError> {
        let value = value
            .to_gbin()
            .map_err(|err| err.nested(Segment::Field(name.to_owned())))?;
        self.fields.push((name.to_owned(), value));
        Ok(self)
    }

    pub fn build(self) -> Value {
        Value::Record(self.fields)
    }
}

/// Reads fields by name out of an assigned [Value::Record].
pub struct RecordReader<'v> {
    record: &'v str,
    value:  &'v Value,
}

impl<'v> RecordReader<'v> {
    /// `record` is the destination type name, used in error paths.
    pub fn new(record: &'v str, value: &'v Value) -> Result<RecordReader<'v>, GbinError> {
        match *value {
            Value::Record(_) => Ok(RecordReader { record, value }),
            _ => Err(unexpected("record", value).nested(Segment::Record(record.to_owned()))),
        }
    }

    pub fn field<T: FromGbin>(&self, name: &str) -> Result<T, GbinError> {
        let result = match self.value.get(name) {
            Some(value) => T::from_gbin(value),
            None => Err(GbinError::MissingField {
                field:  name.to_owned(),
                record: self.record.to_owned(),
                path:   "/".to_owned(),
            }),
        };
        result.map_err(|err| {
            err.nested(Segment::Field(name.to_owned()))
                .nested(Segment::Record(self.record.to_owned()))
        })
    }
}

/// Helper for [FromGbin::schema] implementations of record types.
pub fn record_schema(name: &str, fields: &[(&str, Schema)]) -> Schema {
    let record = fields
        .iter()
        .fold(RecordSchema::new(name), |record, (field, schema)| record.field(*field, schema.clone()));
    Schema::Record(record)
}
