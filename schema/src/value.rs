use crate::Kind;

use std::fmt;
use std::ops::Index;

/// This type holds dynamic gbin data.
///
/// A Value is what the decoder reconstructs from bytes alone: field names,
/// element kinds and nesting all come from the stream. Records keep their
/// fields in the order they were encountered and do not enforce unique
/// names; lists and maps are homogeneous once decoded, but a Value built by
/// hand is only checked when it is encoded.
#[derive(Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Record(Vec<(String, Value)>),
    Reference(Box<Value>),
    Dynamic(Box<Value>),
}

impl Value {
    /// The frame kind this value encodes to.
    pub fn kind(&self) -> Kind {
        match *self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Record(_) => Kind::Record,
            Value::Reference(_) => Kind::Reference,
            Value::Dynamic(_) => Kind::Dynamic,
        }
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// A convenience method to extract the value out of an [Int](#variant.Int).
    /// Returns `0` for other value kinds.
    pub fn as_int(&self) -> i64 {
        match *self {
            Value::Int(value) => value,
            _ => 0,
        }
    }

    /// A convenience method to extract the value out of a [Float](#variant.Float).
    /// Returns `0.0` for other value kinds.
    pub fn as_float(&self) -> f64 {
        match *self {
            Value::Float(value) => value,
            _ => 0.0,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String).
    /// Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to get the elements out of a [List](#variant.List).
    /// Returns an empty slice for other value kinds.
    pub fn as_list(&self) -> &[Value] {
        match *self {
            Value::List(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to get the entries out of a [Map](#variant.Map).
    /// Returns an empty slice for other value kinds.
    pub fn as_map(&self) -> &[(Value, Value)] {
        match *self {
            Value::Map(ref entries) => entries.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to get the fields out of a [Record](#variant.Record).
    /// Returns an empty slice for other value kinds.
    pub fn as_record(&self) -> &[(String, Value)] {
        match *self {
            Value::Record(ref fields) => fields.as_slice(),
            _ => &[],
        }
    }

    /// Follows a [Reference](#variant.Reference) or [Dynamic](#variant.Dynamic)
    /// wrapper. Returns `None` for other value kinds.
    pub fn inner(&self) -> Option<&Value> {
        match *self {
            Value::Reference(ref inner) | Value::Dynamic(ref inner) => Some(inner),
            _ => None,
        }
    }

    /// Number of elements, entries or fields. Returns `0` for scalars and
    /// wrappers.
    pub fn len(&self) -> usize {
        match *self {
            Value::List(ref values) => values.len(),
            Value::Map(ref entries) => entries.len(),
            Value::Record(ref fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The kind shared by every element of a [List](#variant.List), taken from
    /// its first element. `None` for empty lists and other value kinds.
    pub fn element_kind(&self) -> Option<Kind> {
        self.as_list().first().map(Value::kind)
    }

    /// The key and value kinds of a [Map](#variant.Map), taken from its first
    /// entry. `None` for empty maps and other value kinds.
    pub fn entry_kinds(&self) -> Option<(Kind, Kind)> {
        self.as_map().first().map(|(k, v)| (k.kind(), v.kind()))
    }

    /// A convenience method to append to a [List](#variant.List). Does
    /// nothing for other value kinds.
    pub fn push(&mut self, value: Value) {
        if let Value::List(ref mut values) = *self {
            values.push(value);
        }
    }

    /// A convenience method to extract a field out of a [Record](#variant.Record).
    /// Returns the first field with that name, or `None` for other value kinds
    /// or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_record()
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// A convenience method to update a field on a [Record](#variant.Record).
    /// Replaces the first field with that name, or appends a new one. Does
    /// nothing for other value kinds.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Record(ref mut fields) = *self {
            match fields.iter_mut().find(|(field, _)| field == name) {
                Some(slot) => slot.1 = value,
                None => fields.push((name.to_owned(), value)),
            }
        }
    }

    /// A convenience method to remove every field with that name from a
    /// [Record](#variant.Record). Does nothing for other value kinds.
    pub fn remove(&mut self, name: &str) {
        if let Value::Record(ref mut fields) = *self {
            fields.retain(|(field, _)| field != name);
        }
    }

    /// Looks up an entry of a [Map](#variant.Map) by key.
    pub fn lookup(&self, key: &Value) -> Option<&Value> {
        self.as_map()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't a [List](#variant.List) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::List(ref values) => &values[index],
            _ => panic!("cannot index into a {} value", self.kind()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Bool(value) => value.fmt(f),
            Value::Int(value) => value.fmt(f),
            Value::Float(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::List(ref values) => values.fmt(f),
            Value::Reference(ref inner) => write!(f, "&{:?}", inner),
            Value::Dynamic(ref inner) => write!(f, "dyn {:?}", inner),

            Value::Map(ref entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?} => {:?}", key, value)?;
                }
                write!(f, "}}")
            }

            Value::Record(ref fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
