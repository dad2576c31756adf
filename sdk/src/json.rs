//! Conversion between gbin values and JSON documents.
//!
//! Records become objects, lists become arrays and scalars map onto their
//! JSON counterparts. The shapes JSON has no native form for are written as
//! single-key marker objects:
//!
//! | value             | JSON                          |
//! |-------------------|-------------------------------|
//! | map               | `{"$map": [[key, value], ...]}` |
//! | reference         | `{"$ref": value}`             |
//! | dynamic           | `{"$dyn": value}`             |
//! | NaN / infinities  | `{"$float": "NaN"}`           |
//!
//! A record with a single field named like a marker reads back as the
//! marker. JSON objects have unique keys, so a record that repeats a field
//! name keeps only the last value, at the position of the first.

use gbin_codec::{GbinError, Segment, Trace};
use gbin_schema::Value;
use serde_json::{Map, Number, Value as Json};

const MAP: &str = "$map";
const REF: &str = "$ref";
const DYN: &str = "$dyn";
const FLOAT: &str = "$float";

fn marker(key: &str, value: Json) -> Json {
    let mut object = Map::new();
    object.insert(key.to_owned(), value);
    Json::Object(object)
}

pub fn value_to_json(value: &Value) -> Json {
    match *value {
        Value::Bool(b) => Json::Bool(b),
        Value::Int(i) => Json::Number(i.into()),
        Value::Float(x) => match Number::from_f64(x) {
            Some(n) => Json::Number(n),
            None => marker(FLOAT, Json::String(x.to_string())),
        },
        Value::String(ref s) => Json::String(s.clone()),
        Value::List(ref items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Record(ref fields) => {
            let mut object = Map::new();
            for (name, field) in fields {
                object.insert(name.clone(), value_to_json(field));
            }
            Json::Object(object)
        }
        Value::Map(ref entries) => marker(
            MAP,
            Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![value_to_json(k), value_to_json(v)]))
                    .collect(),
            ),
        ),
        Value::Reference(ref inner) => marker(REF, value_to_json(inner)),
        Value::Dynamic(ref inner) => marker(DYN, value_to_json(inner)),
    }
}

pub fn json_to_value(json: &Json) -> Result<Value, GbinError> {
    JsonReader { trace: Trace::new() }.read(json)
}

struct JsonReader {
    trace: Trace,
}

impl JsonReader {
    fn malformed(&self, msg: &str) -> GbinError {
        GbinError::conversion(format!("{} (at {})", msg, self.trace))
    }

    fn read(&mut self, json: &Json) -> Result<Value, GbinError> {
        match json {
            Json::Null => Err(GbinError::UnsupportedKind {
                kind: "null".to_owned(),
                path: self.trace.render(),
            }),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(u) = n.as_u64() {
                    // Above i64::MAX: keep the bits, as a u64 target would.
                    Ok(Value::Int(u as i64))
                } else {
                    n.as_f64()
                        .map(Value::Float)
                        .ok_or_else(|| self.malformed("number out of range"))
                }
            }
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Array(items) => {
                self.trace.push(Segment::List);
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.trace.push(Segment::Element(i));
                    out.push(self.read(item)?);
                    self.trace.pop();
                }
                self.trace.pop();
                Ok(Value::List(out))
            }
            Json::Object(object) => {
                if object.len() == 1 {
                    if let Some((key, inner)) = object.iter().next() {
                        match key.as_str() {
                            MAP => return self.read_map(inner),
                            REF => return self.wrapped(Segment::Reference, inner).map(Value::Reference),
                            DYN => return self.wrapped(Segment::Dynamic, inner).map(Value::Dynamic),
                            FLOAT => return self.read_float(inner),
                            _ => {}
                        }
                    }
                }
                let mut fields = Vec::with_capacity(object.len());
                for (name, field) in object {
                    self.trace.push(Segment::Field(name.clone()));
                    fields.push((name.clone(), self.read(field)?));
                    self.trace.pop();
                }
                Ok(Value::Record(fields))
            }
        }
    }

    fn wrapped(&mut self, segment: Segment, inner: &Json) -> Result<Box<Value>, GbinError> {
        self.trace.push(segment);
        let value = self.read(inner)?;
        self.trace.pop();
        Ok(Box::new(value))
    }

    fn read_float(&self, inner: &Json) -> Result<Value, GbinError> {
        match inner.as_str().map(str::parse::<f64>) {
            Some(Ok(x)) => Ok(Value::Float(x)),
            _ => Err(self.malformed("$float expects \"NaN\", \"inf\" or \"-inf\"")),
        }
    }

    fn read_map(&mut self, inner: &Json) -> Result<Value, GbinError> {
        let pairs = match inner.as_array() {
            Some(pairs) => pairs,
            None => return Err(self.malformed("$map expects an array of [key, value] pairs")),
        };
        self.trace.push(Segment::Map);
        let mut entries = Vec::with_capacity(pairs.len());
        for (i, pair) in pairs.iter().enumerate() {
            self.trace.push(Segment::KeyAt(i));
            let (key, value) = match pair.as_array().map(Vec::as_slice) {
                Some([key, value]) => (key, value),
                _ => return Err(self.malformed("$map entries must be [key, value] pairs")),
            };
            let key = self.read(key)?;
            let value = self.read(value)?;
            self.trace.pop();
            entries.push((key, value));
        }
        self.trace.pop();
        Ok(Value::Map(entries))
    }
}
