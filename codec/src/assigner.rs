use gbin_schema::{FloatWidth, IntWidth, RecordSchema, Schema, Value};
use tracing::debug;

use crate::{
    error::GbinError,
    trace::{key_label, Segment, Trace},
};

/// Reconciles a decoded [Value] against a target [Schema].
///
/// The output conforms to the schema exactly: records carry the target's
/// fields in target order, integers and floats have been checked against the
/// target width, and dynamic wrappers are stripped wherever the target is
/// concrete. A dynamic target takes its node unchanged.
#[derive(Default)]
pub struct Assigner {
    trace: Trace,
}

impl Assigner {
    pub fn new() -> Assigner {
        Assigner::default()
    }

    pub fn assign(mut self, value: &Value, schema: &Schema) -> Result<Value, GbinError> {
        debug!(root = %value.kind(), target = %schema, "assigning gbin value");
        match self.visit(value, schema) {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!(error = %err, "gbin assign failed");
                Err(err)
            }
        }
    }

    fn visit(&mut self, value: &Value, schema: &Schema) -> Result<Value, GbinError> {
        // A dynamic node is transparent to any concrete target.
        if let Value::Dynamic(inner) = value {
            if !matches!(schema, Schema::Dynamic) {
                self.trace.push(Segment::Dynamic);
                let value = self.visit(inner, schema)?;
                self.trace.pop();
                return Ok(value);
            }
        }

        match (schema, value) {
            // Any node already fits; it keeps its own shape.
            (Schema::Dynamic, _) => Ok(value.clone()),

            (Schema::Bool, Value::Bool(_)) | (Schema::String, Value::String(_)) => Ok(value.clone()),

            (Schema::Int(width), Value::Int(i)) => self.visit_int(*i, *width),
            (Schema::Float(width), Value::Float(x)) => self.visit_float(*x, *width),

            (Schema::Record(record), Value::Record(fields)) => self.visit_record(fields, record),

            (Schema::Map(key_schema, value_schema), Value::Map(entries)) => {
                self.trace.push(Segment::Map);
                let mut out = Vec::with_capacity(entries.len());
                for (key, entry) in entries {
                    let label = key_label(key);
                    self.trace.push(Segment::Key(label.clone()));
                    let key = self.visit(key, key_schema)?;
                    self.trace.pop();
                    self.trace.push(Segment::Val(label));
                    let entry = self.visit(entry, value_schema)?;
                    self.trace.pop();
                    out.push((key, entry));
                }
                self.trace.pop();
                Ok(Value::Map(out))
            }

            (Schema::List(element), Value::List(items)) => {
                self.trace.push(Segment::List);
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.trace.push(Segment::Element(i));
                    out.push(self.visit(item, element)?);
                    self.trace.pop();
                }
                self.trace.pop();
                Ok(Value::List(out))
            }

            (Schema::Reference(inner_schema), Value::Reference(inner)) => {
                self.trace.push(Segment::Reference);
                let inner = self.visit(inner, inner_schema)?;
                self.trace.pop();
                Ok(Value::Reference(Box::new(inner)))
            }

            _ => Err(GbinError::SchemaMismatch {
                expected: schema.to_string(),
                found:    value.kind(),
                path:     self.trace.render(),
            }),
        }
    }

    fn visit_record(&mut self, fields: &[(String, Value)], record: &RecordSchema) -> Result<Value, GbinError> {
        self.trace.push(Segment::Record(record.name.clone()));
        let mut out = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            self.trace.push(Segment::Field(field.name.clone()));
            let found = fields.iter().find(|(name, _)| *name == field.name);
            let value = match found {
                Some((_, value)) => self.visit(value, &field.schema)?,
                None => {
                    return Err(GbinError::MissingField {
                        field:  field.name.clone(),
                        record: record.name.clone(),
                        path:   self.trace.render(),
                    })
                }
            };
            self.trace.pop();
            out.push((field.name.clone(), value));
        }
        self.trace.pop();
        Ok(Value::Record(out))
    }

    fn visit_int(&self, value: i64, width: IntWidth) -> Result<Value, GbinError> {
        if width.fits(value) {
            Ok(Value::Int(value))
        } else {
            Err(GbinError::UnsafeNumericNarrowing {
                value:  value.to_string(),
                target: width.name(),
                path:   self.trace.render(),
            })
        }
    }

    fn visit_float(&self, value: f64, width: FloatWidth) -> Result<Value, GbinError> {
        if width.fits(value) {
            Ok(Value::Float(value))
        } else {
            Err(GbinError::UnsafeNumericNarrowing {
                value:  value.to_string(),
                target: width.name(),
                path:   self.trace.render(),
            })
        }
    }
}
