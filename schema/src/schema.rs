use crate::Kind;

use serde::Serialize;
use std::fmt;

/// Integer widths a target schema can ask for.
///
/// On the wire every integer is 64 bits wide; the width only matters when a
/// decoded value is assigned to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IntWidth {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntWidth {
    /// Precedence of the width. Signed and unsigned widths of the same size
    /// share a rank.
    pub const fn rank(self) -> u8 {
        match self {
            IntWidth::I8 | IntWidth::U8 => 1,
            IntWidth::I16 | IntWidth::U16 => 2,
            IntWidth::I32 | IntWidth::U32 => 3,
            IntWidth::I64 | IntWidth::U64 => 4,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, IntWidth::I8 | IntWidth::I16 | IntWidth::I32 | IntWidth::I64)
    }

    /// Inclusive range of values the width holds, expressed as `i64`. The
    /// 64-bit widths span the whole `i64` range since they reinterpret bits.
    pub const fn bounds(self) -> (i64, i64) {
        match self {
            IntWidth::I8 => (i8::MIN as i64, i8::MAX as i64),
            IntWidth::U8 => (0, u8::MAX as i64),
            IntWidth::I16 => (i16::MIN as i64, i16::MAX as i64),
            IntWidth::U16 => (0, u16::MAX as i64),
            IntWidth::I32 => (i32::MIN as i64, i32::MAX as i64),
            IntWidth::U32 => (0, u32::MAX as i64),
            IntWidth::I64 | IntWidth::U64 => (i64::MIN, i64::MAX),
        }
    }

    /// Rank of the narrowest width, signed or unsigned, that holds `value`.
    pub const fn precedence_of(value: i64) -> u8 {
        if value >= i8::MIN as i64 && value <= u8::MAX as i64 {
            1
        } else if value >= i16::MIN as i64 && value <= u16::MAX as i64 {
            2
        } else if value >= i32::MIN as i64 && value <= u32::MAX as i64 {
            3
        } else {
            4
        }
    }

    /// Whether `value` can be assigned to this width without losing
    /// information.
    pub const fn fits(self, value: i64) -> bool {
        let (min, max) = self.bounds();
        IntWidth::precedence_of(value) <= self.rank() && value >= min && value <= max
    }

    pub const fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::U8 => "u8",
            IntWidth::I16 => "i16",
            IntWidth::U16 => "u16",
            IntWidth::I32 => "i32",
            IntWidth::U32 => "u32",
            IntWidth::I64 => "i64",
            IntWidth::U64 => "u64",
        }
    }
}

/// Float widths a target schema can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub const fn rank(self) -> u8 {
        match self {
            FloatWidth::F32 => 1,
            FloatWidth::F64 => 2,
        }
    }

    /// Rank of the narrowest width that represents `value` exactly. NaN and
    /// the infinities survive an f32 round trip and rank as f32.
    pub fn precedence_of(value: f64) -> u8 {
        if value.is_nan() || (value as f32) as f64 == value {
            1
        } else {
            2
        }
    }

    pub fn fits(self, value: f64) -> bool {
        FloatWidth::precedence_of(value) <= self.rank()
    }

    pub const fn name(self) -> &'static str {
        match self {
            FloatWidth::F32 => "f32",
            FloatWidth::F64 => "f64",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name:   String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSchema {
    /// Name of the destination type, used only in diagnostics.
    pub name:   String,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> RecordSchema {
        RecordSchema { name: name.into(), fields: vec![] }
    }

    /// Builder-style helper that appends a field.
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> RecordSchema {
        self.fields.push(FieldSchema { name: name.into(), schema });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.schema)
    }
}

/// The statically declared shape a decoded [Value](crate::Value) is
/// reconciled against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Schema {
    Bool,
    Int(IntWidth),
    Float(FloatWidth),
    String,
    List(Box<Schema>),
    Map(Box<Schema>, Box<Schema>),
    Record(RecordSchema),
    Reference(Box<Schema>),
    /// Any single value, kept as decoded.
    Dynamic,
}

impl Schema {
    pub fn list(element: Schema) -> Schema {
        Schema::List(Box::new(element))
    }

    pub fn map(key: Schema, value: Schema) -> Schema {
        Schema::Map(Box::new(key), Box::new(value))
    }

    pub fn reference(inner: Schema) -> Schema {
        Schema::Reference(Box::new(inner))
    }

    /// The frame kind a value of this schema is expected to arrive as.
    pub fn kind(&self) -> Kind {
        match *self {
            Schema::Bool => Kind::Bool,
            Schema::Int(_) => Kind::Int,
            Schema::Float(_) => Kind::Float,
            Schema::String => Kind::String,
            Schema::List(_) => Kind::List,
            Schema::Map(..) => Kind::Map,
            Schema::Record(_) => Kind::Record,
            Schema::Reference(_) => Kind::Reference,
            Schema::Dynamic => Kind::Dynamic,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Schema::Bool => write!(f, "bool"),
            Schema::Int(width) => write!(f, "int({})", width.name()),
            Schema::Float(width) => write!(f, "float({})", width.name()),
            Schema::String => write!(f, "string"),
            Schema::List(ref element) => write!(f, "list<{}>", element),
            Schema::Map(ref key, ref value) => write!(f, "map<{}, {}>", key, value),
            Schema::Record(ref record) => write!(f, "record({})", record.name),
            Schema::Reference(ref inner) => write!(f, "ref<{}>", inner),
            Schema::Dynamic => write!(f, "dynamic"),
        }
    }
}
