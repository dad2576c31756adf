use std::fmt;

use serde::Serialize;

/// The kind byte that opens every frame.
///
/// The numeric codes are the compatibility contract between independently
/// built encoders and decoders.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Kind {
    Float     = 0x01,
    Int       = 0x02,
    Bool      = 0x04,
    String    = 0x08,
    List      = 0x10,
    Reference = 0x20,
    Record    = 0x40,
    Map       = 0x80,
    Dynamic   = 0xFF,
}

impl Kind {
    pub const ALL: [Kind; 9] = [
        Kind::Float,
        Kind::Int,
        Kind::Bool,
        Kind::String,
        Kind::List,
        Kind::Reference,
        Kind::Record,
        Kind::Map,
        Kind::Dynamic,
    ];

    #[inline(always)]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_code(code: u8) -> Option<Kind> {
        match code {
            0x01 => Some(Kind::Float),
            0x02 => Some(Kind::Int),
            0x04 => Some(Kind::Bool),
            0x08 => Some(Kind::String),
            0x10 => Some(Kind::List),
            0x20 => Some(Kind::Reference),
            0x40 => Some(Kind::Record),
            0x80 => Some(Kind::Map),
            0xFF => Some(Kind::Dynamic),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Kind::Float => "float",
            Kind::Int => "int",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::List => "list",
            Kind::Reference => "reference",
            Kind::Record => "record",
            Kind::Map => "map",
            Kind::Dynamic => "dynamic",
        }
    }

    /// Container payloads are concatenations of child frames.
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Kind::List | Kind::Reference | Kind::Record | Kind::Map | Kind::Dynamic
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn kind_codes_round_trip() {
    for kind in Kind::ALL {
        assert_eq!(Kind::from_code(kind.code()), Some(kind));
    }
    assert_eq!(Kind::from_code(0), None);
    assert_eq!(Kind::from_code(3), None);
    assert_eq!(Kind::from_code(0xFE), None);
}

#[test]
fn kind_codes_are_stable() {
    let codes: Vec<u8> = Kind::ALL.iter().map(|k| k.code()).collect();
    assert_eq!(codes, [1, 2, 4, 8, 16, 32, 64, 128, 255]);
}

#[test]
fn kind_containers() {
    assert!(Kind::Record.is_container());
    assert!(Kind::Dynamic.is_container());
    assert!(!Kind::String.is_container());
    assert!(!Kind::Int.is_container());
}
