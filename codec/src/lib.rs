//! gbin-codec
//!
//! This crate implements:
//!  1) The `Encoder`, writing a dynamic `Value` as nested frames,
//!  2) The `Decoder`, rebuilding a `Value` from bytes alone,
//!  3) The `Assigner`, reconciling a decoded `Value` with a target `Schema`,
//!  4) The `ToGbin` / `FromGbin` traits mapping Rust types onto values,
//!  5) Error types (`GbinError`), path traces and the shared `Config`.

pub mod assigner;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod trace;
pub mod traits;

pub use assigner::Assigner;
pub use config::Config;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::GbinError;
pub use trace::{Segment, Trace};
pub use traits::{record_schema, Dynamic, FromGbin, RecordBuilder, RecordReader, ToGbin};

use gbin_schema::{Schema, Value};

/// Encode `value` with the given limits.
pub fn encode(value: &Value, config: &Config) -> Result<Vec<u8>, GbinError> {
    Encoder::new(config).encode(value)
}

/// Decode one root frame into a dynamic tree.
pub fn decode(bytes: &[u8], config: &Config) -> Result<Value, GbinError> {
    Decoder::new(config).decode(bytes)
}

/// Reconcile a decoded tree with `schema`.
pub fn assign(value: &Value, schema: &Schema) -> Result<Value, GbinError> {
    Assigner::new().assign(value, schema)
}
