//! gbin
//!
//! This crate is the user-facing entry point for the gbin format.
//!
//! - `encode` / `decode` for any type implementing `ToGbin` / `FromGbin`
//! - Stream variants over `std::io::Write` and `std::io::Read`
//! - A `Gbin` handle carrying a `Config`, plus typed `Encoder<T>` / `Decoder<T>`
//! - A JSON bridge (`json` module, `decode_to_json`)
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! let mut scores = BTreeMap::new();
//! scores.insert("ada".to_owned(), 300i64);
//!
//! let bytes = gbin::encode(&scores).unwrap();
//! let back: BTreeMap<String, i64> = gbin::decode(&bytes).unwrap();
//! assert_eq!(back, scores);
//!
//! // 300 does not fit a u8 target.
//! assert!(gbin::decode::<BTreeMap<String, u8>>(&bytes).is_err());
//! ```

pub mod json;

use std::io::{Read, Write};
use std::marker::PhantomData;

use tracing::debug;

pub use gbin_codec as codec;
pub use gbin_codec::{
    record_schema, Assigner, Config, Dynamic, FromGbin, GbinError, RecordBuilder, RecordReader, ToGbin,
};
pub use gbin_schema::{FieldSchema, FloatWidth, IntWidth, Kind, RecordSchema, Schema, Value};

/// Encode `value` with the default [Config].
pub fn encode<T: ToGbin + ?Sized>(value: &T) -> Result<Vec<u8>, GbinError> {
    Gbin::new().encode(value)
}

/// Decode `bytes` into a `T` with the default [Config].
pub fn decode<T: FromGbin>(bytes: &[u8]) -> Result<T, GbinError> {
    Gbin::new().decode(bytes)
}

/// Decode `bytes` into an untyped [Value] tree.
pub fn decode_value(bytes: &[u8]) -> Result<Value, GbinError> {
    Gbin::new().decode_value(bytes)
}

pub fn encode_to_writer<T: ToGbin + ?Sized, W: Write>(value: &T, writer: W) -> Result<(), GbinError> {
    Gbin::new().encode_to_writer(value, writer)
}

pub fn decode_from_reader<T: FromGbin, R: Read>(reader: R) -> Result<T, GbinError> {
    Gbin::new().decode_from_reader(reader)
}

/// Decode a gbin buffer into a pretty-printed JSON string.
pub fn decode_to_json(bytes: &[u8]) -> Result<String, GbinError> {
    Gbin::new().decode_to_json(bytes)
}

/// A reusable handle owning the [Config] every call is made with.
#[derive(Debug, Clone, Default)]
pub struct Gbin {
    config: Config,
}

impl Gbin {
    pub fn new() -> Gbin {
        Gbin::default()
    }

    pub fn with_config(config: Config) -> Gbin {
        Gbin { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn encode<T: ToGbin + ?Sized>(&self, value: &T) -> Result<Vec<u8>, GbinError> {
        let value = value.to_gbin()?;
        gbin_codec::encode(&value, &self.config)
    }

    /// Decode, reconcile with `T::schema()`, then build the `T`.
    pub fn decode<T: FromGbin>(&self, bytes: &[u8]) -> Result<T, GbinError> {
        let value = gbin_codec::decode(bytes, &self.config)?;
        let schema = T::schema();
        debug!(target_type = std::any::type_name::<T>(), %schema, "decoding typed gbin value");
        let assigned = Assigner::new().assign(&value, &schema)?;
        T::from_gbin(&assigned)
    }

    pub fn decode_value(&self, bytes: &[u8]) -> Result<Value, GbinError> {
        gbin_codec::decode(bytes, &self.config)
    }

    pub fn encode_to_writer<T: ToGbin + ?Sized, W: Write>(&self, value: &T, mut writer: W) -> Result<(), GbinError> {
        let bytes = self.encode(value)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads the whole stream before decoding; a frame is only valid once
    /// its full payload is present.
    pub fn decode_from_reader<T: FromGbin, R: Read>(&self, mut reader: R) -> Result<T, GbinError> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes)?;
        self.decode(&bytes)
    }

    pub fn decode_to_json(&self, bytes: &[u8]) -> Result<String, GbinError> {
        let value = self.decode_value(bytes)?;
        Ok(serde_json::to_string_pretty(&json::value_to_json(&value))?)
    }
}

/// Typed encoder bound to a single source type.
pub struct Encoder<T: ?Sized> {
    gbin:    Gbin,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ToGbin + ?Sized> Encoder<T> {
    pub fn new() -> Encoder<T> {
        Encoder::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Encoder<T> {
        Encoder { gbin: Gbin::with_config(config), _marker: PhantomData }
    }

    pub fn encode(&self, value: &T) -> Result<Vec<u8>, GbinError> {
        self.gbin.encode(value)
    }

    pub fn encode_to_writer<W: Write>(&self, value: &T, writer: W) -> Result<(), GbinError> {
        self.gbin.encode_to_writer(value, writer)
    }
}

impl<T: ToGbin + ?Sized> Default for Encoder<T> {
    fn default() -> Self {
        Encoder::new()
    }
}

/// Typed decoder bound to a single destination type.
pub struct Decoder<T> {
    gbin:    Gbin,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromGbin> Decoder<T> {
    pub fn new() -> Decoder<T> {
        Decoder::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Decoder<T> {
        Decoder { gbin: Gbin::with_config(config), _marker: PhantomData }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<T, GbinError> {
        self.gbin.decode(bytes)
    }

    pub fn decode_from_reader<R: Read>(&self, reader: R) -> Result<T, GbinError> {
        self.gbin.decode_from_reader(reader)
    }
}

impl<T: FromGbin> Default for Decoder<T> {
    fn default() -> Self {
        Decoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn typed_handles() {
        let encoder = Encoder::<Vec<String>>::new();
        let decoder = Decoder::<Vec<String>>::new();
        let names = vec!["a".to_owned(), "é".to_owned()];
        let bytes = encoder.encode(&names).unwrap();
        assert_eq!(decoder.decode(&bytes).unwrap(), names);
    }

    #[test]
    fn streams() {
        let mut out = vec![];
        encode_to_writer(&vec![1u16, 2, 3], &mut out).unwrap();
        let back: Vec<u16> = decode_from_reader(out.as_slice()).unwrap();
        assert_eq!(back, [1, 2, 3]);
    }

    #[test]
    fn handle_uses_its_config() {
        let gbin = Gbin::with_config(Config::new().max_depth(1));
        let nested = vec![vec![1i32]];
        assert!(matches!(
            gbin.encode(&nested),
            Err(GbinError::DepthLimitExceeded { max: 1, .. })
        ));
        assert_eq!(gbin.config().depth_limit(), 1);
    }

    #[test]
    fn json_output() {
        let bytes = encode(&vec![true, false]).unwrap();
        assert_eq!(decode_to_json(&bytes).unwrap(), "[\n  true,\n  false\n]");
    }

    #[test]
    #[traced_test]
    fn typed_decode_is_logged() {
        let bytes = encode(&7u8).unwrap();
        assert_eq!(decode::<u8>(&bytes).unwrap(), 7);
        assert!(logs_contain("decoding typed gbin value"));
        assert!(logs_contain("int(u8)"));
    }
}
