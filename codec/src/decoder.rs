use gbin_schema::{ByteBuffer, Kind, Value};
use tracing::{debug, trace};

use crate::{
    config::Config,
    encoder::buffer_error,
    error::GbinError,
    trace::{key_label, Segment, Trace},
};

/// Depth-first reader reconstructing a [Value] purely from framed bytes.
///
/// The decoder infers every field name and element kind from the stream and
/// never consults a target schema; reconciling the result with a
/// destination type is the [Assigner](crate::Assigner)'s job.
pub struct Decoder<'c> {
    config: &'c Config,
    trace:  Trace,
    depth:  usize,
}

impl<'c> Decoder<'c> {
    pub fn new(config: &'c Config) -> Decoder<'c> {
        Decoder { config, trace: Trace::new(), depth: 0 }
    }

    /// Decodes exactly one root frame from `bytes`.
    pub fn decode(mut self, bytes: &[u8]) -> Result<Value, GbinError> {
        debug!(bytes = bytes.len(), "decoding gbin buffer");
        let mut bb = ByteBuffer::new(bytes);
        let value = match self.decode_bb(&mut bb) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "gbin decode failed");
                return Err(err);
            }
        };
        if !bb.is_empty() && !self.config.is_trailing_allowed() {
            let err = GbinError::TrailingBytes { count: bb.remaining() };
            debug!(error = %err, "gbin decode failed");
            return Err(err);
        }
        debug!(root = %value.kind(), "decoded gbin value");
        Ok(value)
    }

    /// Decodes one frame from `bb` starting at the current index. After this
    /// function returns, the current index will be advanced past the frame.
    /// On failure the decoder's path and depth are reset to where they were
    /// on entry, so it can be reused.
    pub fn decode_bb(&mut self, bb: &mut ByteBuffer) -> Result<Value, GbinError> {
        let (segments, depth) = (self.trace.depth(), self.depth);
        let result = self.read_value(bb);
        if result.is_err() {
            self.trace.truncate(segments);
            self.depth = depth;
        }
        result
    }

    fn read_value(&mut self, bb: &mut ByteBuffer) -> Result<Value, GbinError> {
        let header = bb.read_header().map_err(|err| buffer_error(err, &self.trace))?;
        let kind = Kind::from_code(header.code).ok_or_else(|| GbinError::UnknownKindCode {
            code: header.code,
            path: self.trace.render(),
        })?;
        let max = self.config.payload_limit();
        if header.len > max {
            return Err(GbinError::PayloadTooLarge {
                len: header.len,
                max,
                path: self.trace.render(),
            });
        }
        let payload = bb
            .read_bytes(header.len)
            .map_err(|err| buffer_error(err, &self.trace))?;
        trace!(%kind, len = header.len, depth = self.depth, "read frame");

        let mut inner = ByteBuffer::new(payload);
        match kind {
            Kind::Bool => self.decode_bool(&mut inner),
            Kind::Int => self.fixed_width(kind, &mut inner).map(Value::Int),
            Kind::Float => self
                .fixed_width(kind, &mut inner)
                .map(|bits| Value::Float(f64::from_bits(bits as u64))),
            Kind::String => self.decode_string(payload),
            Kind::Record => self.container(|dec| dec.decode_record(&mut inner)),
            Kind::Map => self.container(|dec| dec.decode_map(&mut inner)),
            Kind::List => self.container(|dec| dec.decode_list(&mut inner)),
            Kind::Reference => self.container(|dec| {
                dec.trace.push(Segment::Reference);
                let value = dec.decode_single(Kind::Reference, &mut inner)?;
                dec.trace.pop();
                Ok(Value::Reference(Box::new(value)))
            }),
            Kind::Dynamic => self.container(|dec| {
                dec.trace.push(Segment::Dynamic);
                let value = dec.decode_single(Kind::Dynamic, &mut inner)?;
                if value.kind() == Kind::Dynamic {
                    return Err(GbinError::UnsupportedKind {
                        kind: "nested dynamic value".to_owned(),
                        path: dec.trace.render(),
                    });
                }
                dec.trace.pop();
                Ok(Value::Dynamic(Box::new(value)))
            }),
        }
    }

    fn container<F>(&mut self, body: F) -> Result<Value, GbinError>
    where
        F: FnOnce(&mut Self) -> Result<Value, GbinError>,
    {
        if self.depth >= self.config.depth_limit() {
            return Err(GbinError::DepthLimitExceeded {
                max:  self.config.depth_limit(),
                path: self.trace.render(),
            });
        }
        self.depth += 1;
        let value = body(self)?;
        self.depth -= 1;
        Ok(value)
    }

    fn invalid(&self, kind: Kind, reason: impl Into<String>) -> GbinError {
        GbinError::InvalidPayload {
            kind,
            reason: reason.into(),
            path: self.trace.render(),
        }
    }

    fn decode_bool(&mut self, bb: &mut ByteBuffer) -> Result<Value, GbinError> {
        if bb.remaining() != 1 {
            return Err(self.invalid(Kind::Bool, format!("expected 1 byte, found {}", bb.remaining())));
        }
        match bb.read_bool().map_err(|err| buffer_error(err, &self.trace))? {
            Some(b) => Ok(Value::Bool(b)),
            None => Err(self.invalid(Kind::Bool, format!("expected 0 or 1, found {}", bb.data()[0]))),
        }
    }

    // Ints and floats share the 8-byte layout; floats are re-read from the bits.
    fn fixed_width(&mut self, kind: Kind, bb: &mut ByteBuffer) -> Result<i64, GbinError> {
        if bb.remaining() != 8 {
            return Err(self.invalid(kind, format!("expected 8 bytes, found {}", bb.remaining())));
        }
        bb.read_i64().map_err(|err| buffer_error(err, &self.trace))
    }

    fn decode_string(&mut self, payload: &[u8]) -> Result<Value, GbinError> {
        match std::str::from_utf8(payload) {
            Ok(s) => Ok(Value::String(s.to_owned())),
            Err(err) => Err(self.invalid(Kind::String, err.to_string())),
        }
    }

    // A wrapper payload is exactly one complete frame.
    fn decode_single(&mut self, kind: Kind, bb: &mut ByteBuffer) -> Result<Value, GbinError> {
        if bb.is_empty() {
            return Err(self.invalid(kind, "payload holds no frame"));
        }
        let value = self.read_value(bb)?;
        if !bb.is_empty() {
            return Err(self.invalid(kind, format!("{} bytes after the wrapped frame", bb.remaining())));
        }
        Ok(value)
    }

    fn decode_record(&mut self, bb: &mut ByteBuffer) -> Result<Value, GbinError> {
        let mut fields = vec![];
        while !bb.is_empty() {
            self.trace.push(Segment::KeyAt(fields.len()));
            let key = self.read_value(bb)?;
            let name = match key {
                Value::String(name) => name,
                other => {
                    return Err(GbinError::InvalidRecordKey {
                        found: other.kind(),
                        path:  self.trace.render(),
                    })
                }
            };
            self.trace.pop();

            self.trace.push(Segment::Field(name.clone()));
            let value = self.read_value(bb)?;
            self.trace.pop();
            fields.push((name, value));
        }
        Ok(Value::Record(fields))
    }

    fn decode_map(&mut self, bb: &mut ByteBuffer) -> Result<Value, GbinError> {
        self.trace.push(Segment::Map);
        let mut entries: Vec<(Value, Value)> = vec![];
        let mut kinds: Option<(Kind, Kind)> = None;
        while !bb.is_empty() {
            self.trace.push(Segment::KeyAt(entries.len()));
            let key = self.read_value(bb)?;
            if let Some((key_kind, _)) = kinds {
                if key.kind() != key_kind {
                    return Err(self.inconsistent(Kind::Map, "key", key_kind, key.kind()));
                }
            }
            self.trace.pop();

            self.trace.push(Segment::Val(key_label(&key)));
            let value = self.read_value(bb)?;
            match kinds {
                None => kinds = Some((key.kind(), value.kind())),
                Some((_, value_kind)) if value.kind() != value_kind => {
                    return Err(self.inconsistent(Kind::Map, "value", value_kind, value.kind()));
                }
                Some(_) => {}
            }
            self.trace.pop();
            entries.push((key, value));
        }
        self.trace.pop();
        Ok(Value::Map(entries))
    }

    fn decode_list(&mut self, bb: &mut ByteBuffer) -> Result<Value, GbinError> {
        self.trace.push(Segment::List);
        let mut items: Vec<Value> = vec![];
        while !bb.is_empty() {
            self.trace.push(Segment::Element(items.len()));
            let item = self.read_value(bb)?;
            if let Some(first) = items.first() {
                if first.kind() != item.kind() {
                    return Err(self.inconsistent(Kind::List, "element", first.kind(), item.kind()));
                }
            }
            self.trace.pop();
            items.push(item);
        }
        self.trace.pop();
        Ok(Value::List(items))
    }

    fn inconsistent(&self, container: Kind, role: &'static str, expected: Kind, found: Kind) -> GbinError {
        GbinError::InconsistentContainer {
            container,
            role,
            expected,
            found,
            path: self.trace.render(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Encoder;

    fn decode(bytes: &[u8]) -> Result<Value, GbinError> {
        Decoder::new(&Config::default()).decode(bytes)
    }

    fn encode(value: &Value) -> Vec<u8> {
        Encoder::new(&Config::default()).encode(value).unwrap()
    }

    #[test]
    fn decode_scalars() {
        assert_eq!(decode(&[4, 0, 0, 0, 0, 0, 0, 1, 0]).unwrap(), Value::Bool(false));
        assert_eq!(
            decode(&[2, 0, 0, 0, 0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 1, 44]).unwrap(),
            Value::Int(300)
        );
        assert_eq!(
            decode(&[1, 0, 0, 0, 0, 0, 0, 8, 63, 224, 0, 0, 0, 0, 0, 0]).unwrap(),
            Value::Float(0.5)
        );
        assert_eq!(
            decode(&[8, 0, 0, 0, 0, 0, 0, 4, 240, 159, 141, 149]).unwrap(),
            Value::from("🍕")
        );
    }

    #[test]
    fn decode_keeps_record_order_and_duplicates() {
        let value = Value::Record(vec![
            ("z".to_owned(), Value::Int(1)),
            ("a".to_owned(), Value::Int(2)),
            ("z".to_owned(), Value::Int(3)),
        ]);
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn decode_empty_containers() {
        let list = decode(&[0x10, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(list, Value::List(vec![]));
        assert_eq!(list.element_kind(), None);
        assert_eq!(decode(&[0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(), Value::Map(vec![]));
    }

    #[test]
    fn heterogeneous_list_is_rejected() {
        let bytes = encode(&Value::List(vec![Value::Int(1), Value::from("two")]));
        match decode(&bytes) {
            Err(GbinError::InconsistentContainer { container, role, expected, found, path }) => {
                assert_eq!(container, Kind::List);
                assert_eq!(role, "element");
                assert_eq!(expected, Kind::Int);
                assert_eq!(found, Kind::String);
                assert_eq!(path, "/list/el1/");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn heterogeneous_map_is_rejected() {
        let bytes = encode(&Value::Map(vec![
            (Value::from("a"), Value::Int(1)),
            (Value::from("b"), Value::Bool(true)),
        ]));
        match decode(&bytes) {
            Err(GbinError::InconsistentContainer { role, expected, found, path, .. }) => {
                assert_eq!(role, "value");
                assert_eq!(expected, Kind::Int);
                assert_eq!(found, Kind::Bool);
                assert_eq!(path, "/map/val[b]/");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let bytes = encode(&Value::Map(vec![
            (Value::from("a"), Value::Int(1)),
            (Value::Int(2), Value::Int(1)),
        ]));
        match decode(&bytes) {
            Err(GbinError::InconsistentContainer { role, expected, found, path, .. }) => {
                assert_eq!(role, "key");
                assert_eq!(expected, Kind::String);
                assert_eq!(found, Kind::Int);
                assert_eq!(path, "/map/key1/");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn dynamic_elements_may_differ() {
        let value = Value::List(vec![
            Value::Dynamic(Box::new(Value::Int(67))),
            Value::Dynamic(Box::new(Value::from("bar"))),
        ]);
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn record_key_must_be_string() {
        let mut bytes = vec![0x40, 0, 0, 0, 0, 0, 0, 18];
        bytes.extend(encode(&Value::Bool(true)));
        bytes.extend(encode(&Value::Bool(false)));
        match decode(&bytes) {
            Err(GbinError::InvalidRecordKey { found, path }) => {
                assert_eq!(found, Kind::Bool);
                assert_eq!(path, "/key0/");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_code() {
        match decode(&[3, 0, 0, 0, 0, 0, 0, 0]) {
            Err(GbinError::UnknownKindCode { code, .. }) => assert_eq!(code, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn invalid_scalar_payloads() {
        assert!(matches!(
            decode(&[4, 0, 0, 0, 0, 0, 0, 1, 2]),
            Err(GbinError::InvalidPayload { kind: Kind::Bool, .. })
        ));
        assert!(matches!(
            decode(&[4, 0, 0, 0, 0, 0, 0, 2, 1, 1]),
            Err(GbinError::InvalidPayload { kind: Kind::Bool, .. })
        ));
        assert!(matches!(
            decode(&[2, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 1]),
            Err(GbinError::InvalidPayload { kind: Kind::Int, .. })
        ));
        assert!(matches!(
            decode(&[8, 0, 0, 0, 0, 0, 0, 2, 0xC3, 0x28]),
            Err(GbinError::InvalidPayload { kind: Kind::String, .. })
        ));
        assert!(matches!(
            decode(&[0x20, 0, 0, 0, 0, 0, 0, 0]),
            Err(GbinError::InvalidPayload { kind: Kind::Reference, .. })
        ));
    }

    #[test]
    fn reference_with_trailing_payload() {
        let mut payload = encode(&Value::Int(1));
        payload.extend(encode(&Value::Int(2)));
        let mut bytes = vec![0x20, 0, 0, 0, 0, 0, 0, payload.len() as u8];
        bytes.extend(payload);
        assert!(matches!(
            decode(&bytes),
            Err(GbinError::InvalidPayload { kind: Kind::Reference, .. })
        ));
    }

    #[test]
    fn nested_dynamic_is_rejected() {
        let inner = encode(&Value::Dynamic(Box::new(Value::Int(1))));
        let mut bytes = vec![0xFF, 0, 0, 0, 0, 0, 0, inner.len() as u8];
        bytes.extend(inner);
        match decode(&bytes) {
            Err(GbinError::UnsupportedKind { kind, path }) => {
                assert_eq!(kind, "nested dynamic value");
                assert_eq!(path, "/dyn/");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn truncated_buffers() {
        let bytes = encode(&Value::Record(vec![(
            "names".to_owned(),
            Value::List(vec![Value::from("a"), Value::from("b")]),
        )]));
        for cut in 0..bytes.len() {
            match decode(&bytes[..cut]) {
                Err(GbinError::TruncatedFrame { .. }) => {}
                other => panic!("cut at {} gave {:?}", cut, other),
            }
        }
    }

    #[test]
    fn declared_length_over_limit() {
        let config = Config::new().max_payload_len(4);
        let bytes = [8, 0, 0, 0, 0, 0, 0, 5, b'a', b'b', b'c', b'd', b'e'];
        assert!(matches!(
            Decoder::new(&config).decode(&bytes),
            Err(GbinError::PayloadTooLarge { len: 5, max: 4, .. })
        ));

        // A huge declared length is rejected without allocating.
        let bytes = [8, 255, 255, 255, 255, 255, 255, 255];
        assert!(matches!(decode(&bytes), Err(GbinError::PayloadTooLarge { .. })));
    }

    #[test]
    fn depth_limit() {
        let mut value = Value::Int(0);
        for _ in 0..10 {
            value = Value::List(vec![value]);
        }
        let bytes = encode(&value);
        let config = Config::new().max_depth(5);
        assert!(matches!(
            Decoder::new(&config).decode(&bytes),
            Err(GbinError::DepthLimitExceeded { max: 5, .. })
        ));
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn trailing_bytes() {
        let mut bytes = encode(&Value::Int(1));
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(GbinError::TrailingBytes { count: 1 })));

        let config = Config::new().allow_trailing_bytes(true);
        assert_eq!(Decoder::new(&config).decode(&bytes).unwrap(), Value::Int(1));
    }

    #[test]
    fn payload_at_limit_is_accepted() {
        let config = Config::new().max_payload_len(5);
        let bytes = [8, 0, 0, 0, 0, 0, 0, 5, b'a', b'b', b'c', b'd', b'e'];
        assert_eq!(Decoder::new(&config).decode(&bytes).unwrap(), Value::from("abcde"));
    }

    #[test]
    fn decoder_is_reusable_after_error() {
        let config = Config::new().max_depth(2);
        let mut decoder = Decoder::new(&config);

        let bad = encode(&Value::List(vec![Value::Reference(Box::new(Value::Reference(
            Box::new(Value::Int(1)),
        )))]));
        let err = decoder.decode_bb(&mut ByteBuffer::new(&bad)).unwrap_err();
        assert_eq!(err.path(), Some("/list/el0/ref/"));

        let mixed = encode(&Value::List(vec![Value::Int(1), Value::Bool(true)]));
        let err = decoder.decode_bb(&mut ByteBuffer::new(&mixed)).unwrap_err();
        assert_eq!(err.path(), Some("/list/el1/"));

        let good = encode(&Value::Reference(Box::new(Value::Int(3))));
        assert_eq!(
            decoder.decode_bb(&mut ByteBuffer::new(&good)).unwrap(),
            Value::Reference(Box::new(Value::Int(3)))
        );
    }
}
