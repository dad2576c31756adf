use gbin_schema::{BufferError, ByteBufferMut, Kind, Value};
use tracing::{debug, trace};

use crate::{
    config::Config,
    error::GbinError,
    trace::{key_label, Segment, Trace},
};

/// Depth-first writer turning a [Value] into framed bytes.
///
/// An encoder is built per top-level call and owns its path trace, so
/// independent calls never share mutable state.
pub struct Encoder<'c> {
    config: &'c Config,
    trace:  Trace,
    depth:  usize,
}

impl<'c> Encoder<'c> {
    pub fn new(config: &'c Config) -> Encoder<'c> {
        Encoder { config, trace: Trace::new(), depth: 0 }
    }

    /// Encodes `value` into a fresh buffer.
    pub fn encode(mut self, value: &Value) -> Result<Vec<u8>, GbinError> {
        let mut bb = ByteBufferMut::new();
        if let Err(err) = self.encode_bb(value, &mut bb) {
            debug!(error = %err, "gbin encode failed");
            return Err(err);
        }
        let data = bb.data();
        debug!(root = %value.kind(), bytes = data.len(), "encoded gbin value");
        Ok(data)
    }

    /// Encodes `value` to the end of `bb`. This is mainly useful as a helper
    /// routine for [encode](#method.encode), which you probably want to use
    /// instead. On failure the encoder's path and depth are reset to where
    /// they were on entry, so it can be reused.
    pub fn encode_bb(&mut self, value: &Value, bb: &mut ByteBufferMut) -> Result<(), GbinError> {
        let (segments, depth) = (self.trace.depth(), self.depth);
        let result = self.write_value(value, bb);
        if result.is_err() {
            self.trace.truncate(segments);
            self.depth = depth;
        }
        result
    }

    fn write_value(&mut self, value: &Value, bb: &mut ByteBufferMut) -> Result<(), GbinError> {
        match *value {
            Value::Bool(b) => self.frame(Kind::Bool, bb, |_, bb| {
                bb.write_bool(b);
                Ok(())
            }),

            Value::Int(i) => self.frame(Kind::Int, bb, |_, bb| {
                bb.write_i64(i);
                Ok(())
            }),

            Value::Float(x) => self.frame(Kind::Float, bb, |_, bb| {
                bb.write_f64(x);
                Ok(())
            }),

            Value::String(ref s) => self.encode_str(s, bb),

            // PAYLOAD: ENCODED FIELD NAME, ENCODED VALUE
            Value::Record(ref fields) => self.container(Kind::Record, bb, |enc, bb| {
                for (name, field) in fields {
                    enc.trace.push(Segment::Field(name.clone()));
                    enc.encode_str(name, bb)?;
                    enc.write_value(field, bb)?;
                    enc.trace.pop();
                }
                Ok(())
            }),

            // PAYLOAD: ENCODED KEY, ENCODED VALUE
            Value::Map(ref entries) => self.container(Kind::Map, bb, |enc, bb| {
                enc.trace.push(Segment::Map);
                for (key, entry) in entries {
                    let label = key_label(key);
                    enc.trace.push(Segment::Key(label.clone()));
                    enc.write_value(key, bb)?;
                    enc.trace.pop();
                    enc.trace.push(Segment::Val(label));
                    enc.write_value(entry, bb)?;
                    enc.trace.pop();
                }
                enc.trace.pop();
                Ok(())
            }),

            // PAYLOAD: ENCODED ELEMENTS IN ORDER
            Value::List(ref items) => self.container(Kind::List, bb, |enc, bb| {
                enc.trace.push(Segment::List);
                for (i, item) in items.iter().enumerate() {
                    enc.trace.push(Segment::Element(i));
                    enc.write_value(item, bb)?;
                    enc.trace.pop();
                }
                enc.trace.pop();
                Ok(())
            }),

            // PAYLOAD: ENCODED VALUE POINTED AT
            Value::Reference(ref inner) => self.container(Kind::Reference, bb, |enc, bb| {
                enc.trace.push(Segment::Reference);
                enc.write_value(inner, bb)?;
                enc.trace.pop();
                Ok(())
            }),

            // PAYLOAD: ONE ENCODED VALUE OF ANY KIND
            Value::Dynamic(ref inner) => {
                if let Value::Dynamic(_) = **inner {
                    return Err(GbinError::UnsupportedKind {
                        kind: "nested dynamic value".to_owned(),
                        path: self.trace.render(),
                    });
                }
                self.container(Kind::Dynamic, bb, |enc, bb| {
                    enc.trace.push(Segment::Dynamic);
                    enc.write_value(inner, bb)?;
                    enc.trace.pop();
                    Ok(())
                })
            }
        }
    }

    // PAYLOAD: RAW UTF-8 BYTES
    fn encode_str(&mut self, s: &str, bb: &mut ByteBufferMut) -> Result<(), GbinError> {
        self.frame(Kind::String, bb, |_, bb| {
            bb.write_bytes(s.as_bytes());
            Ok(())
        })
    }

    fn container<F>(&mut self, kind: Kind, bb: &mut ByteBufferMut, body: F) -> Result<(), GbinError>
    where
        F: FnOnce(&mut Self, &mut ByteBufferMut) -> Result<(), GbinError>,
    {
        if self.depth >= self.config.depth_limit() {
            return Err(GbinError::DepthLimitExceeded {
                max:  self.config.depth_limit(),
                path: self.trace.render(),
            });
        }
        self.depth += 1;
        self.frame(kind, bb, body)?;
        self.depth -= 1;
        Ok(())
    }

    fn frame<F>(&mut self, kind: Kind, bb: &mut ByteBufferMut, body: F) -> Result<(), GbinError>
    where
        F: FnOnce(&mut Self, &mut ByteBufferMut) -> Result<(), GbinError>,
    {
        let start = bb.begin_frame(kind);
        body(self, bb)?;
        let len = bb
            .end_frame(start, self.config.payload_limit())
            .map_err(|err| buffer_error(err, &self.trace))?;
        trace!(%kind, len, depth = self.depth, "wrote frame");
        Ok(())
    }
}

pub(crate) fn buffer_error(err: BufferError, trace: &Trace) -> GbinError {
    match err {
        BufferError::Truncated { needed, remaining } => GbinError::TruncatedFrame {
            needed,
            remaining,
            path: trace.render(),
        },
        BufferError::PayloadTooLarge { len, max } => GbinError::PayloadTooLarge {
            len,
            max,
            path: trace.render(),
        },
    }
}
