//! This is a Rust library with the building blocks of the gbin
//! serialization format: the frame layout, the byte buffers used to read and
//! write frames, the dynamic [Value] tree produced by decoding, and the
//! target [Schema] a decoded tree is reconciled against.
//!
//! Every frame is `[1-byte kind][7-byte big-endian length][payload]`:
//!
//! ```
//! use gbin_schema::*;
//!
//! let mut bb = ByteBufferMut::new();
//! let start = bb.begin_frame(Kind::Int);
//! bb.write_i64(300);
//! bb.end_frame(start, MAX_PAYLOAD_LEN).unwrap();
//! assert_eq!(bb.data(), [2, 0, 0, 0, 0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 1, 44]);
//! ```

pub mod bb;
pub mod kind;
pub mod schema;
pub mod value;

pub use bb::*;
pub use kind::*;
pub use schema::*;
pub use value::*;

/// Version of the kind enumeration. Reordering or renumbering kinds breaks
/// every buffer written before, so any such change must bump this.
pub const FORMAT_VERSION: u8 = 1;

/// Size of a frame header: one kind byte followed by the payload length.
pub const HEADER_LEN: usize = 8;

/// Width of the big-endian payload length field.
pub const LENGTH_BYTES: usize = 7;

/// Largest payload the 7-byte length field can describe.
pub const MAX_FRAME_LEN: u64 = (1 << 56) - 1;

/// Default ceiling on a single frame payload (about 256MB).
pub const MAX_PAYLOAD_LEN: u64 = 0x0FFF_FFFF;
