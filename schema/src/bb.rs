use thiserror::Error;

use crate::{Kind, HEADER_LEN, LENGTH_BYTES, MAX_FRAME_LEN};

/// Failures raised by the byte buffers themselves. They carry no path; the
/// codec attaches one when it converts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("needed {needed} bytes but only {remaining} remain")]
    Truncated { needed: u64, remaining: usize },

    #[error("payload of {len} bytes exceeds the limit of {max} bytes")]
    PayloadTooLarge { len: u64, max: u64 },
}

/// The fixed 8-byte header at the start of every frame.
///
/// The kind is kept as the raw byte so that a reader can report codes it does
/// not understand; use [FrameHeader::kind] to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub code: u8,
    pub len:  u64,
}

impl FrameHeader {
    pub const LEN: usize = HEADER_LEN;

    pub fn new(kind: Kind, len: u64) -> FrameHeader {
        FrameHeader { code: kind.code(), len }
    }

    pub fn kind(&self) -> Option<Kind> {
        Kind::from_code(self.code)
    }

    /// Serializes the header. Lengths are masked to the 7 bytes the format
    /// can hold; callers check [MAX_FRAME_LEN] before relying on that.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = (self.len & MAX_FRAME_LEN).to_be_bytes();
        bytes[0] = self.code;
        bytes
    }

    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> FrameHeader {
        let code = bytes[0];
        let mut len = [0u8; 8];
        len[8 - LENGTH_BYTES..].copy_from_slice(&bytes[1..]);
        FrameHeader { code, len: u64::from_be_bytes(len) }
    }
}

/// A gbin byte buffer meant for reading.
///
/// Example usage:
///
/// ```
/// let mut bb = gbin_schema::ByteBuffer::new(&[4, 0, 0, 0, 0, 0, 0, 1, 1]);
/// let header = bb.read_header().unwrap();
/// assert_eq!(header.kind(), Some(gbin_schema::Kind::Bool));
/// assert_eq!(bb.read_bool(), Ok(Some(true)));
/// assert!(bb.is_empty());
/// ```
///
pub struct ByteBuffer<'a> {
    data:  &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn truncated(&self, needed: u64) -> BufferError {
        BufferError::Truncated { needed, remaining: self.remaining() }
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, BufferError> {
        match self.data.get(self.index) {
            Some(&value) => {
                self.index += 1;
                Ok(value)
            }
            None => Err(self.truncated(1)),
        }
    }

    /// Try to read `len` bytes starting at the current index. The index is
    /// left untouched on failure.
    pub fn read_bytes(&mut self, len: u64) -> Result<&'a [u8], BufferError> {
        match usize::try_from(len) {
            Ok(n) if n <= self.remaining() => {
                let value = &self.data[self.index..self.index + n];
                self.index += n;
                Ok(value)
            }
            _ => Err(self.truncated(len)),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let bytes = self.read_bytes(N as u64)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Try to read a frame header starting at the current index.
    pub fn read_header(&mut self) -> Result<FrameHeader, BufferError> {
        Ok(FrameHeader::from_bytes(self.read_array()?))
    }

    /// Try to read a one-byte boolean. Only `0` and `1` are accepted; any
    /// other byte yields `None` after being consumed.
    pub fn read_bool(&mut self) -> Result<Option<bool>, BufferError> {
        match self.read_byte()? {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            _ => Ok(None),
        }
    }

    /// Try to read a big-endian two's complement 64-bit integer.
    pub fn read_i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    /// Try to read a big-endian IEEE-754 64-bit float.
    pub fn read_f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(read(&[]), Err(BufferError::Truncated { needed: 1, remaining: 0 }));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(BufferError::Truncated { needed: 1, remaining: 0 }));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], u64::MAX), Err(BufferError::Truncated { needed: u64::MAX, remaining: 1 }));

    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(vec![1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(3), Err(BufferError::Truncated { needed: 3, remaining: 2 }));
    assert_eq!(bb.index(), 3);
    assert_eq!(bb.read_bytes(2), Ok(vec![4, 5].as_slice()));
    assert!(bb.is_empty());
}

#[test]
fn read_bool() {
    let read = |bytes| ByteBuffer::new(bytes).read_bool();
    assert!(read(&[]).is_err());
    assert_eq!(read(&[0]), Ok(Some(false)));
    assert_eq!(read(&[1]), Ok(Some(true)));
    assert_eq!(read(&[2]), Ok(None));
}

#[test]
fn read_i64() {
    let read = |bytes| ByteBuffer::new(bytes).read_i64();
    assert_eq!(read(&[0, 0, 0, 0, 0, 0, 1, 44]), Ok(300));
    assert_eq!(read(&[255; 8]), Ok(-1));
    assert_eq!(read(&[128, 0, 0, 0, 0, 0, 0, 0]), Ok(i64::MIN));
    assert_eq!(read(&[0, 0, 0]), Err(BufferError::Truncated { needed: 8, remaining: 3 }));
}

#[test]
fn read_f64() {
    let read = |bytes| ByteBuffer::new(bytes).read_f64();
    assert_eq!(read(&[63, 224, 0, 0, 0, 0, 0, 0]), Ok(0.5));
    assert_eq!(read(&[192, 94, 221, 47, 26, 159, 190, 119]), Ok(-123.456));
    assert_eq!(read(&[127, 240, 0, 0, 0, 0, 0, 0]), Ok(f64::INFINITY));
}

#[test]
fn read_header() {
    let mut bb = ByteBuffer::new(&[0x40, 0, 0, 0, 0, 1, 0, 2, 9]);
    assert_eq!(bb.read_header(), Ok(FrameHeader { code: 0x40, len: 65538 }));
    assert_eq!(bb.remaining(), 1);

    let mut bb = ByteBuffer::new(&[0xFF, 255, 255, 255, 255, 255, 255, 255]);
    let header = bb.read_header().unwrap();
    assert_eq!(header.kind(), Some(Kind::Dynamic));
    assert_eq!(header.len, MAX_FRAME_LEN);

    assert!(ByteBuffer::new(&[8, 0, 0]).read_header().is_err());
}

/// Marks where a frame header was reserved by [ByteBufferMut::begin_frame].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStart {
    offset: usize,
    kind:   Kind,
}

impl FrameStart {
    pub fn kind(&self) -> Kind {
        self.kind
    }
}

/// A gbin byte buffer meant for writing.
///
/// Frames are written in place: [begin_frame](#method.begin_frame) reserves
/// the header, the payload (including any nested frames) is appended, and
/// [end_frame](#method.end_frame) back-patches the payload length.
///
/// ```
/// let mut bb = gbin_schema::ByteBufferMut::new();
/// let start = bb.begin_frame(gbin_schema::Kind::String);
/// bb.write_bytes(b"hi");
/// bb.end_frame(start, gbin_schema::MAX_PAYLOAD_LEN).unwrap();
/// assert_eq!(bb.data(), [8, 0, 0, 0, 0, 0, 0, 2, b'h', b'i']);
/// ```
///
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a boolean value to the end of the buffer.
    pub fn write_bool(&mut self, value: bool) {
        self.data.push(if value { 1 } else { 0 });
    }

    /// Write a byte to the end of the buffer.
    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    /// Write a big-endian two's complement 64-bit integer.
    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Write a big-endian IEEE-754 64-bit float.
    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Reserve a header for a frame of `kind` and return its position.
    pub fn begin_frame(&mut self, kind: Kind) -> FrameStart {
        let offset = self.data.len();
        self.write_bytes(&FrameHeader::new(kind, 0).to_bytes());
        FrameStart { offset, kind }
    }

    /// Close the frame opened at `start`, writing its payload length into the
    /// reserved header. Everything written since `begin_frame` is the payload.
    /// Returns the payload length.
    pub fn end_frame(&mut self, start: FrameStart, max_payload: u64) -> Result<u64, BufferError> {
        let payload_start = start.offset + HEADER_LEN;
        let len = (self.data.len() - payload_start) as u64;
        let max = max_payload.min(MAX_FRAME_LEN);
        if len > max {
            return Err(BufferError::PayloadTooLarge { len, max });
        }
        let header = FrameHeader::new(start.kind, len).to_bytes();
        self.data[start.offset..payload_start].copy_from_slice(&header);
        Ok(len)
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_bool() {
    assert_eq!(write_once(|bb| bb.write_bool(false)), [0]);
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
}

#[test]
fn write_bytes() {
    let mut bb = ByteBufferMut::new();
    bb.write_bytes(&[1, 2, 3]);
    bb.write_bytes(&[]);
    bb.write_bytes(&[4, 5]);
    assert_eq!(bb.data(), [1, 2, 3, 4, 5]);
}

#[test]
fn write_i64() {
    assert_eq!(write_once(|bb| bb.write_i64(0)), [0; 8]);
    assert_eq!(write_once(|bb| bb.write_i64(-1)), [255; 8]);
    assert_eq!(write_once(|bb| bb.write_i64(300)), [0, 0, 0, 0, 0, 0, 1, 44]);
    assert_eq!(write_once(|bb| bb.write_i64(i64::MAX)), [127, 255, 255, 255, 255, 255, 255, 255]);
}

#[test]
fn write_f64() {
    assert_eq!(write_once(|bb| bb.write_f64(0.5)), [63, 224, 0, 0, 0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_f64(-123.456)), [192, 94, 221, 47, 26, 159, 190, 119]);
}

#[test]
fn write_nested_frames() {
    let mut bb = ByteBufferMut::new();
    let outer = bb.begin_frame(Kind::Reference);
    let inner = bb.begin_frame(Kind::Bool);
    bb.write_bool(true);
    assert_eq!(bb.end_frame(inner, 16), Ok(1));
    assert_eq!(bb.end_frame(outer, 16), Ok(9));
    assert_eq!(
        bb.data(),
        [0x20, 0, 0, 0, 0, 0, 0, 9, 0x04, 0, 0, 0, 0, 0, 0, 1, 1]
    );
}

#[test]
fn write_frame_over_limit() {
    let mut bb = ByteBufferMut::new();
    let start = bb.begin_frame(Kind::String);
    bb.write_bytes(b"abcde");
    assert_eq!(
        bb.end_frame(start, 4),
        Err(BufferError::PayloadTooLarge { len: 5, max: 4 })
    );
}

#[test]
fn header_round_trip() {
    for len in [0, 1, 255, 256, 0x0FFF_FFFF, MAX_FRAME_LEN] {
        let header = FrameHeader::new(Kind::Map, len);
        assert_eq!(FrameHeader::from_bytes(header.to_bytes()), header);
    }
}
