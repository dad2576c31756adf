use gbin_schema::{MAX_FRAME_LEN, MAX_PAYLOAD_LEN};

/// Default bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration for gbin encoding and decoding.
///
/// The limits are the defence against hostile input: a decoder rejects a
/// declared length above `max_payload_len` before reading it, and stops
/// descending once `max_depth` containers are open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Largest payload a single frame may carry.
    pub max_payload_len: u64,
    /// Maximum number of nested containers.
    pub max_depth: usize,
    /// Whether bytes after the root frame are ignored instead of rejected.
    pub allow_trailing_bytes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_payload_len: MAX_PAYLOAD_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            allow_trailing_bytes: false,
        }
    }
}

impl Config {
    /// Creates a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the payload ceiling. Values above what the 7-byte length field can
    /// describe are clamped.
    pub fn max_payload_len(mut self, len: u64) -> Self {
        self.max_payload_len = len.min(MAX_FRAME_LEN);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn allow_trailing_bytes(mut self, allow: bool) -> Self {
        self.allow_trailing_bytes = allow;
        self
    }

    #[inline(always)]
    pub fn payload_limit(&self) -> u64 {
        self.max_payload_len.min(MAX_FRAME_LEN)
    }

    #[inline(always)]
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    #[inline(always)]
    pub fn is_trailing_allowed(&self) -> bool {
        self.allow_trailing_bytes
    }
}

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(config.payload_limit(), 0x0FFF_FFFF);
    assert_eq!(config.depth_limit(), 128);
    assert!(!config.is_trailing_allowed());
}

#[test]
fn builder_clamps_payload() {
    let config = Config::new().max_payload_len(u64::MAX).max_depth(4);
    assert_eq!(config.payload_limit(), MAX_FRAME_LEN);
    assert_eq!(config.depth_limit(), 4);
}
