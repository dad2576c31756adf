use gbin_schema::Kind;
use thiserror::Error;

use crate::trace::Segment;

/// Every way an encode, decode or assign call can fail.
///
/// Traversal errors carry the path trace rendered at the point of failure,
/// e.g. `/record(User)/field[tags]/list/el3/`.
#[derive(Debug, Error)]
pub enum GbinError {
    #[error("{kind} is not supported for serialization (at {path})")]
    UnsupportedKind { kind: String, path: String },

    #[error("truncated frame: needed {needed} bytes but only {remaining} remain (at {path})")]
    TruncatedFrame {
        needed:    u64,
        remaining: usize,
        path:      String,
    },

    #[error("unknown kind code 0x{code:02x} (at {path})")]
    UnknownKindCode { code: u8, path: String },

    #[error("inconsistent {container} {role} kind: found {found} but expected {expected} (at {path})")]
    InconsistentContainer {
        container: Kind,
        role:      &'static str,
        expected:  Kind,
        found:     Kind,
        path:      String,
    },

    #[error("type {found} does not match target type {expected} (at {path})")]
    SchemaMismatch {
        expected: String,
        found:    Kind,
        path:     String,
    },

    #[error("missing field \"{field}\" required by {record} (at {path})")]
    MissingField {
        field:  String,
        record: String,
        path:   String,
    },

    #[error("cannot safely convert {value} to {target} (at {path})")]
    UnsafeNumericNarrowing {
        value:  String,
        target: &'static str,
        path:   String,
    },

    #[error("record key must be a string, not {found} (at {path})")]
    InvalidRecordKey { found: Kind, path: String },

    #[error("invalid {kind} payload: {reason} (at {path})")]
    InvalidPayload {
        kind:   Kind,
        reason: String,
        path:   String,
    },

    #[error("payload of {len} bytes exceeds the limit of {max} bytes (at {path})")]
    PayloadTooLarge { len: u64, max: u64, path: String },

    #[error("maximum nesting depth of {max} exceeded (at {path})")]
    DepthLimitExceeded { max: usize, path: String },

    #[error("{count} trailing bytes after the root frame")]
    TrailingBytes { count: usize },

    #[error("conversion error: {0}")]
    Conversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GbinError {
    /// The path trace attached to the error, if it came from a traversal.
    pub fn path(&self) -> Option<&str> {
        match self {
            GbinError::UnsupportedKind { path, .. }
            | GbinError::TruncatedFrame { path, .. }
            | GbinError::UnknownKindCode { path, .. }
            | GbinError::InconsistentContainer { path, .. }
            | GbinError::SchemaMismatch { path, .. }
            | GbinError::MissingField { path, .. }
            | GbinError::UnsafeNumericNarrowing { path, .. }
            | GbinError::InvalidRecordKey { path, .. }
            | GbinError::InvalidPayload { path, .. }
            | GbinError::PayloadTooLarge { path, .. }
            | GbinError::DepthLimitExceeded { path, .. } => Some(path),
            GbinError::TrailingBytes { .. }
            | GbinError::Conversion(_)
            | GbinError::Io(_)
            | GbinError::Json(_) => None,
        }
    }

    /// Stable category name, suitable for logs and exit reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            GbinError::UnsupportedKind { .. } => "unsupported_kind",
            GbinError::TruncatedFrame { .. } => "truncated_frame",
            GbinError::UnknownKindCode { .. } => "unknown_kind_code",
            GbinError::InconsistentContainer { .. } => "inconsistent_container",
            GbinError::SchemaMismatch { .. } => "schema_mismatch",
            GbinError::MissingField { .. } => "missing_field",
            GbinError::UnsafeNumericNarrowing { .. } => "unsafe_numeric_narrowing",
            GbinError::InvalidRecordKey { .. } => "invalid_record_key",
            GbinError::InvalidPayload { .. } => "invalid_payload",
            GbinError::PayloadTooLarge { .. } => "payload_too_large",
            GbinError::DepthLimitExceeded { .. } => "depth_limit_exceeded",
            GbinError::TrailingBytes { .. } => "trailing_bytes",
            GbinError::Conversion(_) => "conversion",
            GbinError::Io(_) => "io",
            GbinError::Json(_) => "json",
        }
    }

    pub fn conversion(msg: impl Into<String>) -> GbinError {
        GbinError::Conversion(msg.into())
    }

    /// Prefix the attached path with `segment`. Used while an error raised
    /// inside a nested value bubbles out through its containers.
    pub fn nested(mut self, segment: Segment) -> GbinError {
        match &mut self {
            GbinError::UnsupportedKind { path, .. }
            | GbinError::TruncatedFrame { path, .. }
            | GbinError::UnknownKindCode { path, .. }
            | GbinError::InconsistentContainer { path, .. }
            | GbinError::SchemaMismatch { path, .. }
            | GbinError::MissingField { path, .. }
            | GbinError::UnsafeNumericNarrowing { path, .. }
            | GbinError::InvalidRecordKey { path, .. }
            | GbinError::InvalidPayload { path, .. }
            | GbinError::PayloadTooLarge { path, .. }
            | GbinError::DepthLimitExceeded { path, .. } => {
                let rest = path.strip_prefix('/').unwrap_or(path.as_str());
                *path = format!("/{}/{}", segment, rest);
            }
            GbinError::Conversion(msg) => {
                *msg = format!("{}: {}", segment, msg);
            }
            GbinError::TrailingBytes { .. } | GbinError::Io(_) | GbinError::Json(_) => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path() {
        let err = GbinError::MissingField {
            field:  "B".to_owned(),
            record: "Pair".to_owned(),
            path:   "/record(Pair)/".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "missing field \"B\" required by Pair (at /record(Pair)/)"
        );
        assert_eq!(err.path(), Some("/record(Pair)/"));
        assert_eq!(err.kind_name(), "missing_field");
    }

    #[test]
    fn unknown_code_is_hex() {
        let err = GbinError::UnknownKindCode { code: 3, path: "/".to_owned() };
        assert_eq!(err.to_string(), "unknown kind code 0x03 (at /)");
    }

    #[test]
    fn nested_prefixes_path() {
        let err = GbinError::UnsupportedKind {
            kind: "absent reference".to_owned(),
            path: "/".to_owned(),
        }
        .nested(Segment::Element(2))
        .nested(Segment::Field("items".to_owned()));
        assert_eq!(err.path(), Some("/field[items]/el2/"));

        let err = GbinError::conversion("expected an int").nested(Segment::Field("n".to_owned()));
        assert_eq!(err.to_string(), "conversion error: field[n]: expected an int");
    }

    #[test]
    fn io_errors_convert() {
        let err: GbinError = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(err.kind_name(), "io");
        assert_eq!(err.path(), None);
    }
}
