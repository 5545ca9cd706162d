//! Error types for wire-protocol processing.
//!
//! Every failure the codec can produce is a distinct variant; callers and
//! tests match on specific kinds, so categories are never collapsed into a
//! generic parse error.
//!
//! ## Fatality
//!
//! Most decode failures poison the byte stream: once a frame is misread
//! there is no way to resynchronize, so the connection must be torn down.
//! The one exception is [`ProtocolError::NotRegistered`] - the frame itself
//! was well formed, only its type is unknown, so the stream stays usable.
//!
//! ```rust
//! use fcwire::ProtocolError;
//!
//! let err = ProtocolError::NotRegistered { packet_type: 999 };
//! assert!(!err.is_fatal());
//!
//! let err = ProtocolError::MalformedString;
//! assert!(err.is_fatal());
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for wire-protocol operations.
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Main error type for framing, decoding, and connection handling.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("short read: needed {needed} bytes, {available} available")]
    ShortRead { needed: usize, available: usize },

    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },

    #[error("string field has no null terminator before end of buffer")]
    MalformedString,

    #[error("array-diff index {index} exceeds capacity {capacity}")]
    ArrayIndexOutOfRange { index: u16, capacity: u16 },

    #[error("no schema registered for packet type {packet_type}")]
    NotRegistered { packet_type: u16 },

    #[error("zlib decompression failed")]
    DecompressionFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("join did not complete within {elapsed:?}")]
    JoinTimeout { elapsed: Duration },

    #[error("transport I/O error")]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema: {reason}")]
    SchemaInvalid { reason: String },
}

impl ProtocolError {
    /// Returns whether this error must tear down the connection.
    ///
    /// Only an unregistered packet type leaves the stream synchronized;
    /// everything else means bytes were consumed under a wrong
    /// interpretation and the connection cannot continue.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProtocolError::NotRegistered { .. })
    }

    /// Helper constructor for malformed-frame errors.
    pub fn malformed_frame(reason: impl Into<String>) -> Self {
        ProtocolError::MalformedFrame { reason: reason.into() }
    }

    /// Helper constructor for schema construction failures.
    pub fn schema_invalid(reason: impl Into<String>) -> Self {
        ProtocolError::SchemaInvalid { reason: reason.into() }
    }

    /// Helper constructor for short reads.
    pub fn short_read(needed: usize, available: usize) -> Self {
        ProtocolError::ShortRead { needed, available }
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            // readexactly hitting EOF is a truncated frame, not a generic
            // transport failure
            std::io::ErrorKind::UnexpectedEof => ProtocolError::ShortRead { needed: 0, available: 0 },
            _ => ProtocolError::Io { source: err },
        }
    }
}
