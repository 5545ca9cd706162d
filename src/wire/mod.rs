//! Wire framing: length-prefixed frames, the two header modes, and the
//! compression-envelope constants.
//!
//! Every frame starts with a big-endian `u16` length. Values below
//! [`COMPRESSION_BORDER`] are plain frames whose length covers the whole
//! frame, header included. Values at or above the border are compression
//! envelopes (see [`reader`]); [`JUMBO_SENTINEL`] marks the jumbo variant
//! whose true payload length follows as a `u32`.

pub mod reader;

use crate::error::{ProtocolError, Result};
use crate::types::RawFrame;

pub use reader::FrameReader;

/// Length values at or above this are compression envelopes.
pub const COMPRESSION_BORDER: u16 = 16385;

/// Length value marking a jumbo envelope with an explicit `u32` length.
pub const JUMBO_SENTINEL: u16 = 65535;

/// Default server port.
pub const DEFAULT_PORT: u16 = 6556;

/// Packet-type header width, which changes once during a connection's life.
///
/// Connections start in `Negotiation` (1-byte packet type) and switch to
/// `Full` (big-endian 2-byte packet type) after the join-reply has been
/// dispatched. The switch is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// 2-byte length + 1-byte packet type.
    Negotiation,
    /// 2-byte length + 2-byte packet type.
    Full,
}

impl HeaderMode {
    /// Width of the packet-type field in bytes.
    pub const fn type_len(&self) -> usize {
        match self {
            HeaderMode::Negotiation => 1,
            HeaderMode::Full => 2,
        }
    }

    /// Total frame header width (length field + type field).
    pub const fn header_len(&self) -> usize {
        2 + self.type_len()
    }
}

/// Encode one uncompressed frame: `length ‖ packet_type ‖ body`.
///
/// The length field covers the whole frame, so the result satisfies the
/// byte-exactness invariant by construction. Fails when the frame would
/// collide with the compression border or the packet type does not fit the
/// negotiation header.
pub fn encode_frame(mode: HeaderMode, packet_type: u16, body: &[u8]) -> Result<Vec<u8>> {
    let total = mode.header_len() + body.len();
    if total >= usize::from(COMPRESSION_BORDER) {
        return Err(ProtocolError::malformed_frame(format!(
            "frame of {total} bytes cannot be represented uncompressed"
        )));
    }
    if mode == HeaderMode::Negotiation && packet_type > u16::from(u8::MAX) {
        return Err(ProtocolError::malformed_frame(format!(
            "packet type {packet_type} does not fit a negotiation header"
        )));
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(total as u16).to_be_bytes());
    match mode {
        HeaderMode::Negotiation => out.push(packet_type as u8),
        HeaderMode::Full => out.extend_from_slice(&packet_type.to_be_bytes()),
    }
    out.extend_from_slice(body);
    Ok(out)
}

/// Split a decompressed envelope buffer into its inner frames.
///
/// The buffer must be an exact concatenation of uncompressed frames in the
/// given header mode: a nested envelope, a length smaller than the header,
/// or trailing bytes that do not form a complete frame are all
/// [`ProtocolError::MalformedFrame`].
pub(crate) fn split_frames(buf: &[u8], mode: HeaderMode) -> Result<Vec<RawFrame>> {
    let mut frames = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        if buf.len() - offset < 2 {
            return Err(ProtocolError::malformed_frame(
                "envelope ends inside an inner frame length field",
            ));
        }
        let length = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
        if length >= COMPRESSION_BORDER {
            return Err(ProtocolError::malformed_frame(
                "compression envelopes do not nest",
            ));
        }
        let length = usize::from(length);
        if length < mode.header_len() {
            return Err(ProtocolError::malformed_frame(format!(
                "inner frame length {length} is smaller than its {}-byte header",
                mode.header_len()
            )));
        }
        if offset + length > buf.len() {
            return Err(ProtocolError::malformed_frame(format!(
                "inner frame of {length} bytes overruns the envelope by {}",
                offset + length - buf.len()
            )));
        }

        let raw = buf[offset..offset + length].to_vec();
        let packet_type = match mode {
            HeaderMode::Negotiation => u16::from(raw[2]),
            HeaderMode::Full => u16::from_be_bytes([raw[2], raw[3]]),
        };
        let body = raw[mode.header_len()..].to_vec();
        frames.push(RawFrame::new(packet_type, body, raw));
        offset += length;
    }

    Ok(frames)
}
