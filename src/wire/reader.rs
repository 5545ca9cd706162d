//! Async frame reader: bytes in, complete frames out.
//!
//! The reader owns the receive half of the transport and yields one
//! [`RawFrame`] at a time. Compression envelopes are inflated eagerly and
//! their inner frames queued, so callers always see frames in exact
//! transport order regardless of how the server batched them.
//!
//! The reader also owns the connection's [`HeaderMode`]: the packet-type
//! field is 1 byte until the join-reply has been dispatched, 2 bytes
//! after. [`FrameReader::promote_header_mode`] flips it between frames -
//! dispatch is synchronous with reading, so no frame can straddle the
//! switch.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::capture::{Direction, FrameSink};
use crate::error::{ProtocolError, Result};
use crate::types::RawFrame;

use super::{COMPRESSION_BORDER, HeaderMode, JUMBO_SENTINEL, split_frames};

/// Reads length-prefixed frames from an async byte stream.
pub struct FrameReader<R> {
    transport: R,
    header_mode: HeaderMode,
    validate: bool,
    pending: VecDeque<RawFrame>,
    capture: Option<Arc<dyn FrameSink>>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a transport. Connections start in negotiation framing.
    pub fn new(transport: R) -> Self {
        Self {
            transport,
            header_mode: HeaderMode::Negotiation,
            validate: false,
            pending: VecDeque::new(),
            capture: None,
        }
    }

    /// Enable byte-exactness checks on every reconstructed frame.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Tap every inbound frame's raw bytes into a capture sink.
    pub fn with_capture(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.capture = Some(sink);
        self
    }

    /// Current header mode.
    pub fn header_mode(&self) -> HeaderMode {
        self.header_mode
    }

    /// Switch to full framing (2-byte packet types). One-way; calling it
    /// again is a no-op.
    pub fn promote_header_mode(&mut self) {
        if self.header_mode == HeaderMode::Negotiation {
            debug!("switching to full framing (2-byte packet types)");
            self.header_mode = HeaderMode::Full;
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on a clean EOF at a frame boundary. EOF inside a
    /// frame is [`ProtocolError::ShortRead`]; a failed inflate is
    /// [`ProtocolError::DecompressionFailed`]; structural violations are
    /// [`ProtocolError::MalformedFrame`]. Cancellation safety: a frame is
    /// either yielded whole or abandoned inside the reader, never split.
    pub async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }

            let length = match self.read_length().await? {
                Some(length) => length,
                None => return Ok(None),
            };

            if length == JUMBO_SENTINEL {
                let mut len_bytes = [0u8; 4];
                self.transport.read_exact(&mut len_bytes).await?;
                let actual = u32::from_be_bytes(len_bytes);
                trace!(actual, "reading jumbo compression envelope");
                let mut raw = Vec::with_capacity(6 + actual as usize);
                raw.extend_from_slice(&length.to_be_bytes());
                raw.extend_from_slice(&len_bytes);
                self.read_envelope(raw, actual as usize).await?;
            } else if length >= COMPRESSION_BORDER {
                let deflated = usize::from(length - COMPRESSION_BORDER);
                trace!(deflated, "reading compression envelope");
                let mut raw = Vec::with_capacity(2 + deflated);
                raw.extend_from_slice(&length.to_be_bytes());
                self.read_envelope(raw, deflated).await?;
            } else {
                return Ok(Some(self.read_plain_frame(length).await?));
            }
        }
    }

    /// Turn the reader into a stream of frames, ending at clean EOF.
    pub fn into_stream(self) -> impl Stream<Item = Result<RawFrame>> {
        futures::stream::try_unfold(self, |mut reader| async move {
            let frame = reader.next_frame().await?;
            Ok(frame.map(|frame| (frame, reader)))
        })
    }

    /// Read the 2-byte length field, detecting clean EOF on the first byte.
    async fn read_length(&mut self) -> Result<Option<u16>> {
        let mut first = [0u8; 1];
        let n = self.transport.read(&mut first).await.map_err(ProtocolError::from)?;
        if n == 0 {
            return Ok(None);
        }
        let mut second = [0u8; 1];
        self.transport.read_exact(&mut second).await?;
        Ok(Some(u16::from_be_bytes([first[0], second[0]])))
    }

    async fn read_plain_frame(&mut self, length: u16) -> Result<RawFrame> {
        let header_len = self.header_mode.header_len();
        let length = usize::from(length);
        if length < header_len {
            return Err(ProtocolError::malformed_frame(format!(
                "frame length {length} is smaller than its {header_len}-byte header"
            )));
        }

        let mut raw = vec![0u8; length];
        raw[..2].copy_from_slice(&(length as u16).to_be_bytes());
        self.transport.read_exact(&mut raw[2..]).await?;

        let packet_type = match self.header_mode {
            HeaderMode::Negotiation => u16::from(raw[2]),
            HeaderMode::Full => u16::from_be_bytes([raw[2], raw[3]]),
        };
        let body = raw[header_len..].to_vec();

        if self.validate && raw.len() != length {
            return Err(ProtocolError::malformed_frame(format!(
                "reconstructed {} bytes for a frame declaring {length}",
                raw.len()
            )));
        }

        if let Some(sink) = &self.capture {
            sink.on_frame(Direction::Inbound, &raw);
        }
        trace!(packet_type, body_len = body.len(), "read frame");
        Ok(RawFrame::new(packet_type, body, raw))
    }

    /// Read and inflate an envelope, queueing its inner frames.
    async fn read_envelope(&mut self, mut raw: Vec<u8>, deflated_len: usize) -> Result<()> {
        let start = raw.len();
        raw.resize(start + deflated_len, 0);
        self.transport.read_exact(&mut raw[start..]).await?;

        if let Some(sink) = &self.capture {
            sink.on_frame(Direction::Inbound, &raw);
        }

        let mut inflated = Vec::new();
        ZlibDecoder::new(&raw[start..])
            .read_to_end(&mut inflated)
            .map_err(|source| ProtocolError::DecompressionFailed { source })?;
        if inflated.is_empty() {
            return Err(ProtocolError::malformed_frame("compression envelope is empty"));
        }

        let frames = split_frames(&inflated, self.header_mode)?;
        debug!(
            inner = frames.len(),
            inflated = inflated.len(),
            deflated = deflated_len,
            "inflated compression envelope"
        );
        self.pending.extend(frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MemorySink;
    use crate::wire::encode_frame;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn envelope(frames: &[&[u8]]) -> Vec<u8> {
        let deflated = deflate(&frames.concat());
        let mut out = (COMPRESSION_BORDER + deflated.len() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(&deflated);
        out
    }

    fn jumbo_envelope(frames: &[&[u8]]) -> Vec<u8> {
        let deflated = deflate(&frames.concat());
        let mut out = JUMBO_SENTINEL.to_be_bytes().to_vec();
        out.extend_from_slice(&(deflated.len() as u32).to_be_bytes());
        out.extend_from_slice(&deflated);
        out
    }

    #[tokio::test]
    async fn plain_frame_roundtrip() {
        let frame = encode_frame(HeaderMode::Negotiation, 5, b"hello").unwrap();
        let mut reader = FrameReader::new(frame.as_slice()).with_validation(true);

        let read = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(read.packet_type, 5);
        assert_eq!(read.body, b"hello");
        assert_eq!(read.raw, frame);

        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_mode_reads_two_byte_types() {
        let frame = encode_frame(HeaderMode::Full, 300, b"data").unwrap();
        let mut reader = FrameReader::new(frame.as_slice());
        reader.promote_header_mode();

        let read = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(read.packet_type, 300);
        assert_eq!(read.body, b"data");
    }

    #[tokio::test]
    async fn envelope_yields_inner_frames_in_order() {
        let inner1 = encode_frame(HeaderMode::Negotiation, 10, b"first").unwrap();
        let inner2 = encode_frame(HeaderMode::Negotiation, 20, b"second").unwrap();
        let bytes = envelope(&[&inner1, &inner2]);

        let mut reader = FrameReader::new(bytes.as_slice());
        let a = reader.next_frame().await.unwrap().unwrap();
        let b = reader.next_frame().await.unwrap().unwrap();
        assert_eq!((a.packet_type, a.body.as_slice()), (10, b"first".as_slice()));
        assert_eq!((b.packet_type, b.body.as_slice()), (20, b"second".as_slice()));
        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn jumbo_envelope_uses_explicit_length() {
        let inner = encode_frame(HeaderMode::Negotiation, 30, &[0x58; 512]).unwrap();
        let bytes = jumbo_envelope(&[&inner]);

        let mut reader = FrameReader::new(bytes.as_slice());
        let read = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(read.packet_type, 30);
        assert_eq!(read.body, vec![0x58; 512]);
    }

    #[tokio::test]
    async fn corrupt_envelope_fails_decompression() {
        let mut bytes = (COMPRESSION_BORDER + 4).to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let mut reader = FrameReader::new(bytes.as_slice());
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::DecompressionFailed { .. }));
    }

    #[tokio::test]
    async fn envelope_with_trailing_bytes_is_malformed() {
        let mut inner = encode_frame(HeaderMode::Negotiation, 10, b"ok").unwrap();
        inner.push(0x99);
        let bytes = envelope(&[&inner]);

        let mut reader = FrameReader::new(bytes.as_slice());
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame { .. }));
    }

    #[tokio::test]
    async fn empty_envelope_is_malformed() {
        let bytes = envelope(&[]);
        let mut reader = FrameReader::new(bytes.as_slice());
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame { .. }));
    }

    #[tokio::test]
    async fn eof_mid_frame_is_a_short_read() {
        let frame = encode_frame(HeaderMode::Negotiation, 5, b"hello").unwrap();
        let mut reader = FrameReader::new(&frame[..4]);
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::ShortRead { .. }));
    }

    #[tokio::test]
    async fn length_below_header_size_is_malformed() {
        // length 2 cannot hold the 3-byte negotiation header
        let bytes = [0x00, 0x02];
        let mut reader = FrameReader::new(bytes.as_slice());
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame { .. }));
    }

    #[tokio::test]
    async fn capture_sees_raw_outer_frames() {
        let sink = Arc::new(MemorySink::new());
        let plain = encode_frame(HeaderMode::Negotiation, 5, b"hi").unwrap();
        let inner = encode_frame(HeaderMode::Negotiation, 10, b"inner").unwrap();
        let enveloped = envelope(&[&inner]);
        let mut bytes = plain.clone();
        bytes.extend_from_slice(&enveloped);

        let mut reader = FrameReader::new(bytes.as_slice()).with_capture(sink.clone());
        while reader.next_frame().await.unwrap().is_some() {}

        let captured = sink.frames();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].1, plain);
        assert_eq!(captured[1].1, enveloped);
    }

    #[tokio::test]
    async fn stream_adapter_yields_frames_then_ends() {
        use futures::StreamExt;

        let mut bytes = encode_frame(HeaderMode::Negotiation, 1, b"").unwrap();
        bytes.extend(encode_frame(HeaderMode::Negotiation, 2, b"x").unwrap());

        let frames: Vec<_> = FrameReader::new(bytes.as_slice())
            .into_stream()
            .map(|frame| frame.unwrap().packet_type)
            .collect()
            .await;
        assert_eq!(frames, vec![1, 2]);
    }
}
