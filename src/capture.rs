//! Raw-frame capture surface.
//!
//! Capture mode hands every frame's on-wire bytes to an external sink
//! before (inbound) or as (outbound) they cross the transport. Sinks see
//! complete frames with headers, exactly as they travel; what a sink does
//! with them - write files, feed a protocol analyzer - is outside the
//! core.

use std::sync::Mutex;

/// Which way a captured frame traveled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Server to client.
    Inbound,
    /// Client to server.
    Outbound,
}

/// Receiver for raw frame bytes.
///
/// Called from the connection task; implementations must not block for
/// long or they stall the read loop.
pub trait FrameSink: Send + Sync {
    /// One complete frame, header included.
    fn on_frame(&self, direction: Direction, raw: &[u8]);
}

/// In-memory sink collecting every captured frame, mostly for tests and
/// short diagnostic sessions.
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Mutex<Vec<(Direction, Vec<u8>)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far.
    pub fn frames(&self) -> Vec<(Direction, Vec<u8>)> {
        self.frames.lock().expect("capture lock poisoned").clone()
    }

    /// Number of captured frames.
    pub fn len(&self) -> usize {
        self.frames.lock().expect("capture lock poisoned").len()
    }

    /// Whether nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameSink for MemorySink {
    fn on_frame(&self, direction: Direction, raw: &[u8]) {
        self.frames.lock().expect("capture lock poisoned").push((direction, raw.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.on_frame(Direction::Outbound, &[1, 2, 3]);
        sink.on_frame(Direction::Inbound, &[4, 5]);

        let frames = sink.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], (Direction::Outbound, vec![1, 2, 3]));
        assert_eq!(frames[1], (Direction::Inbound, vec![4, 5]));
    }
}
