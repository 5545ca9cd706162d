//! Raw frame unit and pinned protocol constants

/// Packet type: server has started processing a burst of updates.
pub const PACKET_PROCESSING_STARTED: u16 = 0;
/// Packet type: server has finished the burst started earlier.
pub const PACKET_PROCESSING_FINISHED: u16 = 1;
/// Packet type: client-to-server join request.
pub const PACKET_SERVER_JOIN_REQ: u16 = 4;
/// Packet type: server's answer to the join request.
///
/// Successful dispatch of this type promotes the connection from the
/// 1-byte to the 2-byte packet-type header.
pub const PACKET_SERVER_JOIN_REPLY: u16 = 5;
/// Packet type: comprehensive game parameters, carries array-diff fields.
pub const PACKET_GAME_INFO: u16 = 16;
/// Packet type: chat message broadcast.
pub const PACKET_CHAT_MSG: u16 = 25;
/// Packet type: server version advertisement.
pub const PACKET_SERVER_INFO: u16 = 29;
/// Packet type: ruleset entity counts and metadata.
pub const PACKET_RULESET_CONTROL: u16 = 155;
/// Packet type: one chunk of the ruleset description text.
pub const PACKET_RULESET_DESCRIPTION_PART: u16 = 247;
/// Packet type: per-unit-class ruleset data.
pub const PACKET_RULESET_UNIT_CLASS: u16 = 152;
/// Packet type: key-only unit combat bonus entry.
pub const PACKET_RULESET_UNIT_BONUS: u16 = 228;
/// Packet type: user unit flag definition.
pub const PACKET_RULESET_UNIT_FLAG: u16 = 229;

/// Client protocol major version sent in the join request.
pub const MAJOR_VERSION: u32 = 3;
/// Client protocol minor version sent in the join request.
pub const MINOR_VERSION: u32 = 3;
/// Client protocol patch version sent in the join request.
pub const PATCH_VERSION: u32 = 90;
/// Version label sent in the join request.
pub const VERSION_LABEL: &str = "-dev";
/// Capability string the client advertises while joining.
pub const CAPABILITY: &str = "+Freeciv.Devel-3.4-2025.Nov.29";

/// One complete frame as produced by the frame reader.
///
/// This is the fundamental unit that flows reader -> dispatcher. The body
/// excludes the length and type header; `raw` is the full on-wire frame
/// (header included) for capture and byte-exactness checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Packet type from the frame header.
    pub packet_type: u16,

    /// Body bytes after the frame header.
    pub body: Vec<u8>,

    /// Complete frame bytes, header included.
    pub raw: Vec<u8>,
}

impl RawFrame {
    /// Create a new raw frame.
    pub fn new(packet_type: u16, body: Vec<u8>, raw: Vec<u8>) -> Self {
        Self { packet_type, body, raw }
    }
}
