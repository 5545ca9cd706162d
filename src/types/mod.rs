//! Core types for wire-protocol data representation.
//!
//! - [`RawFrame`] is the unit the frame reader hands to the dispatcher:
//!   a packet type plus undecoded body bytes.
//! - [`FieldKind`] / [`FieldValue`] are the closed sum types the codec
//!   pattern-matches over; there is no dynamic dispatch on field types.
//! - [`DecodedRecord`] is a schema-ordered field map, the output of the
//!   delta decoder and the shape stored in the delta cache.

mod field;
mod packet;
mod record;

pub use field::{FieldKind, FieldValue};
pub use packet::{
    CAPABILITY, MAJOR_VERSION, MINOR_VERSION, PACKET_CHAT_MSG, PACKET_GAME_INFO,
    PACKET_PROCESSING_FINISHED, PACKET_PROCESSING_STARTED, PACKET_RULESET_CONTROL,
    PACKET_RULESET_DESCRIPTION_PART, PACKET_RULESET_UNIT_BONUS, PACKET_RULESET_UNIT_CLASS,
    PACKET_RULESET_UNIT_FLAG, PACKET_SERVER_INFO, PACKET_SERVER_JOIN_REPLY,
    PACKET_SERVER_JOIN_REQ, PATCH_VERSION, RawFrame, VERSION_LABEL,
};
pub use record::DecodedRecord;
