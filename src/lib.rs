//! Async FreeCiv wire-protocol codec core.
//!
//! fcwire reads length-prefixed binary frames from a TCP stream,
//! reconstructs complete packets through a compression-aware framing
//! layer, and decodes each body into a typed record via a declarative
//! field schema, a delta (bitvector-gated) transmission scheme, and an
//! array-diff (sparse index/value) element scheme.
//!
//! # Features
//!
//! - **Two-phase framing**: 1-byte packet types during negotiation, 2-byte
//!   after the join reply, switched exactly between frames
//! - **Compression envelopes**: normal and jumbo zlib envelopes inflated
//!   into ordered inner frames
//! - **Delta decoding**: absent fields reconstructed from a
//!   per-connection cache, standalone booleans folded into the bitvector
//! - **Declarative schemas**: new packet types are registry entries, not
//!   code changes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fcwire::{ClientConfig, Connection, Dispatcher, baseline_registry};
//! use fcwire::types::PACKET_CHAT_MSG;
//!
//! #[tokio::main]
//! async fn main() -> fcwire::Result<()> {
//!     let mut dispatcher = Dispatcher::new(baseline_registry());
//!     dispatcher.register_fn(PACKET_CHAT_MSG, |_conn, packet| {
//!         println!("<{}> {}",
//!             packet.record.i64("conn_id").unwrap_or(-1),
//!             packet.record.str("message").unwrap_or(""));
//!         Ok(())
//!     });
//!
//!     let mut conn = Connection::connect(
//!         "localhost",
//!         fcwire::wire::DEFAULT_PORT,
//!         dispatcher,
//!         ClientConfig::default(),
//!     )
//!     .await?;
//!
//!     let reply = conn.join("ai-player").await?;
//!     if !reply.you_can_join {
//!         eprintln!("refused: {}", reply.message);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod capture;
mod error;
pub mod types;

// Codec layers
pub mod codec;
pub mod schema;
pub mod wire;

// Connection driver and dispatch
pub mod connection;

// Core exports
pub use error::{ProtocolError, Result};
pub use types::{DecodedRecord, FieldKind, FieldValue, RawFrame};

// Schema exports
pub use schema::{FieldSchema, PacketSchema, SchemaRegistry, baseline_registry};

// Codec exports
pub use codec::DeltaCache;

// Connection exports
pub use connection::{
    ClientConfig, Connection, ConnectionHandle, DecodedPacket, Dispatcher, JoinReply,
    PacketHandler,
};
