//! Packet dispatch: packet type -> handler, with pre-decoding.
//!
//! The dispatcher resolves the schema for each incoming frame, runs the
//! delta decoder against the connection's cache, and hands the decoded
//! record to the registered handler. Handlers never see raw bodies and
//! never touch the cache.
//!
//! Failure isolation is asymmetric on purpose: a decode failure is fatal
//! to the connection (the stream cannot be trusted afterwards), while a
//! handler failure is logged and the loop moves on. The cache keeps
//! whatever the decoder wrote before the handler ran - the server assumes
//! the client saw the packet, and rolling back would desynchronize every
//! later delta.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::codec::{self, DeltaCache};
use crate::error::{ProtocolError, Result};
use crate::schema::{PacketSchema, SchemaRegistry};
use crate::types::{DecodedRecord, RawFrame};

use super::ConnectionHandle;

/// A decoded packet as handlers see it.
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    /// Packet type from the frame header.
    pub packet_type: u16,
    /// Schema the body was decoded under.
    pub schema: Arc<PacketSchema>,
    /// Every field of the packet, absent ones reconstructed from cache.
    pub record: DecodedRecord,
}

/// Per-packet-type handler.
///
/// Handlers run on the connection task, one at a time, in exact transport
/// order. Anything slow or blocking belongs on another task.
#[async_trait]
pub trait PacketHandler: Send + Sync {
    /// Process one decoded packet.
    async fn handle(&self, conn: &ConnectionHandle, packet: &DecodedPacket) -> Result<()>;
}

/// Adapter so plain closures can be registered as handlers.
struct FnHandler<F>(F);

#[async_trait]
impl<F> PacketHandler for FnHandler<F>
where
    F: Fn(&ConnectionHandle, &DecodedPacket) -> Result<()> + Send + Sync,
{
    async fn handle(&self, conn: &ConnectionHandle, packet: &DecodedPacket) -> Result<()> {
        (self.0)(conn, packet)
    }
}

/// What became of one dispatched frame.
#[derive(Debug)]
pub(crate) enum DispatchOutcome {
    /// Decoded, and the handler (if any) succeeded.
    Handled(Arc<DecodedPacket>),
    /// Decoded, but the registered handler returned an error.
    HandlerFailed(Arc<DecodedPacket>),
    /// No schema for this packet type; body logged and dropped.
    Unregistered,
}

/// Routes decoded packets to handlers.
pub struct Dispatcher {
    registry: Arc<SchemaRegistry>,
    handlers: HashMap<u16, Box<dyn PacketHandler>>,
}

impl Dispatcher {
    /// Create a dispatcher over a schema registry.
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry: Arc::new(registry), handlers: HashMap::new() }
    }

    /// Register a handler for a packet type, replacing any previous one.
    pub fn register(&mut self, packet_type: u16, handler: impl PacketHandler + 'static) {
        self.handlers.insert(packet_type, Box::new(handler));
    }

    /// Register a synchronous closure as a handler.
    pub fn register_fn<F>(&mut self, packet_type: u16, handler: F)
    where
        F: Fn(&ConnectionHandle, &DecodedPacket) -> Result<()> + Send + Sync + 'static,
    {
        self.register(packet_type, FnHandler(handler));
    }

    /// The schema registry this dispatcher decodes with.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Decode one frame and run its handler.
    ///
    /// Returns `Err` only for fatal decode failures. Unknown packet types
    /// and handler errors are absorbed here and reported in the outcome.
    pub(crate) async fn dispatch(
        &self,
        conn: &ConnectionHandle,
        cache: &mut DeltaCache,
        frame: &RawFrame,
    ) -> Result<DispatchOutcome> {
        let schema = match self.registry.lookup(frame.packet_type) {
            Ok(schema) => Arc::clone(schema),
            Err(ProtocolError::NotRegistered { packet_type }) => {
                let preview_len = frame.body.len().min(64);
                warn!(
                    packet_type,
                    body_len = frame.body.len(),
                    body_head = %hex_preview(&frame.body[..preview_len]),
                    "dropping packet with no registered schema"
                );
                return Ok(DispatchOutcome::Unregistered);
            }
            Err(other) => return Err(other),
        };

        let (record, consumed) = codec::decode_body(&schema, &frame.body, cache)?;
        if consumed < frame.body.len() {
            debug!(
                packet_type = frame.packet_type,
                trailing = frame.body.len() - consumed,
                "packet body has trailing bytes"
            );
        }

        let packet =
            Arc::new(DecodedPacket { packet_type: frame.packet_type, schema, record });

        if let Some(handler) = self.handlers.get(&frame.packet_type) {
            if let Err(err) = handler.handle(conn, &packet).await {
                warn!(
                    packet_type = frame.packet_type,
                    error = %err,
                    "packet handler failed; continuing with next frame"
                );
                return Ok(DispatchOutcome::HandlerFailed(packet));
            }
        } else {
            debug!(packet_type = frame.packet_type, "no handler registered, packet decoded only");
        }

        Ok(DispatchOutcome::Handled(packet))
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
