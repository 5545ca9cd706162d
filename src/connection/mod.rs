//! Connection layer: the public client API and its driver task.
//!
//! [`Connection::connect`] establishes the TCP transport and spawns one
//! task that owns it for the connection's whole life. The task runs the
//! frame-reader -> dispatcher loop; callers interact through
//! [`Connection::join`], the outbound send queue, and
//! [`Connection::disconnect`].
//!
//! ```rust,no_run
//! use fcwire::{ClientConfig, Connection, Dispatcher, baseline_registry};
//! use fcwire::types::PACKET_CHAT_MSG;
//!
//! #[tokio::main]
//! async fn main() -> fcwire::Result<()> {
//!     let mut dispatcher = Dispatcher::new(baseline_registry());
//!     dispatcher.register_fn(PACKET_CHAT_MSG, |_conn, packet| {
//!         println!("chat: {}", packet.record.str("message").unwrap_or(""));
//!         Ok(())
//!     });
//!
//!     let mut conn =
//!         Connection::connect("localhost", fcwire::wire::DEFAULT_PORT, dispatcher, ClientConfig::default())
//!             .await?;
//!     let reply = conn.join("ai-player").await?;
//!     println!("joined: {}", reply.message);
//!     conn.disconnect().await;
//!     Ok(())
//! }
//! ```

mod dispatcher;
mod driver;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::capture::FrameSink;
use crate::codec::{self, DeltaCache};
use crate::error::{ProtocolError, Result};
use crate::types::{
    CAPABILITY, DecodedRecord, FieldValue, MAJOR_VERSION, MINOR_VERSION,
    PACKET_SERVER_JOIN_REQ, PATCH_VERSION, VERSION_LABEL,
};
use crate::wire::{self, HeaderMode};

pub use dispatcher::{DecodedPacket, Dispatcher, PacketHandler};

/// Outbound frames queued between handler context and the driver task.
const OUTBOUND_QUEUE_DEPTH: usize = 32;

/// Connection options.
#[derive(Clone)]
pub struct ClientConfig {
    /// Deadline for the whole join operation.
    pub join_timeout: Duration,
    /// Assert frame reconstruction invariants while reading.
    pub validate_frames: bool,
    /// Optional sink receiving every raw frame in both directions.
    pub capture: Option<Arc<dyn FrameSink>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(10), validate_frames: false, capture: None }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("join_timeout", &self.join_timeout)
            .field("validate_frames", &self.validate_frames)
            .field("capture", &self.capture.is_some())
            .finish()
    }
}

/// The server's answer to a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinReply {
    /// Whether the server admitted us.
    pub you_can_join: bool,
    /// Human-readable acceptance or refusal message.
    pub message: String,
    /// Capability string the server speaks.
    pub capability: String,
    /// Challenge file name for authenticated setups.
    pub challenge_file: String,
}

impl JoinReply {
    fn from_record(record: &DecodedRecord) -> Self {
        Self {
            you_can_join: record.bool("you_can_join").unwrap_or(false),
            message: record.str("message").unwrap_or("").to_owned(),
            capability: record.str("capability").unwrap_or("").to_owned(),
            challenge_file: record.str("challenge_file").unwrap_or("").to_owned(),
        }
    }
}

/// Cloneable handle handlers use to reach the connection they run on.
#[derive(Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    /// Queue one pre-framed packet for writing.
    ///
    /// Frames are written in queue order, interleaved with reads on the
    /// connection task. Fails once the connection has shut down.
    pub async fn send_raw(&self, frame: Vec<u8>) -> Result<()> {
        self.outbound.send(frame).await.map_err(|_| closed())
    }

    /// Request connection shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    pub(crate) fn disconnected() -> Self {
        let (outbound, _rx) = mpsc::channel(1);
        Self { outbound, cancel: CancellationToken::new() }
    }
}

fn closed() -> ProtocolError {
    ProtocolError::Io {
        source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection is closed"),
    }
}

/// One client connection to a server.
///
/// Dropping the connection cancels its task; [`Connection::disconnect`]
/// does the same but waits for teardown to finish.
pub struct Connection {
    handle: ConnectionHandle,
    join_rx: watch::Receiver<Option<JoinReply>>,
    dispatcher: Arc<Dispatcher>,
    config: ClientConfig,
    task: Option<JoinHandle<()>>,
}

impl Connection {
    /// Connect to a server and spawn the connection task.
    ///
    /// The connection starts in negotiation framing with an empty delta
    /// cache; no packet is sent until [`Connection::join`].
    pub async fn connect(
        host: &str,
        port: u16,
        dispatcher: Dispatcher,
        config: ClientConfig,
    ) -> Result<Self> {
        info!(host, port, "connecting");
        let stream =
            TcpStream::connect((host, port)).await.map_err(|source| ProtocolError::Io { source })?;
        Ok(Self::from_stream(stream, dispatcher, config))
    }

    /// Build a connection over an already-established TCP stream.
    pub fn from_stream(stream: TcpStream, dispatcher: Dispatcher, config: ClientConfig) -> Self {
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();

        let mut reader = wire::FrameReader::new(read_half).with_validation(config.validate_frames);
        if let Some(sink) = &config.capture {
            reader = reader.with_capture(Arc::clone(sink));
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        let (join_tx, join_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let handle = ConnectionHandle { outbound: outbound_tx, cancel: cancel.clone() };
        let dispatcher = Arc::new(dispatcher);

        let task = tokio::spawn(
            driver::Driver {
                reader,
                writer: write_half,
                dispatcher: Arc::clone(&dispatcher),
                handle: handle.clone(),
                outbound_rx,
                cancel,
                join_tx,
                capture: config.capture.clone(),
            }
            .run(),
        );

        Self { handle, join_rx, dispatcher, config, task: Some(task) }
    }

    /// Send the join request and wait for the server's reply.
    ///
    /// Completes with the decoded reply - accepted or refused - or fails
    /// with [`ProtocolError::JoinTimeout`] once the configured deadline
    /// passes, tearing the connection down.
    pub async fn join(&mut self, username: &str) -> Result<JoinReply> {
        let frame = self.join_request_frame(username)?;
        debug!(username, "sending join request");
        self.handle.send_raw(frame).await?;

        let deadline = self.config.join_timeout;
        let reply = tokio::time::timeout(deadline, async {
            loop {
                if let Some(reply) = self.join_rx.borrow_and_update().clone() {
                    return Ok(reply);
                }
                if self.join_rx.changed().await.is_err() {
                    return Err(closed());
                }
            }
        })
        .await;

        match reply {
            Ok(reply) => reply,
            Err(_) => {
                self.handle.shutdown();
                Err(ProtocolError::JoinTimeout { elapsed: deadline })
            }
        }
    }

    /// Queue a pre-framed packet for sending.
    pub async fn send_raw(&self, frame: Vec<u8>) -> Result<()> {
        self.handle.send_raw(frame).await
    }

    /// A cloneable handle for use outside the connection's lifetime scope.
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    /// The join reply received so far, if any.
    pub fn join_reply(&self) -> Option<JoinReply> {
        self.join_rx.borrow().clone()
    }

    /// Cancel the connection task and wait for teardown.
    pub async fn disconnect(mut self) {
        info!("disconnecting");
        self.handle.shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn join_request_frame(&self, username: &str) -> Result<Vec<u8>> {
        let schema = self.dispatcher.registry().lookup(PACKET_SERVER_JOIN_REQ)?;

        let mut record = DecodedRecord::with_capacity(6);
        record.push("username", FieldValue::String(username.to_owned()));
        record.push("capability", FieldValue::String(CAPABILITY.to_owned()));
        record.push("version_label", FieldValue::String(VERSION_LABEL.to_owned()));
        record.push("major_version", FieldValue::U32(MAJOR_VERSION));
        record.push("minor_version", FieldValue::U32(MINOR_VERSION));
        record.push("patch_version", FieldValue::U32(PATCH_VERSION));

        // the join request is non-delta, so the scratch cache stays empty
        let body = codec::encode_body(schema, &record, &mut DeltaCache::new())?;
        wire::encode_frame(HeaderMode::Negotiation, PACKET_SERVER_JOIN_REQ, &body)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!("dropping connection");
        self.handle.shutdown();
    }
}
