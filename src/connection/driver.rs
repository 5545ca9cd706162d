//! The connection's read-loop task.
//!
//! One task owns everything: the transport halves, the frame reader with
//! its header mode, and the delta cache. External callers reach it only
//! through the cancellation token, the outbound write queue, and the
//! join-reply watch channel, so no locking guards the cache.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::{Direction, FrameSink};
use crate::codec::DeltaCache;
use crate::error::Result;
use crate::types::{PACKET_SERVER_JOIN_REPLY, RawFrame};
use crate::wire::FrameReader;

use super::dispatcher::{DispatchOutcome, Dispatcher};
use super::{ConnectionHandle, JoinReply};

pub(super) struct Driver {
    pub reader: FrameReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
    pub dispatcher: Arc<Dispatcher>,
    pub handle: ConnectionHandle,
    pub outbound_rx: mpsc::Receiver<Vec<u8>>,
    pub cancel: CancellationToken,
    pub join_tx: watch::Sender<Option<JoinReply>>,
    pub capture: Option<Arc<dyn FrameSink>>,
}

impl Driver {
    /// Run the read -> decode -> dispatch loop until shutdown.
    ///
    /// Shutdown triggers: cancellation, transport EOF, transport error, or
    /// a fatal protocol error. Teardown always clears the delta cache and
    /// closes the transport; no partial frame is ever dispatched.
    pub(super) async fn run(self) {
        let Driver {
            mut reader,
            mut writer,
            dispatcher,
            handle,
            mut outbound_rx,
            cancel,
            join_tx,
            capture,
        } = self;

        info!("connection task started");
        let mut cache = DeltaCache::new();
        let mut frame_count = 0u64;

        'conn: loop {
            // One read future lives across outbound writes: a read that
            // has consumed part of a frame header must not be dropped, or
            // the stream loses framing.
            let read_result = {
                let read = reader.next_frame();
                tokio::pin!(read);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("connection cancelled");
                            break 'conn;
                        }
                        outbound = outbound_rx.recv() => match outbound {
                            Some(bytes) => {
                                if let Some(sink) = &capture {
                                    sink.on_frame(Direction::Outbound, &bytes);
                                }
                                if let Err(err) = write_frame(&mut writer, &bytes).await {
                                    error!(error = %err, "transport write failed");
                                    break 'conn;
                                }
                            }
                            None => {
                                debug!("outbound queue closed");
                                break 'conn;
                            }
                        },
                        result = &mut read => break result,
                    }
                }
            };

            match read_result {
                Ok(Some(frame)) => {
                    frame_count += 1;
                    if !process_frame(
                        &dispatcher,
                        &handle,
                        &mut reader,
                        &mut cache,
                        &join_tx,
                        &cancel,
                        frame,
                    )
                    .await
                    {
                        break;
                    }
                }
                Ok(None) => {
                    info!(frame_count, "server closed the connection");
                    break;
                }
                Err(err) => {
                    error!(error = %err, "frame read failed");
                    break;
                }
            }
        }

        // Teardown: the cache dies with the connection. A reconnect starts
        // from an empty cache, matching the server's fresh delta state.
        let dropped = cache.entry_count();
        cache.clear_all();
        if let Err(err) = writer.shutdown().await {
            debug!(error = %err, "transport close reported an error");
        }
        info!(frame_count, dropped_cache_entries = dropped, "connection task ended");
    }
}

/// Dispatch one frame. Returns `false` when the connection must die.
async fn process_frame(
    dispatcher: &Dispatcher,
    handle: &ConnectionHandle,
    reader: &mut FrameReader<OwnedReadHalf>,
    cache: &mut DeltaCache,
    join_tx: &watch::Sender<Option<JoinReply>>,
    cancel: &CancellationToken,
    frame: RawFrame,
) -> bool {
    let packet_type = frame.packet_type;
    match dispatcher.dispatch(handle, cache, &frame).await {
        Ok(DispatchOutcome::Handled(packet)) => {
            if packet_type == PACKET_SERVER_JOIN_REPLY {
                // the reply is the last negotiation-framed packet; every
                // later frame, compressed inners included, is full-framed
                reader.promote_header_mode();
                let reply = JoinReply::from_record(&packet.record);
                let accepted = reply.you_can_join;
                join_tx.send_replace(Some(reply));
                if !accepted {
                    warn!("server refused the join request");
                    cancel.cancel();
                    return false;
                }
            }
            true
        }
        Ok(DispatchOutcome::HandlerFailed(_)) | Ok(DispatchOutcome::Unregistered) => true,
        Err(err) => {
            error!(packet_type, error = %err, "fatal protocol error");
            false
        }
    }
}

async fn write_frame(writer: &mut OwnedWriteHalf, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}
