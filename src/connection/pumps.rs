//! The two halves of a live connection.
//!
//! The read pump turns transport frames into validated messages for the
//! dispatcher. The write pump drains the connection's outbound queue onto
//! the transport. Either one failing tears the whole connection down;
//! teardown runs its side effects exactly once no matter which pump, or
//! the hub itself, gets there first.

use std::fmt::Display;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::connection::ConnectionHandle;
use crate::hub::message::Message;
use crate::hub::registry::ConnectionRegistry;
use crate::transport::message::decode_frame;

/// Upper bound on the closing handshake of a departing connection.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// How a connection came to be torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// The client closed the connection, or the stream ended.
    Left,
    ReadFailed,
    WriteFailed,
    /// The hub closed the connection (explicit disconnect or shutdown).
    Closed,
    DispatcherStopped,
}

/// Unregisters `connection` and signals both of its pumps to stop.
///
/// Only the first call for a given connection has any effect.
pub fn teardown(registry: &ConnectionRegistry, connection: &ConnectionHandle, reason: Disconnect) {
    if !connection.close() {
        return;
    }
    registry.remove(connection);
    info!(
        user_id = connection.user_id(),
        connection_id = %connection.id(),
        ?reason,
        "connection unregistered"
    );
}

/// Reads frames until the transport fails, the client leaves, or the
/// connection is closed from elsewhere.
///
/// Malformed frames are logged and skipped; they never end the connection.
pub async fn read_pump<St, E>(
    connection: ConnectionHandle,
    mut stream: St,
    inbound: mpsc::Sender<Message>,
    registry: ConnectionRegistry,
    max_frame_bytes: usize,
) where
    St: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    let user_id = connection.user_id();

    let reason = loop {
        let frame = tokio::select! {
            biased;
            _ = connection.closed() => break Disconnect::Closed,
            frame = stream.next() => frame,
        };

        let frame = match frame {
            None | Some(Ok(WsMessage::Close(_))) => break Disconnect::Left,
            Some(Err(e)) => {
                warn!(user_id, "read failed: {e}");
                break Disconnect::ReadFailed;
            }
            Some(Ok(frame)) => frame,
        };

        let message = match decode_frame(user_id, &frame, max_frame_bytes) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(e) => {
                warn!(user_id, "discarding malformed frame: {e}");
                continue;
            }
        };

        tokio::select! {
            biased;
            _ = connection.closed() => break Disconnect::Closed,
            sent = inbound.send(message) => {
                if sent.is_err() {
                    break Disconnect::DispatcherStopped;
                }
            }
        }
    };

    debug!(user_id, ?reason, "read pump stopped");
    teardown(&registry, &connection, reason);
}

/// Writes queued frames to the transport in FIFO order until the queue is
/// closed, a write fails, or the connection is closed from elsewhere.
pub async fn write_pump<Si>(
    connection: ConnectionHandle,
    mut outbound: mpsc::Receiver<WsMessage>,
    mut sink: Si,
    registry: ConnectionRegistry,
) where
    Si: Sink<WsMessage> + Unpin,
    Si::Error: Display,
{
    let user_id = connection.user_id();
    let mut stalled = false;

    let reason = loop {
        let frame = tokio::select! {
            biased;
            _ = connection.closed() => break Disconnect::Closed,
            frame = outbound.recv() => frame,
        };

        let Some(frame) = frame else {
            break Disconnect::Closed;
        };

        // A peer that stops reading must not keep the pump alive past close.
        tokio::select! {
            biased;
            _ = connection.closed() => {
                stalled = true;
                break Disconnect::Closed;
            }
            sent = sink.send(frame) => {
                if let Err(e) = sent {
                    warn!(user_id, "write failed: {e}");
                    break Disconnect::WriteFailed;
                }
            }
        }
    };

    outbound.close();
    teardown(&registry, &connection, reason);

    // Closing flushes first, which would block again on a stalled peer;
    // dropping the sink releases the transport instead.
    if reason != Disconnect::WriteFailed && !stalled {
        // Best effort: tells the peer we are going away.
        match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(user_id, "closing transport: {e}"),
            Err(_) => debug!(user_id, "closing transport timed out"),
        }
    }
    debug!(user_id, ?reason, "write pump stopped");
}
