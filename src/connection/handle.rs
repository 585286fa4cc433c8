use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::hub::message::UserId;

/// Why an enqueue onto a connection's outbound queue did not happen.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    /// The bounded queue is at capacity; the frame was dropped for this recipient.
    #[error("outbound queue is full")]
    Full,
    /// The connection has been torn down.
    #[error("connection is closed")]
    Closed,
}

/// Shared handle to one live client connection.
///
/// The registry and the dispatcher hold clones of this handle; the
/// connection's read and write pumps hold the transport halves and the
/// receiving end of the outbound queue. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    user_id: UserId,
    outbound: mpsc::Sender<WsMessage>,
    closed: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Creates a handle for `user_id` with an outbound queue of `capacity` frames.
    ///
    /// Returns the receiving end of the queue, which belongs to the write pump.
    pub fn new(user_id: UserId, capacity: usize) -> (Self, mpsc::Receiver<WsMessage>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let (closed, _) = watch::channel(false);
        let handle = Self {
            id: Uuid::new_v4(),
            user_id,
            outbound,
            closed: Arc::new(closed),
        };
        (handle, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Queues `frame` for delivery without waiting.
    ///
    /// A full queue drops the frame rather than blocking the caller.
    pub fn enqueue(&self, frame: WsMessage) -> Result<(), EnqueueError> {
        if self.is_closed() {
            return Err(EnqueueError::Closed);
        }
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Marks the connection closed and wakes both pumps.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn close(&self) -> bool {
        !self.closed.send_replace(true)
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this only returns once closed.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
