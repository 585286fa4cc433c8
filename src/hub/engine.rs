use std::fmt::Display;
use std::sync::Arc;

use futures_util::{Sink, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};
use tungstenite::protocol::CloseFrame;
use tungstenite::protocol::Message as WsMessage;
use tungstenite::protocol::frame::coding::CloseCode;

use crate::config::HubSettings;
use crate::connection::{ConnectionHandle, Disconnect, read_pump, teardown, write_pump};
use crate::hub::dispatcher::Dispatcher;
use crate::hub::error::DuplicateConnection;
use crate::hub::message::{Message, UserId};
use crate::hub::registry::ConnectionRegistry;
use crate::persistence::{MembershipOracle, MessageStore};

/// The real-time hub: the connection registry plus the channel into the
/// dispatcher task.
///
/// Cloning a `Hub` yields another handle to the same registry and dispatcher.
#[derive(Debug, Clone)]
pub struct Hub {
    registry: ConnectionRegistry,
    inbound: mpsc::Sender<Message>,
    settings: HubSettings,
}

impl Hub {
    /// Spawns the dispatcher and returns the hub together with its task handle.
    ///
    /// The dispatcher runs until the hub and every connection have been dropped.
    pub fn start(
        settings: HubSettings,
        membership: Arc<dyn MembershipOracle>,
        store: Arc<dyn MessageStore>,
    ) -> (Self, JoinHandle<()>) {
        let registry = ConnectionRegistry::new();
        let (inbound, rx) = mpsc::channel(settings.inbound_capacity.max(1));
        let dispatcher = Dispatcher::new(registry.clone(), membership, store);
        let task = tokio::spawn(dispatcher.run(rx));
        (
            Self {
                registry,
                inbound,
                settings,
            },
            task,
        )
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    fn admit(
        &self,
        user_id: UserId,
    ) -> Result<(ConnectionHandle, mpsc::Receiver<WsMessage>), DuplicateConnection> {
        let (connection, outbound) = ConnectionHandle::new(user_id, self.settings.outbound_capacity);
        if let Err(e) = self.registry.register(connection.clone()) {
            warn!(user_id, "rejecting connection: {e}");
            return Err(e);
        }
        info!(user_id, connection_id = %connection.id(), "connection registered");
        Ok((connection, outbound))
    }

    fn spawn_pumps<Si, St, E>(
        &self,
        connection: &ConnectionHandle,
        outbound: mpsc::Receiver<WsMessage>,
        sink: Si,
        stream: St,
    ) where
        Si: Sink<WsMessage> + Unpin + Send + 'static,
        Si::Error: Display + Send,
        St: Stream<Item = Result<WsMessage, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        tokio::spawn(write_pump(
            connection.clone(),
            outbound,
            sink,
            self.registry.clone(),
        ));
        tokio::spawn(read_pump(
            connection.clone(),
            stream,
            self.inbound.clone(),
            self.registry.clone(),
            self.settings.max_frame_bytes,
        ));
    }

    /// Registers `user_id` over an already split transport and starts its pumps.
    ///
    /// On [`DuplicateConnection`] both transport halves are dropped and the
    /// existing connection is left alone.
    pub fn connect<Si, St, E>(
        &self,
        user_id: UserId,
        sink: Si,
        stream: St,
    ) -> Result<ConnectionHandle, DuplicateConnection>
    where
        Si: Sink<WsMessage> + Unpin + Send + 'static,
        Si::Error: Display + Send,
        St: Stream<Item = Result<WsMessage, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let (connection, outbound) = self.admit(user_id)?;
        self.spawn_pumps(&connection, outbound, sink, stream);
        Ok(connection)
    }

    /// Registration hook for a freshly upgraded WebSocket.
    ///
    /// A duplicate is sent a policy close frame before the socket is dropped.
    pub async fn on_connect<S>(
        &self,
        user_id: UserId,
        mut ws: WebSocketStream<S>,
    ) -> Result<ConnectionHandle, DuplicateConnection>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (connection, outbound) = match self.admit(user_id) {
            Ok(admitted) => admitted,
            Err(e) => {
                let frame = CloseFrame {
                    code: CloseCode::Policy,
                    reason: "already connected".into(),
                };
                let _ = ws.close(Some(frame)).await;
                return Err(e);
            }
        };
        let (sink, stream) = ws.split();
        self.spawn_pumps(&connection, outbound, sink, stream);
        Ok(connection)
    }

    /// Tears down the live connection for `user_id`, if any.
    pub fn disconnect(&self, user_id: UserId) -> bool {
        match self.registry.get(user_id) {
            Some(connection) => {
                teardown(&self.registry, &connection, Disconnect::Closed);
                true
            }
            None => false,
        }
    }

    /// Tears down every live connection.
    pub fn shutdown(&self) {
        let connections = self.registry.snapshot();
        info!(count = connections.len(), "closing all connections");
        for (_, connection) in connections {
            teardown(&self.registry, &connection, Disconnect::Closed);
        }
    }
}
