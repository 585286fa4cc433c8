use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::connection::{ConnectionHandle, EnqueueError};
use crate::hub::message::{Message, RoomId, Target, UserId};
use crate::hub::registry::ConnectionRegistry;
use crate::persistence::{MembershipOracle, MessageStore};
use crate::transport::message::encode_frame;

/// Outcome of dispatching one message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Users whose outbound queue accepted the message.
    pub delivered: Vec<UserId>,
    /// Users whose queue was full; the message was dropped for them only.
    pub dropped: Vec<UserId>,
    /// Whether the message store accepted the append.
    pub persisted: bool,
}

/// The single consumer of validated inbound messages.
///
/// For each message the dispatcher resolves the live recipients, queues
/// the serialized frame for each of them, and appends the message to the
/// store. Delivery and persistence are independent: a failure in one never
/// rolls back or blocks the other.
pub struct Dispatcher {
    registry: ConnectionRegistry,
    membership: Arc<dyn MembershipOracle>,
    store: Arc<dyn MessageStore>,
}

impl Dispatcher {
    pub fn new(
        registry: ConnectionRegistry,
        membership: Arc<dyn MembershipOracle>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            registry,
            membership,
            store,
        }
    }

    /// Processes inbound messages one at a time until every sender is gone.
    ///
    /// All side effects of a message happen before the next one is taken.
    pub async fn run(self, mut inbound: mpsc::Receiver<Message>) {
        info!("dispatcher started");
        while let Some(message) = inbound.recv().await {
            self.dispatch(&message);
        }
        info!("dispatcher stopped");
    }

    /// Delivers and persists one message.
    ///
    /// Membership lookups and the append run inline on the calling task, so
    /// both collaborators must answer in local-disk time. A networked store
    /// would have to move behind `spawn_blocking` or an async trait.
    pub fn dispatch(&self, message: &Message) -> Delivery {
        let mut delivery = Delivery::default();

        match encode_frame(message) {
            Ok(frame) => match message.target {
                Target::Room(room_id) => self.fan_out_room(room_id, &frame, &mut delivery),
                Target::Direct(recipient_id) => {
                    self.fan_out_direct(message.sender_id, recipient_id, &frame, &mut delivery)
                }
            },
            Err(e) => error!(sender_id = message.sender_id, "failed to serialize message: {e}"),
        }

        match self.store.append(message) {
            Ok(()) => delivery.persisted = true,
            Err(e) => error!(
                sender_id = message.sender_id,
                room_id = message.room_id(),
                recipient_id = message.recipient_id(),
                "failed to persist message: {e}"
            ),
        }

        debug!(
            sender_id = message.sender_id,
            delivered = delivery.delivered.len(),
            dropped = delivery.dropped.len(),
            persisted = delivery.persisted,
            "message dispatched"
        );
        delivery
    }

    fn fan_out_room(&self, room_id: RoomId, frame: &WsMessage, delivery: &mut Delivery) {
        for (user_id, connection) in self.registry.snapshot() {
            match self.membership.is_member(user_id, room_id) {
                Ok(true) => enqueue(&connection, frame, delivery),
                Ok(false) => {}
                Err(e) => warn!(user_id, room_id, "membership lookup failed: {e}"),
            }
        }
    }

    fn fan_out_direct(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        frame: &WsMessage,
        delivery: &mut Delivery,
    ) {
        if let Some(connection) = self.registry.get(recipient_id) {
            enqueue(&connection, frame, delivery);
        }
        // Echo, unless the sender wrote to themselves and already got it.
        if sender_id != recipient_id {
            if let Some(connection) = self.registry.get(sender_id) {
                enqueue(&connection, frame, delivery);
            }
        }
    }
}

fn enqueue(connection: &ConnectionHandle, frame: &WsMessage, delivery: &mut Delivery) {
    let user_id = connection.user_id();
    match connection.enqueue(frame.clone()) {
        Ok(()) => delivery.delivered.push(user_id),
        Err(EnqueueError::Full) => {
            warn!(
                user_id,
                connection_id = %connection.id(),
                "slow consumer: outbound queue full, dropping message"
            );
            delivery.dropped.push(user_id);
        }
        Err(EnqueueError::Closed) => {
            debug!(user_id, "skipping connection torn down during fan-out");
        }
    }
}
