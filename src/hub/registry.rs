//! Registry of live connections, keyed by user.
//!
//! At most one connection exists per user at any instant. All reads and
//! writes go through one lock that is never held across an `.await` or
//! while enqueueing onto a connection's outbound queue: callers that fan
//! out take a [`ConnectionRegistry::snapshot`] first and release the lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::connection::ConnectionHandle;
use crate::hub::error::DuplicateConnection;
use crate::hub::message::UserId;

#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<Mutex<HashMap<UserId, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere cannot leave the map half-updated: every critical
    // section below is a single map operation.
    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, ConnectionHandle>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs `connection` under its user id.
    ///
    /// Fails with [`DuplicateConnection`] if that user is already registered.
    pub fn register(&self, connection: ConnectionHandle) -> Result<(), DuplicateConnection> {
        let user_id = connection.user_id();
        match self.lock().entry(user_id) {
            Entry::Occupied(_) => Err(DuplicateConnection { user_id }),
            Entry::Vacant(slot) => {
                slot.insert(connection);
                Ok(())
            }
        }
    }

    /// Removes whatever connection is registered for `user_id`. Idempotent.
    pub fn unregister(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.lock().remove(&user_id)
    }

    /// Removes `connection` only if it is still the one registered for its user.
    ///
    /// Teardown uses this so a stale connection can never evict a newer
    /// registration for the same user.
    pub fn remove(&self, connection: &ConnectionHandle) -> bool {
        let mut connections = self.lock();
        match connections.get(&connection.user_id()) {
            Some(current) if current.id() == connection.id() => {
                connections.remove(&connection.user_id());
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.lock().get(&user_id).cloned()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.lock().contains_key(&user_id)
    }

    /// Point-in-time copy of every live connection, for fan-out.
    pub fn snapshot(&self) -> Vec<(UserId, ConnectionHandle)> {
        self.lock()
            .iter()
            .map(|(user_id, connection)| (*user_id, connection.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
