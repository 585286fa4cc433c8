use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::hub::message::{Message, RoomId, UserId};
use crate::persistence::{MembershipOracle, MessageStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    memberships: HashSet<(RoomId, UserId)>,
    appended: Vec<Message>,
    fail_appends: bool,
}

/// In-memory membership table and message log.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the hub owns another. Appends can be made to fail on demand.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_member(&self, room_id: RoomId, user_id: UserId) -> bool {
        self.state().memberships.insert((room_id, user_id))
    }

    pub fn remove_member(&self, room_id: RoomId, user_id: UserId) -> bool {
        self.state().memberships.remove(&(room_id, user_id))
    }

    /// Every message passed to `append`, including ones that were made to fail.
    pub fn appended(&self) -> Vec<Message> {
        self.state().appended.clone()
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.state().fail_appends = fail;
    }
}

impl MembershipOracle for MemoryStore {
    fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, StoreError> {
        Ok(self.state().memberships.contains(&(room_id, user_id)))
    }
}

impl MessageStore for MemoryStore {
    fn append(&self, message: &Message) -> Result<(), StoreError> {
        let mut state = self.state();
        state.appended.push(message.clone());
        if state.fail_appends {
            return Err(StoreError::Unavailable("appends disabled".to_string()));
        }
        Ok(())
    }
}
