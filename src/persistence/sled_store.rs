use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};

use crate::hub::message::{Message, RoomId, UserId};
use crate::persistence::{MembershipOracle, MessageStore, StoreError};

const MEMBERSHIPS_TREE: &str = "memberships";
const MESSAGES_TREE: &str = "messages";

/// A message record as persisted.
///
/// # Fields
///
/// - `id` - Monotonic id assigned by the store; records sort by it.
/// - `sender_id` - Authenticated sender.
/// - `recipient_id` / `room_id` - Exactly one is set.
/// - `content` - The message text.
/// - `timestamp` - When the store accepted the record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: u64,
    pub sender_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Room memberships and the message log, kept in one `sled` database.
///
/// Clones share the same underlying handle.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
    memberships: Tree,
    messages: Tree,
}

fn membership_key(room_id: RoomId, user_id: UserId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&room_id.to_be_bytes());
    key[8..].copy_from_slice(&user_id.to_be_bytes());
    key
}

impl SledStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        Self::from_db(sled::open(path)?)
    }

    pub fn from_db(db: Db) -> Result<Self, StoreError> {
        let memberships = db.open_tree(MEMBERSHIPS_TREE)?;
        let messages = db.open_tree(MESSAGES_TREE)?;
        Ok(Self {
            db,
            memberships,
            messages,
        })
    }

    /// Adds `user_id` to `room_id`. Returns `false` if already a member.
    pub fn add_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, StoreError> {
        let previous = self
            .memberships
            .insert(membership_key(room_id, user_id), Vec::<u8>::new())?;
        Ok(previous.is_none())
    }

    /// Removes `user_id` from `room_id`. Returns `false` if not a member.
    pub fn remove_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, StoreError> {
        let previous = self.memberships.remove(membership_key(room_id, user_id))?;
        Ok(previous.is_some())
    }

    pub fn members(&self, room_id: RoomId) -> Result<Vec<UserId>, StoreError> {
        self.memberships
            .scan_prefix(room_id.to_be_bytes())
            .keys()
            .map(|key| -> Result<UserId, StoreError> {
                let key = key?;
                let mut user = [0u8; 8];
                user.copy_from_slice(&key[8..16]);
                Ok(UserId::from_be_bytes(user))
            })
            .collect()
    }

    /// Every persisted message, in append order.
    pub fn stored_messages(&self) -> Result<Vec<StoredMessage>, StoreError> {
        self.messages
            .iter()
            .values()
            .map(|value| -> Result<StoredMessage, StoreError> {
                Ok(serde_json::from_slice(&value?)?)
            })
            .collect()
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl MembershipOracle for SledStore {
    fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, StoreError> {
        Ok(self
            .memberships
            .contains_key(membership_key(room_id, user_id))?)
    }
}

impl MessageStore for SledStore {
    fn append(&self, message: &Message) -> Result<(), StoreError> {
        let record = StoredMessage {
            id: self.db.generate_id()?,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id(),
            room_id: message.room_id(),
            content: message.content.clone(),
            timestamp: Utc::now(),
        };
        let serialized = serde_json::to_vec(&record)?;
        self.messages.insert(record.id.to_be_bytes(), serialized)?;
        Ok(())
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("db", &"sled::Db")
            .finish()
    }
}
