//! The `persistence` module defines the two storage collaborators the hub
//! consumes, and the stores that implement them.
//!
//! - [`MembershipOracle`] answers whether a user belongs to a room.
//! - [`MessageStore`] durably appends every accepted message.
//!
//! [`SledStore`] backs both with one embedded `sled` database whose handle
//! is shared by every caller. [`MemoryStore`] keeps everything in memory.

pub mod memory;
pub mod sled_store;

use thiserror::Error;

use crate::hub::message::{Message, RoomId, UserId};

pub use memory::MemoryStore;
pub use sled_store::{SledStore, StoredMessage};

/// Errors raised by a storage collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of room membership.
///
/// Implementations must be safe to call concurrently.
pub trait MembershipOracle: Send + Sync {
    fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, StoreError>;
}

/// Append-only sink for delivered messages.
///
/// The store assigns the timestamp; the hub calls `append` exactly once per
/// accepted message and never retries.
pub trait MessageStore: Send + Sync {
    fn append(&self, message: &Message) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests;
