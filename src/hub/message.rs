/// Identity of an authenticated user.
pub type UserId = i64;

/// Identity of a chat room.
pub type RoomId = i64;

/// Where a message is routed: every connected member of a room, or a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Room(RoomId),
    Direct(UserId),
}

/// A validated chat message accepted by the hub.
///
/// The sender is always the authenticated identity of the connection the
/// message arrived on. Exactly one addressing mode is carried by `target`,
/// and `content` is never blank.
///
/// # Example
///
/// ```rust
/// use chathub::hub::message::{Message, Target};
///
/// let msg = Message {
///     sender_id: 1,
///     target: Target::Room(5),
///     content: "hi".to_string(),
/// };
/// assert_eq!(msg.room_id(), Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender_id: UserId,
    pub target: Target,
    pub content: String,
}

impl Message {
    pub fn room_id(&self) -> Option<RoomId> {
        match self.target {
            Target::Room(room_id) => Some(room_id),
            Target::Direct(_) => None,
        }
    }

    pub fn recipient_id(&self) -> Option<UserId> {
        match self.target {
            Target::Direct(user_id) => Some(user_id),
            Target::Room(_) => None,
        }
    }
}
