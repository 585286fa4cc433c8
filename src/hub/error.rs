use thiserror::Error;

use crate::hub::message::UserId;

/// A second connection was offered for a user that already holds a live one.
///
/// The existing connection is left untouched; the caller owns the rejected
/// transport and is expected to close it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("user {user_id} already has a live connection")]
pub struct DuplicateConnection {
    pub user_id: UserId,
}
