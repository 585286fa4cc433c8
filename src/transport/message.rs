use serde::{Deserialize, Serialize};
use thiserror::Error;
use tungstenite::protocol::Message as WsMessage;

use crate::hub::message::{Message, RoomId, Target, UserId};

/// One JSON chat frame, as it travels in either direction.
///
/// Inbound, `sender_id` is ignored and replaced with the connection's
/// authenticated identity. Outbound, `sender_id` is always present and
/// exactly one of `recipient_id` / `room_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    pub content: String,
}

/// An inbound frame that cannot become a [`Message`].
///
/// The frame is discarded; the connection it arrived on stays open.
#[derive(Error, Debug)]
pub enum MalformedMessage {
    #[error("undecodable frame: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("frame sets neither recipient_id nor room_id")]
    MissingAddress,
    #[error("frame sets both recipient_id and room_id")]
    ConflictingAddress,
    #[error("frame content is empty")]
    EmptyContent,
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },
    #[error("binary frames are not accepted")]
    NonTextFrame,
}

impl WireMessage {
    /// Validates this frame and stamps it with the authenticated sender.
    ///
    /// An id of `0` counts as absent, matching clients that always send
    /// both integer fields.
    pub fn into_message(self, sender_id: UserId) -> Result<Message, MalformedMessage> {
        let recipient_id = self.recipient_id.filter(|id| *id != 0);
        let room_id = self.room_id.filter(|id| *id != 0);

        let target = match (recipient_id, room_id) {
            (Some(recipient_id), None) => Target::Direct(recipient_id),
            (None, Some(room_id)) => Target::Room(room_id),
            (Some(_), Some(_)) => return Err(MalformedMessage::ConflictingAddress),
            (None, None) => return Err(MalformedMessage::MissingAddress),
        };

        if self.content.is_empty() {
            return Err(MalformedMessage::EmptyContent);
        }

        Ok(Message {
            sender_id,
            target,
            content: self.content,
        })
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            sender_id: Some(message.sender_id),
            recipient_id: message.recipient_id(),
            room_id: message.room_id(),
            content: message.content.clone(),
        }
    }
}

/// Turns one transport frame into a validated message from `sender_id`.
///
/// Control frames (ping, pong, close) carry no chat payload and yield `Ok(None)`.
pub fn decode_frame(
    sender_id: UserId,
    frame: &WsMessage,
    max_frame_bytes: usize,
) -> Result<Option<Message>, MalformedMessage> {
    match frame {
        WsMessage::Text(text) => {
            if text.len() > max_frame_bytes {
                return Err(MalformedMessage::FrameTooLarge {
                    len: text.len(),
                    max: max_frame_bytes,
                });
            }
            let wire: WireMessage = serde_json::from_str(text.as_str())?;
            wire.into_message(sender_id).map(Some)
        }
        WsMessage::Binary(_) => Err(MalformedMessage::NonTextFrame),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) | WsMessage::Frame(_) => {
            Ok(None)
        }
    }
}

/// Serializes `message` into the text frame delivered to recipients.
pub fn encode_frame(message: &Message) -> Result<WsMessage, serde_json::Error> {
    let json = serde_json::to_string(&WireMessage::from(message))?;
    Ok(WsMessage::text(json))
}
