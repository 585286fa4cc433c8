//! The `transport` module is responsible for handling network communication
//! with clients via WebSockets.
//!
//! It defines the JSON frame exchanged with clients and its validation,
//! and implements the WebSocket server: accepting connections,
//! authenticating the upgrade, and handing each connection to the hub.

pub mod message;
pub mod websocket;
