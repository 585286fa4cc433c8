//! # chathub
//!
//! `chathub` is a real-time chat hub built with Rust. Authenticated users
//! hold one WebSocket connection each and exchange JSON messages, either
//! with every connected member of a room or with a single recipient. Every
//! accepted message is also appended to durable storage.
//!
//! ## Core Modules
//!
//! - `hub`: the connection registry, the dispatcher, and the `Hub` facade.
//! - `connection`: per-connection handle plus the read and write pumps.
//! - `transport`: the wire message format and the WebSocket server.
//! - `auth`: resolving bearer tokens to user ids.
//! - `persistence`: room membership and the message log (`sled`).
//! - `config`: loading server configuration.
//! - `utils`: the crate error type and logging setup.

pub mod auth;
pub mod config;
pub mod connection;
pub mod hub;
pub mod persistence;
pub mod transport;
pub mod utils;
