//! The `connection` module holds everything owned by a single live client:
//! the shared [`ConnectionHandle`] the hub uses to reach it, and the read
//! and write pumps that move frames between its transport and the hub.

pub mod handle;
pub mod pumps;

pub use handle::{ConnectionHandle, EnqueueError};
pub use pumps::{Disconnect, read_pump, teardown, write_pump};

#[cfg(test)]
mod tests;
