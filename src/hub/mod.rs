//! The `hub` module is the core of the server: the registry of live
//! connections, the dispatcher that fans each inbound message out to its
//! recipients and the store, and the [`Hub`] facade that ties them to
//! connection lifecycles.

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod message;
pub mod registry;

pub use dispatcher::{Delivery, Dispatcher};
pub use engine::Hub;
pub use error::DuplicateConnection;
pub use message::{Message, RoomId, Target, UserId};
pub use registry::ConnectionRegistry;
