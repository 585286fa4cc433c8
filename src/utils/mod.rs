//! The `utils` module provides the crate-level error type and the logging
//! bootstrap shared by the binary and the tests.

pub mod error;
pub mod logging;

pub use error::HubError;
