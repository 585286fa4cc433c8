//! The `error` module defines the crate-level error type used by the
//! binary and by server startup.
//!
//! Per-component failures (duplicate connections, malformed frames, store
//! and auth errors) have their own types next to the code that raises
//! them; this type only aggregates the ones that can stop the process.

use thiserror::Error;

use crate::persistence::StoreError;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
