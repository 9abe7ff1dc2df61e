//! Session error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ConnectionId;

/// Session errors
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SessionError {
    /// The player already has a live connection at this table
    #[error("Player already connected elsewhere")]
    AlreadyConnected,

    /// No such live connection
    #[error("Unknown connection {0}")]
    UnknownConnection(ConnectionId),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
