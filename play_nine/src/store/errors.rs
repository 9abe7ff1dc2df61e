//! Table store error types.

use std::time::Duration;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record could not be encoded or decoded
    #[error("Corrupt table record: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Operation did not finish in time
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Get a client-safe error message.
    ///
    /// Storage details never reach clients; a table that can't be read is
    /// reported the same way as one that doesn't exist.
    pub fn client_message(&self) -> String {
        "Table not found".to_string()
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
