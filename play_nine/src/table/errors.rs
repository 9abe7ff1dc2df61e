//! Table request error types.

use thiserror::Error;

use crate::{
    game::{GameError, NameError},
    session::SessionError,
    store::StoreError,
};

/// Errors surfaced by [`super::TableManager`] requests
#[derive(Debug, Error)]
pub enum TableError {
    /// The action broke a game rule
    #[error(transparent)]
    Game(#[from] GameError),

    /// Connection bookkeeping refused the request
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Loading or saving the table failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Table or player name failed validation
    #[error(transparent)]
    InvalidName(#[from] NameError),

    /// Nobody has created this table
    #[error("Table not found")]
    TableNotFound,

    /// The action needs a seated player's id
    #[error("Player ID required")]
    PlayerIdRequired,

    /// The table actor is gone and could not be restarted
    #[error("Table is closed")]
    TableClosed,
}

impl TableError {
    /// Get a client-safe error message
    ///
    /// Storage failures are reported as a missing table.
    pub fn client_message(&self) -> String {
        match self {
            TableError::Store(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for table requests
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_store_errors_are_sanitized() {
        let err = TableError::from(StoreError::Io(io::Error::other("disk on fire")));
        assert_eq!(err.client_message(), "Table not found");
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_game_errors_pass_through() {
        let err = TableError::from(GameError::NotYourTurn);
        assert_eq!(err.client_message(), "Not your turn");
        assert_eq!(TableError::PlayerIdRequired.client_message(), "Player ID required");
    }
}
