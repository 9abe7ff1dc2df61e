//! Client message protocol.
//!
//! Clients send JSON objects tagged by `type`. Two tags are session
//! commands that never touch the table (`ping`, `heartbeat`); the rest are
//! game [`Action`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::game::Action;

/// Errors parsing a client message
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ProtocolError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Message type required")]
    MissingType,
    #[error("Malformed message: {0}")]
    Malformed(String),
}

/// A parsed client message
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Ask for the current view
    Ping,
    /// Ask for the current view and refresh connection liveness
    Heartbeat,
    Action(Action),
}

impl Command {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?;

        match tag {
            "ping" => Ok(Self::Ping),
            "heartbeat" => Ok(Self::Heartbeat),
            tag if Action::TAGS.contains(&tag) => serde_json::from_value(value)
                .map(Self::Action)
                .map_err(|e| ProtocolError::Malformed(e.to_string())),
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => write!(f, "ping"),
            Self::Heartbeat => write!(f, "heartbeat"),
            Self::Action(action) => write!(f, "{action}"),
        }
    }
}

/// Error reply sent only to the client that caused it
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_commands() {
        assert_eq!(Command::parse(r#"{"type": "ping"}"#), Ok(Command::Ping));
        assert_eq!(Command::parse(r#"{"type": "heartbeat"}"#), Ok(Command::Heartbeat));
    }

    #[test]
    fn test_action_commands() {
        assert_eq!(
            Command::parse(r#"{"type": "play_flip_after_discard", "card_index": 2}"#),
            Ok(Command::Action(Action::PlayFlipAfterDiscard { card_index: 2 }))
        );
        assert_eq!(
            Command::parse(r#"{"type": "leave"}"#),
            Ok(Command::Action(Action::Leave))
        );
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            Command::parse(r#"{"type": "fold"}"#),
            Err(ProtocolError::UnknownAction("fold".to_string()))
        );
        assert_eq!(
            ProtocolError::UnknownAction("fold".to_string()).to_string(),
            "Unknown action: fold"
        );
    }

    #[test]
    fn test_malformed_messages() {
        assert!(matches!(Command::parse("not json"), Err(ProtocolError::Malformed(_))));
        assert_eq!(Command::parse(r#"{"card_index": 1}"#), Err(ProtocolError::MissingType));
        assert!(matches!(
            Command::parse(r#"{"type": "reveal"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_error_message_shape() {
        let json = serde_json::to_string(&ErrorMessage::new("Not your turn")).unwrap();
        assert_eq!(json, r#"{"error":"Not your turn"}"#);
    }
}
