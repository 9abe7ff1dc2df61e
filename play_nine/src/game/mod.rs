//! Play Nine game engine.
//!
//! This module provides the rules of the game:
//! - Deck construction and the card/player entities
//! - Hand scoring
//! - The per-table state machine and its action handlers
//! - Redacted client views

pub mod constants;
pub mod entities;
pub mod scoring;
pub mod state_machine;
pub mod view;

pub use entities::{Action, Card, DrawOrigin, NameError, Player, PlayerId, PlayerName, SeatIndex, TableName};
pub use state_machine::{DrawState, GameError, HoleEnd, Phase, Table};
pub use view::{PlayerView, PublicCard, TableView, ViewPhase};
