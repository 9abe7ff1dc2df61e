//! # Play Nine
//!
//! A server-authoritative engine for the card game Play Nine, plus the
//! live-session layer that keeps every viewer of a table in sync.
//!
//! ## Architecture
//!
//! A game is played over nine holes. Each hole moves a table through four
//! phases:
//!
//! - **Waiting**: players gather; anyone seated can start
//! - **Reveal**: everyone flips two of their eight face-down cards
//! - **Play**: turns of draw, then replace, discard-and-flip, or put back;
//!   the first player to have all cards face-up ends the hole, and everyone
//!   else gets one final turn
//! - **Scoring**: hands are scored by column and added to the running totals
//!
//! Each table is owned by a single actor task that loads the record, applies
//! the action, saves, and broadcasts the redacted view to every connection.
//!
//! ## Core Modules
//!
//! - [`game`]: Deck, scoring, the table state machine, and client views
//! - [`store`]: Persistence of table records
//! - [`table`]: Per-table actors and the manager that routes to them
//! - [`session`]: Live connections, heartbeats, and inactivity timers
//! - [`sync`]: Broadcasting and the periodic liveness sweeps
//! - [`protocol`]: Parsing of client messages
//!
//! ## Example
//!
//! ```
//! use play_nine::game::{PlayerName, Table, TableName};
//!
//! let mut table = Table::new(TableName::parse("sunday").unwrap());
//! table.add_player(PlayerName::parse("alice").unwrap()).unwrap();
//! table.add_player(PlayerName::parse("bob").unwrap()).unwrap();
//! table.start().unwrap();
//! assert_eq!(table.card_count(), 108);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Action, GameError, Phase, PlayerId, PlayerName, Table, TableName, TableView,
    constants::{self, DECK_SIZE, MAX_PLAYERS},
    scoring::score_hand,
};

pub mod protocol;
pub mod session;
pub mod store;
pub mod sync;
pub mod table;
