//! Table module providing one async actor per table.
//!
//! This module implements:
//! - TableActor: single writer for one table record
//! - TableManager: spawns actors on demand and routes requests to them
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! A request loads the record from the [`crate::store::TableStore`], applies
//! the action, saves, and broadcasts the new view before the actor looks at
//! its next message. Actors stop after an idle period; state lives in the
//! store, so the manager simply spawns a new one on the next request.
//!
//! ## Example
//!
//! ```no_run
//! use play_nine::{
//!     game::Action,
//!     session::{SessionConfig, SessionRegistry},
//!     store::MemoryStore,
//!     table::{TableConfig, TableManager},
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), play_nine::table::TableError> {
//! let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
//! let manager = TableManager::new(Arc::new(MemoryStore::new()), registry, TableConfig::default());
//!
//! let alice = manager.join("sunday", Some("alice")).await?;
//! manager.join("sunday", Some("bob")).await?;
//! let view = manager.act(&alice.table_name, alice.player_id, Action::Start).await?;
//! assert_eq!(view.players.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use errors::{TableError, TableResult};
pub use manager::TableManager;
pub use messages::{JoinOutcome, TableMessage};
