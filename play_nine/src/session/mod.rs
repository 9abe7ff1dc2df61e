//! Live session tracking.
//!
//! The [`SessionRegistry`] knows which sockets are attached to which table,
//! enforces one live connection per player per table, and keeps the clocks
//! the sweeps use to find dead sockets and abandoned seats.

use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::sync::mpsc;

pub mod config;
pub mod errors;
pub mod registry;

pub use config::SessionConfig;
pub use errors::{SessionError, SessionResult};
pub use registry::SessionRegistry;

/// Sending half of a connection's outbound queue. Messages are serialized once
/// and shared.
pub type Outbound = mpsc::Sender<Arc<str>>;

/// Registry-assigned connection identifier.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
