//! State synchronization between tables and their viewers.
//!
//! - [`Broadcaster`]: fans the redacted view of a table out to every live
//!   connection of that table
//! - [`Coordinator`]: periodic sweeps for dead connections and absent players

pub mod broadcaster;
pub mod coordinator;

pub use broadcaster::Broadcaster;
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorHandle, DEFAULT_SWEEP_INTERVAL};
