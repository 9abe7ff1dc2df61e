//! HTTP and WebSocket front end for Play Nine tables.
//!
//! The binary in `main.rs` wires these modules to a file-backed store; the
//! integration tests wire them to an in-memory one.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
