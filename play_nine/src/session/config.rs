//! Session liveness configuration.

use std::time::Duration;

/// Default time a connection may go without a heartbeat (20 seconds)
pub const DEFAULT_STALE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(20);

/// Default time a disconnected player keeps their seat (60 seconds)
pub const DEFAULT_INACTIVE_PLAYER_TIMEOUT: Duration = Duration::from_secs(60);

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Connections silent for longer than this are dropped
    pub stale_connection_timeout: Duration,

    /// Players with no connection for longer than this are removed from their table
    pub inactive_player_timeout: Duration,

    /// Per-connection outbound queue depth
    pub outbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stale_connection_timeout: DEFAULT_STALE_CONNECTION_TIMEOUT,
            inactive_player_timeout: DEFAULT_INACTIVE_PLAYER_TIMEOUT,
            outbound_buffer: 32,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.stale_connection_timeout.is_zero() {
            return Err("Stale connection timeout must be positive".to_string());
        }
        if self.inactive_player_timeout <= self.stale_connection_timeout {
            return Err(
                "Inactive player timeout must exceed the stale connection timeout".to_string(),
            );
        }
        if self.outbound_buffer == 0 {
            return Err("Outbound buffer must hold at least one message".to_string());
        }
        Ok(())
    }
}
