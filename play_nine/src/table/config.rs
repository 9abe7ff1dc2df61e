//! Table actor configuration.

use std::time::Duration;

/// Table actor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// An actor with an empty inbox for this long shuts down (default: 5 minutes)
    pub idle_timeout: Duration,

    /// Inbox depth per actor (default: 100)
    pub inbox_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(300),
            inbox_capacity: 100,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_timeout.is_zero() {
            return Err("Idle timeout must be positive".to_string());
        }
        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
