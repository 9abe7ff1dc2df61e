//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use play_nine::{session::SessionConfig, sync::CoordinatorConfig, table::TableConfig};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Default directory for table records
pub const DEFAULT_DATA_DIR: &str = "/play9";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Where table records are written
    pub data_dir: PathBuf,
    /// Bound on every store call
    pub store_timeout: Duration,
    /// Connection liveness settings
    pub session: SessionConfig,
    /// Table actor settings
    pub table: TableConfig,
    /// Sweep loop settings
    pub coordinator: CoordinatorConfig,
    /// Optional Prometheus listener
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `data_dir_override` - Optional data directory override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a set variable cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        data_dir_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_strict("SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 6969))),
        };

        let data_dir = data_dir_override
            .or_else(|| std::env::var("PLAY9_DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let session = SessionConfig {
            stale_connection_timeout: secs_env_or("STALE_CONNECTION_TIMEOUT_SECS", 20),
            inactive_player_timeout: secs_env_or("INACTIVE_PLAYER_TIMEOUT_SECS", 60),
            ..SessionConfig::default()
        };

        let table = TableConfig {
            idle_timeout: secs_env_or("TABLE_IDLE_TIMEOUT_SECS", 300),
            ..TableConfig::default()
        };

        let coordinator = CoordinatorConfig {
            sweep_interval: secs_env_or("SWEEP_INTERVAL_SECS", 10),
        };

        Ok(ServerConfig {
            bind,
            data_dir,
            store_timeout: secs_env_or("STORE_TIMEOUT_SECS", 5),
            session,
            table,
            coordinator,
            metrics_bind: parse_env_strict("METRICS_BIND")?,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("STORE_TIMEOUT_SECS", self.store_timeout),
            ("SWEEP_INTERVAL_SECS", self.coordinator.sweep_interval),
            ("TABLE_IDLE_TIMEOUT_SECS", self.table.idle_timeout),
        ];
        for (var, value) in durations {
            if value.is_zero() {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        self.session
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "INACTIVE_PLAYER_TIMEOUT_SECS".to_string(),
                reason,
            })?;
        self.table.validate().map_err(|reason| ConfigError::Invalid {
            var: "TABLE_IDLE_TIMEOUT_SECS".to_string(),
            reason,
        })?;

        if self.session.stale_connection_timeout <= self.coordinator.sweep_interval {
            return Err(ConfigError::Invalid {
                var: "STALE_CONNECTION_TIMEOUT_SECS".to_string(),
                reason: format!(
                    "Must be greater than the sweep interval ({}s)",
                    self.coordinator.sweep_interval.as_secs()
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn secs_env_or(key: &str, default: u64) -> Duration {
    Duration::from_secs(parse_env_or(key, default))
}

/// `None` when unset; an error when set but unparseable.
fn parse_env_strict<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}
