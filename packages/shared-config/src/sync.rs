//! Realtime sync tuning

use crate::{parse_env, ConfigError, ConfigResult};

/// Reconnect backoff and render cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// First reconnect delay in milliseconds
    pub backoff_initial_ms: u64,

    /// Reconnect delay cap in milliseconds
    pub backoff_max_ms: u64,

    /// How often the displayed position is refreshed, in milliseconds
    pub tick_ms: u64,
}

impl SyncConfig {
    /// Load sync configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            backoff_initial_ms: parse_env("SYNC_BACKOFF_INITIAL_MS", 1000)?,
            backoff_max_ms: parse_env("SYNC_BACKOFF_MAX_MS", 30_000)?,
            tick_ms: parse_env("SYNC_TICK_MS", 500)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that `1 <= initial <= max` and the tick is non-zero
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backoff_initial_ms == 0 {
            return Err(ConfigError::ValidationError(
                "SYNC_BACKOFF_INITIAL_MS must be at least 1".to_string(),
            ));
        }
        if self.backoff_max_ms < self.backoff_initial_ms {
            return Err(ConfigError::ValidationError(format!(
                "SYNC_BACKOFF_MAX_MS ({}) must not be below SYNC_BACKOFF_INITIAL_MS ({})",
                self.backoff_max_ms, self.backoff_initial_ms
            )));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ValidationError(
                "SYNC_TICK_MS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backoff_initial_ms: 1000,
            backoff_max_ms: 30_000,
            tick_ms: 500,
        }
    }
}
