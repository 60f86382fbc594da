//! Error types for the watch host

use encore_dashboard_client::DashboardError;
use encore_shared_config::ConfigError;
use encore_sync::SyncError;
use thiserror::Error;

/// Errors that end the watch session or reject a typed command
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("dashboard error: {0}")]
    Dashboard(#[from] DashboardError),

    /// A typed command could not be parsed
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The event channel closed while the host was still running
    #[error("event channel closed")]
    ChannelClosed,
}

impl WatchError {
    /// Whether the user needs to log in again
    pub fn is_auth_failure(&self) -> bool {
        match self {
            WatchError::Sync(e) => e.is_auth_failure(),
            WatchError::Dashboard(e) => e.is_auth_failure(),
            _ => false,
        }
    }
}

pub type WatchResult<T> = Result<T, WatchError>;
