//! Dashboard API error types

use thiserror::Error;

/// Dashboard REST client errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Session cookie missing, expired or rejected (HTTP 401)
    #[error("Dashboard session is not authenticated")]
    Unauthorized,

    /// Authenticated, but not allowed to see this target (HTTP 403)
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Dashboard returned an `error` body or a non-success status
    #[error("Dashboard API error {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse dashboard response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request timeout
    #[error("Request to dashboard timed out")]
    Timeout,

    /// Invalid input provided to a client method
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DashboardError {
    /// Whether the caller should prompt for a new login
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, DashboardError::Unauthorized | DashboardError::Forbidden(_))
    }
}

/// Result type for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
