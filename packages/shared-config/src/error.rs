//! Configuration error types

use thiserror::Error;

/// Errors raised while reading dashboard and sync settings
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The variable is set but does not parse
    #[error("{name} has an invalid value: {reason}")]
    InvalidValue { name: String, reason: String },

    /// The dashboard location is not an http(s) URL
    #[error("{name} is not a usable dashboard URL: {reason}")]
    InvalidUrl { name: String, reason: String },

    /// Values parse but contradict each other
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Environment variable the error is about, when there is one
    pub fn variable(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidValue { name, .. }
            | ConfigError::InvalidUrl { name, .. } => Some(name),
            ConfigError::ValidationError(_) => None,
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_names_the_setting() {
        let err = ConfigError::InvalidUrl {
            name: "DASHBOARD_URL".to_string(),
            reason: "unsupported scheme ftp".to_string(),
        };
        assert_eq!(err.variable(), Some("DASHBOARD_URL"));
        assert_eq!(
            err.to_string(),
            "DASHBOARD_URL is not a usable dashboard URL: unsupported scheme ftp"
        );
        assert_eq!(ConfigError::ValidationError("x".into()).variable(), None);
    }
}
