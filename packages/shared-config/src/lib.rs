//! Shared configuration types for Encore clients
//!
//! This crate reads the environment the watch app and any other dashboard
//! client run in: where the dashboard is, which session cookie to present,
//! and how the realtime channel should back off.

mod dashboard;
mod error;
mod sync;
mod vars;

pub use dashboard::DashboardConfig;
pub use error::{ConfigError, ConfigResult};
pub use sync::SyncConfig;
pub use vars::{env_or, parse_env};

use std::fmt;
use std::str::FromStr;

/// Configuration shared by every dashboard client
#[derive(Debug, Clone)]
pub struct CommonConfig {
    pub dashboard: DashboardConfig,
    pub sync: SyncConfig,
    /// Deployment the client talks to, from `ENVIRONMENT`
    pub environment: Environment,
}

/// Which dashboard deployment the client is pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "dev" | "development" | "local" => Ok(Self::Development),
            "stage" | "staging" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Production),
            other => Err(ConfigError::InvalidValue {
                name: "ENVIRONMENT".to_string(),
                reason: format!("unknown environment {:?}", other),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        })
    }
}

impl CommonConfig {
    /// Load common configuration from environment variables
    ///
    /// Outside development a session cookie is only accepted over https.
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            dashboard: DashboardConfig::from_env()?,
            sync: SyncConfig::from_env()?,
            environment: env_or("ENVIRONMENT", "development").parse()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.sync.validate()?;
        let origin = self.dashboard.origin()?;
        if self.environment != Environment::Development
            && self.has_session()
            && origin.scheme() != "https"
        {
            return Err(ConfigError::ValidationError(format!(
                "refusing to send the session cookie to {} over plain http in {}",
                origin, self.environment
            )));
        }
        Ok(())
    }

    pub fn has_session(&self) -> bool {
        self.dashboard.session.is_some()
    }
}
