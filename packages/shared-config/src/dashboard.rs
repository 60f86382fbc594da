//! Dashboard connection configuration

use url::Url;

use crate::{env_or, parse_env, ConfigError, ConfigResult};

const DEFAULT_DASHBOARD_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the dashboard lives and how to authenticate against it
#[derive(Clone)]
pub struct DashboardConfig {
    /// Dashboard origin, e.g. `https://music.example.com`
    pub url: String,

    /// Value of the `session` cookie issued at login
    pub session: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("url", &self.url)
            .field("session", &self.session.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl DashboardConfig {
    /// Load dashboard configuration from environment variables
    ///
    /// # Errors
    /// - `ConfigError::InvalidUrl` if `DASHBOARD_URL` is not an http(s) URL
    /// - `ConfigError::InvalidValue` if `DASHBOARD_TIMEOUT` is not a number
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            url: env_or("DASHBOARD_URL", DEFAULT_DASHBOARD_URL),
            session: std::env::var("DASHBOARD_SESSION")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            timeout_secs: parse_env("DASHBOARD_TIMEOUT", DEFAULT_TIMEOUT_SECS)?,
        };
        config.origin()?;
        Ok(config)
    }

    /// Create a configuration with a custom URL (useful for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Parsed dashboard origin
    pub fn origin(&self) -> ConfigResult<Url> {
        let url = Url::parse(self.url.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidUrl {
                name: "DASHBOARD_URL".to_string(),
                reason: e.to_string(),
            })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidUrl {
                name: "DASHBOARD_URL".to_string(),
                reason: format!("unsupported scheme {}", other),
            }),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DASHBOARD_URL.to_string(),
            session: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
