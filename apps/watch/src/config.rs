//! Watch configuration loaded from environment variables and arguments
//!
//! Dashboard location, session and sync tuning come from the shared
//! configuration. The target is taken from the first CLI argument, falling
//! back to `SYNC_TARGET`.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use encore_shared_config::{CommonConfig, DashboardConfig, Environment, SyncConfig};
use encore_sync::{BackoffPolicy, Target};
use url::Url;

/// Watch configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other clients
    pub common: CommonConfig,

    /// Target to observe at startup, if any
    pub target: Option<Target>,
}

impl Config {
    /// Load configuration from the environment and process arguments
    pub fn from_env() -> Result<Self> {
        Self::from_env_and_args(env::args().skip(1))
    }

    /// Load configuration, taking the target from `args` before `SYNC_TARGET`
    pub fn from_env_and_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let raw_target = args
            .into_iter()
            .next()
            .or_else(|| env::var("SYNC_TARGET").ok())
            .filter(|t| !t.trim().is_empty());

        let target = raw_target
            .map(|t| t.parse::<Target>())
            .transpose()
            .context("Invalid target")?;

        Ok(Self { common, target })
    }

    pub fn dashboard(&self) -> &DashboardConfig {
        &self.common.dashboard
    }

    pub fn sync(&self) -> &SyncConfig {
        &self.common.sync
    }

    /// Dashboard origin the websocket endpoint is derived from
    pub fn origin(&self) -> Result<Url> {
        self.common
            .dashboard
            .origin()
            .context("Invalid DASHBOARD_URL")
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_ms: self.common.sync.backoff_initial_ms,
            max_ms: self.common.sync.backoff_max_ms,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.common.sync.tick_ms)
    }

    pub fn session(&self) -> Option<&str> {
        self.common.dashboard.session.as_deref()
    }

    pub fn environment(&self) -> Environment {
        self.common.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: [(&str, Option<&str>); 8] = [
        ("DASHBOARD_URL", None),
        ("ENVIRONMENT", None),
        ("DASHBOARD_SESSION", None),
        ("DASHBOARD_TIMEOUT", None),
        ("SYNC_TARGET", None),
        ("SYNC_BACKOFF_INITIAL_MS", None),
        ("SYNC_BACKOFF_MAX_MS", None),
        ("SYNC_TICK_MS", None),
    ];

    #[test]
    fn test_defaults() {
        temp_env::with_vars(CLEAN, || {
            let config = Config::from_env_and_args(Vec::<String>::new()).unwrap();
            assert!(config.target.is_none());
            assert_eq!(config.origin().unwrap().as_str(), "http://localhost:8080/");
            assert_eq!(config.backoff_policy(), BackoffPolicy::default());
            assert_eq!(config.tick(), Duration::from_millis(500));
            assert!(config.session().is_none());
        });
    }

    /// Clean environment with `overrides` applied on top
    fn env_with<'a>(overrides: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
        let mut vars: Vec<_> = CLEAN
            .iter()
            .filter(|(name, _)| !overrides.iter().any(|(o, _)| o == name))
            .copied()
            .collect();
        vars.extend_from_slice(overrides);
        vars
    }

    #[test]
    fn test_argument_wins_over_env() {
        temp_env::with_vars(env_with(&[("SYNC_TARGET", Some("from-env"))]), || {
            let config = Config::from_env_and_args(vec!["from-arg".to_string()]).unwrap();
            assert_eq!(config.target.unwrap().as_str(), "from-arg");

            let config = Config::from_env_and_args(Vec::<String>::new()).unwrap();
            assert_eq!(config.target.unwrap().as_str(), "from-env");
        });
    }

    #[test]
    fn test_invalid_target_rejected() {
        temp_env::with_vars(CLEAN, || {
            let result = Config::from_env_and_args(vec!["../etc".to_string()]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_backoff_from_env() {
        let vars = env_with(&[
            ("SYNC_BACKOFF_INITIAL_MS", Some("200")),
            ("SYNC_BACKOFF_MAX_MS", Some("800")),
        ]);
        temp_env::with_vars(vars, || {
            let config = Config::from_env_and_args(Vec::<String>::new()).unwrap();
            assert_eq!(
                config.backoff_policy(),
                BackoffPolicy {
                    initial_ms: 200,
                    max_ms: 800
                }
            );
        });
    }
}
