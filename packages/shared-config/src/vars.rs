//! Environment variable readers

use std::env;
use std::str::FromStr;

use crate::{ConfigError, ConfigResult};

/// Read a variable, falling back to `default` when unset
pub fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse a variable, falling back to `default` when unset
///
/// Surrounding whitespace is ignored.
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("{} ({:?})", e, raw),
    })
}
