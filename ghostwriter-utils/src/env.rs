use std::collections::HashMap;
use std::env;

/// Startup configuration that is missing or malformed. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("required environment variable `{key}` is missing or empty")]
    Missing { key: String },
    #[error("environment variable `{key}` has invalid value `{value}`: expected {expected}")]
    Invalid {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Where configuration values are read from.
pub trait VarSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl VarSource for HashMap<&str, &str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| (*value).to_owned())
    }
}

/// Trimmed value of `key`, or `None` when unset or blank.
pub fn env_string(source: &impl VarSource, key: &str) -> Option<String> {
    source
        .var(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn env_string_or(source: &impl VarSource, key: &str, default: &str) -> String {
    env_string(source, key).unwrap_or_else(|| default.to_owned())
}

pub fn require_env(source: &impl VarSource, key: &str) -> Result<String, ConfigurationError> {
    env_string(source, key).ok_or_else(|| ConfigurationError::Missing {
        key: key.to_owned(),
    })
}

/// Parse `key` as an unsigned integer. Garbage is an error rather than a
/// silent fallback to the default.
pub fn env_u64(source: &impl VarSource, key: &str, default: u64) -> Result<u64, ConfigurationError> {
    match env_string(source, key) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigurationError::Invalid {
                key: key.to_owned(),
                value,
                expected: "an unsigned integer",
            }),
        None => Ok(default),
    }
}

pub fn env_u16(source: &impl VarSource, key: &str, default: u16) -> Result<u16, ConfigurationError> {
    match env_string(source, key) {
        Some(value) => value
            .parse::<u16>()
            .map_err(|_| ConfigurationError::Invalid {
                key: key.to_owned(),
                value,
                expected: "a port number (0-65535)",
            }),
        None => Ok(default),
    }
}
