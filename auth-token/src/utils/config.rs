use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use dotenvy::dotenv;
use serde::Deserialize;
use thiserror::Error;

use super::consts::{env as env_keys, DEFAULT_CONFIG_PATH, MAX_EXPIRATION, MIN_FILE_EXPIRATION};

/// Signing material shared by every token operation.
///
/// Built once at startup and treated as read-only afterwards. Swapping it at
/// runtime goes through `TokenService::replace_config`.
#[derive(Clone)]
pub struct Config {
    secret: Vec<u8>,
    expiration: Duration,
}

impl Config {
    /// Programmatic construction. The secret must be non-empty; a zero
    /// expiration is accepted here and yields tokens that are born expired.
    pub fn new(secret: impl Into<Vec<u8>>, expiration: Duration) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::Invalid("Secret must not be empty"));
        }
        if expiration > MAX_EXPIRATION {
            return Err(ConfigError::Invalid("Expiration must not exceed 100 years"));
        }

        Ok(Self { secret, expiration })
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Load from the file named by `AUTH_TOKEN_CONFIG`, or `config.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env in dev; no-op in prod if not present.
        let _ = dotenv();

        let path = opt_var(env_keys::CONFIG_PATH_ENV_VAR)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw)?;

        let secret = file.secret.ok_or(ConfigError::Missing("Secret"))?;
        let expiration = file.expiration.ok_or(ConfigError::Missing("Expiration"))?;
        let expiration = parse_duration("Expiration", &expiration)?;
        // Expirations are carried in whole seconds; anything shorter is born expired.
        if expiration < MIN_FILE_EXPIRATION {
            return Err(ConfigError::Invalid("Expiration must be at least one second"));
        }

        Self::new(secret.into_bytes(), expiration)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("missing config key {0}")]
    Missing(&'static str),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
    #[error("invalid duration in {key}: {source}")]
    Duration {
        key: &'static str,
        #[source]
        source: humantime::DurationError,
    },
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(rename = "Secret")]
    secret: Option<String>,
    #[serde(rename = "Expiration")]
    expiration: Option<String>,
}

fn opt_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn parse_duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|source| ConfigError::Duration { key, source })
}
