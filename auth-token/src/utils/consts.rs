use std::time::Duration;

pub mod env {
    pub const CONFIG_PATH_ENV_VAR: &str = "AUTH_TOKEN_CONFIG";
}

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

// Keeps `now + expiration` inside the four-digit years RFC 3339 can carry.
pub const MAX_EXPIRATION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

pub const MIN_FILE_EXPIRATION: Duration = Duration::from_secs(1);
