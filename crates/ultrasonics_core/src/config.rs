//! Store configuration.
//!
//! # Responsibility
//! - Hold the database location and connection tuning for `Store::open`.
//! - Read overrides from the process environment.
//!
//! # Invariants
//! - `from_env` never fails; malformed overrides fall back to defaults and
//!   are logged.

use log::warn;
use std::path::PathBuf;
use std::time::Duration;

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "config/ultrasonics.db";
/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "ULTRASONICS_DB_PATH";
/// Environment variable overriding the SQLite busy timeout in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "ULTRASONICS_BUSY_TIMEOUT_MS";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the backing SQLite file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Creates a config for `db_path` with default tuning.
    pub fn with_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    /// Builds a config from defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                config.db_path = PathBuf::from(trimmed);
            }
        }

        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(millis) => config.busy_timeout = Duration::from_millis(millis),
                Err(err) => warn!(
                    "event=config_load module=config status=error error_code=invalid_busy_timeout value={} error={}",
                    raw, err
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, BUSY_TIMEOUT_ENV, DB_PATH_ENV, DEFAULT_DB_PATH};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn defaults_point_at_config_dir() {
        let config = StoreConfig::default();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn lookup_overrides_path_and_timeout() {
        let config = StoreConfig::from_lookup(|key| match key {
            DB_PATH_ENV => Some(" /tmp/custom.db ".to_string()),
            BUSY_TIMEOUT_ENV => Some("250".to_string()),
            _ => None,
        });
        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn invalid_timeout_keeps_default() {
        let config = StoreConfig::from_lookup(|key| match key {
            BUSY_TIMEOUT_ENV => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config, StoreConfig::default());
    }
}
