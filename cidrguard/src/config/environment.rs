//! Environment variable handling for configuration overrides.
//!
//! This module applies `CIDRGUARD_*` environment variables on top of the
//! values read from `cidrguard.yaml`.

use std::env;
use std::path::PathBuf;

use crate::config::schema::{Config, StorageBackend};
use crate::error::{Error, Result};
use crate::logging::{LogLevel, LOG_MODE_ENV};

/// Selects the storage backend (`memory` or `sqlite`).
pub const STORAGE_ENV: &str = "CIDRGUARD_STORAGE";
/// Overrides the `SQLite` database path.
pub const DB_PATH_ENV: &str = "CIDRGUARD_DB_PATH";
/// Overrides the `SQLite` busy timeout in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "CIDRGUARD_BUSY_TIMEOUT_MS";
/// Overrides the block search strategy.
pub const SEARCH_ENV: &str = "CIDRGUARD_SEARCH";

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use cidrguard::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable value is invalid
    /// (e.g., unknown backend, non-numeric timeout).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        // CIDRGUARD_STORAGE
        if let Ok(val) = env::var(STORAGE_ENV) {
            config.storage.backend = Self::parse_backend(&val)?;
        }

        // CIDRGUARD_DB_PATH
        if let Ok(path) = env::var(DB_PATH_ENV) {
            config.storage.path = Some(PathBuf::from(path));
        }

        // CIDRGUARD_BUSY_TIMEOUT_MS
        if let Ok(ms) = env::var(BUSY_TIMEOUT_ENV) {
            config.storage.busy_timeout_ms =
                Some(ms.trim().parse().map_err(|_| Error::Validation {
                    field: BUSY_TIMEOUT_ENV.into(),
                    message: "Must be a positive integer".into(),
                })?);
        }

        // CIDRGUARD_SEARCH
        if let Ok(search) = env::var(SEARCH_ENV) {
            config.allocation.search = search.parse()?;
        }

        // CIDRGUARD_LOG_MODE
        if let Ok(mode) = env::var(LOG_MODE_ENV) {
            config.log_mode = Some(LogLevel::parse(&mode).map_err(|message| Error::Validation {
                field: LOG_MODE_ENV.into(),
                message,
            })?);
        }

        Ok(())
    }

    fn parse_backend(s: &str) -> Result<StorageBackend> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            _ => Err(Error::Validation {
                field: STORAGE_ENV.into(),
                message: format!("Invalid storage backend: '{s}' (expected memory/sqlite)"),
            }),
        }
    }
}
