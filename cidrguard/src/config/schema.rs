//! Configuration schema definitions.
//!
//! This module defines the `cidrguard.yaml` structure: storage backend
//! settings, allocation options, log mode, and the initial managed blocks.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineOptions, SearchStrategy};
use crate::error::Result;
use crate::logging::LogLevel;
use crate::store::sqlite::{resolve_database_path, SqliteConfig};

/// Complete configuration structure.
///
/// # Examples
///
/// ```
/// use cidrguard::config::{CidrEntry, Config, StorageBackend};
///
/// let config: Config = serde_yaml::from_str(
///     "storage:\n  backend: memory\ncidrs:\n  - cidr: 10.0.0.0/24\n    description: lab\n",
/// )
/// .unwrap();
/// assert_eq!(config.storage.backend, StorageBackend::Memory);
/// assert_eq!(config.cidrs[0].cidr, "10.0.0.0/24");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Block allocation settings.
    #[serde(default)]
    pub allocation: AllocationConfig,

    /// Log verbosity.
    pub log_mode: Option<LogLevel>,

    /// Blocks registered when the engine opens.
    #[serde(default)]
    pub cidrs: Vec<CidrEntry>,
}

impl Config {
    /// Returns the engine options this configuration selects.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::default().with_search(self.allocation.search)
    }

    /// Installs the stderr logger at the configured level.
    ///
    /// Without a configured `log_mode` the level comes from the environment.
    pub fn init_logging(&self) -> LogLevel {
        match self.log_mode {
            Some(level) => {
                crate::logging::install(level);
                level
            }
            None => crate::logging::init_logger(false, false),
        }
    }
}

/// Which [`AddressStore`](crate::store::AddressStore) backs the engine.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local [`MemoryStore`](crate::store::MemoryStore).
    #[default]
    Memory,
    /// Persistent [`SqliteStore`](crate::store::SqliteStore).
    Sqlite,
}

/// Storage settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file for the `sqlite` backend.
    ///
    /// Defaults to `$CIDRGUARD_DATA_DIR/cidrguard.db` or `~/.cidrguard/cidrguard.db`.
    pub path: Option<PathBuf>,

    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u64>,
}

impl StorageConfig {
    /// Builds the `SQLite` configuration for these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the default path cannot
    /// be resolved.
    pub fn sqlite_config(&self) -> Result<SqliteConfig> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => resolve_database_path()?,
        };
        let mut config = SqliteConfig::new(path);
        if let Some(ms) = self.busy_timeout_ms {
            config = config.with_busy_timeout(Duration::from_millis(ms));
        }
        Ok(config)
    }
}

/// Block allocation settings.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AllocationConfig {
    /// Block search strategy.
    #[serde(default)]
    pub search: SearchStrategy,
}

/// An initial managed block.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CidrEntry {
    /// The block in `a.b.c.d/n` form.
    pub cidr: String,

    /// Registration description.
    pub description: Option<String>,
}
