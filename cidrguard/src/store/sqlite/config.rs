//! Database configuration and path resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "CIDRGUARD_DATA_DIR";

const DATABASE_FILE: &str = "cidrguard.db";

/// Configuration for opening a [`SqliteStore`](super::SqliteStore).
///
/// # Examples
///
/// ```
/// use cidrguard::store::SqliteConfig;
/// use std::time::Duration;
///
/// let config = SqliteConfig::new("/tmp/cidrguard.db")
///     .with_busy_timeout(Duration::from_millis(10000));
/// assert!(config.auto_create);
/// ```
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// How long a connection waits on a locked database.
    pub busy_timeout: Duration,
    /// Whether to create the database file and its parent directory.
    pub auto_create: bool,
    /// Whether to open the database read-only.
    pub read_only: bool,
}

impl SqliteConfig {
    /// Creates a configuration with default settings.
    ///
    /// Default settings:
    /// - `busy_timeout`: 5000ms
    /// - `auto_create`: true
    /// - `read_only`: false
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(5000),
            auto_create: true,
            read_only: false,
        }
    }

    /// Sets the busy timeout duration.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens the database read-only, which also disables `auto_create`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cidrguard::store::SqliteConfig;
    ///
    /// let config = SqliteConfig::new("/tmp/cidrguard.db").read_only();
    /// assert!(config.read_only);
    /// assert!(!config.auto_create);
    /// ```
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self.auto_create = false;
        self
    }
}

/// Returns the default data directory, `~/.cidrguard`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_data_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|home| home.join(".cidrguard"))
        .ok_or_else(|| Error::Validation {
            field: "home_directory".into(),
            message: "Cannot determine home directory".into(),
        })
}

/// Resolves the database path using the environment or defaults.
///
/// The resolution order is:
/// 1. `$CIDRGUARD_DATA_DIR/cidrguard.db` if the variable is set
/// 2. `~/.cidrguard/cidrguard.db` otherwise
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined and
/// `CIDRGUARD_DATA_DIR` is not set.
pub fn resolve_database_path() -> Result<PathBuf> {
    if let Ok(data_dir) = std::env::var(DATA_DIR_ENV) {
        Ok(PathBuf::from(data_dir).join(DATABASE_FILE))
    } else {
        Ok(default_data_dir()?.join(DATABASE_FILE))
    }
}
