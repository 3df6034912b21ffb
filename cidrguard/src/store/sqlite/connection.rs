//! Connection management for the `SQLite` store.

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};

use crate::error::Result;

use super::config::SqliteConfig;

/// An [`AddressStore`](crate::store::AddressStore) persisted in `SQLite`.
///
/// The store owns one connection behind a mutex. Each contract operation
/// runs inside its own `IMMEDIATE` transaction, so concurrent processes
/// sharing the file serialize through `SQLite` locking and the busy timeout.
///
/// # Examples
///
/// ```no_run
/// use cidrguard::store::{SqliteConfig, SqliteStore};
///
/// let store = SqliteStore::open(SqliteConfig::new("/tmp/cidrguard.db")).unwrap();
/// store.verify_integrity().unwrap();
/// ```
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    config: Option<SqliteConfig>,
}

impl SqliteStore {
    /// Opens a database with the given configuration.
    ///
    /// This function will:
    /// - Create the parent directory if `auto_create` is enabled
    /// - Open the database with appropriate flags
    /// - Set WAL mode and the busy timeout
    /// - Initialize or verify the database schema
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be created, if
    /// PRAGMA settings fail, or if the schema version is incompatible.
    pub fn open(config: SqliteConfig) -> Result<Self> {
        if config.auto_create && !config.path.exists() {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let flags = if config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else if config.auto_create {
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };

        let conn = Connection::open_with_flags(&config.path, flags)?;

        // PRAGMA journal_mode returns a row
        let _: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch("PRAGMA synchronous = NORMAL")?;
        conn.busy_timeout(config.busy_timeout)?;

        super::migrations::check_schema_compatibility(&conn)?;

        log::debug!("opened address store at {}", config.path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            config: Some(config),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be initialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use cidrguard::store::{AddressStore, SqliteStore};
    ///
    /// let store = SqliteStore::open_in_memory().unwrap();
    /// assert_eq!(store.count_available().unwrap(), 0);
    /// ```
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::migrations::check_schema_compatibility(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config: None,
        })
    }

    /// Returns the configuration the store was opened with.
    ///
    /// In-memory stores have none.
    #[must_use]
    pub const fn config(&self) -> Option<&SqliteConfig> {
        self.config.as_ref()
    }

    /// Locks and returns the underlying connection.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}
