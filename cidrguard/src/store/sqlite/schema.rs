//! SQL table definitions and statements for the address store.

/// Current schema version for the database.
///
/// This version is stored in the metadata table and checked on open.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// SQL statement to create the metadata table.
pub const CREATE_METADATA_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )";

/// SQL statement to create the available address table.
pub const CREATE_AVAILABLE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS ip_available (
        ip TEXT PRIMARY KEY NOT NULL,
        created_at INTEGER NOT NULL
    )";

/// SQL statement to create the allocated address table.
///
/// `description` holds either a caller description or a block tag.
pub const CREATE_ALLOCATED_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS ip_allocated (
        ip TEXT PRIMARY KEY NOT NULL,
        description TEXT NOT NULL,
        allocated_at INTEGER NOT NULL
    )";

/// SQL statement to select the schema version from the metadata table.
pub const SELECT_SCHEMA_VERSION: &str = "SELECT value FROM metadata WHERE key = 'schema_version'";

/// SQL statement to insert or update the schema version in the metadata table.
pub const INSERT_SCHEMA_VERSION: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)";

pub const INSERT_AVAILABLE: &str =
    "INSERT OR IGNORE INTO ip_available (ip, created_at) VALUES (?, ?)";

pub const DELETE_AVAILABLE: &str = "DELETE FROM ip_available WHERE ip = ?";

pub const SELECT_AVAILABLE: &str = "SELECT 1 FROM ip_available WHERE ip = ?";

pub const LIST_AVAILABLE: &str = "SELECT ip FROM ip_available";

pub const COUNT_AVAILABLE: &str = "SELECT COUNT(*) FROM ip_available";

pub const INSERT_ALLOCATED: &str =
    "INSERT INTO ip_allocated (ip, description, allocated_at) VALUES (?, ?, ?)";

pub const DELETE_ALLOCATED: &str = "DELETE FROM ip_allocated WHERE ip = ?";

pub const SELECT_ALLOCATED: &str = "SELECT 1 FROM ip_allocated WHERE ip = ?";

pub const LIST_ALLOCATED: &str = "SELECT ip, description FROM ip_allocated";

pub const COUNT_ALLOCATED: &str = "SELECT COUNT(*) FROM ip_allocated";
