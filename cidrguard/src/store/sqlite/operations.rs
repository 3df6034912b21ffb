//! Storage contract operations for the `SQLite` store.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::SystemTime;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::error::{Error, Result};
use crate::store::AddressStore;

use super::connection::SqliteStore;
use super::schema::{
    COUNT_ALLOCATED, COUNT_AVAILABLE, DELETE_ALLOCATED, DELETE_AVAILABLE, INSERT_ALLOCATED,
    INSERT_AVAILABLE, LIST_ALLOCATED, LIST_AVAILABLE, SELECT_ALLOCATED, SELECT_AVAILABLE,
};

/// Converts a `SystemTime` to Unix epoch seconds for database storage.
///
/// # Errors
///
/// Returns an error if the time is before the Unix epoch.
#[allow(clippy::cast_possible_wrap)]
fn systemtime_to_unix_secs(time: SystemTime) -> Result<i64> {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|e| Error::Validation {
            field: "timestamp".into(),
            message: format!("Invalid timestamp: {e}"),
        })
        .map(|d| d.as_secs() as i64)
}

fn now_secs() -> Result<i64> {
    systemtime_to_unix_secs(SystemTime::now())
}

/// Parses an address column, treating garbage as corruption.
fn column_to_addr(raw: &str) -> Result<Ipv4Addr> {
    raw.parse().map_err(|_| Error::DatabaseCorruption {
        details: format!("invalid address '{raw}' in address tables"),
    })
}

fn row_exists(conn: &Connection, sql: &str, addr: Ipv4Addr) -> Result<bool> {
    Ok(conn
        .query_row(sql, [addr.to_string()], |_| Ok(()))
        .optional()?
        .is_some())
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn count_rows(conn: &Connection, sql: &str) -> Result<usize> {
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count as usize)
}

impl AddressStore for SqliteStore {
    fn add_available(&self, addr: Ipv4Addr) -> Result<()> {
        let mut conn = self.connection();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if row_exists(&tx, SELECT_ALLOCATED, addr)? {
            return Err(Error::AddressAlreadyAllocated { addr });
        }
        tx.execute(INSERT_AVAILABLE, params![addr.to_string(), now_secs()?])?;

        tx.commit()?;
        Ok(())
    }

    fn remove_available(&self, addr: Ipv4Addr) -> Result<()> {
        let mut conn = self.connection();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(DELETE_AVAILABLE, [addr.to_string()])?;
        if removed == 0 {
            return Err(Error::AddressUnavailable { addr });
        }

        tx.commit()?;
        Ok(())
    }

    fn is_available(&self, addr: Ipv4Addr) -> Result<bool> {
        row_exists(&self.connection(), SELECT_AVAILABLE, addr)
    }

    fn list_available(&self) -> Result<Vec<Ipv4Addr>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(LIST_AVAILABLE)?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        // Text keys sort lexically; the contract wants numeric order
        let mut addrs = raw
            .iter()
            .map(|s| column_to_addr(s))
            .collect::<Result<Vec<_>>>()?;
        addrs.sort_unstable();
        Ok(addrs)
    }

    fn allocate(&self, addr: Ipv4Addr, description: &str) -> Result<()> {
        let mut conn = self.connection();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(DELETE_AVAILABLE, [addr.to_string()])?;
        if removed == 0 {
            return Err(Error::AddressUnavailable { addr });
        }
        tx.execute(
            INSERT_ALLOCATED,
            params![addr.to_string(), description, now_secs()?],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn deallocate(&self, addr: Ipv4Addr) -> Result<()> {
        let mut conn = self.connection();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(DELETE_ALLOCATED, [addr.to_string()])?;
        if removed == 0 {
            return Err(Error::NotAllocated {
                target: addr.to_string(),
            });
        }
        tx.execute(INSERT_AVAILABLE, params![addr.to_string(), now_secs()?])?;

        tx.commit()?;
        Ok(())
    }

    fn list_allocated(&self) -> Result<BTreeMap<Ipv4Addr, String>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(LIST_ALLOCATED)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        rows.into_iter()
            .map(|(ip, description)| Ok((column_to_addr(&ip)?, description)))
            .collect()
    }

    fn is_allocated(&self, addr: Ipv4Addr) -> Result<bool> {
        row_exists(&self.connection(), SELECT_ALLOCATED, addr)
    }

    fn count_available(&self) -> Result<usize> {
        count_rows(&self.connection(), COUNT_AVAILABLE)
    }

    fn count_allocated(&self) -> Result<usize> {
        count_rows(&self.connection(), COUNT_ALLOCATED)
    }
}

impl SqliteStore {
    /// Verifies database integrity using PRAGMA `integrity_check`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseCorruption`] if the check reports problems.
    pub fn verify_integrity(&self) -> Result<()> {
        let result: String =
            self.connection()
                .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;

        if result == "ok" {
            Ok(())
        } else {
            Err(Error::DatabaseCorruption {
                details: format!("Integrity check failed: {result}"),
            })
        }
    }
}
