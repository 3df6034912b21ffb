//! `SQLite`-backed address store.
//!
//! This module provides a persistent [`AddressStore`](super::AddressStore)
//! built on `rusqlite`, including connection management, schema versioning,
//! and the per-address operations of the storage contract.
//!
//! # Examples
//!
//! ```no_run
//! use cidrguard::store::{AddressStore, SqliteConfig, SqliteStore};
//! use std::net::Ipv4Addr;
//!
//! let store = SqliteStore::open(SqliteConfig::new("/tmp/cidrguard.db")).unwrap();
//! store.add_available(Ipv4Addr::new(10, 0, 0, 1)).unwrap();
//!
//! for addr in store.list_available().unwrap() {
//!     println!("{addr}");
//! }
//! ```

mod config;
mod connection;
pub mod migrations;
mod operations;
mod schema;

pub use config::{default_data_dir, resolve_database_path, SqliteConfig, DATA_DIR_ENV};
pub use connection::SqliteStore;

pub use migrations::{check_schema_compatibility, get_schema_version, initialize_schema};
