//! Common test utilities for integration tests.
//!
//! Engines over both storage backends, plus a few address helpers.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use cidrguard::config::DynEngine;
use cidrguard::{
    AddressStore, CancellationToken, Engine, EngineOptions, MemoryStore, SqliteConfig, SqliteStore,
};

/// Shorthand for building an address in assertions.
#[allow(dead_code)]
pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}

/// A token that is never cancelled.
#[allow(dead_code)]
pub fn live() -> CancellationToken {
    CancellationToken::new()
}

/// A token that is already cancelled.
#[allow(dead_code)]
pub fn cancelled() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}

/// Returns a database path inside a fresh temporary directory.
///
/// The directory is leaked so it outlives the test.
#[allow(dead_code)]
pub fn temp_db_path() -> PathBuf {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("cidrguard.db");
    std::mem::forget(temp_dir);
    path
}

/// Opens a file-backed store in a temporary directory.
#[allow(dead_code)]
pub fn temp_sqlite_store() -> SqliteStore {
    SqliteStore::open(SqliteConfig::new(temp_db_path())).expect("Failed to open test database")
}

/// Creates an engine over an empty in-memory store.
#[allow(dead_code)]
pub fn memory_engine(options: EngineOptions) -> Engine<MemoryStore> {
    Engine::with_options(MemoryStore::new(), options)
}

/// Creates an engine over a file-backed `SQLite` store.
#[allow(dead_code)]
pub fn sqlite_engine(options: EngineOptions) -> Engine<SqliteStore> {
    Engine::with_options(temp_sqlite_store(), options)
}

/// Returns one fresh engine per storage backend, labelled by backend name.
#[allow(dead_code)]
pub fn all_backends(options: EngineOptions) -> Vec<(&'static str, DynEngine)> {
    let memory: Box<dyn AddressStore> = Box::new(MemoryStore::new());
    let sqlite: Box<dyn AddressStore> = Box::new(temp_sqlite_store());
    vec![
        ("memory", Engine::with_options(memory, options)),
        ("sqlite", Engine::with_options(sqlite, options)),
    ]
}
