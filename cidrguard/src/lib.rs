#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # cidrguard
//!
//! A library for tracking and allocating IPv4 addresses and aligned CIDR
//! blocks.
//!
//! An [`Engine`] keeps a registry of managed CIDR blocks and moves addresses
//! between the *available* and *allocated* sets of an [`AddressStore`]. It
//! hands out single addresses or aligned subnets, records who holds what,
//! and reclaims space on release.
//!
//! ## Core Types
//!
//! - [`Engine`]: allocation engine over any storage backend
//! - [`AddressStore`], [`MemoryStore`], [`SqliteStore`]: storage contract and backends
//! - [`Block`](address::Block): parsed CIDR block with address iteration
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use cidrguard::{CancellationToken, Engine, MemoryStore};
//! use std::net::Ipv4Addr;
//!
//! let cancel = CancellationToken::new();
//! let engine = Engine::new(MemoryStore::new());
//! engine.add_cidr("10.20.0.0/24", "build farm", &cancel).unwrap();
//!
//! // Aligned subnet
//! let subnet = engine.allocate_cidr(28, "runner pool", &cancel).unwrap();
//! assert_eq!(subnet, "10.20.0.0/28");
//!
//! // Single address
//! let addr = engine.next_available_ip("dns", &cancel).unwrap();
//! assert_eq!(addr, Ipv4Addr::new(10, 20, 0, 16));
//!
//! assert_eq!(engine.used_cidrs(&cancel).unwrap()["10.20.0.0/28"], "runner pool");
//! ```

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod store;
pub mod tag;

// Re-export key types at crate root for convenience
pub use config::{open_engine, Config, ConfigLoader};
pub use engine::{
    Engine, EngineOptions, ManagedCidr, ReleaseSummary, SearchStrategy, StatusSnapshot,
};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use store::{AddressStore, MemoryStore, SqliteConfig, SqliteStore};
pub use tokio_util::sync::CancellationToken;
