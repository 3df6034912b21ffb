//! Configuration system for cidrguard.
//!
//! This module provides:
//! - The `cidrguard.yaml` schema
//! - Environment variable overrides (`CIDRGUARD_*`)
//! - Validation
//! - [`open_engine`], which builds a ready engine from a configuration
//!
//! # Configuration Precedence
//!
//! Highest to lowest:
//!
//! 1. Environment variables (`CIDRGUARD_*`)
//! 2. `cidrguard.yaml` in the data directory
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```
//! use cidrguard::config::{open_engine, CidrEntry, Config};
//! use cidrguard::CancellationToken;
//!
//! let config = Config {
//!     cidrs: vec![CidrEntry {
//!         cidr: "10.0.0.0/30".to_string(),
//!         description: Some("lab".to_string()),
//!     }],
//!     ..Default::default()
//! };
//!
//! let cancel = CancellationToken::new();
//! let engine = open_engine(&config, &cancel).unwrap();
//! assert_eq!(engine.available_count(&cancel).unwrap(), 4);
//! ```

pub mod environment;
pub mod loader;
pub mod schema;
pub mod validator;

use tokio_util::sync::CancellationToken;

use crate::engine::{Engine, INITIAL_DESCRIPTION};
use crate::error::Result;
use crate::store::{AddressStore, MemoryStore, SqliteStore};

// Re-export key types at module root
pub use environment::EnvironmentConfig;
pub use loader::{ConfigLoader, CONFIG_FILE};
pub use schema::{AllocationConfig, CidrEntry, Config, StorageBackend, StorageConfig};
pub use validator::ConfigValidator;

/// Engine over whichever store the configuration selects.
pub type DynEngine = Engine<Box<dyn AddressStore>>;

/// Builds the configured store and an engine with the initial blocks registered.
///
/// Entries without a description are registered as
/// [`INITIAL_DESCRIPTION`].
///
/// # Errors
///
/// Returns an error if validation fails, the store cannot be opened, or an
/// initial block cannot be registered.
pub fn open_engine(config: &Config, cancel: &CancellationToken) -> Result<DynEngine> {
    ConfigValidator::validate(config)?;

    let store: Box<dyn AddressStore> = match config.storage.backend {
        StorageBackend::Memory => Box::new(MemoryStore::new()),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(config.storage.sqlite_config()?)?),
    };

    let engine = Engine::with_options(store, config.engine_options());
    for entry in &config.cidrs {
        let description = entry.description.as_deref().unwrap_or(INITIAL_DESCRIPTION);
        engine.add_cidr(&entry.cidr, description, cancel)?;
    }

    log::debug!(
        "opened {:?} engine with {} managed CIDR(s)",
        config.storage.backend,
        config.cidrs.len()
    );
    Ok(engine)
}
