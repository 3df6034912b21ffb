//! Configuration validation.
//!
//! This module checks a loaded configuration before an engine is built
//! from it.

use std::collections::HashSet;

use crate::address::Block;
use crate::config::schema::{CidrEntry, Config, StorageBackend, StorageConfig};
use crate::error::{Error, Result};

/// Validates configuration values and their consistency.
///
/// # Examples
///
/// ```
/// use cidrguard::config::{Config, ConfigValidator};
///
/// let config = Config::default();
/// ConfigValidator::validate(&config).unwrap();
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`Error::Validation`] naming the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        Self::validate_storage(&config.storage)?;
        Self::validate_cidrs(&config.cidrs)?;
        Ok(())
    }

    fn validate_storage(storage: &StorageConfig) -> Result<()> {
        if storage.busy_timeout_ms == Some(0) {
            return Err(Error::Validation {
                field: "storage.busy_timeout_ms".into(),
                message: "Timeout must be greater than 0".into(),
            });
        }

        if storage.backend == StorageBackend::Sqlite {
            if let Some(path) = &storage.path {
                if path.as_os_str().is_empty() {
                    return Err(Error::Validation {
                        field: "storage.path".into(),
                        message: "Cannot be empty".into(),
                    });
                }
            }
            storage.sqlite_config().map_err(|e| Error::Validation {
                field: "storage.path".into(),
                message: format!("Cannot resolve database path: {e}"),
            })?;
        }

        Ok(())
    }

    fn validate_cidrs(entries: &[CidrEntry]) -> Result<()> {
        let mut seen = HashSet::new();

        for (index, entry) in entries.iter().enumerate() {
            let block = Block::parse(&entry.cidr).map_err(|e| Error::Validation {
                field: format!("cidrs[{index}].cidr"),
                message: e.to_string(),
            })?;

            if !seen.insert(block) {
                return Err(Error::Validation {
                    field: format!("cidrs[{index}].cidr"),
                    message: format!("Duplicate CIDR {block}"),
                });
            }

            if let Some(description) = &entry.description {
                Self::validate_description(&format!("cidrs[{index}].description"), description)?;
            }
        }

        Ok(())
    }

    /// Checks that a description is non-empty after trimming, contains no
    /// null bytes, and is not longer than 255 characters.
    fn validate_description(field: &str, value: &str) -> Result<()> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot be empty or only whitespace".into(),
            });
        }

        if trimmed.contains('\0') {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot contain null bytes".into(),
            });
        }

        if trimmed.len() > 255 {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot exceed 255 characters".into(),
            });
        }

        Ok(())
    }
}
