//! Error types for the cidrguard library.
//!
//! This module provides the error hierarchy for every engine, storage and
//! configuration operation, using `thiserror` for ergonomic error handling.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Result type alias for operations that may fail with a cidrguard error.
///
/// # Examples
///
/// ```
/// use cidrguard::{Error, Result};
///
/// fn example_operation() -> Result<u8> {
///     Ok(24)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error used to carry backend failures through the storage contract.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for the cidrguard library.
#[derive(Debug, Error)]
pub enum Error {
    /// A CIDR string could not be parsed.
    #[error("invalid CIDR '{input}': {reason}")]
    InvalidCidr {
        /// The rejected input.
        input: String,
        /// The reason the input is invalid.
        reason: String,
    },

    /// An address string could not be parsed.
    #[error("invalid address '{input}': {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// The reason the input is invalid.
        reason: String,
    },

    /// A prefix length outside 0..=32 was requested.
    #[error("invalid prefix length /{prefix}: must be between 0 and 32")]
    InvalidPrefix {
        /// The rejected prefix length.
        prefix: u8,
    },

    /// The CIDR is already registered with the engine.
    #[error("CIDR {cidr} is already managed")]
    DuplicateCidr {
        /// Canonical form of the duplicate CIDR.
        cidr: String,
    },

    /// The CIDR is not registered with the engine.
    #[error("CIDR {cidr} is not managed")]
    NotManaged {
        /// Canonical form of the missing CIDR.
        cidr: String,
    },

    /// The address is not in the available set.
    #[error("address {addr} is not available")]
    AddressUnavailable {
        /// The unavailable address.
        addr: Ipv4Addr,
    },

    /// The address is allocated and cannot be added to the available set.
    #[error("address {addr} is already allocated")]
    AddressAlreadyAllocated {
        /// The allocated address.
        addr: Ipv4Addr,
    },

    /// The address or block is not allocated.
    #[error("{target} is not allocated")]
    NotAllocated {
        /// The address or CIDR that was expected to be allocated.
        target: String,
    },

    /// The pool holds fewer available addresses than the requested block size.
    #[error("not enough capacity for a /{prefix} block: need {required} addresses, {available} available")]
    NoCapacity {
        /// Requested prefix length.
        prefix: u8,
        /// Number of addresses the block needs.
        required: u64,
        /// Number of addresses currently available.
        available: usize,
    },

    /// No available address starts an aligned block of the requested size.
    #[error("no aligned /{prefix} block available")]
    NoAlignedBlock {
        /// Requested prefix length.
        prefix: u8,
    },

    /// The pool is empty.
    #[error("no available address")]
    NoAvailableAddress,

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The storage backend failed.
    #[error("storage failure ({context}): {source}")]
    StorageFailure {
        /// What the backend was doing.
        context: String,
        /// The underlying backend error.
        #[source]
        source: BoxError,
    },

    /// A multi-step operation failed and its compensation failed too.
    #[error("{cause}; rollback left {} failure(s)", .failures.len())]
    RollbackFailed {
        /// The error that triggered the rollback.
        cause: Box<Error>,
        /// Every compensation step that failed.
        failures: Vec<Error>,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database corruption was detected.
    #[error("database corruption detected: {details}")]
    DatabaseCorruption {
        /// Details about the corruption.
        details: String,
    },
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageFailure {
            context: "sqlite".into(),
            source: Box::new(err),
        }
    }
}

impl Error {
    /// Wraps a backend error with context.
    pub fn storage(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::StorageFailure {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Folds the outcome of a compensation pass into the error to report.
    ///
    /// A clean rollback yields the original cause unchanged.
    #[must_use]
    pub fn after_rollback(cause: Self, failures: Vec<Self>) -> Self {
        if failures.is_empty() {
            cause
        } else {
            Self::RollbackFailed {
                cause: Box::new(cause),
                failures,
            }
        }
    }

    /// Check if error is a cancellation.
    ///
    /// # Examples
    ///
    /// ```
    /// use cidrguard::Error;
    ///
    /// assert!(Error::Cancelled.is_cancelled());
    /// assert!(!Error::NoAvailableAddress.is_cancelled());
    /// ```
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if error originates in the storage backend.
    #[must_use]
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StorageFailure { .. })
    }

    /// Check if error reports an address that is already allocated.
    ///
    /// The engine tolerates this error when re-enumerating addresses.
    #[must_use]
    pub fn is_already_allocated(&self) -> bool {
        matches!(self, Self::AddressAlreadyAllocated { .. })
    }

    /// Returns the error that started a rollback, or `self` otherwise.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RollbackFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
