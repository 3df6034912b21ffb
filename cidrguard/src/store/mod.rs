//! Storage contract for address pool state.
//!
//! The engine drives an [`AddressStore`] through single-address operations.
//! A store keeps two disjoint sets: *available* addresses and *allocated*
//! addresses (each with an opaque description). Each call is atomic on its
//! own, but the contract offers no atomicity across calls.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryStore`]: process-local sets behind a mutex
//! - [`SqliteStore`]: a `SQLite` database with one transaction per call
//!
//! # Examples
//!
//! ```
//! use cidrguard::store::{AddressStore, MemoryStore};
//! use std::net::Ipv4Addr;
//!
//! let store = MemoryStore::new();
//! let addr = Ipv4Addr::new(10, 0, 0, 1);
//!
//! store.add_available(addr).unwrap();
//! store.allocate(addr, "db primary").unwrap();
//! assert_eq!(store.count_allocated().unwrap(), 1);
//!
//! store.deallocate(addr).unwrap();
//! assert!(store.is_available(addr).unwrap());
//! ```

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::error::Result;

mod memory;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod test_util;

pub use memory::MemoryStore;
pub use sqlite::{SqliteConfig, SqliteStore};

/// Persistence contract for the available and allocated address sets.
///
/// Implementations must keep the two sets disjoint and must make each
/// method linearizable. Backend failures are reported as
/// [`Error::StorageFailure`](crate::Error::StorageFailure).
pub trait AddressStore: Send + Sync {
    /// Adds an address to the available set.
    ///
    /// Adding an address that is already available is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressAlreadyAllocated`](crate::Error::AddressAlreadyAllocated)
    /// if the address is allocated.
    fn add_available(&self, addr: Ipv4Addr) -> Result<()>;

    /// Removes an address from the available set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressUnavailable`](crate::Error::AddressUnavailable)
    /// if the address is not available.
    fn remove_available(&self, addr: Ipv4Addr) -> Result<()>;

    /// Returns `true` if the address is in the available set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn is_available(&self, addr: Ipv4Addr) -> Result<bool>;

    /// Returns every available address in ascending numeric order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list_available(&self) -> Result<Vec<Ipv4Addr>>;

    /// Moves an available address to the allocated set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressUnavailable`](crate::Error::AddressUnavailable)
    /// if the address is not available.
    fn allocate(&self, addr: Ipv4Addr, description: &str) -> Result<()>;

    /// Moves an allocated address back to the available set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`](crate::Error::NotAllocated) if the
    /// address is not allocated.
    fn deallocate(&self, addr: Ipv4Addr) -> Result<()>;

    /// Returns every allocated address with its description.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list_allocated(&self) -> Result<BTreeMap<Ipv4Addr, String>>;

    /// Returns `true` if the address is in the allocated set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn is_allocated(&self, addr: Ipv4Addr) -> Result<bool> {
        Ok(self.list_allocated()?.contains_key(&addr))
    }

    /// Returns the size of the available set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn count_available(&self) -> Result<usize>;

    /// Returns the size of the allocated set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn count_allocated(&self) -> Result<usize>;
}

macro_rules! forward_store {
    ($wrapper:ty) => {
        impl<S: AddressStore + ?Sized> AddressStore for $wrapper {
            fn add_available(&self, addr: Ipv4Addr) -> Result<()> {
                (**self).add_available(addr)
            }

            fn remove_available(&self, addr: Ipv4Addr) -> Result<()> {
                (**self).remove_available(addr)
            }

            fn is_available(&self, addr: Ipv4Addr) -> Result<bool> {
                (**self).is_available(addr)
            }

            fn list_available(&self) -> Result<Vec<Ipv4Addr>> {
                (**self).list_available()
            }

            fn allocate(&self, addr: Ipv4Addr, description: &str) -> Result<()> {
                (**self).allocate(addr, description)
            }

            fn deallocate(&self, addr: Ipv4Addr) -> Result<()> {
                (**self).deallocate(addr)
            }

            fn list_allocated(&self) -> Result<BTreeMap<Ipv4Addr, String>> {
                (**self).list_allocated()
            }

            fn is_allocated(&self, addr: Ipv4Addr) -> Result<bool> {
                (**self).is_allocated(addr)
            }

            fn count_available(&self) -> Result<usize> {
                (**self).count_available()
            }

            fn count_allocated(&self) -> Result<usize> {
                (**self).count_allocated()
            }
        }
    };
}

forward_store!(Box<S>);
forward_store!(Arc<S>);
