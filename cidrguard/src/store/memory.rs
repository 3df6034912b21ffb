//! In-memory address store.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use parking_lot::Mutex;

use crate::error::{Error, Result};

use super::AddressStore;

#[derive(Debug, Default)]
struct PoolState {
    available: BTreeSet<Ipv4Addr>,
    allocated: BTreeMap<Ipv4Addr, String>,
}

/// An [`AddressStore`] held entirely in process memory.
///
/// Every call takes one exclusive lock, so each operation is linearizable.
/// State is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PoolState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AddressStore for MemoryStore {
    fn add_available(&self, addr: Ipv4Addr) -> Result<()> {
        let mut state = self.state.lock();
        if state.allocated.contains_key(&addr) {
            return Err(Error::AddressAlreadyAllocated { addr });
        }
        state.available.insert(addr);
        Ok(())
    }

    fn remove_available(&self, addr: Ipv4Addr) -> Result<()> {
        if self.state.lock().available.remove(&addr) {
            Ok(())
        } else {
            Err(Error::AddressUnavailable { addr })
        }
    }

    fn is_available(&self, addr: Ipv4Addr) -> Result<bool> {
        Ok(self.state.lock().available.contains(&addr))
    }

    fn list_available(&self) -> Result<Vec<Ipv4Addr>> {
        Ok(self.state.lock().available.iter().copied().collect())
    }

    fn allocate(&self, addr: Ipv4Addr, description: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.available.remove(&addr) {
            return Err(Error::AddressUnavailable { addr });
        }
        state.allocated.insert(addr, description.to_string());
        Ok(())
    }

    fn deallocate(&self, addr: Ipv4Addr) -> Result<()> {
        let mut state = self.state.lock();
        if state.allocated.remove(&addr).is_none() {
            return Err(Error::NotAllocated {
                target: addr.to_string(),
            });
        }
        state.available.insert(addr);
        Ok(())
    }

    fn list_allocated(&self) -> Result<BTreeMap<Ipv4Addr, String>> {
        Ok(self.state.lock().allocated.clone())
    }

    fn is_allocated(&self, addr: Ipv4Addr) -> Result<bool> {
        Ok(self.state.lock().allocated.contains_key(&addr))
    }

    fn count_available(&self) -> Result<usize> {
        Ok(self.state.lock().available.len())
    }

    fn count_allocated(&self) -> Result<usize> {
        Ok(self.state.lock().allocated.len())
    }
}
