//! Test doubles for the storage contract.

use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

use super::{AddressStore, MemoryStore};

/// Which contract call a fault is armed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Remove,
    Allocate,
    Deallocate,
}

/// A [`MemoryStore`] that fails chosen calls for chosen addresses.
#[derive(Debug, Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    faults: Mutex<HashSet<(Op, Ipv4Addr)>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future `op` on `addr` fail with a storage error.
    pub fn fail_on(&self, op: Op, addr: Ipv4Addr) {
        self.faults.lock().insert((op, addr));
    }

    pub fn clear(&self) {
        self.faults.lock().clear();
    }

    fn check(&self, op: Op, addr: Ipv4Addr) -> Result<()> {
        if self.faults.lock().contains(&(op, addr)) {
            return Err(Error::storage(
                format!("injected {op:?} fault"),
                std::io::Error::new(std::io::ErrorKind::Other, addr.to_string()),
            ));
        }
        Ok(())
    }
}

impl AddressStore for FaultyStore {
    fn add_available(&self, addr: Ipv4Addr) -> Result<()> {
        self.check(Op::Add, addr)?;
        self.inner.add_available(addr)
    }

    fn remove_available(&self, addr: Ipv4Addr) -> Result<()> {
        self.check(Op::Remove, addr)?;
        self.inner.remove_available(addr)
    }

    fn is_available(&self, addr: Ipv4Addr) -> Result<bool> {
        self.inner.is_available(addr)
    }

    fn list_available(&self) -> Result<Vec<Ipv4Addr>> {
        self.inner.list_available()
    }

    fn allocate(&self, addr: Ipv4Addr, description: &str) -> Result<()> {
        self.check(Op::Allocate, addr)?;
        self.inner.allocate(addr, description)
    }

    fn deallocate(&self, addr: Ipv4Addr) -> Result<()> {
        self.check(Op::Deallocate, addr)?;
        self.inner.deallocate(addr)
    }

    fn list_allocated(&self) -> Result<BTreeMap<Ipv4Addr, String>> {
        self.inner.list_allocated()
    }

    fn count_available(&self) -> Result<usize> {
        self.inner.count_available()
    }

    fn count_allocated(&self) -> Result<usize> {
        self.inner.count_allocated()
    }
}

/// A [`MemoryStore`] that fires a token once `op` has succeeded `after` times.
///
/// Only add and remove calls are counted.
#[derive(Debug)]
pub struct CancelAfterStore {
    pub inner: MemoryStore,
    op: Op,
    after: usize,
    calls: Mutex<usize>,
    token: CancellationToken,
}

impl CancelAfterStore {
    pub fn new(op: Op, after: usize, token: &CancellationToken) -> Self {
        Self {
            inner: MemoryStore::new(),
            op,
            after,
            calls: Mutex::new(0),
            token: token.clone(),
        }
    }

    fn tick(&self, op: Op) {
        if op != self.op {
            return;
        }
        let mut calls = self.calls.lock();
        *calls += 1;
        if *calls == self.after {
            self.token.cancel();
        }
    }
}

impl AddressStore for CancelAfterStore {
    fn add_available(&self, addr: Ipv4Addr) -> Result<()> {
        self.inner.add_available(addr)?;
        self.tick(Op::Add);
        Ok(())
    }

    fn remove_available(&self, addr: Ipv4Addr) -> Result<()> {
        self.inner.remove_available(addr)?;
        self.tick(Op::Remove);
        Ok(())
    }

    fn is_available(&self, addr: Ipv4Addr) -> Result<bool> {
        self.inner.is_available(addr)
    }

    fn list_available(&self) -> Result<Vec<Ipv4Addr>> {
        self.inner.list_available()
    }

    fn allocate(&self, addr: Ipv4Addr, description: &str) -> Result<()> {
        self.inner.allocate(addr, description)
    }

    fn deallocate(&self, addr: Ipv4Addr) -> Result<()> {
        self.inner.deallocate(addr)
    }

    fn list_allocated(&self) -> Result<BTreeMap<Ipv4Addr, String>> {
        self.inner.list_allocated()
    }

    fn count_available(&self) -> Result<usize> {
        self.inner.count_available()
    }

    fn count_allocated(&self) -> Result<usize> {
        self.inner.count_allocated()
    }
}
