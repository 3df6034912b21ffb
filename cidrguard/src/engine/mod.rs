//! The address allocation engine.
//!
//! [`Engine`] owns the registry of managed CIDR blocks and drives an
//! [`AddressStore`] through multi-step sequences. The store makes each
//! single-address call atomic but nothing more, so every multi-step
//! operation either compensates explicitly on failure or documents the
//! partial state it can leave behind.
//!
//! Every operation takes a [`CancellationToken`]. It is checked before any
//! work starts and again between loop iterations.
//!
//! # Examples
//!
//! ```
//! use cidrguard::{CancellationToken, Engine, MemoryStore};
//!
//! let cancel = CancellationToken::new();
//! let engine = Engine::new(MemoryStore::new());
//!
//! engine.add_cidr("192.168.0.0/24", "lab", &cancel).unwrap();
//! let first = engine.allocate_cidr(30, "x", &cancel).unwrap();
//! let second = engine.allocate_cidr(30, "y", &cancel).unwrap();
//! assert_eq!(first, "192.168.0.0/30");
//! assert_eq!(second, "192.168.0.4/30");
//!
//! let summary = engine.release_cidr(&first, &cancel).unwrap();
//! assert_eq!(summary.restored, 4);
//! ```

mod options;
mod registry;
mod report;

#[cfg(test)]
mod proptests;

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::address::{block_size, is_aligned, Block};
use crate::error::{Error, Result};
use crate::store::AddressStore;
use crate::tag::BlockTag;

pub use options::{EngineOptions, SearchStrategy};
pub use registry::ManagedCidr;
pub use report::{ReleaseSummary, StatusSnapshot, GROUPING_PREFIX};

use registry::Registry;

/// Description given to blocks registered at construction time.
pub const INITIAL_DESCRIPTION: &str = "initial CIDR";

/// Description given to blocks registered through [`Engine::expand_pool`].
pub const EXPANDED_DESCRIPTION: &str = "expanded pool";

fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// IPv4 address and CIDR allocation engine.
///
/// The engine is `Send + Sync` when its store is, and is meant to be shared
/// behind an `Arc`. Registry reads take a shared lock; registering and
/// unregistering blocks take an exclusive lock for their whole storage walk.
///
/// # Type Parameters
///
/// * `S` - The storage backend
#[derive(Debug)]
pub struct Engine<S: AddressStore> {
    registry: RwLock<Registry>,
    store: S,
    options: EngineOptions,
}

impl<S: AddressStore> Engine<S> {
    /// Creates an engine with an empty registry and default options.
    ///
    /// The store may already hold state from an earlier run; it is used as is.
    pub fn new(store: S) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    /// Creates an engine with an empty registry.
    pub fn with_options(store: S, options: EngineOptions) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            store,
            options,
        }
    }

    /// Creates an engine and registers each initial block.
    ///
    /// # Errors
    ///
    /// Fails on the first block that cannot be registered. Blocks registered
    /// before it keep their addresses in the store.
    ///
    /// # Examples
    ///
    /// ```
    /// use cidrguard::{CancellationToken, Engine, EngineOptions, MemoryStore};
    ///
    /// let cancel = CancellationToken::new();
    /// let engine = Engine::with_cidrs(
    ///     MemoryStore::new(),
    ///     EngineOptions::default(),
    ///     ["10.0.0.0/30", "10.0.1.0/30"],
    ///     &cancel,
    /// )
    /// .unwrap();
    /// assert_eq!(engine.available_count(&cancel).unwrap(), 8);
    /// ```
    pub fn with_cidrs<I, T>(
        store: S,
        options: EngineOptions,
        initial: I,
        cancel: &CancellationToken,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let engine = Self::with_options(store, options);
        for cidr in initial {
            engine.add_cidr(cidr.as_ref(), INITIAL_DESCRIPTION, cancel)?;
        }
        Ok(engine)
    }

    /// Returns the storage backend.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the engine options.
    pub const fn options(&self) -> EngineOptions {
        self.options
    }

    /// Registers a block and makes its addresses available.
    ///
    /// Every address of the block, network and broadcast included, is added
    /// to the available set. Addresses that are already allocated stay
    /// allocated. If any other addition fails, or the token fires, the
    /// addresses added so far are removed again.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCidr`] if `cidr` does not parse
    /// - [`Error::DuplicateCidr`] if the block is already registered
    /// - [`Error::Cancelled`] or a storage error, after compensation
    /// - [`Error::RollbackFailed`] if compensation itself failed
    pub fn add_cidr(&self, cidr: &str, description: &str, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        let block = Block::parse(cidr)?;
        let key = block.to_string();

        let mut registry = self.registry.write();
        if registry.contains(&key) {
            return Err(Error::DuplicateCidr { cidr: key });
        }
        if let Some(other) = registry.overlapping(&block) {
            log::debug!("{key} overlaps managed CIDR {}", other.cidr());
        }

        let mut added = Vec::new();
        let mut kept_allocated = 0u64;
        for addr in block.iter() {
            if cancel.is_cancelled() {
                return Err(self.rollback_additions(Error::Cancelled, &added));
            }
            match self.store.add_available(addr) {
                Ok(()) => added.push(addr),
                Err(e) if e.is_already_allocated() => kept_allocated += 1,
                Err(e) => return Err(self.rollback_additions(e, &added)),
            }
        }

        log::debug!(
            "registered {key} ({} addresses added, {kept_allocated} already allocated)",
            added.len()
        );
        registry.insert(ManagedCidr::new(block, description));
        Ok(())
    }

    /// Unregisters a block and drains its available addresses.
    ///
    /// Allocated addresses inside the block are left allocated. A storage
    /// failure or cancellation mid-walk leaves the block partially drained
    /// and still registered.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCidr`] if `cidr` does not parse
    /// - [`Error::NotManaged`] if the block is not registered
    /// - [`Error::Cancelled`] or a storage error
    pub fn remove_cidr(&self, cidr: &str, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        let block = Block::parse(cidr)?;
        let key = block.to_string();

        let mut registry = self.registry.write();
        if !registry.contains(&key) {
            return Err(Error::NotManaged { cidr: key });
        }

        let mut drained = 0u64;
        for addr in block.iter() {
            ensure_active(cancel)?;
            match self.store.remove_available(addr) {
                Ok(()) => drained += 1,
                Err(Error::AddressUnavailable { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        registry.remove(&key);
        log::debug!("unregistered {key} ({drained} addresses drained)");
        Ok(())
    }

    /// Grows the pool with a new block.
    ///
    /// Every address of the block that is not allocated becomes available and
    /// the block is registered with the description [`EXPANDED_DESCRIPTION`].
    ///
    /// # Errors
    ///
    /// Same as [`add_cidr`](Self::add_cidr).
    pub fn expand_pool(&self, cidr: &str, cancel: &CancellationToken) -> Result<()> {
        log::debug!("expanding pool with {cidr}");
        self.add_cidr(cidr, EXPANDED_DESCRIPTION, cancel)
    }

    /// Allocates an aligned block of `2^(32 - prefix)` addresses.
    ///
    /// The block's network address is allocated with the tag
    /// `"<cidr> - <description>"` and every other address of the block is
    /// removed from the available set. If a removal fails, or the token fires,
    /// the network address is deallocated and the removed addresses are
    /// restored before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPrefix`] if `prefix > 32`
    /// - [`Error::NoCapacity`] if fewer addresses are available than the block needs
    /// - [`Error::NoAlignedBlock`] if no candidate block exists
    /// - [`Error::AddressUnavailable`] if the chosen block has a gap
    /// - [`Error::Cancelled`] or a storage error, after compensation
    /// - [`Error::RollbackFailed`] if compensation itself failed
    pub fn allocate_cidr(
        &self,
        prefix: u8,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        ensure_active(cancel)?;
        if prefix > 32 {
            return Err(Error::InvalidPrefix { prefix });
        }
        let size = block_size(prefix);

        let available = self.store.list_available()?;
        let enough = usize::try_from(size).map_or(false, |needed| available.len() >= needed);
        if !enough {
            return Err(Error::NoCapacity {
                prefix,
                required: size,
                available: available.len(),
            });
        }

        let block = self.choose_block(&available, prefix, cancel)?;
        self.verify_block_available(&block, cancel)?;

        let start = block.network();
        let cidr = block.to_string();
        self.store
            .allocate(start, &BlockTag::new(&cidr, description).encode())?;

        let mut removed = Vec::new();
        for addr in block.iter().skip(1) {
            if cancel.is_cancelled() {
                return Err(self.rollback_block(Error::Cancelled, start, &removed));
            }
            if let Err(e) = self.store.remove_available(addr) {
                return Err(self.rollback_block(e, start, &removed));
            }
            removed.push(addr);
        }

        log::debug!("allocated block {cidr} for '{description}'");
        Ok(cidr)
    }

    /// Picks the candidate block according to the search strategy.
    ///
    /// `available` must be sorted ascending without duplicates.
    fn choose_block(
        &self,
        available: &[Ipv4Addr],
        prefix: u8,
        cancel: &CancellationToken,
    ) -> Result<Block> {
        let mut candidates = available
            .iter()
            .enumerate()
            .filter(|(_, addr)| is_aligned(**addr, prefix));

        match self.options.search {
            SearchStrategy::FirstAligned => {
                let (_, start) = candidates.next().ok_or(Error::NoAlignedBlock { prefix })?;
                Block::containing(*start, prefix)
            }
            SearchStrategy::FirstFit => {
                // Sorted and unique, so a block is fully available exactly
                // when its last address sits size - 1 slots after its start.
                let span = usize::try_from(block_size(prefix) - 1)
                    .map_err(|_| Error::NoAlignedBlock { prefix })?;
                for (index, start) in candidates {
                    ensure_active(cancel)?;
                    let block = Block::containing(*start, prefix)?;
                    if available.get(index + span) == Some(&block.last()) {
                        return Ok(block);
                    }
                }
                Err(Error::NoAlignedBlock { prefix })
            }
        }
    }

    /// Re-checks every address of the block against the live store.
    fn verify_block_available(&self, block: &Block, cancel: &CancellationToken) -> Result<()> {
        for addr in block.iter() {
            ensure_active(cancel)?;
            if !self.store.is_available(addr)? {
                return Err(Error::AddressUnavailable { addr });
            }
        }
        Ok(())
    }

    /// Releases a block allocated by [`allocate_cidr`](Self::allocate_cidr).
    ///
    /// Addresses of the block that lie inside some managed block return to the
    /// available set; addresses no managed block covers are skipped and
    /// counted. The network address is deallocated last, so a cancelled or
    /// failed release can simply be retried.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCidr`] if `cidr` does not parse
    /// - [`Error::NotAllocated`] if the block's network address is not
    ///   allocated (nothing is changed)
    /// - [`Error::Cancelled`] or a storage error
    pub fn release_cidr(&self, cidr: &str, cancel: &CancellationToken) -> Result<ReleaseSummary> {
        ensure_active(cancel)?;
        let block = Block::parse(cidr)?;
        let network = block.network();
        let mut summary = ReleaseSummary {
            cidr: block.to_string(),
            ..ReleaseSummary::default()
        };

        if !self.store.is_allocated(network)? {
            return Err(Error::NotAllocated {
                target: summary.cidr,
            });
        }

        let registry = self.registry.read();
        for addr in block.iter().skip(1) {
            ensure_active(cancel)?;
            if !registry.covers(addr) {
                summary.skipped += 1;
                continue;
            }
            match self.store.add_available(addr) {
                Ok(()) => summary.restored += 1,
                Err(e) if e.is_already_allocated() => summary.still_allocated += 1,
                Err(e) => return Err(e),
            }
        }
        drop(registry);

        self.store.deallocate(network)?;
        summary.restored += 1;

        if summary.skipped > 0 {
            log::warn!(
                "released {} but skipped {} address(es) outside every managed CIDR",
                summary.cidr,
                summary.skipped
            );
        } else {
            log::debug!("released {} ({} restored)", summary.cidr, summary.restored);
        }
        Ok(summary)
    }

    /// Allocates a single available address.
    ///
    /// The address does not have to lie inside a managed block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressUnavailable`] if the address is not available.
    pub fn allocate_ip(
        &self,
        addr: Ipv4Addr,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_active(cancel)?;
        self.store.allocate(addr, description)?;
        log::debug!("allocated {addr} for '{description}'");
        Ok(())
    }

    /// Returns an allocated address to the available set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`] if the address is not allocated.
    pub fn release_ip(&self, addr: Ipv4Addr, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        self.store.deallocate(addr)?;
        log::debug!("released {addr}");
        Ok(())
    }

    /// Adds a single address to the available set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressAlreadyAllocated`] if the address is allocated.
    pub fn add_ip(&self, addr: Ipv4Addr, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        self.store.add_available(addr)
    }

    /// Removes a single address from the available set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressUnavailable`] if the address is not available.
    pub fn remove_ip(&self, addr: Ipv4Addr, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        self.store.remove_available(addr)
    }

    /// Allocates the lowest available address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAvailableAddress`] if the pool is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cidrguard::{CancellationToken, Engine, MemoryStore};
    /// use std::net::Ipv4Addr;
    ///
    /// let cancel = CancellationToken::new();
    /// let engine = Engine::new(MemoryStore::new());
    /// engine.add_cidr("10.0.0.0/30", "lab", &cancel).unwrap();
    ///
    /// let addr = engine.next_available_ip("gateway", &cancel).unwrap();
    /// assert_eq!(addr, Ipv4Addr::new(10, 0, 0, 0));
    /// ```
    pub fn next_available_ip(
        &self,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<Ipv4Addr> {
        ensure_active(cancel)?;
        let addr = self
            .store
            .list_available()?
            .first()
            .copied()
            .ok_or(Error::NoAvailableAddress)?;
        self.store.allocate(addr, description)?;
        log::debug!("allocated next available {addr} for '{description}'");
        Ok(addr)
    }

    /// Returns the /24 blocks that hold at least one available address.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn available_cidrs(&self, cancel: &CancellationToken) -> Result<Vec<Block>> {
        ensure_active(cancel)?;
        report::group_available(&self.store.list_available()?)
    }

    /// Returns allocated blocks mapped to their descriptions.
    ///
    /// Single-address allocations are not included.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn used_cidrs(&self, cancel: &CancellationToken) -> Result<BTreeMap<String, String>> {
        ensure_active(cancel)?;
        Ok(report::collect_used(self.store.list_allocated()?.values()))
    }

    /// Returns the number of available addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn available_count(&self, cancel: &CancellationToken) -> Result<usize> {
        ensure_active(cancel)?;
        self.store.count_available()
    }

    /// Returns the number of allocated addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn allocated_count(&self, cancel: &CancellationToken) -> Result<usize> {
        ensure_active(cancel)?;
        self.store.count_allocated()
    }

    /// Returns the registered blocks in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the token has fired.
    pub fn managed_cidrs(&self, cancel: &CancellationToken) -> Result<Vec<ManagedCidr>> {
        ensure_active(cancel)?;
        Ok(self.registry.read().sorted())
    }

    /// Builds a point-in-time status snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if any store query fails.
    pub fn report(&self, cancel: &CancellationToken) -> Result<StatusSnapshot> {
        ensure_active(cancel)?;
        let managed = self.managed_cidrs(cancel)?;
        let used = self.used_cidrs(cancel)?;
        let available_count = self.available_count(cancel)?;
        let allocated_count = self.allocated_count(cancel)?;
        let available_cidrs = self.available_cidrs(cancel)?;

        Ok(StatusSnapshot {
            managed,
            used,
            available_count,
            allocated_count,
            available_cidrs,
        })
    }

    fn rollback_additions(&self, cause: Error, added: &[Ipv4Addr]) -> Error {
        log::warn!(
            "rolling back {} added address(es) after: {cause}",
            added.len()
        );
        let failures = added
            .iter()
            .rev()
            .filter_map(|addr| self.store.remove_available(*addr).err())
            .collect();
        Error::after_rollback(cause, failures)
    }

    fn rollback_block(&self, cause: Error, start: Ipv4Addr, removed: &[Ipv4Addr]) -> Error {
        log::warn!("rolling back block at {start} after: {cause}");
        let mut failures = Vec::new();
        if let Err(e) = self.store.deallocate(start) {
            failures.push(e);
        }
        for addr in removed.iter().rev() {
            if let Err(e) = self.store.add_available(*addr) {
                failures.push(e);
            }
        }
        Error::after_rollback(cause, failures)
    }
}
