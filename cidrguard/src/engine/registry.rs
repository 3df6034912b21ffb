//! Registry of managed CIDR blocks.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::address::Block;

/// A CIDR block registered with the engine.
///
/// # Examples
///
/// ```
/// use cidrguard::address::Block;
/// use cidrguard::ManagedCidr;
///
/// let managed = ManagedCidr::new(Block::parse("10.0.0.9/24").unwrap(), "lab");
/// assert_eq!(managed.cidr(), "10.0.0.0/24");
/// assert_eq!(managed.description(), "lab");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedCidr {
    cidr: String,
    description: String,
    #[serde(skip)]
    block: Block,
}

impl ManagedCidr {
    /// Creates a managed block with its canonical key.
    pub fn new(block: Block, description: impl Into<String>) -> Self {
        Self {
            cidr: block.to_string(),
            description: description.into(),
            block,
        }
    }

    /// Returns the canonical CIDR string.
    #[must_use]
    pub fn cidr(&self) -> &str {
        &self.cidr
    }

    /// Returns the registration description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parsed block.
    #[must_use]
    pub const fn block(&self) -> Block {
        self.block
    }
}

/// Managed blocks keyed by canonical CIDR string.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: BTreeMap<String, ManagedCidr>,
}

impl Registry {
    pub(crate) fn contains(&self, cidr: &str) -> bool {
        self.entries.contains_key(cidr)
    }

    pub(crate) fn insert(&mut self, managed: ManagedCidr) {
        self.entries.insert(managed.cidr.clone(), managed);
    }

    pub(crate) fn remove(&mut self, cidr: &str) -> Option<ManagedCidr> {
        self.entries.remove(cidr)
    }

    /// First registered block that shares an address with `block`.
    pub(crate) fn overlapping(&self, block: &Block) -> Option<&ManagedCidr> {
        self.entries.values().find(|m| {
            m.block.contains(block.network()) || block.contains(m.block.network())
        })
    }

    /// Returns `true` if any registered block contains `addr`.
    pub(crate) fn covers(&self, addr: Ipv4Addr) -> bool {
        self.entries.values().any(|m| m.block.contains(addr))
    }

    /// Registered blocks in ascending numeric order.
    pub(crate) fn sorted(&self) -> Vec<ManagedCidr> {
        let mut all: Vec<ManagedCidr> = self.entries.values().cloned().collect();
        all.sort_by_key(ManagedCidr::block);
        all
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
