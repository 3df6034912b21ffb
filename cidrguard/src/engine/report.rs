//! Block-level views derived from flat per-address state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::address::Block;
use crate::error::{Error, Result};
use crate::tag::BlockTag;

use super::registry::ManagedCidr;

/// Prefix length used to group available addresses.
pub const GROUPING_PREFIX: u8 = 24;

/// Groups addresses into their containing /24 blocks.
///
/// This is an approximation: a /24 appears if any one of its addresses is
/// available.
pub(crate) fn group_available(addrs: &[Ipv4Addr]) -> Result<Vec<Block>> {
    let mut groups = BTreeSet::new();
    for addr in addrs {
        groups.insert(Block::containing(*addr, GROUPING_PREFIX)?);
    }
    Ok(groups.into_iter().collect())
}

/// Recovers block allocations from allocated descriptions.
///
/// Plain single-address descriptions are not block allocations and are
/// left out.
pub(crate) fn collect_used<'a>(
    descriptions: impl IntoIterator<Item = &'a String>,
) -> BTreeMap<String, String> {
    descriptions
        .into_iter()
        .filter_map(|raw| BlockTag::parse(raw))
        .map(|tag| (tag.cidr, tag.description))
        .collect()
}

/// Outcome of [`Engine::release_cidr`](super::Engine::release_cidr).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
    /// The released block in canonical form.
    pub cidr: String,
    /// Addresses returned to the available set, network address included.
    pub restored: u64,
    /// Addresses left out because no managed block covers them.
    pub skipped: u64,
    /// Addresses left alone because they are individually allocated.
    pub still_allocated: u64,
}

/// Point-in-time view of the pool.
///
/// The text form comes from [`Display`](fmt::Display); [`to_json`](Self::to_json)
/// gives the machine form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Registered blocks in ascending order.
    pub managed: Vec<ManagedCidr>,
    /// Allocated blocks mapped to their descriptions.
    pub used: BTreeMap<String, String>,
    /// Number of available addresses.
    pub available_count: usize,
    /// Number of allocated addresses.
    pub allocated_count: usize,
    /// /24 groups with at least one available address.
    pub available_cidrs: Vec<Block>,
}

impl StatusSnapshot {
    /// Serializes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Validation {
            field: "json_output".to_string(),
            message: format!("failed to serialize to JSON: {e}"),
        })
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Managed CIDRs:")?;
        if self.managed.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for managed in &self.managed {
            writeln!(f, "  {}: {}", managed.cidr(), managed.description())?;
        }

        writeln!(f, "Allocated blocks:")?;
        if self.used.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (cidr, description) in &self.used {
            writeln!(f, "  {cidr}: {description}")?;
        }

        writeln!(f, "Available addresses: {}", self.available_count)?;
        writeln!(f, "Allocated addresses: {}", self.allocated_count)?;

        write!(f, "Available /{GROUPING_PREFIX} groups:")?;
        if self.available_cidrs.is_empty() {
            write!(f, " (none)")?;
        }
        for block in &self.available_cidrs {
            write!(f, "\n  {block}")?;
        }
        Ok(())
    }
}
