//! IPv4 address arithmetic and CIDR block types.
//!
//! This module provides the fixed-width helpers the engine builds on:
//! ascending increment with carry, prefix masks, the subnet-alignment test,
//! and the [`Block`] type for parsed CIDR blocks with ordered iteration.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of bits in an IPv4 address.
pub const ADDRESS_BITS: u8 = 32;

/// Returns the address that follows `addr`.
///
/// The octets are incremented big-endian with carry from the last octet.
/// Incrementing `255.255.255.255` wraps to `0.0.0.0`.
///
/// # Examples
///
/// ```
/// use cidrguard::address::increment;
/// use std::net::Ipv4Addr;
///
/// assert_eq!(increment(Ipv4Addr::new(10, 0, 0, 255)), Ipv4Addr::new(10, 0, 1, 0));
/// assert_eq!(increment(Ipv4Addr::BROADCAST), Ipv4Addr::UNSPECIFIED);
/// ```
#[must_use]
pub fn increment(addr: Ipv4Addr) -> Ipv4Addr {
    let mut octets = addr.octets();
    for octet in octets.iter_mut().rev() {
        *octet = octet.wrapping_add(1);
        if *octet != 0 {
            break;
        }
    }
    Ipv4Addr::from(octets)
}

/// Returns the network mask for a prefix length as a host-order integer.
///
/// Prefix lengths above 32 saturate to a full mask.
#[must_use]
pub const fn prefix_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else if prefix >= ADDRESS_BITS {
        u32::MAX
    } else {
        u32::MAX << (ADDRESS_BITS - prefix)
    }
}

/// Returns `true` if `addr` can start a `/prefix` block.
///
/// An address is aligned when masking it with the prefix leaves it unchanged.
///
/// # Examples
///
/// ```
/// use cidrguard::address::is_aligned;
/// use std::net::Ipv4Addr;
///
/// assert!(is_aligned(Ipv4Addr::new(192, 168, 0, 4), 30));
/// assert!(!is_aligned(Ipv4Addr::new(192, 168, 0, 5), 30));
/// ```
#[must_use]
pub fn is_aligned(addr: Ipv4Addr, prefix: u8) -> bool {
    let value = u32::from(addr);
    value == value & prefix_mask(prefix)
}

/// Number of addresses in a `/prefix` block.
#[must_use]
pub const fn block_size(prefix: u8) -> u64 {
    if prefix >= ADDRESS_BITS {
        1
    } else {
        1u64 << (ADDRESS_BITS - prefix)
    }
}

/// Parses a dotted-quad IPv4 address.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if the input is not an IPv4 address.
pub fn parse_addr(input: &str) -> Result<Ipv4Addr> {
    input
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| Error::InvalidAddress {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

/// A parsed IPv4 CIDR block, always held in truncated (network) form.
///
/// # Examples
///
/// ```
/// use cidrguard::address::Block;
/// use std::net::Ipv4Addr;
///
/// let block: Block = "192.168.0.7/30".parse().unwrap();
/// assert_eq!(block.to_string(), "192.168.0.4/30");
/// assert_eq!(block.size(), 4);
/// assert!(block.contains(Ipv4Addr::new(192, 168, 0, 6)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(Ipv4Net);

impl Block {
    /// Parses a CIDR string such as `"10.0.0.0/24"`.
    ///
    /// Host bits are cleared, so `"10.0.0.9/24"` yields `10.0.0.0/24`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCidr`] on malformed input.
    pub fn parse(input: &str) -> Result<Self> {
        let net = Ipv4Net::from_str(input.trim()).map_err(|e| Error::InvalidCidr {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(net.trunc()))
    }

    /// Builds the `/prefix` block that contains `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrefix`] if `prefix` exceeds 32.
    pub fn containing(addr: Ipv4Addr, prefix: u8) -> Result<Self> {
        let net = Ipv4Net::new(addr, prefix).map_err(|_| Error::InvalidPrefix { prefix })?;
        Ok(Self(net.trunc()))
    }

    /// Returns the network (lowest) address of the block.
    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        self.0.network()
    }

    /// Returns the highest address of the block.
    #[must_use]
    pub fn last(&self) -> Ipv4Addr {
        self.0.broadcast()
    }

    /// Returns the prefix length.
    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Returns the number of addresses in the block.
    #[must_use]
    pub fn size(&self) -> u64 {
        block_size(self.prefix_len())
    }

    /// Returns `true` if `addr` lies inside the block.
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & prefix_mask(self.prefix_len()) == u32::from(self.network())
    }

    /// Returns an iterator over every address of the block in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use cidrguard::address::Block;
    /// use std::net::Ipv4Addr;
    ///
    /// let block = Block::parse("10.1.2.252/30").unwrap();
    /// let addrs: Vec<Ipv4Addr> = block.iter().collect();
    /// assert_eq!(addrs.len(), 4);
    /// assert_eq!(addrs[0], Ipv4Addr::new(10, 1, 2, 252));
    /// assert_eq!(addrs[3], Ipv4Addr::new(10, 1, 2, 255));
    /// ```
    #[must_use]
    pub fn iter(&self) -> BlockIter {
        BlockIter {
            next: self.network(),
            remaining: self.size(),
        }
    }

    /// Returns the underlying `ipnet` network.
    #[must_use]
    pub const fn as_net(&self) -> &Ipv4Net {
        &self.0
    }
}

impl FromStr for Block {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Ipv4Net> for Block {
    fn from(net: Ipv4Net) -> Self {
        Self(net.trunc())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len())
    }
}

impl IntoIterator for Block {
    type Item = Ipv4Addr;
    type IntoIter = BlockIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &Block {
    type Item = Ipv4Addr;
    type IntoIter = BlockIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the addresses of a [`Block`].
#[derive(Debug, Clone)]
pub struct BlockIter {
    next: Ipv4Addr,
    remaining: u64,
}

impl Iterator for BlockIter {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let addr = self.next;
        self.remaining -= 1;
        self.next = increment(addr);
        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
mod proptests;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_simple() {
        assert_eq!(
            increment(Ipv4Addr::new(10, 0, 0, 1)),
            Ipv4Addr::new(10, 0, 0, 2)
        );
    }

    #[test]
    fn test_increment_carries_across_octets() {
        assert_eq!(
            increment(Ipv4Addr::new(10, 0, 255, 255)),
            Ipv4Addr::new(10, 1, 0, 0)
        );
        assert_eq!(
            increment(Ipv4Addr::new(9, 255, 255, 255)),
            Ipv4Addr::new(10, 0, 0, 0)
        );
    }

    #[test]
    fn test_increment_wraps_at_maximum() {
        assert_eq!(increment(Ipv4Addr::BROADCAST), Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_prefix_mask_edges() {
        assert_eq!(prefix_mask(0), 0);
        assert_eq!(prefix_mask(8), 0xFF00_0000);
        assert_eq!(prefix_mask(24), 0xFFFF_FF00);
        assert_eq!(prefix_mask(32), u32::MAX);
    }

    #[test]
    fn test_is_aligned() {
        assert!(is_aligned(Ipv4Addr::new(192, 168, 0, 0), 24));
        assert!(!is_aligned(Ipv4Addr::new(192, 168, 0, 1), 24));
        assert!(is_aligned(Ipv4Addr::new(192, 168, 0, 8), 29));
        assert!(!is_aligned(Ipv4Addr::new(192, 168, 0, 12), 29));

        // Every address starts a /32, only 0.0.0.0 starts a /0
        assert!(is_aligned(Ipv4Addr::new(192, 168, 0, 13), 32));
        assert!(is_aligned(Ipv4Addr::UNSPECIFIED, 0));
        assert!(!is_aligned(Ipv4Addr::new(0, 0, 0, 1), 0));
    }

    #[test]
    fn test_block_size() {
        assert_eq!(block_size(32), 1);
        assert_eq!(block_size(30), 4);
        assert_eq!(block_size(24), 256);
        assert_eq!(block_size(0), 1u64 << 32);
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(
            parse_addr("10.0.0.1").unwrap(),
            Ipv4Addr::new(10, 0, 0, 1)
        );
        assert!(matches!(
            parse_addr("10.0.0.256"),
            Err(Error::InvalidAddress { .. })
        ));
        assert!(parse_addr("::1").is_err());
    }

    #[test]
    fn test_block_parse_canonicalizes() {
        let block = Block::parse("10.0.0.77/24").unwrap();
        assert_eq!(block.to_string(), "10.0.0.0/24");
        assert_eq!(block.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(block.last(), Ipv4Addr::new(10, 0, 0, 255));
        assert_eq!(block.prefix_len(), 24);
    }

    #[test]
    fn test_block_parse_rejects_malformed() {
        for input in ["", "10.0.0.0", "10.0.0.0/33", "10.0.0/24", "fe80::/64", "a.b.c.d/8"] {
            let err = Block::parse(input).unwrap_err();
            assert!(
                matches!(err, Error::InvalidCidr { .. }),
                "expected InvalidCidr for {input:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_block_containing() {
        let block = Block::containing(Ipv4Addr::new(172, 16, 5, 9), 24).unwrap();
        assert_eq!(block.to_string(), "172.16.5.0/24");
        assert!(matches!(
            Block::containing(Ipv4Addr::new(172, 16, 5, 9), 33),
            Err(Error::InvalidPrefix { prefix: 33 })
        ));
    }

    #[test]
    fn test_block_contains() {
        let block = Block::parse("192.168.1.0/25").unwrap();
        assert!(block.contains(Ipv4Addr::new(192, 168, 1, 0)));
        assert!(block.contains(Ipv4Addr::new(192, 168, 1, 127)));
        assert!(!block.contains(Ipv4Addr::new(192, 168, 1, 128)));
        assert!(!block.contains(Ipv4Addr::new(192, 168, 0, 1)));
    }

    #[test]
    fn test_block_iter_includes_network_and_broadcast() {
        let block = Block::parse("10.0.0.0/29").unwrap();
        let addrs: Vec<Ipv4Addr> = block.iter().collect();
        assert_eq!(addrs.len(), 8);
        assert_eq!(addrs.first(), Some(&Ipv4Addr::new(10, 0, 0, 0)));
        assert_eq!(addrs.last(), Some(&Ipv4Addr::new(10, 0, 0, 7)));
        assert!(addrs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_block_iter_crosses_octet_boundary() {
        let block = Block::parse("10.0.0.0/23").unwrap();
        let addrs: Vec<Ipv4Addr> = block.iter().collect();
        assert_eq!(addrs.len(), 512);
        assert_eq!(addrs[256], Ipv4Addr::new(10, 0, 1, 0));
    }

    #[test]
    fn test_block_iter_top_of_space_stops() {
        let block = Block::parse("255.255.255.252/30").unwrap();
        let addrs: Vec<Ipv4Addr> = block.iter().collect();
        assert_eq!(addrs.len(), 4);
        assert_eq!(addrs[3], Ipv4Addr::BROADCAST);
    }

    #[test]
    fn test_block_iter_size_hint() {
        let block = Block::parse("10.0.0.0/30").unwrap();
        let mut iter = block.iter();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        iter.next();
        assert_eq!(iter.size_hint(), (3, Some(3)));
    }

    #[test]
    fn test_block_ordering_and_serde() {
        let a = Block::parse("10.0.0.0/24").unwrap();
        let b = Block::parse("10.0.1.0/24").unwrap();
        assert!(a < b);

        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"10.0.0.0/24\"");
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
