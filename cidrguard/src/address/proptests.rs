//! Property-based tests for address arithmetic and `Block`.

use std::net::Ipv4Addr;

use proptest::prelude::*;

use super::{block_size, increment, is_aligned, prefix_mask, Block};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 10000,
        max_shrink_iters: 10000,
        .. ProptestConfig::default()
    })]

    // Increment agrees with wrapping integer addition
    #[test]
    fn increment_matches_u32(raw in any::<u32>()) {
        let next = increment(Ipv4Addr::from(raw));
        prop_assert_eq!(u32::from(next), raw.wrapping_add(1));
    }

    // The mask has exactly `prefix` leading ones
    #[test]
    fn prefix_mask_leading_ones(prefix in 0u8..=32) {
        prop_assert_eq!(prefix_mask(prefix).leading_ones(), u32::from(prefix));
        prop_assert_eq!(prefix_mask(prefix).count_ones(), u32::from(prefix));
    }

    // Masking any address yields an aligned address
    #[test]
    fn masked_address_is_aligned(raw in any::<u32>(), prefix in 0u8..=32) {
        let masked = Ipv4Addr::from(raw & prefix_mask(prefix));
        prop_assert!(is_aligned(masked, prefix));
    }

    // Alignment at a longer prefix is implied by alignment at a shorter one
    #[test]
    fn alignment_is_monotonic(raw in any::<u32>(), short in 0u8..=32, extra in 0u8..=32) {
        let long = short.saturating_add(extra).min(32);
        let addr = Ipv4Addr::from(raw);
        if is_aligned(addr, short) {
            prop_assert!(is_aligned(addr, long));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // The containing block holds the address and starts aligned
    #[test]
    fn containing_block_holds_address(raw in any::<u32>(), prefix in 0u8..=32) {
        let addr = Ipv4Addr::from(raw);
        let block = Block::containing(addr, prefix).unwrap();
        prop_assert!(block.contains(addr));
        prop_assert!(is_aligned(block.network(), prefix));
        prop_assert_eq!(
            u64::from(u32::from(block.last())) - u64::from(u32::from(block.network())) + 1,
            block_size(prefix)
        );
    }

    // Parsing the display form yields the same block
    #[test]
    fn display_parses_back(raw in any::<u32>(), prefix in 0u8..=32) {
        let block = Block::containing(Ipv4Addr::from(raw), prefix).unwrap();
        prop_assert_eq!(Block::parse(&block.to_string()).unwrap(), block);
    }

    // Iteration visits size() ascending addresses inside the block
    #[test]
    fn iteration_stays_inside(raw in any::<u32>(), prefix in 20u8..=32) {
        let block = Block::containing(Ipv4Addr::from(raw), prefix).unwrap();
        let addrs: Vec<Ipv4Addr> = block.iter().collect();
        prop_assert_eq!(addrs.len() as u64, block.size());
        prop_assert!(addrs.iter().all(|a| block.contains(*a)));
        prop_assert!(addrs.windows(2).all(|w| w[0] < w[1]));
    }
}
