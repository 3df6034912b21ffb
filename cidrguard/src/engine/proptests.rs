//! Property-based tests for engine round trips.

use std::net::Ipv4Addr;

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::{Engine, EngineOptions, SearchStrategy};
use crate::address::{is_aligned, Block};
use crate::store::{AddressStore, MemoryStore};
use crate::tag::SEPARATOR;

fn engine_with(strategy: SearchStrategy) -> Engine<MemoryStore> {
    Engine::with_options(
        MemoryStore::new(),
        EngineOptions::default().with_search(strategy),
    )
}

fn strategy() -> impl Strategy<Value = SearchStrategy> {
    prop_oneof![Just(SearchStrategy::FirstAligned), Just(SearchStrategy::FirstFit)]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    // Registering then unregistering a block restores the available count
    #[test]
    fn add_remove_restores_available(
        raw in any::<u32>(),
        prefix in 22u8..=32,
        extras in proptest::collection::vec(any::<u32>(), 0..8),
    ) {
        let cancel = CancellationToken::new();
        let engine = engine_with(SearchStrategy::FirstAligned);
        let block = Block::containing(Ipv4Addr::from(raw), prefix).unwrap();
        for extra in extras {
            let addr = Ipv4Addr::from(extra);
            if !block.contains(addr) {
                engine.add_ip(addr, &cancel).unwrap();
            }
        }

        let before = engine.available_count(&cancel).unwrap();
        engine.add_cidr(&block.to_string(), "prop", &cancel).unwrap();
        prop_assert_eq!(
            engine.available_count(&cancel).unwrap() as u64,
            before as u64 + block.size()
        );

        engine.remove_cidr(&block.to_string(), &cancel).unwrap();
        prop_assert_eq!(engine.available_count(&cancel).unwrap(), before);
        prop_assert!(engine.managed_cidrs(&cancel).unwrap().is_empty());
    }

    // Allocating then releasing a block restores both counts
    #[test]
    fn allocate_release_restores_counts(
        pool in any::<u32>(),
        prior in 0usize..6,
        prefix in 26u8..=32,
        search in strategy(),
    ) {
        let cancel = CancellationToken::new();
        let engine = engine_with(search);
        let pool = Block::containing(Ipv4Addr::from(pool), 24).unwrap();
        engine.add_cidr(&pool.to_string(), "pool", &cancel).unwrap();
        for n in 0..prior {
            engine.allocate_cidr(30, &format!("prior-{n}"), &cancel).unwrap();
        }

        let available = engine.available_count(&cancel).unwrap();
        let allocated = engine.allocated_count(&cancel).unwrap();

        let cidr = engine.allocate_cidr(prefix, "prop", &cancel).unwrap();
        let block = Block::parse(&cidr).unwrap();
        prop_assert_eq!(block.prefix_len(), prefix);
        prop_assert!(is_aligned(block.network(), prefix));
        prop_assert!(pool.contains(block.network()) && pool.contains(block.last()));
        prop_assert_eq!(engine.allocated_count(&cancel).unwrap(), allocated + 1);

        let summary = engine.release_cidr(&cidr, &cancel).unwrap();
        prop_assert_eq!(summary.restored, block.size());
        prop_assert_eq!(engine.available_count(&cancel).unwrap(), available);
        prop_assert_eq!(engine.allocated_count(&cancel).unwrap(), allocated);
    }

    // A /32 allocation of a singleton pool takes exactly that address
    #[test]
    fn single_address_block(raw in any::<u32>(), desc in "[a-z]{1,12}") {
        let cancel = CancellationToken::new();
        let engine = engine_with(SearchStrategy::FirstAligned);
        let addr = Ipv4Addr::from(raw);
        engine.add_ip(addr, &cancel).unwrap();

        let cidr = engine.allocate_cidr(32, &desc, &cancel).unwrap();
        prop_assert_eq!(&cidr, &format!("{addr}/32"));
        prop_assert_eq!(engine.available_count(&cancel).unwrap(), 0);
        let allocated = engine.store().list_allocated().unwrap();
        prop_assert_eq!(&allocated[&addr], &format!("{addr}/32 - {desc}"));
    }

    // Only descriptions carrying the separator show up as used blocks
    #[test]
    fn used_cidrs_require_separator(
        descriptions in proptest::collection::vec("[a-z]{0,4}( - )?[a-z]{0,4}", 1..16),
    ) {
        let cancel = CancellationToken::new();
        let engine = engine_with(SearchStrategy::FirstAligned);
        for (n, desc) in descriptions.iter().enumerate() {
            let addr = Ipv4Addr::new(10, 0, 0, u8::try_from(n).unwrap());
            engine.add_ip(addr, &cancel).unwrap();
            engine.allocate_ip(addr, desc, &cancel).unwrap();
        }

        let used = engine.used_cidrs(&cancel).unwrap();
        let tagged: std::collections::BTreeSet<&str> = descriptions
            .iter()
            .filter_map(|d| d.split_once(SEPARATOR).map(|(cidr, _)| cidr))
            .collect();
        prop_assert_eq!(used.len(), tagged.len());
        for key in used.keys() {
            prop_assert!(tagged.contains(key.as_str()));
        }
    }
}
