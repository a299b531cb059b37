// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Address Allocation

use edge_infrastructure::domain::AddressBlock;
use edge_infrastructure::network::allocate_subnets;
use edge_infrastructure::ProvisionError;
use proptest::prelude::*;
use std::net::Ipv4Addr;

// ============================================================================
// Generators
// ============================================================================

/// Base block with a prefix short enough to split at least once
fn arb_base() -> impl Strategy<Value = AddressBlock> {
    (any::<u32>(), 8u8..=28).prop_map(|(address, prefix)| {
        AddressBlock::new(Ipv4Addr::from(address), prefix).unwrap()
    })
}

/// Base block, partition width and a fitting (public, private) request
fn arb_request() -> impl Strategy<Value = (AddressBlock, u8, usize, usize)> {
    arb_base().prop_flat_map(|base| {
        let max_bits = (32 - base.prefix_len()).min(8);
        (Just(base), 1u8..=max_bits).prop_flat_map(|(base, new_bits)| {
            let capacity = 1usize << new_bits;
            (Just(base), Just(new_bits), 1..=capacity.min(16)).prop_flat_map(
                move |(base, new_bits, total)| {
                    (Just(base), Just(new_bits), 0..=total)
                        .prop_map(move |(base, new_bits, public)| (base, new_bits, public, total - public))
                },
            )
        })
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every sub-block lies inside the base block at the extended prefix
    #[test]
    fn prop_blocks_are_contained((base, new_bits, public, private) in arb_request()) {
        let plan = allocate_subnets(&base, new_bits, public, private).unwrap();
        prop_assert_eq!(plan.public.len(), public);
        prop_assert_eq!(plan.private.len(), private);

        for block in plan.all() {
            prop_assert!(base.contains(block));
            prop_assert_eq!(block.prefix_len(), base.prefix_len() + new_bits);
        }
    }

    /// No two sub-blocks share an address
    #[test]
    fn prop_blocks_are_disjoint((base, new_bits, public, private) in arb_request()) {
        let plan = allocate_subnets(&base, new_bits, public, private).unwrap();
        let blocks: Vec<&AddressBlock> = plan.all().collect();

        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                prop_assert!(!a.overlaps(b), "{} overlaps {}", a, b);
            }
        }
    }

    /// Sub-block `i` is always the `i`-th partition, public first
    #[test]
    fn prop_allocation_is_ordered_and_pure((base, new_bits, public, private) in arb_request()) {
        let first = allocate_subnets(&base, new_bits, public, private).unwrap();
        let second = allocate_subnets(&base, new_bits, public, private).unwrap();
        prop_assert_eq!(&first, &second);

        for (index, block) in first.all().enumerate() {
            prop_assert_eq!(*block, base.subnet(new_bits, index as u64).unwrap());
        }
    }

    /// Asking for more sub-blocks than the partition holds is a topology error
    #[test]
    fn prop_overflow_is_rejected(base in arb_base(), new_bits in 1u8..=6, extra in 1usize..4) {
        prop_assume!(base.prefix_len() + new_bits <= 32);
        let capacity = 1usize << new_bits;
        let result = allocate_subnets(&base, new_bits, capacity, extra);
        prop_assert!(matches!(result, Err(ProvisionError::Topology(_))));
    }
}

#[test]
fn test_documented_split() {
    let base: AddressBlock = "10.0.0.0/16".parse().unwrap();
    let plan = allocate_subnets(&base, 7, 2, 2).unwrap();
    let rendered: Vec<String> = plan.all().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec!["10.0.0.0/23", "10.0.2.0/23", "10.0.4.0/23", "10.0.6.0/23"]
    );
}
