// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Zone Placement

use edge_infrastructure::domain::PlacementZone;
use edge_infrastructure::network::{ZoneSelector, MIN_ZONES};
use edge_infrastructure::ProvisionError;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arb_zones() -> impl Strategy<Value = Vec<PlacementZone>> {
    prop::collection::btree_set("[a-z]{1,3}-[0-9][a-c]", MIN_ZONES..6)
        .prop_map(|names| names.into_iter().map(PlacementZone::new).collect())
}

proptest! {
    /// Subnet `i` lands in zone `i mod n`
    #[test]
    fn prop_round_robin(zones in arb_zones(), count in 1usize..20) {
        let selector = ZoneSelector::new(zones.clone()).unwrap();
        let assigned = selector.assign(count);

        prop_assert_eq!(assigned.len(), count);
        for (i, zone) in assigned.iter().enumerate() {
            prop_assert_eq!(zone, &zones[i % zones.len()]);
        }
    }

    /// Two or more subnets always span at least two zones
    #[test]
    fn prop_spreads_over_two_zones(zones in arb_zones(), count in 2usize..20) {
        let selector = ZoneSelector::new(zones).unwrap();
        let distinct: BTreeSet<PlacementZone> = selector.assign(count).into_iter().collect();
        prop_assert!(distinct.len() >= 2);
    }

    /// A single distinct zone is never enough
    #[test]
    fn prop_single_zone_rejected(name in "[a-z]{1,3}-[0-9][a-c]", copies in 1usize..4) {
        let zones = vec![PlacementZone::new(name); copies];
        prop_assert!(matches!(ZoneSelector::new(zones), Err(ProvisionError::Topology(_))));
    }
}
