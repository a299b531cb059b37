// Copyright (c) 2025 - Cowboy AI, Inc.
//! Placement zone selection
//!
//! Subnet `i` of a list lands in `zones[i mod len(zones)]`. With at most as
//! many subnets as zones no zone is used twice.

use tracing::debug;

use crate::domain::PlacementZone;
use crate::engine::ProvisioningEngine;
use crate::errors::{ProvisionError, ProvisionResult};

/// Minimum number of distinct zones multi-zone placement requires
pub const MIN_ZONES: usize = 2;

/// Round-robin assignment of subnets to placement zones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSelector {
    zones: Vec<PlacementZone>,
}

impl ZoneSelector {
    /// Build from a zone list; duplicates are dropped, order is kept
    pub fn new(zones: Vec<PlacementZone>) -> ProvisionResult<Self> {
        let mut distinct: Vec<PlacementZone> = Vec::with_capacity(zones.len());
        for zone in zones {
            if !distinct.contains(&zone) {
                distinct.push(zone);
            }
        }

        if distinct.len() < MIN_ZONES {
            return Err(ProvisionError::topology(format!(
                "{} placement zone(s) available, at least {} required",
                distinct.len(),
                MIN_ZONES
            )));
        }

        Ok(Self { zones: distinct })
    }

    /// Query the engine for available zones
    pub async fn discover(engine: &dyn ProvisioningEngine) -> ProvisionResult<Self> {
        let zones = engine.availability_zones().await?;
        debug!(engine = engine.name(), zones = zones.len(), "Discovered placement zones");
        Self::new(zones)
    }

    pub fn zones(&self) -> &[PlacementZone] {
        &self.zones
    }

    /// Zone for the `index`-th subnet of a list
    pub fn zone_for(&self, index: usize) -> &PlacementZone {
        &self.zones[index % self.zones.len()]
    }

    /// Zones for the first `count` subnets of a list
    pub fn assign(&self, count: usize) -> Vec<PlacementZone> {
        (0..count).map(|i| self.zone_for(i).clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryEngine;
    use test_case::test_case;

    fn selector(names: &[&str]) -> ProvisionResult<ZoneSelector> {
        ZoneSelector::new(names.iter().map(|n| PlacementZone::new(*n)).collect())
    }

    #[test_case(&[] ; "no zones")]
    #[test_case(&["a"] ; "one zone")]
    #[test_case(&["a", "a"] ; "one distinct zone")]
    fn test_too_few_zones(names: &[&str]) {
        assert!(matches!(selector(names), Err(ProvisionError::Topology(_))));
    }

    #[test]
    fn test_round_robin() {
        let zones = selector(&["a", "b"]).unwrap();
        let assigned: Vec<String> = zones.assign(5).iter().map(|z| z.to_string()).collect();
        assert_eq!(assigned, vec!["a", "b", "a", "b", "a"]);
    }

    #[test]
    fn test_injective_when_enough_zones() {
        let zones = selector(&["a", "b", "c"]).unwrap();
        let mut assigned = zones.assign(3);
        assigned.dedup();
        assert_eq!(assigned.len(), 3);
    }

    #[test]
    fn test_discover_uses_engine() {
        let engine = InMemoryEngine::new().with_zones(["x", "y"]);
        let zones = tokio_test::block_on(ZoneSelector::discover(&engine)).unwrap();
        assert_eq!(zones.zone_for(3).as_str(), "y");

        let lonely = InMemoryEngine::new().with_zones(["x"]);
        assert!(tokio_test::block_on(ZoneSelector::discover(&lonely)).is_err());
    }
}
