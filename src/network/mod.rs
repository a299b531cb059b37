// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network layer
//!
//! - [`allocate_subnets`] - pure address-space partitioning
//! - [`ZoneSelector`] - round-robin placement over at least two zones
//! - [`NetworkTopology`] - network, gateway, subnets, NAT path and routes

pub mod allocator;
pub mod topology;
pub mod zones;

pub use allocator::{allocate_subnets, AddressPlan};
pub use topology::{NetworkTopology, RoutePath, Subnet, TopologyRequest, Visibility};
pub use zones::{ZoneSelector, MIN_ZONES};
