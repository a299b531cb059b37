// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Domain Models
//!
//! Value objects with validation invariants shared by every builder.
//!
//! - [`AddressBlock`] - IPv4 CIDR block with deterministic partitioning
//! - [`Hostname`] - DNS-validated hostnames (RFC 1123, leftmost wildcard allowed)
//! - [`PlacementZone`] - Opaque failure-domain identifier
//! - [`HostedZone`] - DNS zone owning validation and alias records
//! - [`ResourceKind`] - Desired-state resource taxonomy

pub mod hostname;
pub mod network;
pub mod resource_kind;
pub mod zone;

pub use hostname::{Hostname, HostnameError};
pub use network::{AddressBlock, NetworkError, ANY_IPV4};
pub use resource_kind::ResourceKind;
pub use zone::{HostedZone, PlacementZone};
