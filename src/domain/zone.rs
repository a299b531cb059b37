// Copyright (c) 2025 - Cowboy AI, Inc.
//! Placement zones and hosted zones

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Hostname;

/// Opaque identifier of an independent failure domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementZone(String);

impl PlacementZone {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlacementZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlacementZone {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// DNS hosted zone owning the validation and alias records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedZone {
    /// Engine identifier of the zone
    pub zone_id: String,
    /// Apex name of the zone
    pub name: Hostname,
}
