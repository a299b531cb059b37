// Copyright (c) 2025 - Cowboy AI, Inc.

//! Provisioning Engine - The Seam to Whatever Creates Resources
//!
//! This crate never creates infrastructure itself. It emits desired-state
//! declarations and hands each one, fully resolved, to a `ProvisioningEngine`.
//! The engine owns creation, state storage, and destroy semantics; this crate
//! only consumes the identifiers it reports back.
//!
//! # Architecture
//!
//! ```text
//! Stack ──resolve──> ResolvedResource ──create──> Engine
//!   ▲                                               │
//!   └──────────────── ResourceOutputs ◄─────────────┘
//! ```
//!
//! Besides `create`, the engine answers the lookups that planning needs up
//! front (placement zones, hosted zones, account context) and the status
//! query behind the certificate issuance wait.
//!
//! # Example Implementation
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use edge_infrastructure::domain::{HostedZone, Hostname, PlacementZone};
//! use edge_infrastructure::engine::*;
//! use edge_infrastructure::errors::{ProvisionError, ProvisionResult};
//!
//! struct ReadOnlyEngine;
//!
//! #[async_trait]
//! impl ProvisioningEngine for ReadOnlyEngine {
//!     async fn availability_zones(&self) -> ProvisionResult<Vec<PlacementZone>> {
//!         Ok(vec!["zone-a".into(), "zone-b".into()])
//!     }
//!
//!     async fn lookup_hosted_zone(&self, name: &Hostname) -> ProvisionResult<HostedZone> {
//!         Ok(HostedZone { zone_id: "Z1".into(), name: name.clone() })
//!     }
//!
//!     async fn account_context(&self) -> ProvisionResult<AccountContext> {
//!         Ok(AccountContext { account_id: "000000000000".into(), region: "local".into() })
//!     }
//!
//!     async fn create(&self, resource: ResolvedResource) -> ProvisionResult<ResourceOutputs> {
//!         Err(ProvisionError::provider(resource.name, "read-only engine"))
//!     }
//!
//!     async fn certificate_status(&self, arn: &str) -> ProvisionResult<CertificateStatus> {
//!         Err(ProvisionError::provider(arn, "read-only engine"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "read-only"
//!     }
//! }
//! ```

pub mod memory;

pub use memory::InMemoryEngine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::{HostedZone, Hostname, PlacementZone, ResourceKind};
use crate::errors::{ProvisionError, ProvisionResult};

/// Provisioning engine trait
///
/// Implementations must:
/// - Fail with `ProvisionError::Provider` naming the resource on any failure
/// - Return every output the declaration's consumers read (`id` at minimum)
/// - Treat `create` for a DNS record with `allowOverwrite` as an upsert
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Placement zones currently available to new subnets
    async fn availability_zones(&self) -> ProvisionResult<Vec<PlacementZone>>;

    /// Resolve an existing hosted zone by its apex name
    async fn lookup_hosted_zone(&self, name: &Hostname) -> ProvisionResult<HostedZone>;

    /// Account and region the engine provisions into
    async fn account_context(&self) -> ProvisionResult<AccountContext>;

    /// Create (or upsert) one fully-resolved resource
    async fn create(&self, resource: ResolvedResource) -> ProvisionResult<ResourceOutputs>;

    /// Current issuance status of a requested certificate
    async fn certificate_status(&self, arn: &str) -> ProvisionResult<CertificateStatus>;

    /// Get the name of this engine
    fn name(&self) -> &str;
}

/// Account and region of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountContext {
    pub account_id: String,
    pub region: String,
}

/// Issuance status reported by the certificate authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Waiting for validation records to be observed
    Pending,
    /// All validation records confirmed
    Issued,
    /// The authority gave up on this request
    Failed(String),
}

/// A declaration whose deferred properties have all been resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub name: String,
    pub kind: ResourceKind,
    pub properties: Map<String, Value>,
}

impl ResolvedResource {
    /// Read a string property
    pub fn str_property(&self, key: &str) -> ProvisionResult<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProvisionError::provider(&self.name, format!("missing string property '{}'", key))
            })
    }

    /// Read a boolean property, `false` when absent
    pub fn flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Outputs reported by the engine for one created resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceOutputs(BTreeMap<String, Value>);

impl ResourceOutputs {
    pub const ID: &'static str = "id";
    pub const ARN: &'static str = "arn";

    /// Outputs carrying only an identifier
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut outputs = Self::default();
        outputs.0.insert(Self::ID.to_string(), Value::String(id.into()));
        outputs
    }

    /// Add an output
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str(Self::ID)
    }

    pub fn arn(&self) -> Option<&str> {
        self.get_str(Self::ARN)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outputs_accessors() {
        let outputs = ResourceOutputs::with_id("vpc-1").with("cidrBlock", "10.0.0.0/16");
        assert_eq!(outputs.id(), Some("vpc-1"));
        assert_eq!(outputs.arn(), None);
        assert_eq!(outputs.get_str("cidrBlock"), Some("10.0.0.0/16"));
    }

    #[test]
    fn test_certificate_status_serde() {
        let json = serde_json::to_value(CertificateStatus::Failed("expired".into())).unwrap();
        assert_eq!(json, json!({"status": "failed", "reason": "expired"}));
    }

    #[test]
    fn test_resolved_resource_properties() {
        let mut properties = Map::new();
        properties.insert("cidrBlock".into(), json!("10.0.0.0/16"));
        properties.insert("enableDnsSupport".into(), json!(true));
        let resource = ResolvedResource {
            name: "shop-prod-vpc".into(),
            kind: ResourceKind::Vpc,
            properties,
        };

        assert_eq!(resource.str_property("cidrBlock").unwrap(), "10.0.0.0/16");
        assert!(resource.flag("enableDnsSupport"));
        assert!(!resource.flag("missing"));
        assert!(matches!(
            resource.str_property("missing"),
            Err(ProvisionError::Provider { ref resource, .. }) if resource == "shop-prod-vpc"
        ));
    }
}
