// Copyright (c) 2025 - Cowboy AI, Inc.
//! Handles to declared resources

use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use crate::deferred::Deferred;
use crate::domain::ResourceKind;
use crate::engine::ResourceOutputs;
use crate::errors::{ProvisionError, ProvisionResult};

/// Handle to a declared resource
///
/// Every output read through a `ResourceRef` is a `Deferred` that depends on
/// the resource and resolves once the engine has reported its outputs.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    name: String,
    kind: ResourceKind,
    outputs: Arc<OnceLock<ResourceOutputs>>,
}

impl ResourceRef {
    pub(crate) fn new(name: String, kind: ResourceKind, outputs: Arc<OnceLock<ResourceOutputs>>) -> Self {
        Self { name, kind, outputs }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Outputs, once the resource has been created
    pub fn outputs(&self) -> Option<&ResourceOutputs> {
        self.outputs.get()
    }

    /// Engine identifier
    pub fn id(&self) -> Deferred<String> {
        self.output_str(ResourceOutputs::ID)
    }

    /// ARN-style identifier
    pub fn arn(&self) -> Deferred<String> {
        self.output_str(ResourceOutputs::ARN)
    }

    /// Raw output value under `key`
    pub fn output_value(&self, key: &str) -> Deferred<Value> {
        let name = self.name.clone();
        let key = key.to_string();
        let outputs = Arc::clone(&self.outputs);

        Deferred::from_resolver(BTreeSet::from([self.name.clone()]), move || {
            let outputs = outputs.get().ok_or_else(|| {
                ProvisionError::provider(&name, format!("output '{}' read before creation", key))
            })?;
            outputs
                .get(&key)
                .cloned()
                .ok_or_else(|| ProvisionError::provider(&name, format!("engine reported no output '{}'", key)))
        })
    }

    /// String output under `key`; empty strings are rejected
    pub fn output_str(&self, key: &str) -> Deferred<String> {
        let name = self.name.clone();
        let key_name = key.to_string();

        self.output_value(key).and_then(move |value| match value {
            Value::String(s) if !s.is_empty() => Ok(s),
            _ => Err(ProvisionError::provider(
                &name,
                format!("output '{}' is not a non-empty string", key_name),
            )),
        })
    }

    /// Integer output under `key`
    pub fn output_i64(&self, key: &str) -> Deferred<i64> {
        let name = self.name.clone();
        let key_name = key.to_string();

        self.output_value(key).and_then(move |value| {
            value.as_i64().ok_or_else(|| {
                ProvisionError::provider(&name, format!("output '{}' is not an integer", key_name))
            })
        })
    }
}

/// Identifiers of several resources, in order
pub fn ids(resources: &[ResourceRef]) -> Deferred<Vec<String>> {
    crate::deferred::all(resources.iter().map(ResourceRef::id).collect())
}

/// Resolve every output of a created resource, failing if it was never created
pub(crate) fn require_outputs(resource: &ResourceRef) -> ProvisionResult<&ResourceOutputs> {
    resource
        .outputs()
        .ok_or_else(|| ProvisionError::provider(resource.name(), "resource was not created"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str) -> (ResourceRef, Arc<OnceLock<ResourceOutputs>>) {
        let cell = Arc::new(OnceLock::new());
        (
            ResourceRef::new(name.to_string(), ResourceKind::Subnet, Arc::clone(&cell)),
            cell,
        )
    }

    #[test]
    fn test_outputs_resolve_after_creation() {
        let (subnet, cell) = reference("shop-prod-public-1");
        let id = subnet.id();

        assert!(id.dependencies().contains("shop-prod-public-1"));
        assert!(matches!(id.resolve(), Err(ProvisionError::Provider { .. })));

        cell.set(ResourceOutputs::with_id("subnet-1")).unwrap();
        assert_eq!(id.resolve().unwrap(), "subnet-1");
    }

    #[test]
    fn test_missing_output_names_resource() {
        let (subnet, cell) = reference("shop-prod-public-1");
        cell.set(ResourceOutputs::with_id("subnet-1")).unwrap();

        match subnet.arn().resolve() {
            Err(ProvisionError::Provider { resource, message }) => {
                assert_eq!(resource, "shop-prod-public-1");
                assert!(message.contains("arn"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ids_in_order() {
        let (a, cell_a) = reference("a");
        let (b, cell_b) = reference("b");
        let joined = ids(&[a, b]);

        cell_b.set(ResourceOutputs::with_id("id-b")).unwrap();
        cell_a.set(ResourceOutputs::with_id("id-a")).unwrap();
        assert_eq!(joined.resolve().unwrap(), vec!["id-a", "id-b"]);
    }
}
