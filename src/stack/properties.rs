// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared resource properties

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::ResourceRef;
use crate::deferred::Deferred;
use crate::errors::ProvisionResult;

/// Placeholder rendered for values that are only known after creation
pub const COMPUTED: &str = "<computed>";

/// Property map of a declaration; values may be deferred
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: BTreeMap<String, Deferred<Value>>,
    depends_on: BTreeSet<String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value known at declaration time
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), Deferred::known(value.into()));
        self
    }

    /// Set a value produced by another resource
    pub fn set_deferred<T>(mut self, key: impl Into<String>, value: Deferred<T>) -> Self
    where
        T: Into<Value> + Clone + Send + Sync + 'static,
    {
        self.values.insert(key.into(), value.map(Into::into));
        self
    }

    /// Set the standard tag map
    pub fn tags(self, tags: Value) -> Self {
        self.set("tags", tags)
    }

    /// Order after `resource` without reading any of its outputs
    pub fn depends_on(mut self, resource: &ResourceRef) -> Self {
        self.depends_on.insert(resource.name().to_string());
        self
    }

    /// Every resource these properties wait on
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut dependencies = self.depends_on.clone();
        for value in self.values.values() {
            dependencies.extend(value.dependencies().iter().cloned());
        }
        dependencies
    }

    /// Resolve every value; fails with the first unresolved dependency
    pub fn resolve(&self) -> ProvisionResult<Map<String, Value>> {
        self.values
            .iter()
            .map(|(key, value)| value.resolve().map(|v| (key.clone(), v)))
            .collect()
    }

    /// Values known now, with everything else rendered as `<computed>`
    pub fn preview(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| {
                let shown = value
                    .peek()
                    .unwrap_or_else(|| Value::String(COMPUTED.to_string()));
                (key.clone(), shown)
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Deferred<Value>> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProvisionError;
    use serde_json::json;

    fn pending(name: &str) -> Deferred<String> {
        let resource = name.to_string();
        Deferred::from_resolver(BTreeSet::from([name.to_string()]), move || {
            Err(ProvisionError::provider(resource.clone(), "pending"))
        })
    }

    #[test]
    fn test_dependencies_collected_from_values() {
        let properties = Properties::new()
            .set("cidrBlock", "10.0.1.0/24")
            .set_deferred("vpcId", pending("shop-prod-vpc"));

        assert_eq!(
            properties.dependencies(),
            BTreeSet::from(["shop-prod-vpc".to_string()])
        );
    }

    #[test]
    fn test_preview_renders_computed() {
        let properties = Properties::new()
            .set("port", 443)
            .set_deferred("vpcId", pending("shop-prod-vpc"));

        let preview = properties.preview();
        assert_eq!(preview["port"], json!(443));
        assert_eq!(preview["vpcId"], json!(COMPUTED));
    }

    #[test]
    fn test_resolve_fails_while_pending() {
        let properties = Properties::new().set_deferred("vpcId", pending("shop-prod-vpc"));
        assert!(properties.resolve().is_err());

        let ready = Properties::new().set("a", true).set("b", "x");
        let resolved = ready.resolve().unwrap();
        assert_eq!(resolved.len(), 2);
    }
}
