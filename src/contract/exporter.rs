// Copyright (c) 2025 - Cowboy AI, Inc.
//! Contract exporter

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::keys::{self, ValueShape};
use crate::deferred::Deferred;
use crate::errors::{ProvisionError, ProvisionResult};
use crate::stack::COMPUTED;

/// One published value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractValue {
    Integer(i64),
    String(String),
    StringArray(Vec<String>),
}

impl ContractValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Integer(_) => ValueShape::Integer,
            Self::String(_) => ValueShape::String,
            Self::StringArray(_) => ValueShape::StringArray,
        }
    }

    fn check(&self, key: &str) -> ProvisionResult<()> {
        match self {
            Self::String(s) if s.is_empty() => Err(ProvisionError::contract(key, "value is empty")),
            Self::StringArray(items) if items.is_empty() => {
                Err(ProvisionError::contract(key, "array is empty"))
            }
            Self::StringArray(items) if items.iter().any(String::is_empty) => {
                Err(ProvisionError::contract(key, "array contains an empty element"))
            }
            _ => Ok(()),
        }
    }
}

/// Published key → value catalogue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackContract(BTreeMap<String, ContractValue>);

impl StackContract {
    pub fn get(&self, key: &str) -> Option<&ContractValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Wire form read by the deployment pass
    pub fn to_json(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(key, value)| {
                let json = match value {
                    ContractValue::Integer(i) => Value::from(*i),
                    ContractValue::String(s) => Value::from(s.as_str()),
                    ContractValue::StringArray(items) => Value::from(items.clone()),
                };
                (key.clone(), json)
            })
            .collect()
    }

    pub fn to_json_pretty(&self) -> ProvisionResult<String> {
        serde_json::to_string_pretty(&self.0)
            .map_err(|e| ProvisionError::contract("<contract>", e.to_string()))
    }
}

/// Collects deferred identifiers under stable keys
///
/// Nothing resolves until [`ContractExporter::resolve`], which runs after the
/// stack has been applied.
#[derive(Debug, Clone, Default)]
pub struct ContractExporter {
    entries: BTreeMap<String, Deferred<ContractValue>>,
}

impl ContractExporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: &str, expected: ValueShape, value: Deferred<ContractValue>) -> ProvisionResult<()> {
        if let Some(shape) = keys::shape_of(key) {
            if shape != expected {
                return Err(ProvisionError::contract(
                    key,
                    format!("published as {:?}, expected {:?}", expected, shape),
                ));
            }
        }
        if self.entries.insert(key.to_string(), value).is_some() {
            return Err(ProvisionError::contract(key, "exported more than once"));
        }
        debug!(key, "Exported contract value");
        Ok(())
    }

    pub fn string(&mut self, key: &str, value: Deferred<String>) -> ProvisionResult<()> {
        self.insert(key, ValueShape::String, value.map(ContractValue::String))
    }

    pub fn string_array(&mut self, key: &str, value: Deferred<Vec<String>>) -> ProvisionResult<()> {
        self.insert(key, ValueShape::StringArray, value.map(ContractValue::StringArray))
    }

    pub fn integer(&mut self, key: &str, value: Deferred<i64>) -> ProvisionResult<()> {
        self.insert(key, ValueShape::Integer, value.map(ContractValue::Integer))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that a complete base stack must publish but this one does not
    pub fn missing_required(&self) -> Vec<&'static str> {
        keys::REQUIRED
            .iter()
            .map(|(key, _)| *key)
            .filter(|key| !self.entries.contains_key(*key))
            .collect()
    }

    /// Values known now; the rest render as `<computed>`
    pub fn preview(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(key, value)| {
                let shown = match value.peek() {
                    Some(ContractValue::Integer(i)) => Value::from(i),
                    Some(ContractValue::String(s)) => Value::from(s),
                    Some(ContractValue::StringArray(items)) => Value::from(items),
                    None => Value::from(COMPUTED),
                };
                (key.clone(), shown)
            })
            .collect()
    }

    /// Resolve every value; the first failure names its key
    /// Fails naming the first required key nothing was exported under
    pub fn ensure_complete(&self) -> ProvisionResult<()> {
        match self.missing_required().first() {
            Some(key) => Err(ProvisionError::contract(*key, "key was never exported")),
            None => Ok(()),
        }
    }

    pub fn resolve(&self) -> ProvisionResult<StackContract> {
        self.ensure_complete()?;

        let mut values = BTreeMap::new();
        for (key, deferred) in &self.entries {
            let value = deferred
                .resolve()
                .map_err(|e| ProvisionError::contract(key, e.to_string()))?;
            value.check(key)?;
            values.insert(key.clone(), value);
        }

        info!(keys = values.len(), "Resolved stack contract");
        Ok(StackContract(values))
    }
}
