// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for provisioning operations

use thiserror::Error;

/// Errors that can abort a provisioning run
///
/// Nothing in this crate catches one of these and carries on: every error
/// propagates to the top-level run, which reports it and exits non-zero.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// Missing or invalid input parameter
    #[error("Configuration error in '{parameter}': {reason}")]
    Config { parameter: String, reason: String },

    /// Insufficient placement zones or address space
    #[error("Topology error: {0}")]
    Topology(String),

    /// The issuing authority returned no validation record for a requested domain
    #[error("No validation record returned for domain '{domain}'")]
    ValidationRecord { domain: String },

    /// Opaque failure surfaced by the provisioning engine
    #[error("Provider error for resource '{resource}': {message}")]
    Provider { resource: String, message: String },

    /// Missing, wrong-shaped or empty stack contract value
    #[error("Contract error for key '{key}': {reason}")]
    Contract { key: String, reason: String },
}

/// Result type for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;

impl ProvisionError {
    /// Create a configuration error naming the offending parameter
    pub fn config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a topology error
    pub fn topology(msg: impl Into<String>) -> Self {
        Self::Topology(msg.into())
    }

    /// Create a validation record error for an unmatched domain
    pub fn validation_record(domain: impl Into<String>) -> Self {
        Self::ValidationRecord {
            domain: domain.into(),
        }
    }

    /// Wrap an engine failure with the name of the resource it concerns
    pub fn provider(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a contract error naming the offending key
    pub fn contract(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Contract {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Map a YAML decoding failure onto the configuration family
    pub fn from_yaml(source: &str, err: serde_yaml::Error) -> Self {
        Self::config(source, err.to_string())
    }

    /// Map a JSON decoding failure onto the configuration family
    pub fn from_json(source: &str, err: serde_json::Error) -> Self {
        Self::config(source, err.to_string())
    }
}
