// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network and edge-routing infrastructure for a two-tier application
//!
//! Turns a handful of stack parameters into a desired-state [`stack::Stack`]:
//! a multi-zone network topology, least-privilege security groups, a
//! DNS-validated TLS certificate and a shared edge router, plus the peer
//! resources whose identifiers the deployment pass consumes through the
//! [`contract`].
//!
//! Nothing here talks to a cloud directly. Declarations are handed to a
//! [`engine::ProvisioningEngine`]; [`engine::InMemoryEngine`] ships for dry
//! runs and tests.

pub mod certificate;
pub mod config;
pub mod contract;
pub mod deferred;
pub mod domain;
pub mod edge;
pub mod engine;
pub mod errors;
pub mod naming;
pub mod network;
pub mod platform;
pub mod provision;
pub mod security;
pub mod stack;
pub mod state_machine;

// Re-export commonly used types
pub use config::{DeploymentConfig, StackConfig};
pub use contract::{BaseStackOutputs, ContractExporter, ContractImporter, DeploymentInputs, StackContract};
pub use engine::{InMemoryEngine, ProvisioningEngine};
pub use errors::{ProvisionError, ProvisionResult};
pub use provision::{plan_base_stack, provision_base_stack, BaseStackPlan, ProvisionOutcome};
pub use stack::Stack;
