// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Contract
//!
//! The wire interface between the infrastructure pass and the independent
//! service deployment pass: a flat catalogue of named identifiers.
//!
//! ```text
//! infrastructure pass ──ContractExporter──> StackContract (JSON)
//!                                               │
//! deployment pass <──ContractImporter───────────┘
//! ```

pub mod exporter;
pub mod importer;
pub mod keys;

pub use exporter::{ContractExporter, ContractValue, StackContract};
pub use importer::{BaseStackOutputs, ContractImporter, DeploymentInputs};
pub use keys::ValueShape;
