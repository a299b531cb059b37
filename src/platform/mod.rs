// Copyright (c) 2025 - Cowboy AI, Inc.
//! Peer builders
//!
//! Plain desired-state declarations for the resources whose identifiers the
//! stack contract re-publishes: data tier, secret containers, container
//! platform, image repository and operator access.

pub mod cluster;
pub mod database;
pub mod operator_access;
pub mod registry;
pub mod secrets;

pub use cluster::{declare_container_platform, ContainerPlatform};
pub use database::{declare_database, Database};
pub use operator_access::{declare_operator_access, OperatorAccess};
pub use registry::{declare_image_repository, ImageRepository};
pub use secrets::{declare_secret, secret_name, SecretContainer, LOCAL_ENVIRONMENT, SERVICE};
