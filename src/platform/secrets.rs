// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service secret containers
//!
//! Only the containers are declared. Values are written out of band by the
//! service owners, so nothing secret ever passes through a plan.

use serde_json::json;
use tracing::info;

use crate::deferred::Deferred;
use crate::domain::ResourceKind;
use crate::errors::ProvisionResult;
use crate::naming::resource_name;
use crate::stack::{Properties, ResourceRef, Stack};

/// Service whose configuration secret the stack owns
pub const SERVICE: &str = "core";

/// Environment name of developer workstations
pub const LOCAL_ENVIRONMENT: &str = "local";

/// `{project}-{environment}-{service}-config`
pub fn secret_name(project: &str, environment: &str, service: &str) -> String {
    resource_name(project, environment, &format!("{}-config", service), None)
}

/// Declared secret container
#[derive(Debug, Clone)]
pub struct SecretContainer {
    pub environment: String,
    pub resource: ResourceRef,
}

impl SecretContainer {
    pub fn name(&self) -> Deferred<String> {
        self.resource.output_str("name")
    }

    pub fn arn(&self) -> Deferred<String> {
        self.resource.arn()
    }
}

/// Declare the configuration secret of `service` for `environment`
pub fn declare_secret(
    stack: &mut Stack,
    environment: &str,
    service: &str,
) -> ProvisionResult<SecretContainer> {
    let name = secret_name(stack.scope().project(), environment, service);

    let resource = stack.declare(
        ResourceKind::Secret,
        &name,
        Properties::new()
            .set("name", name.as_str())
            .set("description", format!("Configuration for {} in {}", service, environment))
            .tags(json!({
                "Name": name,
                "Environment": environment,
                "Service": service,
            })),
    )?;

    info!(secret = %name, environment, service, "Declared secret container");
    Ok(SecretContainer {
        environment: environment.to_string(),
        resource,
    })
}
