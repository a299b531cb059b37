// Copyright (c) 2025 - Cowboy AI, Inc.
//! Container cluster and task identities
//!
//! Two roles are assumed by running tasks:
//!
//! - the execution role pulls images and writes logs through the managed
//!   execution policy
//! - the task role is what service code runs as; it can read exactly one
//!   family of secrets, `{project}-{secretEnvironment}-{service}-config*`

use serde_json::{json, Value};
use tracing::info;

use super::secrets::secret_name;
use crate::deferred::Deferred;
use crate::domain::ResourceKind;
use crate::engine::AccountContext;
use crate::errors::ProvisionResult;
use crate::stack::{Properties, ResourceRef, Stack};

pub const TASK_SERVICE_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";
pub const EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";

/// Trust policy letting `service` assume a role
pub fn assume_role_policy(service: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service },
            "Action": "sts:AssumeRole",
        }],
    })
}

/// ARN pattern of every version of one service secret
pub fn secret_arn_pattern(account: &AccountContext, project: &str, environment: &str, service: &str) -> String {
    format!(
        "arn:aws:secretsmanager:{}:{}:secret:{}*",
        account.region,
        account.account_id,
        secret_name(project, environment, service)
    )
}

/// Read-only access to the secrets matching `pattern`
pub fn secret_read_policy(pattern: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": ["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"],
            "Resource": [pattern],
        }],
    })
}

#[derive(Debug, Clone)]
pub struct ContainerPlatform {
    pub cluster: ResourceRef,
    pub execution_role: ResourceRef,
    pub execution_policy: ResourceRef,
    pub task_role: ResourceRef,
    pub task_secrets_policy: ResourceRef,
}

impl ContainerPlatform {
    pub fn cluster_arn(&self) -> Deferred<String> {
        self.cluster.arn()
    }

    pub fn execution_role_arn(&self) -> Deferred<String> {
        self.execution_role.arn()
    }

    pub fn task_role_arn(&self) -> Deferred<String> {
        self.task_role.arn()
    }
}

/// Declare the cluster and both task roles
pub fn declare_container_platform(
    stack: &mut Stack,
    account: &AccountContext,
    secret_environment: &str,
    service: &str,
) -> ProvisionResult<ContainerPlatform> {
    let scope = stack.scope().clone();

    let cluster_name = scope.name("cluster");
    let cluster = stack.declare(
        ResourceKind::ContainerCluster,
        &cluster_name,
        Properties::new()
            .set("name", cluster_name.as_str())
            .set("settings", json!([{ "name": "containerInsights", "value": "enabled" }]))
            .tags(scope.tags(&cluster_name)),
    )?;

    let execution_name = scope.name("ecs-execution-role");
    let execution_role = stack.declare(
        ResourceKind::IamRole,
        &execution_name,
        Properties::new()
            .set("name", execution_name.as_str())
            .set("assumeRolePolicy", assume_role_policy(TASK_SERVICE_PRINCIPAL))
            .tags(scope.tags(&execution_name)),
    )?;
    let execution_policy = stack.declare(
        ResourceKind::IamRolePolicyAttachment,
        format!("{}-attach", execution_name),
        Properties::new()
            .set_deferred("role", execution_role.id())
            .set("policyArn", EXECUTION_POLICY_ARN),
    )?;

    let task_name = scope.name("ecs-task-role");
    let task_role = stack.declare(
        ResourceKind::IamRole,
        &task_name,
        Properties::new()
            .set("name", task_name.as_str())
            .set("assumeRolePolicy", assume_role_policy(TASK_SERVICE_PRINCIPAL))
            .tags(scope.tags(&task_name)),
    )?;

    let pattern = secret_arn_pattern(account, scope.project(), secret_environment, service);
    let task_secrets_policy = stack.declare(
        ResourceKind::IamRolePolicy,
        format!("{}-secrets-read", task_name),
        Properties::new()
            .set_deferred("role", task_role.id())
            .set("policy", secret_read_policy(&pattern)),
    )?;

    info!(
        cluster = %cluster_name,
        secret_environment,
        secrets = %pattern,
        "Declared container platform"
    );

    Ok(ContainerPlatform {
        cluster,
        execution_role,
        execution_policy,
        task_role,
        task_secrets_policy,
    })
}
