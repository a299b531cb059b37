// Copyright (c) 2025 - Cowboy AI, Inc.
//! Operator access to the data tier
//!
//! A private instance reachable only through the session manager. It has no
//! inbound rules at all; its group may talk to the session endpoints on 443
//! and to the data tier on the database port, and the data tier admits it
//! with one extra rule alongside the backend rule.

use serde_json::json;
use tracing::info;

use super::cluster::assume_role_policy;
use crate::config::OperatorAccessConfig;
use crate::deferred::Deferred;
use crate::domain::{ResourceKind, ANY_IPV4};
use crate::errors::ProvisionResult;
use crate::security::{SecurityGroups, HTTPS_PORT};
use crate::stack::{Properties, ResourceRef, Stack};

pub const INSTANCE_SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";
pub const SESSION_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore";
pub const DATA_TIER_RULE: &str = "db-allow-ssm-access";

#[derive(Debug, Clone)]
pub struct OperatorAccess {
    pub role: ResourceRef,
    pub policy: ResourceRef,
    pub profile: ResourceRef,
    pub security_group: ResourceRef,
    pub instance: ResourceRef,
    pub data_tier_rule: ResourceRef,
}

impl OperatorAccess {
    pub fn instance_id(&self) -> Deferred<String> {
        self.instance.id()
    }

    pub fn security_group_id(&self) -> Deferred<String> {
        self.security_group.id()
    }
}

/// Declare the operator instance and grant it the database port
pub fn declare_operator_access(
    stack: &mut Stack,
    config: &OperatorAccessConfig,
    vpc: &ResourceRef,
    private_subnet: &ResourceRef,
    groups: &SecurityGroups,
    database_port: u16,
) -> ProvisionResult<OperatorAccess> {
    let scope = stack.scope().clone();
    let prefix = scope.name("db-ssm");

    let role_name = format!("{}-role", prefix);
    let role = stack.declare(
        ResourceKind::IamRole,
        &role_name,
        Properties::new()
            .set("name", role_name.as_str())
            .set("assumeRolePolicy", assume_role_policy(INSTANCE_SERVICE_PRINCIPAL))
            .tags(scope.tags(&role_name)),
    )?;

    let policy = stack.declare(
        ResourceKind::IamRolePolicyAttachment,
        format!("{}-ssm-attach", prefix),
        Properties::new()
            .set_deferred("role", role.id())
            .set("policyArn", SESSION_POLICY_ARN),
    )?;

    let profile_name = format!("{}-profile", prefix);
    let profile = stack.declare(
        ResourceKind::IamInstanceProfile,
        &profile_name,
        Properties::new()
            .set("name", profile_name.as_str())
            .set_deferred("role", role.id()),
    )?;

    let egress = groups.data_tier.id().map(move |data_tier| {
        json!([
            {
                "protocol": "tcp",
                "fromPort": HTTPS_PORT,
                "toPort": HTTPS_PORT,
                "cidrBlocks": [ANY_IPV4],
                "description": "Session manager endpoints",
            },
            {
                "protocol": "tcp",
                "fromPort": database_port,
                "toPort": database_port,
                "securityGroups": [data_tier],
                "description": "Postgres",
            },
        ])
    });

    let group_name = format!("{}-sg", prefix);
    let security_group = stack.declare(
        ResourceKind::SecurityGroup,
        &group_name,
        Properties::new()
            .set_deferred("vpcId", vpc.id())
            .set("description", "SSM-only DB access instance (no inbound)")
            .set("ingress", json!([]))
            .set_deferred("egress", egress)
            .tags(scope.tags(&group_name)),
    )?;

    let mut tags = scope.tags(&prefix);
    tags["Role"] = json!("db-ssm-access");

    let instance = stack.declare(
        ResourceKind::Instance,
        &prefix,
        Properties::new()
            .set(
                "amiLookup",
                json!({
                    "mostRecent": true,
                    "owners": ["amazon"],
                    "filters": [
                        { "name": "name", "values": ["al2023-ami-*-x86_64"] },
                        { "name": "state", "values": ["available"] },
                    ],
                }),
            )
            .set("instanceType", config.instance_type.as_str())
            .set_deferred("subnetId", private_subnet.id())
            .set_deferred("iamInstanceProfile", profile.id())
            .set_deferred("vpcSecurityGroupIds", security_group.id().map(|id| vec![id]))
            .set("associatePublicIpAddress", false)
            .depends_on(&policy)
            .tags(tags),
    )?;

    let data_tier_rule = groups.allow_data_tier_access(
        stack,
        DATA_TIER_RULE,
        &security_group,
        database_port,
        "Allow Postgres from SSM db-access instance",
    )?;

    info!(instance = %prefix, instance_type = %config.instance_type, "Declared operator access");

    Ok(OperatorAccess {
        role,
        policy,
        profile,
        security_group,
        instance,
        data_tier_rule,
    })
}
