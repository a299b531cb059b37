// Copyright (c) 2025 - Cowboy AI, Inc.

//! Security Policy Planner
//!
//! Builds the reachability graph between the four network policies of the
//! edge stack. Every edge in the graph is an ingress rule whose source is
//! either the open IPv4 range or another policy's identity:
//!
//! ```text
//! 0.0.0.0/0 ──80,443──> edge ──frontend port──> frontend-service
//!                         └───backend port────> backend-service ──db port──> data-tier
//! ```
//!
//! # Invariants
//!
//! - Only the edge policy is open to the public range
//! - Service policies admit only the edge policy
//! - The data tier admits only the backend-service policy
//! - All policies have unrestricted egress
//!
//! Planning is pure; `declare` turns a validated plan into security groups.
//! Extra data-tier access for an operator identity is a separate rule and
//! never widens the backend-service rule.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::deferred::{all, Deferred};
use crate::domain::{ResourceKind, ANY_IPV4};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::stack::{Properties, ResourceRef, Stack};

/// Plaintext web port on the edge
pub const HTTP_PORT: u16 = 80;
/// TLS web port on the edge
pub const HTTPS_PORT: u16 = 443;

/// Container and data-tier ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePorts {
    pub frontend: u16,
    pub backend: u16,
    pub database: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            frontend: 80,
            backend: 3000,
            database: 5432,
        }
    }
}

/// Role of a policy in the reachability graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRole {
    Edge,
    FrontendService,
    BackendService,
    DataTier,
}

impl PolicyRole {
    /// Declaration order; every source precedes the policies it feeds
    pub const ALL: [PolicyRole; 4] = [
        PolicyRole::Edge,
        PolicyRole::FrontendService,
        PolicyRole::BackendService,
        PolicyRole::DataTier,
    ];

    /// Resource-name slug
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Edge => "alb-sg",
            Self::FrontendService => "frontend-sg",
            Self::BackendService => "backend-sg",
            Self::DataTier => "db-sg",
        }
    }

    /// The only source this role may admit
    fn permitted_source(&self) -> RuleSource {
        match self {
            Self::Edge => RuleSource::AnyIpv4,
            Self::FrontendService | Self::BackendService => RuleSource::Policy(Self::Edge),
            Self::DataTier => RuleSource::Policy(Self::BackendService),
        }
    }
}

impl fmt::Display for PolicyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Where an ingress rule admits traffic from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// The open IPv4 range; edge only
    AnyIpv4,
    /// Another policy's identity
    Policy(PolicyRole),
}

/// One ingress rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    pub source: RuleSource,
    pub description: String,
}

impl IngressRule {
    pub fn tcp(port: u16, source: RuleSource, description: impl Into<String>) -> Self {
        Self {
            protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            source,
            description: description.into(),
        }
    }
}

/// Named ingress rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub role: PolicyRole,
    pub description: String,
    pub ingress: Vec<IngressRule>,
}

/// Validated set of the four policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityPlan {
    policies: Vec<SecurityPolicy>,
}

impl SecurityPlan {
    /// Plan the four policies for `ports`
    pub fn plan(ports: &ServicePorts) -> ProvisionResult<Self> {
        let edge = RuleSource::Policy(PolicyRole::Edge);
        let plan = Self {
            policies: vec![
                SecurityPolicy {
                    role: PolicyRole::Edge,
                    description: "ALB security group".to_string(),
                    ingress: vec![
                        IngressRule::tcp(HTTP_PORT, RuleSource::AnyIpv4, "HTTP from anywhere"),
                        IngressRule::tcp(HTTPS_PORT, RuleSource::AnyIpv4, "HTTPS from anywhere"),
                    ],
                },
                SecurityPolicy {
                    role: PolicyRole::FrontendService,
                    description: "Frontend service security group".to_string(),
                    ingress: vec![IngressRule::tcp(ports.frontend, edge, "Frontend from ALB")],
                },
                SecurityPolicy {
                    role: PolicyRole::BackendService,
                    description: "Backend service security group".to_string(),
                    ingress: vec![IngressRule::tcp(ports.backend, edge, "Backend from ALB")],
                },
                SecurityPolicy {
                    role: PolicyRole::DataTier,
                    description: "Database security group".to_string(),
                    ingress: vec![IngressRule::tcp(
                        ports.database,
                        RuleSource::Policy(PolicyRole::BackendService),
                        "Postgres from backend",
                    )],
                },
            ],
        };

        plan.validate()?;
        Ok(plan)
    }

    /// Check the reachability invariants
    pub fn validate(&self) -> ProvisionResult<()> {
        for policy in &self.policies {
            let permitted = policy.role.permitted_source();
            for rule in &policy.ingress {
                if rule.source != permitted {
                    return Err(ProvisionError::config(
                        format!("securityGroups.{}", policy.role),
                        format!(
                            "ingress on port {} admits {:?}; only {:?} is permitted",
                            rule.from_port, rule.source, permitted
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn policies(&self) -> &[SecurityPolicy] {
        &self.policies
    }

    pub fn policy(&self, role: PolicyRole) -> Option<&SecurityPolicy> {
        self.policies.iter().find(|p| p.role == role)
    }

    /// Declare one security group per policy into `stack`
    pub fn declare(&self, stack: &mut Stack, vpc: &ResourceRef) -> ProvisionResult<SecurityGroups> {
        let scope = stack.scope().clone();
        let mut declared: BTreeMap<PolicyRole, ResourceRef> = BTreeMap::new();

        for role in PolicyRole::ALL {
            let policy = self.policy(role).ok_or_else(|| {
                ProvisionError::config(format!("securityGroups.{}", role), "policy missing from plan")
            })?;

            let rules = policy
                .ingress
                .iter()
                .map(|rule| ingress_value(rule, &declared))
                .collect::<ProvisionResult<Vec<_>>>()?;

            let name = scope.name(role.slug());
            let group = stack.declare(
                ResourceKind::SecurityGroup,
                &name,
                Properties::new()
                    .set_deferred("vpcId", vpc.id())
                    .set("description", policy.description.as_str())
                    .set_deferred("ingress", all(rules).map(Value::Array))
                    .set("egress", json!([open_egress()]))
                    .tags(scope.tags(&name)),
            )?;

            debug!(policy = %role, rules = policy.ingress.len(), "Declared security policy");
            declared.insert(role, group);
        }

        let take = |role: PolicyRole, declared: &mut BTreeMap<PolicyRole, ResourceRef>| {
            declared.remove(&role).ok_or_else(|| {
                ProvisionError::config(format!("securityGroups.{}", role), "policy was not declared")
            })
        };

        let groups = SecurityGroups {
            edge: take(PolicyRole::Edge, &mut declared)?,
            frontend: take(PolicyRole::FrontendService, &mut declared)?,
            backend: take(PolicyRole::BackendService, &mut declared)?,
            data_tier: take(PolicyRole::DataTier, &mut declared)?,
        };

        info!(vpc = %vpc.name(), "Declared security policies");
        Ok(groups)
    }
}

/// Unrestricted egress rule
fn open_egress() -> Value {
    json!({
        "protocol": "-1",
        "fromPort": 0,
        "toPort": 0,
        "cidrBlocks": [ANY_IPV4],
    })
}

fn ingress_value(
    rule: &IngressRule,
    declared: &BTreeMap<PolicyRole, ResourceRef>,
) -> ProvisionResult<Deferred<Value>> {
    let base = json!({
        "protocol": rule.protocol,
        "fromPort": rule.from_port,
        "toPort": rule.to_port,
        "description": rule.description,
    });

    match rule.source {
        RuleSource::AnyIpv4 => {
            let mut value = base;
            value["cidrBlocks"] = json!([ANY_IPV4]);
            Ok(Deferred::known(value))
        }
        RuleSource::Policy(source) => {
            let group = declared.get(&source).ok_or_else(|| {
                ProvisionError::config(
                    format!("securityGroups.{}", source),
                    "referenced before it is declared",
                )
            })?;
            Ok(group.id().map(move |id| {
                let mut value = base.clone();
                value["securityGroups"] = json!([id]);
                value
            }))
        }
    }
}

/// Declared security groups
#[derive(Debug, Clone)]
pub struct SecurityGroups {
    pub edge: ResourceRef,
    pub frontend: ResourceRef,
    pub backend: ResourceRef,
    pub data_tier: ResourceRef,
}

impl SecurityGroups {
    /// Admit `source` to the data tier on `port` with a separate rule
    pub fn allow_data_tier_access(
        &self,
        stack: &mut Stack,
        kind: &str,
        source: &ResourceRef,
        port: u16,
        description: &str,
    ) -> ProvisionResult<ResourceRef> {
        let name = stack.scope().name(kind);
        info!(rule = %name, source = %source.name(), port, "Granting data-tier access");

        stack.declare(
            ResourceKind::SecurityGroupRule,
            name,
            Properties::new()
                .set("type", "ingress")
                .set_deferred("securityGroupId", self.data_tier.id())
                .set_deferred("sourceSecurityGroupId", source.id())
                .set("protocol", "tcp")
                .set("fromPort", port)
                .set("toPort", port)
                .set("description", description),
        )
    }
}
