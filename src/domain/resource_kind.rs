// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Kind Domain Model
//!
//! Defines the taxonomy of desired-state resources this crate declares to the
//! provisioning engine. The engine dispatches on the kind; the core never
//! creates anything itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Desired-state resource taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network topology
    /// Isolated network container
    Vpc,
    /// Externally-routable gateway
    InternetGateway,
    /// Subnet pinned to one placement zone
    Subnet,
    /// Static external address
    ElasticIp,
    /// Outbound-only egress point for private subnets
    NatGateway,
    /// Route table
    RouteTable,
    /// Single route inside a route table
    Route,
    /// Binding of a subnet to a route table
    RouteTableAssociation,

    // Security
    /// Named set of ingress/egress rules
    SecurityGroup,
    /// Standalone rule attached to an existing security group
    SecurityGroupRule,

    // Certificates and DNS
    /// Multi-domain TLS certificate request
    Certificate,
    /// Wait-for-issuance marker bound to validation records
    CertificateValidation,
    /// DNS record in a hosted zone
    DnsRecord,

    // Edge routing
    /// Shared application load balancer
    LoadBalancer,
    /// Health-checked pool of service targets
    TargetGroup,
    /// Port listener on the load balancer
    Listener,
    /// Host-based dispatch rule on a listener
    ListenerRule,

    // Peer resources feeding the stack contract
    /// Subnet group for the data tier
    DbSubnetGroup,
    /// Relational database instance
    DbInstance,
    /// Secret container (no value)
    Secret,
    /// Container cluster
    ContainerCluster,
    /// Identity role
    IamRole,
    /// Managed policy attached to a role
    IamRolePolicyAttachment,
    /// Inline role policy
    IamRolePolicy,
    /// Instance profile wrapping a role
    IamInstanceProfile,
    /// Container image repository
    ImageRepository,
    /// Compute instance
    Instance,
}

impl ResourceKind {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::InternetGateway => "internet_gateway",
            Self::Subnet => "subnet",
            Self::ElasticIp => "elastic_ip",
            Self::NatGateway => "nat_gateway",
            Self::RouteTable => "route_table",
            Self::Route => "route",
            Self::RouteTableAssociation => "route_table_association",
            Self::SecurityGroup => "security_group",
            Self::SecurityGroupRule => "security_group_rule",
            Self::Certificate => "certificate",
            Self::CertificateValidation => "certificate_validation",
            Self::DnsRecord => "dns_record",
            Self::LoadBalancer => "load_balancer",
            Self::TargetGroup => "target_group",
            Self::Listener => "listener",
            Self::ListenerRule => "listener_rule",
            Self::DbSubnetGroup => "db_subnet_group",
            Self::DbInstance => "db_instance",
            Self::Secret => "secret",
            Self::ContainerCluster => "container_cluster",
            Self::IamRole => "iam_role",
            Self::IamRolePolicyAttachment => "iam_role_policy_attachment",
            Self::IamRolePolicy => "iam_role_policy",
            Self::IamInstanceProfile => "iam_instance_profile",
            Self::ImageRepository => "image_repository",
            Self::Instance => "instance",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
