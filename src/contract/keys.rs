// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack contract keys

use serde::Serialize;

pub const VPC_ID: &str = "vpcId";
pub const PUBLIC_SUBNET_IDS: &str = "publicSubnetIds";
pub const PRIVATE_SUBNET_IDS: &str = "privateSubnetIds";

pub const HOSTED_ZONE_ID: &str = "hostedZoneId";
pub const CERT_ARN: &str = "certArn";
pub const FRONTEND_DOMAIN: &str = "frontendDomain";
pub const BACKEND_DOMAIN: &str = "backendDomain";

pub const ALB_ARN: &str = "albArn";
pub const ALB_DNS_NAME: &str = "albDnsName";
pub const ALB_ZONE_ID: &str = "albZoneId";
pub const HTTPS_LISTENER_ARN: &str = "httpsListenerArn";
pub const FRONTEND_TARGET_GROUP_ARN: &str = "frontendTargetGroupArn";
pub const BACKEND_TARGET_GROUP_ARN: &str = "backendTargetGroupArn";
pub const FRONTEND_LISTENER_RULE_ARN: &str = "frontendListenerRuleArn";
pub const BACKEND_LISTENER_RULE_ARN: &str = "backendListenerRuleArn";

pub const ECS_CLUSTER_ARN: &str = "ecsClusterArn";
pub const ECS_EXECUTION_ROLE_ARN: &str = "ecsExecutionRoleArn";
pub const ECS_TASK_ROLE_ARN: &str = "ecsTaskRoleArn";

pub const ALB_SG_ID: &str = "albSgId";
pub const FRONTEND_SG_ID: &str = "frontendSgId";
pub const BACKEND_SG_ID: &str = "backendSgId";

pub const DB_ENDPOINT: &str = "dbEndpoint";
pub const DB_PORT: &str = "dbPort";
pub const DB_MASTER_USER_SECRET_ARN: &str = "dbMasterUserSecretArn";

pub const AWS_SECRETS_SECRET_NAME: &str = "awsSecretsSecretName";
pub const AWS_SECRETS_SECRET_ARN: &str = "awsSecretsSecretArn";
pub const LOCAL_AWS_SECRETS_SECRET_NAME: &str = "localAwsSecretsSecretName";
pub const LOCAL_AWS_SECRETS_SECRET_ARN: &str = "localAwsSecretsSecretArn";

pub const ECR_REPO_URL: &str = "ecrRepoUrl";

pub const SSM_DB_ACCESS_INSTANCE_ID: &str = "ssmDbAccessInstanceId";
pub const SSM_DB_ACCESS_SG_ID: &str = "ssmDbAccessSgId";

/// Wire shape of a contract value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueShape {
    String,
    StringArray,
    Integer,
}

/// Every key a complete base stack publishes, with its shape
pub const REQUIRED: &[(&str, ValueShape)] = &[
    (VPC_ID, ValueShape::String),
    (PUBLIC_SUBNET_IDS, ValueShape::StringArray),
    (PRIVATE_SUBNET_IDS, ValueShape::StringArray),
    (HOSTED_ZONE_ID, ValueShape::String),
    (CERT_ARN, ValueShape::String),
    (FRONTEND_DOMAIN, ValueShape::String),
    (BACKEND_DOMAIN, ValueShape::String),
    (ALB_ARN, ValueShape::String),
    (ALB_DNS_NAME, ValueShape::String),
    (ALB_ZONE_ID, ValueShape::String),
    (HTTPS_LISTENER_ARN, ValueShape::String),
    (FRONTEND_TARGET_GROUP_ARN, ValueShape::String),
    (BACKEND_TARGET_GROUP_ARN, ValueShape::String),
    (FRONTEND_LISTENER_RULE_ARN, ValueShape::String),
    (BACKEND_LISTENER_RULE_ARN, ValueShape::String),
    (ECS_CLUSTER_ARN, ValueShape::String),
    (ECS_EXECUTION_ROLE_ARN, ValueShape::String),
    (ECS_TASK_ROLE_ARN, ValueShape::String),
    (ALB_SG_ID, ValueShape::String),
    (FRONTEND_SG_ID, ValueShape::String),
    (BACKEND_SG_ID, ValueShape::String),
    (DB_ENDPOINT, ValueShape::String),
    (DB_PORT, ValueShape::Integer),
    (DB_MASTER_USER_SECRET_ARN, ValueShape::String),
    (AWS_SECRETS_SECRET_NAME, ValueShape::String),
    (AWS_SECRETS_SECRET_ARN, ValueShape::String),
    (ECR_REPO_URL, ValueShape::String),
    (SSM_DB_ACCESS_INSTANCE_ID, ValueShape::String),
    (SSM_DB_ACCESS_SG_ID, ValueShape::String),
];

/// Published when present, never required
pub const OPTIONAL: &[(&str, ValueShape)] = &[
    (LOCAL_AWS_SECRETS_SECRET_NAME, ValueShape::String),
    (LOCAL_AWS_SECRETS_SECRET_ARN, ValueShape::String),
];

/// Shape of a known key
pub fn shape_of(key: &str) -> Option<ValueShape> {
    REQUIRED
        .iter()
        .chain(OPTIONAL.iter())
        .find(|(k, _)| *k == key)
        .map(|(_, shape)| *shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: BTreeSet<&str> = REQUIRED.iter().chain(OPTIONAL.iter()).map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), REQUIRED.len() + OPTIONAL.len());
        assert_eq!(REQUIRED.len(), 29);
    }

    #[test]
    fn test_shapes() {
        assert_eq!(shape_of(DB_PORT), Some(ValueShape::Integer));
        assert_eq!(shape_of(PRIVATE_SUBNET_IDS), Some(ValueShape::StringArray));
        assert_eq!(shape_of(LOCAL_AWS_SECRETS_SECRET_ARN), Some(ValueShape::String));
        assert_eq!(shape_of("unknown"), None);
    }
}
