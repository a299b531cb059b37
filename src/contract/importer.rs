// Copyright (c) 2025 - Cowboy AI, Inc.
//! Contract importer
//!
//! The deployment pass reads the base stack's published values through
//! [`ContractImporter`], which type-checks every key it is asked for. A key
//! that is absent, null, of the wrong shape or empty fails with a
//! `Contract` error naming it.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use super::exporter::StackContract;
use super::keys::*;
use crate::config::DeploymentConfig;
use crate::errors::{ProvisionError, ProvisionResult};

/// Type-checked reader over a published contract
#[derive(Debug, Clone)]
pub struct ContractImporter {
    values: Map<String, Value>,
}

impl ContractImporter {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn from_contract(contract: &StackContract) -> Self {
        Self::new(contract.to_json())
    }

    /// Parse a contract file; anything but a JSON object is rejected
    pub fn from_json_str(json: &str, source: &str) -> ProvisionResult<Self> {
        match serde_json::from_str::<Value>(json).map_err(|e| ProvisionError::from_json(source, e))? {
            Value::Object(values) => Ok(Self::new(values)),
            _ => Err(ProvisionError::config(source, "contract must be a JSON object")),
        }
    }

    fn present(&self, key: &str) -> ProvisionResult<&Value> {
        match self.values.get(key) {
            None | Some(Value::Null) => Err(ProvisionError::contract(key, "missing required value")),
            Some(value) => Ok(value),
        }
    }

    pub fn require_string(&self, key: &str) -> ProvisionResult<String> {
        match self.present(key)? {
            Value::String(s) if !s.is_empty() => Ok(s.clone()),
            _ => Err(ProvisionError::contract(key, "not a non-empty string")),
        }
    }

    pub fn require_string_array(&self, key: &str) -> ProvisionResult<Vec<String>> {
        let items = self
            .present(key)?
            .as_array()
            .ok_or_else(|| ProvisionError::contract(key, "not an array"))?;
        if items.is_empty() {
            return Err(ProvisionError::contract(key, "array is empty"));
        }

        items
            .iter()
            .map(|item| match item {
                Value::String(s) if !s.is_empty() => Ok(s.clone()),
                _ => Err(ProvisionError::contract(key, "contains a non-string or empty element")),
            })
            .collect()
    }

    pub fn require_integer(&self, key: &str) -> ProvisionResult<i64> {
        self.present(key)?
            .as_i64()
            .ok_or_else(|| ProvisionError::contract(key, "not an integer"))
    }

    /// Integer in `1..=65535`
    pub fn require_port(&self, key: &str) -> ProvisionResult<u16> {
        let value = self.require_integer(key)?;
        u16::try_from(value)
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| ProvisionError::contract(key, format!("{} is not a valid port", value)))
    }

    /// Absent or null reads as `None`; a present value must still be valid
    pub fn optional_string(&self, key: &str) -> ProvisionResult<Option<String>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.require_string(key).map(Some),
        }
    }
}

/// Every value the base stack publishes, validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStackOutputs {
    pub vpc_id: String,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids: Vec<String>,
    pub hosted_zone_id: String,
    pub cert_arn: String,
    pub frontend_domain: String,
    pub backend_domain: String,
    pub alb_arn: String,
    pub alb_dns_name: String,
    pub alb_zone_id: String,
    pub https_listener_arn: String,
    pub frontend_target_group_arn: String,
    pub backend_target_group_arn: String,
    pub frontend_listener_rule_arn: String,
    pub backend_listener_rule_arn: String,
    pub ecs_cluster_arn: String,
    pub ecs_execution_role_arn: String,
    pub ecs_task_role_arn: String,
    pub alb_sg_id: String,
    pub frontend_sg_id: String,
    pub backend_sg_id: String,
    pub db_endpoint: String,
    pub db_port: u16,
    pub db_master_user_secret_arn: String,
    pub aws_secrets_secret_name: String,
    pub aws_secrets_secret_arn: String,
    pub local_aws_secrets_secret_name: Option<String>,
    pub local_aws_secrets_secret_arn: Option<String>,
    pub ecr_repo_url: String,
    pub ssm_db_access_instance_id: String,
    pub ssm_db_access_sg_id: String,
}

impl BaseStackOutputs {
    /// Read in publication order; the first bad key aborts
    pub fn import(contract: &ContractImporter) -> ProvisionResult<Self> {
        Ok(Self {
            vpc_id: contract.require_string(VPC_ID)?,
            public_subnet_ids: contract.require_string_array(PUBLIC_SUBNET_IDS)?,
            private_subnet_ids: contract.require_string_array(PRIVATE_SUBNET_IDS)?,
            hosted_zone_id: contract.require_string(HOSTED_ZONE_ID)?,
            cert_arn: contract.require_string(CERT_ARN)?,
            frontend_domain: contract.require_string(FRONTEND_DOMAIN)?,
            backend_domain: contract.require_string(BACKEND_DOMAIN)?,
            alb_arn: contract.require_string(ALB_ARN)?,
            alb_dns_name: contract.require_string(ALB_DNS_NAME)?,
            alb_zone_id: contract.require_string(ALB_ZONE_ID)?,
            https_listener_arn: contract.require_string(HTTPS_LISTENER_ARN)?,
            frontend_target_group_arn: contract.require_string(FRONTEND_TARGET_GROUP_ARN)?,
            backend_target_group_arn: contract.require_string(BACKEND_TARGET_GROUP_ARN)?,
            frontend_listener_rule_arn: contract.require_string(FRONTEND_LISTENER_RULE_ARN)?,
            backend_listener_rule_arn: contract.require_string(BACKEND_LISTENER_RULE_ARN)?,
            ecs_cluster_arn: contract.require_string(ECS_CLUSTER_ARN)?,
            ecs_execution_role_arn: contract.require_string(ECS_EXECUTION_ROLE_ARN)?,
            ecs_task_role_arn: contract.require_string(ECS_TASK_ROLE_ARN)?,
            alb_sg_id: contract.require_string(ALB_SG_ID)?,
            frontend_sg_id: contract.require_string(FRONTEND_SG_ID)?,
            backend_sg_id: contract.require_string(BACKEND_SG_ID)?,
            db_endpoint: contract.require_string(DB_ENDPOINT)?,
            db_port: contract.require_port(DB_PORT)?,
            db_master_user_secret_arn: contract.require_string(DB_MASTER_USER_SECRET_ARN)?,
            aws_secrets_secret_name: contract.require_string(AWS_SECRETS_SECRET_NAME)?,
            aws_secrets_secret_arn: contract.require_string(AWS_SECRETS_SECRET_ARN)?,
            local_aws_secrets_secret_name: contract.optional_string(LOCAL_AWS_SECRETS_SECRET_NAME)?,
            local_aws_secrets_secret_arn: contract.optional_string(LOCAL_AWS_SECRETS_SECRET_ARN)?,
            ecr_repo_url: contract.require_string(ECR_REPO_URL)?,
            ssm_db_access_instance_id: contract.require_string(SSM_DB_ACCESS_INSTANCE_ID)?,
            ssm_db_access_sg_id: contract.require_string(SSM_DB_ACCESS_SG_ID)?,
        })
    }
}

/// What the service deployment pass consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInputs {
    pub ecs_cluster_arn: String,
    pub execution_role_arn: String,
    pub task_role_arn: String,
    pub private_subnet_ids: Vec<String>,
    pub frontend_sg_id: String,
    pub backend_sg_id: String,
    pub frontend_target_group_arn: String,
    pub backend_target_group_arn: String,
    pub ecr_repo_url: String,
    pub frontend_image: String,
    pub backend_image: String,
}

impl DeploymentInputs {
    /// Read the service keys and derive `{ecrRepoUrl}:{tag}` image references
    pub fn import(contract: &ContractImporter, config: &DeploymentConfig) -> ProvisionResult<Self> {
        config.validate()?;

        let ecr_repo_url = contract.require_string(ECR_REPO_URL)?;
        let inputs = Self {
            ecs_cluster_arn: contract.require_string(ECS_CLUSTER_ARN)?,
            execution_role_arn: contract.require_string(ECS_EXECUTION_ROLE_ARN)?,
            task_role_arn: contract.require_string(ECS_TASK_ROLE_ARN)?,
            private_subnet_ids: contract.require_string_array(PRIVATE_SUBNET_IDS)?,
            frontend_sg_id: contract.require_string(FRONTEND_SG_ID)?,
            backend_sg_id: contract.require_string(BACKEND_SG_ID)?,
            frontend_target_group_arn: contract.require_string(FRONTEND_TARGET_GROUP_ARN)?,
            backend_target_group_arn: contract.require_string(BACKEND_TARGET_GROUP_ARN)?,
            frontend_image: format!("{}:{}", ecr_repo_url, config.frontend_image_tag),
            backend_image: format!("{}:{}", ecr_repo_url, config.backend_image_tag),
            ecr_repo_url,
        };

        info!(
            frontend_image = %inputs.frontend_image,
            backend_image = %inputs.backend_image,
            "Imported deployment inputs"
        );
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn importer(value: Value) -> ContractImporter {
        match value {
            Value::Object(map) => ContractImporter::new(map),
            _ => unreachable!(),
        }
    }

    fn key_of(err: ProvisionError) -> String {
        match err {
            ProvisionError::Contract { key, .. } => key,
            other => panic!("expected contract error, got {:?}", other),
        }
    }

    #[test_case(json!({}) ; "absent")]
    #[test_case(json!({"albArn": null}) ; "null")]
    #[test_case(json!({"albArn": 42}) ; "number")]
    #[test_case(json!({"albArn": ["a"]}) ; "array")]
    #[test_case(json!({"albArn": ""}) ; "empty")]
    fn test_bad_string_names_key(contract: Value) {
        let err = importer(contract).require_string("albArn").unwrap_err();
        assert_eq!(key_of(err), "albArn");
    }

    #[test_case(json!({"privateSubnetIds": "subnet-a"}) ; "scalar")]
    #[test_case(json!({"privateSubnetIds": []}) ; "empty array")]
    #[test_case(json!({"privateSubnetIds": ["subnet-a", 7]}) ; "non-string element")]
    #[test_case(json!({"privateSubnetIds": ["subnet-a", ""]}) ; "empty element")]
    fn test_bad_array_names_key(contract: Value) {
        let err = importer(contract).require_string_array("privateSubnetIds").unwrap_err();
        assert_eq!(key_of(err), "privateSubnetIds");
    }

    #[test]
    fn test_valid_values() {
        let contract = importer(json!({
            "albArn": "arn:alb",
            "privateSubnetIds": ["subnet-a", "subnet-b"],
            "dbPort": 5432,
        }));
        assert_eq!(contract.require_string("albArn").unwrap(), "arn:alb");
        assert_eq!(contract.require_string_array("privateSubnetIds").unwrap().len(), 2);
        assert_eq!(contract.require_integer("dbPort").unwrap(), 5432);
        assert_eq!(contract.optional_string("localAwsSecretsSecretArn").unwrap(), None);
    }

    #[test]
    fn test_integer_rejects_string() {
        let err = importer(json!({"dbPort": "5432"})).require_integer("dbPort").unwrap_err();
        assert_eq!(key_of(err), "dbPort");
    }

    #[test]
    fn test_non_object_file_rejected() {
        let err = ContractImporter::from_json_str("[1, 2]", "contract.json").unwrap_err();
        assert!(matches!(err, ProvisionError::Config { .. }));
    }
}
