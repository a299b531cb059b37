// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for the stack contract importer

mod fixtures;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

use edge_infrastructure::contract::keys;
use edge_infrastructure::{
    BaseStackOutputs, ContractImporter, DeploymentConfig, DeploymentInputs, ProvisionError,
};
use fixtures::*;

fn failing_key(result: Result<impl std::fmt::Debug, ProvisionError>) -> String {
    match result {
        Err(ProvisionError::Contract { key, .. }) => key,
        other => panic!("expected a contract error, got {:?}", other),
    }
}

fn deployment() -> DeploymentConfig {
    DeploymentConfig {
        frontend_image_tag: "v1".to_string(),
        backend_image_tag: "v2".to_string(),
    }
}

#[test]
fn test_fixture_contract_is_complete() {
    let outputs = BaseStackOutputs::import(&ContractImporter::new(contract_json())).unwrap();
    assert_eq!(outputs.db_port, 5432);
    assert_eq!(outputs.public_subnet_ids, vec!["subnet-00000003", "subnet-00000004"]);
    assert_eq!(outputs.local_aws_secrets_secret_arn, None);
}

#[test]
fn test_every_required_key_is_checked() {
    for (key, _) in keys::REQUIRED {
        let importer = contract_with(key, None);
        assert_eq!(failing_key(BaseStackOutputs::import(&importer)), *key);
    }
}

#[test_case(keys::ALB_ARN, Value::Null ; "null scalar")]
#[test_case(keys::VPC_ID, json!(17) ; "number where string expected")]
#[test_case(keys::CERT_ARN, json!("") ; "empty string")]
#[test_case(keys::BACKEND_DOMAIN, json!(["api.example.com"]) ; "array where string expected")]
#[test_case(keys::PUBLIC_SUBNET_IDS, json!("subnet-1") ; "string where array expected")]
#[test_case(keys::PRIVATE_SUBNET_IDS, json!([]) ; "empty array")]
#[test_case(keys::PRIVATE_SUBNET_IDS, json!(["subnet-1", null]) ; "null element")]
#[test_case(keys::PUBLIC_SUBNET_IDS, json!(["subnet-1", ""]) ; "empty element")]
#[test_case(keys::DB_PORT, json!("5432") ; "string where integer expected")]
#[test_case(keys::DB_PORT, json!(70000) ; "port out of range")]
#[test_case(keys::LOCAL_AWS_SECRETS_SECRET_NAME, json!("") ; "empty optional value")]
fn test_malformed_value_names_key(key: &str, value: Value) {
    let importer = contract_with(key, Some(value));
    assert_eq!(failing_key(BaseStackOutputs::import(&importer)), key);
}

#[test_case(keys::ECR_REPO_URL ; "repository url")]
#[test_case(keys::ECS_TASK_ROLE_ARN ; "task role")]
#[test_case(keys::BACKEND_TARGET_GROUP_ARN ; "backend target group")]
#[test_case(keys::PRIVATE_SUBNET_IDS ; "private subnets")]
fn test_deployment_pass_requires_service_keys(key: &str) {
    let importer = contract_with(key, None);
    assert_eq!(failing_key(DeploymentInputs::import(&importer, &deployment())), key);
}

#[test]
fn test_deployment_pass_ignores_keys_it_does_not_read() {
    let importer = contract_with(keys::SSM_DB_ACCESS_INSTANCE_ID, None);
    let inputs = DeploymentInputs::import(&importer, &deployment()).unwrap();
    assert_eq!(inputs.frontend_image, "123456789012.dkr.ecr.eu-west-1.local/shop-prod:v1");
    assert_eq!(inputs.backend_image, "123456789012.dkr.ecr.eu-west-1.local/shop-prod:v2");
}

#[test]
fn test_contract_file_round_trip() {
    let text = serde_json::to_string(&Value::Object(contract_json())).unwrap();
    let importer = ContractImporter::from_json_str(&text, "contract.json").unwrap();
    assert!(BaseStackOutputs::import(&importer).is_ok());

    let err = ContractImporter::from_json_str("{ not json", "contract.json").unwrap_err();
    assert!(matches!(err, ProvisionError::Config { ref parameter, .. } if parameter == "contract.json"));
}
