// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for edge-infrastructure
//!
//! Deterministic stack parameters, engines and contracts shared by the
//! integration tests. Nothing here reads the clock or the environment.

#![allow(dead_code)]

use serde_json::{json, Map, Value};

use edge_infrastructure::domain::Hostname;
use edge_infrastructure::{ContractImporter, InMemoryEngine, StackConfig};

pub const PROJECT: &str = "shop";
pub const ENVIRONMENT: &str = "prod";
pub const HOSTED_ZONE: &str = "example.com";

/// Stack file with the documented defaults and a short issuance wait
pub const STACK_YAML: &str = r#"
projectName: shop
environment: prod
vpcCidr: 10.0.0.0/16
hostedZoneName: example.com
network:
  publicSubnetCount: 2
  privateSubnetCount: 2
  newBits: 7
certificate:
  includeWildcard: true
  timeoutSeconds: 120
  pollIntervalSeconds: 5
postgres:
  dbName: shop
  dbUser: shop_admin
  databaseInstanceType: db.t4g.micro
  databaseBackupRetentionDays: 7
  databaseMultiAz: false
"#;

pub fn stack_config() -> StackConfig {
    StackConfig::from_yaml_str(STACK_YAML, "fixture").expect("Invalid stack fixture")
}

/// Stack config with extra YAML appended at the top level
pub fn stack_config_with(extra: &str) -> StackConfig {
    StackConfig::from_yaml_str(&format!("{}{}", STACK_YAML, extra), "fixture")
        .expect("Invalid stack fixture")
}

/// Engine reporting exactly zones `A` and `B`
pub fn two_zone_engine() -> InMemoryEngine {
    InMemoryEngine::new()
        .with_zones(["A", "B"])
        .with_hosted_zones(vec![Hostname::new(HOSTED_ZONE).expect("Invalid hostname")])
        .with_account("123456789012", "eu-west-1")
}

/// A complete, valid published contract
pub fn contract_json() -> Map<String, Value> {
    let value = json!({
        "vpcId": "vpc-00000001",
        "publicSubnetIds": ["subnet-00000003", "subnet-00000004"],
        "privateSubnetIds": ["subnet-00000005", "subnet-00000006"],
        "hostedZoneId": "Z0EXAMPLE",
        "certArn": "arn:aws:acm:eu-west-1:123456789012:certificate/shop-prod-cert",
        "frontendDomain": "app.example.com",
        "backendDomain": "api.example.com",
        "albArn": "arn:aws:elasticloadbalancing:eu-west-1:123456789012:loadbalancer/app/shop-prod-edge-alb",
        "albDnsName": "shop-prod-edge-alb-1.eu-west-1.elb.local",
        "albZoneId": "ZMEMORYELB0000",
        "httpsListenerArn": "arn:aws:elasticloadbalancing:eu-west-1:123456789012:listener/https",
        "frontendTargetGroupArn": "arn:aws:elasticloadbalancing:eu-west-1:123456789012:targetgroup/fe",
        "backendTargetGroupArn": "arn:aws:elasticloadbalancing:eu-west-1:123456789012:targetgroup/be",
        "frontendListenerRuleArn": "arn:aws:elasticloadbalancing:eu-west-1:123456789012:listener-rule/fe",
        "backendListenerRuleArn": "arn:aws:elasticloadbalancing:eu-west-1:123456789012:listener-rule/be",
        "ecsClusterArn": "arn:aws:ecs:eu-west-1:123456789012:cluster/shop-prod-cluster",
        "ecsExecutionRoleArn": "arn:aws:iam::123456789012:role/shop-prod-ecs-execution-role",
        "ecsTaskRoleArn": "arn:aws:iam::123456789012:role/shop-prod-ecs-task-role",
        "albSgId": "sg-00000010",
        "frontendSgId": "sg-00000011",
        "backendSgId": "sg-00000012",
        "dbEndpoint": "shop-prod-postgres.local",
        "dbPort": 5432,
        "dbMasterUserSecretArn": "arn:aws:secretsmanager:eu-west-1:123456789012:secret:rds!db-1",
        "awsSecretsSecretName": "shop-prod-core-config",
        "awsSecretsSecretArn": "arn:aws:secretsmanager:eu-west-1:123456789012:secret:shop-prod-core-config",
        "ecrRepoUrl": "123456789012.dkr.ecr.eu-west-1.local/shop-prod",
        "ssmDbAccessInstanceId": "i-00000020",
        "ssmDbAccessSgId": "sg-00000021",
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fixture is an object"),
    }
}

/// Importer over the fixture contract with `key` replaced (or removed for `None`)
pub fn contract_with(key: &str, value: Option<Value>) -> ContractImporter {
    let mut contract = contract_json();
    match value {
        Some(value) => contract.insert(key.to_string(), value),
        None => contract.remove(key),
    };
    ContractImporter::new(contract)
}
