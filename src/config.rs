// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack configuration
//!
//! Loaded from a YAML stack file and validated before anything is declared.
//! Every failure is a `Config` error naming the offending parameter.
//!
//! ```yaml
//! projectName: shop
//! environment: prod
//! vpcCidr: 10.0.0.0/16
//! hostedZoneName: example.com
//! postgres:
//!   dbName: shop
//!   dbUser: shop_admin
//!   databaseInstanceType: db.t4g.micro
//!   databaseBackupRetentionDays: 7
//!   databaseMultiAz: false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::certificate::PollPolicy;
use crate::domain::{AddressBlock, Hostname};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::naming::NameScope;
use crate::network::TopologyRequest;
use crate::security::{ServicePorts, HTTPS_PORT, HTTP_PORT};

/// Longest backup retention the database engine accepts, in days
pub const MAX_BACKUP_RETENTION_DAYS: u32 = 35;

/// Database sizing block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresConfig {
    pub db_name: String,
    pub db_user: String,
    pub database_instance_type: String,
    pub database_backup_retention_days: u32,
    pub database_multi_az: bool,
}

/// Subnet counts and partition width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    pub public_subnet_count: usize,
    pub private_subnet_count: usize,
    pub new_bits: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            public_subnet_count: 2,
            private_subnet_count: 2,
            new_bits: 7,
        }
    }
}

/// Certificate request and issuance wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateConfig {
    pub include_wildcard: bool,
    pub timeout_seconds: u64,
    pub poll_interval_seconds: u64,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            include_wildcard: true,
            timeout_seconds: 45 * 60,
            poll_interval_seconds: 15,
        }
    }
}

/// Public service names and dispatch priorities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeConfig {
    pub frontend_subdomain: String,
    pub backend_subdomain: String,
    pub frontend_priority: u16,
    pub backend_priority: u16,
    pub health_check_path: String,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            frontend_subdomain: "app".to_string(),
            backend_subdomain: "api".to_string(),
            frontend_priority: 10,
            backend_priority: 20,
            health_check_path: "/health".to_string(),
        }
    }
}

/// Private operator instance with data-tier access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorAccessConfig {
    pub enabled: bool,
    pub instance_type: String,
}

impl Default for OperatorAccessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            instance_type: "t3.nano".to_string(),
        }
    }
}

/// Inputs of the infrastructure pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    pub project_name: String,
    pub environment: String,
    pub vpc_cidr: String,
    pub hosted_zone_name: String,
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub ports: ServicePorts,
    #[serde(default)]
    pub certificate: CertificateConfig,
    #[serde(default)]
    pub edge: EdgeConfig,
    /// Environment whose service secrets the task role may read
    #[serde(default)]
    pub secret_environment: Option<String>,
    #[serde(default)]
    pub operator_access: OperatorAccessConfig,
}

impl StackConfig {
    /// Parse and validate YAML; `source` names the input in errors
    pub fn from_yaml_str(yaml: &str, source: &str) -> ProvisionResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ProvisionError::from_yaml(source, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a stack file
    pub fn load(path: &Path) -> ProvisionResult<Self> {
        let source = path.display().to_string();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ProvisionError::config(&source, e.to_string()))?;
        Self::from_yaml_str(&yaml, &source)
    }

    /// Check every parameter
    pub fn validate(&self) -> ProvisionResult<()> {
        require_slug("projectName", &self.project_name)?;
        require_slug("environment", &self.environment)?;
        if let Some(secret_environment) = &self.secret_environment {
            require_slug("secretEnvironment", secret_environment)?;
        }

        self.cidr()?;
        let zone = self.hosted_zone()?;
        if zone.is_wildcard() {
            return Err(ProvisionError::config("hostedZoneName", "must not be a wildcard"));
        }
        self.frontend_domain()?;
        self.backend_domain()?;

        require_non_empty("postgres.dbName", &self.postgres.db_name)?;
        require_non_empty("postgres.dbUser", &self.postgres.db_user)?;
        require_non_empty("postgres.databaseInstanceType", &self.postgres.database_instance_type)?;
        if self.postgres.database_backup_retention_days > MAX_BACKUP_RETENTION_DAYS {
            return Err(ProvisionError::config(
                "postgres.databaseBackupRetentionDays",
                format!(
                    "{} is outside 0..={}",
                    self.postgres.database_backup_retention_days, MAX_BACKUP_RETENTION_DAYS
                ),
            ));
        }

        if self.network.public_subnet_count == 0 {
            return Err(ProvisionError::config("network.publicSubnetCount", "must be at least 1"));
        }
        if self.network.private_subnet_count == 0 {
            return Err(ProvisionError::config("network.privateSubnetCount", "must be at least 1"));
        }

        self.validate_ports()?;

        if self.edge.frontend_subdomain == self.edge.backend_subdomain {
            return Err(ProvisionError::config(
                "edge.backendSubdomain",
                "frontend and backend must use different names",
            ));
        }
        if self.edge.frontend_priority == self.edge.backend_priority {
            return Err(ProvisionError::config(
                "edge.backendPriority",
                format!("priority {} is already used by the frontend", self.edge.backend_priority),
            ));
        }
        if self.edge.frontend_priority > self.edge.backend_priority {
            return Err(ProvisionError::config(
                "edge.frontendPriority",
                format!(
                    "must be evaluated before the backend rule (priority {})",
                    self.edge.backend_priority
                ),
            ));
        }

        if self.certificate.poll_interval_seconds == 0 {
            return Err(ProvisionError::config("certificate.pollIntervalSeconds", "must be positive"));
        }
        if self.certificate.timeout_seconds < self.certificate.poll_interval_seconds {
            return Err(ProvisionError::config(
                "certificate.timeoutSeconds",
                "must be at least one poll interval",
            ));
        }

        if self.operator_access.enabled {
            require_non_empty("operatorAccess.instanceType", &self.operator_access.instance_type)?;
        }

        Ok(())
    }

    fn validate_ports(&self) -> ProvisionResult<()> {
        let ports = [
            ("ports.frontend", self.ports.frontend),
            ("ports.backend", self.ports.backend),
            ("ports.database", self.ports.database),
        ];

        let mut seen: BTreeMap<u16, &str> = BTreeMap::new();
        for (parameter, port) in ports {
            if port == 0 {
                return Err(ProvisionError::config(parameter, "must be non-zero"));
            }
            if let Some(other) = seen.insert(port, parameter) {
                return Err(ProvisionError::config(
                    parameter,
                    format!("port {} is already used by {}", port, other),
                ));
            }
        }

        if self.ports.backend == HTTPS_PORT || self.ports.database == HTTPS_PORT {
            return Err(ProvisionError::config(
                "ports",
                format!("port {} is reserved for the edge listener", HTTPS_PORT),
            ));
        }
        if self.ports.database == HTTP_PORT {
            return Err(ProvisionError::config("ports.database", "must not be the public web port"));
        }
        Ok(())
    }

    pub fn scope(&self) -> NameScope {
        NameScope::new(&self.project_name, &self.environment)
    }

    pub fn cidr(&self) -> ProvisionResult<AddressBlock> {
        self.vpc_cidr
            .parse()
            .map_err(|e: crate::domain::NetworkError| ProvisionError::config("vpcCidr", e.to_string()))
    }

    pub fn hosted_zone(&self) -> ProvisionResult<Hostname> {
        Hostname::new(&self.hosted_zone_name)
            .map_err(|e| ProvisionError::config("hostedZoneName", e.to_string()))
    }

    /// `{frontendSubdomain}.{hostedZoneName}`
    pub fn frontend_domain(&self) -> ProvisionResult<Hostname> {
        self.hosted_zone()?
            .prefixed(&self.edge.frontend_subdomain)
            .map_err(|e| ProvisionError::config("edge.frontendSubdomain", e.to_string()))
    }

    /// `{backendSubdomain}.{hostedZoneName}`
    pub fn backend_domain(&self) -> ProvisionResult<Hostname> {
        self.hosted_zone()?
            .prefixed(&self.edge.backend_subdomain)
            .map_err(|e| ProvisionError::config("edge.backendSubdomain", e.to_string()))
    }

    /// Secret environment, defaulting to the stack environment
    pub fn secret_environment(&self) -> &str {
        self.secret_environment.as_deref().unwrap_or(&self.environment)
    }

    pub fn topology_request(&self) -> ProvisionResult<TopologyRequest> {
        Ok(TopologyRequest {
            cidr: self.cidr()?,
            new_bits: self.network.new_bits,
            public_subnets: self.network.public_subnet_count,
            private_subnets: self.network.private_subnet_count,
        })
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            timeout: Duration::from_secs(self.certificate.timeout_seconds),
            interval: Duration::from_secs(self.certificate.poll_interval_seconds),
        }
    }
}

/// Inputs of the deployment pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub frontend_image_tag: String,
    pub backend_image_tag: String,
}

impl DeploymentConfig {
    pub fn from_yaml_str(yaml: &str, source: &str) -> ProvisionResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ProvisionError::from_yaml(source, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ProvisionResult<Self> {
        let source = path.display().to_string();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ProvisionError::config(&source, e.to_string()))?;
        Self::from_yaml_str(&yaml, &source)
    }

    pub fn validate(&self) -> ProvisionResult<()> {
        require_image_tag("frontendImageTag", &self.frontend_image_tag)?;
        require_image_tag("backendImageTag", &self.backend_image_tag)
    }
}

fn require_non_empty(parameter: &str, value: &str) -> ProvisionResult<()> {
    if value.trim().is_empty() {
        Err(ProvisionError::config(parameter, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Lowercase letters, digits and inner hyphens, safe inside resource names
fn require_slug(parameter: &str, value: &str) -> ProvisionResult<()> {
    require_non_empty(parameter, value)?;
    let valid = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-');

    if valid {
        Ok(())
    } else {
        Err(ProvisionError::config(
            parameter,
            format!("'{}' must be lowercase letters, digits and inner hyphens", value),
        ))
    }
}

fn require_image_tag(parameter: &str, value: &str) -> ProvisionResult<()> {
    require_non_empty(parameter, value)?;
    let valid = value.len() <= 128
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        && !value.starts_with(['.', '-']);

    if valid {
        Ok(())
    } else {
        Err(ProvisionError::config(parameter, format!("'{}' is not a valid image tag", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const MINIMAL: &str = r#"
projectName: shop
environment: prod
vpcCidr: 10.0.0.0/16
hostedZoneName: example.com
postgres:
  dbName: shop
  dbUser: shop_admin
  databaseInstanceType: db.t4g.micro
  databaseBackupRetentionDays: 7
  databaseMultiAz: false
"#;

    fn minimal() -> StackConfig {
        StackConfig::from_yaml_str(MINIMAL, "test").unwrap()
    }

    fn parameter(err: ProvisionError) -> String {
        match err {
            ProvisionError::Config { parameter, .. } => parameter,
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = minimal();
        assert_eq!(config.network, NetworkConfig::default());
        assert_eq!(config.ports, ServicePorts::default());
        assert_eq!(config.secret_environment(), "prod");
        assert_eq!(config.frontend_domain().unwrap().as_str(), "app.example.com");
        assert_eq!(config.backend_domain().unwrap().as_str(), "api.example.com");
        assert_eq!(config.poll_policy().interval, Duration::from_secs(15));
        assert!(config.operator_access.enabled);
    }

    #[test]
    fn test_secret_environment_override() {
        let yaml = format!("{}secretEnvironment: shared\n", MINIMAL);
        let config = StackConfig::from_yaml_str(&yaml, "test").unwrap();
        assert_eq!(config.secret_environment(), "shared");
    }

    #[test]
    fn test_missing_parameter() {
        let yaml = MINIMAL.replace("hostedZoneName: example.com\n", "");
        let err = StackConfig::from_yaml_str(&yaml, "stack.yaml").unwrap_err();
        assert_eq!(parameter(err), "stack.yaml");
    }

    #[test_case(|c: &mut StackConfig| c.project_name = "Shop".into(), "projectName" ; "uppercase project")]
    #[test_case(|c: &mut StackConfig| c.environment = String::new(), "environment" ; "empty environment")]
    #[test_case(|c: &mut StackConfig| c.vpc_cidr = "10.0.0.0/33".into(), "vpcCidr" ; "bad cidr")]
    #[test_case(|c: &mut StackConfig| c.hosted_zone_name = "-bad-.com".into(), "hostedZoneName" ; "bad zone")]
    #[test_case(|c: &mut StackConfig| c.postgres.db_user = " ".into(), "postgres.dbUser" ; "blank db user")]
    #[test_case(|c: &mut StackConfig| c.postgres.database_backup_retention_days = 36, "postgres.databaseBackupRetentionDays" ; "retention too long")]
    #[test_case(|c: &mut StackConfig| c.network.private_subnet_count = 0, "network.privateSubnetCount" ; "no private subnets")]
    #[test_case(|c: &mut StackConfig| c.ports.database = 3000, "ports.database" ; "duplicate port")]
    #[test_case(|c: &mut StackConfig| c.edge.backend_priority = 10, "edge.backendPriority" ; "duplicate priority")]
    #[test_case(|c: &mut StackConfig| { c.edge.frontend_priority = 30; c.edge.backend_priority = 20; }, "edge.frontendPriority" ; "inverted priority")]
    #[test_case(|c: &mut StackConfig| c.certificate.poll_interval_seconds = 0, "certificate.pollIntervalSeconds" ; "zero poll interval")]
    fn test_invalid_parameter(mutate: fn(&mut StackConfig), expected: &str) {
        let mut config = minimal();
        mutate(&mut config);
        assert_eq!(parameter(config.validate().unwrap_err()), expected);
    }

    #[test]
    fn test_deployment_config() {
        let config = DeploymentConfig::from_yaml_str(
            "frontendImageTag: v1.2.3\nbackendImageTag: 2025-01-01.abc\n",
            "deploy.yaml",
        )
        .unwrap();
        assert_eq!(config.frontend_image_tag, "v1.2.3");

        let err = DeploymentConfig::from_yaml_str(
            "frontendImageTag: ''\nbackendImageTag: v1\n",
            "deploy.yaml",
        )
        .unwrap_err();
        assert_eq!(parameter(err), "frontendImageTag");

        let err = DeploymentConfig::from_yaml_str(
            "frontendImageTag: v1\nbackendImageTag: 'has space'\n",
            "deploy.yaml",
        )
        .unwrap_err();
        assert_eq!(parameter(err), "backendImageTag");
    }
}
