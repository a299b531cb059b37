// Copyright (c) 2025 - Cowboy AI, Inc.
//! Base stack orchestration
//!
//! Composes every builder into one desired-state [`Stack`] and publishes the
//! identifiers the deployment pass needs through a [`ContractExporter`].
//!
//! ```text
//! zones ─┐
//!        ├─> topology ─> security ─┬─> edge router ─> aliases
//! cidr ──┘                         ├─> data tier ─> operator access
//! hosted zone ─> certificate ──────┘
//! account ─> container platform, secrets, image repository
//! ```

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::certificate::{declare_alias_record, CertificateRequest, CertificateValidator};
use crate::config::StackConfig;
use crate::contract::{keys, ContractExporter, StackContract};
use crate::deferred::Deferred;
use crate::edge::{EdgeAttachments, EdgeRouter, HostRule};
use crate::engine::ProvisioningEngine;
use crate::errors::{ProvisionError, ProvisionResult};
use crate::network::{NetworkTopology, ZoneSelector};
use crate::platform::{
    declare_container_platform, declare_database, declare_image_repository, declare_operator_access,
    declare_secret, LOCAL_ENVIRONMENT, SERVICE,
};
use crate::security::SecurityPlan;
use crate::stack::{ApplyReport, Stack};

/// Declared base stack, ready to apply
#[derive(Debug)]
pub struct BaseStackPlan {
    pub stack: Stack,
    pub contract: ContractExporter,
}

/// Outcome of a provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub run_id: Uuid,
    pub report: ApplyReport,
    pub contract: StackContract,
}

/// Declare the whole base stack without creating anything
///
/// Only the lookups planning depends on reach the engine: placement zones,
/// the hosted zone and the account context.
pub async fn plan_base_stack(
    config: &StackConfig,
    engine: &dyn ProvisioningEngine,
) -> ProvisionResult<BaseStackPlan> {
    config.validate()?;

    let zones = ZoneSelector::discover(engine).await?;
    let hosted_zone = engine.lookup_hosted_zone(&config.hosted_zone()?).await?;
    let account = engine.account_context().await?;

    let mut stack = Stack::new(config.scope());
    let mut contract = ContractExporter::new();

    let topology = NetworkTopology::build(&mut stack, &config.topology_request()?, &zones)?;
    contract.string(keys::VPC_ID, topology.vpc_id())?;
    contract.string_array(keys::PUBLIC_SUBNET_IDS, topology.public_subnet_ids())?;
    contract.string_array(keys::PRIVATE_SUBNET_IDS, topology.private_subnet_ids())?;

    let groups = SecurityPlan::plan(&config.ports)?.declare(&mut stack, &topology.vpc)?;
    contract.string(keys::ALB_SG_ID, groups.edge.id())?;
    contract.string(keys::FRONTEND_SG_ID, groups.frontend.id())?;
    contract.string(keys::BACKEND_SG_ID, groups.backend.id())?;

    let request = CertificateRequest::for_zone(&hosted_zone.name, config.certificate.include_wildcard)?;
    let certificate = CertificateValidator::new(hosted_zone.clone(), config.poll_policy())
        .declare(&mut stack, &request)?;
    contract.string(keys::HOSTED_ZONE_ID, Deferred::known(hosted_zone.zone_id.clone()))?;
    contract.string(keys::CERT_ARN, certificate.arn())?;

    let frontend_domain = config.frontend_domain()?;
    let backend_domain = config.backend_domain()?;
    contract.string(keys::FRONTEND_DOMAIN, Deferred::known(frontend_domain.to_string()))?;
    contract.string(keys::BACKEND_DOMAIN, Deferred::known(backend_domain.to_string()))?;

    let mut frontend_rule = HostRule::frontend(
        frontend_domain.clone(),
        config.ports.frontend,
        config.edge.frontend_priority,
    );
    frontend_rule.health_check_path = config.edge.health_check_path.clone();
    let mut backend_rule = HostRule::backend(
        backend_domain.clone(),
        config.ports.backend,
        config.edge.backend_priority,
    );
    backend_rule.health_check_path = config.edge.health_check_path.clone();

    let routes = EdgeRouter::new()
        .with_rule(frontend_rule)?
        .with_rule(backend_rule)?
        .declare(
            &mut stack,
            &EdgeAttachments {
                vpc_id: topology.vpc_id(),
                public_subnet_ids: topology.public_subnet_ids(),
                edge_security_group_id: groups.edge.id(),
                certificate_arn: certificate.arn(),
            },
        )?;
    let frontend = routes.service("frontend")?;
    let backend = routes.service("backend")?;
    contract.string(keys::ALB_ARN, routes.load_balancer.arn())?;
    contract.string(keys::ALB_DNS_NAME, routes.dns_name())?;
    contract.string(keys::ALB_ZONE_ID, routes.zone_id())?;
    contract.string(keys::HTTPS_LISTENER_ARN, routes.https_listener.arn())?;
    contract.string(keys::FRONTEND_TARGET_GROUP_ARN, frontend.target_group.arn())?;
    contract.string(keys::BACKEND_TARGET_GROUP_ARN, backend.target_group.arn())?;
    contract.string(keys::FRONTEND_LISTENER_RULE_ARN, frontend.listener_rule.arn())?;
    contract.string(keys::BACKEND_LISTENER_RULE_ARN, backend.listener_rule.arn())?;

    declare_alias_record(
        &mut stack,
        &hosted_zone,
        "frontend",
        &frontend_domain,
        routes.dns_name(),
        routes.zone_id(),
    )?;
    declare_alias_record(
        &mut stack,
        &hosted_zone,
        "backend",
        &backend_domain,
        routes.dns_name(),
        routes.zone_id(),
    )?;

    let database = declare_database(
        &mut stack,
        &config.postgres,
        config.ports.database,
        topology.private_subnet_ids(),
        &groups.data_tier,
    )?;
    contract.string(keys::DB_ENDPOINT, database.endpoint())?;
    contract.integer(keys::DB_PORT, database.port())?;
    contract.string(keys::DB_MASTER_USER_SECRET_ARN, database.master_user_secret_arn())?;

    if config.operator_access.enabled {
        let private_subnet = topology.private_subnets.first().ok_or_else(|| {
            ProvisionError::config("network.privateSubnetCount", "operator access needs a private subnet")
        })?;
        let access = declare_operator_access(
            &mut stack,
            &config.operator_access,
            &topology.vpc,
            &private_subnet.resource,
            &groups,
            config.ports.database,
        )?;
        contract.string(keys::SSM_DB_ACCESS_INSTANCE_ID, access.instance_id())?;
        contract.string(keys::SSM_DB_ACCESS_SG_ID, access.security_group_id())?;
    }

    let secret = declare_secret(&mut stack, &config.environment, SERVICE)?;
    contract.string(keys::AWS_SECRETS_SECRET_NAME, secret.name())?;
    contract.string(keys::AWS_SECRETS_SECRET_ARN, secret.arn())?;
    if config.environment != LOCAL_ENVIRONMENT {
        let local = declare_secret(&mut stack, LOCAL_ENVIRONMENT, SERVICE)?;
        contract.string(keys::LOCAL_AWS_SECRETS_SECRET_NAME, local.name())?;
        contract.string(keys::LOCAL_AWS_SECRETS_SECRET_ARN, local.arn())?;
    }

    let platform = declare_container_platform(&mut stack, &account, config.secret_environment(), SERVICE)?;
    contract.string(keys::ECS_CLUSTER_ARN, platform.cluster_arn())?;
    contract.string(keys::ECS_EXECUTION_ROLE_ARN, platform.execution_role_arn())?;
    contract.string(keys::ECS_TASK_ROLE_ARN, platform.task_role_arn())?;

    let repository = declare_image_repository(&mut stack)?;
    contract.string(keys::ECR_REPO_URL, repository.url())?;

    info!(
        resources = stack.len(),
        contract_keys = contract.len(),
        zones = zones.zones().len(),
        "Planned base stack"
    );

    Ok(BaseStackPlan { stack, contract })
}

/// Plan, apply and resolve the contract in one run
///
/// A plan whose contract lacks a required key is rejected before anything
/// is created. Otherwise aborts on the first failure; nothing already
/// created is rolled back.
pub async fn provision_base_stack(
    config: &StackConfig,
    engine: &dyn ProvisioningEngine,
) -> ProvisionResult<ProvisionOutcome> {
    let run_id = Uuid::now_v7();
    let span = info_span!(
        "provision",
        %run_id,
        project = %config.project_name,
        environment = %config.environment,
        engine = engine.name(),
    );

    async move {
        info!("🚀 Provisioning base stack");
        let plan = plan_base_stack(config, engine).await?;
        plan.contract.ensure_complete()?;
        let report = plan.stack.apply(engine).await?;
        let contract = plan.contract.resolve()?;
        info!(
            resources = report.resources,
            levels = report.levels,
            keys = contract.len(),
            "✅ Base stack provisioned"
        );

        Ok(ProvisionOutcome {
            run_id,
            report,
            contract,
        })
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceKind;
    use crate::engine::InMemoryEngine;

    fn config(yaml_extra: &str) -> StackConfig {
        let yaml = format!(
            r#"
projectName: shop
environment: prod
vpcCidr: 10.0.0.0/16
hostedZoneName: example.com
certificate:
  timeoutSeconds: 60
  pollIntervalSeconds: 1
postgres:
  dbName: shop
  dbUser: shop_admin
  databaseInstanceType: db.t4g.micro
  databaseBackupRetentionDays: 7
  databaseMultiAz: false
{}"#,
            yaml_extra
        );
        StackConfig::from_yaml_str(&yaml, "test").unwrap()
    }

    #[tokio::test]
    async fn test_plan_exports_every_required_key() {
        let plan = plan_base_stack(&config(""), &InMemoryEngine::new()).await.unwrap();
        assert!(plan.contract.missing_required().is_empty());
        assert_eq!(plan.stack.resources_of(ResourceKind::Secret).len(), 2);
        assert_eq!(plan.stack.resources_of(ResourceKind::Instance).len(), 1);
    }

    #[tokio::test]
    async fn test_without_operator_access_contract_is_incomplete() {
        let plan = plan_base_stack(&config("operatorAccess:\n  enabled: false\n"), &InMemoryEngine::new())
            .await
            .unwrap();
        assert_eq!(
            plan.contract.missing_required(),
            vec![keys::SSM_DB_ACCESS_INSTANCE_ID, keys::SSM_DB_ACCESS_SG_ID]
        );
    }

    #[tokio::test]
    async fn test_incomplete_contract_creates_nothing() {
        let engine = InMemoryEngine::new();
        let err = provision_base_stack(&config("operatorAccess:\n  enabled: false\n"), &engine)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ProvisionError::Contract { ref key, .. } if key == keys::SSM_DB_ACCESS_INSTANCE_ID)
        );
        assert!(engine.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_hosted_zone_fails_planning() {
        let engine = InMemoryEngine::new()
            .with_hosted_zones(vec![crate::domain::Hostname::new("example.org").unwrap()]);
        let err = plan_base_stack(&config(""), &engine).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Provider { ref resource, .. } if resource == "example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provision_resolves_contract() {
        let outcome = provision_base_stack(&config(""), &InMemoryEngine::new()).await.unwrap();
        assert_eq!(outcome.contract.len(), keys::REQUIRED.len() + keys::OPTIONAL.len());
        assert!(outcome.report.levels > 1);
    }
}
