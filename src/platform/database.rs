// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data tier: subnet group and PostgreSQL instance

use tracing::info;

use crate::config::PostgresConfig;
use crate::deferred::Deferred;
use crate::domain::ResourceKind;
use crate::errors::ProvisionResult;
use crate::stack::{Properties, ResourceRef, Stack};

pub const ENGINE: &str = "postgres";
pub const ENGINE_VERSION: &str = "18.1";
pub const ALLOCATED_STORAGE_GB: u32 = 20;

/// Declared data tier
#[derive(Debug, Clone)]
pub struct Database {
    pub subnet_group: ResourceRef,
    pub instance: ResourceRef,
}

impl Database {
    /// Hostname only; the port is exported separately
    pub fn endpoint(&self) -> Deferred<String> {
        self.instance.output_str("address")
    }

    pub fn port(&self) -> Deferred<i64> {
        self.instance.output_i64("port")
    }

    /// Secret holding the managed master password
    pub fn master_user_secret_arn(&self) -> Deferred<String> {
        self.instance.output_str("masterUserSecretArn")
    }
}

/// Declare the subnet group over `private_subnet_ids` and the instance in it
///
/// The instance is never publicly reachable and its password is managed by
/// the engine; only the secret's ARN comes back.
pub fn declare_database(
    stack: &mut Stack,
    postgres: &PostgresConfig,
    port: u16,
    private_subnet_ids: Deferred<Vec<String>>,
    data_tier: &ResourceRef,
) -> ProvisionResult<Database> {
    let scope = stack.scope().clone();

    let group_name = scope.name("db-subnet-group");
    let subnet_group = stack.declare(
        ResourceKind::DbSubnetGroup,
        &group_name,
        Properties::new()
            .set("name", group_name.as_str())
            .set_deferred("subnetIds", private_subnet_ids)
            .tags(scope.tags(&group_name)),
    )?;

    let name = scope.name("postgres");
    let final_snapshot = scope.name("final-snapshot");
    let security_groups = data_tier.id().map(|id| vec![id]);

    let instance = stack.declare(
        ResourceKind::DbInstance,
        &name,
        Properties::new()
            .set("identifier", name.as_str())
            .set("engine", ENGINE)
            .set("engineVersion", ENGINE_VERSION)
            .set("instanceClass", postgres.database_instance_type.as_str())
            .set("allocatedStorage", ALLOCATED_STORAGE_GB)
            .set("dbName", postgres.db_name.as_str())
            .set("username", postgres.db_user.as_str())
            .set("port", port)
            .set("manageMasterUserPassword", true)
            .set_deferred("dbSubnetGroupName", subnet_group.id())
            .set_deferred("vpcSecurityGroupIds", security_groups)
            .set("publiclyAccessible", false)
            .set("multiAz", postgres.database_multi_az)
            .set("backupRetentionPeriod", postgres.database_backup_retention_days)
            .set("skipFinalSnapshot", false)
            .set("finalSnapshotIdentifier", final_snapshot)
            .set("deletionProtection", false)
            .tags(scope.tags(&name)),
    )?;

    info!(
        instance = %name,
        class = %postgres.database_instance_type,
        multi_az = postgres.database_multi_az,
        "Declared data tier"
    );

    Ok(Database { subnet_group, instance })
}
