// Copyright (c) 2025 - Cowboy AI, Inc.

//! Desired-State Stack
//!
//! A `Stack` is the ordered registry of everything a provisioning run
//! declares. Declaring a resource is pure: it records the kind, the name and
//! the (possibly deferred) properties, and hands back a [`ResourceRef`] whose
//! outputs later declarations can chain onto.
//!
//! # Dependency Levels
//!
//! The deferred properties of a declaration carry the names of the resources
//! they read. A resource's level is one more than the deepest resource it
//! references:
//!
//! ```text
//! level 0:  vpc            eip
//! level 1:  igw  subnet-1  subnet-2
//! level 2:  nat-gateway    public-rt
//! level 3:  private-default ...
//! ```
//!
//! `apply` creates every resource of a level concurrently, then moves on to
//! the next level. The first failure aborts the run; nothing is rolled back,
//! cleanup belongs to the engine.
//!
//! # Await Conditions
//!
//! A declaration may carry an [`AwaitCondition`] that must hold before any
//! resource of a later level starts, e.g. waiting for a certificate to be
//! issued before the listener that serves it.

pub mod properties;
pub mod reference;

pub use properties::{Properties, COMPUTED};
pub use reference::{ids, ResourceRef};

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::domain::ResourceKind;
use crate::engine::{ProvisioningEngine, ResolvedResource, ResourceOutputs};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::naming::NameScope;

/// Condition that must hold after a resource is created and before any
/// later level starts
#[async_trait]
pub trait AwaitCondition: Send + Sync + Debug {
    /// Block until the condition holds, or fail
    async fn wait(&self, engine: &dyn ProvisioningEngine, resource: &ResourceRef) -> ProvisionResult<()>;

    /// Short human-readable description for plans
    fn describe(&self) -> String;
}

#[derive(Debug)]
struct Declaration {
    name: String,
    kind: ResourceKind,
    properties: Properties,
    dependencies: BTreeSet<String>,
    level: usize,
    await_condition: Option<Arc<dyn AwaitCondition>>,
    outputs: Arc<OnceLock<ResourceOutputs>>,
}

impl Declaration {
    fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.name.clone(), self.kind, Arc::clone(&self.outputs))
    }
}

/// One resource as it appears in a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedResource {
    pub name: String,
    pub kind: ResourceKind,
    pub level: usize,
    pub depends_on: Vec<String>,
    pub properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaits: Option<String>,
}

/// Outcome of a successful apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub resources: usize,
    pub levels: usize,
}

/// Ordered registry of desired-state declarations
#[derive(Debug)]
pub struct Stack {
    scope: NameScope,
    declarations: Vec<Declaration>,
    by_name: HashMap<String, usize>,
}

impl Stack {
    pub fn new(scope: NameScope) -> Self {
        Self {
            scope,
            declarations: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Naming scope shared by every declaration
    pub fn scope(&self) -> &NameScope {
        &self.scope
    }

    /// Declare a resource
    ///
    /// Fails with `Provider` if the name is already declared or a property
    /// references a resource this stack does not know.
    pub fn declare(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        properties: Properties,
    ) -> ProvisionResult<ResourceRef> {
        self.push(kind, name.into(), properties, None)
    }

    /// Declare a resource whose dependents wait on `condition`
    pub fn declare_awaiting(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        properties: Properties,
        condition: Arc<dyn AwaitCondition>,
    ) -> ProvisionResult<ResourceRef> {
        self.push(kind, name.into(), properties, Some(condition))
    }

    fn push(
        &mut self,
        kind: ResourceKind,
        name: String,
        properties: Properties,
        await_condition: Option<Arc<dyn AwaitCondition>>,
    ) -> ProvisionResult<ResourceRef> {
        if self.by_name.contains_key(&name) {
            return Err(ProvisionError::provider(name, "duplicate resource name"));
        }

        let dependencies = properties.dependencies();
        let mut level = 0;
        for dependency in &dependencies {
            let index = self.by_name.get(dependency).ok_or_else(|| {
                ProvisionError::provider(
                    &name,
                    format!("depends on undeclared resource '{}'", dependency),
                )
            })?;
            level = level.max(self.declarations[*index].level + 1);
        }

        debug!(resource = %name, kind = %kind, level, "Declared resource");

        let declaration = Declaration {
            name: name.clone(),
            kind,
            properties,
            dependencies,
            level,
            await_condition,
            outputs: Arc::new(OnceLock::new()),
        };
        let reference = declaration.reference();

        self.by_name.insert(name, self.declarations.len());
        self.declarations.push(declaration);
        Ok(reference)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Handle to a declared resource
    pub fn resource(&self, name: &str) -> Option<ResourceRef> {
        self.by_name
            .get(name)
            .map(|index| self.declarations[*index].reference())
    }

    /// Handles of every resource of `kind`, in declaration order
    pub fn resources_of(&self, kind: ResourceKind) -> Vec<ResourceRef> {
        self.declarations
            .iter()
            .filter(|d| d.kind == kind)
            .map(Declaration::reference)
            .collect()
    }

    fn levels(&self) -> Vec<Vec<&Declaration>> {
        let depth = self
            .declarations
            .iter()
            .map(|d| d.level + 1)
            .max()
            .unwrap_or(0);

        let mut levels: Vec<Vec<&Declaration>> = vec![Vec::new(); depth];
        for declaration in &self.declarations {
            levels[declaration.level].push(declaration);
        }
        levels
    }

    /// Create every declared resource, level by level
    pub async fn apply(&self, engine: &dyn ProvisioningEngine) -> ProvisionResult<ApplyReport> {
        let levels = self.levels();
        info!(
            engine = engine.name(),
            resources = self.declarations.len(),
            levels = levels.len(),
            "Applying stack"
        );

        for (depth, level) in levels.iter().enumerate() {
            debug!(level = depth, resources = level.len(), "Applying level");
            try_join_all(level.iter().map(|d| self.create(d, engine))).await?;
        }

        Ok(ApplyReport {
            resources: self.declarations.len(),
            levels: levels.len(),
        })
    }

    async fn create(&self, declaration: &Declaration, engine: &dyn ProvisioningEngine) -> ProvisionResult<()> {
        let properties = declaration.properties.resolve()?;
        let outputs = engine
            .create(ResolvedResource {
                name: declaration.name.clone(),
                kind: declaration.kind,
                properties,
            })
            .await?;

        info!(
            resource = %declaration.name,
            kind = %declaration.kind,
            id = outputs.id().unwrap_or_default(),
            "Resource created"
        );

        declaration
            .outputs
            .set(outputs)
            .map_err(|_| ProvisionError::provider(&declaration.name, "resource already created"))?;

        if let Some(condition) = &declaration.await_condition {
            info!(resource = %declaration.name, condition = %condition.describe(), "Waiting");
            condition.wait(engine, &declaration.reference()).await?;
        }

        Ok(())
    }

    /// Desired-state plan; unresolved values render as `<computed>`
    pub fn describe(&self) -> Vec<PlannedResource> {
        self.declarations
            .iter()
            .map(|d| PlannedResource {
                name: d.name.clone(),
                kind: d.kind,
                level: d.level,
                depends_on: d.dependencies.iter().cloned().collect(),
                properties: d.properties.preview(),
                awaits: d.await_condition.as_ref().map(|c| c.describe()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HostedZone, Hostname, PlacementZone};
    use crate::engine::{AccountContext, CertificateStatus, InMemoryEngine};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn vpc_and_subnet(stack: &mut Stack) -> (ResourceRef, ResourceRef) {
        let vpc = stack
            .declare(
                ResourceKind::Vpc,
                "shop-prod-vpc",
                Properties::new().set("cidrBlock", "10.0.0.0/16"),
            )
            .unwrap();
        let subnet = stack
            .declare(
                ResourceKind::Subnet,
                "shop-prod-public-1",
                Properties::new()
                    .set("cidrBlock", "10.0.0.0/23")
                    .set_deferred("vpcId", vpc.id()),
            )
            .unwrap();
        (vpc, subnet)
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        stack.declare(ResourceKind::Vpc, "x", Properties::new()).unwrap();

        assert_eq!(
            stack.declare(ResourceKind::Vpc, "x", Properties::new()).unwrap_err(),
            ProvisionError::provider("x", "duplicate resource name")
        );
    }

    #[test]
    fn test_describe_levels_and_computed() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        vpc_and_subnet(&mut stack);

        let plan = stack.describe();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].level, 0);
        assert_eq!(plan[1].level, 1);
        assert_eq!(plan[1].depends_on, vec!["shop-prod-vpc"]);
        assert_eq!(plan[1].properties["vpcId"], json!(COMPUTED));
        assert_eq!(plan[1].properties["cidrBlock"], json!("10.0.0.0/23"));
    }

    #[tokio::test]
    async fn test_apply_resolves_references() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let (vpc, subnet) = vpc_and_subnet(&mut stack);
        let engine = InMemoryEngine::new();

        let report = stack.apply(&engine).await.unwrap();
        assert_eq!(report, ApplyReport { resources: 2, levels: 2 });

        let created = engine.created().await;
        let vpc_id = vpc.id().resolve().unwrap();
        assert_eq!(created[1].properties["vpcId"], json!(vpc_id));
        assert!(subnet.id().resolve().unwrap().starts_with("subnet-"));
    }

    #[derive(Debug)]
    struct CountingCondition(Arc<AtomicUsize>);

    #[async_trait]
    impl AwaitCondition for CountingCondition {
        async fn wait(&self, _engine: &dyn ProvisioningEngine, _resource: &ResourceRef) -> ProvisionResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn describe(&self) -> String {
            "count".to_string()
        }
    }

    #[tokio::test]
    async fn test_await_condition_runs_once() {
        let waits = Arc::new(AtomicUsize::new(0));
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        stack
            .declare_awaiting(
                ResourceKind::Vpc,
                "shop-prod-vpc",
                Properties::new(),
                Arc::new(CountingCondition(waits.clone())),
            )
            .unwrap();

        assert_eq!(stack.describe()[0].awaits.as_deref(), Some("count"));
        stack.apply(&InMemoryEngine::new()).await.unwrap();
        assert_eq!(waits.load(Ordering::SeqCst), 1);
    }

    /// Fails creation of one named resource
    struct FailingEngine {
        inner: InMemoryEngine,
        fail: &'static str,
    }

    #[async_trait]
    impl ProvisioningEngine for FailingEngine {
        async fn availability_zones(&self) -> ProvisionResult<Vec<PlacementZone>> {
            self.inner.availability_zones().await
        }

        async fn lookup_hosted_zone(&self, name: &Hostname) -> ProvisionResult<HostedZone> {
            self.inner.lookup_hosted_zone(name).await
        }

        async fn account_context(&self) -> ProvisionResult<AccountContext> {
            self.inner.account_context().await
        }

        async fn create(&self, resource: ResolvedResource) -> ProvisionResult<ResourceOutputs> {
            if resource.name == self.fail {
                return Err(ProvisionError::provider(resource.name, "quota exceeded"));
            }
            self.inner.create(resource).await
        }

        async fn certificate_status(&self, arn: &str) -> ProvisionResult<CertificateStatus> {
            self.inner.certificate_status(arn).await
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_first_failure_aborts_later_levels() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        vpc_and_subnet(&mut stack);
        let engine = FailingEngine {
            inner: InMemoryEngine::new(),
            fail: "shop-prod-vpc",
        };

        let err = stack.apply(&engine).await.unwrap_err();
        assert_eq!(err, ProvisionError::provider("shop-prod-vpc", "quota exceeded"));
        assert!(engine.inner.created().await.is_empty());
    }
}
