// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory provisioning engine
//!
//! Deterministic stand-in for a real engine, used for dry runs and tests. It
//! records every resource it is asked to create and behaves like a cautious
//! certificate authority:
//!
//! - Validation options come back rotated relative to the request order
//! - Apex and wildcard names share one validation record, as real authorities do
//! - A certificate is issued only once every validation record exists with the
//!   expected value, and only after a configurable number of pending polls
//! - DNS records are keyed by name; overwriting needs `allowOverwrite`

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    AccountContext, CertificateStatus, ProvisioningEngine, ResolvedResource, ResourceOutputs,
};
use crate::certificate::validation::{ValidationRecord, VALIDATION_OPTIONS_KEY};
use crate::domain::{HostedZone, Hostname, PlacementZone, ResourceKind};
use crate::errors::{ProvisionError, ProvisionResult};

/// DNS record as stored by the in-memory engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDnsRecord {
    pub record_type: String,
    pub values: Vec<String>,
}

#[derive(Debug)]
struct PendingCertificate {
    name: String,
    expected: Vec<ValidationRecord>,
    polls: u32,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    created: Vec<ResolvedResource>,
    records: BTreeMap<String, MemoryDnsRecord>,
    certificates: BTreeMap<String, PendingCertificate>,
}

/// Deterministic in-memory engine
#[derive(Debug)]
pub struct InMemoryEngine {
    zones: Vec<PlacementZone>,
    hosted_zones: Option<Vec<Hostname>>,
    account: AccountContext,
    issue_after_polls: u32,
    certificate_failure: Option<String>,
    state: Mutex<MemoryState>,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    /// Engine with three zones that accepts any hosted zone
    pub fn new() -> Self {
        Self {
            zones: vec!["local-1a".into(), "local-1b".into(), "local-1c".into()],
            hosted_zones: None,
            account: AccountContext {
                account_id: "000000000000".to_string(),
                region: "local-1".to_string(),
            },
            issue_after_polls: 1,
            certificate_failure: None,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Replace the advertised placement zones
    pub fn with_zones<I, Z>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = Z>,
        Z: Into<PlacementZone>,
    {
        self.zones = zones.into_iter().map(Into::into).collect();
        self
    }

    /// Only resolve the listed hosted zones
    pub fn with_hosted_zones(mut self, zones: Vec<Hostname>) -> Self {
        self.hosted_zones = Some(zones);
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>, region: impl Into<String>) -> Self {
        self.account = AccountContext {
            account_id: account_id.into(),
            region: region.into(),
        };
        self
    }

    /// Number of `Pending` answers once validation records are in place
    pub fn issue_after_polls(mut self, polls: u32) -> Self {
        self.issue_after_polls = polls;
        self
    }

    /// Fail every certificate status query with `reason`
    pub fn with_certificate_failure(mut self, reason: impl Into<String>) -> Self {
        self.certificate_failure = Some(reason.into());
        self
    }

    /// Every resource created so far, in creation order
    pub async fn created(&self) -> Vec<ResolvedResource> {
        self.state.lock().await.created.clone()
    }

    /// Created resources of one kind
    pub async fn created_of(&self, kind: ResourceKind) -> Vec<ResolvedResource> {
        self.state
            .lock()
            .await
            .created
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    /// DNS records currently stored, keyed by record name
    pub async fn dns_records(&self) -> BTreeMap<String, MemoryDnsRecord> {
        self.state.lock().await.records.clone()
    }

    fn arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:aws:{}:{}:{}:{}",
            service, self.account.region, self.account.account_id, resource
        )
    }

    fn validation_option(domain: &str) -> ValidationRecord {
        let base = domain.trim_start_matches("*.");
        ValidationRecord {
            domain_name: domain.to_string(),
            resource_record_name: format!("_{}.{}.", token(base), base),
            resource_record_type: "CNAME".to_string(),
            resource_record_value: format!("_{}.acm-validations.aws.", token(&format!("v:{}", base))),
        }
    }

    fn request_certificate(
        &self,
        state: &mut MemoryState,
        resource: &ResolvedResource,
        arn: &str,
    ) -> ProvisionResult<Value> {
        let primary = resource.str_property("domainName")?;
        let mut domains = vec![primary.to_string()];
        if let Some(alternates) = resource.properties.get("subjectAlternativeNames") {
            let alternates = alternates.as_array().ok_or_else(|| {
                ProvisionError::provider(&resource.name, "subjectAlternativeNames must be an array")
            })?;
            for alternate in alternates.iter().filter_map(Value::as_str) {
                if !domains.iter().any(|d| d == alternate) {
                    domains.push(alternate.to_string());
                }
            }
        }

        let expected: Vec<ValidationRecord> =
            domains.iter().map(|d| Self::validation_option(d)).collect();

        let mut reported = expected.clone();
        if reported.len() > 1 {
            reported.rotate_left(1);
        }

        state.certificates.insert(
            arn.to_string(),
            PendingCertificate {
                name: resource.name.clone(),
                expected,
                polls: 0,
            },
        );

        serde_json::to_value(reported)
            .map_err(|e| ProvisionError::provider(&resource.name, e.to_string()))
    }

    fn upsert_record(state: &mut MemoryState, resource: &ResolvedResource) -> ProvisionResult<String> {
        let name = resource.str_property("name")?.trim_end_matches('.').to_string();
        let record_type = resource.str_property("type")?.to_string();

        let values: Vec<String> = match resource.properties.get("aliases") {
            Some(aliases) => aliases
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|alias| alias.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            None => resource
                .properties
                .get("records")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
        };

        if values.is_empty() {
            return Err(ProvisionError::provider(&resource.name, "DNS record has no values"));
        }

        if state.records.contains_key(&name) && !resource.flag("allowOverwrite") {
            return Err(ProvisionError::provider(
                &resource.name,
                format!("record '{}' already exists and allowOverwrite is not set", name),
            ));
        }

        state.records.insert(name.clone(), MemoryDnsRecord { record_type, values });
        Ok(name)
    }

    fn outputs_for(
        &self,
        state: &mut MemoryState,
        resource: &ResolvedResource,
        serial: u64,
    ) -> ProvisionResult<ResourceOutputs> {
        let name = resource.name.as_str();
        let region = self.account.region.as_str();

        let outputs = match resource.kind {
            ResourceKind::Vpc => ResourceOutputs::with_id(format!("vpc-{:08x}", serial)),
            ResourceKind::InternetGateway => ResourceOutputs::with_id(format!("igw-{:08x}", serial)),
            ResourceKind::Subnet => ResourceOutputs::with_id(format!("subnet-{:08x}", serial)),
            ResourceKind::ElasticIp => ResourceOutputs::with_id(format!("eipalloc-{:08x}", serial))
                .with("publicIp", format!("198.51.100.{}", serial % 254 + 1)),
            ResourceKind::NatGateway => ResourceOutputs::with_id(format!("nat-{:08x}", serial)),
            ResourceKind::RouteTable => ResourceOutputs::with_id(format!("rtb-{:08x}", serial)),
            ResourceKind::Route => ResourceOutputs::with_id(format!("r-{:08x}", serial)),
            ResourceKind::RouteTableAssociation => {
                ResourceOutputs::with_id(format!("rtbassoc-{:08x}", serial))
            }
            ResourceKind::SecurityGroup => ResourceOutputs::with_id(format!("sg-{:08x}", serial)),
            ResourceKind::SecurityGroupRule => ResourceOutputs::with_id(format!("sgr-{:08x}", serial)),
            ResourceKind::Certificate => {
                let arn = self.arn("acm", &format!("certificate/{:08x}", serial));
                let options = self.request_certificate(state, resource, &arn)?;
                ResourceOutputs::with_id(arn.clone())
                    .with(ResourceOutputs::ARN, arn)
                    .with(VALIDATION_OPTIONS_KEY, options)
            }
            ResourceKind::CertificateValidation => {
                let arn = resource.str_property("certificateArn")?.to_string();
                if !state.certificates.contains_key(&arn) {
                    return Err(ProvisionError::provider(name, format!("unknown certificate '{}'", arn)));
                }
                ResourceOutputs::with_id(format!("certval-{:08x}", serial)).with("certificateArn", arn)
            }
            ResourceKind::DnsRecord => {
                let fqdn = Self::upsert_record(state, resource)?;
                ResourceOutputs::with_id(format!("record-{:08x}", serial)).with("fqdn", fqdn)
            }
            ResourceKind::LoadBalancer => {
                let arn = self.arn(
                    "elasticloadbalancing",
                    &format!("loadbalancer/app/{}/{:08x}", name, serial),
                );
                ResourceOutputs::with_id(arn.clone())
                    .with(ResourceOutputs::ARN, arn)
                    .with("dnsName", format!("{}-{:08x}.{}.elb.local", name, serial, region))
                    .with("zoneId", "ZMEMORYELB0000")
            }
            ResourceKind::TargetGroup => {
                let arn = self.arn(
                    "elasticloadbalancing",
                    &format!("targetgroup/{}/{:08x}", name, serial),
                );
                ResourceOutputs::with_id(arn.clone()).with(ResourceOutputs::ARN, arn)
            }
            ResourceKind::Listener | ResourceKind::ListenerRule => {
                let arn = self.arn(
                    "elasticloadbalancing",
                    &format!("{}/app/{}/{:08x}", resource.kind, name, serial),
                );
                ResourceOutputs::with_id(arn.clone()).with(ResourceOutputs::ARN, arn)
            }
            ResourceKind::DbSubnetGroup => ResourceOutputs::with_id(name.to_string()),
            ResourceKind::DbInstance => {
                let port = resource
                    .properties
                    .get("port")
                    .and_then(Value::as_u64)
                    .unwrap_or(5432);
                let address = format!("{}.{:08x}.{}.rds.local", name, serial, region);
                let secret = self.arn("secretsmanager", &format!("secret:rds!db-{:08x}", serial));
                ResourceOutputs::with_id(format!("db-{:08x}", serial))
                    .with(ResourceOutputs::ARN, self.arn("rds", &format!("db:{}", name)))
                    .with("address", address.clone())
                    .with("endpoint", format!("{}:{}", address, port))
                    .with("port", port)
                    .with("masterUserSecretArn", secret)
            }
            ResourceKind::Secret => {
                let secret_name = resource.str_property("name").unwrap_or(name).to_string();
                let arn = self.arn("secretsmanager", &format!("secret:{}-{:06x}", secret_name, serial));
                ResourceOutputs::with_id(arn.clone())
                    .with(ResourceOutputs::ARN, arn)
                    .with("name", secret_name)
            }
            ResourceKind::ContainerCluster => {
                let arn = self.arn("ecs", &format!("cluster/{}", name));
                ResourceOutputs::with_id(arn.clone()).with(ResourceOutputs::ARN, arn)
            }
            ResourceKind::IamRole => ResourceOutputs::with_id(name.to_string())
                .with(ResourceOutputs::ARN, format!("arn:aws:iam::{}:role/{}", self.account.account_id, name)),
            ResourceKind::IamRolePolicyAttachment | ResourceKind::IamRolePolicy => {
                ResourceOutputs::with_id(format!("{}-{:08x}", name, serial))
            }
            ResourceKind::IamInstanceProfile => ResourceOutputs::with_id(name.to_string()).with(
                ResourceOutputs::ARN,
                format!("arn:aws:iam::{}:instance-profile/{}", self.account.account_id, name),
            ),
            ResourceKind::ImageRepository => {
                let repository = resource.str_property("name").unwrap_or(name).to_string();
                ResourceOutputs::with_id(repository.clone())
                    .with(ResourceOutputs::ARN, self.arn("ecr", &format!("repository/{}", repository)))
                    .with(
                        "repositoryUrl",
                        format!("{}.dkr.ecr.{}.local/{}", self.account.account_id, region, repository),
                    )
            }
            ResourceKind::Instance => ResourceOutputs::with_id(format!("i-{:08x}", serial))
                .with("privateIp", format!("10.255.0.{}", serial % 254 + 1)),
        };

        Ok(outputs)
    }
}

#[async_trait]
impl ProvisioningEngine for InMemoryEngine {
    async fn availability_zones(&self) -> ProvisionResult<Vec<PlacementZone>> {
        Ok(self.zones.clone())
    }

    async fn lookup_hosted_zone(&self, name: &Hostname) -> ProvisionResult<HostedZone> {
        if let Some(known) = &self.hosted_zones {
            if !known.contains(name) {
                return Err(ProvisionError::provider(
                    name.as_str(),
                    "hosted zone not found",
                ));
            }
        }

        Ok(HostedZone {
            zone_id: format!("Z{}", token(name.as_str()).to_uppercase()),
            name: name.clone(),
        })
    }

    async fn account_context(&self) -> ProvisionResult<AccountContext> {
        Ok(self.account.clone())
    }

    async fn create(&self, resource: ResolvedResource) -> ProvisionResult<ResourceOutputs> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let serial = state.next_id;

        let outputs = self.outputs_for(&mut state, &resource, serial)?;
        debug!(
            engine = "in-memory",
            resource = %resource.name,
            kind = %resource.kind,
            id = outputs.id().unwrap_or_default(),
            "Created resource"
        );

        state.created.push(resource);
        Ok(outputs)
    }

    async fn certificate_status(&self, arn: &str) -> ProvisionResult<CertificateStatus> {
        if let Some(reason) = &self.certificate_failure {
            return Ok(CertificateStatus::Failed(reason.clone()));
        }

        let mut state = self.state.lock().await;
        let MemoryState {
            records,
            certificates,
            ..
        } = &mut *state;

        let certificate = certificates
            .get_mut(arn)
            .ok_or_else(|| ProvisionError::provider(arn, "unknown certificate"))?;

        let validated = certificate.expected.iter().all(|expected| {
            records
                .get(expected.resource_record_name.trim_end_matches('.'))
                .map(|record| {
                    record.record_type == expected.resource_record_type
                        && record.values.contains(&expected.resource_record_value)
                })
                .unwrap_or(false)
        });

        if !validated {
            debug!(certificate = %certificate.name, "Validation records not yet observed");
            return Ok(CertificateStatus::Pending);
        }

        certificate.polls += 1;
        if certificate.polls > self.issue_after_polls {
            Ok(CertificateStatus::Issued)
        } else {
            Ok(CertificateStatus::Pending)
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Short stable token (FNV-1a) used for deterministic identifiers
fn token(input: &str) -> String {
    let hash = input.bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    format!("{:016x}", hash)
}

/// Build a resolved resource from a JSON object literal
#[cfg(test)]
pub(crate) fn resolved(name: &str, kind: ResourceKind, properties: Value) -> ResolvedResource {
    ResolvedResource {
        name: name.to_string(),
        kind,
        properties: properties.as_object().cloned().unwrap_or_default(),
    }
}
