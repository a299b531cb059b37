// Copyright (c) 2025 - Cowboy AI, Inc.

//! Certificate & DNS Validator
//!
//! Requests one multi-domain TLS certificate and drives it through DNS
//! validation to an issued state the edge router can bind to.
//!
//! # Workflow
//!
//! ```text
//! Requested ──options──> PendingValidation ──N+1 records──> RecordsCreated ──poll──> Issued
//! ```
//!
//! 1. Request a certificate covering the primary and alternate domains
//! 2. For each requested domain, find its validation record in the
//!    authority's answer by domain name (the answer order is arbitrary)
//! 3. Upsert one DNS record per domain in the owning hosted zone
//! 4. Wait, bounded, until the authority confirms every record
//!
//! A domain missing from the answer fails the run with `ValidationRecord`
//! naming it. Nothing is retried; the caller re-runs the whole workflow.

pub mod dns;
pub mod issuance;
pub mod lifecycle;
pub mod validation;

pub use dns::{declare_alias_record, declare_validation_record};
pub use issuance::{await_issuance, IssuanceWait, OptionsReceived, PollPolicy};
pub use lifecycle::{CertificateLifecycle, CertificateState};
pub use validation::{match_validation_record, parse_validation_options, ValidationRecord};

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::deferred::{all, Deferred};
use crate::domain::{HostedZone, Hostname, ResourceKind};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::stack::{Properties, ResourceRef, Stack};

/// Domains a certificate must cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRequest {
    primary: Hostname,
    alternates: Vec<Hostname>,
}

impl CertificateRequest {
    /// Fails with `Config` if any domain is requested twice
    pub fn new(primary: Hostname, alternates: Vec<Hostname>) -> ProvisionResult<Self> {
        let mut seen = vec![&primary];
        for alternate in &alternates {
            if seen.contains(&alternate) {
                return Err(ProvisionError::config(
                    "certificate.domains",
                    format!("'{}' is requested more than once", alternate),
                ));
            }
            seen.push(alternate);
        }

        Ok(Self { primary, alternates })
    }

    /// Apex, `www.` and, optionally, `*.` names of a hosted zone
    pub fn for_zone(zone: &Hostname, include_wildcard: bool) -> ProvisionResult<Self> {
        let invalid = |e: crate::domain::HostnameError| {
            ProvisionError::config("hostedZoneName", e.to_string())
        };

        let mut alternates = vec![zone.prefixed("www").map_err(invalid)?];
        if include_wildcard {
            alternates.push(zone.wildcard().map_err(invalid)?);
        }
        Self::new(zone.clone(), alternates)
    }

    pub fn primary(&self) -> &Hostname {
        &self.primary
    }

    pub fn alternates(&self) -> &[Hostname] {
        &self.alternates
    }

    /// Every requested domain, primary first
    pub fn domains(&self) -> impl Iterator<Item = &Hostname> {
        std::iter::once(&self.primary).chain(self.alternates.iter())
    }

    /// Number of validation records the request needs
    pub fn domain_count(&self) -> usize {
        1 + self.alternates.len()
    }
}

/// Certificate declared together with its validation records
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: ResourceRef,
    pub records: Vec<ResourceRef>,
    pub validation: ResourceRef,
    pub lifecycle: CertificateLifecycle,
}

impl IssuedCertificate {
    /// ARN of the issued certificate; resolves only after validation
    pub fn arn(&self) -> Deferred<String> {
        self.validation.output_str("certificateArn")
    }
}

/// Declares a certificate and its DNS validation into a hosted zone
#[derive(Debug, Clone)]
pub struct CertificateValidator {
    zone: HostedZone,
    policy: PollPolicy,
}

impl CertificateValidator {
    pub fn new(zone: HostedZone, policy: PollPolicy) -> Self {
        Self { zone, policy }
    }

    pub fn declare(&self, stack: &mut Stack, request: &CertificateRequest) -> ProvisionResult<IssuedCertificate> {
        let scope = stack.scope().clone();
        let name = scope.name("cert");
        let lifecycle = CertificateLifecycle::requested(&name, request.domain_count());

        let alternates: Vec<String> = request.alternates().iter().map(|h| h.to_string()).collect();
        let certificate = stack.declare_awaiting(
            ResourceKind::Certificate,
            &name,
            Properties::new()
                .set("domainName", request.primary().as_str())
                .set("subjectAlternativeNames", alternates)
                .set("validationMethod", "DNS")
                .tags(scope.tags(&name)),
            Arc::new(OptionsReceived::new(lifecycle.clone())),
        )?;

        let certificate_name = name.clone();
        let options = certificate
            .output_value(validation::VALIDATION_OPTIONS_KEY)
            .and_then(move |value| parse_validation_options(&certificate_name, &value));

        let records = request
            .domains()
            .enumerate()
            .map(|(index, domain)| {
                let wanted = domain.clone();
                let record = options
                    .clone()
                    .and_then(move |records| match_validation_record(&wanted, &records));
                declare_validation_record(stack, &self.zone, index + 1, domain, record)
            })
            .collect::<ProvisionResult<Vec<_>>>()?;

        let fqdns = all(records.iter().map(|r| r.output_str(dns::FQDN_KEY)).collect());
        let validation = stack.declare_awaiting(
            ResourceKind::CertificateValidation,
            scope.name("cert-validation"),
            Properties::new()
                .set_deferred("certificateArn", certificate.arn())
                .set_deferred("validationRecordFqdns", fqdns.clone()),
            Arc::new(IssuanceWait::new(
                lifecycle.clone(),
                certificate.arn(),
                fqdns,
                self.policy,
            )),
        )?;

        info!(
            certificate = %name,
            primary = %request.primary(),
            domains = request.domain_count(),
            zone = %self.zone.name,
            "Declared certificate validation"
        );

        Ok(IssuedCertificate {
            certificate,
            records,
            validation,
            lifecycle,
        })
    }
}
