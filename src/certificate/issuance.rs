// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bounded wait for certificate issuance
//!
//! The only intentional suspension point of a provisioning run. The engine is
//! polled at a fixed interval until the authority reports the certificate
//! issued, reports it failed, or the timeout elapses. Nothing is retried
//! beyond that window.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::lifecycle::CertificateLifecycle;
use super::validation::VALIDATION_OPTIONS_KEY;
use crate::deferred::Deferred;
use crate::engine::{CertificateStatus, ProvisioningEngine};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::stack::{reference::require_outputs, AwaitCondition, ResourceRef};

/// How long and how often to poll for issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(45 * 60),
            interval: Duration::from_secs(15),
        }
    }
}

/// Poll until `arn` is issued
///
/// Fails with `Provider` naming `resource` if the authority reports failure
/// or the timeout elapses first.
pub async fn await_issuance(
    engine: &dyn ProvisioningEngine,
    resource: &str,
    arn: &str,
    policy: PollPolicy,
) -> ProvisionResult<()> {
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match engine.certificate_status(arn).await? {
            CertificateStatus::Issued => {
                info!(resource = %resource, attempt, "Certificate issued");
                return Ok(());
            }
            CertificateStatus::Failed(reason) => {
                warn!(resource = %resource, reason = %reason, "Certificate issuance failed");
                return Err(ProvisionError::provider(
                    resource,
                    format!("certificate issuance failed: {}", reason),
                ));
            }
            CertificateStatus::Pending => {
                let now = Instant::now();
                if now >= deadline {
                    warn!(resource = %resource, attempt, "Timed out waiting for issuance");
                    return Err(ProvisionError::provider(
                        resource,
                        format!(
                            "certificate not issued within {}s ({} polls)",
                            policy.timeout.as_secs(),
                            attempt
                        ),
                    ));
                }

                let delay = policy.interval.min(deadline - now);
                debug!(
                    resource = %resource,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Certificate pending validation"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Moves the lifecycle to `PendingValidation` once the certificate exists
#[derive(Debug)]
pub struct OptionsReceived {
    lifecycle: CertificateLifecycle,
}

impl OptionsReceived {
    pub fn new(lifecycle: CertificateLifecycle) -> Self {
        Self { lifecycle }
    }

    fn certificate_arn(resource: &ResourceRef) -> ProvisionResult<String> {
        let outputs = require_outputs(resource)?;
        if outputs.get(VALIDATION_OPTIONS_KEY).is_none() {
            return Err(ProvisionError::provider(
                resource.name(),
                "authority returned no validation options",
            ));
        }
        resource.arn().resolve()
    }
}

/// Move `lifecycle` to `Failed` with the error that stopped it
fn reject(lifecycle: &CertificateLifecycle, error: &ProvisionError) {
    if let Err(stuck) = lifecycle.rejected(error.to_string()) {
        warn!(certificate = %lifecycle.certificate(), error = %stuck, "Lifecycle already terminal");
    }
}

#[async_trait]
impl AwaitCondition for OptionsReceived {
    async fn wait(&self, _engine: &dyn ProvisioningEngine, resource: &ResourceRef) -> ProvisionResult<()> {
        let outcome = Self::certificate_arn(resource).and_then(|arn| self.lifecycle.options_returned(arn));
        if let Err(e) = &outcome {
            reject(&self.lifecycle, e);
        }
        outcome
    }

    fn describe(&self) -> String {
        "certificate validation options".to_string()
    }
}

/// Blocks dependents until the certificate is issued
#[derive(Debug)]
pub struct IssuanceWait {
    lifecycle: CertificateLifecycle,
    certificate_arn: Deferred<String>,
    record_fqdns: Deferred<Vec<String>>,
    policy: PollPolicy,
}

impl IssuanceWait {
    pub fn new(
        lifecycle: CertificateLifecycle,
        certificate_arn: Deferred<String>,
        record_fqdns: Deferred<Vec<String>>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            lifecycle,
            certificate_arn,
            record_fqdns,
            policy,
        }
    }

    async fn issue(&self, engine: &dyn ProvisioningEngine) -> ProvisionResult<()> {
        let records = self.record_fqdns.resolve()?;
        self.lifecycle.records_upserted(records.len())?;

        let arn = self.certificate_arn.resolve()?;
        await_issuance(engine, self.lifecycle.certificate(), &arn, self.policy).await?;
        self.lifecycle.confirmed()
    }
}

#[async_trait]
impl AwaitCondition for IssuanceWait {
    async fn wait(&self, engine: &dyn ProvisioningEngine, _resource: &ResourceRef) -> ProvisionResult<()> {
        let outcome = self.issue(engine).await;
        if let Err(e) = &outcome {
            reject(&self.lifecycle, e);
        }
        outcome
    }

    fn describe(&self) -> String {
        format!(
            "certificate issuance (timeout {}s, every {}s)",
            self.policy.timeout.as_secs(),
            self.policy.interval.as_secs()
        )
    }
}
