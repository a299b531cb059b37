// Copyright (c) 2025 - Cowboy AI, Inc.
//! Certificate Lifecycle State Machine
//!
//! # States
//!
//! - Requested: certificate requested for a fixed set of domains
//! - PendingValidation: authority answered with validation options
//! - RecordsCreated: one validation record upserted per requested domain
//! - Issued: authority confirmed every record (terminal)
//! - Failed: authority gave up (terminal)
//!
//! # Inputs
//!
//! - OptionsReturned: Requested → PendingValidation
//! - RecordsUpserted: PendingValidation → RecordsCreated, only with exactly
//!   one record per requested domain
//! - Confirmed: RecordsCreated → Issued
//! - Rejected: any non-terminal state → Failed

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::errors::{ProvisionError, ProvisionResult};
use crate::state_machine::{StateMachine, StateMachineWithHistory, TransitionError, TransitionResult};

/// Lifecycle state of a requested certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CertificateState {
    Requested { domains: usize },
    PendingValidation { domains: usize, arn: String },
    RecordsCreated { arn: String },
    Issued { arn: String },
    Failed { reason: String },
}

/// Lifecycle input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateInput {
    OptionsReturned { arn: String },
    RecordsUpserted { count: usize },
    Confirmed,
    Rejected { reason: String },
}

impl StateMachine for CertificateState {
    type Input = CertificateInput;
    type Output = ();

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, ())> {
        use CertificateInput::*;
        use CertificateState::*;

        match (self, input) {
            (Requested { domains }, OptionsReturned { arn }) => Ok((
                PendingValidation {
                    domains: *domains,
                    arn: arn.clone(),
                },
                (),
            )),
            (PendingValidation { domains, arn }, RecordsUpserted { count }) => {
                if count == domains {
                    Ok((RecordsCreated { arn: arn.clone() }, ()))
                } else {
                    Err(TransitionError::PreconditionFailed(format!(
                        "{} validation records upserted for {} requested domains",
                        count, domains
                    )))
                }
            }
            (RecordsCreated { arn }, Confirmed) => Ok((Issued { arn: arn.clone() }, ())),
            (state, Rejected { reason }) if !state.is_terminal() => Ok((
                Failed {
                    reason: reason.clone(),
                },
                (),
            )),
            (state, input) => Err(TransitionError::invalid(state, format!("{:?}", input))),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Issued { .. } | Self::Failed { .. })
    }
}

/// Shared handle to one certificate's lifecycle
///
/// Cloned into the await conditions that drive it during apply.
#[derive(Debug, Clone)]
pub struct CertificateLifecycle {
    certificate: String,
    machine: Arc<Mutex<StateMachineWithHistory<CertificateState>>>,
}

impl CertificateLifecycle {
    /// Start a lifecycle for a certificate covering `domains` names
    pub fn requested(certificate: impl Into<String>, domains: usize) -> Self {
        Self {
            certificate: certificate.into(),
            machine: Arc::new(Mutex::new(StateMachineWithHistory::new(
                CertificateState::Requested { domains },
            ))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateMachineWithHistory<CertificateState>> {
        self.machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, input: CertificateInput) -> ProvisionResult<()> {
        let mut machine = self.lock();
        machine
            .transition_with_history(input, Utc::now())
            .map_err(|e| ProvisionError::provider(&self.certificate, e.to_string()))?;
        debug!(certificate = %self.certificate, state = ?machine.current_state(), "Certificate transition");
        Ok(())
    }

    pub fn options_returned(&self, arn: impl Into<String>) -> ProvisionResult<()> {
        self.apply(CertificateInput::OptionsReturned { arn: arn.into() })
    }

    pub fn records_upserted(&self, count: usize) -> ProvisionResult<()> {
        self.apply(CertificateInput::RecordsUpserted { count })
    }

    pub fn confirmed(&self) -> ProvisionResult<()> {
        self.apply(CertificateInput::Confirmed)
    }

    pub fn rejected(&self, reason: impl Into<String>) -> ProvisionResult<()> {
        self.apply(CertificateInput::Rejected {
            reason: reason.into(),
        })
    }

    /// Name of the certificate resource
    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub fn state(&self) -> CertificateState {
        self.lock().current_state().clone()
    }

    /// Accepted transitions as `(from, to, at)`
    pub fn transitions(&self) -> Vec<(CertificateState, CertificateState, DateTime<Utc>)> {
        self.lock()
            .get_history()
            .iter()
            .map(|t| (t.from.clone(), t.to.clone(), t.timestamp))
            .collect()
    }

    pub fn is_issued(&self) -> bool {
        matches!(self.state(), CertificateState::Issued { .. })
    }
}
