// Copyright (c) 2025 - Cowboy AI, Inc.
//! Validation record matching
//!
//! The issuing authority answers a certificate request with one validation
//! record per requested domain, in no guaranteed order. Records are always
//! correlated to domains through their `domainName` field, never by position.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Hostname;
use crate::errors::{ProvisionError, ProvisionResult};

/// Output key under which the engine reports validation options
pub const VALIDATION_OPTIONS_KEY: &str = "domainValidationOptions";

/// DNS record the authority requires as proof of domain ownership
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRecord {
    pub domain_name: String,
    pub resource_record_name: String,
    pub resource_record_type: String,
    pub resource_record_value: String,
}

impl ValidationRecord {
    fn is_complete(&self) -> bool {
        !self.resource_record_name.is_empty()
            && !self.resource_record_type.is_empty()
            && !self.resource_record_value.is_empty()
    }

    fn covers(&self, domain: &Hostname) -> bool {
        self.domain_name
            .trim_end_matches('.')
            .eq_ignore_ascii_case(domain.as_str())
    }
}

/// Decode the validation options reported for a certificate
pub fn parse_validation_options(certificate: &str, value: &Value) -> ProvisionResult<Vec<ValidationRecord>> {
    serde_json::from_value(value.clone()).map_err(|e| {
        ProvisionError::provider(certificate, format!("malformed validation options: {}", e))
    })
}

/// Find the validation record issued for `domain`
///
/// Fails with `ValidationRecord` naming the domain when the authority returned
/// nothing for it, or returned a record with an empty name, type or value.
pub fn match_validation_record(
    domain: &Hostname,
    records: &[ValidationRecord],
) -> ProvisionResult<ValidationRecord> {
    records
        .iter()
        .find(|record| record.covers(domain))
        .filter(|record| record.is_complete())
        .cloned()
        .ok_or_else(|| ProvisionError::validation_record(domain.as_str()))
}
