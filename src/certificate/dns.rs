// Copyright (c) 2025 - Cowboy AI, Inc.
//! DNS records owned by the edge stack
//!
//! Two kinds of records land in the hosted zone: one validation record per
//! requested certificate domain, and one `A` alias per public service name
//! pointing at the edge router.

use serde_json::{json, Value};

use super::validation::ValidationRecord;
use crate::deferred::{apply2, Deferred};
use crate::domain::{HostedZone, Hostname, ResourceKind};
use crate::errors::ProvisionResult;
use crate::stack::{Properties, ResourceRef, Stack};

/// Time-to-live of validation records, in seconds
pub const VALIDATION_RECORD_TTL: u32 = 60;

/// Output key carrying the fully-qualified name of a record
pub const FQDN_KEY: &str = "fqdn";

/// Upsert the validation record for `domain`, the `index`-th requested name
///
/// `record` resolves to the triple matched for this domain; overwriting is
/// allowed because apex and wildcard names share a record. The index keeps
/// names apart when two domains reduce to the same slug.
pub fn declare_validation_record(
    stack: &mut Stack,
    zone: &HostedZone,
    index: usize,
    domain: &Hostname,
    record: Deferred<ValidationRecord>,
) -> ProvisionResult<ResourceRef> {
    let name = stack.scope().name(&format!("cert-val-{}-{}", index, domain.slug()));

    stack.declare(
        ResourceKind::DnsRecord,
        name,
        Properties::new()
            .set("zoneId", zone.zone_id.as_str())
            .set_deferred("name", record.clone().map(|r| r.resource_record_name))
            .set_deferred("type", record.clone().map(|r| r.resource_record_type))
            .set_deferred(
                "records",
                record.map(|r| Value::Array(vec![Value::String(r.resource_record_value)])),
            )
            .set("ttl", VALIDATION_RECORD_TTL)
            .set("allowOverwrite", true),
    )
}

/// Point `hostname` at a load balancer with an `A` alias
pub fn declare_alias_record(
    stack: &mut Stack,
    zone: &HostedZone,
    service: &str,
    hostname: &Hostname,
    target_dns_name: Deferred<String>,
    target_zone_id: Deferred<String>,
) -> ProvisionResult<ResourceRef> {
    let name = stack.scope().name(&format!("{}-alias-record", service));

    let aliases = apply2(target_dns_name, target_zone_id, |dns_name, zone_id| {
        json!([{
            "name": dns_name,
            "zoneId": zone_id,
            "evaluateTargetHealth": true,
        }])
    });

    stack.declare(
        ResourceKind::DnsRecord,
        name,
        Properties::new()
            .set("zoneId", zone.zone_id.as_str())
            .set("name", hostname.as_str())
            .set("type", "A")
            .set_deferred("aliases", aliases),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryEngine;
    use crate::naming::NameScope;

    fn zone() -> HostedZone {
        HostedZone {
            zone_id: "Z1".to_string(),
            name: Hostname::new("example.com").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_alias_record_points_at_target() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let api = Hostname::new("api.example.com").unwrap();
        let record = declare_alias_record(
            &mut stack,
            &zone(),
            "backend",
            &api,
            Deferred::known("alb-1.elb.local".to_string()),
            Deferred::known("ZELB".to_string()),
        )
        .unwrap();
        assert_eq!(record.name(), "shop-prod-backend-alias-record");

        let engine = InMemoryEngine::new();
        stack.apply(&engine).await.unwrap();

        let created = engine.created().await;
        assert_eq!(created[0].properties["type"], json!("A"));
        assert_eq!(created[0].properties["aliases"][0]["evaluateTargetHealth"], json!(true));
        assert_eq!(
            engine.dns_records().await["api.example.com"].values,
            vec!["alb-1.elb.local".to_string()]
        );
    }

    fn option(domain: &str) -> Deferred<ValidationRecord> {
        Deferred::known(ValidationRecord {
            domain_name: domain.into(),
            resource_record_name: format!("_x.{}.", domain),
            resource_record_type: "CNAME".into(),
            resource_record_value: "_y.acm.".into(),
        })
    }

    #[test]
    fn test_validation_record_name_uses_slug() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let wildcard = Hostname::new("*.example.com").unwrap();
        let record = declare_validation_record(
            &mut stack,
            &zone(),
            3,
            &wildcard,
            Deferred::known(ValidationRecord {
                domain_name: "*.example.com".into(),
                resource_record_name: "_x.example.com.".into(),
                resource_record_type: "CNAME".into(),
                resource_record_value: "_y.acm.".into(),
            }),
        )
        .unwrap();

        assert_eq!(record.name(), "shop-prod-cert-val-3-wildcard-example-com");
        let plan = stack.describe();
        assert_eq!(plan[0].properties["ttl"], json!(60));
        assert_eq!(plan[0].properties["records"], json!(["_y.acm."]));
    }

    #[test]
    fn test_colliding_slugs_get_distinct_names() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let dotted = Hostname::new("www.example.com").unwrap();
        let dashed = Hostname::new("www-example.com").unwrap();
        assert_eq!(dotted.slug(), dashed.slug());

        let first = declare_validation_record(&mut stack, &zone(), 1, &dotted, option("www.example.com")).unwrap();
        let second = declare_validation_record(&mut stack, &zone(), 2, &dashed, option("www-example.com")).unwrap();

        assert_ne!(first.name(), second.name());
        assert_eq!(stack.len(), 2);
    }
}
