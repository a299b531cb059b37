// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge router builder
//!
//! One internet-facing load balancer shared by both services:
//!
//! ```text
//!               ┌─ :80  ── redirect 301 ──> :443
//! edge-alb ─────┤
//!               └─ :443 ── TLS (issued cert)
//!                     ├─ priority 10: host ∈ frontend names ──> fe-tg
//!                     ├─ priority 20: host ∈ backend names  ──> be-tg
//!                     └─ default: fixed 200 response
//! ```
//!
//! Rule priorities are unique per listener and lower values are evaluated
//! first. A duplicate priority fails the build before anything is declared.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

use crate::deferred::Deferred;
use crate::domain::{Hostname, ResourceKind};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::security::{HTTPS_PORT, HTTP_PORT};
use crate::stack::{Properties, ResourceRef, Stack};

/// TLS negotiation policy of the secure listener
pub const SSL_POLICY: &str = "ELBSecurityPolicy-TLS13-1-2-2021-06";

/// Body served by the secure listener before any service is attached
pub const DEFAULT_RESPONSE_BODY: &str = "base deployed (services not deployed yet)";

/// Highest priority a listener accepts
pub const MAX_PRIORITY: u16 = 50_000;

/// Fixed health-check policy of every target group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckPolicy {
    pub interval_seconds: u32,
    pub timeout_seconds: u32,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub matcher: &'static str,
}

pub const HEALTH_CHECK: HealthCheckPolicy = HealthCheckPolicy {
    interval_seconds: 30,
    timeout_seconds: 5,
    healthy_threshold: 2,
    unhealthy_threshold: 2,
    matcher: "200-399",
};

/// Host-based dispatch rule for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRule {
    /// Service name used in rule names, e.g. `frontend`
    pub service: String,
    /// Short name used in target-group names, e.g. `fe`
    pub target_slug: String,
    pub hostnames: Vec<Hostname>,
    pub target_port: u16,
    pub health_check_path: String,
    pub priority: u16,
}

impl HostRule {
    pub fn frontend(hostname: Hostname, target_port: u16, priority: u16) -> Self {
        Self {
            service: "frontend".to_string(),
            target_slug: "fe".to_string(),
            hostnames: vec![hostname],
            target_port,
            health_check_path: "/health".to_string(),
            priority,
        }
    }

    pub fn backend(hostname: Hostname, target_port: u16, priority: u16) -> Self {
        Self {
            service: "backend".to_string(),
            target_slug: "be".to_string(),
            hostnames: vec![hostname],
            target_port,
            health_check_path: "/health".to_string(),
            priority,
        }
    }

    fn validate(&self) -> ProvisionResult<()> {
        let parameter = format!("edge.rules.{}", self.service);
        if self.hostnames.is_empty() {
            return Err(ProvisionError::config(parameter, "at least one hostname is required"));
        }
        if self.priority == 0 || self.priority > MAX_PRIORITY {
            return Err(ProvisionError::config(
                parameter,
                format!("priority {} outside 1..={}", self.priority, MAX_PRIORITY),
            ));
        }
        if self.target_port == 0 {
            return Err(ProvisionError::config(parameter, "target port must be non-zero"));
        }
        if !self.health_check_path.starts_with('/') {
            return Err(ProvisionError::config(
                parameter,
                format!("health check path '{}' must start with '/'", self.health_check_path),
            ));
        }
        Ok(())
    }
}

/// Inputs the router consumes from other builders
#[derive(Debug, Clone)]
pub struct EdgeAttachments {
    pub vpc_id: Deferred<String>,
    pub public_subnet_ids: Deferred<Vec<String>>,
    pub edge_security_group_id: Deferred<String>,
    pub certificate_arn: Deferred<String>,
}

/// Builder for the shared edge router
#[derive(Debug, Clone, Default)]
pub struct EdgeRouter {
    rules: Vec<HostRule>,
}

impl EdgeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; fails fast on an invalid rule or a priority already in use
    pub fn with_rule(mut self, rule: HostRule) -> ProvisionResult<Self> {
        rule.validate()?;

        if let Some(existing) = self.rules.iter().find(|r| r.priority == rule.priority) {
            return Err(ProvisionError::config(
                format!("edge.rules.{}", rule.service),
                format!(
                    "priority {} is already used by the '{}' rule",
                    rule.priority, existing.service
                ),
            ));
        }
        if self.rules.iter().any(|r| r.service == rule.service) {
            return Err(ProvisionError::config(
                format!("edge.rules.{}", rule.service),
                "service already has a rule",
            ));
        }

        self.rules.push(rule);
        Ok(self)
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> Vec<&HostRule> {
        let mut rules: Vec<&HostRule> = self.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// Declare the load balancer, target groups, listeners and rules
    pub fn declare(&self, stack: &mut Stack, attachments: &EdgeAttachments) -> ProvisionResult<EdgeRoutes> {
        let scope = stack.scope().clone();

        let alb_name = scope.name("edge-alb");
        let load_balancer = stack.declare(
            ResourceKind::LoadBalancer,
            &alb_name,
            Properties::new()
                .set("loadBalancerType", "application")
                .set("internal", false)
                .set_deferred(
                    "securityGroups",
                    attachments.edge_security_group_id.clone().map(|id| vec![id]),
                )
                .set_deferred("subnets", attachments.public_subnet_ids.clone())
                .tags(scope.tags(&alb_name)),
        )?;

        let mut target_groups = BTreeMap::new();
        for rule in &self.rules {
            let name = scope.name(&format!("{}-tg", rule.target_slug));
            let target_group = stack.declare(
                ResourceKind::TargetGroup,
                &name,
                Properties::new()
                    .set("targetType", "ip")
                    .set("port", rule.target_port)
                    .set("protocol", "HTTP")
                    .set_deferred("vpcId", attachments.vpc_id.clone())
                    .set(
                        "healthCheck",
                        json!({
                            "path": rule.health_check_path,
                            "matcher": HEALTH_CHECK.matcher,
                            "interval": HEALTH_CHECK.interval_seconds,
                            "timeout": HEALTH_CHECK.timeout_seconds,
                            "healthyThreshold": HEALTH_CHECK.healthy_threshold,
                            "unhealthyThreshold": HEALTH_CHECK.unhealthy_threshold,
                        }),
                    )
                    .tags(scope.tags(&name)),
            )?;
            target_groups.insert(rule.service.clone(), target_group);
        }

        let http_listener = stack.declare(
            ResourceKind::Listener,
            scope.name(&format!("edge-http-{}", HTTP_PORT)),
            Properties::new()
                .set_deferred("loadBalancerArn", load_balancer.arn())
                .set("port", HTTP_PORT)
                .set("protocol", "HTTP")
                .set(
                    "defaultActions",
                    json!([{
                        "type": "redirect",
                        "redirect": {
                            "port": HTTPS_PORT.to_string(),
                            "protocol": "HTTPS",
                            "statusCode": "HTTP_301",
                        },
                    }]),
                ),
        )?;

        let https_listener = stack.declare(
            ResourceKind::Listener,
            scope.name(&format!("edge-https-{}", HTTPS_PORT)),
            Properties::new()
                .set_deferred("loadBalancerArn", load_balancer.arn())
                .set("port", HTTPS_PORT)
                .set("protocol", "HTTPS")
                .set("sslPolicy", SSL_POLICY)
                .set_deferred("certificateArn", attachments.certificate_arn.clone())
                .set(
                    "defaultActions",
                    json!([{
                        "type": "fixed-response",
                        "fixedResponse": {
                            "contentType": "text/plain",
                            "messageBody": DEFAULT_RESPONSE_BODY,
                            "statusCode": "200",
                        },
                    }]),
                ),
        )?;

        let mut services = Vec::with_capacity(self.rules.len());
        for rule in self.rules() {
            let target_group = target_groups.get(&rule.service).cloned().ok_or_else(|| {
                ProvisionError::config(format!("edge.rules.{}", rule.service), "target group missing")
            })?;
            let hostnames: Vec<String> = rule.hostnames.iter().map(|h| h.to_string()).collect();

            let listener_rule = stack.declare(
                ResourceKind::ListenerRule,
                scope.name(&format!("edge-rule-{}", rule.service)),
                Properties::new()
                    .set_deferred("listenerArn", https_listener.arn())
                    .set("priority", rule.priority)
                    .set_deferred(
                        "actions",
                        target_group
                            .arn()
                            .map(|arn| json!([{ "type": "forward", "targetGroupArn": arn }])),
                    )
                    .set("conditions", json!([{ "hostHeader": { "values": hostnames } }])),
            )?;

            services.push(ServiceRoute {
                rule: rule.clone(),
                target_group,
                listener_rule,
            });
        }

        info!(
            router = %alb_name,
            rules = services.len(),
            "Declared edge router"
        );

        Ok(EdgeRoutes {
            load_balancer,
            http_listener,
            https_listener,
            services,
        })
    }
}

/// Declared route of one service
#[derive(Debug, Clone)]
pub struct ServiceRoute {
    pub rule: HostRule,
    pub target_group: ResourceRef,
    pub listener_rule: ResourceRef,
}

/// Everything the router declared
#[derive(Debug, Clone)]
pub struct EdgeRoutes {
    pub load_balancer: ResourceRef,
    pub http_listener: ResourceRef,
    pub https_listener: ResourceRef,
    /// Services in evaluation order
    pub services: Vec<ServiceRoute>,
}

impl EdgeRoutes {
    /// Route of a named service
    pub fn service(&self, service: &str) -> ProvisionResult<&ServiceRoute> {
        self.services
            .iter()
            .find(|s| s.rule.service == service)
            .ok_or_else(|| ProvisionError::config(format!("edge.rules.{}", service), "no such route"))
    }

    pub fn dns_name(&self) -> Deferred<String> {
        self.load_balancer.output_str("dnsName")
    }

    pub fn zone_id(&self) -> Deferred<String> {
        self.load_balancer.output_str("zoneId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryEngine;
    use crate::naming::NameScope;
    use pretty_assertions::assert_eq;

    fn host(s: &str) -> Hostname {
        Hostname::new(s).unwrap()
    }

    fn router() -> EdgeRouter {
        EdgeRouter::new()
            .with_rule(HostRule::backend(host("api.example.com"), 3000, 20))
            .unwrap()
            .with_rule(HostRule::frontend(host("app.example.com"), 80, 10))
            .unwrap()
    }

    fn attachments() -> EdgeAttachments {
        EdgeAttachments {
            vpc_id: Deferred::known("vpc-1".to_string()),
            public_subnet_ids: Deferred::known(vec!["subnet-1".to_string(), "subnet-2".to_string()]),
            edge_security_group_id: Deferred::known("sg-1".to_string()),
            certificate_arn: Deferred::known("arn:cert".to_string()),
        }
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let err = EdgeRouter::new()
            .with_rule(HostRule::frontend(host("app.example.com"), 80, 10))
            .unwrap()
            .with_rule(HostRule::backend(host("api.example.com"), 3000, 10))
            .unwrap_err();

        match err {
            ProvisionError::Config { parameter, reason } => {
                assert_eq!(parameter, "edge.rules.backend");
                assert!(reason.contains("priority 10"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let mut rule = HostRule::frontend(host("app.example.com"), 80, 0);
        assert!(EdgeRouter::new().with_rule(rule.clone()).is_err());

        rule.priority = 10;
        rule.health_check_path = "health".into();
        assert!(EdgeRouter::new().with_rule(rule.clone()).is_err());

        rule.health_check_path = "/health".into();
        rule.hostnames.clear();
        assert!(EdgeRouter::new().with_rule(rule).is_err());
    }

    #[test]
    fn test_rules_in_priority_order() {
        let binding = router();
        let services: Vec<&str> = binding.rules().iter().map(|r| r.service.as_str()).collect();
        assert_eq!(services, vec!["frontend", "backend"]);
    }

    #[tokio::test]
    async fn test_declared_routes() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let routes = router().declare(&mut stack, &attachments()).unwrap();

        assert_eq!(routes.http_listener.name(), "shop-prod-edge-http-80");
        assert_eq!(routes.https_listener.name(), "shop-prod-edge-https-443");
        assert_eq!(routes.service("frontend").unwrap().target_group.name(), "shop-prod-fe-tg");
        assert_eq!(routes.service("backend").unwrap().listener_rule.name(), "shop-prod-edge-rule-backend");

        let engine = InMemoryEngine::new();
        stack.apply(&engine).await.unwrap();

        let rules = engine.created_of(ResourceKind::ListenerRule).await;
        let frontend = rules.iter().find(|r| r.name == "shop-prod-edge-rule-frontend").unwrap();
        assert_eq!(frontend.properties["priority"], json!(10));
        assert_eq!(
            frontend.properties["conditions"][0]["hostHeader"]["values"],
            json!(["app.example.com"])
        );
        assert_eq!(
            frontend.properties["actions"][0]["targetGroupArn"],
            json!(routes.service("frontend").unwrap().target_group.arn().resolve().unwrap())
        );

        let groups = engine.created_of(ResourceKind::TargetGroup).await;
        assert!(groups
            .iter()
            .all(|g| g.properties["healthCheck"]["matcher"] == json!("200-399")));

        let https = engine
            .created_of(ResourceKind::Listener)
            .await
            .into_iter()
            .find(|l| l.name == "shop-prod-edge-https-443")
            .unwrap();
        assert_eq!(https.properties["certificateArn"], json!("arn:cert"));
        assert_eq!(https.properties["sslPolicy"], json!(SSL_POLICY));
        assert!(routes.dns_name().resolve().unwrap().contains("edge-alb"));
    }
}
