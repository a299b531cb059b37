// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge routing
//!
//! Shared load balancer with TLS termination and host-based dispatch to the
//! frontend and backend services.

pub mod router;

pub use router::{
    EdgeAttachments, EdgeRouter, EdgeRoutes, HealthCheckPolicy, HostRule, ServiceRoute,
    HEALTH_CHECK, SSL_POLICY,
};
