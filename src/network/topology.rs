// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network topology
//!
//! Declares the isolated network, its gateway, zone-spread public and private
//! subnets, the single NAT egress path, and the two route paths binding each
//! subnet group to its default target.
//!
//! ```text
//!                 ┌──────────── vpc ────────────┐
//!   igw ◄── public-rt ◄── public-1 … public-n   │
//!    ▲                       │                   │
//!    │                  nat-gateway (public-1)   │
//!    │                       ▲                   │
//!    │      private-rt ──────┘ ◄── private-1 … private-m
//! ```
//!
//! The NAT egress point lives in the first public subnet and serves every
//! private subnet, whatever the zone count.

use serde::Serialize;
use tracing::info;

use super::allocator::allocate_subnets;
use super::zones::ZoneSelector;
use crate::deferred::Deferred;
use crate::domain::{AddressBlock, PlacementZone, ResourceKind, ANY_IPV4};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::stack::{ids, Properties, ResourceRef, Stack};

/// Shape of the network to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyRequest {
    pub cidr: AddressBlock,
    pub new_bits: u8,
    pub public_subnets: usize,
    pub private_subnets: usize,
}

/// Whether a subnet assigns externally reachable addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    fn slug(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// One declared subnet
#[derive(Debug, Clone)]
pub struct Subnet {
    pub resource: ResourceRef,
    pub block: AddressBlock,
    pub zone: PlacementZone,
    pub visibility: Visibility,
}

/// Default-route binding from a subnet group to a gateway or NAT
#[derive(Debug, Clone)]
pub struct RoutePath {
    pub route_table: ResourceRef,
    pub default_route: ResourceRef,
    /// Gateway or NAT egress point the default route targets
    pub target: ResourceRef,
    pub associations: Vec<ResourceRef>,
}

impl RoutePath {
    /// Number of subnets bound to this path
    pub fn subnet_count(&self) -> usize {
        self.associations.len()
    }
}

/// Everything the topology declared
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    pub vpc: ResourceRef,
    pub internet_gateway: ResourceRef,
    pub public_subnets: Vec<Subnet>,
    pub private_subnets: Vec<Subnet>,
    pub nat_address: ResourceRef,
    pub nat_gateway: ResourceRef,
    pub public_routes: RoutePath,
    pub private_routes: RoutePath,
}

impl NetworkTopology {
    /// Declare the topology into `stack`
    ///
    /// Fails with `Topology` if the address space cannot hold the subnets or
    /// no public subnet is requested for the NAT egress point.
    pub fn build(
        stack: &mut Stack,
        request: &TopologyRequest,
        zones: &ZoneSelector,
    ) -> ProvisionResult<Self> {
        if request.public_subnets == 0 {
            return Err(ProvisionError::topology(
                "at least one public subnet is required to host the NAT egress point",
            ));
        }

        let scope = stack.scope().clone();

        let vpc_name = scope.name("vpc");
        let vpc = stack.declare(
            ResourceKind::Vpc,
            &vpc_name,
            Properties::new()
                .set("cidrBlock", request.cidr.to_string())
                .set("enableDnsHostnames", true)
                .set("enableDnsSupport", true)
                .tags(scope.tags(&vpc_name)),
        )?;

        let igw_name = scope.name("igw");
        let internet_gateway = stack.declare(
            ResourceKind::InternetGateway,
            &igw_name,
            Properties::new()
                .set_deferred("vpcId", vpc.id())
                .tags(scope.tags(&igw_name)),
        )?;

        let plan = allocate_subnets(
            &request.cidr,
            request.new_bits,
            request.public_subnets,
            request.private_subnets,
        )?;

        let public_subnets = declare_subnets(stack, &vpc, &plan.public, zones, Visibility::Public)?;
        let private_subnets = declare_subnets(stack, &vpc, &plan.private, zones, Visibility::Private)?;

        let eip_name = scope.name("nat-eip");
        let nat_address = stack.declare(
            ResourceKind::ElasticIp,
            &eip_name,
            Properties::new()
                .set("domain", "vpc")
                .depends_on(&internet_gateway)
                .tags(scope.tags(&eip_name)),
        )?;

        let nat_name = scope.name("nat-gateway");
        let nat_gateway = stack.declare(
            ResourceKind::NatGateway,
            &nat_name,
            Properties::new()
                .set_deferred("allocationId", nat_address.id())
                .set_deferred("subnetId", public_subnets[0].resource.id())
                .depends_on(&internet_gateway)
                .tags(scope.tags(&nat_name)),
        )?;

        let public_routes = declare_route_path(
            stack,
            &vpc,
            &public_subnets,
            Visibility::Public,
            "gatewayId",
            &internet_gateway,
        )?;
        let private_routes = declare_route_path(
            stack,
            &vpc,
            &private_subnets,
            Visibility::Private,
            "natGatewayId",
            &nat_gateway,
        )?;

        info!(
            vpc = %vpc.name(),
            cidr = %request.cidr,
            public = public_subnets.len(),
            private = private_subnets.len(),
            zones = zones.zones().len(),
            "Declared network topology"
        );

        Ok(Self {
            vpc,
            internet_gateway,
            public_subnets,
            private_subnets,
            nat_address,
            nat_gateway,
            public_routes,
            private_routes,
        })
    }

    pub fn vpc_id(&self) -> Deferred<String> {
        self.vpc.id()
    }

    /// Public subnet ids in allocation order
    pub fn public_subnet_ids(&self) -> Deferred<Vec<String>> {
        subnet_ids(&self.public_subnets)
    }

    /// Private subnet ids in allocation order
    pub fn private_subnet_ids(&self) -> Deferred<Vec<String>> {
        subnet_ids(&self.private_subnets)
    }
}

fn subnet_ids(subnets: &[Subnet]) -> Deferred<Vec<String>> {
    let resources: Vec<ResourceRef> = subnets.iter().map(|s| s.resource.clone()).collect();
    ids(&resources)
}

fn declare_subnets(
    stack: &mut Stack,
    vpc: &ResourceRef,
    blocks: &[AddressBlock],
    zones: &ZoneSelector,
    visibility: Visibility,
) -> ProvisionResult<Vec<Subnet>> {
    let scope = stack.scope().clone();

    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let zone = zones.zone_for(index).clone();
            let name = scope.indexed(visibility.slug(), index);
            let resource = stack.declare(
                ResourceKind::Subnet,
                &name,
                Properties::new()
                    .set_deferred("vpcId", vpc.id())
                    .set("cidrBlock", block.to_string())
                    .set("availabilityZone", zone.as_str())
                    .set("mapPublicIpOnLaunch", visibility == Visibility::Public)
                    .tags(scope.tags(&name)),
            )?;

            Ok(Subnet {
                resource,
                block: *block,
                zone,
                visibility,
            })
        })
        .collect()
}

fn declare_route_path(
    stack: &mut Stack,
    vpc: &ResourceRef,
    subnets: &[Subnet],
    visibility: Visibility,
    target_key: &str,
    target: &ResourceRef,
) -> ProvisionResult<RoutePath> {
    let scope = stack.scope().clone();
    let slug = visibility.slug();

    let table_name = scope.name(&format!("{}-rt", slug));
    let route_table = stack.declare(
        ResourceKind::RouteTable,
        &table_name,
        Properties::new()
            .set_deferred("vpcId", vpc.id())
            .tags(scope.tags(&table_name)),
    )?;

    let default_route = stack.declare(
        ResourceKind::Route,
        scope.name(&format!("{}-default", slug)),
        Properties::new()
            .set_deferred("routeTableId", route_table.id())
            .set("destinationCidrBlock", ANY_IPV4)
            .set_deferred(target_key, target.id()),
    )?;

    let associations = subnets
        .iter()
        .enumerate()
        .map(|(index, subnet)| {
            stack.declare(
                ResourceKind::RouteTableAssociation,
                scope.indexed(&format!("{}-assoc", slug), index),
                Properties::new()
                    .set_deferred("subnetId", subnet.resource.id())
                    .set_deferred("routeTableId", route_table.id()),
            )
        })
        .collect::<ProvisionResult<Vec<_>>>()?;

    Ok(RoutePath {
        route_table,
        default_route,
        target: target.clone(),
        associations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryEngine;
    use crate::naming::NameScope;
    use serde_json::json;

    fn request(public: usize, private: usize) -> TopologyRequest {
        TopologyRequest {
            cidr: "10.0.0.0/16".parse().unwrap(),
            new_bits: 7,
            public_subnets: public,
            private_subnets: private,
        }
    }

    fn zones() -> ZoneSelector {
        ZoneSelector::new(vec!["A".into(), "B".into()]).unwrap()
    }

    #[test]
    fn test_subnet_layout() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let topology = NetworkTopology::build(&mut stack, &request(2, 2), &zones()).unwrap();

        let layout: Vec<(String, String, String)> = topology
            .public_subnets
            .iter()
            .chain(topology.private_subnets.iter())
            .map(|s| (s.resource.name().to_string(), s.block.to_string(), s.zone.to_string()))
            .collect();

        assert_eq!(
            layout,
            vec![
                ("shop-prod-public-1".into(), "10.0.0.0/23".into(), "A".into()),
                ("shop-prod-public-2".into(), "10.0.2.0/23".into(), "B".into()),
                ("shop-prod-private-1".into(), "10.0.4.0/23".into(), "A".into()),
                ("shop-prod-private-2".into(), "10.0.6.0/23".into(), "B".into()),
            ]
        );
        assert_eq!(topology.public_routes.subnet_count(), 2);
        assert_eq!(topology.private_routes.target.name(), "shop-prod-nat-gateway");
    }

    #[test]
    fn test_requires_public_subnet() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let err = NetworkTopology::build(&mut stack, &request(0, 2), &zones()).unwrap_err();
        assert!(matches!(err, ProvisionError::Topology(_)));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_address_space_exhausted() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let mut tight = request(2, 2);
        tight.new_bits = 1;
        let err = NetworkTopology::build(&mut stack, &tight, &zones()).unwrap_err();
        assert!(matches!(err, ProvisionError::Topology(_)));
    }

    #[tokio::test]
    async fn test_nat_in_first_public_subnet() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let topology = NetworkTopology::build(&mut stack, &request(2, 2), &zones()).unwrap();
        let engine = InMemoryEngine::new();
        stack.apply(&engine).await.unwrap();

        let nat = engine
            .created_of(ResourceKind::NatGateway)
            .await
            .pop()
            .unwrap();
        let first_public = topology.public_subnets[0].resource.id().resolve().unwrap();
        assert_eq!(nat.properties["subnetId"], json!(first_public));

        let routes = engine.created_of(ResourceKind::Route).await;
        let private = routes.iter().find(|r| r.name == "shop-prod-private-default").unwrap();
        assert_eq!(
            private.properties["natGatewayId"],
            json!(topology.nat_gateway.id().resolve().unwrap())
        );

        let public_ids = topology.public_subnet_ids().resolve().unwrap();
        assert_eq!(public_ids.len(), 2);
    }
}
