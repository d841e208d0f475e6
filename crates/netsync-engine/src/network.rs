//! Network descriptor supplied by the host.

use netsync_controller::BridgeId;
use netsync_types::Ipv4Cidr;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A tenant network (or VPC tier) as described by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: u64,
    pub tenant_id: String,
    pub cidr: Ipv4Cidr,
    pub gateway: Ipv4Addr,
    /// Set when the network is a tier of a VPC; all tiers share one router.
    #[serde(default)]
    pub vpc_id: Option<u64>,
    /// The network's L2 bridge, when connectivity has been provisioned.
    #[serde(default)]
    pub bridge_id: Option<BridgeId>,
    /// Whether the firewall service is enabled for this network.
    #[serde(default)]
    pub firewall_enabled: bool,
}

impl Network {
    /// Name of the tenant router serving this network.
    pub fn router_name(&self) -> String {
        match self.vpc_id {
            Some(vpc_id) => vpc_router_name(vpc_id),
            None => format!("Network{}", self.id),
        }
    }

    pub fn is_vpc_tier(&self) -> bool {
        self.vpc_id.is_some()
    }
}

/// Name of the router shared by every tier of a VPC.
pub fn vpc_router_name(vpc_id: u64) -> String {
    format!("VPC{}", vpc_id)
}
