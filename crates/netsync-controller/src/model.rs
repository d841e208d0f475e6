//! Controller object model: routers, bridges, ports, rule chains, rules and
//! routes, plus the request types used to create them.

use crate::types::{BridgeId, ChainId, PortId, RouteId, RouterId, RuleId};
use netsync_types::{Ipv4Cidr, PortRange};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A virtual router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub id: RouterId,
    pub name: String,
    pub tenant_id: String,
    /// Chain evaluated for traffic entering the router.
    pub inbound_filter_id: Option<ChainId>,
    /// Chain evaluated for traffic leaving the router.
    pub outbound_filter_id: Option<ChainId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRouter {
    pub name: String,
    pub tenant_id: String,
}

/// A virtual L2 bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub id: BridgeId,
    pub name: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBridge {
    pub name: String,
    pub tenant_id: String,
}

/// The device owning a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DeviceId {
    Router(RouterId),
    Bridge(BridgeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    /// Links two virtual devices.
    Interior,
    /// Bound to something outside the virtual topology.
    Exterior,
}

/// A port on a router or bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub device_id: DeviceId,
    pub port_type: PortType,
    /// The port this one is linked to, if any.
    pub peer_id: Option<PortId>,
    /// Router ports only: the subnet the port sits on.
    pub network: Option<Ipv4Cidr>,
    /// Router ports only: the port's own address.
    pub port_address: Option<Ipv4Addr>,
}

impl Port {
    pub fn is_linked(&self) -> bool {
        self.peer_id.is_some()
    }

    pub fn router_id(&self) -> Option<RouterId> {
        match self.device_id {
            DeviceId::Router(id) => Some(id),
            DeviceId::Bridge(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRouterPort {
    pub port_type: PortType,
    pub network: Ipv4Cidr,
    pub port_address: Ipv4Addr,
}

impl NewRouterPort {
    pub fn interior(network: Ipv4Cidr, port_address: Ipv4Addr) -> Self {
        Self {
            port_type: PortType::Interior,
            network,
            port_address,
        }
    }
}

/// An ordered, named rule collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChain {
    pub id: ChainId,
    pub name: String,
    pub tenant_id: String,
    /// Rules in evaluation order; `rules[i].position == i + 1`.
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChain {
    pub name: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Accept,
    Drop,
    Reject,
    Return,
    Jump,
    Dnat,
    Snat,
    RevDnat,
    RevSnat,
}

impl RuleType {
    pub fn is_nat(&self) -> bool {
        matches!(
            self,
            RuleType::Dnat | RuleType::Snat | RuleType::RevDnat | RuleType::RevSnat
        )
    }
}

/// What happens to a packet after a NAT rule rewrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    Accept,
    Continue,
    Return,
}

/// Translation target of a NAT rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NatTarget {
    pub address_from: Ipv4Addr,
    pub address_to: Ipv4Addr,
    pub port_from: u16,
    pub port_to: u16,
}

impl NatTarget {
    /// Targets a single address, leaving ports untranslated.
    pub fn address(addr: Ipv4Addr) -> Self {
        Self {
            address_from: addr,
            address_to: addr,
            port_from: 0,
            port_to: 0,
        }
    }

    /// Targets a single address and a port range.
    pub fn address_and_ports(addr: Ipv4Addr, ports: PortRange) -> Self {
        Self {
            address_from: addr,
            address_to: addr,
            port_from: ports.start(),
            port_to: ports.end(),
        }
    }
}

/// Packet match of a rule. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_src: Option<Ipv4Cidr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_dst: Option<Ipv4Cidr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_proto: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_src: Option<PortRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_dst: Option<PortRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_ports: Vec<PortId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_ports: Vec<PortId>,
    #[serde(default)]
    pub match_forward_flow: bool,
    #[serde(default)]
    pub match_return_flow: bool,
}

/// A rule inside a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub chain_id: ChainId,
    /// 1-based position within the chain.
    pub position: u32,
    pub rule_type: RuleType,
    pub flow_action: Option<FlowAction>,
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nat_targets: Vec<NatTarget>,
    pub jump_chain_id: Option<ChainId>,
}

/// Request to create a rule.
///
/// ```
/// use netsync_controller::{FlowAction, NatTarget, NewRule, RuleType};
/// use std::net::Ipv4Addr;
///
/// let rule = NewRule::new(RuleType::Dnat)
///     .flow_action(FlowAction::Accept)
///     .nat_target(NatTarget::address(Ipv4Addr::new(10, 0, 0, 5)))
///     .at(1);
/// assert_eq!(rule.position, Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    pub rule_type: RuleType,
    pub flow_action: Option<FlowAction>,
    pub condition: Condition,
    pub nat_targets: Vec<NatTarget>,
    pub jump_chain_id: Option<ChainId>,
    /// 1-based insert position; `None` appends.
    pub position: Option<u32>,
}

impl NewRule {
    pub fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            flow_action: None,
            condition: Condition::default(),
            nat_targets: Vec::new(),
            jump_chain_id: None,
            position: None,
        }
    }

    pub fn jump(target: ChainId) -> Self {
        let mut rule = Self::new(RuleType::Jump);
        rule.jump_chain_id = Some(target);
        rule
    }

    pub fn flow_action(mut self, action: FlowAction) -> Self {
        self.flow_action = Some(action);
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn nat_target(mut self, target: NatTarget) -> Self {
        self.nat_targets.push(target);
        self
    }

    pub fn at(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }
}

/// A static route on a router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub router_id: RouterId,
    pub src_network: Ipv4Cidr,
    pub dst_network: Ipv4Cidr,
    pub next_hop_port: PortId,
    pub next_hop_gateway: Option<Ipv4Addr>,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoute {
    pub src_network: Ipv4Cidr,
    pub dst_network: Ipv4Cidr,
    pub next_hop_port: PortId,
    pub next_hop_gateway: Option<Ipv4Addr>,
    pub weight: u32,
}

impl NewRoute {
    /// A route from anywhere to `dst` through `next_hop_port`.
    pub fn to(dst: Ipv4Cidr, next_hop_port: PortId, weight: u32) -> Self {
        Self {
            src_network: Ipv4Cidr::ANY,
            dst_network: dst,
            next_hop_port,
            next_hop_gateway: None,
            weight,
        }
    }

    pub fn via(mut self, gateway: Ipv4Addr) -> Self {
        self.next_hop_gateway = Some(gateway);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_rule_builder() {
        let chain = ChainId::new();
        let rule = NewRule::jump(chain).at(2);
        assert_eq!(rule.rule_type, RuleType::Jump);
        assert_eq!(rule.jump_chain_id, Some(chain));
        assert_eq!(rule.position, Some(2));
        assert!(rule.nat_targets.is_empty());
    }

    #[test]
    fn test_condition_serde_skips_unset() {
        let cond = Condition {
            nw_dst: Some("203.0.113.5/32".parse().unwrap()),
            nw_proto: Some(6),
            ..Default::default()
        };
        let json = serde_json::to_string(&cond).unwrap();
        assert_eq!(
            json,
            r#"{"nw_dst":"203.0.113.5/32","nw_proto":6,"match_forward_flow":false,"match_return_flow":false}"#
        );
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cond);
    }

    #[test]
    fn test_port_device_helpers() {
        let router = RouterId::new();
        let port = Port {
            id: PortId::new(),
            device_id: DeviceId::Router(router),
            port_type: PortType::Interior,
            peer_id: None,
            network: None,
            port_address: None,
        };
        assert_eq!(port.router_id(), Some(router));
        assert!(!port.is_linked());
    }
}
