//! In-process controller.
//!
//! `InMemoryController` implements the full [`Controller`] API over plain
//! collections. It backs the engine's tests and the offline `netsync` tool:
//! state can be loaded from and saved to a [`ControllerSnapshot`], single
//! calls can be made to fail, and every call is counted.

use crate::api::{Controller, Operation};
use crate::error::{ControllerError, ControllerResult};
use crate::model::{
    Bridge, DeviceId, NewBridge, NewChain, NewRoute, NewRouter, NewRouterPort, NewRule, Port,
    PortType, Route, Router, Rule, RuleChain, RuleType,
};
use crate::types::{BridgeId, ChainId, PortId, RouteId, RouterId, RuleId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Serializable copy of the whole controller state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    #[serde(default)]
    pub routers: Vec<Router>,
    #[serde(default)]
    pub bridges: Vec<Bridge>,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub chains: Vec<RuleChain>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl ControllerSnapshot {
    pub fn chain_named(&self, name: &str) -> Option<&RuleChain> {
        self.chains.iter().find(|c| c.name == name)
    }

    pub fn router_named(&self, name: &str) -> Option<&Router> {
        self.routers.iter().find(|r| r.name == name)
    }

    pub fn routes_of(&self, router_id: RouterId) -> Vec<&Route> {
        self.routes
            .iter()
            .filter(|r| r.router_id == router_id)
            .collect()
    }

    pub fn ports_of(&self, device_id: DeviceId) -> Vec<&Port> {
        self.ports
            .iter()
            .filter(|p| p.device_id == device_id)
            .collect()
    }
}

/// Objects are kept in creation order, which is also the listing order.
type State = ControllerSnapshot;

/// Controller implementation holding all state in memory.
#[derive(Debug, Default)]
pub struct InMemoryController {
    state: Mutex<State>,
    faults: Mutex<HashMap<Operation, VecDeque<ControllerError>>>,
    calls: Mutex<HashMap<Operation, u64>>,
}

impl InMemoryController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ControllerSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.state.lock().clone()
    }

    /// Makes the next call of `op` fail with `error`. Faults queue up per
    /// operation and are consumed one per call.
    pub fn inject_fault(&self, op: Operation, error: ControllerError) {
        self.faults.lock().entry(op).or_default().push_back(error);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Number of calls of `op` since creation or the last reset, failed
    /// calls included.
    pub fn call_count(&self, op: Operation) -> u64 {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Number of state-changing calls since creation or the last reset.
    pub fn mutation_count(&self) -> u64 {
        self.calls
            .lock()
            .iter()
            .filter(|(op, _)| op.is_mutation())
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn reset_call_counts(&self) {
        self.calls.lock().clear();
    }

    fn enter(&self, op: Operation) -> ControllerResult<()> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        if let Some(err) = self.faults.lock().get_mut(&op).and_then(VecDeque::pop_front) {
            debug!(operation = %op, error = %err, "injected controller fault");
            return Err(err);
        }
        Ok(())
    }
}

fn renumber(rules: &mut [Rule]) {
    for (idx, rule) in rules.iter_mut().enumerate() {
        rule.position = u32::try_from(idx + 1).unwrap_or(u32::MAX);
    }
}

impl State {
    fn router_mut(&mut self, id: RouterId) -> ControllerResult<&mut Router> {
        self.routers
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ControllerError::not_found(format!("{:?}", id)))
    }

    fn port_mut(&mut self, id: PortId) -> ControllerResult<&mut Port> {
        self.ports
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ControllerError::not_found(format!("{:?}", id)))
    }

    fn has_router(&self, id: RouterId) -> bool {
        self.routers.iter().any(|r| r.id == id)
    }

    fn has_chain(&self, id: ChainId) -> bool {
        self.chains.iter().any(|c| c.id == id)
    }

    fn clear_peer(&mut self, port_id: PortId) {
        let peer = self
            .ports
            .iter_mut()
            .find(|p| p.id == port_id)
            .and_then(|p| p.peer_id.take());
        if let Some(peer_id) = peer {
            if let Some(peer) = self.ports.iter_mut().find(|p| p.id == peer_id) {
                peer.peer_id = None;
            }
        }
    }

    fn remove_port(&mut self, port_id: PortId) {
        self.clear_peer(port_id);
        self.routes.retain(|r| r.next_hop_port != port_id);
        self.ports.retain(|p| p.id != port_id);
    }
}

impl Controller for InMemoryController {
    fn list_routers(&self, tenant_id: &str) -> ControllerResult<Vec<Router>> {
        self.enter(Operation::ListRouters)?;
        let state = self.state.lock();
        Ok(state
            .routers
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn get_router(&self, id: RouterId) -> ControllerResult<Option<Router>> {
        self.enter(Operation::GetRouter)?;
        let state = self.state.lock();
        Ok(state.routers.iter().find(|r| r.id == id).cloned())
    }

    fn create_router(&self, router: NewRouter) -> ControllerResult<Router> {
        self.enter(Operation::CreateRouter)?;
        let created = Router {
            id: RouterId::new(),
            name: router.name,
            tenant_id: router.tenant_id,
            inbound_filter_id: None,
            outbound_filter_id: None,
        };
        debug!(router = %created.name, id = %created.id, "created router");
        self.state.lock().routers.push(created.clone());
        Ok(created)
    }

    fn update_router_filters(
        &self,
        id: RouterId,
        inbound: Option<ChainId>,
        outbound: Option<ChainId>,
    ) -> ControllerResult<Router> {
        self.enter(Operation::UpdateRouterFilters)?;
        let mut state = self.state.lock();
        for chain_id in inbound.iter().chain(outbound.iter()) {
            if !state.has_chain(*chain_id) {
                return Err(ControllerError::not_found(format!("{:?}", chain_id)));
            }
        }
        let router = state.router_mut(id)?;
        router.inbound_filter_id = inbound;
        router.outbound_filter_id = outbound;
        Ok(router.clone())
    }

    fn delete_router(&self, id: RouterId) -> ControllerResult<()> {
        self.enter(Operation::DeleteRouter)?;
        let mut state = self.state.lock();
        if !state.has_router(id) {
            return Err(ControllerError::not_found(format!("{:?}", id)));
        }
        let port_ids: Vec<PortId> = state
            .ports
            .iter()
            .filter(|p| p.device_id == DeviceId::Router(id))
            .map(|p| p.id)
            .collect();
        for port_id in port_ids {
            state.remove_port(port_id);
        }
        state.routes.retain(|r| r.router_id != id);
        state.routers.retain(|r| r.id != id);
        debug!(id = %id, "deleted router");
        Ok(())
    }

    fn get_bridge(&self, id: BridgeId) -> ControllerResult<Option<Bridge>> {
        self.enter(Operation::GetBridge)?;
        let state = self.state.lock();
        Ok(state.bridges.iter().find(|b| b.id == id).cloned())
    }

    fn create_bridge(&self, bridge: NewBridge) -> ControllerResult<Bridge> {
        self.enter(Operation::CreateBridge)?;
        let created = Bridge {
            id: BridgeId::new(),
            name: bridge.name,
            tenant_id: bridge.tenant_id,
        };
        self.state.lock().bridges.push(created.clone());
        Ok(created)
    }

    fn list_router_ports(&self, router_id: RouterId) -> ControllerResult<Vec<Port>> {
        self.enter(Operation::ListRouterPorts)?;
        let state = self.state.lock();
        Ok(state
            .ports
            .iter()
            .filter(|p| p.device_id == DeviceId::Router(router_id))
            .cloned()
            .collect())
    }

    fn list_bridge_ports(&self, bridge_id: BridgeId) -> ControllerResult<Vec<Port>> {
        self.enter(Operation::ListBridgePorts)?;
        let state = self.state.lock();
        Ok(state
            .ports
            .iter()
            .filter(|p| p.device_id == DeviceId::Bridge(bridge_id))
            .cloned()
            .collect())
    }

    fn get_port(&self, id: PortId) -> ControllerResult<Option<Port>> {
        self.enter(Operation::GetPort)?;
        let state = self.state.lock();
        Ok(state.ports.iter().find(|p| p.id == id).cloned())
    }

    fn create_router_port(
        &self,
        router_id: RouterId,
        port: NewRouterPort,
    ) -> ControllerResult<Port> {
        self.enter(Operation::CreateRouterPort)?;
        let mut state = self.state.lock();
        if !state.has_router(router_id) {
            return Err(ControllerError::not_found(format!("{:?}", router_id)));
        }
        if !port.network.contains(port.port_address) {
            return Err(ControllerError::invalid_request(format!(
                "port address {} outside network {}",
                port.port_address, port.network
            )));
        }
        let created = Port {
            id: PortId::new(),
            device_id: DeviceId::Router(router_id),
            port_type: port.port_type,
            peer_id: None,
            network: Some(port.network),
            port_address: Some(port.port_address),
        };
        debug!(router = %router_id, address = %port.port_address, "created router port");
        state.ports.push(created.clone());
        Ok(created)
    }

    fn create_bridge_port(&self, bridge_id: BridgeId) -> ControllerResult<Port> {
        self.enter(Operation::CreateBridgePort)?;
        let mut state = self.state.lock();
        if !state.bridges.iter().any(|b| b.id == bridge_id) {
            return Err(ControllerError::not_found(format!("{:?}", bridge_id)));
        }
        let created = Port {
            id: PortId::new(),
            device_id: DeviceId::Bridge(bridge_id),
            port_type: PortType::Interior,
            peer_id: None,
            network: None,
            port_address: None,
        };
        state.ports.push(created.clone());
        Ok(created)
    }

    fn link_ports(&self, port_id: PortId, peer_id: PortId) -> ControllerResult<()> {
        self.enter(Operation::LinkPorts)?;
        if port_id == peer_id {
            return Err(ControllerError::invalid_request("cannot link a port to itself"));
        }
        let mut state = self.state.lock();
        for id in [port_id, peer_id] {
            let port = state.port_mut(id)?;
            if port.port_type != PortType::Interior {
                return Err(ControllerError::invalid_request(format!(
                    "{:?} is not an interior port",
                    id
                )));
            }
            if port.is_linked() {
                return Err(ControllerError::conflict(format!("{:?} is already linked", id)));
            }
        }
        state.port_mut(port_id)?.peer_id = Some(peer_id);
        state.port_mut(peer_id)?.peer_id = Some(port_id);
        debug!(port = %port_id, peer = %peer_id, "linked ports");
        Ok(())
    }

    fn unlink_port(&self, port_id: PortId) -> ControllerResult<()> {
        self.enter(Operation::UnlinkPort)?;
        let mut state = self.state.lock();
        state.port_mut(port_id)?;
        state.clear_peer(port_id);
        Ok(())
    }

    fn delete_port(&self, port_id: PortId) -> ControllerResult<()> {
        self.enter(Operation::DeletePort)?;
        let mut state = self.state.lock();
        state.port_mut(port_id)?;
        state.remove_port(port_id);
        debug!(port = %port_id, "deleted port");
        Ok(())
    }

    fn list_chains(&self, tenant_id: &str) -> ControllerResult<Vec<RuleChain>> {
        self.enter(Operation::ListChains)?;
        let state = self.state.lock();
        Ok(state
            .chains
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn get_chain(&self, id: ChainId) -> ControllerResult<Option<RuleChain>> {
        self.enter(Operation::GetChain)?;
        let state = self.state.lock();
        Ok(state.chains.iter().find(|c| c.id == id).cloned())
    }

    fn create_chain(&self, chain: NewChain) -> ControllerResult<RuleChain> {
        self.enter(Operation::CreateChain)?;
        let created = RuleChain {
            id: ChainId::new(),
            name: chain.name,
            tenant_id: chain.tenant_id,
            rules: Vec::new(),
        };
        debug!(chain = %created.name, id = %created.id, "created chain");
        self.state.lock().chains.push(created.clone());
        Ok(created)
    }

    fn delete_chain(&self, id: ChainId) -> ControllerResult<()> {
        self.enter(Operation::DeleteChain)?;
        let mut state = self.state.lock();
        if !state.has_chain(id) {
            return Err(ControllerError::not_found(format!("{:?}", id)));
        }
        state.chains.retain(|c| c.id != id);
        for router in state.routers.iter_mut() {
            if router.inbound_filter_id == Some(id) {
                router.inbound_filter_id = None;
            }
            if router.outbound_filter_id == Some(id) {
                router.outbound_filter_id = None;
            }
        }
        Ok(())
    }

    fn create_rule(&self, chain_id: ChainId, rule: NewRule) -> ControllerResult<Rule> {
        self.enter(Operation::CreateRule)?;
        let mut state = self.state.lock();

        match (rule.rule_type, rule.jump_chain_id) {
            (RuleType::Jump, None) => {
                return Err(ControllerError::invalid_request("jump rule without target chain"));
            }
            (RuleType::Jump, Some(target)) if !state.has_chain(target) => {
                return Err(ControllerError::not_found(format!("{:?}", target)));
            }
            (RuleType::Dnat | RuleType::Snat, _) if rule.nat_targets.is_empty() => {
                return Err(ControllerError::invalid_request("NAT rule without target"));
            }
            _ => {}
        }

        let chain = state
            .chains
            .iter_mut()
            .find(|c| c.id == chain_id)
            .ok_or_else(|| ControllerError::not_found(format!("{:?}", chain_id)))?;

        let tail = u32::try_from(chain.rules.len() + 1).unwrap_or(u32::MAX);
        let position = rule.position.unwrap_or(tail);
        let index = match position.checked_sub(1).map(usize::try_from) {
            Some(Ok(index)) if index <= chain.rules.len() => index,
            _ => {
                return Err(ControllerError::invalid_request(format!(
                    "position {} out of range 1..={}",
                    position, tail
                )));
            }
        };

        let created = Rule {
            id: RuleId::new(),
            chain_id,
            position,
            rule_type: rule.rule_type,
            flow_action: rule.flow_action,
            condition: rule.condition,
            nat_targets: rule.nat_targets,
            jump_chain_id: rule.jump_chain_id,
        };
        chain.rules.insert(index, created.clone());
        renumber(&mut chain.rules);
        debug!(chain = %chain.name, position, rule_type = ?created.rule_type, "created rule");
        Ok(created)
    }

    fn delete_rule(&self, id: RuleId) -> ControllerResult<()> {
        self.enter(Operation::DeleteRule)?;
        let mut state = self.state.lock();
        let chain = state
            .chains
            .iter_mut()
            .find(|c| c.rules.iter().any(|r| r.id == id))
            .ok_or_else(|| ControllerError::not_found(format!("{:?}", id)))?;
        chain.rules.retain(|r| r.id != id);
        renumber(&mut chain.rules);
        debug!(chain = %chain.name, rule = %id, "deleted rule");
        Ok(())
    }

    fn list_routes(&self, router_id: RouterId) -> ControllerResult<Vec<Route>> {
        self.enter(Operation::ListRoutes)?;
        let state = self.state.lock();
        Ok(state
            .routes
            .iter()
            .filter(|r| r.router_id == router_id)
            .cloned()
            .collect())
    }

    fn create_route(&self, router_id: RouterId, route: NewRoute) -> ControllerResult<Route> {
        self.enter(Operation::CreateRoute)?;
        let mut state = self.state.lock();
        if !state.has_router(router_id) {
            return Err(ControllerError::not_found(format!("{:?}", router_id)));
        }
        let next_hop = state.port_mut(route.next_hop_port)?;
        if next_hop.device_id != DeviceId::Router(router_id) {
            return Err(ControllerError::invalid_request(format!(
                "next hop {:?} is not a port of {:?}",
                route.next_hop_port, router_id
            )));
        }
        let created = Route {
            id: RouteId::new(),
            router_id,
            src_network: route.src_network,
            dst_network: route.dst_network,
            next_hop_port: route.next_hop_port,
            next_hop_gateway: route.next_hop_gateway,
            weight: route.weight,
        };
        debug!(router = %router_id, dst = %created.dst_network, "created route");
        state.routes.push(created.clone());
        Ok(created)
    }

    fn delete_route(&self, id: RouteId) -> ControllerResult<()> {
        self.enter(Operation::DeleteRoute)?;
        let mut state = self.state.lock();
        if !state.routes.iter().any(|r| r.id == id) {
            return Err(ControllerError::not_found(format!("{:?}", id)));
        }
        state.routes.retain(|r| r.id != id);
        debug!(route = %id, "deleted route");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, FlowAction, NatTarget};
    use netsync_types::Ipv4Cidr;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn router(ctl: &InMemoryController, name: &str) -> Router {
        ctl.create_router(NewRouter {
            name: name.to_string(),
            tenant_id: "tenant-a".to_string(),
        })
        .unwrap()
    }

    fn chain(ctl: &InMemoryController, name: &str) -> RuleChain {
        ctl.create_chain(NewChain {
            name: name.to_string(),
            tenant_id: "tenant-a".to_string(),
        })
        .unwrap()
    }

    fn link_local_port(ctl: &InMemoryController, router: RouterId, host: u8) -> Port {
        ctl.create_router_port(
            router,
            NewRouterPort::interior(
                "169.254.255.0/30".parse().unwrap(),
                Ipv4Addr::new(169, 254, 255, host),
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_rule_insert_positions() {
        let ctl = InMemoryController::new();
        let c = chain(&ctl, "c");
        let drop = ctl.create_rule(c.id, NewRule::new(RuleType::Drop)).unwrap();
        let accept = ctl
            .create_rule(c.id, NewRule::new(RuleType::Accept).at(1))
            .unwrap();
        assert_eq!(accept.position, 1);

        let rules = ctl.get_chain(c.id).unwrap().unwrap().rules;
        assert_eq!(
            rules.iter().map(|r| (r.id, r.position)).collect::<Vec<_>>(),
            vec![(accept.id, 1), (drop.id, 2)]
        );

        let err = ctl
            .create_rule(c.id, NewRule::new(RuleType::Accept).at(4))
            .unwrap_err();
        assert!(matches!(err, ControllerError::InvalidRequest { .. }));
        let err = ctl
            .create_rule(c.id, NewRule::new(RuleType::Accept).at(0))
            .unwrap_err();
        assert!(matches!(err, ControllerError::InvalidRequest { .. }));

        let tail = ctl
            .create_rule(c.id, NewRule::new(RuleType::Accept).at(3))
            .unwrap();
        assert_eq!(tail.position, 3);
        assert_eq!(ctl.get_chain(c.id).unwrap().unwrap().rules.len(), 3);
    }

    #[test]
    fn test_delete_rule_renumbers() {
        let ctl = InMemoryController::new();
        let c = chain(&ctl, "c");
        let first = ctl.create_rule(c.id, NewRule::new(RuleType::Accept)).unwrap();
        ctl.create_rule(c.id, NewRule::new(RuleType::Drop)).unwrap();
        ctl.delete_rule(first.id).unwrap();

        let rules = ctl.get_chain(c.id).unwrap().unwrap().rules;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].position, 1);
        assert_eq!(rules[0].rule_type, RuleType::Drop);
    }

    #[test]
    fn test_rule_validation() {
        let ctl = InMemoryController::new();
        let c = chain(&ctl, "c");
        let missing = ChainId::new();
        assert!(matches!(
            ctl.create_rule(c.id, NewRule::jump(missing)),
            Err(ControllerError::NotFound { .. })
        ));
        assert!(matches!(
            ctl.create_rule(c.id, NewRule::new(RuleType::Dnat)),
            Err(ControllerError::InvalidRequest { .. })
        ));
        let dnat = NewRule::new(RuleType::Dnat)
            .flow_action(FlowAction::Accept)
            .condition(Condition {
                nw_dst: Some("203.0.113.5/32".parse().unwrap()),
                ..Default::default()
            })
            .nat_target(NatTarget::address(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(ctl.create_rule(c.id, dnat).is_ok());
    }

    #[test]
    fn test_link_and_unlink() {
        let ctl = InMemoryController::new();
        let provider = router(&ctl, "provider");
        let tenant = router(&ctl, "Network1");
        let down = link_local_port(&ctl, provider.id, 1);
        let up = link_local_port(&ctl, tenant.id, 2);

        ctl.link_ports(down.id, up.id).unwrap();
        assert_eq!(ctl.get_port(up.id).unwrap().unwrap().peer_id, Some(down.id));
        assert!(matches!(
            ctl.link_ports(down.id, up.id),
            Err(ControllerError::Conflict { .. })
        ));

        ctl.unlink_port(up.id).unwrap();
        assert!(!ctl.get_port(down.id).unwrap().unwrap().is_linked());
    }

    #[test]
    fn test_delete_router_cascades() {
        let ctl = InMemoryController::new();
        let provider = router(&ctl, "provider");
        let tenant = router(&ctl, "Network1");
        let down = link_local_port(&ctl, provider.id, 1);
        let up = link_local_port(&ctl, tenant.id, 2);
        ctl.link_ports(down.id, up.id).unwrap();
        ctl.create_route(tenant.id, NewRoute::to(Ipv4Cidr::ANY, up.id, 100))
            .unwrap();

        ctl.delete_router(tenant.id).unwrap();

        let snap = ctl.snapshot();
        assert_eq!(snap.routers.len(), 1);
        assert!(snap.routes.is_empty());
        assert_eq!(snap.ports.len(), 1);
        assert!(!snap.ports[0].is_linked());
    }

    #[test]
    fn test_route_next_hop_must_belong_to_router() {
        let ctl = InMemoryController::new();
        let provider = router(&ctl, "provider");
        let tenant = router(&ctl, "Network1");
        let up = link_local_port(&ctl, tenant.id, 2);
        let err = ctl
            .create_route(provider.id, NewRoute::to(Ipv4Cidr::ANY, up.id, 100))
            .unwrap_err();
        assert!(matches!(err, ControllerError::InvalidRequest { .. }));
    }

    #[test]
    fn test_fault_injection_and_call_counts() {
        let ctl = InMemoryController::new();
        ctl.inject_fault(Operation::ListChains, ControllerError::unavailable("timeout"));

        assert_eq!(
            ctl.list_chains("tenant-a"),
            Err(ControllerError::unavailable("timeout"))
        );
        assert_eq!(ctl.list_chains("tenant-a"), Ok(Vec::new()));
        assert_eq!(ctl.call_count(Operation::ListChains), 2);
        assert_eq!(ctl.mutation_count(), 0);

        chain(&ctl, "c");
        assert_eq!(ctl.mutation_count(), 1);
        ctl.reset_call_counts();
        assert_eq!(ctl.call_count(Operation::ListChains), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let ctl = InMemoryController::new();
        let r = router(&ctl, "Network7");
        let c = chain(&ctl, "Network7-tenantrouter-pre-routing");
        ctl.update_router_filters(r.id, Some(c.id), None).unwrap();

        let json = serde_json::to_string(&ctl.snapshot()).unwrap();
        let restored: ControllerSnapshot = serde_json::from_str(&json).unwrap();
        let ctl2 = InMemoryController::from_snapshot(restored);

        assert_eq!(ctl2.snapshot(), ctl.snapshot());
        assert_eq!(
            ctl2.snapshot().router_named("Network7").unwrap().inbound_filter_id,
            Some(c.id)
        );
    }
}
