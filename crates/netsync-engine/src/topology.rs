//! Router, chain and port topology.
//!
//! Every tenant router hangs off the provider router through a point-to-point
//! link-local port pair. The pair goes through `Absent -> PortsCreated ->
//! Linked`; a pass that finds unlinked link-local ports left behind by an
//! earlier failure reuses them instead of creating new ones.

use crate::chain::{record_inserted, AclDirection, ChainLocator, ChainRole};
use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::network::Network;
use crate::stats::SyncStats;
use netsync_controller::{
    BridgeId, ChainId, Condition, Controller, DeviceId, FlowAction, NewRoute, NewRouter,
    NewRouterPort, NewRule, Port, PortType, Router, RouterId, RuleChain, RuleType,
};
use netsync_types::Ipv4Cidr;
use std::net::Ipv4Addr;
use tracing::{debug, info, instrument, warn};

/// The four chains of a tenant router.
#[derive(Debug, Clone)]
pub struct RouterChains {
    pub pre_routing: RuleChain,
    pub pre_filter: RuleChain,
    pub pre_nat: RuleChain,
    pub post_routing: RuleChain,
}

impl RouterChains {
    pub fn get(&self, role: ChainRole) -> &RuleChain {
        match role {
            ChainRole::PreRouting => &self.pre_routing,
            ChainRole::PreFilter => &self.pre_filter,
            ChainRole::PreNat => &self.pre_nat,
            ChainRole::PostRouting => &self.post_routing,
        }
    }

    pub fn get_mut(&mut self, role: ChainRole) -> &mut RuleChain {
        match role {
            ChainRole::PreRouting => &mut self.pre_routing,
            ChainRole::PreFilter => &mut self.pre_filter,
            ChainRole::PreNat => &mut self.pre_nat,
            ChainRole::PostRouting => &mut self.post_routing,
        }
    }
}

/// A tenant router together with its chains.
#[derive(Debug, Clone)]
pub struct TenantRouter {
    pub router: Router,
    pub chains: RouterChains,
}

/// Tenant uplink and provider downlink, peered.
#[derive(Debug, Clone)]
pub struct UplinkPair {
    pub tenant_port: Port,
    pub provider_port: Port,
}

/// Router port at the network gateway and the bridge port it is peered with.
#[derive(Debug, Clone)]
pub struct BridgeUplink {
    pub router_port: Port,
    pub bridge_port: Port,
}

/// The ingress and egress ACL chains of a VPC tier.
#[derive(Debug, Clone)]
pub struct AclChains {
    pub ingress: RuleChain,
    pub egress: RuleChain,
}

fn has_jump(chain: &RuleChain, target: ChainId) -> bool {
    chain
        .rules
        .iter()
        .any(|r| r.rule_type == RuleType::Jump && r.jump_chain_id == Some(target))
}

fn has_reverse_dnat(chain: &RuleChain) -> bool {
    chain
        .rules
        .iter()
        .any(|r| r.rule_type == RuleType::RevDnat && r.condition == Condition::default())
}

fn is_free_port(port: &Port, network: Ipv4Cidr, address: Ipv4Addr) -> bool {
    !port.is_linked()
        && port.port_type == PortType::Interior
        && port.network.map(|n| n.masked()) == Some(network.masked())
        && port.port_address == Some(address)
}

/// Ensures routers, chains and port pairs exist.
pub struct TopologyManager<'a, C: Controller> {
    controller: &'a C,
    config: &'a EngineConfig,
    stats: &'a mut SyncStats,
}

impl<'a, C: Controller> TopologyManager<'a, C> {
    pub fn new(controller: &'a C, config: &'a EngineConfig, stats: &'a mut SyncStats) -> Self {
        Self {
            controller,
            config,
            stats,
        }
    }

    /// Looks up a tenant router by exact name.
    pub fn find_router(&self, tenant_id: &str, router_name: &str) -> SyncResult<Option<Router>> {
        Ok(self
            .controller
            .list_routers(tenant_id)?
            .into_iter()
            .find(|r| r.name == router_name))
    }

    /// Returns the named tenant router with its chains, creating and wiring
    /// whatever is missing.
    ///
    /// A router whose filters are already attached is considered fully wired;
    /// a missing chain on such a router is reported as
    /// [`SyncError::ChainNotFound`] rather than silently recreated.
    #[instrument(skip(self, locator))]
    pub fn ensure_tenant_router(
        &mut self,
        locator: &mut ChainLocator,
        tenant_id: &str,
        router_name: &str,
    ) -> SyncResult<TenantRouter> {
        let router = match self.find_router(tenant_id, router_name)? {
            Some(router)
                if router.inbound_filter_id.is_some() && router.outbound_filter_id.is_some() =>
            {
                let chains = RouterChains {
                    pre_routing: locator.require_chain(
                        self.controller,
                        tenant_id,
                        router_name,
                        ChainRole::PreRouting,
                    )?,
                    pre_filter: locator.require_chain(
                        self.controller,
                        tenant_id,
                        router_name,
                        ChainRole::PreFilter,
                    )?,
                    pre_nat: locator.require_chain(
                        self.controller,
                        tenant_id,
                        router_name,
                        ChainRole::PreNat,
                    )?,
                    post_routing: locator.require_chain(
                        self.controller,
                        tenant_id,
                        router_name,
                        ChainRole::PostRouting,
                    )?,
                };
                return Ok(TenantRouter { router, chains });
            }
            Some(router) => {
                warn!("Router {} has no filters attached, completing wiring", router_name);
                router
            }
            None => {
                let router = self.controller.create_router(NewRouter {
                    name: router_name.to_string(),
                    tenant_id: tenant_id.to_string(),
                })?;
                self.stats.record_router_created();
                info!("Created tenant router {} ({})", router_name, router.id);
                router
            }
        };

        self.wire_router(locator, tenant_id, router)
    }

    fn wire_router(
        &mut self,
        locator: &mut ChainLocator,
        tenant_id: &str,
        router: Router,
    ) -> SyncResult<TenantRouter> {
        let mut chains = RouterChains {
            pre_routing: self.chain(locator, tenant_id, &router.name, ChainRole::PreRouting)?,
            pre_filter: self.chain(locator, tenant_id, &router.name, ChainRole::PreFilter)?,
            pre_nat: self.chain(locator, tenant_id, &router.name, ChainRole::PreNat)?,
            post_routing: self.chain(locator, tenant_id, &router.name, ChainRole::PostRouting)?,
        };

        if !has_jump(&chains.pre_routing, chains.pre_filter.id) {
            let rule = self
                .controller
                .create_rule(chains.pre_routing.id, NewRule::jump(chains.pre_filter.id).at(1))?;
            self.stats.record_rule_created();
            record_inserted(&mut chains.pre_routing, rule);
        }
        if !has_jump(&chains.pre_routing, chains.pre_nat.id) {
            let rule = self
                .controller
                .create_rule(chains.pre_routing.id, NewRule::jump(chains.pre_nat.id))?;
            self.stats.record_rule_created();
            record_inserted(&mut chains.pre_routing, rule);
        }
        if !has_reverse_dnat(&chains.post_routing) {
            let rule = self.controller.create_rule(
                chains.post_routing.id,
                NewRule::new(RuleType::RevDnat).flow_action(FlowAction::Accept),
            )?;
            self.stats.record_rule_created();
            record_inserted(&mut chains.post_routing, rule);
        }

        let router = self.controller.update_router_filters(
            router.id,
            Some(chains.pre_routing.id),
            Some(chains.post_routing.id),
        )?;
        self.stats.record_router_updated();
        debug!("Attached filters to router {}", router.name);

        Ok(TenantRouter { router, chains })
    }

    fn chain(
        &mut self,
        locator: &mut ChainLocator,
        tenant_id: &str,
        router_name: &str,
        role: ChainRole,
    ) -> SyncResult<RuleChain> {
        locator.get_or_create(
            self.controller,
            tenant_id,
            &role.chain_name(router_name),
            self.stats,
        )
    }

    /// Returns the port pair linking `tenant_router` to the provider router,
    /// creating or completing it as needed.
    #[instrument(skip(self, tenant_router), fields(router = %tenant_router.name))]
    pub fn ensure_router_uplink(&mut self, tenant_router: &Router) -> SyncResult<UplinkPair> {
        let config: &'a EngineConfig = self.config;
        let provider_id = config.provider_router_id;
        let tenant_ports = self.controller.list_router_ports(tenant_router.id)?;

        if let Some(pair) = self.find_peered(&tenant_ports, DeviceId::Router(provider_id))? {
            return Ok(UplinkPair {
                tenant_port: pair.0,
                provider_port: pair.1,
            });
        }

        let uplink = &config.uplink;
        let tenant_port = match tenant_ports
            .into_iter()
            .find(|p| is_free_port(p, uplink.network, uplink.tenant_address))
        {
            Some(port) => {
                warn!("Reusing unlinked uplink port {} on {}", port.id, tenant_router.name);
                port
            }
            None => self.create_router_port(
                tenant_router.id,
                NewRouterPort::interior(uplink.network, uplink.tenant_address),
            )?,
        };

        if self.controller.get_router(provider_id)?.is_none() {
            return Err(SyncError::inconsistent(format!(
                "provider router {} does not exist",
                provider_id
            )));
        }
        let provider_port = match self
            .controller
            .list_router_ports(provider_id)?
            .into_iter()
            .find(|p| is_free_port(p, uplink.network, uplink.provider_address))
        {
            Some(port) => {
                warn!("Reusing unlinked provider downlink port {}", port.id);
                port
            }
            None => self.create_router_port(
                provider_id,
                NewRouterPort::interior(uplink.network, uplink.provider_address),
            )?,
        };

        let (tenant_port, provider_port) = self.link(tenant_port, provider_port)?;
        info!(
            "Linked router {} to provider router via {}",
            tenant_router.name, uplink.network
        );
        Ok(UplinkPair {
            tenant_port,
            provider_port,
        })
    }

    /// Returns the port pair linking `router` to the network's bridge and
    /// makes sure the router routes the network CIDR through it.
    #[instrument(skip(self, router, network), fields(router = %router.name, network = network.id))]
    pub fn ensure_bridge_uplink(
        &mut self,
        bridge_id: BridgeId,
        router: &Router,
        network: &Network,
    ) -> SyncResult<BridgeUplink> {
        if self.controller.get_bridge(bridge_id)?.is_none() {
            return Err(SyncError::inconsistent(format!(
                "bridge {} of network {} does not exist",
                bridge_id, network.id
            )));
        }

        let router_ports = self.controller.list_router_ports(router.id)?;
        let (router_port, bridge_port) =
            match self.find_peered(&router_ports, DeviceId::Bridge(bridge_id))? {
                Some(pair) => pair,
                None => {
                    let router_port = match router_ports
                        .into_iter()
                        .find(|p| is_free_port(p, network.cidr, network.gateway))
                    {
                        Some(port) => {
                            warn!("Reusing unlinked gateway port {}", port.id);
                            port
                        }
                        None => self.create_router_port(
                            router.id,
                            NewRouterPort::interior(network.cidr.masked(), network.gateway),
                        )?,
                    };
                    let bridge_port = match self
                        .controller
                        .list_bridge_ports(bridge_id)?
                        .into_iter()
                        .find(|p| !p.is_linked() && p.port_type == PortType::Interior)
                    {
                        Some(port) => port,
                        None => {
                            let port = self.controller.create_bridge_port(bridge_id)?;
                            self.stats.record_port_created();
                            port
                        }
                    };
                    let pair = self.link(router_port, bridge_port)?;
                    info!("Linked router {} to bridge {}", router.name, bridge_id);
                    pair
                }
            };

        let destination = network.cidr.masked();
        let routed = self
            .controller
            .list_routes(router.id)?
            .iter()
            .any(|r| r.dst_network == destination && r.next_hop_port == router_port.id);
        if !routed {
            self.controller.create_route(
                router.id,
                NewRoute::to(destination, router_port.id, self.config.rules.route_weight),
            )?;
            self.stats.record_route_created();
            info!("Created route to {} on router {}", destination, router.name);
        }

        Ok(BridgeUplink {
            router_port,
            bridge_port,
        })
    }

    /// Returns the ACL chains of a VPC tier, creating them if absent.
    #[instrument(skip(self, locator))]
    pub fn ensure_acl_chains(
        &mut self,
        locator: &mut ChainLocator,
        tenant_id: &str,
        network_id: u64,
    ) -> SyncResult<AclChains> {
        let ingress = locator.get_or_create(
            self.controller,
            tenant_id,
            &AclDirection::Ingress.chain_name(network_id),
            self.stats,
        )?;
        let egress = locator.get_or_create(
            self.controller,
            tenant_id,
            &AclDirection::Egress.chain_name(network_id),
            self.stats,
        )?;
        Ok(AclChains { ingress, egress })
    }

    /// Deletes the ACL chains of a VPC tier. Returns true if any existed.
    #[instrument(skip(self, locator))]
    pub fn remove_acl_chains(
        &mut self,
        locator: &mut ChainLocator,
        tenant_id: &str,
        network_id: u64,
    ) -> SyncResult<bool> {
        let mut removed = false;
        for direction in [AclDirection::Ingress, AclDirection::Egress] {
            if let Some(chain) =
                locator.find(self.controller, tenant_id, &direction.chain_name(network_id))?
            {
                self.controller.delete_chain(chain.id)?;
                self.stats.record_chain_deleted();
                locator.forget(tenant_id, chain.id);
                debug!("Deleted chain {}", chain.name);
                removed = true;
            }
        }
        Ok(removed)
    }

    /// Detaches a bridge from its router: drops the routes through the
    /// gateway port, then deletes both ends of the link.
    #[instrument(skip(self, router), fields(router = %router.name))]
    pub fn remove_bridge_uplink(
        &mut self,
        bridge_id: BridgeId,
        router: &Router,
    ) -> SyncResult<bool> {
        let router_ports = self.controller.list_router_ports(router.id)?;
        let Some((router_port, bridge_port)) =
            self.find_peered(&router_ports, DeviceId::Bridge(bridge_id))?
        else {
            return Ok(false);
        };

        self.delete_routes_via(router.id, &router_port)?;
        self.delete_port(&router_port)?;
        self.delete_port(&bridge_port)?;
        info!("Detached bridge {} from router {}", bridge_id, router.name);
        Ok(true)
    }

    /// Tears down a tenant router: provider routes through its downlink, the
    /// uplink pair, the router and its chains.
    ///
    /// Returns false when there was nothing left to delete.
    #[instrument(skip(self, locator))]
    pub fn destroy_tenant_router(
        &mut self,
        locator: &mut ChainLocator,
        tenant_id: &str,
        router_name: &str,
    ) -> SyncResult<bool> {
        let mut changed = false;

        if let Some(router) = self.find_router(tenant_id, router_name)? {
            let provider_id = self.config.provider_router_id;
            let tenant_ports = self.controller.list_router_ports(router.id)?;
            if let Some((tenant_port, provider_port)) =
                self.find_peered(&tenant_ports, DeviceId::Router(provider_id))?
            {
                self.delete_routes_via(provider_id, &provider_port)?;
                self.delete_port(&provider_port)?;
                self.delete_port(&tenant_port)?;
            }

            self.controller.delete_router(router.id)?;
            self.stats.record_router_deleted();
            info!("Deleted tenant router {} ({})", router_name, router.id);
            changed = true;
        }

        for role in ChainRole::ALL {
            if let Some(chain) = locator.get_chain(self.controller, tenant_id, router_name, role)? {
                self.controller.delete_chain(chain.id)?;
                self.stats.record_chain_deleted();
                locator.forget(tenant_id, chain.id);
                debug!("Deleted chain {}", chain.name);
                changed = true;
            }
        }

        if !changed {
            debug!("Router {} already gone", router_name);
        }
        Ok(changed)
    }

    /// Finds a port among `ports` whose peer sits on `device`.
    fn find_peered(&self, ports: &[Port], device: DeviceId) -> SyncResult<Option<(Port, Port)>> {
        for port in ports {
            let Some(peer_id) = port.peer_id else {
                continue;
            };
            match self.controller.get_port(peer_id)? {
                Some(peer) if peer.device_id == device => return Ok(Some((port.clone(), peer))),
                Some(_) => {}
                None => warn!("Port {} is linked to missing port {}", port.id, peer_id),
            }
        }
        Ok(None)
    }

    fn create_router_port(&mut self, router_id: RouterId, port: NewRouterPort) -> SyncResult<Port> {
        let port = self.controller.create_router_port(router_id, port)?;
        self.stats.record_port_created();
        debug!(
            "Created port {} on router {} at {:?}",
            port.id, router_id, port.port_address
        );
        Ok(port)
    }

    fn link(&mut self, mut port: Port, mut peer: Port) -> SyncResult<(Port, Port)> {
        self.controller.link_ports(port.id, peer.id)?;
        self.stats.record_port_linked();
        port.peer_id = Some(peer.id);
        peer.peer_id = Some(port.id);
        Ok((port, peer))
    }

    /// Deletes a port; the controller unlinks its peer and drops routes
    /// through it.
    fn delete_port(&mut self, port: &Port) -> SyncResult<()> {
        self.controller.delete_port(port.id)?;
        self.stats.record_port_deleted();
        debug!("Deleted port {} on {:?}", port.id, port.device_id);
        Ok(())
    }

    fn delete_routes_via(&mut self, router_id: RouterId, port: &Port) -> SyncResult<()> {
        for route in self.controller.list_routes(router_id)? {
            if route.next_hop_port == port.id {
                self.controller.delete_route(route.id)?;
                self.stats.record_route_deleted();
                debug!("Deleted route to {} via {}", route.dst_network, port.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsync_controller::{ControllerError, InMemoryController, NewBridge, Operation};
    use pretty_assertions::assert_eq;

    struct Fixture {
        ctl: InMemoryController,
        config: EngineConfig,
        provider: RouterId,
    }

    fn fixture() -> Fixture {
        let ctl = InMemoryController::new();
        let provider = ctl
            .create_router(NewRouter {
                name: "provider".to_string(),
                tenant_id: "admin".to_string(),
            })
            .unwrap();
        Fixture {
            ctl,
            config: EngineConfig::new(provider.id),
            provider: provider.id,
        }
    }

    fn tenant_router(f: &Fixture, stats: &mut SyncStats) -> TenantRouter {
        let mut locator = ChainLocator::new();
        TopologyManager::new(&f.ctl, &f.config, stats)
            .ensure_tenant_router(&mut locator, "tenant-a", "Network1")
            .unwrap()
    }

    #[test]
    fn test_tenant_router_is_wired() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let tr = tenant_router(&f, &mut stats);

        assert_eq!(tr.router.inbound_filter_id, Some(tr.chains.pre_routing.id));
        assert_eq!(tr.router.outbound_filter_id, Some(tr.chains.post_routing.id));
        assert_eq!(tr.chains.pre_routing.rules.len(), 2);
        assert_eq!(tr.chains.pre_routing.rules[0].jump_chain_id, Some(tr.chains.pre_filter.id));
        assert_eq!(tr.chains.pre_routing.rules[1].jump_chain_id, Some(tr.chains.pre_nat.id));
        assert_eq!(tr.chains.post_routing.rules[0].rule_type, RuleType::RevDnat);
        assert_eq!(stats.chains_created, 4);
        assert_eq!(stats.rules_created, 3);

        let remote = f.ctl.get_chain(tr.chains.pre_routing.id).unwrap().unwrap();
        assert_eq!(remote.rules, tr.chains.pre_routing.rules);
    }

    #[test]
    fn test_tenant_router_second_call_is_read_only() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let first = tenant_router(&f, &mut stats);
        let before = stats.mutations();

        let second = tenant_router(&f, &mut stats);
        assert_eq!(stats.mutations(), before);
        assert_eq!(first.router.id, second.router.id);
        assert_eq!(first.chains.pre_nat.id, second.chains.pre_nat.id);
    }

    #[test]
    fn test_partially_wired_router_is_completed() {
        let f = fixture();
        let mut stats = SyncStats::default();
        f.ctl.inject_fault(
            Operation::UpdateRouterFilters,
            ControllerError::unavailable("timeout"),
        );
        let mut locator = ChainLocator::new();
        let err = TopologyManager::new(&f.ctl, &f.config, &mut stats)
            .ensure_tenant_router(&mut locator, "tenant-a", "Network1")
            .unwrap_err();
        assert!(err.is_retryable());

        let tr = tenant_router(&f, &mut stats);
        assert!(tr.router.inbound_filter_id.is_some());
        let snapshot = f.ctl.snapshot();
        assert_eq!(snapshot.routers.len(), 2);
        assert_eq!(snapshot.chains.len(), 4);
        assert_eq!(tr.chains.pre_routing.rules.len(), 2);
    }

    #[test]
    fn test_uplink_created_once() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let tr = tenant_router(&f, &mut stats);

        let mut topo = TopologyManager::new(&f.ctl, &f.config, &mut stats);
        let pair = topo.ensure_router_uplink(&tr.router).unwrap();
        assert_eq!(pair.tenant_port.peer_id, Some(pair.provider_port.id));
        assert_eq!(pair.provider_port.device_id, DeviceId::Router(f.provider));
        assert_eq!(
            pair.tenant_port.port_address,
            Some(Ipv4Addr::new(169, 254, 255, 2))
        );

        let again = topo.ensure_router_uplink(&tr.router).unwrap();
        assert_eq!(again.tenant_port.id, pair.tenant_port.id);
        assert_eq!(stats.ports_created, 2);
        assert_eq!(stats.ports_linked, 1);
    }

    #[test]
    fn test_uplink_repairs_unlinked_ports() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let tr = tenant_router(&f, &mut stats);

        f.ctl
            .inject_fault(Operation::LinkPorts, ControllerError::unavailable("timeout"));
        let mut topo = TopologyManager::new(&f.ctl, &f.config, &mut stats);
        assert!(topo.ensure_router_uplink(&tr.router).is_err());

        let pair = topo.ensure_router_uplink(&tr.router).unwrap();
        assert!(pair.tenant_port.is_linked());
        assert_eq!(stats.ports_created, 2);
        assert_eq!(f.ctl.list_router_ports(tr.router.id).unwrap().len(), 1);
        assert_eq!(f.ctl.list_router_ports(f.provider).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_provider_router() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let tr = tenant_router(&f, &mut stats);
        let config = EngineConfig::new(RouterId::new());
        let err = TopologyManager::new(&f.ctl, &config, &mut stats)
            .ensure_router_uplink(&tr.router)
            .unwrap_err();
        assert!(matches!(err, SyncError::InconsistentState { .. }));
    }

    #[test]
    fn test_bridge_uplink_and_route() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let tr = tenant_router(&f, &mut stats);
        let bridge = f
            .ctl
            .create_bridge(NewBridge {
                name: "tier1".to_string(),
                tenant_id: "tenant-a".to_string(),
            })
            .unwrap();
        let network = Network {
            id: 1,
            tenant_id: "tenant-a".to_string(),
            cidr: "10.1.1.0/24".parse().unwrap(),
            gateway: Ipv4Addr::new(10, 1, 1, 1),
            vpc_id: None,
            bridge_id: Some(bridge.id),
            firewall_enabled: false,
        };

        let mut topo = TopologyManager::new(&f.ctl, &f.config, &mut stats);
        let uplink = topo.ensure_bridge_uplink(bridge.id, &tr.router, &network).unwrap();
        topo.ensure_bridge_uplink(bridge.id, &tr.router, &network).unwrap();

        assert_eq!(uplink.bridge_port.device_id, DeviceId::Bridge(bridge.id));
        let routes = f.ctl.list_routes(tr.router.id).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].dst_network, network.cidr);
        assert_eq!(routes[0].next_hop_port, uplink.router_port.id);

        assert!(topo.remove_bridge_uplink(bridge.id, &tr.router).unwrap());
        assert!(!topo.remove_bridge_uplink(bridge.id, &tr.router).unwrap());
        assert!(f.ctl.list_routes(tr.router.id).unwrap().is_empty());
        assert!(f.ctl.list_router_ports(tr.router.id).unwrap().is_empty());
        assert!(f.ctl.list_bridge_ports(bridge.id).unwrap().is_empty());
        assert_eq!(stats.ports_deleted, 2);
    }

    #[test]
    fn test_acl_chains() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let mut locator = ChainLocator::new();
        let mut topo = TopologyManager::new(&f.ctl, &f.config, &mut stats);

        let acl = topo.ensure_acl_chains(&mut locator, "tenant-a", 7).unwrap();
        assert_eq!(acl.ingress.name, "ACL-ingress-7");
        assert_eq!(acl.egress.name, "ACL-egress-7");

        assert!(topo.remove_acl_chains(&mut locator, "tenant-a", 7).unwrap());
        assert!(!topo.remove_acl_chains(&mut locator, "tenant-a", 7).unwrap());
        assert!(f.ctl.snapshot().chains.is_empty());
    }

    #[test]
    fn test_destroy_tenant_router() {
        let f = fixture();
        let mut stats = SyncStats::default();
        let tr = tenant_router(&f, &mut stats);
        {
            let mut topo = TopologyManager::new(&f.ctl, &f.config, &mut stats);
            let pair = topo.ensure_router_uplink(&tr.router).unwrap();
            f.ctl
                .create_route(
                    f.provider,
                    NewRoute::to("203.0.113.5/32".parse().unwrap(), pair.provider_port.id, 100),
                )
                .unwrap();
        }

        let mut locator = ChainLocator::new();
        let mut topo = TopologyManager::new(&f.ctl, &f.config, &mut stats);
        assert!(topo
            .destroy_tenant_router(&mut locator, "tenant-a", "Network1")
            .unwrap());
        assert!(!topo
            .destroy_tenant_router(&mut locator, "tenant-a", "Network1")
            .unwrap());

        let snapshot = f.ctl.snapshot();
        assert_eq!(snapshot.routers.len(), 1);
        assert!(snapshot.ports.is_empty());
        assert!(snapshot.chains.is_empty());
        assert!(snapshot.routes.is_empty());
    }
}
