//! The controller API consumed by the sync engine.
//!
//! Calls are synchronous and blocking. Every call may fail with a
//! [`ControllerError`](crate::ControllerError); callers propagate those
//! failures rather than retrying.

use crate::error::ControllerResult;
use crate::model::{
    Bridge, NewBridge, NewChain, NewRoute, NewRouter, NewRouterPort, NewRule, Port, Route, Router,
    Rule, RuleChain,
};
use crate::types::{BridgeId, ChainId, PortId, RouteId, RouterId, RuleId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CRUD access to the controller's virtual topology and rule state.
pub trait Controller {
    // Routers
    fn list_routers(&self, tenant_id: &str) -> ControllerResult<Vec<Router>>;
    fn get_router(&self, id: RouterId) -> ControllerResult<Option<Router>>;
    fn create_router(&self, router: NewRouter) -> ControllerResult<Router>;
    /// Replaces the router's inbound and outbound filter chains.
    fn update_router_filters(
        &self,
        id: RouterId,
        inbound: Option<ChainId>,
        outbound: Option<ChainId>,
    ) -> ControllerResult<Router>;
    /// Deletes the router together with its ports and routes.
    fn delete_router(&self, id: RouterId) -> ControllerResult<()>;

    // Bridges
    fn get_bridge(&self, id: BridgeId) -> ControllerResult<Option<Bridge>>;
    fn create_bridge(&self, bridge: NewBridge) -> ControllerResult<Bridge>;

    // Ports
    fn list_router_ports(&self, router_id: RouterId) -> ControllerResult<Vec<Port>>;
    fn list_bridge_ports(&self, bridge_id: BridgeId) -> ControllerResult<Vec<Port>>;
    fn get_port(&self, id: PortId) -> ControllerResult<Option<Port>>;
    fn create_router_port(&self, router_id: RouterId, port: NewRouterPort)
        -> ControllerResult<Port>;
    fn create_bridge_port(&self, bridge_id: BridgeId) -> ControllerResult<Port>;
    /// Peers two unlinked interior ports.
    fn link_ports(&self, port_id: PortId, peer_id: PortId) -> ControllerResult<()>;
    fn unlink_port(&self, port_id: PortId) -> ControllerResult<()>;
    /// Deletes a port, unlinking it first and dropping routes through it.
    fn delete_port(&self, port_id: PortId) -> ControllerResult<()>;

    // Chains and rules
    /// Lists every chain of the tenant, rules included.
    fn list_chains(&self, tenant_id: &str) -> ControllerResult<Vec<RuleChain>>;
    fn get_chain(&self, id: ChainId) -> ControllerResult<Option<RuleChain>>;
    fn create_chain(&self, chain: NewChain) -> ControllerResult<RuleChain>;
    fn delete_chain(&self, id: ChainId) -> ControllerResult<()>;
    /// Inserts a rule at `rule.position` (1-based) or appends it.
    fn create_rule(&self, chain_id: ChainId, rule: NewRule) -> ControllerResult<Rule>;
    fn delete_rule(&self, id: RuleId) -> ControllerResult<()>;

    // Routes
    fn list_routes(&self, router_id: RouterId) -> ControllerResult<Vec<Route>>;
    fn create_route(&self, router_id: RouterId, route: NewRoute) -> ControllerResult<Route>;
    fn delete_route(&self, id: RouteId) -> ControllerResult<()>;
}

/// One controller call, used for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListRouters,
    GetRouter,
    CreateRouter,
    UpdateRouterFilters,
    DeleteRouter,
    GetBridge,
    CreateBridge,
    ListRouterPorts,
    ListBridgePorts,
    GetPort,
    CreateRouterPort,
    CreateBridgePort,
    LinkPorts,
    UnlinkPort,
    DeletePort,
    ListChains,
    GetChain,
    CreateChain,
    DeleteChain,
    CreateRule,
    DeleteRule,
    ListRoutes,
    CreateRoute,
    DeleteRoute,
}

impl Operation {
    /// Returns true for calls that change controller state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Operation::ListRouters
                | Operation::GetRouter
                | Operation::GetBridge
                | Operation::ListRouterPorts
                | Operation::ListBridgePorts
                | Operation::GetPort
                | Operation::ListChains
                | Operation::GetChain
                | Operation::ListRoutes
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
