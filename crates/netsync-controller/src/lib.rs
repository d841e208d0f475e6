//! SDN controller model and API for netsync.
//!
//! - [`types`]: strongly typed object ids
//! - [`error`]: controller error type
//! - [`model`]: routers, bridges, ports, rule chains, rules and routes
//! - [`api`]: the synchronous [`Controller`] trait
//! - [`memory`]: [`InMemoryController`], a complete in-process controller
//!
//! # Example
//!
//! ```
//! use netsync_controller::{Controller, InMemoryController, NewChain, NewRule, RuleType};
//!
//! let ctl = InMemoryController::new();
//! let chain = ctl
//!     .create_chain(NewChain {
//!         name: "Network1-tenantrouter-pre-filter".to_string(),
//!         tenant_id: "tenant-a".to_string(),
//!     })
//!     .unwrap();
//! ctl.create_rule(chain.id, NewRule::new(RuleType::Drop)).unwrap();
//! assert_eq!(ctl.list_chains("tenant-a").unwrap()[0].rules.len(), 1);
//! ```

pub mod api;
pub mod error;
pub mod memory;
pub mod model;
pub mod types;

pub use api::{Controller, Operation};
pub use error::{ControllerError, ControllerResult};
pub use memory::{ControllerSnapshot, InMemoryController};
pub use model::{
    Bridge, Condition, DeviceId, FlowAction, NatTarget, NewBridge, NewChain, NewRoute, NewRouter,
    NewRouterPort, NewRule, Port, PortType, Route, Router, Rule, RuleChain, RuleType,
};
pub use types::{
    BridgeId, BridgeKind, ChainId, ChainKind, ObjectId, ObjectKind, PortId, PortKind, RouteId,
    RouteKind, RouterId, RouterKind, RuleId, RuleKind,
};
