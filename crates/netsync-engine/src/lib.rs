//! Policy synchronization engine.
//!
//! Reconciles source NAT, static NAT, port forwarding and ingress firewall
//! rules for tenant networks against the rule chains of an SDN controller.
//! Each apply operation converges the controller towards the desired rule
//! set: rules already present (by [`fingerprint`](fingerprint::fingerprint))
//! are left alone, revoked rules are deleted, and the provider routes towards
//! public addresses live exactly as long as a rule references them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use netsync_controller::{Controller, InMemoryController, NewRouter};
//! use netsync_engine::{EngineConfig, Network, NetworkSyncEngine, SourceNatRule};
//!
//! let ctl = Arc::new(InMemoryController::new());
//! let provider = ctl
//!     .create_router(NewRouter {
//!         name: "provider".to_string(),
//!         tenant_id: "admin".to_string(),
//!     })
//!     .unwrap();
//! let mut engine = NetworkSyncEngine::new(ctl, EngineConfig::new(provider.id)).unwrap();
//!
//! let network = Network {
//!     id: 12,
//!     tenant_id: "tenant-a".to_string(),
//!     cidr: "10.1.1.0/24".parse().unwrap(),
//!     gateway: "10.1.1.1".parse().unwrap(),
//!     vpc_id: None,
//!     bridge_id: None,
//!     firewall_enabled: false,
//! };
//! let snat = SourceNatRule { public_address: "203.0.113.10".parse().unwrap() };
//!
//! assert!(engine.apply_source_nat(&network, &snat).unwrap());
//! assert!(!engine.apply_source_nat(&network, &snat).unwrap());
//! ```

pub mod capability;
pub mod chain;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod network;
pub mod reconcile;
pub mod refcount;
pub mod rules;
pub mod stats;
pub mod topology;

pub use capability::{CapabilityTable, ServiceCapability, ServiceKind};
pub use chain::{AclDirection, ChainLocator, ChainRole};
pub use config::{EngineConfig, RuleConfig, UplinkConfig};
pub use error::{ErrorClass, SyncError, SyncResult};
pub use fingerprint::{fingerprint, Fingerprint};
pub use network::{vpc_router_name, Network};
pub use reconcile::NetworkSyncEngine;
pub use refcount::{RefCountError, RefCountMap, RouteRefCounter};
pub use rules::{FirewallRule, PortForwardingRule, RuleState, SourceNatRule, StaticNatRule};
pub use stats::SyncStats;
pub use topology::{
    AclChains, BridgeUplink, RouterChains, TenantRouter, TopologyManager, UplinkPair,
};
