//! Reconciliation of desired rules against controller chains.
//!
//! Every apply call is one pass: ensure the router topology, snapshot the
//! relevant chains, index the rules of one kind by fingerprint, then revoke
//! before adding. Existing keys are never rewritten. A pass reports whether
//! it changed anything on the controller.

mod firewall;
mod port_forwarding;
mod source_nat;
mod static_nat;

use crate::capability::{CapabilityTable, ServiceKind};
use crate::chain::{record_inserted, record_removed, ChainLocator, ChainRole};
use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::fingerprint::fingerprint;
use crate::network::{vpc_router_name, Network};
use crate::refcount::RouteRefCounter;
use crate::rules::{FirewallRule, PortForwardingRule, SourceNatRule, StaticNatRule};
use crate::stats::SyncStats;
use crate::topology::{RouterChains, TopologyManager, UplinkPair};
use netsync_controller::{Controller, NewRule, Router, Rule};
use netsync_types::ProtocolTable;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tenant router state resolved at the start of a pass.
#[derive(Debug, Clone)]
pub(crate) struct RouterContext {
    pub(crate) router: Router,
    pub(crate) chains: RouterChains,
    pub(crate) uplink: UplinkPair,
}

/// Existing native rules of one kind, grouped by key.
#[derive(Debug)]
pub(crate) struct RuleIndex<K> {
    rules: HashMap<K, Vec<Rule>>,
}

impl<K: Eq + Hash> RuleIndex<K> {
    pub(crate) fn build<'r, I, F>(rules: I, key: F) -> Self
    where
        I: IntoIterator<Item = &'r Rule>,
        F: Fn(&Rule) -> Option<K>,
    {
        let mut index: HashMap<K, Vec<Rule>> = HashMap::new();
        for rule in rules {
            if let Some(k) = key(rule) {
                index.entry(k).or_default().push(rule.clone());
            }
        }
        Self { rules: index }
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.rules.get(key).is_some_and(|rules| !rules.is_empty())
    }

    /// Removes and returns every rule under `key`, duplicates included.
    pub(crate) fn take(&mut self, key: &K) -> Vec<Rule> {
        self.rules.remove(key).unwrap_or_default()
    }

    pub(crate) fn insert(&mut self, key: K, rule: Rule) {
        self.rules.entry(key).or_default().push(rule);
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

/// Borrowed engine state for the duration of one pass.
pub(crate) struct Pass<'a, C: Controller> {
    controller: &'a C,
    config: &'a EngineConfig,
    protocols: &'a ProtocolTable,
    stats: &'a mut SyncStats,
    locator: ChainLocator,
}

impl<'a, C: Controller> Pass<'a, C> {
    /// Ensures the tenant router, its chains and uplinks for `network`.
    fn prepare(&mut self, network: &Network) -> SyncResult<RouterContext> {
        let mut topology = TopologyManager::new(self.controller, self.config, self.stats);
        let tenant = topology.ensure_tenant_router(
            &mut self.locator,
            &network.tenant_id,
            &network.router_name(),
        )?;
        let uplink = topology.ensure_router_uplink(&tenant.router)?;
        if network.is_vpc_tier() {
            topology.ensure_acl_chains(&mut self.locator, &network.tenant_id, network.id)?;
        }
        if let Some(bridge_id) = network.bridge_id {
            topology.ensure_bridge_uplink(bridge_id, &tenant.router, network)?;
        }

        Ok(RouterContext {
            router: tenant.router,
            chains: tenant.chains,
            uplink,
        })
    }

    fn route_counter(&self, ctx: &RouterContext) -> SyncResult<RouteRefCounter> {
        RouteRefCounter::load(
            self.controller,
            self.config.provider_router_id,
            ctx.uplink.provider_port.id,
            &ctx.chains.pre_nat,
            self.config.rules.route_weight,
        )
    }

    /// Creates a rule at the configured insert position.
    fn insert_rule(
        &mut self,
        ctx: &mut RouterContext,
        role: ChainRole,
        rule: NewRule,
    ) -> SyncResult<Rule> {
        let chain = ctx.chains.get(role);
        let tail = u32::try_from(chain.rules.len() + 1).unwrap_or(u32::MAX);
        let position = self.config.rules.insert_position.min(tail);
        self.create_rule(ctx, role, rule.at(position))
    }

    /// Creates a rule at the end of the chain.
    fn append_rule(
        &mut self,
        ctx: &mut RouterContext,
        role: ChainRole,
        rule: NewRule,
    ) -> SyncResult<Rule> {
        self.create_rule(ctx, role, rule)
    }

    fn create_rule(
        &mut self,
        ctx: &mut RouterContext,
        role: ChainRole,
        rule: NewRule,
    ) -> SyncResult<Rule> {
        let chain = ctx.chains.get_mut(role);
        let created = self.controller.create_rule(chain.id, rule)?;
        self.stats.record_rule_created();
        debug!(
            "Created {:?} rule {} at {} in {}",
            created.rule_type,
            fingerprint(&created),
            created.position,
            chain.name
        );
        record_inserted(chain, created.clone());
        Ok(created)
    }

    fn delete_rule(
        &mut self,
        ctx: &mut RouterContext,
        role: ChainRole,
        rule: &Rule,
    ) -> SyncResult<()> {
        let chain = ctx.chains.get_mut(role);
        self.controller.delete_rule(rule.id)?;
        self.stats.record_rule_deleted();
        debug!(
            "Deleted {:?} rule {} from {}",
            rule.rule_type,
            fingerprint(rule),
            chain.name
        );
        record_removed(chain, rule.id);
        Ok(())
    }

    fn destroy(&mut self, network: &Network) -> SyncResult<()> {
        let mut topology = TopologyManager::new(self.controller, self.config, self.stats);
        let router_name = network.router_name();

        if let Some(bridge_id) = network.bridge_id {
            if let Some(router) = topology.find_router(&network.tenant_id, &router_name)? {
                topology.remove_bridge_uplink(bridge_id, &router)?;
            }
        }
        if network.is_vpc_tier() {
            topology.remove_acl_chains(&mut self.locator, &network.tenant_id, network.id)?;
        } else {
            topology.destroy_tenant_router(&mut self.locator, &network.tenant_id, &router_name)?;
        }
        Ok(())
    }
}

/// Synchronizes network services of tenant networks onto the controller.
pub struct NetworkSyncEngine<C: Controller> {
    controller: Arc<C>,
    config: EngineConfig,
    protocols: Arc<ProtocolTable>,
    capabilities: CapabilityTable,
    stats: SyncStats,
}

impl<C: Controller> NetworkSyncEngine<C> {
    /// Creates an engine; the configuration is validated first.
    pub fn new(controller: Arc<C>, config: EngineConfig) -> SyncResult<Self> {
        config.validate()?;
        let protocols = Arc::new(config.protocol_table());
        info!(
            "Sync engine initialized, provider router {}, {} protocols",
            config.provider_router_id,
            protocols.names().count()
        );
        Ok(Self {
            controller,
            config,
            protocols,
            capabilities: CapabilityTable::standard(),
            stats: SyncStats::default(),
        })
    }

    /// Replaces the protocol table built from the configuration.
    pub fn with_protocols(mut self, protocols: Arc<ProtocolTable>) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn protocols(&self) -> &ProtocolTable {
        &self.protocols
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    fn run_pass<F>(&mut self, kind: ServiceKind, op: F) -> SyncResult<bool>
    where
        F: FnOnce(&mut Pass<'_, C>) -> SyncResult<()>,
    {
        if !self.capabilities.supports(kind) {
            return Err(SyncError::invalid_rule(format!("{} is not supported", kind)));
        }

        let before = self.stats.mutations();
        let result = {
            let mut pass = Pass {
                controller: self.controller.as_ref(),
                config: &self.config,
                protocols: self.protocols.as_ref(),
                stats: &mut self.stats,
                locator: ChainLocator::new(),
            };
            op(&mut pass)
        };
        self.stats.record_pass();

        match result {
            Ok(()) => {
                let changed = self.stats.mutations() != before;
                debug!("{} pass finished, changed: {}", kind, changed);
                Ok(changed)
            }
            Err(e) => {
                self.stats.record_failure();
                warn!("{} pass failed: {}", kind, e);
                Err(e)
            }
        }
    }

    /// Ensures the router, chains and uplinks of a network without touching
    /// any service rules.
    #[instrument(skip(self, network), fields(network = network.id))]
    pub fn prepare_network(&mut self, network: &Network) -> SyncResult<bool> {
        self.run_pass(ServiceKind::Connectivity, |pass| {
            pass.prepare(network).map(|_| ())
        })
    }

    /// Installs source NAT for all traffic leaving the network's router
    /// through `rule.public_address`, replacing any other source NAT address.
    #[instrument(skip(self, network), fields(network = network.id))]
    pub fn apply_source_nat(
        &mut self,
        network: &Network,
        rule: &SourceNatRule,
    ) -> SyncResult<bool> {
        self.run_pass(ServiceKind::SourceNat, |pass| pass.source_nat(network, rule))
    }

    #[instrument(skip(self, network, rules), fields(network = network.id, rules = rules.len()))]
    pub fn apply_static_nats(
        &mut self,
        network: &Network,
        rules: &[StaticNatRule],
    ) -> SyncResult<bool> {
        self.run_pass(ServiceKind::StaticNat, |pass| pass.static_nats(network, rules))
    }

    #[instrument(skip(self, network, rules), fields(network = network.id, rules = rules.len()))]
    pub fn apply_port_forwarding_rules(
        &mut self,
        network: &Network,
        rules: &[PortForwardingRule],
    ) -> SyncResult<bool> {
        self.run_pass(ServiceKind::PortForwarding, |pass| {
            pass.port_forwarding(network, rules)
        })
    }

    #[instrument(skip(self, network, rules), fields(network = network.id, rules = rules.len()))]
    pub fn apply_firewall_rules(
        &mut self,
        network: &Network,
        rules: &[FirewallRule],
    ) -> SyncResult<bool> {
        self.run_pass(ServiceKind::Firewall, |pass| pass.firewall(network, rules))
    }

    /// Removes what the engine created for a network. For a VPC tier only the
    /// tier's ACL chains and bridge attachment go; the shared router stays
    /// until [`destroy_vpc`](Self::destroy_vpc).
    #[instrument(skip(self, network), fields(network = network.id))]
    pub fn destroy_network(&mut self, network: &Network) -> SyncResult<bool> {
        self.run_pass(ServiceKind::Connectivity, |pass| pass.destroy(network))
    }

    /// Removes the router shared by the tiers of a VPC.
    #[instrument(skip(self))]
    pub fn destroy_vpc(&mut self, tenant_id: &str, vpc_id: u64) -> SyncResult<bool> {
        self.run_pass(ServiceKind::Connectivity, |pass| {
            let mut topology = TopologyManager::new(pass.controller, pass.config, pass.stats);
            let name = vpc_router_name(vpc_id);
            topology.destroy_tenant_router(&mut pass.locator, tenant_id, &name)?;
            Ok(())
        })
    }
}
