//! Well-known chain names and the chain locator.
//!
//! Chain names are deterministic, so chains are found by listing a tenant's
//! chains and matching the name client side. The listing is cached for the
//! lifetime of one locator, which the engine creates once per apply call.

use crate::error::{SyncError, SyncResult};
use crate::stats::SyncStats;
use netsync_controller::{ChainId, Controller, NewChain, Rule, RuleChain, RuleId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Role of a chain attached to a tenant router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainRole {
    /// Router inbound filter; jumps to pre-filter then pre-nat.
    PreRouting,
    /// Firewall and floating address filtering.
    PreFilter,
    /// DNAT and reverse SNAT.
    PreNat,
    /// Router outbound filter; SNAT and reverse DNAT.
    PostRouting,
}

impl ChainRole {
    pub const ALL: [ChainRole; 4] = [
        ChainRole::PreRouting,
        ChainRole::PreFilter,
        ChainRole::PreNat,
        ChainRole::PostRouting,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            ChainRole::PreRouting => "pre-routing",
            ChainRole::PreFilter => "pre-filter",
            ChainRole::PreNat => "pre-nat",
            ChainRole::PostRouting => "post-routing",
        }
    }

    /// Full chain name for a router, e.g. `Network12-tenantrouter-pre-nat`.
    pub fn chain_name(&self, router_name: &str) -> String {
        format!("{}-tenantrouter-{}", router_name, self.suffix())
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Direction of a VPC tier ACL chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclDirection {
    Ingress,
    Egress,
}

impl AclDirection {
    /// Full chain name for a network, e.g. `ACL-ingress-12`.
    pub fn chain_name(&self, network_id: u64) -> String {
        match self {
            AclDirection::Ingress => format!("ACL-ingress-{}", network_id),
            AclDirection::Egress => format!("ACL-egress-{}", network_id),
        }
    }
}

/// Resolves chains by name with a per-tenant listing cache.
#[derive(Debug, Default)]
pub struct ChainLocator {
    listings: HashMap<String, Vec<RuleChain>>,
}

impl ChainLocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn listing<C: Controller>(
        &mut self,
        controller: &C,
        tenant_id: &str,
    ) -> SyncResult<&mut Vec<RuleChain>> {
        match self.listings.entry(tenant_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let chains = controller.list_chains(tenant_id)?;
                debug!(tenant = tenant_id, count = chains.len(), "listed chains");
                Ok(entry.insert(chains))
            }
        }
    }

    /// Finds a tenant chain by exact name.
    pub fn find<C: Controller>(
        &mut self,
        controller: &C,
        tenant_id: &str,
        name: &str,
    ) -> SyncResult<Option<RuleChain>> {
        Ok(self
            .listing(controller, tenant_id)?
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    /// Finds one of a router's chains.
    pub fn get_chain<C: Controller>(
        &mut self,
        controller: &C,
        tenant_id: &str,
        router_name: &str,
        role: ChainRole,
    ) -> SyncResult<Option<RuleChain>> {
        self.find(controller, tenant_id, &role.chain_name(router_name))
    }

    /// Like [`get_chain`](Self::get_chain) but treats absence as an error.
    pub fn require_chain<C: Controller>(
        &mut self,
        controller: &C,
        tenant_id: &str,
        router_name: &str,
        role: ChainRole,
    ) -> SyncResult<RuleChain> {
        let name = role.chain_name(router_name);
        self.find(controller, tenant_id, &name)?
            .ok_or_else(|| SyncError::chain_not_found(tenant_id, name))
    }

    /// Returns the named chain, creating it if absent.
    pub fn get_or_create<C: Controller>(
        &mut self,
        controller: &C,
        tenant_id: &str,
        name: &str,
        stats: &mut SyncStats,
    ) -> SyncResult<RuleChain> {
        if let Some(chain) = self.find(controller, tenant_id, name)? {
            return Ok(chain);
        }
        let chain = controller.create_chain(NewChain {
            name: name.to_string(),
            tenant_id: tenant_id.to_string(),
        })?;
        stats.record_chain_created();
        debug!(chain = name, tenant = tenant_id, "created chain");
        self.listing(controller, tenant_id)?.push(chain.clone());
        Ok(chain)
    }

    /// Drops a deleted chain from the cache.
    pub fn forget(&mut self, tenant_id: &str, chain_id: ChainId) {
        if let Some(chains) = self.listings.get_mut(tenant_id) {
            chains.retain(|c| c.id != chain_id);
        }
    }
}

/// Mirrors a controller-side insert into a local chain copy.
pub fn record_inserted(chain: &mut RuleChain, rule: Rule) {
    let index = usize::try_from(rule.position)
        .unwrap_or(usize::MAX)
        .saturating_sub(1)
        .min(chain.rules.len());
    chain.rules.insert(index, rule);
    renumber(&mut chain.rules);
}

/// Mirrors a controller-side delete into a local chain copy.
pub fn record_removed(chain: &mut RuleChain, rule_id: RuleId) {
    chain.rules.retain(|r| r.id != rule_id);
    renumber(&mut chain.rules);
}

fn renumber(rules: &mut [Rule]) {
    for (index, rule) in rules.iter_mut().enumerate() {
        rule.position = u32::try_from(index + 1).unwrap_or(u32::MAX);
    }
}
