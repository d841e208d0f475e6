//! Reference-counted routes to public and floating addresses.
//!
//! The provider router needs a /32 route back to every public address a
//! tenant router answers for. Several rules can depend on one address (a
//! static NAT and any number of port forwards), so the route is reference
//! counted: it is created when the first dependent rule appears and deleted
//! only when the last one goes.
//!
//! Counts are never persisted. [`RouteRefCounter::load`] recomputes them from
//! the rules in the tenant router's pre-nat chain at the start of each pass.

use crate::error::{SyncError, SyncResult};
use crate::stats::SyncStats;
use netsync_controller::{
    Controller, NewRoute, PortId, RouteId, RouterId, Rule, RuleChain, RuleType,
};
use netsync_types::Ipv4Cidr;
use std::collections::HashMap;
use std::hash::Hash;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::{debug, info};

/// Error type for [`RefCountMap`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefCountError {
    #[error("Key not found")]
    KeyNotFound,

    #[error("Reference count underflow")]
    Underflow,
}

/// Map of reference counts that never creates entries implicitly.
///
/// A key is present exactly while its count is above zero.
///
/// ```
/// use netsync_engine::refcount::RefCountMap;
///
/// let mut counts: RefCountMap<&str> = RefCountMap::new();
/// assert_eq!(counts.get(&"a"), 0);
/// assert_eq!(counts.increment("a"), 1);
/// assert_eq!(counts.decrement(&"a"), Ok(0));
/// assert!(counts.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RefCountMap<K> {
    inner: HashMap<K, u32>,
}

impl<K: Eq + Hash> RefCountMap<K> {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Returns the count for `key`, zero if absent.
    pub fn get(&self, key: &K) -> u32 {
        self.inner.get(key).copied().unwrap_or(0)
    }

    /// Increments the count, inserting the key at 1 if absent.
    pub fn increment(&mut self, key: K) -> u32 {
        let count = self.inner.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Decrements the count and removes the key when it reaches zero.
    pub fn decrement(&mut self, key: &K) -> Result<u32, RefCountError> {
        let count = self.inner.get_mut(key).ok_or(RefCountError::KeyNotFound)?;
        if *count == 0 {
            return Err(RefCountError::Underflow);
        }
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.inner.remove(key);
        }
        Ok(remaining)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Eq + Hash> Default for RefCountMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the address a pre-nat rule holds a route reference on, if any.
///
/// DNAT rules (static NAT and port forwarding) and reverse SNAT rules (source
/// NAT) with a full-length destination are counted.
pub fn counted_address(rule: &Rule) -> Option<Ipv4Addr> {
    if !matches!(rule.rule_type, RuleType::Dnat | RuleType::RevSnat) {
        return None;
    }
    rule.condition
        .nw_dst
        .filter(Ipv4Cidr::is_host)
        .map(|dst| dst.address())
}

/// Route reference counts for one tenant router's public addresses.
#[derive(Debug)]
pub struct RouteRefCounter {
    provider_router: RouterId,
    downlink_port: PortId,
    weight: u32,
    counts: RefCountMap<Ipv4Addr>,
    routes: HashMap<Ipv4Addr, Vec<RouteId>>,
}

impl RouteRefCounter {
    /// Recomputes counts from `pre_nat` and collects the provider router's
    /// /32 routes through this tenant's downlink.
    pub fn load<C: Controller>(
        controller: &C,
        provider_router: RouterId,
        downlink_port: PortId,
        pre_nat: &RuleChain,
        weight: u32,
    ) -> SyncResult<Self> {
        let mut counts = RefCountMap::new();
        for addr in pre_nat.rules.iter().filter_map(counted_address) {
            counts.increment(addr);
        }

        let mut routes: HashMap<Ipv4Addr, Vec<RouteId>> = HashMap::new();
        for route in controller.list_routes(provider_router)? {
            if route.next_hop_port == downlink_port && route.dst_network.is_host() {
                routes
                    .entry(route.dst_network.address())
                    .or_default()
                    .push(route.id);
            }
        }

        debug!(
            addresses = counts.len(),
            routes = routes.len(),
            "loaded route reference counts"
        );

        Ok(Self {
            provider_router,
            downlink_port,
            weight,
            counts,
            routes,
        })
    }

    /// Current reference count for `addr`.
    pub fn count(&self, addr: Ipv4Addr) -> u32 {
        self.counts.get(&addr)
    }

    /// Returns true if a route to `addr` exists.
    pub fn has_route(&self, addr: Ipv4Addr) -> bool {
        self.routes.get(&addr).is_some_and(|ids| !ids.is_empty())
    }

    /// Takes a reference on `addr`, creating its route if none exists.
    pub fn acquire<C: Controller>(
        &mut self,
        controller: &C,
        stats: &mut SyncStats,
        addr: Ipv4Addr,
    ) -> SyncResult<u32> {
        let count = self.counts.increment(addr);
        self.ensure_route(controller, stats, addr)?;
        Ok(count)
    }

    /// Drops a reference on `addr`, deleting its routes when none remain.
    pub fn release<C: Controller>(
        &mut self,
        controller: &C,
        stats: &mut SyncStats,
        addr: Ipv4Addr,
    ) -> SyncResult<u32> {
        let remaining = self.counts.decrement(&addr).map_err(|e| {
            SyncError::inconsistent(format!("route reference for {}: {}", addr, e))
        })?;
        if remaining == 0 {
            for route_id in self.routes.remove(&addr).unwrap_or_default() {
                controller.delete_route(route_id)?;
                stats.record_route_deleted();
                info!(address = %addr, "deleted provider route");
            }
        }
        Ok(remaining)
    }

    /// Creates the route for a referenced address whose route went missing.
    pub fn repair<C: Controller>(
        &mut self,
        controller: &C,
        stats: &mut SyncStats,
        addr: Ipv4Addr,
    ) -> SyncResult<()> {
        if self.count(addr) > 0 && !self.has_route(addr) {
            info!(address = %addr, "restoring missing provider route");
            self.ensure_route(controller, stats, addr)?;
        }
        Ok(())
    }

    fn ensure_route<C: Controller>(
        &mut self,
        controller: &C,
        stats: &mut SyncStats,
        addr: Ipv4Addr,
    ) -> SyncResult<()> {
        if self.has_route(addr) {
            return Ok(());
        }
        let route = controller.create_route(
            self.provider_router,
            NewRoute::to(Ipv4Cidr::host(addr), self.downlink_port, self.weight),
        )?;
        stats.record_route_created();
        info!(address = %addr, "created provider route");
        self.routes.entry(addr).or_default().push(route.id);
        Ok(())
    }
}
