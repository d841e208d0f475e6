//! Source NAT for a tenant router.
//!
//! Two rules per router: a reverse SNAT in pre-nat for return traffic coming
//! in on the tenant uplink, and an SNAT in post-routing for traffic leaving
//! through it. Both are recognized structurally and keyed by fingerprint; a
//! source NAT rule for any other public address is stale.

use super::{Pass, RouterContext};
use crate::chain::ChainRole;
use crate::error::SyncResult;
use crate::fingerprint::{desired_fingerprint, fingerprint};
use crate::network::Network;
use crate::refcount::{counted_address, RouteRefCounter};
use crate::rules::SourceNatRule;
use netsync_controller::{
    Condition, Controller, FlowAction, NatTarget, NewRoute, NewRule, PortId, Rule, RuleType,
};
use netsync_types::Ipv4Cidr;
use std::net::Ipv4Addr;
use tracing::{debug, info};

fn reverse_snat(public: Ipv4Addr, uplink: PortId) -> NewRule {
    NewRule::new(RuleType::RevSnat)
        .flow_action(FlowAction::Accept)
        .condition(Condition {
            nw_dst: Some(Ipv4Cidr::host(public)),
            in_ports: vec![uplink],
            match_return_flow: true,
            ..Default::default()
        })
}

fn snat(public: Ipv4Addr, uplink: PortId) -> NewRule {
    NewRule::new(RuleType::Snat)
        .flow_action(FlowAction::Accept)
        .condition(Condition {
            out_ports: vec![uplink],
            match_forward_flow: true,
            ..Default::default()
        })
        .nat_target(NatTarget::address(public))
}

fn is_reverse_snat(rule: &Rule, uplink: PortId) -> bool {
    rule.rule_type == RuleType::RevSnat
        && rule.condition.in_ports == [uplink]
        && rule.condition.match_return_flow
}

fn is_snat(rule: &Rule, uplink: PortId) -> bool {
    rule.rule_type == RuleType::Snat
        && rule.condition.out_ports == [uplink]
        && rule.condition.match_forward_flow
}

impl<C: Controller> Pass<'_, C> {
    pub(super) fn source_nat(&mut self, network: &Network, rule: &SourceNatRule) -> SyncResult<()> {
        let mut ctx = self.prepare(network)?;
        let mut routes = self.route_counter(&ctx)?;
        let uplink = ctx.uplink.tenant_port.id;
        let public = rule.public_address;

        let reverse = reverse_snat(public, uplink);
        let forward = snat(public, uplink);
        self.reconcile_one(&mut ctx, &mut routes, ChainRole::PreNat, reverse, |r| {
            is_reverse_snat(r, uplink)
        })?;
        self.reconcile_one(&mut ctx, &mut routes, ChainRole::PostRouting, forward, |r| {
            is_snat(r, uplink)
        })?;
        routes.repair(self.controller, self.stats, public)?;

        self.ensure_default_route(&ctx)?;
        info!(
            "Source NAT for {} through {} on {}",
            network.cidr, public, ctx.router.name
        );
        Ok(())
    }

    /// Keeps exactly the rules matching `desired` among those selected by
    /// `is_kind`, deleting the rest and creating `desired` if absent.
    fn reconcile_one<F>(
        &mut self,
        ctx: &mut RouterContext,
        routes: &mut RouteRefCounter,
        role: ChainRole,
        desired: NewRule,
        is_kind: F,
    ) -> SyncResult<()>
    where
        F: Fn(&Rule) -> bool,
    {
        let key = desired_fingerprint(&desired);
        let (current, stale): (Vec<Rule>, Vec<Rule>) = ctx
            .chains
            .get(role)
            .rules
            .iter()
            .filter(|r| is_kind(*r))
            .cloned()
            .partition(|r| fingerprint(r) == key);

        for rule in &stale {
            debug!("Removing stale source NAT rule {}", fingerprint(rule));
            self.delete_rule(ctx, role, rule)?;
            if let Some(addr) = counted_address(rule) {
                routes.release(self.controller, self.stats, addr)?;
            }
        }

        if current.is_empty() {
            let created = self.insert_rule(ctx, role, desired)?;
            if let Some(addr) = counted_address(&created) {
                routes.acquire(self.controller, self.stats, addr)?;
            }
        }
        Ok(())
    }

    /// Default route of the tenant router towards the provider router.
    fn ensure_default_route(&mut self, ctx: &RouterContext) -> SyncResult<()> {
        let uplink = ctx.uplink.tenant_port.id;
        let present = self
            .controller
            .list_routes(ctx.router.id)?
            .iter()
            .any(|r| r.dst_network == Ipv4Cidr::ANY && r.next_hop_port == uplink);
        if present {
            return Ok(());
        }

        self.controller.create_route(
            ctx.router.id,
            NewRoute::to(Ipv4Cidr::ANY, uplink, self.config.rules.route_weight)
                .via(self.config.uplink.provider_address),
        )?;
        self.stats.record_route_created();
        info!("Created default route on {}", ctx.router.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_nat_keys() {
        let uplink = PortId::new();
        let public = Ipv4Addr::new(203, 0, 113, 10);
        assert_eq!(
            desired_fingerprint(&reverse_snat(public, uplink)).as_str(),
            "203.0.113.10:*:*:*:*:"
        );
        assert_eq!(
            desired_fingerprint(&snat(public, uplink)).as_str(),
            "*:*:*:*:203.0.113.10:"
        );
    }
}
