//! One-to-one NAT between floating and fixed addresses.

use super::{Pass, RouterContext, RuleIndex};
use crate::chain::ChainRole;
use crate::error::SyncResult;
use crate::fingerprint::{desired_fingerprint, fingerprint, Fingerprint};
use crate::network::Network;
use crate::refcount::{counted_address, RouteRefCounter};
use crate::rules::StaticNatRule;
use crate::topology::RouterChains;
use netsync_controller::{
    ChainId, Condition, Controller, FlowAction, NatTarget, NewRule, Rule, RuleType,
};
use netsync_types::{Ipv4Cidr, PROTO_ICMP};
use tracing::{debug, info};

const ICMP_ECHO_REPLY: u8 = 0;

/// The rules making up one static NAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Construct {
    /// Pre-filter jump to pre-nat for return traffic to the floating address.
    FilterJump,
    /// Pre-filter jump to pre-nat for ICMP echo replies.
    IcmpReplyJump,
    /// Pre-nat DNAT from floating to fixed.
    Dnat,
    /// Post-routing SNAT from fixed to floating, forward flow.
    SnatForward,
    /// Post-routing SNAT from fixed to floating, return flow.
    SnatReturn,
    /// Pre-filter drop for the floating address; firewall rules jump past it.
    DefaultDrop,
}

impl Construct {
    const ALL: [Construct; 6] = [
        Construct::FilterJump,
        Construct::IcmpReplyJump,
        Construct::Dnat,
        Construct::SnatForward,
        Construct::SnatReturn,
        Construct::DefaultDrop,
    ];

    fn role(&self) -> ChainRole {
        match self {
            Construct::FilterJump | Construct::IcmpReplyJump | Construct::DefaultDrop => {
                ChainRole::PreFilter
            }
            Construct::Dnat => ChainRole::PreNat,
            Construct::SnatForward | Construct::SnatReturn => ChainRole::PostRouting,
        }
    }

    fn build(&self, rule: &StaticNatRule, pre_nat: ChainId) -> NewRule {
        let floating = Ipv4Cidr::host(rule.floating_address);
        let fixed = Ipv4Cidr::host(rule.fixed_address);
        match self {
            Construct::FilterJump => NewRule::jump(pre_nat).condition(Condition {
                nw_dst: Some(floating),
                match_return_flow: true,
                ..Default::default()
            }),
            Construct::IcmpReplyJump => NewRule::jump(pre_nat).condition(Condition {
                nw_dst: Some(floating),
                nw_proto: Some(PROTO_ICMP),
                icmp_type: Some(ICMP_ECHO_REPLY),
                ..Default::default()
            }),
            Construct::Dnat => NewRule::new(RuleType::Dnat)
                .flow_action(FlowAction::Accept)
                .condition(Condition {
                    nw_dst: Some(floating),
                    ..Default::default()
                })
                .nat_target(NatTarget::address(rule.fixed_address)),
            Construct::SnatForward => NewRule::new(RuleType::Snat)
                .flow_action(FlowAction::Accept)
                .condition(Condition {
                    nw_src: Some(fixed),
                    match_forward_flow: true,
                    ..Default::default()
                })
                .nat_target(NatTarget::address(rule.floating_address)),
            Construct::SnatReturn => NewRule::new(RuleType::Snat)
                .flow_action(FlowAction::Accept)
                .condition(Condition {
                    nw_src: Some(fixed),
                    match_return_flow: true,
                    ..Default::default()
                })
                .nat_target(NatTarget::address(rule.floating_address)),
            Construct::DefaultDrop => NewRule::new(RuleType::Drop).condition(Condition {
                nw_dst: Some(floating),
                ..Default::default()
            }),
        }
    }

    /// Recognizes a native rule as one of the constructs.
    fn classify(rule: &Rule, pre_nat: ChainId) -> Option<Construct> {
        let cond = &rule.condition;
        let host_dst = cond.nw_dst.is_some_and(|dst| dst.is_host());
        match rule.rule_type {
            RuleType::Jump if rule.jump_chain_id == Some(pre_nat) && host_dst => {
                if cond.nw_src.is_some() {
                    None
                } else if cond.nw_proto == Some(PROTO_ICMP)
                    && cond.icmp_type == Some(ICMP_ECHO_REPLY)
                {
                    Some(Construct::IcmpReplyJump)
                } else if cond.nw_proto.is_none() && cond.match_return_flow {
                    Some(Construct::FilterJump)
                } else {
                    None
                }
            }
            RuleType::Drop if host_dst && cond.nw_src.is_none() && cond.nw_proto.is_none() => {
                Some(Construct::DefaultDrop)
            }
            RuleType::Dnat
                if host_dst && cond.tp_dst.is_none() && !rule.nat_targets.is_empty() =>
            {
                Some(Construct::Dnat)
            }
            RuleType::Snat
                if cond.out_ports.is_empty()
                    && cond.nw_src.is_some_and(|src| src.is_host())
                    && !rule.nat_targets.is_empty() =>
            {
                if cond.match_forward_flow {
                    Some(Construct::SnatForward)
                } else if cond.match_return_flow {
                    Some(Construct::SnatReturn)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

type Key = (Construct, Fingerprint);

fn index(chains: &RouterChains) -> RuleIndex<Key> {
    let pre_nat = chains.pre_nat.id;
    let rules = chains
        .pre_filter
        .rules
        .iter()
        .chain(&chains.pre_nat.rules)
        .chain(&chains.post_routing.rules);
    RuleIndex::build(rules, |r| {
        Construct::classify(r, pre_nat).map(|c| (c, fingerprint(r)))
    })
}

impl<C: Controller> Pass<'_, C> {
    pub(super) fn static_nats(
        &mut self,
        network: &Network,
        rules: &[StaticNatRule],
    ) -> SyncResult<()> {
        let mut ctx = self.prepare(network)?;
        let mut routes = self.route_counter(&ctx)?;
        let mut existing = index(&ctx.chains);
        let pre_nat = ctx.chains.pre_nat.id;

        for rule in rules.iter().filter(|r| r.revoke) {
            for construct in Construct::ALL {
                let key = (construct, desired_fingerprint(&construct.build(rule, pre_nat)));
                self.remove_all(&mut ctx, &mut routes, &mut existing, &key)?;
            }
            info!(
                "Revoked static NAT {} -> {}",
                rule.floating_address, rule.fixed_address
            );
        }

        for rule in rules.iter().filter(|r| !r.revoke) {
            for construct in Construct::ALL {
                let desired = construct.build(rule, pre_nat);
                let key = (construct, desired_fingerprint(&desired));

                if construct == Construct::DefaultDrop && !network.firewall_enabled {
                    self.remove_all(&mut ctx, &mut routes, &mut existing, &key)?;
                    continue;
                }
                if existing.contains(&key) {
                    continue;
                }

                let created = if construct == Construct::DefaultDrop {
                    self.append_rule(&mut ctx, construct.role(), desired)?
                } else {
                    self.insert_rule(&mut ctx, construct.role(), desired)?
                };
                if let Some(addr) = counted_address(&created) {
                    routes.acquire(self.controller, self.stats, addr)?;
                }
                existing.insert(key, created);
            }
            routes.repair(self.controller, self.stats, rule.floating_address)?;
            debug!(
                "Static NAT {} -> {} in place",
                rule.floating_address, rule.fixed_address
            );
        }

        Ok(())
    }

    fn remove_all(
        &mut self,
        ctx: &mut RouterContext,
        routes: &mut RouteRefCounter,
        existing: &mut RuleIndex<Key>,
        key: &Key,
    ) -> SyncResult<()> {
        for rule in existing.take(key) {
            self.delete_rule(ctx, key.0.role(), &rule)?;
            if let Some(addr) = counted_address(&rule) {
                routes.release(self.controller, self.stats, addr)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsync_controller::{PortId, RuleId};
    use std::collections::HashSet;
    use std::net::Ipv4Addr;

    fn nat() -> StaticNatRule {
        StaticNatRule {
            floating_address: Ipv4Addr::new(203, 0, 113, 20),
            fixed_address: Ipv4Addr::new(10, 1, 1, 5),
            revoke: false,
        }
    }

    fn materialize(rule: NewRule, chain_id: ChainId) -> Rule {
        Rule {
            id: RuleId::new(),
            chain_id,
            position: 1,
            rule_type: rule.rule_type,
            flow_action: rule.flow_action,
            condition: rule.condition,
            nat_targets: rule.nat_targets,
            jump_chain_id: rule.jump_chain_id,
        }
    }

    #[test]
    fn test_constructs_classify_as_themselves() {
        let pre_nat = ChainId::new();
        for construct in Construct::ALL {
            let native = materialize(construct.build(&nat(), pre_nat), ChainId::new());
            assert_eq!(Construct::classify(&native, pre_nat), Some(construct));
            assert_eq!(
                fingerprint(&native),
                desired_fingerprint(&construct.build(&nat(), pre_nat))
            );
        }
    }

    #[test]
    fn test_constructs_have_distinct_keys() {
        let pre_nat = ChainId::new();
        let keys: HashSet<Key> = Construct::ALL
            .iter()
            .map(|c| (*c, desired_fingerprint(&c.build(&nat(), pre_nat))))
            .collect();
        assert_eq!(keys.len(), Construct::ALL.len());
    }

    #[test]
    fn test_foreign_rules_not_classified() {
        let pre_nat = ChainId::new();
        let firewall_jump = NewRule::jump(pre_nat).condition(Condition {
            nw_src: Some(Ipv4Cidr::ANY),
            nw_dst: Some(Ipv4Cidr::host(Ipv4Addr::new(203, 0, 113, 20))),
            nw_proto: Some(6),
            ..Default::default()
        });
        assert_eq!(
            Construct::classify(&materialize(firewall_jump, ChainId::new()), pre_nat),
            None
        );

        let source_nat = NewRule::new(RuleType::Snat)
            .condition(Condition {
                out_ports: vec![PortId::new()],
                match_forward_flow: true,
                ..Default::default()
            })
            .nat_target(NatTarget::address(Ipv4Addr::new(203, 0, 113, 1)));
        assert_eq!(
            Construct::classify(&materialize(source_nat, ChainId::new()), pre_nat),
            None
        );
    }
}
