//! Port forwarding as pre-nat DNAT rules.

use super::{Pass, RuleIndex};
use crate::chain::ChainRole;
use crate::error::SyncResult;
use crate::fingerprint::{
    fingerprint, port_forwarding_fingerprint, port_forwarding_protocol, Fingerprint,
};
use crate::network::Network;
use crate::rules::PortForwardingRule;
use netsync_controller::{Condition, Controller, FlowAction, NatTarget, NewRule, Rule, RuleType};
use netsync_types::Ipv4Cidr;
use tracing::{debug, info};

fn is_port_forward(rule: &Rule) -> bool {
    rule.rule_type == RuleType::Dnat
        && rule.condition.tp_dst.is_some()
        && rule.condition.nw_dst.is_some_and(|dst| dst.is_host())
        && !rule.nat_targets.is_empty()
}

fn build(rule: &PortForwardingRule, protocol: u8) -> NewRule {
    NewRule::new(RuleType::Dnat)
        .flow_action(FlowAction::Accept)
        .condition(Condition {
            nw_dst: Some(Ipv4Cidr::host(rule.public_address)),
            nw_proto: Some(protocol),
            tp_dst: Some(rule.public_ports),
            match_forward_flow: true,
            ..Default::default()
        })
        .nat_target(NatTarget::address_and_ports(
            rule.private_address,
            rule.private_ports,
        ))
}

impl<C: Controller> Pass<'_, C> {
    pub(super) fn port_forwarding(
        &mut self,
        network: &Network,
        rules: &[PortForwardingRule],
    ) -> SyncResult<()> {
        let desired = rules
            .iter()
            .map(|rule| {
                let protocol = port_forwarding_protocol(rule, self.protocols)?;
                let key = port_forwarding_fingerprint(rule, self.protocols)?;
                Ok((rule, protocol, key))
            })
            .collect::<SyncResult<Vec<(&PortForwardingRule, u8, Fingerprint)>>>()?;

        let mut ctx = self.prepare(network)?;
        let mut routes = self.route_counter(&ctx)?;
        let mut existing = RuleIndex::build(&ctx.chains.pre_nat.rules, |r| {
            is_port_forward(r).then(|| fingerprint(r))
        });
        debug!("{} port forwarding rules on {}", existing.len(), ctx.router.name);

        for (rule, _, key) in desired.iter().filter(|(r, _, _)| r.state.is_revoke()) {
            for native in existing.take(key) {
                self.delete_rule(&mut ctx, ChainRole::PreNat, &native)?;
                routes.release(self.controller, self.stats, rule.public_address)?;
            }
            info!(
                "Revoked port forwarding {}:{} -> {}:{}",
                rule.public_address, rule.public_ports, rule.private_address, rule.private_ports
            );
        }

        for (rule, protocol, key) in desired.iter().filter(|(r, _, _)| !r.state.is_revoke()) {
            if existing.contains(key) {
                routes.repair(self.controller, self.stats, rule.public_address)?;
                continue;
            }
            let created = self.insert_rule(&mut ctx, ChainRole::PreNat, build(rule, *protocol))?;
            routes.acquire(self.controller, self.stats, rule.public_address)?;
            existing.insert(key.clone(), created);
            info!(
                "Forwarding {} {}:{} -> {}:{}",
                rule.protocol,
                rule.public_address,
                rule.public_ports,
                rule.private_address,
                rule.private_ports
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleState;
    use netsync_controller::{ChainId, RuleId};
    use netsync_types::{PortRange, ProtocolTable, PROTO_TCP};
    use std::net::Ipv4Addr;

    #[test]
    fn test_built_rule_matches_abstract_key() {
        let protocols = ProtocolTable::standard();
        let rule = PortForwardingRule {
            public_address: Ipv4Addr::new(203, 0, 113, 30),
            public_ports: PortRange::new(8080, 8081).unwrap(),
            private_address: Ipv4Addr::new(10, 1, 1, 7),
            private_ports: PortRange::new(80, 81).unwrap(),
            protocol: "tcp".to_string(),
            state: RuleState::Add,
        };
        let new_rule = build(&rule, PROTO_TCP);
        let native = Rule {
            id: RuleId::new(),
            chain_id: ChainId::new(),
            position: 1,
            rule_type: new_rule.rule_type,
            flow_action: new_rule.flow_action,
            condition: new_rule.condition,
            nat_targets: new_rule.nat_targets,
            jump_chain_id: None,
        };

        assert!(is_port_forward(&native));
        assert_eq!(
            fingerprint(&native),
            port_forwarding_fingerprint(&rule, &protocols).unwrap()
        );
        assert_eq!(fingerprint(&native).as_str(), "203.0.113.30:6:8080:8081:10.1.1.7:");
    }
}
