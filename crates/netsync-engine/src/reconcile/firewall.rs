//! Ingress firewall as pre-filter jumps.
//!
//! Each allowed source CIDR becomes one jump from pre-filter to pre-nat,
//! which lets the traffic skip the default drop of its destination address.

use super::{Pass, RuleIndex};
use crate::chain::ChainRole;
use crate::error::SyncResult;
use crate::fingerprint::{
    fingerprint, firewall_fields, firewall_fingerprints, resolve_protocol, Fingerprint,
    MatchFields,
};
use crate::network::Network;
use crate::rules::FirewallRule;
use netsync_controller::{ChainId, Condition, Controller, NewRule, Rule, RuleType};
use netsync_types::{Ipv4Cidr, ProtocolTable};
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// One source CIDR of one firewall rule.
#[derive(Debug, Clone)]
struct Expanded {
    destination: Ipv4Addr,
    source: Ipv4Cidr,
    protocol: Option<u8>,
    fields: MatchFields,
    key: Fingerprint,
    revoke: bool,
}

impl Expanded {
    fn build(&self, pre_nat: ChainId) -> NewRule {
        let mut condition = Condition {
            nw_src: Some(self.source),
            nw_dst: Some(Ipv4Cidr::host(self.destination)),
            nw_proto: self.protocol,
            ..Default::default()
        };
        match self.fields {
            MatchFields::Ports(range) => condition.tp_dst = Some(range),
            MatchFields::Icmp {
                icmp_type,
                icmp_code,
            } => {
                condition.icmp_type = icmp_type;
                condition.icmp_code = icmp_code;
            }
            MatchFields::Any => {}
        }
        NewRule::jump(pre_nat).condition(condition)
    }
}

fn expand(rules: &[FirewallRule], protocols: &ProtocolTable) -> SyncResult<Vec<Expanded>> {
    let mut expanded = Vec::new();
    for rule in rules {
        let protocol = resolve_protocol(protocols, &rule.protocol)?;
        let fields = firewall_fields(rule, protocol)?;
        for (source, key) in firewall_fingerprints(rule, protocols)? {
            expanded.push(Expanded {
                destination: rule.destination_address,
                source,
                protocol,
                fields,
                key,
                revoke: rule.state.is_revoke(),
            });
        }
    }
    Ok(expanded)
}

fn is_firewall_jump(rule: &Rule, pre_nat: ChainId) -> bool {
    rule.rule_type == RuleType::Jump
        && rule.jump_chain_id == Some(pre_nat)
        && rule.condition.nw_src.is_some()
}

impl<C: Controller> Pass<'_, C> {
    pub(super) fn firewall(&mut self, network: &Network, rules: &[FirewallRule]) -> SyncResult<()> {
        let desired = expand(rules, self.protocols)?;

        let mut ctx = self.prepare(network)?;
        let pre_nat = ctx.chains.pre_nat.id;
        let mut existing = RuleIndex::build(&ctx.chains.pre_filter.rules, |r| {
            is_firewall_jump(r, pre_nat).then(|| fingerprint(r))
        });
        debug!("{} firewall rules on {}", existing.len(), ctx.router.name);

        let mut revoked = 0usize;
        for entry in desired.iter().filter(|e| e.revoke) {
            for native in existing.take(&entry.key) {
                self.delete_rule(&mut ctx, ChainRole::PreFilter, &native)?;
                revoked += 1;
            }
        }

        let mut added = 0usize;
        for entry in desired.iter().filter(|e| !e.revoke) {
            if existing.contains(&entry.key) {
                continue;
            }
            let created = self.insert_rule(&mut ctx, ChainRole::PreFilter, entry.build(pre_nat))?;
            existing.insert(entry.key.clone(), created);
            added += 1;
        }

        info!(
            "Firewall on {}: {} rules added, {} removed",
            ctx.router.name, added, revoked
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleState;
    use netsync_controller::RuleId;
    use netsync_types::PortRange;

    fn rule(protocol: &str, cidrs: &[&str]) -> FirewallRule {
        FirewallRule {
            destination_address: Ipv4Addr::new(203, 0, 113, 40),
            protocol: protocol.to_string(),
            source_cidrs: cidrs.iter().map(|c| c.parse().unwrap()).collect(),
            ports: None,
            icmp_type: None,
            icmp_code: None,
            state: RuleState::Add,
        }
    }

    #[test]
    fn test_expanded_rules_round_trip_through_native_form() {
        let protocols = ProtocolTable::standard();
        let pre_nat = ChainId::new();
        let mut tcp = rule("tcp", &["192.0.2.0/24", "198.51.100.0/24"]);
        tcp.ports = Some(PortRange::new(22, 22).unwrap());
        let mut icmp = rule("icmp", &[]);
        icmp.icmp_type = Some(8);

        let expanded = expand(&[tcp, icmp], &protocols).unwrap();
        assert_eq!(expanded.len(), 3);
        for entry in &expanded {
            let new_rule = entry.build(pre_nat);
            let native = Rule {
                id: RuleId::new(),
                chain_id: ChainId::new(),
                position: 1,
                rule_type: new_rule.rule_type,
                flow_action: new_rule.flow_action,
                condition: new_rule.condition,
                nat_targets: new_rule.nat_targets,
                jump_chain_id: new_rule.jump_chain_id,
            };
            assert!(is_firewall_jump(&native, pre_nat));
            assert_eq!(fingerprint(&native), entry.key);
        }
        assert_eq!(expanded[2].key.as_str(), "203.0.113.40:1:8:*:0.0.0.0/0:");
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        let protocols = ProtocolTable::standard();
        assert!(expand(&[rule("gre-ish", &[])], &protocols).is_err());
    }
}
