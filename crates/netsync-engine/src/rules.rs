//! Desired-state rules supplied by the host.
//!
//! Rules are transient: the host passes the full set it cares about on each
//! call, each rule carrying its own explicit state.

use netsync_types::{Ipv4Cidr, PortRange};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Desired state of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleState {
    /// Newly requested; must be present.
    #[default]
    Add,
    /// Already requested earlier; must still be present.
    Active,
    /// Must be absent.
    Revoke,
}

impl RuleState {
    pub fn is_revoke(&self) -> bool {
        matches!(self, RuleState::Revoke)
    }
}

/// Source NAT for all traffic leaving the tenant router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNatRule {
    pub public_address: Ipv4Addr,
}

/// One-to-one NAT between a floating and a fixed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticNatRule {
    pub floating_address: Ipv4Addr,
    pub fixed_address: Ipv4Addr,
    #[serde(default)]
    pub revoke: bool,
}

impl StaticNatRule {
    pub fn state(&self) -> RuleState {
        if self.revoke {
            RuleState::Revoke
        } else {
            RuleState::Add
        }
    }
}

/// Forwards a public port range to a private address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortForwardingRule {
    pub public_address: Ipv4Addr,
    pub public_ports: PortRange,
    pub private_address: Ipv4Addr,
    pub private_ports: PortRange,
    pub protocol: String,
    #[serde(default)]
    pub state: RuleState,
}

/// Ingress firewall rule for one destination address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub destination_address: Ipv4Addr,
    pub protocol: String,
    /// Allowed sources; empty means everywhere.
    #[serde(default)]
    pub source_cidrs: Vec<Ipv4Cidr>,
    /// TCP/UDP destination ports; `None` matches every port.
    #[serde(default)]
    pub ports: Option<PortRange>,
    #[serde(default)]
    pub icmp_type: Option<u8>,
    #[serde(default)]
    pub icmp_code: Option<u8>,
    #[serde(default)]
    pub state: RuleState,
}

impl FirewallRule {
    /// Source CIDRs with host bits cleared and the empty list expanded to
    /// 0.0.0.0/0.
    pub fn effective_sources(&self) -> Vec<Ipv4Cidr> {
        if self.source_cidrs.is_empty() {
            vec![Ipv4Cidr::ANY]
        } else {
            self.source_cidrs.iter().map(Ipv4Cidr::masked).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rule_state_serde() {
        let state: RuleState = serde_json::from_str("\"revoke\"").unwrap();
        assert_eq!(state, RuleState::Revoke);
        assert!(state.is_revoke());
        assert!(!RuleState::Active.is_revoke());
        assert_eq!(RuleState::default(), RuleState::Add);
    }

    #[test]
    fn test_firewall_effective_sources() {
        let mut rule = FirewallRule {
            destination_address: Ipv4Addr::new(203, 0, 113, 5),
            protocol: "tcp".to_string(),
            source_cidrs: Vec::new(),
            ports: Some(PortRange::single(22)),
            icmp_type: None,
            icmp_code: None,
            state: RuleState::Add,
        };
        assert_eq!(rule.effective_sources(), vec![Ipv4Cidr::ANY]);

        rule.source_cidrs = vec!["192.0.2.0/24".parse().unwrap()];
        assert_eq!(rule.effective_sources(), rule.source_cidrs);

        rule.source_cidrs = vec!["192.0.2.5/24".parse().unwrap()];
        assert_eq!(
            rule.effective_sources(),
            vec!["192.0.2.0/24".parse::<Ipv4Cidr>().unwrap()]
        );
    }

    #[test]
    fn test_static_nat_state() {
        let rule: StaticNatRule = serde_json::from_str(
            r#"{"floating_address":"203.0.113.5","fixed_address":"10.0.0.5"}"#,
        )
        .unwrap();
        assert_eq!(rule.state(), RuleState::Add);
    }
}
