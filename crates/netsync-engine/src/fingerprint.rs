//! Canonical rule fingerprints.
//!
//! A fingerprint is the string `destIp:protocol:field1:field2:source:` where
//! field1/field2 are the ICMP type and code for ICMP and the destination port
//! range bounds otherwise. Absent fields render as `*`. A port range covering
//! every port renders the same as no port match. NAT rules put their target
//! address in the source slot.
//!
//! The same key is produced for a desired rule and for the native rule built
//! from it once read back from the controller, which is what the reconcile
//! passes use to decide whether a rule already exists.

use crate::error::{SyncError, SyncResult};
use crate::rules::{FirewallRule, PortForwardingRule};
use netsync_controller::{Condition, NatTarget, NewRule, Rule};
use netsync_types::{Ipv4Cidr, PortRange, ProtocolTable, PROTO_ICMP};
use std::fmt;
use std::net::Ipv4Addr;

const WILDCARD: &str = "*";

/// Canonical equality key of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two L4 fields of a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFields {
    Any,
    Ports(PortRange),
    Icmp {
        icmp_type: Option<u8>,
        icmp_code: Option<u8>,
    },
}

/// The source slot of a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintSource {
    Cidr(Ipv4Cidr),
    NatTarget(Ipv4Addr),
}

fn push_field<T: fmt::Display>(out: &mut String, value: Option<T>) {
    match value {
        Some(v) => out.push_str(&v.to_string()),
        None => out.push_str(WILDCARD),
    }
    out.push(':');
}

impl Fingerprint {
    /// Builds a fingerprint from its parts.
    pub fn compose(
        destination: Option<Ipv4Addr>,
        protocol: Option<u8>,
        fields: MatchFields,
        source: Option<FingerprintSource>,
    ) -> Self {
        let mut out = String::with_capacity(48);
        push_field(&mut out, destination);
        push_field(&mut out, protocol);

        let (field1, field2) = match fields {
            MatchFields::Ports(range) if !range.is_any() => {
                (Some(u32::from(range.start())), Some(u32::from(range.end())))
            }
            MatchFields::Icmp {
                icmp_type,
                icmp_code,
            } => (icmp_type.map(u32::from), icmp_code.map(u32::from)),
            MatchFields::Ports(_) | MatchFields::Any => (None, None),
        };
        push_field(&mut out, field1);
        push_field(&mut out, field2);

        match source {
            Some(FingerprintSource::Cidr(cidr)) => push_field(&mut out, Some(cidr.masked())),
            Some(FingerprintSource::NatTarget(addr)) => push_field(&mut out, Some(addr)),
            None => push_field(&mut out, None::<&str>),
        }

        Fingerprint(out)
    }
}

/// Fingerprint of a native controller rule.
pub fn fingerprint(rule: &Rule) -> Fingerprint {
    of_parts(&rule.condition, &rule.nat_targets)
}

/// Fingerprint a rule will have once created.
pub fn desired_fingerprint(rule: &NewRule) -> Fingerprint {
    of_parts(&rule.condition, &rule.nat_targets)
}

fn of_parts(cond: &Condition, nat_targets: &[NatTarget]) -> Fingerprint {
    let fields = if cond.nw_proto == Some(PROTO_ICMP) {
        MatchFields::Icmp {
            icmp_type: cond.icmp_type,
            icmp_code: cond.icmp_code,
        }
    } else {
        cond.tp_dst.map_or(MatchFields::Any, MatchFields::Ports)
    };
    let source = match nat_targets.first() {
        Some(target) => Some(FingerprintSource::NatTarget(target.address_from)),
        None => cond.nw_src.map(FingerprintSource::Cidr),
    };

    Fingerprint::compose(
        cond.nw_dst.map(|dst| dst.address()),
        cond.nw_proto,
        fields,
        source,
    )
}

/// Resolves a protocol name through the injected table.
pub fn resolve_protocol(protocols: &ProtocolTable, name: &str) -> SyncResult<Option<u8>> {
    Ok(protocols.resolve(name)?)
}

/// L4 match fields of a firewall rule, validated against its protocol.
pub fn firewall_fields(rule: &FirewallRule, protocol: Option<u8>) -> SyncResult<MatchFields> {
    let has_icmp = rule.icmp_type.is_some() || rule.icmp_code.is_some();
    if protocol == Some(PROTO_ICMP) {
        if rule.ports.is_some() {
            return Err(SyncError::invalid_rule(format!(
                "ICMP firewall rule for {} carries a port range",
                rule.destination_address
            )));
        }
        return Ok(MatchFields::Icmp {
            icmp_type: rule.icmp_type,
            icmp_code: rule.icmp_code,
        });
    }
    if has_icmp {
        return Err(SyncError::invalid_rule(format!(
            "{} firewall rule for {} carries ICMP fields",
            rule.protocol, rule.destination_address
        )));
    }
    if protocol.is_none() && rule.ports.is_some() {
        return Err(SyncError::invalid_rule(format!(
            "firewall rule for {} matches every protocol but sets ports",
            rule.destination_address
        )));
    }
    Ok(rule.ports.map_or(MatchFields::Any, MatchFields::Ports))
}

/// Fingerprints of a firewall rule, one per effective source CIDR.
pub fn firewall_fingerprints(
    rule: &FirewallRule,
    protocols: &ProtocolTable,
) -> SyncResult<Vec<(Ipv4Cidr, Fingerprint)>> {
    let protocol = resolve_protocol(protocols, &rule.protocol)?;
    let fields = firewall_fields(rule, protocol)?;
    Ok(rule
        .effective_sources()
        .into_iter()
        .map(|cidr| {
            let fp = Fingerprint::compose(
                Some(rule.destination_address),
                protocol,
                fields,
                Some(FingerprintSource::Cidr(cidr)),
            );
            (cidr, fp)
        })
        .collect())
}

/// Protocol number of a port forwarding rule; it must name a port-carrying
/// protocol.
pub fn port_forwarding_protocol(
    rule: &PortForwardingRule,
    protocols: &ProtocolTable,
) -> SyncResult<u8> {
    match resolve_protocol(protocols, &rule.protocol)? {
        Some(proto) if proto != PROTO_ICMP => Ok(proto),
        _ => Err(SyncError::invalid_rule(format!(
            "port forwarding for {} needs a port-carrying protocol, got '{}'",
            rule.public_address, rule.protocol
        ))),
    }
}

/// Fingerprint of a port forwarding rule.
pub fn port_forwarding_fingerprint(
    rule: &PortForwardingRule,
    protocols: &ProtocolTable,
) -> SyncResult<Fingerprint> {
    let protocol = port_forwarding_protocol(rule, protocols)?;
    Ok(Fingerprint::compose(
        Some(rule.public_address),
        Some(protocol),
        MatchFields::Ports(rule.public_ports),
        Some(FingerprintSource::NatTarget(rule.private_address)),
    ))
}
