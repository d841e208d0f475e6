//! Service capability table answered to the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Network services the orchestrator may ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    SourceNat,
    StaticNat,
    PortForwarding,
    Firewall,
    Connectivity,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::SourceNat => "source_nat",
            ServiceKind::StaticNat => "static_nat",
            ServiceKind::PortForwarding => "port_forwarding",
            ServiceKind::Firewall => "firewall",
            ServiceKind::Connectivity => "connectivity",
        };
        f.write_str(name)
    }
}

/// Support flag and options for one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCapability {
    pub supported: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl ServiceCapability {
    fn supported() -> Self {
        Self {
            supported: true,
            options: BTreeMap::new(),
        }
    }

    fn with(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }
}

/// Capability option keys.
pub mod options {
    pub const SUPPORTED_SOURCE_NAT_TYPES: &str = "SupportedSourceNatTypes";
    pub const REDUNDANT_ROUTER: &str = "RedundantRouter";
    pub const SUPPORTED_PROTOCOLS: &str = "SupportedProtocols";
    pub const SUPPORTED_TRAFFIC_DIRECTION: &str = "SupportedTrafficDirection";
    pub const MULTIPLE_IPS: &str = "MultipleIps";
    pub const TRAFFIC_STATISTICS: &str = "TrafficStatistics";
}

/// Per-service capabilities of this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityTable {
    services: BTreeMap<ServiceKind, ServiceCapability>,
}

impl CapabilityTable {
    /// The services this engine implements.
    pub fn standard() -> Self {
        let mut services = BTreeMap::new();
        services.insert(
            ServiceKind::SourceNat,
            ServiceCapability::supported()
                .with(options::SUPPORTED_SOURCE_NAT_TYPES, "peraccount")
                .with(options::REDUNDANT_ROUTER, "false"),
        );
        services.insert(ServiceKind::StaticNat, ServiceCapability::supported());
        services.insert(
            ServiceKind::PortForwarding,
            ServiceCapability::supported().with(options::SUPPORTED_PROTOCOLS, "tcp,udp"),
        );
        services.insert(
            ServiceKind::Firewall,
            ServiceCapability::supported()
                .with(options::SUPPORTED_PROTOCOLS, "tcp,udp,icmp")
                .with(options::SUPPORTED_TRAFFIC_DIRECTION, "ingress")
                .with(options::MULTIPLE_IPS, "true")
                .with(options::TRAFFIC_STATISTICS, "per public ip"),
        );
        services.insert(ServiceKind::Connectivity, ServiceCapability::supported());
        Self { services }
    }

    pub fn supports(&self, kind: ServiceKind) -> bool {
        self.services.get(&kind).is_some_and(|c| c.supported)
    }

    pub fn option(&self, kind: ServiceKind, key: &str) -> Option<&str> {
        self.services
            .get(&kind)
            .and_then(|c| c.options.get(key))
            .map(String::as_str)
    }

    pub fn get(&self, kind: ServiceKind) -> Option<&ServiceCapability> {
        self.services.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ServiceKind, &ServiceCapability)> {
        self.services.iter()
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let table = CapabilityTable::standard();
        assert!(table.supports(ServiceKind::SourceNat));
        assert!(table.supports(ServiceKind::Firewall));
        assert_eq!(
            table.option(ServiceKind::SourceNat, options::SUPPORTED_SOURCE_NAT_TYPES),
            Some("peraccount")
        );
        assert_eq!(
            table.option(ServiceKind::PortForwarding, options::SUPPORTED_PROTOCOLS),
            Some("tcp,udp")
        );
        assert_eq!(
            table.option(ServiceKind::Firewall, options::SUPPORTED_TRAFFIC_DIRECTION),
            Some("ingress")
        );
        assert_eq!(table.option(ServiceKind::StaticNat, "missing"), None);
        assert_eq!(table.iter().count(), 5);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(CapabilityTable::standard()).unwrap();
        assert_eq!(json["static_nat"]["supported"], true);
        assert!(json["static_nat"].get("options").is_none());
        assert_eq!(json["firewall"]["options"]["MultipleIps"], "true");

        let back: CapabilityTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, CapabilityTable::standard());
    }
}
