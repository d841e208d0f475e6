//! Engine configuration.
//!
//! Loaded from a TOML file. Only `provider_router_id` is required:
//!
//! ```toml
//! provider_router_id = "6f1c9d1e-8a43-4f0e-9a53-5d1c2b3a4e5f"
//!
//! [uplink]
//! network = "169.254.255.0/30"
//! provider_address = "169.254.255.1"
//! tenant_address = "169.254.255.2"
//!
//! [rules]
//! insert_position = 1
//! route_weight = 100
//!
//! [protocols]
//! gre = 47
//! ```

use crate::error::{SyncError, SyncResult};
use netsync_controller::RouterId;
use netsync_types::{Ipv4Cidr, ProtocolTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

/// Addressing of the point-to-point link between a tenant router and the
/// provider router. Every tenant pair reuses the same subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkConfig {
    #[serde(default = "default_uplink_network")]
    pub network: Ipv4Cidr,

    /// Address of the provider router's downlink port.
    #[serde(default = "default_provider_address")]
    pub provider_address: Ipv4Addr,

    /// Address of the tenant router's uplink port.
    #[serde(default = "default_tenant_address")]
    pub tenant_address: Ipv4Addr,
}

/// Rule and route construction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// 1-based chain position new rules are inserted at.
    #[serde(default = "default_insert_position")]
    pub insert_position: u32,

    /// Weight of every route the engine creates.
    #[serde(default = "default_route_weight")]
    pub route_weight: u32,
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The shared upstream router every tenant router links to.
    pub provider_router_id: RouterId,

    #[serde(default)]
    pub uplink: UplinkConfig,

    #[serde(default)]
    pub rules: RuleConfig,

    /// Protocol names beyond tcp, udp and icmp.
    #[serde(default)]
    pub protocols: BTreeMap<String, u8>,
}

fn default_uplink_network() -> Ipv4Cidr {
    Ipv4Cidr::saturating_new(Ipv4Addr::new(169, 254, 255, 0), 30)
}

fn default_provider_address() -> Ipv4Addr {
    Ipv4Addr::new(169, 254, 255, 1)
}

fn default_tenant_address() -> Ipv4Addr {
    Ipv4Addr::new(169, 254, 255, 2)
}

fn default_insert_position() -> u32 {
    1
}

fn default_route_weight() -> u32 {
    100
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            network: default_uplink_network(),
            provider_address: default_provider_address(),
            tenant_address: default_tenant_address(),
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            insert_position: default_insert_position(),
            route_weight: default_route_weight(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with defaults for everything but the provider
    /// router.
    pub fn new(provider_router_id: RouterId) -> Self {
        Self {
            provider_router_id,
            uplink: UplinkConfig::default(),
            rules: RuleConfig::default(),
            protocols: BTreeMap::new(),
        }
    }

    /// Loads and validates configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SyncResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| SyncError::config("toml", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    pub fn validate(&self) -> SyncResult<()> {
        let uplink = &self.uplink;
        if uplink.network.prefix_len() > 30 {
            return Err(SyncError::config(
                "uplink.network",
                format!("{} leaves no room for two ports", uplink.network),
            ));
        }
        for (field, addr) in [
            ("uplink.provider_address", uplink.provider_address),
            ("uplink.tenant_address", uplink.tenant_address),
        ] {
            if !uplink.network.contains(addr) {
                return Err(SyncError::config(
                    field,
                    format!("{} is outside {}", addr, uplink.network),
                ));
            }
        }
        if uplink.provider_address == uplink.tenant_address {
            return Err(SyncError::config(
                "uplink.tenant_address",
                "must differ from uplink.provider_address",
            ));
        }

        if self.rules.insert_position == 0 {
            return Err(SyncError::config(
                "rules.insert_position",
                "must be at least 1",
            ));
        }

        let standard = ProtocolTable::standard();
        for (name, number) in &self.protocols {
            if let Ok(Some(existing)) = standard.resolve(name) {
                if existing != *number {
                    return Err(SyncError::config(
                        format!("protocols.{}", name),
                        format!("cannot remap standard protocol to {}", number),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Builds the protocol table: the standard entries plus `[protocols]`.
    pub fn protocol_table(&self) -> ProtocolTable {
        ProtocolTable::standard().extended(self.protocols.iter().map(|(k, v)| (k, *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const PROVIDER: &str = "6f1c9d1e-8a43-4f0e-9a53-5d1c2b3a4e5f";

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config =
            EngineConfig::from_toml_str(&format!("provider_router_id = \"{}\"", PROVIDER))
                .unwrap();
        assert_eq!(config.provider_router_id.to_string(), PROVIDER);
        assert_eq!(config.uplink, UplinkConfig::default());
        assert_eq!(config.uplink.network.to_string(), "169.254.255.0/30");
        assert_eq!(config.rules.insert_position, 1);
        assert_eq!(config.rules.route_weight, 100);
    }

    #[test]
    fn test_missing_provider_router_rejected() {
        let err = EngineConfig::from_toml_str("[rules]\ninsert_position = 1\n").unwrap_err();
        assert!(matches!(err, SyncError::Config { .. }));
    }

    #[test]
    fn test_full_config() {
        let toml = format!(
            r#"
provider_router_id = "{}"

[uplink]
network = "169.254.0.0/29"
provider_address = "169.254.0.1"
tenant_address = "169.254.0.6"

[rules]
insert_position = 3
route_weight = 50

[protocols]
gre = 47
"#,
            PROVIDER
        );
        let config = EngineConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.uplink.tenant_address, Ipv4Addr::new(169, 254, 0, 6));
        assert_eq!(config.rules.insert_position, 3);
        assert_eq!(config.protocol_table().resolve("gre").unwrap(), Some(47));
        assert_eq!(config.protocol_table().resolve("tcp").unwrap(), Some(6));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = EngineConfig::new(RouterId::new());
        config.uplink.tenant_address = Ipv4Addr::new(10, 0, 0, 2);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::new(RouterId::new());
        config.uplink.tenant_address = config.uplink.provider_address;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::new(RouterId::new());
        config.rules.insert_position = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::new(RouterId::new());
        config.protocols.insert("tcp".to_string(), 99);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider_router_id = \"{}\"", PROVIDER).unwrap();
        writeln!(file, "[rules]").unwrap();
        writeln!(file, "route_weight = 10").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rules.route_weight, 10);
        assert_eq!(config.rules.insert_position, 1);
    }

    #[test]
    fn test_from_missing_file() {
        let err = EngineConfig::from_file("/nonexistent/netsync.toml").unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
