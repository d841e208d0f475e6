//! Common netsync types shared by the controller model and the sync engine.
//!
//! This crate provides type-safe representations of the network primitives
//! that appear in both desired rules and controller objects:
//!
//! - [`Ipv4Cidr`]: IPv4 prefixes (CIDR notation), including /32 host prefixes
//! - [`PortRange`]: inclusive L4 port ranges
//! - [`ProtocolTable`]: immutable protocol name to IP protocol number lookup

mod ip;
mod port_range;
mod protocol;

pub use ip::Ipv4Cidr;
pub use port_range::PortRange;
pub use protocol::{ProtocolTable, PROTO_ICMP, PROTO_TCP, PROTO_UDP};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid port range: {0}")]
    InvalidPortRange(String),

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
}
