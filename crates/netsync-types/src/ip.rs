//! IPv4 prefix type with safe parsing.

use crate::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 prefix in CIDR notation (e.g., 10.0.0.0/24 or 203.0.113.5/32).
///
/// The address is kept as given; it is not masked down to the network
/// address, so `10.0.0.5/24` round-trips unchanged. Use [`Ipv4Cidr::network`]
/// when the masked form is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// The all-addresses prefix, 0.0.0.0/0.
    pub const ANY: Self = Ipv4Cidr {
        address: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Creates a new prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length exceeds 32.
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, ParseError> {
        if prefix_len > 32 {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum 32",
                prefix_len
            )));
        }

        Ok(Ipv4Cidr {
            address,
            prefix_len,
        })
    }

    /// Creates a prefix, clamping the length to 32.
    pub const fn saturating_new(address: Ipv4Addr, prefix_len: u8) -> Self {
        Ipv4Cidr {
            address,
            prefix_len: if prefix_len > 32 { 32 } else { prefix_len },
        }
    }

    /// Creates a full-length (/32) prefix for a single host.
    pub const fn host(address: Ipv4Addr) -> Self {
        Ipv4Cidr {
            address,
            prefix_len: 32,
        }
    }

    /// Returns the address part of this prefix.
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true if this is a host prefix (/32).
    pub const fn is_host(&self) -> bool {
        self.prefix_len == 32
    }

    /// Returns true if this is the default prefix (/0).
    pub const fn is_default(&self) -> bool {
        self.prefix_len == 0
    }

    /// Returns the network mask.
    pub fn mask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.mask_bits())
    }

    /// Returns the masked network address.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & self.mask_bits())
    }

    /// Returns this prefix with the host bits cleared.
    pub fn masked(&self) -> Self {
        Ipv4Cidr {
            address: self.network(),
            prefix_len: self.prefix_len,
        }
    }

    /// Returns true if `addr` falls inside this prefix.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask_bits() == u32::from(self.network())
    }

    fn mask_bits(&self) -> u32 {
        match self.prefix_len {
            0 => 0,
            len => u32::MAX << (32 - u32::from(len)),
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ParseError;

    /// Parses `a.b.c.d/len`; a bare address is taken as a /32 host prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = match s.rsplit_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s, None),
        };

        let address: Ipv4Addr = addr_str
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidIpAddress(addr_str.to_string()))?;

        match len_str {
            Some(len) => {
                let prefix_len: u8 = len
                    .trim()
                    .parse()
                    .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;
                Ipv4Cidr::new(address, prefix_len)
            }
            None => Ok(Ipv4Cidr::host(address)),
        }
    }
}

impl From<Ipv4Addr> for Ipv4Cidr {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Cidr::host(addr)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4Cidr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prefix_parse() {
        let prefix: Ipv4Cidr = "10.0.0.0/24".parse().unwrap();
        assert_eq!(prefix.address(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(prefix.prefix_len(), 24);
        assert!(!prefix.is_host());
    }

    #[test]
    fn test_bare_address_is_host() {
        let prefix: Ipv4Cidr = "203.0.113.5".parse().unwrap();
        assert!(prefix.is_host());
        assert_eq!(prefix.to_string(), "203.0.113.5/32");
    }

    #[test]
    fn test_invalid_prefix() {
        assert!("10.0.0.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0/24".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.0/x".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn test_network_and_contains() {
        let prefix: Ipv4Cidr = "10.1.2.77/24".parse().unwrap();
        assert_eq!(prefix.network(), Ipv4Addr::new(10, 1, 2, 0));
        assert_eq!(prefix.mask(), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(prefix.masked().to_string(), "10.1.2.0/24");
        assert!(prefix.contains(Ipv4Addr::new(10, 1, 2, 1)));
        assert!(!prefix.contains(Ipv4Addr::new(10, 1, 3, 1)));
        assert!(Ipv4Cidr::ANY.contains(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn test_link_local_p2p() {
        let prefix: Ipv4Cidr = "169.254.255.0/30".parse().unwrap();
        assert!(prefix.contains(Ipv4Addr::new(169, 254, 255, 1)));
        assert!(prefix.contains(Ipv4Addr::new(169, 254, 255, 2)));
        assert!(!prefix.contains(Ipv4Addr::new(169, 254, 255, 4)));
    }

    #[test]
    fn test_serde_as_string() {
        let prefix: Ipv4Cidr = "192.168.0.0/16".parse().unwrap();
        let json = serde_json::to_string(&prefix).unwrap();
        assert_eq!(json, "\"192.168.0.0/16\"");
        let back: Ipv4Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prefix);
    }
}
