//! Protocol name lookup.
//!
//! Desired rules name their protocol ("tcp", "udp", "icmp", "all"); controller
//! rules carry the IP protocol number. The table is built once and shared
//! read-only by everything that needs the translation.

use crate::ParseError;
use std::collections::BTreeMap;

pub const PROTO_ICMP: u8 = 1;
pub const PROTO_TCP: u8 = 6;
pub const PROTO_UDP: u8 = 17;

/// Names that mean "no protocol match".
const WILDCARD_NAMES: &[&str] = &["all", "any"];

/// Immutable protocol name to IP protocol number table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolTable {
    by_name: BTreeMap<String, u8>,
}

impl ProtocolTable {
    /// The protocols every deployment understands.
    pub fn standard() -> Self {
        Self::with_entries([("icmp", PROTO_ICMP), ("tcp", PROTO_TCP), ("udp", PROTO_UDP)])
    }

    /// Builds a table from explicit entries. Names are case-insensitive.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u8)>,
        S: AsRef<str>,
    {
        let by_name = entries
            .into_iter()
            .map(|(name, number)| (name.as_ref().to_ascii_lowercase(), number))
            .collect();
        Self { by_name }
    }

    /// Returns a copy of this table extended with `extra` entries.
    pub fn extended<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (S, u8)>,
        S: AsRef<str>,
    {
        let mut by_name = self.by_name.clone();
        for (name, number) in extra {
            by_name.insert(name.as_ref().to_ascii_lowercase(), number);
        }
        Self { by_name }
    }

    /// Resolves a protocol name.
    ///
    /// Returns `Ok(None)` for the wildcard names ("all", "any"), which match
    /// every protocol.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownProtocol`] for names not in the table.
    pub fn resolve(&self, name: &str) -> Result<Option<u8>, ParseError> {
        let key = name.trim().to_ascii_lowercase();
        if WILDCARD_NAMES.contains(&key.as_str()) {
            return Ok(None);
        }
        self.by_name
            .get(&key)
            .copied()
            .map(Some)
            .ok_or_else(|| ParseError::UnknownProtocol(name.to_string()))
    }

    /// Returns the name registered for a protocol number, if any.
    pub fn name_of(&self, number: u8) -> Option<&str> {
        self.by_name
            .iter()
            .find(|(_, n)| **n == number)
            .map(|(name, _)| name.as_str())
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

impl Default for ProtocolTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_entries() {
        let table = ProtocolTable::standard();
        assert_eq!(table.resolve("tcp").unwrap(), Some(PROTO_TCP));
        assert_eq!(table.resolve("UDP").unwrap(), Some(PROTO_UDP));
        assert_eq!(table.resolve(" icmp ").unwrap(), Some(PROTO_ICMP));
    }

    #[test]
    fn test_wildcard() {
        let table = ProtocolTable::standard();
        assert_eq!(table.resolve("all").unwrap(), None);
        assert_eq!(table.resolve("ANY").unwrap(), None);
    }

    #[test]
    fn test_unknown_protocol() {
        let table = ProtocolTable::standard();
        assert_eq!(
            table.resolve("sctp"),
            Err(ParseError::UnknownProtocol("sctp".to_string()))
        );
    }

    #[test]
    fn test_extended() {
        let table = ProtocolTable::standard().extended([("gre", 47u8)]);
        assert_eq!(table.resolve("gre").unwrap(), Some(47));
        assert_eq!(table.name_of(47), Some("gre"));
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec!["gre", "icmp", "tcp", "udp"]
        );
    }
}
