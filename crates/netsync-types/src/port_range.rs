//! Inclusive L4 port ranges.

use crate::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An inclusive range of TCP/UDP ports.
///
/// Serialized as a string in the same `80` / `8000-8080` form it displays as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Creates a new port range.
    ///
    /// # Errors
    ///
    /// Returns an error if `start > end`.
    pub fn new(start: u16, end: u16) -> Result<Self, ParseError> {
        if start > end {
            return Err(ParseError::InvalidPortRange(format!(
                "start port {} > end port {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a range matching a single port.
    pub const fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub const fn start(&self) -> u16 {
        self.start
    }

    pub const fn end(&self) -> u16 {
        self.end
    }

    /// Returns true if the range matches every port, which is the same as not
    /// matching on ports at all.
    pub const fn is_any(&self) -> bool {
        self.start <= 1 && self.end == u16::MAX
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for PortRange {
    type Err = ParseError;

    /// Parses `80`, `8000-8080` or `8000:8080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_port = |p: &str| {
            p.trim()
                .parse::<u16>()
                .map_err(|_| ParseError::InvalidPortRange(s.to_string()))
        };

        match s.split_once(['-', ':']) {
            Some((start, end)) => PortRange::new(parse_port(start)?, parse_port(end)?),
            None => Ok(PortRange::single(parse_port(s)?)),
        }
    }
}

impl Serialize for PortRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_range() {
        assert_eq!("22".parse::<PortRange>().unwrap(), PortRange::single(22));
        let range: PortRange = "8000-8080".parse().unwrap();
        assert_eq!((range.start(), range.end()), (8000, 8080));
        assert_eq!("8000:8080".parse::<PortRange>().unwrap(), range);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(PortRange::new(90, 80).is_err());
        assert!("90-80".parse::<PortRange>().is_err());
        assert!("http".parse::<PortRange>().is_err());
    }

    #[test]
    fn test_is_any() {
        assert!(PortRange::new(1, 65535).unwrap().is_any());
        assert!(PortRange::new(0, 65535).unwrap().is_any());
        assert!(!PortRange::new(1, 1024).unwrap().is_any());
    }

    #[test]
    fn test_display() {
        assert_eq!(PortRange::single(443).to_string(), "443");
        assert_eq!(PortRange::new(20, 21).unwrap().to_string(), "20-21");
    }

    #[test]
    fn test_serde_validates() {
        let range: PortRange = serde_json::from_str("\"8000-8080\"").unwrap();
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"8000-8080\"");
        assert!(serde_json::from_str::<PortRange>("\"90-80\"").is_err());
    }
}
