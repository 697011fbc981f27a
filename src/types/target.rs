//! Target records and address validation.
//!
//! A target address may be:
//! - A single IP address (IPv4 or IPv6)
//! - A CIDR network (192.168.1.0/24)
//! - A hostname (example.com)
//!
//! Addresses are handed to the scanning tool verbatim, so nothing here
//! resolves or expands them; parsing only rejects malformed input early.

use super::Step;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// An address slated for processing, tracked by lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// IP, hostname or CIDR. Unique within the store.
    pub address: String,
    /// Current pipeline stage.
    pub step: Step,
}

impl Target {
    /// Create a target at the given step.
    pub fn new(address: impl Into<String>, step: Step) -> Self {
        Self {
            address: address.into(),
            step,
        }
    }

    /// Create a freshly imported target.
    pub fn imported(address: impl Into<String>) -> Self {
        Self::new(address, Step::Imported)
    }

    /// Move the step forward to `next`. Returns `false` if it was already there or later.
    pub fn advance_to(&mut self, next: Step) -> bool {
        let advanced = self.step.advanced_to(next);
        let changed = advanced != self.step;
        self.step = advanced;
        changed
    }
}

/// Error type for target parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
}

/// A validated target address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A CIDR network range.
    Cidr(IpNetwork),
    /// A hostname, left for the scanning tool to resolve.
    Hostname(String),
}

impl TargetSpec {
    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if s.contains('/') {
            let network: IpNetwork = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            return Ok(Self::Cidr(network));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Cidr(network) => write!(f, "{}", network),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// Replace path-hostile characters of an address so it can name an output file.
pub fn file_stem(address: &str) -> String {
    address
        .trim()
        .chars()
        .map(|c| match c {
            '/' | ':' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label must be 1-63 characters
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if !label.chars().next().map_or(false, |c| c.is_alphanumeric()) {
            return false;
        }
        if !label.chars().last().map_or(false, |c| c.is_alphanumeric()) {
            return false;
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        let spec = TargetSpec::parse("192.168.1.1").unwrap();
        assert!(matches!(spec, TargetSpec::Single(IpAddr::V4(_))));
    }

    #[test]
    fn test_parse_ipv6() {
        let spec = TargetSpec::parse("::1").unwrap();
        assert!(matches!(spec, TargetSpec::Single(IpAddr::V6(_))));
    }

    #[test]
    fn test_parse_cidr_v4() {
        let spec = TargetSpec::parse("192.168.1.0/24").unwrap();
        if let TargetSpec::Cidr(network) = spec {
            assert_eq!(network.prefix(), 24);
        } else {
            panic!("Expected CIDR");
        }
    }

    #[test]
    fn test_large_cidr_is_accepted() {
        // The scanning tool decides how to walk the range.
        assert!(TargetSpec::parse("10.0.0.0/8").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            TargetSpec::parse("10.0.0.0/40"),
            Err(TargetError::InvalidCidr(_))
        ));
        assert!(matches!(
            TargetSpec::parse("-bad-.com"),
            Err(TargetError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("192.168.1.0/24"), "192.168.1.0_24");
        assert_eq!(file_stem("fe80::1"), "fe80__1");
        assert_eq!(file_stem("example.com"), "example.com");
    }

    #[test]
    fn test_target_advance() {
        let mut target = Target::imported("10.0.0.1");
        assert!(target.advance_to(Step::Sweeped));
        assert_eq!(target.step, Step::Sweeped);
        assert!(!target.advance_to(Step::New));
        assert_eq!(target.step, Step::Sweeped);
    }

    #[test]
    fn test_valid_hostname() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("my-server"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-invalid.com"));
    }
}
