//! Host records: confirmed-live addresses discovered by scans.

use super::{PortEntry, Step};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Liveness reported for a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Up,
    Down,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

impl FromStr for HostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(format!("unknown host status: {}", s)),
        }
    }
}

/// A live address and what is known about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub address: String,
    pub status: HostStatus,
    pub step: Step,
    #[serde(default)]
    pub ports: Vec<PortEntry>,
}

impl Host {
    pub fn new(address: impl Into<String>, status: HostStatus, step: Step) -> Self {
        Self {
            address: address.into(),
            status,
            step,
            ports: Vec::new(),
        }
    }

    /// Move the step forward to `next`. Returns `false` if it was already there or later.
    pub fn advance_to(&mut self, next: Step) -> bool {
        let advanced = self.step.advanced_to(next);
        let changed = advanced != self.step;
        self.step = advanced;
        changed
    }

    /// Insert or replace a port, keyed by number and protocol.
    pub fn upsert_port(&mut self, entry: PortEntry) {
        match self.ports.iter_mut().find(|p| p.same_socket(&entry)) {
            Some(existing) => *existing = entry,
            None => {
                self.ports.push(entry);
                self.ports.sort_by_key(|p| p.number);
            }
        }
    }

    /// Fold a freshly reported record for the same address into this one.
    /// Status and ports follow the report; the step never moves backwards.
    /// Returns `true` if anything changed.
    pub fn absorb(&mut self, reported: Host) -> bool {
        let before = self.clone();
        self.status = reported.status;
        self.advance_to(reported.step);
        for port in reported.ports {
            self.upsert_port(port);
        }
        *self != before
    }

    /// Iterate over open ports.
    pub fn open_ports(&self) -> impl Iterator<Item = &PortEntry> {
        self.ports.iter().filter(|p| p.is_open())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Port, PortState, Service};

    #[test]
    fn test_upsert_port_replaces_same_socket() {
        let mut host = Host::new("10.0.0.1", HostStatus::Up, Step::New);
        let p = Port::new(22).unwrap();
        host.upsert_port(PortEntry::new(p, PortState::Filtered));
        host.upsert_port(
            PortEntry::new(p, PortState::Open).with_service(Service::new("ssh", "OpenSSH 9.6")),
        );

        assert_eq!(host.ports.len(), 1);
        assert!(host.ports[0].is_open());
        assert_eq!(host.ports[0].service.name, "ssh");
    }

    #[test]
    fn test_ports_sorted_and_filtered() {
        let mut host = Host::new("10.0.0.1", HostStatus::Up, Step::New);
        host.upsert_port(PortEntry::new(Port::new(443).unwrap(), PortState::Open));
        host.upsert_port(PortEntry::new(Port::new(22).unwrap(), PortState::Closed));
        host.upsert_port(PortEntry::new(Port::new(80).unwrap(), PortState::Open));

        let numbers: Vec<u16> = host.ports.iter().map(|p| p.number.as_u16()).collect();
        assert_eq!(numbers, vec![22, 80, 443]);
        assert_eq!(host.open_ports().count(), 2);
    }

    #[test]
    fn test_absorb_keeps_step_and_merges_ports() {
        let mut host = Host::new("10.0.0.1", HostStatus::Up, Step::Scanned);
        host.upsert_port(PortEntry::new(Port::new(22).unwrap(), PortState::Open));

        let mut reported = Host::new("10.0.0.1", HostStatus::Up, Step::New);
        reported.upsert_port(PortEntry::new(Port::new(80).unwrap(), PortState::Open));
        assert!(host.absorb(reported.clone()));
        assert_eq!(host.step, Step::Scanned);
        assert_eq!(host.ports.len(), 2);

        assert!(!host.absorb(reported));
    }

    #[test]
    fn test_host_status_from_str() {
        assert_eq!("Up".parse::<HostStatus>().unwrap(), HostStatus::Up);
        assert_eq!("down".parse::<HostStatus>().unwrap(), HostStatus::Down);
        assert!("unknown".parse::<HostStatus>().is_err());
    }
}
