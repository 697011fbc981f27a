//! Scan reports and the greppable-output parser.
//!
//! The invoker runs the tool with `-oA`, which leaves a `.gnmap` file next to
//! the other formats. Each line of interest looks like:
//!
//! ```text
//! Host: 192.168.1.1 (router.lan)	Status: Up
//! Host: 192.168.1.1 (router.lan)	Ports: 22/open/tcp//ssh//OpenSSH 9.6/, 53/open/udp//domain///
//! ```
//!
//! Fields are tab separated. A host may appear on several lines; they are
//! merged in first-seen order.

use super::traits::ReportParser;
use crate::types::{HostStatus, Port, PortEntry, PortState, Service};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Typed result of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub hosts: Vec<ReportHost>,
}

/// One host as reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHost {
    pub status: HostStatus,
    pub addresses: Vec<String>,
    pub hostname: Option<String>,
    pub ports: Vec<PortEntry>,
}

impl ReportHost {
    pub fn new(address: impl Into<String>, status: HostStatus) -> Self {
        Self {
            status,
            addresses: vec![address.into()],
            hostname: None,
            ports: Vec::new(),
        }
    }

    /// Add a port entry.
    pub fn with_port(mut self, port: PortEntry) -> Self {
        self.ports.push(port);
        self
    }

    /// First reported address.
    pub fn address(&self) -> Option<&str> {
        self.addresses.first().map(String::as_str)
    }

    pub fn is_up(&self) -> bool {
        self.status == HostStatus::Up
    }
}

impl Report {
    /// Hosts reported up that carry at least one address.
    pub fn live_hosts(&self) -> impl Iterator<Item = &ReportHost> {
        self.hosts
            .iter()
            .filter(|h| h.is_up() && h.address().is_some())
    }
}

/// Parser for the tool's greppable (`.gnmap`) output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreppableParser;

impl GreppableParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse greppable text. Returns `None` when it holds neither a header
    /// comment nor any host line.
    pub fn parse_str(&self, content: &str) -> Option<Report> {
        let mut builders: Vec<HostBuilder> = Vec::new();
        let mut recognised = false;

        for line in content.lines() {
            let line = line.trim_end();
            if line.starts_with("# Nmap") {
                recognised = true;
                continue;
            }
            let Some(rest) = line.strip_prefix("Host: ") else {
                continue;
            };
            recognised = true;

            let mut fields = rest.split('\t');
            let Some((address, hostname)) = fields.next().and_then(parse_host_field) else {
                trace!(line, "skipping host line without address");
                continue;
            };

            let index = match builders.iter().position(|b| b.address == address) {
                Some(index) => index,
                None => {
                    builders.push(HostBuilder::new(address));
                    builders.len() - 1
                }
            };
            let builder = &mut builders[index];
            if builder.hostname.is_none() {
                builder.hostname = hostname;
            }

            for field in fields {
                if let Some(status) = field.strip_prefix("Status: ") {
                    builder.status = status.parse().ok();
                } else if let Some(ports) = field.strip_prefix("Ports: ") {
                    builder.ports.extend(ports.split(", ").filter_map(parse_port_entry));
                    builder.saw_ports = true;
                }
            }
        }

        if !recognised {
            return None;
        }

        Some(Report {
            hosts: builders.into_iter().map(HostBuilder::build).collect(),
        })
    }
}

impl ReportParser for GreppableParser {
    fn report_path(&self, output_base: &Path) -> PathBuf {
        let mut path = output_base.as_os_str().to_owned();
        path.push(".gnmap");
        PathBuf::from(path)
    }

    fn parse(&self, path: &Path) -> Option<Report> {
        match fs::read_to_string(path) {
            Ok(content) => self.parse_str(&content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no report file");
                None
            }
        }
    }
}

struct HostBuilder {
    address: String,
    hostname: Option<String>,
    status: Option<HostStatus>,
    ports: Vec<PortEntry>,
    saw_ports: bool,
}

impl HostBuilder {
    fn new(address: String) -> Self {
        Self {
            address,
            hostname: None,
            status: None,
            ports: Vec::new(),
            saw_ports: false,
        }
    }

    fn build(self) -> ReportHost {
        // Port lines are only printed for hosts the tool considered up.
        let status = match self.status {
            Some(status) => status,
            None if self.saw_ports => HostStatus::Up,
            None => HostStatus::Down,
        };
        ReportHost {
            status,
            addresses: vec![self.address],
            hostname: self.hostname,
            ports: self.ports,
        }
    }
}

/// `192.168.1.1 (router.lan)` -> address and optional hostname.
fn parse_host_field(field: &str) -> Option<(String, Option<String>)> {
    let mut parts = field.splitn(2, ' ');
    let address = parts.next()?.trim();
    if address.is_empty() {
        return None;
    }
    let hostname = parts
        .next()
        .map(|h| h.trim().trim_start_matches('(').trim_end_matches(')').trim())
        .filter(|h| !h.is_empty())
        .map(str::to_string);
    Some((address.to_string(), hostname))
}

/// `22/open/tcp//ssh//OpenSSH 9.6/` -> port entry.
fn parse_port_entry(entry: &str) -> Option<PortEntry> {
    let fields: Vec<&str> = entry.trim().split('/').collect();
    if fields.len() < 3 {
        return None;
    }
    let number: Port = fields[0].parse().ok()?;
    let state: PortState = fields[1].parse().ok()?;
    let service = Service::new(
        fields.get(4).copied().unwrap_or_default(),
        fields.get(6).copied().unwrap_or_default(),
    );

    Some(
        PortEntry::new(number, state)
            .with_protocol(fields[2])
            .with_service(service),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWEEP: &str = "\
# Nmap 7.94 scan initiated Sat Oct 17 10:00:00 2026 as: nmap -n -sn -PE -PP -oA sweep/ping_192.168.1.0_24 192.168.1.0/24
Host: 192.168.1.1 ()\tStatus: Up
Host: 192.168.1.3 (printer.lan)\tStatus: Up
Host: 192.168.1.9 ()\tStatus: Down
# Nmap done at Sat Oct 17 10:00:05 2026 -- 256 IP addresses (2 hosts up) scanned in 5.02 seconds
";

    const PORTS: &str = "\
# Nmap 7.94 scan initiated as: nmap -Pn -sT -sV -p1-65535 -oA tcp/tcp-full_10.0.0.5 10.0.0.5
Host: 10.0.0.5 ()\tStatus: Up
Host: 10.0.0.5 ()\tPorts: 22/open/tcp//ssh//OpenSSH 9.6p1 Ubuntu/, 53/open/tcp//domain//dnsmasq 2.90/, 80/closed/tcp//http///\tIgnored State: closed (65532)
# Nmap done at -- 1 IP address (1 host up) scanned in 80.1 seconds
";

    #[test]
    fn test_parse_sweep() {
        let report = GreppableParser::new().parse_str(SWEEP).unwrap();
        assert_eq!(report.hosts.len(), 3);
        assert_eq!(report.hosts[1].hostname.as_deref(), Some("printer.lan"));

        let live: Vec<&str> = report.live_hosts().filter_map(|h| h.address()).collect();
        assert_eq!(live, vec!["192.168.1.1", "192.168.1.3"]);
    }

    #[test]
    fn test_parse_ports_merges_lines() {
        let report = GreppableParser::new().parse_str(PORTS).unwrap();
        assert_eq!(report.hosts.len(), 1);

        let host = &report.hosts[0];
        assert!(host.is_up());
        assert_eq!(host.ports.len(), 3);
        assert_eq!(host.ports[0].service.name, "ssh");
        assert_eq!(host.ports[0].service.version, "OpenSSH 9.6p1 Ubuntu");
        assert_eq!(host.ports[1].service.name, "domain");
        assert_eq!(host.ports[2].state, PortState::Closed);
    }

    #[test]
    fn test_ports_without_status_imply_up() {
        let content = "Host: 10.0.0.8 ()\tPorts: 443/open/tcp//https///\n";
        let report = GreppableParser::new().parse_str(content).unwrap();
        assert!(report.hosts[0].is_up());
    }

    #[test]
    fn test_header_only_is_empty_report() {
        let content = "# Nmap 7.94 scan initiated\n# Nmap done -- 1 IP address (0 hosts up)\n";
        let report = GreppableParser::new().parse_str(content).unwrap();
        assert!(report.hosts.is_empty());
    }

    #[test]
    fn test_live_hosts_need_status_and_address() {
        let mut unnamed = ReportHost::new("", HostStatus::Up);
        unnamed.addresses.clear();
        let report = Report {
            hosts: vec![
                ReportHost::new("10.0.0.1", HostStatus::Up)
                    .with_port(PortEntry::new(Port::new(80).unwrap(), PortState::Open)),
                ReportHost::new("10.0.0.2", HostStatus::Down),
                unnamed,
            ],
        };

        let live: Vec<&ReportHost> = report.live_hosts().collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].address(), Some("10.0.0.1"));
        assert_eq!(live[0].ports.len(), 1);
    }

    #[test]
    fn test_garbage_is_no_report() {
        let parser = GreppableParser::new();
        assert!(parser.parse_str("").is_none());
        assert!(parser.parse_str("Starting Nmap...\nfailed to resolve").is_none());
    }

    #[test]
    fn test_missing_file_is_no_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let parser = GreppableParser::new();
        let path = parser.report_path(&dir.path().join("ping_10.0.0.1"));
        assert!(path.to_string_lossy().ends_with("ping_10.0.0.1.gnmap"));
        assert!(parser.parse(&path).is_none());
    }
}
