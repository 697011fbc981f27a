//! Scan categories and their tool arguments.
//!
//! Every category is one row of a static table: argument template, port
//! list, output folder and the pipeline phase it belongs to. The phase
//! decides what gets scanned (targets or hosts) and which step a subject
//! reaches once the scan completes.
//!
//! Templates may contain `{ports}` (the category's port list, comma-joined)
//! and `{port}` (the single port being enumerated). The target address is
//! always appended by the invoker.

use crate::error::DispatchError;
use crate::types::{Port, PortEntry, Step};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named class of reconnaissance activity.
///
/// Declaration order matches [`CATEGORIES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ScanCategory {
    Ping,
    NetworkDiscovery,
    Arp,
    MacAnalysis,
    TcpFull,
    TcpVuln,
    Auth,
    Web,
    Mobile,
    Iot,
    Gaming,
    Cctv,
    Dns,
    Ssh,
    Http,
}

/// Which part of the pipeline a category drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Host discovery against imported targets.
    Sweep,
    /// Port scan of discovered hosts.
    PortScan,
    /// Version detection against a device-class port list.
    ServiceProbe,
    /// Per-service enumeration of already known open ports.
    Enumeration,
}

/// What kind of record a scan runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Target,
    Host,
}

impl Phase {
    /// Step a subject reaches after a completed scan of this phase.
    pub const fn completion_step(self) -> Step {
        match self {
            Self::Sweep => Step::Sweeped,
            Self::PortScan => Step::Scanned,
            Self::ServiceProbe => Step::Analyzed,
            Self::Enumeration => Step::Enumerated,
        }
    }

    /// Sweeps run against targets, everything else against hosts.
    pub const fn subject_kind(self) -> SubjectKind {
        match self {
            Self::Sweep => SubjectKind::Target,
            _ => SubjectKind::Host,
        }
    }

    /// Whether reported ports are written back to the host.
    pub const fn records_ports(self) -> bool {
        matches!(self, Self::PortScan | Self::ServiceProbe)
    }

    /// Step a host must have reached before this phase can move it forward.
    ///
    /// Service probes and enumeration build on a finished port scan.
    pub const fn prerequisite(self) -> Option<Step> {
        match self {
            Self::ServiceProbe | Self::Enumeration => Some(Step::Scanned),
            Self::Sweep | Self::PortScan => None,
        }
    }

    /// Whether a subject at `step` may be advanced by this phase.
    pub fn can_advance(self, step: Step) -> bool {
        self.prerequisite().map_or(true, |required| step >= required)
    }

    /// Whether a subject at `step` has yet to go through this phase.
    ///
    /// Targets qualify only while still `IMPORTED`; hosts qualify once the
    /// phase's prerequisite is met and until they reach its completion step.
    pub fn is_pending(self, step: Step) -> bool {
        match self.subject_kind() {
            SubjectKind::Target => step == Step::Imported,
            SubjectKind::Host => self.can_advance(step) && step < self.completion_step(),
        }
    }
}

/// One row of the category table.
#[derive(Debug)]
pub struct CategorySpec {
    pub category: ScanCategory,
    /// Command-line name, e.g. `TCP-FULL`.
    pub name: &'static str,
    pub label: &'static str,
    /// Output sub-folder under the output root.
    pub folder: &'static str,
    pub args: &'static str,
    /// Device-class port list for `{ports}`, or well-known ports for enumeration.
    pub ports: &'static [u16],
    pub phase: Phase,
    /// Case-insensitive service-name substrings that make a port eligible.
    pub service_needles: &'static [&'static str],
    pub requires_root: bool,
}

/// The category table.
pub static CATEGORIES: [CategorySpec; 15] = [
    CategorySpec {
        category: ScanCategory::Ping,
        name: "PING",
        label: "Ping sweep",
        folder: "sweep",
        args: "-n -sn -PE -PP",
        ports: &[],
        phase: Phase::Sweep,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::NetworkDiscovery,
        name: "NETWORK-DISCOVERY",
        label: "Network discovery",
        folder: "sweep",
        args: "-sn -PE -PP -PM -PU",
        ports: &[],
        phase: Phase::Sweep,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Arp,
        name: "ARP",
        label: "ARP discovery with OS detection",
        folder: "sweep",
        args: "-PR -O",
        ports: &[],
        phase: Phase::Sweep,
        service_needles: &[],
        requires_root: true,
    },
    CategorySpec {
        category: ScanCategory::MacAnalysis,
        name: "MAC-ANALYSIS",
        label: "MAC address analysis",
        folder: "sweep",
        args: "-sn -PE -PA",
        ports: &[],
        phase: Phase::Sweep,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::TcpFull,
        name: "TCP-FULL",
        label: "Full TCP port scan",
        folder: "tcp",
        args: "-Pn -sT -sV -p1-65535",
        ports: &[],
        phase: Phase::PortScan,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::TcpVuln,
        name: "TCP-VULN",
        label: "TCP vulnerability scan",
        folder: "tcp",
        args: "-Pn -sV --script vuln -p1-10000",
        ports: &[],
        phase: Phase::PortScan,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Auth,
        name: "AUTH",
        label: "Authentication services",
        folder: "probe",
        args: "-Pn -sV --script auth -p{ports}",
        ports: &[22, 21, 3389, 445, 389, 636, 5432, 3306, 1433],
        phase: Phase::ServiceProbe,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Web,
        name: "WEB",
        label: "Web applications",
        folder: "probe",
        args: "-Pn -sV --script http-title,http-headers -p{ports}",
        ports: &[80, 8080, 8000, 443, 8443, 3000, 5000, 9000],
        phase: Phase::ServiceProbe,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Mobile,
        name: "MOBILE",
        label: "Mobile devices",
        folder: "probe",
        args: "-Pn -sV -p{ports}",
        ports: &[5555, 8080, 8443, 9100, 10000, 5900],
        phase: Phase::ServiceProbe,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Iot,
        name: "IOT",
        label: "IoT devices",
        folder: "probe",
        args: "-Pn -sV -O -p{ports}",
        ports: &[1883, 8883, 5353, 5900, 8080, 8443, 9100, 9200, 27017, 5432],
        phase: Phase::ServiceProbe,
        service_needles: &[],
        requires_root: true,
    },
    CategorySpec {
        category: ScanCategory::Gaming,
        name: "GAMING",
        label: "Gaming consoles",
        folder: "probe",
        args: "-Pn -sV -p{ports}",
        ports: &[3074, 5223, 8080, 443, 80, 53],
        phase: Phase::ServiceProbe,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Cctv,
        name: "CCTV",
        label: "CCTV and drones",
        folder: "probe",
        args: "-Pn -sV -p{ports}",
        ports: &[80, 8080, 443, 8443, 554, 5000, 5900, 9000],
        phase: Phase::ServiceProbe,
        service_needles: &[],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Dns,
        name: "DNS",
        label: "DNS enumeration",
        folder: "enum",
        args: "-sV -Pn -sU -p53,{port}",
        ports: &[53],
        phase: Phase::Enumeration,
        service_needles: &["dns", "domain"],
        requires_root: true,
    },
    CategorySpec {
        category: ScanCategory::Ssh,
        name: "SSH",
        label: "SSH enumeration",
        folder: "enum",
        args: "-sV -Pn -p{port} --script ssh-hostkey,ssh-auth-methods",
        ports: &[22],
        phase: Phase::Enumeration,
        service_needles: &["ssh"],
        requires_root: false,
    },
    CategorySpec {
        category: ScanCategory::Http,
        name: "HTTP",
        label: "HTTP enumeration",
        folder: "enum",
        args: "-sV -Pn -p{port} --script http-enum,http-title",
        ports: &[80, 443, 8080],
        phase: Phase::Enumeration,
        service_needles: &["http"],
        requires_root: false,
    },
];

impl ScanCategory {
    /// Table row for this category.
    pub fn spec(self) -> &'static CategorySpec {
        &CATEGORIES[self as usize]
    }

    /// Iterate over every category in table order.
    pub fn all() -> impl Iterator<Item = ScanCategory> {
        CATEGORIES.iter().map(|spec| spec.category)
    }
}

impl fmt::Display for ScanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

impl FromStr for ScanCategory {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-");
        CATEGORIES
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(&wanted))
            .map(|spec| spec.category)
            .ok_or_else(|| DispatchError::UnknownCategory(s.to_string()))
    }
}

impl CategorySpec {
    /// Fill `{ports}` and `{port}` placeholders in `template`.
    pub fn render_args(&self, template: &str, port: Option<Port>) -> String {
        let joined = self
            .ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let rendered = template.replace("{ports}", &joined);
        match port {
            Some(port) => rendered.replace("{port}", &port.to_string()),
            None => rendered,
        }
    }

    /// Whether an enumeration category applies to `entry`: the port must be
    /// open, and either its number is well known for the service or the
    /// identified service name contains one of the needles.
    pub fn matches_port(&self, entry: &PortEntry) -> bool {
        if !entry.is_open() {
            return false;
        }
        if self.ports.contains(&entry.number.as_u16()) {
            return true;
        }
        let service = entry.service.name.to_lowercase();
        self.service_needles
            .iter()
            .any(|needle| service.contains(needle))
    }
}
