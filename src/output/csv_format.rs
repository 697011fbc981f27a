//! CSV output formatting.

use crate::scanner::{WorkerOutcome, WorkerStatus};
use crate::types::{Host, Target};
use std::io::{self, Write};

/// Write targets as `address,step` rows.
pub fn write_targets_csv<W: Write>(writer: W, targets: &[Target]) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["address", "step"])?;
    for target in targets {
        wtr.write_record([target.address.as_str(), target.step.as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write hosts with one row per known port. Hosts without ports get a single
/// row with empty port columns.
pub fn write_hosts_csv<W: Write>(writer: W, hosts: &[Host]) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "address", "status", "step", "port", "protocol", "state", "service", "version",
    ])?;

    for host in hosts {
        let status = host.status.to_string();
        if host.ports.is_empty() {
            wtr.write_record([host.address.as_str(), status.as_str(), host.step.as_str(), "", "", "", "", ""])?;
            continue;
        }
        for port in &host.ports {
            wtr.write_record([
                host.address.as_str(),
                status.as_str(),
                host.step.as_str(),
                port.number.to_string().as_str(),
                port.protocol.as_str(),
                port.state.to_string().as_str(),
                port.service.name.as_str(),
                port.service.version.as_str(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Write worker outcomes.
pub fn write_outcomes_csv<W: Write>(writer: W, outcomes: &[WorkerOutcome]) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["scan", "name", "category", "address", "status", "hosts_up", "step", "reason"])?;

    for outcome in outcomes {
        let (status, hosts_up, step, reason) = match &outcome.status {
            WorkerStatus::Completed { hosts_up, step } => (
                "completed",
                hosts_up.to_string(),
                step.map(|s| s.to_string()).unwrap_or_default(),
                String::new(),
            ),
            WorkerStatus::Failed { reason } => ("failed", String::new(), String::new(), reason.clone()),
        };
        wtr.write_record([
            outcome.scan.to_string().as_str(),
            outcome.name.as_str(),
            outcome.category.to_string().as_str(),
            outcome.address.as_str(),
            status,
            hosts_up.as_str(),
            step.as_str(),
            reason.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HostStatus, Port, PortEntry, PortState, Service, Step};

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_targets_csv() {
        let targets = vec![
            Target::new("10.0.0.0/24", Step::Sweeped),
            Target::imported("example.com"),
        ];
        let out = render(|buf| write_targets_csv(buf, &targets));
        assert_eq!(out, "address,step\n10.0.0.0/24,SWEEPED\nexample.com,IMPORTED\n");
    }

    #[test]
    fn test_hosts_csv_one_row_per_port() {
        let mut host = Host::new("10.0.0.5", HostStatus::Up, Step::Scanned);
        host.upsert_port(
            PortEntry::new(Port::new(22).unwrap(), PortState::Open)
                .with_service(Service::new("ssh", "OpenSSH 9.6")),
        );
        host.upsert_port(PortEntry::new(Port::new(80).unwrap(), PortState::Filtered));
        let bare = Host::new("10.0.0.6", HostStatus::Up, Step::New);

        let out = render(|buf| write_hosts_csv(buf, &[host, bare]));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "10.0.0.5,up,SCANNED,22,tcp,open,ssh,OpenSSH 9.6");
        assert_eq!(lines[2], "10.0.0.5,up,SCANNED,80,tcp,filtered,,");
        assert_eq!(lines[3], "10.0.0.6,up,NEW,,,,,");
    }
}
