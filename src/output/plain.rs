//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{ScanCategory, WorkerOutcome, WorkerStatus};
use crate::types::{Host, HostStatus, PortState, Step, Target};
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "───────────────────────────────────────────────────────────────";

fn step_style(step: Step) -> Style {
    match step {
        Step::Imported | Step::New => Style::new().dim(),
        Step::Sweeped | Step::Scanned => Style::new().yellow(),
        Step::Enumerated | Step::Analyzed => Style::new().green().bold(),
    }
}

/// Print stored targets.
pub fn print_targets(targets: &[Target]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if targets.is_empty() {
        writeln!(out, "  {}", style("No targets stored.").dim())?;
        return Ok(());
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(out, "  {:<40}  {}", style("TARGET").bold(), style("STEP").bold())?;
    writeln!(out, "  {}", style(RULE).dim())?;
    for target in targets {
        writeln!(
            out,
            "  {:<40}  {}",
            target.address,
            step_style(target.step).apply_to(target.step)
        )?;
    }
    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(out, "  {} target(s)", targets.len())?;

    Ok(())
}

/// Print stored hosts with their known ports.
pub fn print_hosts(hosts: &[Host]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if hosts.is_empty() {
        writeln!(out, "  {}", style("No hosts stored.").dim())?;
        return Ok(());
    }

    for host in hosts {
        let status = match host.status {
            HostStatus::Up => style(host.status).green(),
            HostStatus::Down => style(host.status).red(),
        };
        writeln!(
            out,
            "  {} {} {}",
            style(&host.address).white().bold(),
            status,
            step_style(host.step).apply_to(host.step)
        )?;

        for port in &host.ports {
            let state_style = match port.state {
                PortState::Open | PortState::OpenFiltered => Style::new().green().bold(),
                PortState::Closed => Style::new().red(),
                PortState::Filtered => Style::new().yellow(),
            };
            writeln!(
                out,
                "    {:>6}/{:<4} {:^14} {} {}",
                port.number,
                port.protocol,
                state_style.apply_to(port.state.to_string()),
                port.service.name,
                style(&port.service.version).dim()
            )?;
        }
    }
    writeln!(out, "  {} host(s)", hosts.len())?;

    Ok(())
}

/// Print the category table.
pub fn print_categories() -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(
        out,
        "  {:<18}  {:<13}  {}",
        style("CATEGORY").bold(),
        style("PHASE").bold(),
        style("ARGUMENTS").bold()
    )?;
    writeln!(out, "  {}", style(RULE).dim())?;
    for category in ScanCategory::all() {
        let spec = category.spec();
        let root = if spec.requires_root {
            style(" (root)").yellow().to_string()
        } else {
            String::new()
        };
        writeln!(
            out,
            "  {:<18}  {:<13}  {}{}",
            style(spec.name).cyan(),
            format!("{:?}", spec.phase),
            spec.render_args(spec.args, None),
            root
        )?;
        writeln!(out, "  {:<18}  {}", "", style(spec.label).dim())?;
    }
    writeln!(out, "  {}", style(RULE).dim())?;

    Ok(())
}

/// Print joined worker outcomes.
pub fn print_outcomes(outcomes: &[WorkerOutcome]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    for outcome in outcomes {
        match &outcome.status {
            WorkerStatus::Completed { hosts_up, step } => {
                let step = step.map_or_else(|| "not persisted".to_string(), |s| s.to_string());
                writeln!(
                    out,
                    "  {} {} {} {} host(s) up, {}",
                    style("✓").green().bold(),
                    style(outcome.scan.short()).dim(),
                    outcome.name,
                    style(hosts_up).bold(),
                    style(step).dim()
                )?;
            }
            WorkerStatus::Failed { reason } => {
                writeln!(
                    out,
                    "  {} {} {} {}",
                    style("✗").red().bold(),
                    style(outcome.scan.short()).dim(),
                    outcome.name,
                    style(reason).red()
                )?;
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    writeln!(out)?;
    writeln!(
        out,
        "  {} scan(s), {} failed",
        style(outcomes.len()).bold(),
        if failed > 0 {
            style(failed).red().bold()
        } else {
            style(failed).dim()
        }
    )?;

    Ok(())
}

/// Print a header before dispatching.
pub fn print_scan_header(category: ScanCategory, selection: &str, workers: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("recon").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Category: {} ({})",
        style("•").dim(),
        style(category).yellow(),
        category.spec().label
    );
    println!("{} Selection: {}", style("•").dim(), style(selection).white().bold());
    println!(
        "{} Dispatching {} scan(s)...",
        style("•").dim(),
        style(workers).white().bold()
    );
    println!();
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
