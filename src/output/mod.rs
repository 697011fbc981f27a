//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of stored targets,
//! hosts and finished scans.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::{write_hosts_csv, write_outcomes_csv, write_targets_csv};
pub use json_format::print_json;
pub use plain::{
    print_categories, print_info, print_scan_header, print_success, print_warning,
};

use crate::cli::OutputFormat;
use crate::scanner::WorkerOutcome;
use crate::types::{Host, Target};
use std::io;

/// Print stored targets in the requested format.
pub fn print_targets(targets: &[Target], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::print_targets(targets),
        OutputFormat::Json => print_json(targets),
        OutputFormat::Csv => write_targets_csv(io::stdout().lock(), targets),
    }
}

/// Print stored hosts in the requested format.
pub fn print_hosts(hosts: &[Host], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::print_hosts(hosts),
        OutputFormat::Json => print_json(hosts),
        OutputFormat::Csv => write_hosts_csv(io::stdout().lock(), hosts),
    }
}

/// Print the outcome of every joined worker.
pub fn print_outcomes(outcomes: &[WorkerOutcome], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::print_outcomes(outcomes),
        OutputFormat::Json => print_json(outcomes),
        OutputFormat::Csv => write_outcomes_csv(io::stdout().lock(), outcomes),
    }
}
