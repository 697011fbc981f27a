//! Scan subcommand implementation.
//!
//! Handles `recon scan <category> [selection]`: dispatches the category,
//! waits for every worker behind a spinner and prints what ran.

use crate::cli::{Environment, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::{Dispatcher, ScanCategory, ScanDescriptor, Selection, WorkerOutcome};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Dispatch a scan category.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Scan category (see `recon categories`), e.g. PING, TCP-FULL, DNS
    #[arg(value_name = "CATEGORY")]
    pub category: String,

    /// What to scan
    ///
    /// Examples:
    ///   TO_ANALYZE         Records not yet through this category's phase
    ///   ALL                Every stored record
    ///   192.168.1.0/24     One target for sweeps (imported if unknown)
    ///   192.168.1.7        One host for later phases
    #[arg(value_name = "SELECTION", default_value = "TO_ANALYZE")]
    pub selection: String,

    /// Replace the category's scanner arguments (`{ports}`/`{port}` still apply)
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Output format for the scan summary
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

/// Everything a finished dispatch produced.
#[derive(Serialize)]
struct ScanSummary<'a> {
    scans: &'a [ScanDescriptor],
    outcomes: &'a [WorkerOutcome],
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, env: &Environment, quiet: bool) -> CliResult<()> {
        let category: ScanCategory = self.category.parse()?;
        let selection: Selection = self.selection.parse()?;
        let spec = category.spec();
        let plain = self.output == OutputFormat::Plain;

        if spec.requires_root && !is_root() {
            output::print_warning(&format!(
                "{} needs root/sudo privileges; results may be incomplete.",
                category
            ));
        }

        let ctx = Arc::new(env.context());
        if ctx.is_degraded() && !quiet {
            output::print_warning("running without the state store; nothing will be saved");
        }

        let dispatcher = Dispatcher::new(ctx);
        let jobs = dispatcher.dispatch_category(category, &selection, self.args.as_deref());

        if jobs.is_empty() {
            if !quiet {
                output::print_info(&format!("nothing to scan for {} {}", category, selection));
            }
            return Ok(());
        }

        if !quiet && plain {
            output::print_scan_header(category, &selection.to_string(), jobs.len());
        }

        let spinner = if quiet || !plain {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        };
        spinner.set_message(format!("{} scan(s) running...", jobs.len()));

        let outcomes = tokio::select! {
            outcomes = dispatcher.join() => outcomes,
            _ = tokio::signal::ctrl_c() => {
                let cancelled = dispatcher.workers().shutdown();
                spinner.abandon_with_message("interrupted");
                warn!(cancelled, "scan interrupted, workers cancelled");
                return Err(CliError::Other("scan interrupted".to_string()));
            }
        };
        spinner.finish_and_clear();

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(category = %category, scans = outcomes.len(), failed, "dispatch finished");

        let scans = dispatcher.context().registry().list();
        match self.output {
            OutputFormat::Plain => {
                output::print_outcomes(&outcomes, OutputFormat::Plain)?;
                if !quiet {
                    for scan in &scans {
                        output::print_info(&format!(
                            "{} -> {}",
                            scan.id.short(),
                            scan.output_path().display()
                        ));
                    }
                }
            }
            OutputFormat::Json => output::print_json(&ScanSummary {
                scans: &scans,
                outcomes: &outcomes,
            })?,
            OutputFormat::Csv => output::print_outcomes(&outcomes, OutputFormat::Csv)?,
        }

        Ok(())
    }
}

/// Check if running with root/admin privileges.
fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
