//! Inventory subcommands: `recon targets` and `recon hosts`.

use crate::cli::{Environment, OutputFormat};
use crate::error::CliResult;
use crate::output;
use crate::storage::StateStore;
use crate::types::Step;
use clap::Parser;

/// List stored targets.
#[derive(Parser, Debug)]
pub struct TargetsCommand {
    /// Only show targets at this step (e.g. IMPORTED)
    #[arg(short, long, value_name = "STEP")]
    pub step: Option<Step>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl TargetsCommand {
    pub fn execute(&self, env: &Environment) -> CliResult<()> {
        let store = env.require_store()?;
        let targets = match self.step {
            Some(step) => store.find_targets(&|t| t.step == step)?,
            None => store.get_all_targets()?,
        };
        output::print_targets(&targets, self.output)?;
        Ok(())
    }
}

/// List stored hosts.
#[derive(Parser, Debug)]
pub struct HostsCommand {
    /// Only show hosts at this step (e.g. NEW)
    #[arg(short, long, value_name = "STEP")]
    pub step: Option<Step>,

    /// Only show hosts with at least one open port
    #[arg(long)]
    pub open: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl HostsCommand {
    pub fn execute(&self, env: &Environment) -> CliResult<()> {
        let store = env.require_store()?;
        let hosts = store.find_hosts(&|h| {
            self.step.map_or(true, |step| h.step == step)
                && (!self.open || h.open_ports().next().is_some())
        })?;
        output::print_hosts(&hosts, self.output)?;
        Ok(())
    }
}
