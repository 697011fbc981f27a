//! Import subcommand implementation.
//!
//! Handles `recon import <address>...`, adding targets at step IMPORTED.

use crate::cli::Environment;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::storage::StateStore;
use crate::types::{Step, TargetSpec};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Import targets into the state store.
#[derive(Parser, Debug)]
pub struct ImportCommand {
    /// Targets to import (IP, hostname, or CIDR notation)
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Read additional targets from a file, one per line (`#` starts a comment)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl ImportCommand {
    /// Execute the import command.
    pub fn execute(&self, env: &Environment, quiet: bool) -> CliResult<()> {
        let store = env.require_store()?;

        let mut raw = self.targets.clone();
        if let Some(path) = &self.file {
            raw.extend(read_target_file(path)?);
        }
        if raw.is_empty() {
            return Err(CliError::Other("no targets given".to_string()));
        }

        // Validate everything before touching the store.
        let specs = raw
            .iter()
            .map(|s| TargetSpec::parse(s))
            .collect::<Result<Vec<_>, _>>()?;

        let mut added = 0;
        for spec in &specs {
            let address = spec.to_string();
            if store.add_target(&address, Step::Imported)? {
                info!(address = %address, "target imported");
                added += 1;
            }
        }

        if !quiet {
            output::print_success(&format!(
                "{} target(s) imported, {} already known",
                added,
                specs.len() - added
            ));
        }

        Ok(())
    }
}

/// Read one target per non-empty, non-comment line.
fn read_target_file(path: &Path) -> CliResult<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
