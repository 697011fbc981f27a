//! Cache subcommand implementation.
//!
//! Every scan leaves its tool output under `<output-dir>/<folder>/<name>.*`.
//! `recon cache` lists those reports; `recon cache <name>` re-reads one.

use crate::cli::{Environment, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::{GreppableParser, ReportParser, CATEGORIES};
use crate::types::Host;
use clap::Parser;
use console::style;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Browse cached scanner output.
#[derive(Parser, Debug)]
pub struct CacheCommand {
    /// Report name to show (e.g. ping_192.168.1.0_24); lists all when omitted
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Output format when showing a report
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl CacheCommand {
    pub fn execute(&self, env: &Environment) -> CliResult<()> {
        match &self.name {
            Some(name) => self.show(&env.output_dir, name),
            None => list(&env.output_dir),
        }
    }

    fn show(&self, root: &Path, name: &str) -> CliResult<()> {
        let parser = GreppableParser;
        let report = folders()
            .map(|folder| parser.report_path(&root.join(folder).join(name)))
            .find(|path| path.is_file())
            .and_then(|path| parser.parse(&path))
            .ok_or_else(|| CliError::Other(format!("no cached report named '{}'", name)))?;

        // Reuse the host views; cached reports carry no pipeline step.
        let hosts: Vec<Host> = report
            .hosts
            .into_iter()
            .filter_map(|h| {
                let mut host = Host::new(h.address()?, h.status, Default::default());
                for port in h.ports {
                    host.upsert_port(port);
                }
                Some(host)
            })
            .collect();

        output::print_hosts(&hosts, self.output)?;
        Ok(())
    }
}

/// Distinct output folders used by the category table.
fn folders() -> impl Iterator<Item = &'static str> {
    CATEGORIES
        .iter()
        .map(|spec| spec.folder)
        .collect::<BTreeSet<_>>()
        .into_iter()
}

/// Report base names (without extension) per folder.
fn cached_reports(root: &Path) -> CliResult<Vec<(&'static str, Vec<String>)>> {
    let parser = GreppableParser;
    let mut listing = Vec::new();

    for folder in folders() {
        let dir = root.join(folder);
        if !dir.is_dir() {
            continue;
        }

        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Hidden names are in-flight staging output.
            if stem.starts_with('.') {
                continue;
            }
            if parser.report_path(&dir.join(stem)) == path {
                names.insert(stem.to_string());
            }
        }

        if !names.is_empty() {
            listing.push((folder, names.into_iter().collect()));
        }
    }

    Ok(listing)
}

fn list(root: &Path) -> CliResult<()> {
    let listing = cached_reports(root)?;

    if listing.is_empty() {
        output::print_info(&format!("no cached reports under {}", root.display()));
        return Ok(());
    }

    for (folder, names) in &listing {
        println!("{}", style(format!("{}/", folder)).cyan().bold());
        for name in names {
            println!("  {}", name);
        }
    }

    Ok(())
}
