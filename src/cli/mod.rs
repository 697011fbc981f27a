//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `recon import <address>...` - Add targets to the state store
//! - `recon scan <category> [selection]` - Dispatch a scan category
//! - `recon targets` / `recon hosts` - Inspect stored state
//! - `recon categories` - List the category table
//! - `recon cache` - Browse cached tool output

mod cache;
mod import;
mod inventory;
mod scan;

pub use cache::CacheCommand;
pub use import::ImportCommand;
pub use inventory::{HostsCommand, TargetsCommand};
pub use scan::ScanCommand;

use crate::config::{AppSettings, Paths};
use crate::error::{CliResult, StorageError};
use crate::output;
use crate::scanner::{GreppableParser, NmapInvoker, ScanContext};
use crate::storage::{JsonStateStore, StateStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// recon - network reconnaissance orchestration.
///
/// recon drives an external scanner (nmap) through a fixed pipeline of scan
/// categories: sweeps discover live hosts in imported targets, port scans and
/// service probes map those hosts, and enumeration digs into known services.
/// Progress is kept in a local state store so each stage picks up where the
/// previous one left off.
#[derive(Parser, Debug)]
#[command(name = "recon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan orchestration over a persistent target inventory", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH", env = "RECON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory for scan output files
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run without the state store (nothing is persisted)
    #[arg(long, global = true)]
    pub no_store: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import targets (IP, hostname, or CIDR) at step IMPORTED
    #[command(alias = "i")]
    Import(ImportCommand),

    /// Dispatch a scan category over a selection of targets or hosts
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// List stored targets
    #[command(alias = "t")]
    Targets(TargetsCommand),

    /// List stored hosts and their ports
    #[command(alias = "h")]
    Hosts(HostsCommand),

    /// List scan categories and their arguments
    #[command(alias = "c")]
    Categories,

    /// Browse cached scanner output
    Cache(CacheCommand),
}

impl Cli {
    /// Run the selected subcommand.
    pub async fn run(&self) -> CliResult<()> {
        if let Commands::Categories = self.command {
            output::print_categories()?;
            return Ok(());
        }

        let env = Environment::load(self)?;
        match &self.command {
            Commands::Import(cmd) => cmd.execute(&env, self.quiet),
            Commands::Scan(cmd) => cmd.execute(&env, self.quiet).await,
            Commands::Targets(cmd) => cmd.execute(&env),
            Commands::Hosts(cmd) => cmd.execute(&env),
            Commands::Cache(cmd) => cmd.execute(&env),
            Commands::Categories => Ok(()),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Settings, paths and the (optional) store resolved from flags and files.
pub struct Environment {
    pub settings: AppSettings,
    pub output_dir: PathBuf,
    store: Option<Arc<JsonStateStore>>,
}

impl Environment {
    /// Resolve settings and open the store. A store that cannot be opened is
    /// not fatal; the engine then runs degraded.
    pub fn load(cli: &Cli) -> CliResult<Self> {
        let paths = Paths::resolve()?;
        let settings = match &cli.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load(&paths)?,
        };

        let output_dir = cli
            .output_dir
            .clone()
            .unwrap_or_else(|| settings.output_dir(&paths));

        let store = if cli.no_store || !settings.store_enabled {
            debug!("state store disabled");
            None
        } else {
            let file = settings.store_file(&paths);
            match JsonStateStore::open(&file) {
                Ok(store) => {
                    debug!(path = %file.display(), "state store opened");
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "state store unavailable");
                    output::print_warning(&format!(
                        "state store unavailable ({}); results will not be saved",
                        e
                    ));
                    None
                }
            }
        };

        Ok(Self {
            settings,
            output_dir,
            store,
        })
    }

    /// The store, or an error for commands that cannot work without one.
    pub fn require_store(&self) -> CliResult<&JsonStateStore> {
        self.store
            .as_deref()
            .ok_or_else(|| StorageError::Unavailable.into())
    }

    /// Build a scan context for the configured tool.
    pub fn context(&self) -> ScanContext {
        let ctx = ScanContext::new(
            Arc::new(NmapInvoker::new(self.settings.tool_path.as_str())),
            Arc::new(GreppableParser),
            self.output_dir.as_path(),
        );
        match &self.store {
            Some(store) => ctx.with_store(Arc::clone(store) as Arc<dyn StateStore>),
            None => ctx,
        }
    }
}
