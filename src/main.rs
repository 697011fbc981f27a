//! recon - scan orchestration over a persistent target inventory.

use anyhow::{Context, Result};
use clap::Parser;
use recon::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "recon=debug"
    } else if cli.quiet {
        "warn"
    } else {
        "recon=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    cli.run().await.context("recon failed")?;
    Ok(())
}
