//! Configuration management for recon.
//!
//! Provides XDG-compliant settings storage: where the scanning tool lives,
//! where scan output is cached and where target/host state is persisted.

mod settings;

pub use settings::{AppSettings, Paths};
