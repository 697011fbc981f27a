//! # recon - Scan Orchestration over a Persistent Target Inventory
//!
//! recon drives an external network scanner through a fixed reconnaissance
//! pipeline and records what it learns in a local state store.
//!
//! ## Pipeline
//!
//! Imported targets (addresses, hostnames, CIDR ranges) are swept for live
//! hosts; discovered hosts are port scanned and probed per device class; open
//! services are enumerated. Every record carries a [`types::Step`] that only
//! moves forward, which is what `TO_ANALYZE` selections key on.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use recon::scanner::{Dispatcher, GreppableParser, NmapInvoker, ScanContext, Selection};
//! use recon::storage::JsonStateStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(JsonStateStore::open("state.json").unwrap());
//!     let ctx = ScanContext::new(Arc::new(NmapInvoker::default()), Arc::new(GreppableParser), "scans")
//!         .with_store(store);
//!
//!     let dispatcher = Dispatcher::new(Arc::new(ctx));
//!     dispatcher.dispatch("PING", &Selection::ToAnalyze, None).unwrap();
//!     for outcome in dispatcher.join().await {
//!         println!("{} {:?}", outcome.name, outcome.status);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Targets, hosts, ports and the pipeline step
//! - [`scanner`] - Categories, dispatcher, workers and the tool seams
//! - [`storage`] - The state store trait and its JSON file implementation
//! - [`config`] - Settings and XDG paths
//! - [`error`] - Error types per layer
//! - [`output`] - Plain, JSON and CSV formatting
//! - [`cli`] - Subcommands

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, DispatchError, StorageError};
pub use scanner::{Dispatcher, ScanCategory, ScanContext, Selection, WorkerOutcome};
pub use types::{Host, Port, ScanId, Step, Target, TargetSpec};
