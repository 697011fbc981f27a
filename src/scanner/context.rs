//! Shared handles for the dispatcher and its workers.

use super::registry::ScanRegistry;
use super::traits::{ReportParser, ToolInvoker};
use crate::storage::StateStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a worker needs, passed explicitly instead of living in globals.
///
/// A context without a store, or whose store reports itself unavailable, is
/// in degraded mode: scans still run, but nothing is persisted.
pub struct ScanContext {
    store: Option<Arc<dyn StateStore>>,
    invoker: Arc<dyn ToolInvoker>,
    parser: Arc<dyn ReportParser>,
    registry: ScanRegistry,
    output_dir: PathBuf,
}

impl ScanContext {
    /// Create a context with no store.
    pub fn new(
        invoker: Arc<dyn ToolInvoker>,
        parser: Arc<dyn ReportParser>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store: None,
            invoker,
            parser,
            registry: ScanRegistry::new(),
            output_dir: output_dir.into(),
        }
    }

    /// Attach a state store.
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The store, if one is attached and currently available.
    pub fn store(&self) -> Option<&dyn StateStore> {
        self.store.as_deref().filter(|store| store.is_available())
    }

    /// True when results cannot be persisted.
    pub fn is_degraded(&self) -> bool {
        self.store().is_none()
    }

    pub fn invoker(&self) -> &dyn ToolInvoker {
        self.invoker.as_ref()
    }

    pub fn parser(&self) -> &dyn ReportParser {
        self.parser.as_ref()
    }

    pub fn registry(&self) -> &ScanRegistry {
        &self.registry
    }

    /// Root of the per-category output folders.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
