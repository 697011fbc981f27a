//! Scanner module - dispatches scan categories over stored targets and hosts.
//!
//! A [`Dispatcher`] selects eligible records for a [`ScanCategory`] and starts
//! one [`Worker`] per record. Each worker drives the external tool through a
//! [`ToolInvoker`], reads its output with a [`ReportParser`] and folds the
//! results back into the state store held by the [`ScanContext`].

pub mod category;
pub mod context;
pub mod dispatcher;
pub mod group;
pub mod nmap;
pub mod registry;
pub mod report;
pub mod traits;
pub mod worker;

pub use category::{CategorySpec, Phase, ScanCategory, SubjectKind, CATEGORIES};
pub use context::ScanContext;
pub use dispatcher::{Dispatcher, Selection};
pub use group::WorkerGroup;
pub use nmap::NmapInvoker;
pub use registry::{ScanDescriptor, ScanRegistry};
pub use report::{GreppableParser, Report, ReportHost};
pub use traits::{Invocation, ReportParser, ToolInvoker};
pub use worker::{ScanJob, Worker, WorkerOutcome, WorkerStatus};

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted stand-ins for the external tool.

    use super::*;
    use crate::error::{InvokeError, InvokeResult};
    use crate::storage::{JsonStateStore, StateStore};
    use crate::types::{Host, HostStatus, PortEntry, Step};
    use async_trait::async_trait;
    use rand::Rng;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{NamedTempFile, TempDir};

    /// Writes a canned greppable report instead of running a scanner.
    /// `{target}` in the report is replaced with the invocation's target.
    pub struct FakeInvoker {
        report: Option<String>,
        fail: bool,
        min_delay_ms: u64,
        max_delay_ms: u64,
    }

    impl FakeInvoker {
        pub fn writing(report: &str) -> Self {
            Self {
                report: Some(report.to_string()),
                fail: false,
                min_delay_ms: 0,
                max_delay_ms: 0,
            }
        }

        pub fn failing() -> Self {
            Self {
                report: None,
                fail: true,
                min_delay_ms: 0,
                max_delay_ms: 0,
            }
        }

        /// Succeeds without producing any output.
        pub fn silent() -> Self {
            Self {
                report: None,
                fail: false,
                min_delay_ms: 0,
                max_delay_ms: 0,
            }
        }

        /// Sleep a random 0..=`max_ms` before each run.
        pub fn with_max_delay(mut self, max_ms: u64) -> Self {
            self.min_delay_ms = 0;
            self.max_delay_ms = max_ms;
            self
        }

        /// Sleep exactly `ms` before each run.
        pub fn with_delay(mut self, ms: u64) -> Self {
            self.min_delay_ms = ms;
            self.max_delay_ms = ms;
            self
        }
    }

    #[async_trait]
    impl ToolInvoker for FakeInvoker {
        fn tool(&self) -> &str {
            "fake-nmap"
        }

        async fn invoke(&self, invocation: &Invocation) -> InvokeResult<()> {
            if self.max_delay_ms > 0 {
                let delay = rand::thread_rng().gen_range(self.min_delay_ms..=self.max_delay_ms);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            if self.fail {
                return Err(InvokeError::Failed {
                    tool: self.tool().to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "scripted failure".to_string(),
                });
            }

            if let Some(report) = &self.report {
                std::fs::create_dir_all(&invocation.output_folder).map_err(|source| {
                    InvokeError::OutputFolder {
                        path: invocation.output_folder.clone(),
                        source,
                    }
                })?;
                let path = GreppableParser.report_path(&invocation.output_base());
                let body = report.replace("{target}", &invocation.target);
                // Concurrent runs for one address share a file; replace it whole.
                let written = NamedTempFile::new_in(&invocation.output_folder)
                    .and_then(|mut file| file.write_all(body.as_bytes()).map(|_| file))
                    .and_then(|file| file.persist(&path).map_err(|e| e.error));
                written.map_err(|source| InvokeError::Spawn {
                    tool: self.tool().to_string(),
                    source,
                })?;
            }

            Ok(())
        }
    }

    /// Context without a store (degraded mode) writing under `dir`.
    pub fn context(dir: &TempDir, invoker: FakeInvoker) -> Arc<ScanContext> {
        Arc::new(ScanContext::new(
            Arc::new(invoker),
            Arc::new(GreppableParser),
            dir.path(),
        ))
    }

    /// Store a live host at `step` with `ports`.
    pub fn seed_host(store: &JsonStateStore, address: &str, step: Step, ports: Vec<PortEntry>) {
        let mut host = Host::new(address, HostStatus::Up, step);
        for port in ports {
            host.upsert_port(port);
        }
        store.merge_hosts(vec![host]).unwrap();
    }

    pub fn context_with_store(
        dir: &TempDir,
        invoker: FakeInvoker,
        store: Arc<JsonStateStore>,
    ) -> Arc<ScanContext> {
        Arc::new(
            ScanContext::new(Arc::new(invoker), Arc::new(GreppableParser), dir.path())
                .with_store(store),
        )
    }
}
