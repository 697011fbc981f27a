//! Target selection and worker fan-out.
//!
//! The dispatcher decides which records a category applies to, builds one
//! [`ScanJob`] per eligible record (per matching port, for enumeration) and
//! starts a worker for each without waiting on any of them. The only error it
//! returns is an unknown category, raised before anything is started.

use super::category::{CategorySpec, Phase, ScanCategory, SubjectKind};
use super::context::ScanContext;
use super::group::WorkerGroup;
use super::worker::{ScanJob, Worker, WorkerOutcome};
use crate::error::{DispatchError, StorageResult};
use crate::storage::StateStore;
use crate::types::{PortEntry, Step, TargetError, TargetSpec};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Which records a dispatch applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every stored record, regardless of step.
    All,
    /// Only records that have not been through the category's phase yet.
    ToAnalyze,
    /// Exactly one address. Sweeps import it as a target on the fly; host
    /// phases scan it without a record until a report shows it up.
    Address(String),
}

impl FromStr for Selection {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("ALL") {
            return Ok(Self::All);
        }
        if s.eq_ignore_ascii_case("TO_ANALYZE") || s.eq_ignore_ascii_case("TO-ANALYZE") {
            return Ok(Self::ToAnalyze);
        }
        Ok(Self::Address(TargetSpec::parse(s)?.to_string()))
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::ToAnalyze => write!(f, "TO_ANALYZE"),
            Self::Address(address) => write!(f, "{}", address),
        }
    }
}

/// A record selected for scanning.
#[derive(Debug, Clone)]
struct Subject {
    address: String,
    /// Known ports; only populated for stored hosts.
    ports: Vec<PortEntry>,
}

impl Subject {
    fn bare(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ports: Vec::new(),
        }
    }
}

/// Selects eligible records and fans out workers.
pub struct Dispatcher {
    ctx: Arc<ScanContext>,
    workers: WorkerGroup,
    detach: bool,
}

impl Dispatcher {
    pub fn new(ctx: Arc<ScanContext>) -> Self {
        Self {
            ctx,
            workers: WorkerGroup::new(),
            detach: false,
        }
    }

    /// Start workers detached: they are never joined or cancelled.
    pub fn detached(mut self) -> Self {
        self.detach = true;
        self
    }

    pub fn context(&self) -> &Arc<ScanContext> {
        &self.ctx
    }

    pub fn workers(&self) -> &WorkerGroup {
        &self.workers
    }

    /// Dispatch by category name. `args` overrides the category's template.
    ///
    /// Returns the jobs that were started. Must be called from within a
    /// Tokio runtime.
    pub fn dispatch(
        &self,
        category: &str,
        selection: &Selection,
        args: Option<&str>,
    ) -> Result<Vec<ScanJob>, DispatchError> {
        let category: ScanCategory = category.parse()?;
        Ok(self.dispatch_category(category, selection, args))
    }

    /// Dispatch a known category.
    pub fn dispatch_category(
        &self,
        category: ScanCategory,
        selection: &Selection,
        args: Option<&str>,
    ) -> Vec<ScanJob> {
        let spec = category.spec();
        let template = args.unwrap_or(spec.args);

        let jobs: Vec<ScanJob> = self
            .select(spec, selection)
            .into_iter()
            .flat_map(|subject| self.jobs_for(spec, subject, template))
            .collect();

        info!(
            category = %category,
            selection = %selection,
            workers = jobs.len(),
            degraded = self.ctx.is_degraded(),
            "dispatching"
        );

        for job in &jobs {
            let worker = Worker::run(Arc::clone(&self.ctx), job.clone());
            if self.detach {
                self.workers.spawn_detached(worker);
            } else {
                self.workers.spawn(worker);
            }
        }

        jobs
    }

    /// Wait for every worker started by this dispatcher.
    pub async fn join(&self) -> Vec<WorkerOutcome> {
        self.workers.join().await
    }

    fn select(&self, spec: &CategorySpec, selection: &Selection) -> Vec<Subject> {
        if let Selection::Address(address) = selection {
            if spec.phase.subject_kind() == SubjectKind::Host && is_network(address) {
                warn!(
                    category = %spec.category,
                    address = %address,
                    "host scans take a single address; sweep the range first"
                );
                return Vec::new();
            }
        }

        let Some(store) = self.ctx.store() else {
            return select_offline(spec, selection);
        };

        match select_stored(store, spec, selection) {
            Ok(subjects) => subjects,
            Err(e) => {
                error!(category = %spec.category, error = %e, "store read failed, continuing without it");
                select_offline(spec, selection)
            }
        }
    }

    fn jobs_for(&self, spec: &CategorySpec, subject: Subject, template: &str) -> Vec<ScanJob> {
        let output_dir = self.ctx.output_dir();

        if spec.phase != Phase::Enumeration {
            return vec![ScanJob::new(
                spec.category,
                &subject.address,
                template,
                None,
                output_dir,
            )];
        }

        subject
            .ports
            .iter()
            .filter(|port| spec.matches_port(port))
            .map(|port| {
                info!(
                    category = %spec.category,
                    address = %subject.address,
                    port = %port.number,
                    service = %port.service.name,
                    "port eligible for enumeration"
                );
                ScanJob::new(
                    spec.category,
                    &subject.address,
                    template,
                    Some(port.number),
                    output_dir,
                )
            })
            .collect()
    }
}

/// Whether a literal selection names a range rather than one address.
fn is_network(address: &str) -> bool {
    matches!(TargetSpec::parse(address), Ok(TargetSpec::Cidr(_)))
}

/// Selection when nothing can be read from or written to the store.
fn select_offline(spec: &CategorySpec, selection: &Selection) -> Vec<Subject> {
    if spec.phase == Phase::Enumeration {
        warn!(category = %spec.category, "enumeration skipped (store unavailable)");
        return Vec::new();
    }

    match selection {
        Selection::Address(address) => vec![Subject::bare(address.as_str())],
        Selection::All | Selection::ToAnalyze => {
            warn!(
                category = %spec.category,
                selection = %selection,
                "selection needs the store; pass an address to scan without it"
            );
            Vec::new()
        }
    }
}

fn select_stored(
    store: &dyn StateStore,
    spec: &CategorySpec,
    selection: &Selection,
) -> StorageResult<Vec<Subject>> {
    let phase = spec.phase;

    match phase.subject_kind() {
        SubjectKind::Target => {
            let targets = match selection {
                Selection::All => store.get_all_targets()?,
                Selection::ToAnalyze => store.find_targets(&|t| phase.is_pending(t.step))?,
                Selection::Address(address) => {
                    if store.add_target(address, Step::Imported)? {
                        info!(address = %address, "target imported");
                    }
                    store.get_target(address)?.into_iter().collect()
                }
            };
            Ok(targets.into_iter().map(|t| Subject::bare(t.address)).collect())
        }
        SubjectKind::Host => {
            let hosts = match selection {
                Selection::All => store.get_all_hosts()?,
                Selection::ToAnalyze => store.find_hosts(&|h| phase.is_pending(h.step))?,
                Selection::Address(address) => {
                    match store.get_host(address)? {
                        Some(host) => vec![host],
                        // Unknown hosts are scanned without a record; the
                        // worker creates one only if the report says it is up.
                        None => return Ok(vec![Subject::bare(address.as_str())]),
                    }
                }
            };
            Ok(hosts
                .into_iter()
                .map(|h| Subject {
                    address: h.address,
                    ports: h.ports,
                })
                .collect())
        }
    }
}
