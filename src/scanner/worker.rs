//! The unit of concurrent execution.
//!
//! A worker runs one scan end to end, strictly in order:
//! register → invoke → parse → merge hosts → advance the subject's step.
//! Failures are logged where they happen and end the worker quietly; nothing
//! propagates to the dispatcher or to other workers.

use super::category::{ScanCategory, SubjectKind};
use super::context::ScanContext;
use super::registry::ScanDescriptor;
use super::report::Report;
use super::traits::Invocation;
use crate::types::{file_stem, Host, HostStatus, Port, ScanId, Step};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Everything needed to run one scan instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    pub name: String,
    pub address: String,
    pub kind: SubjectKind,
    pub category: ScanCategory,
    /// Rendered tool arguments.
    pub args: String,
    pub output_folder: PathBuf,
    pub output_file: String,
}

impl ScanJob {
    /// Build a job for `address`, deriving name and output file from the
    /// category and the address (and the port, for enumeration).
    pub fn new(
        category: ScanCategory,
        address: &str,
        template: &str,
        port: Option<Port>,
        output_dir: &Path,
    ) -> Self {
        let spec = category.spec();
        let mut name = format!("{}_{}", spec.name.to_lowercase(), file_stem(address));
        if let Some(port) = port {
            name.push_str(&format!("_{}", port));
        }

        Self {
            output_file: name.clone(),
            name,
            address: address.to_string(),
            kind: spec.phase.subject_kind(),
            category,
            args: spec.render_args(template, port),
            output_folder: output_dir.join(spec.folder),
        }
    }

    /// The tool invocation for this job.
    pub fn invocation(&self) -> Invocation {
        Invocation {
            args: self.args.clone(),
            target: self.address.clone(),
            output_folder: self.output_folder.clone(),
            output_file: self.output_file.clone(),
        }
    }

    fn descriptor(&self) -> ScanDescriptor {
        ScanDescriptor {
            id: ScanId::new(),
            name: self.name.clone(),
            target: self.address.clone(),
            category: self.category,
            output_folder: self.output_folder.clone(),
            output_file: self.output_file.clone(),
            args: self.args.clone(),
            registered_at: Utc::now(),
        }
    }
}

/// How a worker ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerStatus {
    Completed {
        /// Live hosts found in the report.
        hosts_up: usize,
        /// Subject step after the run; `None` when nothing was persisted.
        step: Option<Step>,
    },
    Failed { reason: String },
}

/// Result handed back through the worker group.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerOutcome {
    pub scan: ScanId,
    pub name: String,
    pub address: String,
    pub category: ScanCategory,
    #[serde(flatten)]
    pub status: WorkerStatus,
}

impl WorkerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, WorkerStatus::Completed { .. })
    }
}

/// Runs scan jobs against a shared context.
pub struct Worker;

impl Worker {
    /// Run `job` to completion.
    pub async fn run(ctx: Arc<ScanContext>, job: ScanJob) -> WorkerOutcome {
        let descriptor = job.descriptor();
        let scan = descriptor.id;
        ctx.registry().register(descriptor);

        let span = info_span!(
            "worker",
            scan = %scan.short(),
            category = %job.category,
            address = %job.address
        );

        let status = Self::execute(&ctx, &job).instrument(span).await;

        WorkerOutcome {
            scan,
            name: job.name,
            address: job.address,
            category: job.category,
            status,
        }
    }

    async fn execute(ctx: &ScanContext, job: &ScanJob) -> WorkerStatus {
        info!(args = %job.args, "scan started");

        let invocation = job.invocation();
        if let Err(e) = ctx.invoker().invoke(&invocation).await {
            error!(tool = ctx.invoker().tool(), error = %e, "scan failed");
            return WorkerStatus::Failed {
                reason: e.to_string(),
            };
        }

        let report_path = ctx.parser().report_path(&invocation.output_base());
        let report = ctx.parser().parse(&report_path).unwrap_or_else(|| {
            debug!(path = %report_path.display(), "no structured output, assuming no hosts");
            Report::default()
        });

        let hosts_up = merge_report(ctx, job, &report);
        let step = advance_subject(ctx, job);

        info!(hosts_up, step = ?step, "scan complete");
        WorkerStatus::Completed { hosts_up, step }
    }
}

/// Fold live hosts (and, for port-recording phases, their ports) into the
/// store with a single write.
fn merge_report(ctx: &ScanContext, job: &ScanJob, report: &Report) -> usize {
    let records_ports = job.category.spec().phase.records_ports();

    let hosts: Vec<Host> = report
        .live_hosts()
        .filter_map(|reported| {
            let mut host = Host::new(reported.address()?, HostStatus::Up, Step::New);
            if records_ports {
                for port in &reported.ports {
                    host.upsert_port(port.clone());
                }
            }
            Some(host)
        })
        .collect();
    let hosts_up = hosts.len();

    let Some(store) = ctx.store() else {
        for host in &hosts {
            info!(host = %host.address, "host discovered (not persisted, store unavailable)");
        }
        return hosts_up;
    };

    if hosts.is_empty() {
        return 0;
    }

    match store.merge_hosts(hosts) {
        Ok(created) => {
            for address in &created {
                info!(host = %address, "new host discovered");
            }
            debug!(known = hosts_up - created.len(), "hosts merged");
        }
        Err(e) => error!(hosts = hosts_up, error = %e, "failed to record hosts"),
    }

    hosts_up
}

/// Advance the originating target or host to the phase's completion step.
fn advance_subject(ctx: &ScanContext, job: &ScanJob) -> Option<Step> {
    let store = ctx.store()?;
    let phase = job.category.spec().phase;
    let next = phase.completion_step();

    let result = match job.kind {
        SubjectKind::Target => store
            .update_target(&job.address, &mut |target| target.advance_to(next))
            .map(|t| t.map(|t| t.step)),
        SubjectKind::Host => store
            .update_host(&job.address, &mut |host| {
                if !phase.can_advance(host.step) {
                    debug!(step = %host.step, "port scan pending, step kept");
                    return false;
                }
                host.advance_to(next)
            })
            .map(|h| h.map(|h| h.step)),
    };

    match result {
        Ok(Some(step)) => Some(step),
        Ok(None) => {
            warn!("subject no longer in store, step not recorded");
            None
        }
        Err(e) => {
            error!(error = %e, "failed to advance step");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::testing::{context, context_with_store, seed_host, FakeInvoker};
    use crate::storage::{JsonStateStore, StateStore};
    use crate::types::{PortState, Target};
    use tempfile::TempDir;

    const TWO_UP_ONE_DOWN: &str = "\
# Nmap 7.94 scan initiated
Host: 192.168.1.1 ()\tStatus: Up
Host: 192.168.1.3 ()\tStatus: Up
Host: 192.168.1.200 ()\tStatus: Down
";

    fn ping_job(dir: &TempDir, address: &str) -> ScanJob {
        let spec = ScanCategory::Ping.spec();
        ScanJob::new(ScanCategory::Ping, address, spec.args, None, dir.path())
    }

    #[test]
    fn test_job_naming() {
        let dir = TempDir::new().unwrap();
        let job = ping_job(&dir, "192.168.1.0/24");
        assert_eq!(job.name, "ping_192.168.1.0_24");
        assert_eq!(job.output_file, job.name);
        assert_eq!(job.output_folder, dir.path().join("sweep"));
        assert_eq!(job.kind, SubjectKind::Target);

        let spec = ScanCategory::Dns.spec();
        let job = ScanJob::new(ScanCategory::Dns, "10.0.0.2", spec.args, Port::new(53), dir.path());
        assert_eq!(job.name, "dns_10.0.0.2_53");
        assert_eq!(job.args, "-sV -Pn -sU -p53,53");
        assert_eq!(job.kind, SubjectKind::Host);
    }

    #[tokio::test]
    async fn test_worker_ingests_only_live_hosts() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        store.add_target("192.168.1.1", Step::Imported).unwrap();
        let ctx = context_with_store(&dir, FakeInvoker::writing(TWO_UP_ONE_DOWN), store.clone());

        let outcome = Worker::run(ctx.clone(), ping_job(&dir, "192.168.1.1")).await;

        assert_eq!(
            outcome.status,
            WorkerStatus::Completed {
                hosts_up: 2,
                step: Some(Step::Sweeped)
            }
        );
        let hosts: Vec<String> = store
            .get_all_hosts()
            .unwrap()
            .into_iter()
            .map(|h| h.address)
            .collect();
        assert_eq!(hosts, vec!["192.168.1.1", "192.168.1.3"]);
        assert_eq!(ctx.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_run_does_not_duplicate_hosts() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        store.add_target("192.168.1.1", Step::Imported).unwrap();
        let ctx = context_with_store(&dir, FakeInvoker::writing(TWO_UP_ONE_DOWN), store.clone());

        Worker::run(ctx.clone(), ping_job(&dir, "192.168.1.1")).await;
        Worker::run(ctx.clone(), ping_job(&dir, "192.168.1.1")).await;

        let hosts = store.get_all_hosts().unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(hosts.iter().all(|h| h.step == Step::New));
        assert_eq!(
            store.get_target("192.168.1.1").unwrap(),
            Some(Target::new("192.168.1.1", Step::Sweeped))
        );
        assert_eq!(ctx.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_invocation_failure_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        store.add_target("192.168.1.1", Step::Imported).unwrap();
        let ctx = context_with_store(&dir, FakeInvoker::failing(), store.clone());

        let outcome = Worker::run(ctx.clone(), ping_job(&dir, "192.168.1.1")).await;

        assert!(!outcome.is_success());
        assert!(store.get_all_hosts().unwrap().is_empty());
        assert_eq!(
            store.get_target("192.168.1.1").unwrap().unwrap().step,
            Step::Imported
        );
        // Registration happens before the tool runs.
        assert_eq!(ctx.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_report_counts_as_no_hosts() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        store.add_target("10.0.0.9", Step::Imported).unwrap();
        let ctx = context_with_store(&dir, FakeInvoker::silent(), store.clone());

        let outcome = Worker::run(ctx, ping_job(&dir, "10.0.0.9")).await;

        assert_eq!(
            outcome.status,
            WorkerStatus::Completed {
                hosts_up: 0,
                step: Some(Step::Sweeped)
            }
        );
        assert!(store.get_all_hosts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_port_scan_records_ports_and_advances_host() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        seed_host(&store, "10.0.0.5", Step::New, Vec::new());
        let report = "Host: 10.0.0.5 ()\tStatus: Up\n\
                      Host: 10.0.0.5 ()\tPorts: 22/open/tcp//ssh//OpenSSH/, 53/open/udp//domain///\n";
        let ctx = context_with_store(&dir, FakeInvoker::writing(report), store.clone());

        let spec = ScanCategory::TcpFull.spec();
        let job = ScanJob::new(ScanCategory::TcpFull, "10.0.0.5", spec.args, None, dir.path());
        Worker::run(ctx, job).await;

        let host = store.get_host("10.0.0.5").unwrap().unwrap();
        assert_eq!(host.step, Step::Scanned);
        assert_eq!(host.ports.len(), 2);
        assert_eq!(host.ports[1].protocol, "udp");
        assert_eq!(host.ports[1].state, PortState::Open);
    }

    #[tokio::test]
    async fn test_step_never_regresses() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        seed_host(&store, "10.0.0.5", Step::Analyzed, Vec::new());
        let ctx = context_with_store(&dir, FakeInvoker::silent(), store.clone());

        let spec = ScanCategory::TcpFull.spec();
        let job = ScanJob::new(ScanCategory::TcpFull, "10.0.0.5", spec.args, None, dir.path());
        let outcome = Worker::run(ctx, job).await;

        assert_eq!(
            outcome.status,
            WorkerStatus::Completed {
                hosts_up: 0,
                step: Some(Step::Analyzed)
            }
        );
    }

    #[tokio::test]
    async fn test_degraded_worker_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, FakeInvoker::writing(TWO_UP_ONE_DOWN));

        let outcome = Worker::run(ctx.clone(), ping_job(&dir, "10.0.0.5")).await;

        assert_eq!(
            outcome.status,
            WorkerStatus::Completed {
                hosts_up: 2,
                step: None
            }
        );
        assert_eq!(ctx.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_store_lost_mid_run_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        store.add_target("192.168.1.1", Step::Imported).unwrap();
        let invoker = FakeInvoker::writing(TWO_UP_ONE_DOWN).with_delay(50);
        let ctx = context_with_store(&dir, invoker, store.clone());

        let running = tokio::spawn(Worker::run(ctx.clone(), ping_job(&dir, "192.168.1.1")));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        store.set_available(false);
        let outcome = running.await.unwrap();

        assert_eq!(
            outcome.status,
            WorkerStatus::Completed {
                hosts_up: 2,
                step: None
            }
        );
        store.set_available(true);
        assert!(store.get_all_hosts().unwrap().is_empty());
        assert_eq!(
            store.get_target("192.168.1.1").unwrap(),
            Some(Target::imported("192.168.1.1"))
        );
        assert_eq!(ctx.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_service_probe_keeps_step_before_port_scan() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStateStore::in_memory());
        seed_host(&store, "10.0.0.5", Step::New, Vec::new());
        let report = "Host: 10.0.0.5 ()\tStatus: Up\n\
                      Host: 10.0.0.5 ()\tPorts: 80/open/tcp//http//nginx/\n";
        let ctx = context_with_store(&dir, FakeInvoker::writing(report), store.clone());

        let spec = ScanCategory::Web.spec();
        let job = ScanJob::new(ScanCategory::Web, "10.0.0.5", spec.args, None, dir.path());
        let outcome = Worker::run(ctx, job).await;

        assert_eq!(
            outcome.status,
            WorkerStatus::Completed {
                hosts_up: 1,
                step: Some(Step::New)
            }
        );
        let host = store.get_host("10.0.0.5").unwrap().unwrap();
        assert_eq!(host.step, Step::New);
        assert_eq!(host.ports.len(), 1);
    }
}
