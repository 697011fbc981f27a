//! Tracking of in-flight workers.
//!
//! Workers are started without blocking the dispatcher, but the process can
//! still wait for them: [`WorkerGroup::join`] is the barrier, and
//! [`WorkerGroup::shutdown`] cancels whatever is still running. Detached
//! workers are outside both and are best effort.

use super::worker::WorkerOutcome;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error};

/// A set of worker tasks that can be joined or cancelled together.
#[derive(Default)]
pub struct WorkerGroup {
    tasks: Mutex<JoinSet<WorkerOutcome>>,
}

impl WorkerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<WorkerOutcome>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a tracked worker. Must be called from within a Tokio runtime.
    pub fn spawn<F>(&self, worker: F)
    where
        F: Future<Output = WorkerOutcome> + Send + 'static,
    {
        self.tasks().spawn(worker);
    }

    /// Start a worker nobody waits for.
    pub fn spawn_detached<F>(&self, worker: F) -> JoinHandle<WorkerOutcome>
    where
        F: Future<Output = WorkerOutcome> + Send + 'static,
    {
        tokio::spawn(worker)
    }

    /// Number of tracked workers not yet joined.
    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every tracked worker, including ones spawned while waiting.
    ///
    /// Dropping the returned future before it completes aborts the workers it
    /// had taken over, which kills their scanner processes.
    pub async fn join(&self) -> Vec<WorkerOutcome> {
        let mut outcomes = Vec::new();

        loop {
            let mut batch = std::mem::take(&mut *self.tasks());
            if batch.is_empty() {
                break;
            }

            while let Some(joined) = batch.join_next().await {
                match joined {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) if e.is_cancelled() => debug!("worker cancelled"),
                    Err(e) => error!(error = %e, "worker panicked"),
                }
            }
        }

        outcomes
    }

    /// Abort every tracked worker that has not been joined yet.
    /// Returns how many were signalled.
    pub fn shutdown(&self) -> usize {
        let mut tasks = self.tasks();
        let count = tasks.len();
        tasks.abort_all();
        tasks.detach_all();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::category::ScanCategory;
    use crate::scanner::worker::WorkerStatus;
    use crate::types::ScanId;
    use std::time::Duration;

    fn outcome(address: &str) -> WorkerOutcome {
        WorkerOutcome {
            scan: ScanId::new(),
            name: format!("ping_{}", address),
            address: address.to_string(),
            category: ScanCategory::Ping,
            status: WorkerStatus::Completed {
                hosts_up: 0,
                step: None,
            },
        }
    }

    #[tokio::test]
    async fn test_join_waits_for_all() {
        let group = WorkerGroup::new();
        for i in 0..5u64 {
            group.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5 * (5 - i))).await;
                outcome(&format!("10.0.0.{}", i))
            });
        }
        assert_eq!(group.len(), 5);

        let outcomes = group.join().await;
        assert_eq!(outcomes.len(), 5);
        assert!(group.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending() {
        let group = WorkerGroup::new();
        group.spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            outcome("10.0.0.1")
        });

        assert_eq!(group.shutdown(), 1);
        assert!(group.join().await.is_empty());
    }

    #[tokio::test]
    async fn test_detached_is_not_joined() {
        let group = WorkerGroup::new();
        let handle = group.spawn_detached(async { outcome("10.0.0.2") });

        assert!(group.join().await.is_empty());
        assert_eq!(handle.await.unwrap().address, "10.0.0.2");
    }
}
