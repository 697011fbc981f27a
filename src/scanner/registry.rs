//! Process-wide record of started scan instances.
//!
//! Every worker appends one [`ScanDescriptor`] before it invokes the tool.
//! Entries are never removed or changed afterwards; viewers take a snapshot
//! with [`ScanRegistry::list`].

use super::category::ScanCategory;
use crate::types::ScanId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Ephemeral description of one scan invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanDescriptor {
    pub id: ScanId,
    pub name: String,
    pub target: String,
    pub category: ScanCategory,
    pub output_folder: PathBuf,
    pub output_file: String,
    pub args: String,
    pub registered_at: DateTime<Utc>,
}

impl ScanDescriptor {
    /// Path prefix the tool's output files share.
    pub fn output_path(&self) -> PathBuf {
        self.output_folder.join(&self.output_file)
    }
}

/// Append-only, shareable list of scan descriptors.
///
/// Cloning yields another handle onto the same list.
#[derive(Debug, Clone, Default)]
pub struct ScanRegistry {
    entries: Arc<Mutex<Vec<ScanDescriptor>>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor.
    pub fn register(&self, descriptor: ScanDescriptor) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(descriptor);
    }

    /// Snapshot of all descriptors in registration order.
    pub fn list(&self) -> Vec<ScanDescriptor> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn descriptor(target: &str) -> ScanDescriptor {
        ScanDescriptor {
            id: ScanId::new(),
            name: format!("ping_{}", target),
            target: target.to_string(),
            category: ScanCategory::Ping,
            output_folder: PathBuf::from("/tmp/scans/sweep"),
            output_file: format!("ping_{}", target),
            args: "-n -sn".to_string(),
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn test_register_preserves_order() {
        let registry = ScanRegistry::new();
        registry.register(descriptor("10.0.0.1"));
        registry.register(descriptor("10.0.0.2"));

        let targets: Vec<String> = registry.list().into_iter().map(|d| d.target).collect();
        assert_eq!(targets, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_output_path() {
        let d = descriptor("10.0.0.1");
        assert_eq!(d.output_path(), PathBuf::from("/tmp/scans/sweep/ping_10.0.0.1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let registry = ScanRegistry::new();
        let mut handles = Vec::new();

        for i in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                registry.register(descriptor(&format!("10.0.1.{}", i)));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let list = registry.list();
        assert_eq!(list.len(), 64);
        let unique: HashSet<_> = list.iter().map(|d| d.id).collect();
        assert_eq!(unique.len(), 64);
    }
}
