//! JSON-based state storage.
//!
//! The whole state (targets and hosts keyed by address, ports nested under
//! their host) lives in one JSON file. Every mutation rewrites the file via a
//! temporary sibling and a rename, while holding the store mutex, so the file
//! on disk is always a complete snapshot.

use super::StateStore;
use crate::error::{StorageError, StorageResult};
use crate::types::{Host, Step, Target};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Serialized form of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    targets: BTreeMap<String, Target>,
    #[serde(default)]
    hosts: BTreeMap<String, Host>,
}

/// JSON file-backed state store.
pub struct JsonStateStore {
    /// `None` keeps state in memory only.
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
    available: AtomicBool,
}

impl JsonStateStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::LoadFailed {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let state = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| StorageError::LoadFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            if content.trim().is_empty() {
                StoreState::default()
            } else {
                serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
        } else {
            StoreState::default()
        };

        debug!(
            path = %path.display(),
            targets = state.targets.len(),
            hosts = state.hosts.len(),
            "state store opened"
        );

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
            available: AtomicBool::new(true),
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Toggle availability. An unavailable store rejects every operation.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, StoreState>> {
        if !self.is_available() {
            return Err(StorageError::Unavailable);
        }
        Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Write the snapshot. Called with the state lock held.
    fn persist(&self, state: &StoreState) -> StorageResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| StorageError::SaveFailed(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }
}

impl StateStore for JsonStateStore {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn get_all_targets(&self) -> StorageResult<Vec<Target>> {
        Ok(self.lock()?.targets.values().cloned().collect())
    }

    fn get_target(&self, address: &str) -> StorageResult<Option<Target>> {
        Ok(self.lock()?.targets.get(address).cloned())
    }

    fn add_target(&self, address: &str, step: Step) -> StorageResult<bool> {
        let mut state = self.lock()?;
        if state.targets.contains_key(address) {
            return Ok(false);
        }
        state
            .targets
            .insert(address.to_string(), Target::new(address, step));
        self.persist(&state)?;
        Ok(true)
    }

    fn save_target(&self, target: &Target) -> StorageResult<()> {
        let mut state = self.lock()?;
        state
            .targets
            .insert(target.address.clone(), target.clone());
        self.persist(&state)
    }

    fn update_target(
        &self,
        address: &str,
        apply: &mut dyn FnMut(&mut Target) -> bool,
    ) -> StorageResult<Option<Target>> {
        let mut state = self.lock()?;
        let Some(target) = state.targets.get_mut(address) else {
            return Ok(None);
        };
        let changed = apply(target);
        let updated = target.clone();
        if changed {
            self.persist(&state)?;
        }
        Ok(Some(updated))
    }

    fn get_all_hosts(&self) -> StorageResult<Vec<Host>> {
        Ok(self.lock()?.hosts.values().cloned().collect())
    }

    fn get_host(&self, address: &str) -> StorageResult<Option<Host>> {
        Ok(self.lock()?.hosts.get(address).cloned())
    }

    fn merge_hosts(&self, hosts: Vec<Host>) -> StorageResult<Vec<String>> {
        let mut state = self.lock()?;
        let mut created = Vec::new();
        let mut changed = false;

        for host in hosts {
            match state.hosts.get_mut(&host.address) {
                Some(existing) => changed |= existing.absorb(host),
                None => {
                    created.push(host.address.clone());
                    state.hosts.insert(host.address.clone(), host);
                    changed = true;
                }
            }
        }

        if changed {
            self.persist(&state)?;
        }
        Ok(created)
    }

    fn update_host(
        &self,
        address: &str,
        apply: &mut dyn FnMut(&mut Host) -> bool,
    ) -> StorageResult<Option<Host>> {
        let mut state = self.lock()?;
        let Some(host) = state.hosts.get_mut(address) else {
            return Ok(None);
        };
        let changed = apply(host);
        let updated = host.clone();
        if changed {
            self.persist(&state)?;
        }
        Ok(Some(updated))
    }
}
