//! Persisted target/host/port state.
//!
//! The engine talks to storage only through [`StateStore`], so the JSON file
//! backend can be swapped or taken offline without touching dispatch logic.

mod json_store;

pub use json_store::JsonStateStore;

use crate::error::StorageResult;
use crate::types::{Host, HostStatus, Step, Target};

/// CRUD over targets and hosts plus the exclusive read-modify-write primitive.
///
/// Implementations serialize all writes. `update_*` run the closure and the
/// save under the same exclusive guard, so two workers advancing the same
/// record cannot lose each other's update.
pub trait StateStore: Send + Sync {
    /// Availability probe. When `false` every other method may fail with
    /// [`StorageError::Unavailable`](crate::error::StorageError::Unavailable).
    fn is_available(&self) -> bool;

    /// All targets, ordered by address.
    fn get_all_targets(&self) -> StorageResult<Vec<Target>>;

    /// Look up one target.
    fn get_target(&self, address: &str) -> StorageResult<Option<Target>>;

    /// Insert a target unless one already exists. Returns `true` if inserted.
    fn add_target(&self, address: &str, step: Step) -> StorageResult<bool>;

    /// Insert or overwrite a target record.
    fn save_target(&self, target: &Target) -> StorageResult<()>;

    /// Apply `apply` to the stored target and persist if it returns `true`.
    /// Returns the record after the update, or `None` if no such target exists.
    fn update_target(
        &self,
        address: &str,
        apply: &mut dyn FnMut(&mut Target) -> bool,
    ) -> StorageResult<Option<Target>>;

    /// All hosts, ordered by address.
    fn get_all_hosts(&self) -> StorageResult<Vec<Host>>;

    /// Look up one host.
    fn get_host(&self, address: &str) -> StorageResult<Option<Host>>;

    /// Idempotent single-host upsert. An existing host keeps its ports and
    /// never has its step moved backwards. Returns `true` if a new record was
    /// created.
    fn add_host(&self, address: &str, status: HostStatus, step: Step) -> StorageResult<bool> {
        let created = self.merge_hosts(vec![Host::new(address, status, step)])?;
        Ok(!created.is_empty())
    }

    /// Upsert every host of one report under a single write. Existing hosts
    /// absorb the reported status and ports without losing their step.
    /// Returns the addresses that were newly created.
    fn merge_hosts(&self, hosts: Vec<Host>) -> StorageResult<Vec<String>>;

    /// Apply `apply` to the stored host and persist if it returns `true`.
    fn update_host(
        &self,
        address: &str,
        apply: &mut dyn FnMut(&mut Host) -> bool,
    ) -> StorageResult<Option<Host>>;

    /// Targets matching a predicate.
    fn find_targets(&self, filter: &dyn Fn(&Target) -> bool) -> StorageResult<Vec<Target>> {
        Ok(self
            .get_all_targets()?
            .into_iter()
            .filter(|t| filter(t))
            .collect())
    }

    /// Hosts matching a predicate.
    fn find_hosts(&self, filter: &dyn Fn(&Host) -> bool) -> StorageResult<Vec<Host>> {
        Ok(self
            .get_all_hosts()?
            .into_iter()
            .filter(|h| filter(h))
            .collect())
    }
}
