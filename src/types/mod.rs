//! Core record and identifier types.
//!
//! Steps are a closed, ordered enum; ports and scan ids are newtypes so that
//! invalid values never reach the store or the scanning tool.

mod host;
mod port;
mod scan_id;
mod step;
mod target;

pub use host::{Host, HostStatus};
pub use port::{Port, PortEntry, PortError, PortState, Service};
pub use scan_id::ScanId;
pub use step::Step;
pub use target::{file_stem, Target, TargetError, TargetSpec};
