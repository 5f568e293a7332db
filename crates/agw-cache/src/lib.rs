//! # agw-cache
//!
//! Versioned config snapshots and the node-keyed snapshot cache:
//!
//! - [`Snapshot`] / [`SnapshotBuilder`] - immutable translated config
//! - [`SnapshotCache`] - concurrent cache with atomic publish
//! - `SnapshotCache::fetch` - the discovery fetch contract (request echo,
//!   version equal to the active config id)

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod fetch;
mod snapshot;
mod stats;

pub use cache::{Cache, SnapshotCache};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use stats::CacheStats;
