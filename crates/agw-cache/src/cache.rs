//! The snapshot cache.
//!
//! Snapshots are stored keyed by node hash. Publishing is an `Arc`
//! pointer swap inside a `DashMap` bucket, so concurrent fetches observe
//! either the old or the new snapshot atomically, never a partial graph.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use agw_core::NodeHash;

use crate::snapshot::Snapshot;
use crate::stats::CacheStats;

/// Trait for snapshot caches.
pub trait Cache: Send + Sync {
    /// Get the snapshot published for a node.
    fn get_snapshot(&self, node: NodeHash) -> Option<Arc<Snapshot>>;

    /// Publish a snapshot for a node, replacing any previous one.
    fn set_snapshot(&self, node: NodeHash, snapshot: Snapshot);

    /// Clear the snapshot for a node.
    fn clear_snapshot(&self, node: NodeHash);

    /// Number of nodes with a published snapshot.
    fn snapshot_count(&self) -> usize;
}

/// Concurrent snapshot cache backed by `DashMap`.
///
/// The publisher (the rollout manager) is the only writer; discovery
/// fetches are read-only and hold `Arc<Snapshot>` references, so replaced
/// snapshots are reclaimed once the last in-flight fetch drops its clone.
/// `DashMap` references are dropped before returning, so no lock is ever
/// held across an await point.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: DashMap<NodeHash, Arc<Snapshot>>,
    stats: CacheStats,
}

impl SnapshotCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Whether a snapshot exists for a node.
    pub fn has_snapshot(&self, node: NodeHash) -> bool {
        self.snapshots.contains_key(&node)
    }
}

impl Cache for SnapshotCache {
    fn get_snapshot(&self, node: NodeHash) -> Option<Arc<Snapshot>> {
        // Clone the Arc and drop the bucket guard immediately.
        self.snapshots.get(&node).map(|r| Arc::clone(&*r))
    }

    fn set_snapshot(&self, node: NodeHash, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        self.snapshots.insert(node, Arc::clone(&snapshot));
        self.stats.record_publish();

        debug!(
            node = %node,
            version = %snapshot.version(),
            resources = snapshot.total_resources(),
            "published snapshot"
        );
    }

    fn clear_snapshot(&self, node: NodeHash) {
        if self.snapshots.remove(&node).is_some() {
            self.stats.record_clear();
            debug!(node = %node, "cleared snapshot");
        }
    }

    fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}
