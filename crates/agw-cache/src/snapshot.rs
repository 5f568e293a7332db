//! Snapshot: immutable translated configuration for one config id.
//!
//! A snapshot is a consistent view of the listener/cluster/route graph at
//! a specific version (the active config id). Snapshots are:
//!
//! - **Immutable**: once built, a snapshot is never modified
//! - **Versioned**: the version string equals the config id it was
//!   translated from
//! - **Self-contained**: the route table is embedded in the listener and
//!   also carried standalone

use serde::{Deserialize, Serialize};

use agw_core::ResourceType;
use agw_types::{Cluster, Listener, ResourceEntry, RouteConfiguration};

/// An immutable, versioned configuration snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    version: String,
    listeners: Vec<Listener>,
    clusters: Vec<Cluster>,
    routes: Vec<RouteConfiguration>,
}

impl Snapshot {
    /// Create a new snapshot builder.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Version of this snapshot (the active config id).
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The listener set.
    #[inline]
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// The cluster set.
    #[inline]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The standalone route configurations.
    #[inline]
    pub fn routes(&self) -> &[RouteConfiguration] {
        &self.routes
    }

    /// Resources of a served type, as discovery response entries.
    pub fn resources_of(&self, kind: ResourceType) -> Vec<ResourceEntry> {
        match kind {
            ResourceType::Listener => self
                .listeners
                .iter()
                .cloned()
                .map(ResourceEntry::Listener)
                .collect(),
            ResourceType::Cluster => self
                .clusters
                .iter()
                .cloned()
                .map(ResourceEntry::Cluster)
                .collect(),
        }
    }

    /// Total number of resources across all types.
    pub fn total_resources(&self) -> usize {
        self.listeners.len() + self.clusters.len() + self.routes.len()
    }

    /// Whether the snapshot carries no resources at all.
    pub fn is_empty(&self) -> bool {
        self.total_resources() == 0
    }
}

/// Builder for [`Snapshot`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version: String,
    listeners: Vec<Listener>,
    clusters: Vec<Cluster>,
    routes: Vec<RouteConfiguration>,
}

impl SnapshotBuilder {
    /// Set the snapshot version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a listener.
    pub fn listener(mut self, listener: Listener) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Set the cluster list.
    pub fn clusters(mut self, clusters: impl IntoIterator<Item = Cluster>) -> Self {
        self.clusters.extend(clusters);
        self
    }

    /// Add a standalone route configuration.
    pub fn route(mut self, route: RouteConfiguration) -> Self {
        self.routes.push(route);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        Snapshot {
            version: self.version,
            listeners: self.listeners,
            clusters: self.clusters,
            routes: self.routes,
        }
    }
}
