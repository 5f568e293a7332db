//! Discovery fetch request and response shapes.
//!
//! The contract is deliberately small: a request names a node and a type
//! URL; the response carries the snapshot version, the resources of that
//! type, and a field-equal echo of the request.

use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::listener::Listener;

/// The requesting data-plane node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Opaque node id.
    pub id: String,
}

impl Node {
    /// Create a node from an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A discovery fetch request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    /// Requesting node.
    pub node: Node,
    /// Requested resource type URL.
    #[serde(default)]
    pub type_url: String,
}

/// A discovery fetch response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    /// Version of the published snapshot, equal to the active config id.
    pub version_info: String,
    /// Resources of the requested type. Order is unspecified; callers may
    /// sort by [`ResourceEntry::name`].
    pub resources: Vec<ResourceEntry>,
    /// Field-equal echo of the request this response answers.
    pub request: DiscoveryRequest,
}

/// A single resource in a discovery response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceEntry {
    /// A listener resource.
    Listener(Listener),
    /// A cluster resource.
    Cluster(Cluster),
}

impl ResourceEntry {
    /// The resource name, used for stable sorting.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Listener(l) => &l.name,
            Self::Cluster(c) => &c.name,
        }
    }
}

impl DiscoveryResponse {
    /// Sort resources by name, for callers comparing against fixtures.
    pub fn sort_resources(&mut self) {
        self.resources
            .sort_by(|a, b| a.name().cmp(b.name()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips() {
        let req = DiscoveryRequest {
            node: Node::new("api_proxy"),
            type_url: agw_core::LISTENER_TYPE_URL.to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed: DiscoveryRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn type_url_defaults_to_empty() {
        let parsed: DiscoveryRequest =
            serde_json::from_str(r#"{"node": {"id": "n"}}"#).unwrap();
        assert!(parsed.type_url.is_empty());
    }
}
