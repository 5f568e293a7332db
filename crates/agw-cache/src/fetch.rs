//! The discovery fetch contract.
//!
//! A fetch names a node and a type URL; the answer is the current
//! snapshot's resources of that type, its version, and a field-equal echo
//! of the request.

use agw_core::{ConfigError, ConfigResult, NodeHash, ResourceType};
use agw_types::{DiscoveryRequest, DiscoveryResponse};

use crate::cache::{Cache, SnapshotCache};

impl SnapshotCache {
    /// Answer a discovery fetch from the currently published snapshot.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidTypeUrl`] when the type URL is not a served
    ///   resource kind
    /// - [`ConfigError::SnapshotNotFound`] when no snapshot has been
    ///   published for the node
    pub fn fetch(&self, request: &DiscoveryRequest) -> ConfigResult<DiscoveryResponse> {
        let kind = ResourceType::from_type_url(&request.type_url)?;

        let node = NodeHash::from_id(&request.node.id);
        let Some(snapshot) = self.get_snapshot(node) else {
            self.stats().record_fetch_miss();
            return Err(ConfigError::SnapshotNotFound(request.node.id.clone()));
        };
        self.stats().record_fetch_hit();

        Ok(DiscoveryResponse {
            version_info: snapshot.version().to_string(),
            resources: snapshot.resources_of(kind),
            request: request.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use agw_core::{CLUSTER_TYPE_URL, LISTENER_TYPE_URL};
    use agw_types::{Address, Cluster, DiscoveryType, Node};

    use crate::snapshot::Snapshot;

    fn request(type_url: &str) -> DiscoveryRequest {
        DiscoveryRequest {
            node: Node::new("api_proxy"),
            type_url: type_url.to_string(),
        }
    }

    fn publish(cache: &SnapshotCache, version: &str) {
        let cluster = Cluster {
            connect_timeout: Duration::from_secs(20),
            dns_lookup_family: None,
            hosts: vec![Address::socket("127.0.0.1", 8082)],
            http2_protocol_options: None,
            name: "backend".into(),
            tls_context: None,
            discovery_type: DiscoveryType::StrictDns,
        };
        cache.set_snapshot(
            NodeHash::from_id("api_proxy"),
            Snapshot::builder()
                .version(version)
                .clusters(vec![cluster])
                .build(),
        );
    }

    #[test]
    fn response_echoes_request_and_version() {
        let cache = SnapshotCache::new();
        publish(&cache, "2017-05-01r0");

        let req = request(CLUSTER_TYPE_URL);
        let resp = cache.fetch(&req).unwrap();

        assert_eq!(resp.version_info, "2017-05-01r0");
        assert_eq!(resp.request, req);
        assert_eq!(resp.resources.len(), 1);
        assert_eq!(resp.resources[0].name(), "backend");
    }

    #[test]
    fn listener_fetch_on_cluster_only_snapshot_is_empty() {
        let cache = SnapshotCache::new();
        publish(&cache, "r0");

        let resp = cache.fetch(&request(LISTENER_TYPE_URL)).unwrap();
        assert!(resp.resources.is_empty());
        assert_eq!(resp.version_info, "r0");
    }

    #[test]
    fn unknown_type_url_is_rejected() {
        let cache = SnapshotCache::new();
        publish(&cache, "r0");

        let err = cache.fetch(&request("type.googleapis.com/google.api.Service"));
        assert!(matches!(err, Err(ConfigError::InvalidTypeUrl(_))));
    }

    #[test]
    fn missing_node_is_a_miss() {
        let cache = SnapshotCache::new();
        let err = cache.fetch(&request(CLUSTER_TYPE_URL));
        assert!(matches!(err, Err(ConfigError::SnapshotNotFound(_))));
        assert_eq!(cache.stats().fetch_misses(), 1);
    }

    #[test]
    fn fetch_after_republish_sees_new_version() {
        let cache = SnapshotCache::new();
        publish(&cache, "2018-12-05r0");
        publish(&cache, "2018-12-05r1");

        let resp = cache.fetch(&request(CLUSTER_TYPE_URL)).unwrap();
        assert_eq!(resp.version_info, "2018-12-05r1");
    }
}
