//! The discovery HTTP service.
//!
//! Exposes the fetch contract over two REST endpoints, one per served
//! type URL:
//!
//! - `POST /v2/discovery:listeners`
//! - `POST /v2/discovery:clusters`
//!
//! The request body is a JSON [`DiscoveryRequest`]; a request without a
//! `type_url` inherits it from the endpoint. Responses echo the request
//! they answer.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;

use agw_cache::SnapshotCache;
use agw_core::{ConfigError, ResourceType};
use agw_types::{DiscoveryRequest, DiscoveryResponse};

/// Discovery service over a shared snapshot cache.
#[derive(Clone, Debug)]
pub struct DiscoveryService {
    cache: Arc<SnapshotCache>,
}

impl DiscoveryService {
    /// Create a service reading from `cache`.
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self { cache }
    }

    /// Build the axum router for this service.
    pub fn into_router(self) -> Router {
        Router::new()
            .route("/v2/discovery:listeners", post(fetch_listeners))
            .route("/v2/discovery:clusters", post(fetch_clusters))
            .with_state(self.cache)
    }
}

async fn fetch_listeners(
    state: State<Arc<SnapshotCache>>,
    request: Json<DiscoveryRequest>,
) -> Result<Json<DiscoveryResponse>, (StatusCode, String)> {
    fetch(state, request, ResourceType::Listener).await
}

async fn fetch_clusters(
    state: State<Arc<SnapshotCache>>,
    request: Json<DiscoveryRequest>,
) -> Result<Json<DiscoveryResponse>, (StatusCode, String)> {
    fetch(state, request, ResourceType::Cluster).await
}

async fn fetch(
    State(cache): State<Arc<SnapshotCache>>,
    Json(mut request): Json<DiscoveryRequest>,
    kind: ResourceType,
) -> Result<Json<DiscoveryResponse>, (StatusCode, String)> {
    if request.type_url.is_empty() {
        request.type_url = kind.type_url().to_string();
    }

    debug!(
        node = %request.node.id,
        type_url = %request.type_url,
        "discovery fetch"
    );

    match cache.fetch(&request) {
        Ok(response) => Ok(Json(response)),
        Err(err @ ConfigError::SnapshotNotFound(_)) => {
            Err((StatusCode::NOT_FOUND, err.to_string()))
        }
        Err(err @ ConfigError::InvalidTypeUrl(_)) => {
            Err((StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(err) => Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use agw_cache::{Cache, Snapshot};
    use agw_core::{NodeHash, LISTENER_TYPE_URL};
    use agw_types::Node;

    fn cache_with_snapshot() -> Arc<SnapshotCache> {
        let cache = Arc::new(SnapshotCache::new());
        cache.set_snapshot(
            NodeHash::from_id("api_proxy"),
            Snapshot::builder().version("2017-05-01r0").build(),
        );
        cache
    }

    #[tokio::test]
    async fn fetch_fills_type_url_from_endpoint() {
        let cache = cache_with_snapshot();
        let request = DiscoveryRequest {
            node: Node::new("api_proxy"),
            type_url: String::new(),
        };

        let Json(response) = fetch(State(cache), Json(request), ResourceType::Listener)
            .await
            .unwrap();
        assert_eq!(response.version_info, "2017-05-01r0");
        assert_eq!(response.request.type_url, LISTENER_TYPE_URL);
    }

    #[tokio::test]
    async fn unknown_node_is_not_found() {
        let cache = cache_with_snapshot();
        let request = DiscoveryRequest {
            node: Node::new("other"),
            type_url: String::new(),
        };

        let err = fetch(State(cache), Json(request), ResourceType::Cluster)
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
