//! Upstream document sources.
//!
//! The manager consumes three upstream endpoints: the rollout list, the
//! service config, and the metadata token server. Each is behind a trait
//! so tests inject canned documents and production uses HTTP.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use agw_core::{ConfigError, ConfigResult};
use agw_translator::ServiceDescriptor;

/// Per-fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata path returning the default service account token.
const SERVICE_ACCOUNT_TOKEN_SUFFIX: &str =
    "/computeMetadata/v1/instance/service-accounts/default/token";

/// The rollout list document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RolloutsDocument {
    /// Rollouts, newest first.
    #[serde(default)]
    pub rollouts: Vec<Rollout>,
}

impl RolloutsDocument {
    /// The newest rollout, if any.
    #[must_use]
    pub fn newest(&self) -> Option<&Rollout> {
        self.rollouts.first()
    }
}

/// One rollout entry.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Rollout {
    /// Rollout id.
    #[serde(default, alias = "rolloutId")]
    pub rollout_id: String,
    /// Creation timestamp, RFC 3339.
    #[serde(default, alias = "createTime")]
    pub create_time: String,
    /// Rollout status.
    #[serde(default)]
    pub status: String,
    /// Traffic assignment.
    #[serde(default, alias = "trafficPercentStrategy")]
    pub traffic_percent_strategy: TrafficPercentStrategy,
    /// Service this rollout belongs to.
    #[serde(default, alias = "serviceName")]
    pub service_name: String,
}

/// Traffic percentages keyed by config id.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrafficPercentStrategy {
    /// `config id -> percent` in `[0, 100]`.
    #[serde(default)]
    pub percentages: HashMap<String, u32>,
}

impl Rollout {
    /// The active config id: strictly highest percentage, ties broken by
    /// the lexicographically greatest id.
    #[must_use]
    pub fn active_config_id(&self) -> Option<&str> {
        self.traffic_percent_strategy
            .percentages
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(id, _)| id.as_str())
    }
}

/// Source of rollout documents.
#[async_trait]
pub trait RolloutSource: Send + Sync {
    /// Fetch the rollout list for a service.
    async fn fetch_rollouts(&self, service: &str) -> ConfigResult<RolloutsDocument>;
}

/// Source of service descriptors.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    /// Fetch the descriptor of one config id.
    async fn fetch_descriptor(
        &self,
        service: &str,
        config_id: &str,
    ) -> ConfigResult<ServiceDescriptor>;
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

/// Production source backed by the service-management API, authenticated
/// with tokens from the metadata server.
#[derive(Clone, Debug)]
pub struct ServiceManagementSource {
    client: reqwest::Client,
    base_url: String,
    metadata_url: String,
}

impl ServiceManagementSource {
    /// Create a source against `base_url`, fetching tokens from
    /// `metadata_url`.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        metadata_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: trim_trailing_slash(base_url.into()),
            metadata_url: trim_trailing_slash(metadata_url.into()),
        }
    }

    async fn fetch_token(&self) -> ConfigResult<String> {
        let url = format!("{}{}", self.metadata_url, SERVICE_ACCOUNT_TOKEN_SUFFIX);
        let token: AccessToken = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ConfigError::unreachable("metadata token", e))?
            .error_for_status()
            .map_err(|e| ConfigError::unreachable("metadata token", e))?
            .json()
            .await
            .map_err(|e| ConfigError::unreachable("metadata token", e))?;
        Ok(token.access_token)
    }

    async fn fetch_json(&self, what: &'static str, url: &str) -> ConfigResult<String> {
        let token = self.fetch_token().await?;
        debug!(url = %url, "fetching {what}");
        self.client
            .get(url)
            .bearer_auth(token)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ConfigError::unreachable(what, e))?
            .error_for_status()
            .map_err(|e| ConfigError::unreachable(what, e))?
            .text()
            .await
            .map_err(|e| ConfigError::unreachable(what, e))
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[async_trait]
impl RolloutSource for ServiceManagementSource {
    async fn fetch_rollouts(&self, service: &str) -> ConfigResult<RolloutsDocument> {
        let url = format!(
            "{}/v1/services/{service}/rollouts?filter=status=SUCCESS",
            self.base_url
        );
        let body = self.fetch_json("rollout", &url).await?;
        serde_json::from_str(&body).map_err(ConfigError::malformed)
    }
}

#[async_trait]
impl DescriptorSource for ServiceManagementSource {
    async fn fetch_descriptor(
        &self,
        service: &str,
        config_id: &str,
    ) -> ConfigResult<ServiceDescriptor> {
        let url = format!("{}/v1/services/{service}/configs/{config_id}", self.base_url);
        let body = self.fetch_json("config", &url).await?;
        ServiceDescriptor::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rollout(percentages: &[(&str, u32)]) -> Rollout {
        Rollout {
            rollout_id: "test".to_string(),
            traffic_percent_strategy: TrafficPercentStrategy {
                percentages: percentages
                    .iter()
                    .map(|(id, pct)| (id.to_string(), *pct))
                    .collect(),
            },
            ..Rollout::default()
        }
    }

    #[test]
    fn active_config_id_picks_highest_percentage() {
        let r = rollout(&[("2018-12-05r0", 40), ("2018-12-05r1", 60)]);
        assert_eq!(r.active_config_id(), Some("2018-12-05r1"));
    }

    #[test]
    fn active_config_id_breaks_ties_lexicographically_descending() {
        let r = rollout(&[("2018-12-05r0", 50), ("2018-12-05r1", 50)]);
        assert_eq!(r.active_config_id(), Some("2018-12-05r1"));
    }

    #[test]
    fn empty_percentages_have_no_active_id() {
        assert_eq!(rollout(&[]).active_config_id(), None);
    }

    #[test]
    fn rollouts_document_parses_wire_names() {
        let doc: RolloutsDocument = serde_json::from_str(
            r#"{
                "rollouts": [{
                    "rolloutId": "2018-12-05r0",
                    "createTime": "2018-12-05T19:07:18.438Z",
                    "status": "SUCCESS",
                    "trafficPercentStrategy": {"percentages": {"2018-12-05r0": 100}},
                    "serviceName": "bookstore.endpoints.project123.cloud.goog"
                }]
            }"#,
        )
        .unwrap();
        let newest = doc.newest().unwrap();
        assert_eq!(newest.rollout_id, "2018-12-05r0");
        assert_eq!(newest.active_config_id(), Some("2018-12-05r0"));
    }
}
