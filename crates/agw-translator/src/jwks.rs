//! JWKS inlining.
//!
//! Each auth provider's key set is fetched once per translation pass and
//! inlined into the provider record, so the emitted filter config is
//! self-contained. Providers whose `jwks_uri` does not parse or whose
//! fetch fails are dropped; rules referencing them are skipped later by
//! the filter builder.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use agw_core::{ConfigError, ConfigResult};

use crate::descriptor::ServiceDescriptor;

/// Per-fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a JWKS document by URL.
#[async_trait]
pub trait JwksFetcher: Send + Sync {
    /// Fetch the document body at `uri`.
    async fn fetch(&self, uri: &str) -> ConfigResult<String>;
}

/// Production fetcher backed by reqwest.
#[derive(Clone, Debug, Default)]
pub struct HttpJwksFetcher {
    client: reqwest::Client,
}

impl HttpJwksFetcher {
    /// Create a fetcher with a fresh client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JwksFetcher for HttpJwksFetcher {
    async fn fetch(&self, uri: &str) -> ConfigResult<String> {
        let response = self
            .client
            .get(uri)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ConfigError::unreachable("jwks", e))?
            .error_for_status()
            .map_err(|e| ConfigError::unreachable("jwks", e))?;
        response
            .text()
            .await
            .map_err(|e| ConfigError::unreachable("jwks", e))
    }
}

/// Canned fetcher returning one fixed document for every URL. Used by
/// tests and local runs without key servers.
#[derive(Clone, Debug)]
pub struct StaticJwksFetcher {
    body: String,
}

impl StaticJwksFetcher {
    /// Create a fetcher returning `body` for every URL.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl JwksFetcher for StaticJwksFetcher {
    async fn fetch(&self, _uri: &str) -> ConfigResult<String> {
        Ok(self.body.clone())
    }
}

/// Inline every provider's JWKS, memoizing by URL within this pass.
///
/// Never fails: providers that cannot be resolved are dropped with a
/// warning and the rest proceed.
pub async fn inline_jwks(descriptor: &mut ServiceDescriptor, fetcher: &dyn JwksFetcher) {
    let mut memo: HashMap<String, String> = HashMap::new();
    let providers = std::mem::take(&mut descriptor.authentication.providers);
    let mut kept = Vec::with_capacity(providers.len());

    for mut provider in providers {
        if Url::parse(&provider.jwks_uri).is_err() {
            warn!(
                provider = %provider.id,
                jwks_uri = %provider.jwks_uri,
                "dropping auth provider with invalid jwks_uri"
            );
            continue;
        }

        let body = if let Some(body) = memo.get(&provider.jwks_uri) {
            body.clone()
        } else {
            match fetcher.fetch(&provider.jwks_uri).await {
                Ok(body) => {
                    debug!(provider = %provider.id, jwks_uri = %provider.jwks_uri, "inlined jwks");
                    memo.insert(provider.jwks_uri.clone(), body.clone());
                    body
                }
                Err(err) => {
                    warn!(
                        provider = %provider.id,
                        jwks_uri = %provider.jwks_uri,
                        error = %err,
                        "dropping auth provider, jwks fetch failed"
                    );
                    continue;
                }
            }
        };

        provider.jwks = Some(body);
        kept.push(provider);
    }

    descriptor.authentication.providers = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JwksFetcher for CountingFetcher {
        async fn fetch(&self, _uri: &str) -> ConfigResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("FAKEJWKS".to_string())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl JwksFetcher for FailingFetcher {
        async fn fetch(&self, _uri: &str) -> ConfigResult<String> {
            Err(ConfigError::unreachable("jwks", "connection refused"))
        }
    }

    fn descriptor_with_providers(specs: &[(&str, &str)]) -> ServiceDescriptor {
        let mut descriptor = ServiceDescriptor::default();
        for (id, uri) in specs {
            descriptor
                .authentication
                .providers
                .push(crate::descriptor::AuthProvider {
                    id: id.to_string(),
                    issuer: "https://test_issuer.google.com/".to_string(),
                    jwks_uri: uri.to_string(),
                    ..Default::default()
                });
        }
        descriptor
    }

    #[tokio::test]
    async fn invalid_uri_drops_provider() {
        let mut descriptor = descriptor_with_providers(&[
            ("firebase", "https://keys.example.com/jwks"),
            ("unknownId", "invalidUrl"),
        ]);
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
        };
        inline_jwks(&mut descriptor, &fetcher).await;

        let providers = &descriptor.authentication.providers;
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, "firebase");
        assert_eq!(providers[0].jwks.as_deref(), Some("FAKEJWKS"));
    }

    #[tokio::test]
    async fn repeated_uri_is_fetched_once() {
        let mut descriptor = descriptor_with_providers(&[
            ("firebase1", "https://keys.example.com/jwks"),
            ("firebase2", "https://keys.example.com/jwks"),
        ]);
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
        };
        inline_jwks(&mut descriptor, &fetcher).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(descriptor.authentication.providers.len(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_drops_only_that_provider() {
        let mut descriptor =
            descriptor_with_providers(&[("firebase", "https://keys.example.com/jwks")]);
        inline_jwks(&mut descriptor, &FailingFetcher).await;
        assert!(descriptor.authentication.providers.is_empty());
    }
}
