//! # agw-translator
//!
//! Translates a service descriptor plus launch configuration into a
//! versioned config snapshot for the data plane:
//!
//! - [`descriptor`] - the typed service-config model
//! - [`template`] - URI template grammar
//! - [`jwks`] - JWKS inlining with per-pass memoization
//! - The filter-chain, cluster, and route builders behind [`translate`]
//!
//! [`translate`] is a pure function: given equal inputs it produces
//! byte-identical snapshots. The only I/O in this crate is
//! [`jwks::inline_jwks`], which runs before translation and is injected
//! through the [`jwks::JwksFetcher`] trait.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clusters;
pub mod config;
pub mod descriptor;
pub mod filters;
pub mod jwks;
mod json;
pub mod routes;
pub mod template;

pub use clusters::{extract_backend_address, SERVICE_CONTROL_CLUSTER, TOKEN_CLUSTER};
pub use config::{BackendProtocol, CorsOptions, TranslatorConfig};
pub use descriptor::ServiceDescriptor;
pub use jwks::{HttpJwksFetcher, JwksFetcher, StaticJwksFetcher};

use agw_cache::Snapshot;
use agw_core::ConfigResult;
use agw_types::Listener;

/// Translate a descriptor into a config snapshot.
///
/// Assumes JWKS documents have already been inlined (see
/// [`jwks::inline_jwks`] or [`translate_with_jwks`]).
///
/// # Errors
///
/// Returns a validation error for CORS misconfiguration, bad
/// dynamic-routing addresses, or a descriptor without APIs.
pub fn translate(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> ConfigResult<Snapshot> {
    let filters = filters::build_http_filters(descriptor, config)?;
    let clusters = clusters::build_clusters(descriptor, config)?;

    // build_clusters has already rejected descriptors without apis.
    let backend_cluster = descriptor.backend_cluster_name().unwrap_or_default();
    let route_config = routes::build_route_config(backend_cluster, &config.cors)?;

    let listener = Listener::ingress(
        config.listener_address.clone(),
        config.listener_port,
        filters,
        route_config.clone(),
    );

    Ok(Snapshot::builder()
        .version(config.service_config_id.clone())
        .listener(listener)
        .clusters(clusters)
        .route(route_config)
        .build())
}

/// Inline JWKS documents, then translate.
///
/// This is the entry point the rollout manager uses: JWKS failures drop
/// individual providers (never the whole translation), any other failure
/// propagates.
pub async fn translate_with_jwks(
    mut descriptor: ServiceDescriptor,
    config: &TranslatorConfig,
    fetcher: &dyn JwksFetcher,
) -> ConfigResult<Snapshot> {
    jwks::inline_jwks(&mut descriptor, fetcher).await;
    translate(&descriptor, config)
}
