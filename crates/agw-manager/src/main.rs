//! The gateway control-plane binary: resolves the active service config,
//! publishes snapshots, and serves the discovery endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agw_cache::SnapshotCache;
use agw_discovery::{shutdown, DiscoveryService};
use agw_manager::{ConfigManager, Flags, ServiceManagementSource};
use agw_translator::HttpJwksFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let flags = Flags::parse();
    let config = flags.manager_config()?;

    let client = reqwest::Client::new();
    let source = Arc::new(ServiceManagementSource::new(
        client.clone(),
        flags.service_management_url.clone(),
        flags.metadata_url.clone(),
    ));
    let jwks = Arc::new(HttpJwksFetcher::with_client(client));

    let cache = Arc::new(SnapshotCache::new());
    let manager = ConfigManager::new(
        config,
        Arc::clone(&cache),
        source.clone(),
        source,
        jwks,
    )
    .await
    .context("initial config translation failed")?;
    info!(
        service = %flags.service,
        version = %manager.current_config_id(),
        "initial snapshot published"
    );

    let poller = manager.start();

    let addr = SocketAddr::from(([0, 0, 0, 0], flags.discovery_port));
    agw_discovery::serve(DiscoveryService::new(cache), addr, shutdown::wait_for_signal())
        .await
        .context("discovery server failed")?;

    manager.shutdown();
    let _ = poller.await;
    Ok(())
}
