//! # agw-discovery
//!
//! HTTP glue between the snapshot cache and the data plane: a small axum
//! service exposing the discovery fetch contract, plus signal handling
//! for graceful shutdown.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod service;
pub mod shutdown;

pub use service::DiscoveryService;

use std::net::SocketAddr;

use tracing::info;

/// Serve the discovery endpoints until `shutdown` resolves.
///
/// # Errors
///
/// Returns the underlying I/O error if binding or serving fails.
pub async fn serve(
    service: DiscoveryService,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "discovery server listening");
    axum::serve(listener, service.into_router())
        .with_graceful_shutdown(shutdown)
        .await
}
