//! # agw
//!
//! The configuration control plane of an API gateway fronting an L7 data
//! plane. Given a service descriptor (endpoints, HTTP-to-RPC bindings,
//! auth providers, CORS policy, backend routing) and a rollout policy,
//! it synthesizes the listener/cluster/route configuration the data
//! plane consumes, follows rollouts, and atomically swaps the published
//! snapshot.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use agw::prelude::*;
//!
//! let cache = Arc::new(SnapshotCache::new());
//!
//! let manager = ConfigManager::new(config, Arc::clone(&cache),
//!     descriptors, rollouts, jwks).await?;
//! let poller = manager.start();
//!
//! agw_discovery::serve(DiscoveryService::new(cache), addr, shutdown).await?;
//! ```
//!
//! ## Architecture
//!
//! - `agw-core` - node hashing, type URLs, error handling
//! - `agw-types` - serde-typed data-plane resources
//! - `agw-cache` - snapshot cache and the discovery fetch contract
//! - `agw-translator` - descriptor → snapshot translation
//! - `agw-discovery` - HTTP discovery endpoints
//! - `agw-manager` - rollout watcher and snapshot publisher
//!
//! This crate re-exports the public API for convenience.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use agw_cache as cache;
pub use agw_core as core;
pub use agw_discovery as discovery;
pub use agw_manager as manager;
pub use agw_translator as translator;
pub use agw_types as types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use agw_cache::{Cache, CacheStats, Snapshot, SnapshotBuilder, SnapshotCache};
    pub use agw_core::{ConfigError, ConfigResult, NodeHash, ResourceType};
    pub use agw_discovery::DiscoveryService;
    pub use agw_manager::{
        ConfigManager, DescriptorSource, ManagerConfig, RolloutSource, RolloutStrategy,
    };
    pub use agw_translator::{
        translate, translate_with_jwks, BackendProtocol, CorsOptions, HttpJwksFetcher,
        JwksFetcher, ServiceDescriptor, TranslatorConfig,
    };
    pub use agw_types::{DiscoveryRequest, DiscoveryResponse, Node};
}
