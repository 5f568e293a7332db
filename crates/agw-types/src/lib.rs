//! # agw-types
//!
//! Serde-typed Envoy v2 configuration resources for the API gateway
//! control plane:
//!
//! - [`Listener`] with its http-connection-manager and filter chain
//! - [`Cluster`] with DNS discovery and TLS context
//! - [`RouteConfiguration`] with the virtual-host CORS policy
//! - The HTTP filter configs under [`FilterConfig`]
//! - The discovery fetch [`DiscoveryRequest`] / [`DiscoveryResponse`]
//!
//! Field naming is part of the contract: resources serialize with the
//! proto-JSON camelCase mapping, while everything embedded inside the
//! connection-manager `config` object keeps the original snake_case
//! names. Serialization is deterministic (struct field order and
//! `BTreeMap` provider keys), so repeated translation of the same inputs
//! is byte-identical.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cluster;
pub mod discovery;
pub mod duration;
pub mod filter;
pub mod listener;
pub mod route;

pub use cluster::{Cluster, DiscoveryType, DnsLookupFamily, Http2ProtocolOptions, TlsContext};
pub use discovery::{DiscoveryRequest, DiscoveryResponse, Node, ResourceEntry};
pub use filter::{
    filter_name, ApiKeyRequirement, BackendAuthConfig, BackendAuthRule, DataSource, EmptyConfig,
    FilterConfig, GcpAttributes, HeaderMatcher, HttpFilter, HttpPattern, HttpUri, JwtAuthnConfig,
    JwtProvider, JwtProviderWithAudiences, JwtRequirement, JwtRequirementList, JwtRule,
    JwtRuleMatch, PathMatcherConfig, PathMatcherRule, ServiceControlConfig,
    ServiceControlRequirement, ServiceControlRule, ServiceControlService, TranscoderConfig,
};
pub use listener::{
    Address, FilterChain, HttpConnectionManager, Listener, NetworkFilter, SocketAddress,
};
pub use route::{CorsPolicy, Route, RouteAction, RouteConfiguration, RouteMatch, VirtualHost};
