//! Listener resources.
//!
//! A listener is served as a top-level discovery resource (proto-JSON
//! camelCase); its http-connection-manager network filter embeds an opaque
//! config object whose fields keep snake_case proto names.

use serde::{Deserialize, Serialize};

use crate::filter::{filter_name, HttpFilter};
use crate::route::RouteConfiguration;

/// A listener bound to a socket address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    /// Listener name; empty today (a single ingress listener).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Bind address.
    pub address: Address,
    /// Filter chains; the translator emits exactly one.
    #[serde(rename = "filterChains")]
    pub filter_chains: Vec<FilterChain>,
}

/// A network address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Socket address variant (the only one emitted).
    #[serde(rename = "socketAddress")]
    pub socket_address: SocketAddress,
}

impl Address {
    /// Build a socket address.
    pub fn socket(address: impl Into<String>, port_value: u32) -> Self {
        Self {
            socket_address: SocketAddress {
                address: address.into(),
                port_value,
            },
        }
    }
}

/// An IP socket address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocketAddress {
    /// IP or hostname.
    pub address: String,
    /// Port.
    #[serde(rename = "portValue")]
    pub port_value: u32,
}

/// A chain of network filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterChain {
    /// Network filters, in order.
    pub filters: Vec<NetworkFilter>,
}

/// A network-level filter; the translator only emits the HTTP connection
/// manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkFilter {
    /// Filter name.
    pub name: String,
    /// Connection-manager configuration.
    pub config: HttpConnectionManager,
}

/// The http-connection-manager config: HTTP filter chain plus embedded
/// route table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpConnectionManager {
    /// HTTP filters, in processing order; the router is always last.
    pub http_filters: Vec<HttpFilter>,
    /// Embedded route configuration.
    pub route_config: RouteConfiguration,
    /// Stat prefix for connection-manager metrics.
    pub stat_prefix: String,
}

impl Listener {
    /// Build the single ingress listener around a connection manager.
    pub fn ingress(
        address: impl Into<String>,
        port: u32,
        http_filters: Vec<HttpFilter>,
        route_config: RouteConfiguration,
    ) -> Self {
        Self {
            name: String::new(),
            address: Address::socket(address, port),
            filter_chains: vec![FilterChain {
                filters: vec![NetworkFilter {
                    name: filter_name::HTTP_CONNECTION_MANAGER.to_string(),
                    config: HttpConnectionManager {
                        http_filters,
                        route_config,
                        stat_prefix: "ingress_http".to_string(),
                    },
                }],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{EmptyConfig, FilterConfig};
    use crate::route::{Route, RouteAction, RouteMatch, VirtualHost};

    fn sample_listener() -> Listener {
        Listener::ingress(
            "0.0.0.0",
            8080,
            vec![HttpFilter::new(
                filter_name::ROUTER,
                FilterConfig::Empty(EmptyConfig {}),
            )],
            RouteConfiguration {
                name: "local_route".into(),
                virtual_hosts: vec![VirtualHost {
                    cors: None,
                    domains: vec!["*".into()],
                    name: "backend".into(),
                    routes: vec![Route {
                        match_: RouteMatch { prefix: "/".into() },
                        route: RouteAction {
                            cluster: "backend-cluster".into(),
                        },
                    }],
                }],
            },
        )
    }

    #[test]
    fn envelope_shape() {
        let json = serde_json::to_value(sample_listener()).unwrap();
        assert_eq!(
            json["address"]["socketAddress"],
            serde_json::json!({"address": "0.0.0.0", "portValue": 8080})
        );
        let hcm = &json["filterChains"][0]["filters"][0];
        assert_eq!(hcm["name"], "envoy.http_connection_manager");
        assert_eq!(hcm["config"]["stat_prefix"], "ingress_http");
        assert_eq!(hcm["config"]["route_config"]["name"], "local_route");
    }

    #[test]
    fn listener_round_trips() {
        let listener = sample_listener();
        let json = serde_json::to_string(&listener).unwrap();
        let parsed: Listener = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, listener);
    }
}
