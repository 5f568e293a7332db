//! Route configuration resources.
//!
//! The route table is embedded inside the http-connection-manager config,
//! so field names keep the original snake_case proto names.

use serde::{Deserialize, Serialize};

/// A route configuration: named set of virtual hosts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteConfiguration {
    /// Route config name.
    pub name: String,
    /// Virtual hosts, in emission order.
    pub virtual_hosts: Vec<VirtualHost>,
}

/// A virtual host and its routes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualHost {
    /// CORS policy, present only when a CORS preset is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,
    /// Domains served by this host.
    pub domains: Vec<String>,
    /// Virtual host name.
    pub name: String,
    /// Routes, first match wins.
    pub routes: Vec<Route>,
}

/// A single route entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Match condition.
    #[serde(rename = "match")]
    pub match_: RouteMatch,
    /// Route action.
    pub route: RouteAction,
}

/// Route match condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteMatch {
    /// Path prefix to match.
    pub prefix: String,
}

/// Route action: forward to a cluster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteAction {
    /// Target cluster name.
    pub cluster: String,
}

/// CORS policy attached to a virtual host.
///
/// `allow_credentials` is always emitted explicitly, even when false;
/// every other field is omitted when empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorsPolicy {
    /// Explicitly whether credentialed requests are allowed.
    pub allow_credentials: bool,
    /// Allowed headers, comma-joined.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub allow_headers: String,
    /// Allowed methods, comma-joined.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub allow_methods: String,
    /// Exact allowed origins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_origin: Vec<String>,
    /// Allowed origin regexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_origin_regex: Vec<String>,
    /// Headers exposed to the browser, comma-joined.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expose_headers: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_policy_always_emits_allow_credentials() {
        let policy = CorsPolicy {
            allow_origin: vec!["http://example.com".into()],
            ..CorsPolicy::default()
        };
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["allow_credentials"], false);
        assert!(json.get("allow_methods").is_none());
    }

    #[test]
    fn route_config_round_trips() {
        let config = RouteConfiguration {
            name: "local_route".into(),
            virtual_hosts: vec![VirtualHost {
                cors: None,
                domains: vec!["*".into()],
                name: "backend".into(),
                routes: vec![Route {
                    match_: RouteMatch { prefix: "/".into() },
                    route: RouteAction {
                        cluster: "endpoints.examples.bookstore.Bookstore".into(),
                    },
                }],
            }],
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RouteConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
