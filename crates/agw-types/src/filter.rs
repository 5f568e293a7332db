//! HTTP filter configurations.
//!
//! Each filter the translator can emit has a typed config struct here,
//! joined under [`FilterConfig`]. Filter configs live inside the
//! http-connection-manager's opaque `config` object, so field names follow
//! the original (snake_case) proto names rather than the camelCase JSON
//! mapping used by core resources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known filter names, in their fixed chain order.
pub mod filter_name {
    /// Network-level HTTP connection manager.
    pub const HTTP_CONNECTION_MANAGER: &str = "envoy.http_connection_manager";
    /// Maps `{method, path}` to an operation and extracts path variables.
    pub const PATH_MATCHER: &str = "envoy.filters.http.path_matcher";
    /// JWT verification.
    pub const JWT_AUTHN: &str = "envoy.filters.http.jwt_authn";
    /// Service-control check/report integration.
    pub const SERVICE_CONTROL: &str = "envoy.filters.http.service_control";
    /// Mints backend identity tokens for dynamic routing.
    pub const BACKEND_AUTH: &str = "envoy.filters.http.backend_auth";
    /// JSON/HTTP to gRPC transcoding.
    pub const GRPC_JSON_TRANSCODER: &str = "envoy.grpc_json_transcoder";
    /// gRPC-Web bridging.
    pub const GRPC_WEB: &str = "envoy.grpc_web";
    /// Terminal router filter.
    pub const ROUTER: &str = "envoy.router";
}

/// One entry of the `http_filters` chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpFilter {
    /// Filter name, one of [`filter_name`].
    pub name: String,
    /// Filter configuration.
    pub config: FilterConfig,
}

impl HttpFilter {
    /// Create a filter entry.
    pub fn new(name: impl Into<String>, config: FilterConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

/// Tagged variant over every filter config the translator emits.
///
/// Serialized untagged: the JSON shape of each config is distinct enough
/// (by its required fields) to round-trip. The two empty-config filters
/// (`grpc_web`, `router`) share [`FilterConfig::Empty`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterConfig {
    /// `envoy.grpc_json_transcoder`.
    Transcoder(TranscoderConfig),
    /// `envoy.filters.http.jwt_authn`.
    JwtAuthn(JwtAuthnConfig),
    /// `envoy.filters.http.service_control`.
    ServiceControl(ServiceControlConfig),
    /// `envoy.filters.http.backend_auth`.
    BackendAuth(BackendAuthConfig),
    /// `envoy.filters.http.path_matcher`.
    PathMatcher(PathMatcherConfig),
    /// Empty config (`grpc_web`, `router`).
    Empty(EmptyConfig),
}

/// An intentionally empty filter config, serialized as `{}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyConfig {}

/// An HTTP request pattern: method plus URI template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpPattern {
    /// HTTP method, upper-case.
    pub http_method: String,
    /// URI template as written in the descriptor, or a gRPC wire path.
    pub uri_template: String,
}

impl HttpPattern {
    /// Create a pattern.
    pub fn new(http_method: impl Into<String>, uri_template: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            uri_template: uri_template.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// path_matcher
// ---------------------------------------------------------------------------

/// Config for `envoy.filters.http.path_matcher`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathMatcherConfig {
    /// One rule per operation.
    pub rules: Vec<PathMatcherRule>,
}

/// A single path-matcher rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathMatcherRule {
    /// Set when the template binds path variables, instructing the filter
    /// to populate variable bindings for downstream filters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_path_parameters: Option<bool>,
    /// Fully-qualified operation selector.
    pub operation: String,
    /// Pattern to match.
    pub pattern: HttpPattern,
}

// ---------------------------------------------------------------------------
// jwt_authn
// ---------------------------------------------------------------------------

/// Config for `envoy.filters.http.jwt_authn`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwtAuthnConfig {
    /// Providers keyed by provider id. A `BTreeMap` keeps emission
    /// deterministic.
    pub providers: BTreeMap<String, JwtProvider>,
    /// Per-route requirement rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<JwtRule>,
}

/// A JWT provider with its inlined key set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwtProvider {
    /// Accepted audiences, omitted when the provider declares none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audiences: Option<Vec<String>>,
    /// Token issuer.
    pub issuer: String,
    /// JWKS document inlined at translation time.
    pub local_jwks: DataSource,
}

/// An inline data source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Inlined document body.
    pub inline_string: String,
}

/// A JWT requirement rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwtRule {
    /// Route match for this rule.
    #[serde(rename = "match")]
    pub match_: JwtRuleMatch,
    /// Requirement applied when the match fires.
    pub requires: JwtRequirement,
}

/// Route match used by JWT rules: exactly one of `path` or `regex`,
/// optionally constrained by exact-match headers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JwtRuleMatch {
    /// Header constraints (the `:method` pseudo-header for HTTP bindings).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderMatcher>>,
    /// Exact path match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Anchored regex path match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

/// An exact-match header constraint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeaderMatcher {
    /// Required header value.
    pub exact_match: String,
    /// Header name.
    pub name: String,
}

impl HeaderMatcher {
    /// The canonical `:method` constraint for an HTTP verb.
    #[must_use]
    pub fn http_method(verb: &str) -> Self {
        Self {
            exact_match: verb.to_string(),
            name: ":method".to_string(),
        }
    }
}

/// The `requires` clause of a JWT rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JwtRequirement {
    /// Single provider, no audience restriction.
    ProviderName {
        /// Provider id.
        provider_name: String,
    },
    /// Single provider restricted to audiences.
    ProviderAndAudiences {
        /// Provider plus audiences.
        provider_and_audiences: JwtProviderWithAudiences,
    },
    /// Any of several requirements satisfies the rule.
    RequiresAny {
        /// The alternative requirements.
        requires_any: JwtRequirementList,
    },
}

/// Provider reference with an audience restriction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwtProviderWithAudiences {
    /// Accepted audiences for this rule.
    pub audiences: Vec<String>,
    /// Provider id.
    pub provider_name: String,
}

/// A list of alternative requirements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwtRequirementList {
    /// The alternatives.
    pub requirements: Vec<JwtRequirement>,
}

// ---------------------------------------------------------------------------
// service_control
// ---------------------------------------------------------------------------

/// Config for `envoy.filters.http.service_control`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceControlConfig {
    /// Platform attributes reported with every call.
    pub gcp_attributes: GcpAttributes,
    /// Per-operation requirement rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ServiceControlRule>,
    /// The controlled services (exactly one today).
    pub services: Vec<ServiceControlService>,
}

/// Platform attributes for service-control reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GcpAttributes {
    /// Compute platform identifier.
    pub platform: String,
}

/// A service-control requirement rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceControlRule {
    /// Pattern admitted by this rule.
    pub pattern: HttpPattern,
    /// Requirement applied to matching requests.
    pub requires: ServiceControlRequirement,
}

/// The requirement attached to a service-control rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceControlRequirement {
    /// API key handling override, set on synthetic CORS preflight rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKeyRequirement>,
    /// Operation name reported to service control.
    pub operation_name: String,
    /// The controlled service name.
    pub service_name: String,
}

/// API key handling for a rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRequirement {
    /// Admit the request without an API key.
    pub allow_without_api_key: bool,
}

/// One controlled service entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceControlService {
    /// Producer project id, omitted when the descriptor has none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub producer_project_id: String,
    /// The embedded service config reported to service control
    /// (`@type google.api.Service` plus logging/logs pass-through).
    pub service_config: serde_json::Value,
    /// Active config id.
    pub service_config_id: String,
    /// Where to reach service control.
    pub service_control_uri: HttpUri,
    /// The controlled service name.
    pub service_name: String,
    /// Cluster minting access tokens for service-control calls.
    pub token_cluster: String,
}

/// An HTTP URI routed through a named cluster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpUri {
    /// Cluster carrying the calls.
    pub cluster: String,
    /// Per-call timeout, proto-JSON encoded.
    pub timeout: String,
    /// Full URI prefix.
    pub uri: String,
}

// ---------------------------------------------------------------------------
// backend_auth
// ---------------------------------------------------------------------------

/// Config for `envoy.filters.http.backend_auth`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendAuthConfig {
    /// One rule per backend rule carrying a JWT audience.
    pub rules: Vec<BackendAuthRule>,
}

/// A backend-auth rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendAuthRule {
    /// Audience of the minted identity token.
    pub jwt_audience: String,
    /// Operation selector this rule applies to.
    pub operation: String,
    /// Cluster minting the tokens.
    pub token_cluster: String,
}

// ---------------------------------------------------------------------------
// grpc_json_transcoder
// ---------------------------------------------------------------------------

/// Config for `envoy.grpc_json_transcoder`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Query parameters the transcoder must not treat as field bindings.
    pub ignored_query_parameters: Vec<String>,
    /// Base64 file-descriptor set, passed through from the descriptor.
    pub proto_descriptor_bin: String,
    /// Fully-qualified service names to transcode.
    pub services: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_serializes_to_empty_object() {
        let json = serde_json::to_value(FilterConfig::Empty(EmptyConfig {})).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn requirement_shapes() {
        let single = JwtRequirement::ProviderName {
            provider_name: "firebase".into(),
        };
        assert_eq!(
            serde_json::to_value(&single).unwrap(),
            serde_json::json!({"provider_name": "firebase"})
        );

        let with_audiences = JwtRequirement::ProviderAndAudiences {
            provider_and_audiences: JwtProviderWithAudiences {
                audiences: vec!["test_audience1".into()],
                provider_name: "firebase".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&with_audiences).unwrap(),
            serde_json::json!({
                "provider_and_audiences": {
                    "audiences": ["test_audience1"],
                    "provider_name": "firebase"
                }
            })
        );

        let any = JwtRequirement::RequiresAny {
            requires_any: JwtRequirementList {
                requirements: vec![single.clone(), with_audiences.clone()],
            },
        };
        let value = serde_json::to_value(&any).unwrap();
        assert_eq!(value["requires_any"]["requirements"][0]["provider_name"], "firebase");
    }

    #[test]
    fn filter_config_round_trips() {
        let config = FilterConfig::PathMatcher(PathMatcherConfig {
            rules: vec![PathMatcherRule {
                extract_path_parameters: Some(true),
                operation: "pkg.Svc.Get".into(),
                pattern: HttpPattern::new("GET", "/v1/items/{item}"),
            }],
        });
        let json = serde_json::to_string(&config).unwrap();
        let parsed: FilterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn backend_auth_round_trips_distinct_from_path_matcher() {
        let config = FilterConfig::BackendAuth(BackendAuthConfig {
            rules: vec![BackendAuthRule {
                jwt_audience: "foo.com".into(),
                operation: "foo".into(),
                token_cluster: "ads_cluster".into(),
            }],
        });
        let json = serde_json::to_string(&config).unwrap();
        let parsed: FilterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
