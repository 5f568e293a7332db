//! The HTTP filter-chain builder.
//!
//! Builds the ordered filter list for the single emitted listener. The
//! order is fixed: path matcher, JWT authn, service control, backend
//! auth, transcoder, gRPC-Web, router; each filter appears only under its
//! trigger, the router always closes the chain.
//!
//! gRPC wire-path entries (`/<api>/<Method>`) are emitted only when the
//! backend protocol is gRPC; REST-binding entries are always emitted.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::warn;

use agw_core::ConfigResult;
use agw_types::{
    filter_name, BackendAuthConfig, BackendAuthRule, DataSource, EmptyConfig, FilterConfig,
    GcpAttributes, HeaderMatcher, HttpFilter, HttpPattern, HttpUri, JwtAuthnConfig, JwtProvider,
    JwtProviderWithAudiences, JwtRequirement, JwtRequirementList, JwtRule, JwtRuleMatch,
    PathMatcherConfig, PathMatcherRule, ServiceControlConfig, ServiceControlRequirement,
    ServiceControlRule, ServiceControlService, TranscoderConfig,
};

use crate::clusters::{service_control_uri, SERVICE_CONTROL_CLUSTER, TOKEN_CLUSTER};
use crate::config::TranslatorConfig;
use crate::descriptor::{split_selector, AuthRequirement, ServiceDescriptor};
use crate::json::snake_case_keys;
use crate::template::{classify, has_variables, UriMatcher};

/// Query parameters the transcoder must ignore (API key carriers).
const TRANSCODER_IGNORED_QUERY_PARAMETERS: [&str; 2] = ["api_key", "key"];

/// Platform reported in service-control calls.
const GCP_PLATFORM: &str = "GCE";

/// Build the ordered HTTP filter chain.
pub fn build_http_filters(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> ConfigResult<Vec<HttpFilter>> {
    let mut filters = Vec::new();

    if let Some(path_matcher) = build_path_matcher(descriptor, config) {
        filters.push(HttpFilter::new(
            filter_name::PATH_MATCHER,
            FilterConfig::PathMatcher(path_matcher),
        ));
    }
    if let Some(jwt) = build_jwt_authn(descriptor, config) {
        filters.push(HttpFilter::new(
            filter_name::JWT_AUTHN,
            FilterConfig::JwtAuthn(jwt),
        ));
    }
    if let Some(service_control) = build_service_control(descriptor, config) {
        filters.push(HttpFilter::new(
            filter_name::SERVICE_CONTROL,
            FilterConfig::ServiceControl(service_control),
        ));
    }
    if let Some(backend_auth) = build_backend_auth(descriptor) {
        filters.push(HttpFilter::new(
            filter_name::BACKEND_AUTH,
            FilterConfig::BackendAuth(backend_auth),
        ));
    }
    if let Some(transcoder) = build_transcoder(descriptor, config) {
        filters.push(HttpFilter::new(
            filter_name::GRPC_JSON_TRANSCODER,
            FilterConfig::Transcoder(transcoder),
        ));
    }
    if config.backend_protocol.is_grpc() {
        filters.push(HttpFilter::new(
            filter_name::GRPC_WEB,
            FilterConfig::Empty(EmptyConfig {}),
        ));
    }
    filters.push(HttpFilter::new(
        filter_name::ROUTER,
        FilterConfig::Empty(EmptyConfig {}),
    ));

    Ok(filters)
}

// ---------------------------------------------------------------------------
// path_matcher
// ---------------------------------------------------------------------------

fn build_path_matcher(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> Option<PathMatcherConfig> {
    let enabled = config.enable_backend_routing || !descriptor.backend.rules.is_empty();
    if !enabled {
        return None;
    }

    let mut rules = Vec::new();

    if config.backend_protocol.is_grpc() {
        for api in &descriptor.apis {
            for method in &api.methods {
                rules.push(PathMatcherRule {
                    extract_path_parameters: None,
                    operation: format!("{}.{}", api.name, method.name),
                    pattern: HttpPattern::new("POST", format!("/{}/{}", api.name, method.name)),
                });
            }
        }
    }

    for rule in &descriptor.http.rules {
        let Some(binding) = rule.binding() else {
            continue;
        };
        rules.push(PathMatcherRule {
            extract_path_parameters: has_variables(&binding.template).then_some(true),
            operation: rule.selector.clone(),
            pattern: HttpPattern::new(binding.verb, binding.template),
        });
    }

    (!rules.is_empty()).then_some(PathMatcherConfig { rules })
}

// ---------------------------------------------------------------------------
// jwt_authn
// ---------------------------------------------------------------------------

fn build_jwt_authn(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> Option<JwtAuthnConfig> {
    let providers: BTreeMap<String, JwtProvider> = descriptor
        .authentication
        .providers
        .iter()
        .map(|p| {
            let audiences = p.audience_list();
            (
                p.id.clone(),
                JwtProvider {
                    audiences: (!audiences.is_empty()).then_some(audiences),
                    issuer: p.issuer.clone(),
                    local_jwks: DataSource {
                        inline_string: p.jwks.clone().unwrap_or_default(),
                    },
                },
            )
        })
        .collect();

    if providers.is_empty() {
        return None;
    }

    let mut rules = Vec::new();
    for auth_rule in &descriptor.authentication.rules {
        let known: Vec<&AuthRequirement> = auth_rule
            .requirements
            .iter()
            .filter(|r| providers.contains_key(&r.provider_id))
            .collect();
        if known.is_empty() {
            if !auth_rule.requirements.is_empty() {
                warn!(
                    selector = %auth_rule.selector,
                    "skipping auth rule, no requirement names a known provider"
                );
            }
            continue;
        }

        let requires = if known.len() == 1 {
            single_requirement(known[0])
        } else {
            JwtRequirement::RequiresAny {
                requires_any: JwtRequirementList {
                    requirements: known.iter().map(|r| single_requirement(r)).collect(),
                },
            }
        };

        // REST ingress: one match per HTTP binding.
        if let Some(binding) = descriptor.http_binding(&auth_rule.selector) {
            let mut match_ = JwtRuleMatch {
                headers: Some(vec![HeaderMatcher::http_method(&binding.verb)]),
                ..JwtRuleMatch::default()
            };
            match classify(&binding.template) {
                UriMatcher::Exact(path) => match_.path = Some(path),
                UriMatcher::Regex(regex) => match_.regex = Some(regex),
            }
            rules.push(JwtRule {
                match_,
                requires: requires.clone(),
            });
        }

        // gRPC ingress: the wire path, only for gRPC backends.
        if config.backend_protocol.is_grpc() {
            let (api, method) = split_selector(&auth_rule.selector);
            rules.push(JwtRule {
                match_: JwtRuleMatch {
                    path: Some(format!("/{api}/{method}")),
                    ..JwtRuleMatch::default()
                },
                requires,
            });
        }
    }

    Some(JwtAuthnConfig { providers, rules })
}

fn single_requirement(requirement: &AuthRequirement) -> JwtRequirement {
    let audiences = requirement.audience_list();
    if audiences.is_empty() {
        JwtRequirement::ProviderName {
            provider_name: requirement.provider_id.clone(),
        }
    } else {
        JwtRequirement::ProviderAndAudiences {
            provider_and_audiences: JwtProviderWithAudiences {
                audiences,
                provider_name: requirement.provider_id.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// service_control
// ---------------------------------------------------------------------------

fn build_service_control(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> Option<ServiceControlConfig> {
    if descriptor.control.environment.is_empty() {
        return None;
    }

    let mut rules = Vec::new();
    for (selector, entry) in descriptor.method_index() {
        let requires = ServiceControlRequirement {
            api_key: None,
            operation_name: selector.clone(),
            service_name: descriptor.name.clone(),
        };
        if config.backend_protocol.is_grpc() {
            rules.push(ServiceControlRule {
                pattern: HttpPattern::new("POST", entry.grpc_path()),
                requires: requires.clone(),
            });
        }
        if let Some(binding) = &entry.binding {
            rules.push(ServiceControlRule {
                pattern: HttpPattern::new(binding.verb.clone(), binding.template.clone()),
                requires,
            });
        }
    }

    // Synthetic preflight rules: admitted without an API key so the CORS
    // filter chain can answer OPTIONS.
    if descriptor.allow_cors() {
        let mut cors_index = 0u32;
        for rule in &descriptor.http.rules {
            let Some(binding) = rule.binding() else {
                continue;
            };
            rules.push(ServiceControlRule {
                pattern: HttpPattern::new("OPTIONS", binding.template),
                requires: ServiceControlRequirement {
                    api_key: Some(agw_types::ApiKeyRequirement {
                        allow_without_api_key: true,
                    }),
                    operation_name: format!("CORS.{cors_index}"),
                    service_name: descriptor.name.clone(),
                },
            });
            cors_index += 1;
        }
    }

    Some(ServiceControlConfig {
        gcp_attributes: GcpAttributes {
            platform: GCP_PLATFORM.to_string(),
        },
        rules,
        services: vec![ServiceControlService {
            producer_project_id: descriptor.producer_project_id.clone(),
            service_config: embedded_service_config(descriptor),
            service_config_id: config.service_config_id.clone(),
            service_control_uri: HttpUri {
                cluster: SERVICE_CONTROL_CLUSTER.to_string(),
                timeout: "5s".to_string(),
                uri: service_control_uri(&descriptor.control.environment),
            },
            service_name: descriptor.name.clone(),
            token_cluster: TOKEN_CLUSTER.to_string(),
        }],
    })
}

/// The service config reported to service control: the `@type` marker
/// plus the descriptor's logging sections with proto field names.
fn embedded_service_config(descriptor: &ServiceDescriptor) -> serde_json::Value {
    let mut config = serde_json::Map::new();
    config.insert(
        "@type".to_string(),
        json!("type.googleapis.com/google.api.Service"),
    );
    if let Some(logging) = &descriptor.logging {
        config.insert("logging".to_string(), snake_case_keys(logging.clone()));
    }
    if let Some(logs) = &descriptor.logs {
        config.insert("logs".to_string(), snake_case_keys(logs.clone()));
    }
    serde_json::Value::Object(config)
}

// ---------------------------------------------------------------------------
// backend_auth
// ---------------------------------------------------------------------------

fn build_backend_auth(descriptor: &ServiceDescriptor) -> Option<BackendAuthConfig> {
    let rules: Vec<BackendAuthRule> = descriptor
        .backend
        .rules
        .iter()
        .filter(|r| !r.jwt_audience.is_empty())
        .map(|r| BackendAuthRule {
            jwt_audience: r.jwt_audience.clone(),
            operation: r.selector.clone(),
            token_cluster: TOKEN_CLUSTER.to_string(),
        })
        .collect();

    (!rules.is_empty()).then_some(BackendAuthConfig { rules })
}

// ---------------------------------------------------------------------------
// grpc_json_transcoder
// ---------------------------------------------------------------------------

fn build_transcoder(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> Option<TranscoderConfig> {
    if !config.backend_protocol.is_grpc() {
        return None;
    }
    // A gRPC backend without an attached descriptor set simply skips
    // transcoding; it is not an error.
    let proto_descriptor = descriptor.proto_descriptor()?;

    Some(TranscoderConfig {
        ignored_query_parameters: TRANSCODER_IGNORED_QUERY_PARAMETERS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        proto_descriptor_bin: proto_descriptor.to_string(),
        services: descriptor.apis.iter().map(|a| a.name.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendProtocol;

    fn grpc_config() -> TranslatorConfig {
        TranslatorConfig {
            service_config_id: "2017-05-01r0".to_string(),
            backend_protocol: BackendProtocol::Grpc,
            ..TranslatorConfig::default()
        }
    }

    #[test]
    fn router_is_always_last() {
        let descriptor = ServiceDescriptor::default();
        let filters = build_http_filters(&descriptor, &TranslatorConfig::default()).unwrap();
        assert_eq!(filters.last().unwrap().name, filter_name::ROUTER);
    }

    #[test]
    fn grpc_backend_adds_grpc_web_before_router() {
        let descriptor = ServiceDescriptor::default();
        let filters = build_http_filters(&descriptor, &grpc_config()).unwrap();
        let names: Vec<&str> = filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![filter_name::GRPC_WEB, filter_name::ROUTER]);
    }

    #[test]
    fn chain_order_is_a_prefix_of_the_canonical_order() {
        let descriptor = ServiceDescriptor::from_json(
            r#"{
                "name": "svc",
                "apis": [{"name": "pkg.Svc", "methods": [{"name": "Get"}]}],
                "control": {"environment": "servicecontrol.googleapis.com"},
                "backend": {"rules": [{"selector": "pkg.Svc.Get", "jwtAudience": "b.com"}]},
                "authentication": {
                    "providers": [{"id": "p", "issuer": "i", "jwks_uri": "https://k/x"}],
                    "rules": []
                },
                "sourceInfo": {
                    "sourceFiles": [{
                        "fileContents": "abc",
                        "fileType": "FILE_DESCRIPTOR_SET_PROTO"
                    }]
                }
            }"#,
        )
        .unwrap();

        let filters = build_http_filters(&descriptor, &grpc_config()).unwrap();
        let names: Vec<&str> = filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                filter_name::PATH_MATCHER,
                filter_name::JWT_AUTHN,
                filter_name::SERVICE_CONTROL,
                filter_name::BACKEND_AUTH,
                filter_name::GRPC_JSON_TRANSCODER,
                filter_name::GRPC_WEB,
                filter_name::ROUTER,
            ]
        );
    }

    #[test]
    fn missing_proto_descriptor_omits_transcoder() {
        let descriptor = ServiceDescriptor::from_json(
            r#"{"apis": [{"name": "pkg.Svc"}]}"#,
        )
        .unwrap();
        assert!(build_transcoder(&descriptor, &grpc_config()).is_none());
    }

    #[test]
    fn path_matcher_extracts_parameters_only_for_variable_templates() {
        let descriptor = ServiceDescriptor::from_json(
            r#"{
                "backend": {
                    "rules": [
                        {"selector": "1.x.Foo", "pathTranslation": "CONSTANT_ADDRESS"},
                        {"selector": "1.x.Bar", "pathTranslation": "APPEND_PATH_TO_ADDRESS"}
                    ]
                },
                "http": {
                    "rules": [
                        {"selector": "1.x.Foo", "get": "foo/{id}"},
                        {"selector": "1.x.Bar", "get": "foo"}
                    ]
                }
            }"#,
        )
        .unwrap();

        let config = build_path_matcher(&descriptor, &TranslatorConfig::default()).unwrap();
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].extract_path_parameters, Some(true));
        assert_eq!(config.rules[1].extract_path_parameters, None);
    }

    #[test]
    fn jwt_rules_skip_unknown_providers() {
        let descriptor = ServiceDescriptor::from_json(
            r#"{
                "authentication": {
                    "providers": [{"id": "firebase", "issuer": "i", "jwks_uri": "https://k/x"}],
                    "rules": [
                        {
                            "selector": "pkg.Svc.Get",
                            "requirements": [{"provider_id": "dropped"}]
                        }
                    ]
                }
            }"#,
        )
        .unwrap();

        let config = build_jwt_authn(&descriptor, &grpc_config()).unwrap();
        assert!(config.rules.is_empty());
        assert!(config.providers.contains_key("firebase"));
    }
}
