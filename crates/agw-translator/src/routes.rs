//! The route-config builder.
//!
//! A single virtual host catches every domain and forwards everything to
//! the backend cluster; filters upstream of the router decide what a
//! request actually means. The CORS policy, when configured, attaches to
//! the virtual host.

use agw_core::{ConfigError, ConfigResult};
use agw_types::{CorsPolicy, Route, RouteAction, RouteConfiguration, RouteMatch, VirtualHost};

use crate::config::CorsOptions;

/// Build the route configuration for the backend cluster.
pub fn build_route_config(
    backend_cluster: &str,
    cors: &CorsOptions,
) -> ConfigResult<RouteConfiguration> {
    Ok(RouteConfiguration {
        name: "local_route".to_string(),
        virtual_hosts: vec![VirtualHost {
            cors: build_cors_policy(cors)?,
            domains: vec!["*".to_string()],
            name: "backend".to_string(),
            routes: vec![Route {
                match_: RouteMatch {
                    prefix: "/".to_string(),
                },
                route: RouteAction {
                    cluster: backend_cluster.to_string(),
                },
            }],
        }],
    })
}

fn build_cors_policy(cors: &CorsOptions) -> ConfigResult<Option<CorsPolicy>> {
    let mut policy = CorsPolicy {
        allow_credentials: cors.allow_credentials,
        ..CorsPolicy::default()
    };

    match cors.preset.as_str() {
        "" => {
            if cors.any_flag_set() {
                return Err(ConfigError::validation(
                    "cors_preset must be set in order to enable CORS support",
                ));
            }
            return Ok(None);
        }
        "basic" => {
            if cors.allow_origin.is_empty() {
                return Err(ConfigError::validation(
                    "cors_allow_origin cannot be empty when cors_preset=basic",
                ));
            }
            policy.allow_origin = vec![cors.allow_origin.clone()];
        }
        "cors_with_regex" => {
            policy.allow_origin_regex = vec![cors.allow_origin_regex.clone()];
        }
        _ => {
            return Err(ConfigError::validation(
                r#"cors_preset must be either "basic" or "cors_with_regex""#,
            ));
        }
    }

    policy.allow_methods = cors.allow_methods.clone();
    policy.allow_headers = cors.allow_headers.clone();
    policy.expose_headers = cors.expose_headers.clone();
    Ok(Some(policy))
}
