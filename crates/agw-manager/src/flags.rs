//! The launch flag surface.
//!
//! Flags mirror the operator-facing names of the gateway; parsing turns
//! them into the explicit [`ManagerConfig`] record passed through the
//! translator, so nothing downstream reads process globals.

use std::time::Duration;

use clap::Parser;

use agw_core::ConfigResult;
use agw_translator::{CorsOptions, TranslatorConfig};

use crate::manager::ManagerConfig;

/// Launch flags for the gateway control plane.
#[derive(Clone, Debug, Parser)]
#[command(name = "agw-gateway", about = "API gateway config control plane")]
pub struct Flags {
    /// The managed service name.
    #[arg(long)]
    pub service: String,

    /// Service config id; required with the fixed rollout strategy.
    #[arg(long = "service_config_id", alias = "version", default_value = "")]
    pub service_config_id: String,

    /// Rollout strategy: fixed or managed.
    #[arg(long = "rollout_strategy", default_value = "fixed")]
    pub rollout_strategy: String,

    /// Backend protocol: http1, http2 or grpc (case-insensitive).
    #[arg(long = "backend_protocol", default_value = "http1")]
    pub backend_protocol: String,

    /// Local backend address.
    #[arg(long = "cluster_address", default_value = "127.0.0.1")]
    pub cluster_address: String,

    /// Local backend port.
    #[arg(long = "cluster_port", default_value_t = 8082)]
    pub cluster_port: u32,

    /// Backend connect timeout.
    #[arg(long = "cluster_connect_timeout", default_value = "20s",
          value_parser = humantime::parse_duration)]
    pub cluster_connect_timeout: Duration,

    /// Node id snapshots are published under.
    #[arg(long, default_value = "api_proxy")]
    pub node: String,

    /// Listener bind address emitted into the config.
    #[arg(long = "listener_address", default_value = "0.0.0.0")]
    pub listener_address: String,

    /// Listener bind port emitted into the config.
    #[arg(long = "listener_port", default_value_t = 8080)]
    pub listener_port: u32,

    /// Enable dynamic backend routing.
    #[arg(long = "enable_backend_routing")]
    pub enable_backend_routing: bool,

    /// CORS preset: "", basic or cors_with_regex.
    #[arg(long = "cors_preset", default_value = "")]
    pub cors_preset: String,

    /// Exact allowed origin (basic preset).
    #[arg(long = "cors_allow_origin", default_value = "")]
    pub cors_allow_origin: String,

    /// Allowed origin regex (cors_with_regex preset).
    #[arg(long = "cors_allow_origin_regex", default_value = "")]
    pub cors_allow_origin_regex: String,

    /// Allowed methods, comma-joined.
    #[arg(long = "cors_allow_methods", default_value = "")]
    pub cors_allow_methods: String,

    /// Allowed headers, comma-joined.
    #[arg(long = "cors_allow_headers", default_value = "")]
    pub cors_allow_headers: String,

    /// Exposed headers, comma-joined.
    #[arg(long = "cors_expose_headers", default_value = "")]
    pub cors_expose_headers: String,

    /// Allow credentialed cross-origin requests.
    #[arg(long = "cors_allow_credentials")]
    pub cors_allow_credentials: bool,

    /// Rollout polling interval (managed strategy).
    #[arg(long = "check_new_rollout_interval", default_value = "60s",
          value_parser = humantime::parse_duration)]
    pub check_new_rollout_interval: Duration,

    /// Service-management API base URL.
    #[arg(long = "service_management_url",
          default_value = "https://servicemanagement.googleapis.com")]
    pub service_management_url: String,

    /// Metadata server base URL.
    #[arg(long = "metadata_url", default_value = "http://metadata.google.internal")]
    pub metadata_url: String,

    /// Port the discovery endpoints listen on.
    #[arg(long = "discovery_port", default_value_t = 8790)]
    pub discovery_port: u16,
}

impl Flags {
    /// Validate the flags into a manager configuration.
    pub fn manager_config(&self) -> ConfigResult<ManagerConfig> {
        Ok(ManagerConfig {
            service_name: self.service.clone(),
            node_id: self.node.clone(),
            rollout_strategy: self.rollout_strategy.parse()?,
            check_rollout_interval: self.check_new_rollout_interval,
            translator: TranslatorConfig {
                service_config_id: self.service_config_id.clone(),
                backend_protocol: self.backend_protocol.parse()?,
                cluster_address: self.cluster_address.clone(),
                cluster_port: self.cluster_port,
                cluster_connect_timeout: self.cluster_connect_timeout,
                listener_address: self.listener_address.clone(),
                listener_port: self.listener_port,
                enable_backend_routing: self.enable_backend_routing,
                cors: CorsOptions {
                    preset: self.cors_preset.clone(),
                    allow_origin: self.cors_allow_origin.clone(),
                    allow_origin_regex: self.cors_allow_origin_regex.clone(),
                    allow_methods: self.cors_allow_methods.clone(),
                    allow_headers: self.cors_allow_headers.clone(),
                    expose_headers: self.cors_expose_headers.clone(),
                    allow_credentials: self.cors_allow_credentials,
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::RolloutStrategy;
    use agw_translator::BackendProtocol;

    fn parse(args: &[&str]) -> Flags {
        Flags::parse_from(std::iter::once("agw-gateway").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_build_a_fixed_manager_config() {
        let flags = parse(&[
            "--service",
            "bookstore.endpoints.project123.cloud.goog",
            "--service_config_id",
            "2017-05-01r0",
        ]);
        let config = flags.manager_config().unwrap();
        assert_eq!(config.rollout_strategy, RolloutStrategy::Fixed);
        assert_eq!(config.translator.service_config_id, "2017-05-01r0");
        assert_eq!(config.translator.cluster_port, 8082);
        assert_eq!(
            config.translator.cluster_connect_timeout,
            Duration::from_secs(20)
        );
    }

    #[test]
    fn version_alias_sets_the_config_id() {
        let flags = parse(&["--service", "svc", "--version", "2018-12-05r0"]);
        assert_eq!(flags.service_config_id, "2018-12-05r0");
    }

    #[test]
    fn backend_protocol_is_case_insensitive() {
        let flags = parse(&["--service", "svc", "--backend_protocol", "gRPC"]);
        let config = flags.manager_config().unwrap();
        assert_eq!(config.translator.backend_protocol, BackendProtocol::Grpc);
    }

    #[test]
    fn bad_rollout_strategy_is_rejected() {
        let flags = parse(&["--service", "svc", "--rollout_strategy", "canary"]);
        assert!(flags.manager_config().is_err());
    }
}
