//! The cluster builder.
//!
//! Emits the backend cluster, the service-control cluster, and (when
//! dynamic routing is enabled) one DNS cluster per distinct backend
//! host/port.

use std::collections::BTreeMap;
use std::time::Duration;

use url::{Host, Url};

use agw_core::{ConfigError, ConfigResult};
use agw_types::{
    Address, Cluster, DiscoveryType, DnsLookupFamily, Http2ProtocolOptions, TlsContext,
};

use crate::config::TranslatorConfig;
use crate::descriptor::ServiceDescriptor;

/// Name of the cluster carrying service-control calls.
pub const SERVICE_CONTROL_CLUSTER: &str = "service-control-cluster";

/// Name of the cluster minting access/identity tokens.
pub const TOKEN_CLUSTER: &str = "ads_cluster";

/// Build the cluster set for a descriptor.
pub fn build_clusters(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> ConfigResult<Vec<Cluster>> {
    let backend_name = descriptor
        .backend_cluster_name()
        .ok_or_else(|| ConfigError::validation("service descriptor lists no apis"))?;

    let mut clusters = vec![Cluster {
        connect_timeout: config.cluster_connect_timeout,
        dns_lookup_family: None,
        hosts: vec![Address::socket(
            config.cluster_address.clone(),
            config.cluster_port,
        )],
        http2_protocol_options: config
            .backend_protocol
            .is_grpc()
            .then(Http2ProtocolOptions::default),
        name: backend_name.to_string(),
        tls_context: None,
        discovery_type: DiscoveryType::StrictDns,
    }];

    if !descriptor.control.environment.is_empty() {
        clusters.push(service_control_cluster(&descriptor.control.environment)?);
    }

    if config.enable_backend_routing {
        clusters.extend(dynamic_routing_clusters(descriptor, config)?);
    }

    Ok(clusters)
}

fn service_control_cluster(environment: &str) -> ConfigResult<Cluster> {
    let url = parse_environment(environment)?;
    let https = url.scheme() == "https";
    let host = url
        .host_str()
        .ok_or_else(|| {
            ConfigError::validation(format!("control environment has no host: {environment}"))
        })?
        .to_string();
    let port = u32::from(url.port().unwrap_or(if https { 443 } else { 80 }));

    Ok(Cluster {
        connect_timeout: Duration::from_secs(5),
        dns_lookup_family: Some(DnsLookupFamily::V4Only),
        hosts: vec![Address::socket(host.clone(), port)],
        http2_protocol_options: None,
        name: SERVICE_CONTROL_CLUSTER.to_string(),
        tls_context: https.then_some(TlsContext { sni: host }),
        discovery_type: DiscoveryType::LogicalDns,
    })
}

/// The service-control call URI for an environment value. A scheme-less
/// environment defaults to https.
pub fn service_control_uri(environment: &str) -> String {
    let base = if environment.contains("://") {
        environment.to_string()
    } else {
        format!("https://{environment}")
    };
    format!("{}/v1/services/", base.trim_end_matches('/'))
}

fn parse_environment(environment: &str) -> ConfigResult<Url> {
    let with_scheme = if environment.contains("://") {
        environment.to_string()
    } else {
        format!("https://{environment}")
    };
    Url::parse(&with_scheme).map_err(|e| {
        ConfigError::validation(format!("invalid control environment {environment}: {e}"))
    })
}

fn dynamic_routing_clusters(
    descriptor: &ServiceDescriptor,
    config: &TranslatorConfig,
) -> ConfigResult<Vec<Cluster>> {
    // Keyed by cluster name so duplicate addresses collapse and emission
    // is sorted.
    let mut clusters: BTreeMap<String, Cluster> = BTreeMap::new();

    for rule in &descriptor.backend.rules {
        if rule.address.is_empty() {
            continue;
        }
        let (host, port) = extract_backend_address(&rule.address)?;
        let name = format!("{host}:{port}");
        clusters.entry(name.clone()).or_insert_with(|| Cluster {
            connect_timeout: config.cluster_connect_timeout,
            dns_lookup_family: Some(DnsLookupFamily::V4Only),
            hosts: vec![Address::socket(host.clone(), port)],
            http2_protocol_options: None,
            name,
            tls_context: Some(TlsContext { sni: host.clone() }),
            discovery_type: DiscoveryType::LogicalDns,
        });
    }

    Ok(clusters.into_values().collect())
}

/// Extract `(host, port)` from a dynamic-routing backend address.
///
/// # Errors
///
/// Dynamic routing accepts only https URLs with domain-name hosts; the
/// error messages are part of the operator contract.
pub fn extract_backend_address(address: &str) -> ConfigResult<(String, u32)> {
    let url = Url::parse(address)
        .map_err(|e| ConfigError::validation(format!("invalid backend address {address}: {e}")))?;

    if url.scheme() != "https" {
        return Err(ConfigError::validation(
            "dynamic routing only supports HTTPS",
        ));
    }

    match url.host() {
        Some(Host::Domain(domain)) => {
            let port = u32::from(url.port().unwrap_or(443));
            Ok((domain.to_string(), port))
        }
        Some(Host::Ipv4(ip)) => Err(ConfigError::validation(format!(
            "dynamic routing only supports domain name, got IP address: {ip}"
        ))),
        Some(Host::Ipv6(ip)) => Err(ConfigError::validation(format!(
            "dynamic routing only supports domain name, got IP address: {ip}"
        ))),
        None => Err(ConfigError::validation(format!(
            "backend address has no host: {address}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendProtocol;

    fn descriptor(body: &str) -> ServiceDescriptor {
        ServiceDescriptor::from_json(body).unwrap()
    }

    #[test]
    fn backend_cluster_uses_first_api_name() {
        let d = descriptor(r#"{"apis": [{"name": "endpoints.examples.bookstore.Bookstore"}]}"#);
        let clusters = build_clusters(&d, &TranslatorConfig::default()).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].name, "endpoints.examples.bookstore.Bookstore");
        assert_eq!(clusters[0].discovery_type, DiscoveryType::StrictDns);
        assert!(clusters[0].http2_protocol_options.is_none());
    }

    #[test]
    fn grpc_backend_gets_http2_options() {
        let d = descriptor(r#"{"apis": [{"name": "pkg.Svc"}]}"#);
        let config = TranslatorConfig {
            backend_protocol: BackendProtocol::Grpc,
            ..TranslatorConfig::default()
        };
        let clusters = build_clusters(&d, &config).unwrap();
        assert!(clusters[0].http2_protocol_options.is_some());
    }

    #[test]
    fn no_apis_is_a_validation_error() {
        let d = descriptor("{}");
        assert!(build_clusters(&d, &TranslatorConfig::default()).is_err());
    }

    #[test]
    fn schemeless_environment_defaults_to_https() {
        let cluster = service_control_cluster("servicecontrol.googleapis.com").unwrap();
        assert_eq!(cluster.hosts[0].socket_address.port_value, 443);
        assert_eq!(
            cluster.tls_context.as_ref().unwrap().sni,
            "servicecontrol.googleapis.com"
        );
        assert_eq!(cluster.dns_lookup_family, Some(DnsLookupFamily::V4Only));
        assert_eq!(cluster.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn http_environment_keeps_port_and_drops_tls() {
        let cluster = service_control_cluster("http://127.0.0.1:8000").unwrap();
        assert_eq!(cluster.hosts[0].socket_address.address, "127.0.0.1");
        assert_eq!(cluster.hosts[0].socket_address.port_value, 8000);
        assert!(cluster.tls_context.is_none());
    }

    #[test]
    fn service_control_uri_appends_services_path() {
        assert_eq!(
            service_control_uri("servicecontrol.googleapis.com"),
            "https://servicecontrol.googleapis.com/v1/services/"
        );
        assert_eq!(
            service_control_uri("http://127.0.0.1:8000/"),
            "http://127.0.0.1:8000/v1/services/"
        );
    }

    #[test]
    fn extract_backend_address_accepts_https_domains() {
        assert_eq!(
            extract_backend_address("https://abc.example.org").unwrap(),
            ("abc.example.org".to_string(), 443)
        );
        assert_eq!(
            extract_backend_address("https://abcde.google.org/").unwrap(),
            ("abcde.google.org".to_string(), 443)
        );
        assert_eq!(
            extract_backend_address("https://abcde.youtube.com/api/").unwrap(),
            ("abcde.youtube.com".to_string(), 443)
        );
        assert_eq!(
            extract_backend_address("https://abcde.youtube.com:8989/api/").unwrap(),
            ("abcde.youtube.com".to_string(), 8989)
        );
    }

    #[test]
    fn extract_backend_address_rejects_http() {
        let err = extract_backend_address("http://abcde.youtube.com:8989/api/").unwrap_err();
        assert_eq!(err.to_string(), "dynamic routing only supports HTTPS");
    }

    #[test]
    fn extract_backend_address_rejects_ip_literals() {
        let err = extract_backend_address("https://192.168.0.1/api/").unwrap_err();
        assert_eq!(
            err.to_string(),
            "dynamic routing only supports domain name, got IP address: 192.168.0.1"
        );
    }

    #[test]
    fn dynamic_clusters_deduplicate_and_sort() {
        let d = descriptor(
            r#"{
                "apis": [{"name": "pkg.Svc"}],
                "backend": {
                    "rules": [
                        {"selector": "a", "address": "https://b.example.com/api/"},
                        {"selector": "b", "address": "https://a.example.com:8989/api/"},
                        {"selector": "c", "address": "https://b.example.com/other/"}
                    ]
                }
            }"#,
        );
        let config = TranslatorConfig {
            enable_backend_routing: true,
            ..TranslatorConfig::default()
        };
        let clusters = build_clusters(&d, &config).unwrap();
        let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["pkg.Svc", "a.example.com:8989", "b.example.com:443"]
        );
        assert_eq!(
            clusters[2].tls_context.as_ref().unwrap().sni,
            "b.example.com"
        );
    }
}
