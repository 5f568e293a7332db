//! Cluster resources.
//!
//! Clusters are served as top-level discovery resources, so field names
//! follow the proto-JSON camelCase mapping.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration;
use crate::listener::Address;

/// An upstream cluster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Connection establishment timeout.
    #[serde(rename = "connectTimeout", with = "duration")]
    pub connect_timeout: Duration,
    /// DNS lookup family, set on LOGICAL_DNS clusters.
    #[serde(rename = "dnsLookupFamily", skip_serializing_if = "Option::is_none")]
    pub dns_lookup_family: Option<DnsLookupFamily>,
    /// Upstream hosts.
    pub hosts: Vec<Address>,
    /// Present (empty) iff the upstream speaks HTTP/2.
    #[serde(
        rename = "http2ProtocolOptions",
        skip_serializing_if = "Option::is_none"
    )]
    pub http2_protocol_options: Option<Http2ProtocolOptions>,
    /// Cluster name; doubles as the discovery resource name.
    pub name: String,
    /// TLS context, set when the upstream requires TLS.
    #[serde(rename = "tlsContext", skip_serializing_if = "Option::is_none")]
    pub tls_context: Option<TlsContext>,
    /// Service discovery type.
    #[serde(rename = "type")]
    pub discovery_type: DiscoveryType,
}

/// Cluster service discovery types used by the translator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryType {
    /// Resolve every DNS answer and connect to all of them.
    #[serde(rename = "STRICT_DNS")]
    StrictDns,
    /// Resolve lazily and connect to the first answer.
    #[serde(rename = "LOGICAL_DNS")]
    LogicalDns,
}

/// DNS lookup families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsLookupFamily {
    /// IPv4 only.
    #[serde(rename = "V4_ONLY")]
    V4Only,
}

/// HTTP/2 protocol options; presence alone enables HTTP/2.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Http2ProtocolOptions {}

/// Upstream TLS context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TlsContext {
    /// SNI name presented to the upstream.
    pub sni: String,
}
