//! Translator configuration.
//!
//! Every input the translator reads arrives through an explicit
//! [`TranslatorConfig`] record; nothing is read from process globals.
//! Tests seed the record directly, the binary builds it from flags.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use agw_core::ConfigError;

/// Protocol spoken by the local backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendProtocol {
    /// HTTP/1.1 backend.
    #[default]
    Http1,
    /// HTTP/2 backend.
    Http2,
    /// gRPC backend; enables the transcoder and gRPC-Web filters.
    Grpc,
}

impl BackendProtocol {
    /// Whether the backend speaks gRPC.
    #[must_use]
    pub fn is_grpc(&self) -> bool {
        matches!(self, Self::Grpc)
    }
}

impl FromStr for BackendProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http1" => Ok(Self::Http1),
            "http2" => Ok(Self::Http2),
            "grpc" => Ok(Self::Grpc),
            other => Err(ConfigError::validation(format!(
                "backend_protocol must be one of http1, http2, grpc, got: {other}"
            ))),
        }
    }
}

impl fmt::Display for BackendProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Http1 => "http1",
            Self::Http2 => "http2",
            Self::Grpc => "grpc",
        };
        write!(f, "{s}")
    }
}

/// CORS flag surface, validated by the route-config builder.
#[derive(Clone, Debug, Default)]
pub struct CorsOptions {
    /// `""`, `"basic"` or `"cors_with_regex"`.
    pub preset: String,
    /// Exact allowed origin (`basic` preset).
    pub allow_origin: String,
    /// Allowed origin regex (`cors_with_regex` preset).
    pub allow_origin_regex: String,
    /// Allowed methods, comma-joined.
    pub allow_methods: String,
    /// Allowed headers, comma-joined.
    pub allow_headers: String,
    /// Exposed headers, comma-joined.
    pub expose_headers: String,
    /// Whether credentialed requests are allowed.
    pub allow_credentials: bool,
}

impl CorsOptions {
    /// Whether any CORS flag besides the preset is set.
    #[must_use]
    pub fn any_flag_set(&self) -> bool {
        !self.allow_origin.is_empty()
            || !self.allow_origin_regex.is_empty()
            || !self.allow_methods.is_empty()
            || !self.allow_headers.is_empty()
            || !self.expose_headers.is_empty()
    }
}

/// Immutable translator inputs for one translation pass.
#[derive(Clone, Debug)]
pub struct TranslatorConfig {
    /// The active service config id; becomes the snapshot version.
    pub service_config_id: String,
    /// Local backend protocol.
    pub backend_protocol: BackendProtocol,
    /// Local backend address.
    pub cluster_address: String,
    /// Local backend port.
    pub cluster_port: u32,
    /// Backend connect timeout.
    pub cluster_connect_timeout: Duration,
    /// Listener bind address.
    pub listener_address: String,
    /// Listener bind port.
    pub listener_port: u32,
    /// Whether dynamic backend routing is enabled.
    pub enable_backend_routing: bool,
    /// CORS flag surface.
    pub cors: CorsOptions,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            service_config_id: String::new(),
            backend_protocol: BackendProtocol::Http1,
            cluster_address: "127.0.0.1".to_string(),
            cluster_port: 8082,
            cluster_connect_timeout: Duration::from_secs(20),
            listener_address: "0.0.0.0".to_string(),
            listener_port: 8080,
            enable_backend_routing: false,
            cors: CorsOptions::default(),
        }
    }
}
