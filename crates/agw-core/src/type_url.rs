//! Type URLs for the discovery contract.
//!
//! The data plane speaks the v2 discovery API and requests exactly two
//! resource kinds from this control plane: listeners and clusters.

use std::fmt;

use crate::{ConfigError, ConfigResult};

/// Type URL for Listener resources.
pub const LISTENER_TYPE_URL: &str = "type.googleapis.com/envoy.api.v2.Listener";

/// Type URL for Cluster resources.
pub const CLUSTER_TYPE_URL: &str = "type.googleapis.com/envoy.api.v2.Cluster";

/// The resource kinds this control plane serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Listener resources (the filter-chain graph).
    Listener,
    /// Cluster resources (backend, service control, dynamic routing).
    Cluster,
}

impl ResourceType {
    /// Resolve a request type URL to a served resource kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTypeUrl`] for any other URL.
    pub fn from_type_url(type_url: &str) -> ConfigResult<Self> {
        match type_url {
            LISTENER_TYPE_URL => Ok(Self::Listener),
            CLUSTER_TYPE_URL => Ok(Self::Cluster),
            other => Err(ConfigError::InvalidTypeUrl(other.to_string())),
        }
    }

    /// The canonical type URL for this resource kind.
    #[must_use]
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Listener => LISTENER_TYPE_URL,
            Self::Cluster => CLUSTER_TYPE_URL,
        }
    }

    /// Short name of the resource kind, e.g. `Listener`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Listener => "Listener",
            Self::Cluster => "Cluster",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
