//! Error types for the control plane.
//!
//! This module provides [`ConfigError`], the error type shared by the
//! translator, the snapshot cache, and the rollout manager. Validation
//! errors carry their message verbatim so callers (and operators reading
//! logs) see the exact misconfiguration.

/// Error type for control-plane operations.
///
/// Two broad families exist:
///
/// - **Validation** errors are deterministic properties of the inputs
///   (bad CORS flags, bad dynamic-routing addresses, unparseable
///   descriptors). They are fatal on the initial build and logged on
///   re-translation.
/// - **Unreachable** errors are transient transport failures against the
///   rollout, config, metadata, or JWKS endpoints. The manager retries
///   them on the next tick and keeps serving the last good snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Discovery request named a type URL this control plane does not serve.
    #[error("invalid type URL: {0}")]
    InvalidTypeUrl(String),

    /// No snapshot has been published for the requested node.
    #[error("no snapshot published for node: {0}")]
    SnapshotNotFound(String),

    /// Translator input failed validation. The message is user-facing
    /// and emitted verbatim.
    #[error("{0}")]
    Validation(String),

    /// The service descriptor could not be decoded.
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),

    /// An upstream dependency could not be reached.
    #[error("{what} fetch failed: {message}")]
    Unreachable {
        /// What was being fetched (rollout, config, metadata token, jwks).
        what: &'static str,
        /// Transport-level error message.
        message: String,
    },
}

impl ConfigError {
    /// Create a validation error with a verbatim message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transient fetch error from any error type.
    pub fn unreachable<E>(what: &'static str, source: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Unreachable {
            what,
            message: source.to_string(),
        }
    }

    /// Create a malformed-descriptor error from any error type.
    pub fn malformed<E>(source: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::MalformedDescriptor(source.to_string())
    }

    /// Whether this error is transient and worth retrying on the next
    /// polling tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Convenience alias used across the workspace.
pub type ConfigResult<T> = Result<T, ConfigError>;
