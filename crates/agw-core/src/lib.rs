//! # agw-core
//!
//! Core types for the API gateway control plane:
//!
//! - [`ConfigError`] / [`ConfigResult`] - shared error handling
//! - [`NodeHash`] - node identity for snapshot lookup
//! - [`ResourceType`] and the served type URLs

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod node;
mod type_url;

pub use error::{ConfigError, ConfigResult};
pub use node::NodeHash;
pub use type_url::{ResourceType, CLUSTER_TYPE_URL, LISTENER_TYPE_URL};
