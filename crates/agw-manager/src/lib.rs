//! # agw-manager
//!
//! The rollout watcher and snapshot publisher:
//!
//! - [`ConfigManager`] - resolves rollout → config id → descriptor →
//!   snapshot, publishes atomically, and polls for new rollouts
//! - [`sources`] - injectable rollout/descriptor sources with
//!   service-management HTTP implementations
//! - [`Flags`] - the operator flag surface

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod flags;
mod manager;
pub mod sources;

pub use flags::Flags;
pub use manager::{ConfigManager, ManagerConfig, RolloutStrategy};
pub use sources::{
    DescriptorSource, RolloutSource, RolloutsDocument, ServiceManagementSource,
};
