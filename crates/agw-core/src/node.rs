//! Node identification for snapshot lookup.
//!
//! The data plane identifies itself by an opaque node id string in every
//! discovery request. [`NodeHash`] converts that id into a fixed-size
//! FNV-1a hash used as the key of the snapshot map.

use std::fmt;
use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

/// Hash-based node identifier for efficient snapshot lookup.
///
/// # Example
///
/// ```rust
/// use agw_core::NodeHash;
///
/// let a = NodeHash::from_id("api_proxy");
/// let b = NodeHash::from_id("api_proxy");
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHash(u64);

impl NodeHash {
    /// Create a node hash from a node id string.
    #[must_use]
    pub fn from_id(node_id: &str) -> Self {
        let mut hasher = FnvHasher::default();
        node_id.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Get the raw hash value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(NodeHash::from_id("node-1"), NodeHash::from_id("node-1"));
    }

    #[test]
    fn different_ids_differ() {
        assert_ne!(NodeHash::from_id("node-1"), NodeHash::from_id("node-2"));
    }

    #[test]
    fn display_is_fixed_width_hex() {
        assert_eq!(format!("{}", NodeHash::from_id("x")).len(), 16);
    }
}
