//! Node snapshot type

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One network-addressable instance of a service.
///
/// Nodes are immutable snapshots handed out by the registry; selection copies them
/// into its working set on every round and never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Node {
    id: String,
    address: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl Node {
    /// Create a new node without metadata
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry to this node
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Get the node ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the address the transport dials for this node
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get all metadata of this node
    pub const fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Get a single metadata value
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}
