//! Service snapshot type

use serde::{Deserialize, Serialize};

use crate::Node;

/// One registered version of a service and its nodes.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Service {
    /// Logical service name
    pub name: String,
    /// Version label of this registration
    pub version: String,
    /// Nodes in discovery order; may be empty
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Service {
    /// Create a service version with no nodes
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            nodes: Vec::new(),
        }
    }

    /// Add a node to this service version
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Whether this version currently has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
