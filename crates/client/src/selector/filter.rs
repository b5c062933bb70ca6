use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use courier_registry::Node;
use courier_transport::TransportError;
use tracing::debug;

/// Predicate deciding whether a node may be selected.
#[derive(Clone)]
pub struct SelectFilter(Arc<dyn Fn(&Node) -> bool + Send + Sync>);

impl SelectFilter {
    /// Keep nodes for which `predicate` returns `true`.
    pub fn new(predicate: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Drop nodes whose ID is in `ids`.
    pub fn exclude<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: HashSet<String> = ids.into_iter().map(Into::into).collect();
        Self::new(move |node| !ids.contains(node.id()))
    }

    /// Keep nodes whose metadata maps `key` to `value`.
    pub fn metadata(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        Self::new(move |node| node.metadata_value(&key) == Some(value.as_str()))
    }

    /// Whether `node` passes this filter.
    pub fn allows(&self, node: &Node) -> bool {
        (self.0)(node)
    }
}

impl fmt::Debug for SelectFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SelectFilter(..)")
    }
}

/// Nodes that failed earlier in one logical call.
///
/// Lives for one call only; nothing is written back to the registry.
#[derive(Clone, Debug, Default)]
pub struct FailedNodes {
    ids: HashSet<String>,
}

impl FailedNodes {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `node` failed with `error`.
    pub fn mark(&mut self, node: &Node, error: &TransportError) {
        debug!("Marking {} as failed: {}", node, error);
        self.ids.insert(node.id().to_string());
    }

    /// Whether `node_id` has been marked.
    pub fn contains(&self, node_id: &str) -> bool {
        self.ids.contains(node_id)
    }

    /// Number of marked nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no node has been marked.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Filter excluding every marked node.
    pub fn filter(&self) -> SelectFilter {
        SelectFilter::exclude(self.ids.iter().cloned())
    }
}
