//! In-memory implementation of the registry crate.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use courier_registry::{Node, Registry, Service};
use parking_lot::RwLock;
use tracing::{debug, info};

/// In-memory service registry.
///
/// Clones share the same underlying table, so a test can keep one handle to mutate
/// registrations while another is owned by a selector.
#[derive(Clone, Debug, Default)]
pub struct MemoryRegistry {
    services: Arc<RwLock<HashMap<String, Vec<Service>>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryRegistry {
    /// Creates a new, empty `MemoryRegistry`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service version.
    ///
    /// Nodes are merged into an existing registration of the same version; a node
    /// with an ID that is already registered replaces the previous entry in place.
    pub fn register(&self, service: Service) {
        info!(
            "Registering {} nodes for {}:{}",
            service.nodes.len(),
            service.name,
            service.version
        );

        let mut services = self.services.write();
        let versions = services.entry(service.name.clone()).or_default();

        match versions.iter_mut().find(|v| v.version == service.version) {
            Some(existing) => {
                for node in service.nodes {
                    match existing.nodes.iter_mut().find(|n| n.id() == node.id()) {
                        Some(slot) => *slot = node,
                        None => existing.nodes.push(node),
                    }
                }
            }
            None => versions.push(service),
        }
    }

    /// Removes a single node from a service version.
    ///
    /// The version stays registered even if it has no nodes left.
    pub fn deregister(&self, name: &str, version: &str, node_id: &str) {
        let mut services = self.services.write();
        if let Some(versions) = services.get_mut(name) {
            for service in versions.iter_mut().filter(|s| s.version == version) {
                service.nodes.retain(|n| n.id() != node_id);
            }
        }
        debug!("Deregistered node {node_id} from {name}:{version}");
    }

    /// Removes every version of a service.
    pub fn remove(&self, name: &str) {
        self.services.write().remove(name);
    }

    /// Lists every registered service name.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }

    /// Toggles whether lookups fail with [`Error::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    /// Convenience for registering a single node under a version.
    pub fn add_node(&self, name: &str, version: &str, node: Node) {
        self.register(Service::new(name, version).with_node(node));
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    type Error = Error;

    async fn lookup(&self, service: &str) -> Result<Vec<Service>, Self::Error> {
        if self.offline.load(Ordering::Acquire) {
            return Err(Error::Unavailable);
        }

        self.services
            .read()
            .get(service)
            .cloned()
            .ok_or_else(|| Error::ServiceNotFound(service.to_string()))
    }
}
