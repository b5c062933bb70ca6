//! Service discovery contract for Courier
//!
//! This crate provides:
//! - Node and service snapshot types (`Node`, `Service`)
//! - The `Registry` trait consumed by node selection
//! - Error kinds that registry implementations report

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod node;
pub mod service;

pub use error::{RegistryError, RegistryErrorKind};
pub use node::Node;
pub use service::Service;

use async_trait::async_trait;

/// Discovery backend that resolves a service name to its registered versions.
///
/// Implementations return one `Service` per registered version. A service that is
/// registered but currently has no nodes is returned with an empty node list rather
/// than omitted; a service with no registration at all fails with an error whose
/// kind is [`RegistryErrorKind::NotFound`].
#[async_trait]
pub trait Registry: Send + Sync + 'static {
    /// The error type for the registry.
    type Error: RegistryError;

    /// Look up every registered version of `service`.
    async fn lookup(&self, service: &str) -> Result<Vec<Service>, Self::Error>;
}
