//! Error types for the in-memory registry implementation.

use courier_registry::{RegistryError, RegistryErrorKind};
use thiserror::Error;

/// Error type for the in-memory registry implementation.
#[derive(Debug, Error)]
pub enum Error {
    /// No registration exists for the service.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// The registry was switched offline.
    #[error("Registry unavailable")]
    Unavailable,
}

impl RegistryError for Error {
    fn kind(&self) -> RegistryErrorKind {
        match self {
            Self::ServiceNotFound(_) => RegistryErrorKind::NotFound,
            Self::Unavailable => RegistryErrorKind::Unavailable,
        }
    }
}
