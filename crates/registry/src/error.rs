//! Error kinds for registry implementations

use std::error::Error;
use std::fmt::{self, Debug};

/// Marker trait for `Registry` errors
pub trait RegistryError: Debug + Error + Send + Sync + 'static {
    /// Returns the kind of this error
    fn kind(&self) -> RegistryErrorKind;
}

/// The kind of registry error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegistryErrorKind {
    /// No registration exists for the requested service
    NotFound,

    /// The discovery backend could not be reached
    Unavailable,

    /// Other/unknown error
    Other,
}

impl fmt::Display for RegistryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
