//! Error types for selection and calls.

use courier_codec::CodecError;
use courier_registry::RegistryErrorKind;
use courier_stream::StreamError;
use courier_transport::{Done, TransportError};
use thiserror::Error;

/// Errors from [`Selector::select`](crate::Selector::select).
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SelectError {
    /// The service is not registered or has no nodes.
    #[error("Service not found: {0}")]
    NotFound(String),

    /// Nodes exist but every one was filtered out.
    #[error("No available nodes for service {0}")]
    NoAvailableNodes(String),

    /// The registry lookup failed.
    #[error("Registry lookup for {service} failed ({kind}): {message}")]
    Registry {
        /// Service being looked up
        service: String,
        /// Kind reported by the registry
        kind: RegistryErrorKind,
        /// Registry error message
        message: String,
    },
}

/// The error a failed call returns.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClientError {
    /// The service is not registered or has no nodes.
    #[error("Service not found: {0}")]
    NotFound(String),

    /// Nodes exist but every one was excluded for this call.
    #[error("No available nodes for service {0}")]
    NoAvailableNodes(String),

    /// The call deadline passed.
    #[error("Call deadline exceeded")]
    DeadlineExceeded,

    /// The caller canceled the context.
    #[error("Call canceled")]
    Canceled,

    /// The request or response did not fit the codec.
    #[error(transparent)]
    InvalidMessage(#[from] CodecError),

    /// Every attempt failed with a retryable error.
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last: TransportError,
    },

    /// An attempt failed with a non-retryable error.
    #[error(transparent)]
    Terminal(TransportError),

    /// The registry failed for a reason other than a missing service.
    #[error("Registry lookup for {service} failed ({kind}): {message}")]
    Registry {
        /// Service being looked up
        service: String,
        /// Kind reported by the registry
        kind: RegistryErrorKind,
        /// Registry error message
        message: String,
    },

    /// A stream could not be set up.
    #[error("Stream setup failed: {0}")]
    Stream(StreamError),
}

impl From<SelectError> for ClientError {
    fn from(error: SelectError) -> Self {
        match error {
            SelectError::NotFound(service) => Self::NotFound(service),
            SelectError::NoAvailableNodes(service) => Self::NoAvailableNodes(service),
            SelectError::Registry {
                service,
                kind,
                message,
            } => Self::Registry {
                service,
                kind,
                message,
            },
        }
    }
}

impl From<Done> for ClientError {
    fn from(done: Done) -> Self {
        match done {
            Done::Canceled => Self::Canceled,
            Done::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl From<StreamError> for ClientError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Codec(e) => Self::InvalidMessage(e),
            other => Self::Stream(other),
        }
    }
}
