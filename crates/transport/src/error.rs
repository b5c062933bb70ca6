//! Error types for transports

use thiserror::Error;

/// Transport-level errors
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// Could not reach the remote node
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection or stream was closed by the peer
    #[error("Connection closed")]
    ConnectionClosed,

    /// The operation did not complete before the context deadline
    #[error("Operation timed out")]
    Timeout,

    /// The remote node is reachable but not serving the request right now
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The message exceeds the configured size limit
    #[error("Message of {size} bytes exceeds maximum {max}")]
    MessageTooLarge {
        /// Size of the message
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// The remote handler returned a non-retryable application error
    #[error("Application error {code}: {message}")]
    Application {
        /// Application-defined status code
        code: u16,
        /// Human-readable description
        message: String,
    },

    /// The caller canceled the context
    #[error("Operation canceled")]
    Canceled,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether another attempt, possibly against a different node, may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::ConnectionClosed
                | Self::Timeout
                | Self::Unavailable(_)
        )
    }
}
