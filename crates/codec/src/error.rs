//! Codec errors.

use thiserror::Error;

/// Codec-related errors.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CodecError {
    /// The value's shape is incompatible with the codec.
    #[error("Invalid message for {codec} codec: {reason}")]
    InvalidMessage {
        /// Codec that rejected the value.
        codec: &'static str,
        /// Underlying serializer or deserializer message.
        reason: String,
    },

    /// No codec is registered for the content type.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

impl CodecError {
    pub(crate) fn invalid(codec: &'static str, reason: impl ToString) -> Self {
        Self::InvalidMessage {
            codec,
            reason: reason.to_string(),
        }
    }
}
