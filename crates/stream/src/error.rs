use courier_codec::CodecError;
use courier_transport::TransportError;
use thiserror::Error;

/// Errors returned by a [`StreamSession`](crate::StreamSession).
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StreamError {
    /// The underlying duplex stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A value could not be encoded or a message could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The session was already closed.
    #[error("Stream session closed")]
    Closed,
}
