//! Payload codecs for Courier requests, responses, and stream messages.
//!
//! A codec turns typed values into body bytes and back. Both directions fail with
//! [`CodecError::InvalidMessage`] when the value's shape cannot be represented by
//! the format or the bytes do not describe the requested shape.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod any;
mod cbor;
mod error;
mod json;

pub use any::AnyCodec;
pub use cbor::CborCodec;
pub use error::CodecError;
pub use json::JsonCodec;

use std::fmt::Debug;

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

/// Marshal/unmarshal capability for one payload format.
pub trait Codec: Clone + Debug + Send + Sync + 'static {
    /// Encode a value into body bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidMessage`] if the value cannot be represented.
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, CodecError>;

    /// Decode body bytes into a value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidMessage`] if the bytes do not decode into `T`.
    fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError>;

    /// Short format name, e.g. `json`.
    fn name(&self) -> &'static str;

    /// Value carried in the `Content-Type` header.
    fn content_type(&self) -> &'static str;
}
