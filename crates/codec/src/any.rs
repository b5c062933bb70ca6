//! Codec chosen at runtime from a content type.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::{CborCodec, Codec, CodecError, JsonCodec};

/// One of the built-in codecs, picked from a `Content-Type` header.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AnyCodec {
    /// `application/json`
    #[default]
    Json,
    /// `application/cbor`
    Cbor,
}

impl AnyCodec {
    /// Resolve a codec from a content type, ignoring parameters such as `charset`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedContentType`] for unknown media types.
    pub fn from_content_type(content_type: &str) -> Result<Self, CodecError> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "application/json" => Ok(Self::Json),
            "application/cbor" => Ok(Self::Cbor),
            _ => Err(CodecError::UnsupportedContentType(content_type.to_string())),
        }
    }
}

impl Codec for AnyCodec {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, CodecError> {
        match self {
            Self::Json => JsonCodec.marshal(value),
            Self::Cbor => CborCodec.marshal(value),
        }
    }

    fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        match self {
            Self::Json => JsonCodec.unmarshal(data),
            Self::Cbor => CborCodec.unmarshal(data),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Json => JsonCodec.name(),
            Self::Cbor => CborCodec.name(),
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            Self::Json => JsonCodec.content_type(),
            Self::Cbor => CborCodec.content_type(),
        }
    }
}
