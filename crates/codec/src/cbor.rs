//! CBOR codec implementation for serialization.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Codec, CodecError};

/// CBOR payloads via `ciborium`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, CodecError> {
        let mut vec = Vec::new();
        ciborium::ser::into_writer(value, &mut vec)
            .map_err(|e| CodecError::invalid(self.name(), e))?;
        Ok(Bytes::from(vec))
    }

    fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        ciborium::de::from_reader(data).map_err(|e| CodecError::invalid(self.name(), e))
    }

    fn name(&self) -> &'static str {
        "cbor"
    }

    fn content_type(&self) -> &'static str {
        "application/cbor"
    }
}
