use std::collections::HashMap;

use bytes::Bytes;
use courier_codec::Codec;

/// Read-only view of the request that opened a stream.
///
/// The header is a snapshot of the call context's metadata taken when the
/// session was created.
#[derive(Clone, Debug)]
pub struct SessionRequest<C> {
    service: String,
    endpoint: String,
    header: HashMap<String, String>,
    codec: C,
}

impl<C: Codec> SessionRequest<C> {
    pub(crate) const fn new(
        service: String,
        endpoint: String,
        header: HashMap<String, String>,
        codec: C,
    ) -> Self {
        Self {
            service,
            endpoint,
            header,
            codec,
        }
    }

    /// Target service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Header snapshot.
    pub const fn header(&self) -> &HashMap<String, String> {
        &self.header
    }

    /// Look up one header value.
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.header.get(key).map(String::as_str)
    }

    /// Codec used for the stream's messages.
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Content type of the stream's messages.
    pub fn content_type(&self) -> &'static str {
        self.codec.content_type()
    }

    /// A stream has no flat body; always empty.
    pub const fn read(&self) -> Bytes {
        Bytes::new()
    }
}
