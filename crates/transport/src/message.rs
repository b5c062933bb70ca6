//! Transport message envelope

use std::collections::HashMap;

use bytes::Bytes;

/// A message exchanged with a remote node: string headers plus an opaque body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Header map
    pub header: HashMap<String, String>,
    /// Encoded payload
    pub body: Bytes,
}

impl Message {
    /// Create a message with an empty header map
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            header: HashMap::new(),
            body: body.into(),
        }
    }

    /// Set a header, returning the message
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(key.into(), value.into());
        self
    }

    /// Look up a header value
    pub fn header(&self, key: &str) -> Option<&str> {
        self.header.get(key).map(String::as_str)
    }

    /// Size used for message limits
    pub fn len(&self) -> usize {
        self.body.len()
            + self
                .header
                .iter()
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
    }

    /// Whether both header and body are empty
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.header.is_empty()
    }
}
