//! Generic transport abstraction for RPC calls
//!
//! This crate provides a transport-agnostic interface used by the call engine.
//! Specific transport implementations (in-memory, TCP, ...) are provided in separate crates.
//!
//! Transports handle:
//! - Delivering one encoded request to a node and returning its encoded response
//! - Opening duplex streams for streaming calls
//! - Honoring the caller's `Context` (cancellation and deadline) while I/O is in flight

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod context;
pub mod error;
pub mod headers;
pub mod message;

use std::collections::HashMap;

use async_trait::async_trait;
use courier_registry::Node;

pub use context::{Context, Done};
pub use error::TransportError;
pub use message::Message;

pub use error::TransportError as Error;

/// Transport trait for invoking remote nodes
///
/// The engine never force-kills I/O: a transport is expected to stop waiting
/// and return once `ctx` is canceled or its deadline passes.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Duplex stream type produced by [`Transport::open_stream`]
    type Stream: DuplexStream;

    /// Send one encoded request to `node` and wait for the encoded response
    async fn invoke(
        &self,
        ctx: &Context,
        node: &Node,
        request: Message,
    ) -> Result<Message, TransportError>;

    /// Open a duplex stream to `node`; `header` routes the stream on the remote side
    async fn open_stream(
        &self,
        ctx: &Context,
        node: &Node,
        header: HashMap<String, String>,
    ) -> Result<Self::Stream, TransportError>;
}

/// A bidirectional channel of length-delimited messages
///
/// One task may send while another receives; concurrent `send` calls against
/// each other are not supported.
#[async_trait]
pub trait DuplexStream: Send + Sync + 'static {
    /// Send one message to the peer
    async fn send(&self, message: Message) -> Result<(), TransportError>;

    /// Receive the next message; `Ok(None)` means the peer closed the stream cleanly
    async fn recv(&self) -> Result<Option<Message>, TransportError>;

    /// Release the stream
    async fn close(&self) -> Result<(), TransportError>;
}

/// Configuration for transports
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum message size in bytes (header plus body)
    pub max_message_size: usize,
    /// Buffered messages per stream direction
    pub stream_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_message_size: 10 * 1024 * 1024, // 10MB
            stream_buffer_size: 1000,
        }
    }
}
