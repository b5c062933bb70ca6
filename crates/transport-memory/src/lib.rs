//! In-memory transport implementation for testing
//!
//! This transport routes calls to handlers registered by address within the same
//! process, perfect for testing and development scenarios.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod stream;

pub use stream::MemoryStream;

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use courier_registry::Node;
use courier_transport::{Config, Context, Done, Message, Transport, TransportError};
use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::{debug, info};

type UnaryHandler = Arc<
    dyn Fn(Context, Message) -> BoxFuture<'static, Result<Message, TransportError>> + Send + Sync,
>;

type StreamHandler = Arc<dyn Fn(Context, MemoryStream) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handlers served at one address
#[derive(Clone, Default)]
struct Endpoint {
    unary: Option<UnaryHandler>,
    stream: Option<StreamHandler>,
}

/// Memory transport implementation
///
/// Clones share the same address table, so servers registered through one handle
/// are reachable through every other.
#[derive(Clone)]
pub struct MemoryTransport {
    config: Config,
    endpoints: Arc<DashMap<String, Endpoint>>,
}

impl MemoryTransport {
    /// Create a new memory transport with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            endpoints: Arc::new(DashMap::new()),
        }
    }

    /// Create a new memory transport with default configuration
    pub fn new_default() -> Self {
        Self::new(Config::default())
    }

    /// Serve unary calls at `address`
    pub fn serve<F, Fut>(&self, address: impl Into<String>, handler: F)
    where
        F: Fn(Context, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Message, TransportError>> + Send + 'static,
    {
        let address = address.into();
        let handler: UnaryHandler = Arc::new(move |ctx, message| Box::pin(handler(ctx, message)));

        self.endpoints.entry(address.clone()).or_default().unary = Some(handler);
        info!("Serving unary calls at {}", address);
    }

    /// Serve streams at `address`; each accepted stream runs on its own task
    pub fn serve_stream<F, Fut>(&self, address: impl Into<String>, handler: F)
    where
        F: Fn(Context, MemoryStream) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let address = address.into();
        let handler: StreamHandler = Arc::new(move |ctx, stream| Box::pin(handler(ctx, stream)));

        self.endpoints.entry(address.clone()).or_default().stream = Some(handler);
        info!("Serving streams at {}", address);
    }

    /// Stop serving `address`; later calls fail with `ConnectionFailed`
    pub fn shutdown(&self, address: &str) {
        if self.endpoints.remove(address).is_some() {
            info!("Stopped serving {}", address);
        }
    }

    fn endpoint(&self, address: &str) -> Result<Endpoint, TransportError> {
        self.endpoints
            .get(address)
            .map(|endpoint| endpoint.clone())
            .ok_or_else(|| TransportError::ConnectionFailed(format!("No listener at {address}")))
    }

    fn check_size(&self, message: &Message) -> Result<(), TransportError> {
        let size = message.len();
        if size > self.config.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size,
                max: self.config.max_message_size,
            });
        }
        Ok(())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new_default()
    }
}

impl Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("config", &self.config)
            .field("endpoints", &self.endpoints.len())
            .finish()
    }
}

const fn done_error(done: Done) -> TransportError {
    match done {
        Done::Canceled => TransportError::Canceled,
        Done::DeadlineExceeded => TransportError::Timeout,
    }
}

/// Server-side context: the inbound header plus the caller's deadline
fn server_context(ctx: &Context, header: &HashMap<String, String>) -> Context {
    let server_ctx = Context::from_header(header);
    match ctx.deadline() {
        Some(deadline) => server_ctx.with_deadline(deadline),
        None => server_ctx,
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    type Stream = MemoryStream;

    async fn invoke(
        &self,
        ctx: &Context,
        node: &Node,
        request: Message,
    ) -> Result<Message, TransportError> {
        if let Some(done) = ctx.err() {
            return Err(done_error(done));
        }

        self.check_size(&request)?;

        let handler = self.endpoint(node.address())?.unary.ok_or_else(|| {
            TransportError::Unavailable(format!("{} does not serve unary calls", node.address()))
        })?;

        debug!(
            "Invoking {} with {} byte request",
            node,
            request.body.len()
        );

        let server_ctx = server_context(ctx, &request.header);
        let response = tokio::select! {
            biased;
            done = ctx.done() => return Err(done_error(done)),
            response = handler(server_ctx, request) => response?,
        };

        self.check_size(&response)?;
        Ok(response)
    }

    async fn open_stream(
        &self,
        ctx: &Context,
        node: &Node,
        header: HashMap<String, String>,
    ) -> Result<Self::Stream, TransportError> {
        if let Some(done) = ctx.err() {
            return Err(done_error(done));
        }

        let handler = self.endpoint(node.address())?.stream.ok_or_else(|| {
            TransportError::Unavailable(format!("{} does not serve streams", node.address()))
        })?;

        let (client, server) =
            MemoryStream::pair(self.config.stream_buffer_size, self.config.max_message_size);

        debug!("Opened memory stream {} to {}", client.id(), node);

        let server_ctx = server_context(ctx, &header);
        tokio::spawn(handler(server_ctx, server));

        Ok(client)
    }
}
