//! The call engine.

use std::collections::HashMap;
use std::time::Duration;

use courier_codec::{Codec, JsonCodec};
use courier_registry::{Node, Registry};
use courier_stream::StreamSession;
use courier_transport::{Context, Message, Transport, headers};
use serde::{Serialize, de::DeserializeOwned};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    CallOptions, ClientConfig, ClientError, FailedNodes, Request, SelectError, SelectOptions,
    Selector,
};

/// One try of a call against one node.
struct Attempt {
    index: u32,
    node: Node,
    started_at: Instant,
}

impl Attempt {
    fn start(index: u32, node: Node) -> Self {
        Self {
            index,
            node,
            started_at: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Executes calls against a service through a registry, transport, and codec.
#[derive(Clone, Debug)]
pub struct Client<R, T, C = JsonCodec> {
    selector: Selector<R>,
    transport: T,
    codec: C,
    config: ClientConfig,
}

impl<R, T, C> Client<R, T, C>
where
    R: Registry,
    T: Transport,
    C: Codec,
{
    /// Create a client with the default [`ClientConfig`].
    pub fn new(registry: R, transport: T, codec: C) -> Self {
        Self::with_config(registry, transport, codec, ClientConfig::default())
    }

    /// Create a client with `config` as the source of default call options.
    pub fn with_config(registry: R, transport: T, codec: C, config: ClientConfig) -> Self {
        Self::with_selector(Selector::new(registry), transport, codec, config)
    }

    /// Create a client around an existing selector.
    pub const fn with_selector(
        selector: Selector<R>,
        transport: T,
        codec: C,
        config: ClientConfig,
    ) -> Self {
        Self {
            selector,
            transport,
            codec,
            config,
        }
    }

    /// The selector.
    pub const fn selector(&self) -> &Selector<R> {
        &self.selector
    }

    /// The transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The client configuration.
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call options built from the client configuration.
    pub fn default_options(&self) -> CallOptions {
        CallOptions::from(&self.config)
    }

    /// Execute a unary call, retrying retryable failures within the shared deadline.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Canceled`] / [`ClientError::DeadlineExceeded`] when `ctx` or
    ///   the call timeout ends the call, including during a backoff wait that would
    ///   run past the deadline
    /// - [`ClientError::NotFound`], [`ClientError::NoAvailableNodes`],
    ///   [`ClientError::Registry`] from selection, without retrying
    /// - [`ClientError::InvalidMessage`] if the request or response does not fit the codec
    /// - [`ClientError::Terminal`] for a non-retryable transport error
    /// - [`ClientError::RetriesExhausted`] with the last error once the retry budget is spent
    #[instrument(
        skip(self, ctx, request, options),
        fields(service = %request.service(), endpoint = %request.endpoint())
    )]
    pub async fn call<Req, Resp>(
        &self,
        ctx: &Context,
        request: &Request<Req>,
        options: &CallOptions,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let ctx = call_context(ctx, options.call_timeout);
        let body = self.codec.marshal(request.body())?;
        let header = self.request_header(&ctx, request);
        let mut failed = FailedNodes::new();
        let mut index = 0;

        loop {
            if let Some(done) = ctx.err() {
                debug!(attempt = index, "Call ended before attempt: {}", done);
                return Err(done.into());
            }

            let node = self
                .select_node(&ctx, request.service(), &options.select, &failed)
                .await?;
            let attempt = Attempt::start(index, node);
            debug!(attempt = attempt.index, node = %attempt.node, "Invoking");

            let message = Message {
                header: header.clone(),
                body: body.clone(),
            };

            let error = match self.transport.invoke(&ctx.child(), &attempt.node, message).await {
                Ok(response) => {
                    if attempt.index > 0 {
                        debug!(attempts = attempt.index + 1, "Call succeeded after retry");
                    }
                    return Ok(self.codec.unmarshal(&response.body)?);
                }
                Err(error) => error,
            };

            if let Some(done) = ctx.err() {
                debug!(attempt = attempt.index, "Call ended during attempt: {}", done);
                return Err(done.into());
            }

            if !error.is_retryable() {
                warn!(
                    attempt = attempt.index,
                    node = %attempt.node,
                    error = %error,
                    "Attempt failed with terminal error"
                );
                return Err(ClientError::Terminal(error));
            }

            if attempt.index >= options.max_retries {
                warn!(
                    attempts = attempt.index.saturating_add(1),
                    error = %error,
                    "Call failed after maximum retries"
                );
                return Err(ClientError::RetriesExhausted {
                    attempts: attempt.index.saturating_add(1),
                    last: error,
                });
            }

            warn!(
                attempt = attempt.index,
                node = %attempt.node,
                elapsed = ?attempt.elapsed(),
                error = %error,
                "Attempt failed, retrying"
            );
            failed.mark(&attempt.node, &error);

            backoff(&ctx, options.backoff.delay(attempt.index)).await?;
            index += 1;
        }
    }

    /// Open a streaming call and send `request`'s body as the first message.
    ///
    /// One node is selected and the stream is never retried. No session is
    /// returned if any step fails.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Canceled`] / [`ClientError::DeadlineExceeded`] if `ctx` ends first
    /// - selection errors as for [`call`](Self::call)
    /// - [`ClientError::InvalidMessage`] if the body does not fit the codec
    /// - [`ClientError::Stream`] if the stream cannot be opened or the first send fails
    #[instrument(
        skip(self, ctx, request, options),
        fields(service = %request.service(), endpoint = %request.endpoint())
    )]
    pub async fn stream<Req>(
        &self,
        ctx: &Context,
        request: &Request<Req>,
        options: &CallOptions,
    ) -> Result<StreamSession<T::Stream, C>, ClientError>
    where
        Req: Serialize + Sync,
    {
        let call_ctx = call_context(ctx, options.call_timeout);
        if let Some(done) = call_ctx.err() {
            return Err(done.into());
        }

        let body = self.codec.marshal(request.body())?;
        let node = self
            .select_node(&call_ctx, request.service(), &options.select, &FailedNodes::new())
            .await?;
        debug!(node = %node, "Opening stream");

        let header = self.request_header(&call_ctx, request);
        // Only setup is bounded by the call timeout; the stream lives on the caller's context
        let opened = tokio::select! {
            biased;
            done = call_ctx.done() => return Err(done.into()),
            opened = self.transport.open_stream(ctx, &node, header) => opened,
        };
        let stream = match opened {
            Ok(stream) => stream,
            Err(error) => {
                if let Some(done) = call_ctx.err() {
                    return Err(done.into());
                }
                warn!(node = %node, error = %error, "Failed to open stream");
                return Err(ClientError::Stream(error.into()));
            }
        };

        let session = StreamSession::new(
            request.service(),
            request.endpoint(),
            ctx,
            stream,
            self.codec.clone(),
        );

        if let Err(error) = session.send_message(Message::new(body)).await {
            warn!(node = %node, error = %error, "Failed to send stream request");
            let _ = session.close().await;
            return Err(error.into());
        }

        Ok(session)
    }

    /// Select a node, preferring ones that have not failed in this call.
    async fn select_node(
        &self,
        ctx: &Context,
        service: &str,
        options: &SelectOptions,
        failed: &FailedNodes,
    ) -> Result<Node, ClientError> {
        let selection = async {
            if failed.is_empty() {
                return self.selector.select(service, options).await;
            }

            let excluding = options.clone().with_filter(failed.filter());
            match self.selector.select(service, &excluding).await {
                Err(SelectError::NoAvailableNodes(_)) => {
                    debug!(
                        failed = failed.len(),
                        "Every candidate failed earlier in this call, selecting without exclusion"
                    );
                    self.selector.select(service, options).await
                }
                result => result,
            }
        };

        tokio::select! {
            biased;
            done = ctx.done() => Err(done.into()),
            result = selection => result.map_err(Into::into),
        }
    }

    /// Context metadata, with this call's routing headers, codec, and ID written over it.
    fn request_header<B>(&self, ctx: &Context, request: &Request<B>) -> HashMap<String, String> {
        let mut header = ctx.metadata().clone();
        header.extend([
            (headers::SERVICE.to_string(), request.service().to_string()),
            (headers::ENDPOINT.to_string(), request.endpoint().to_string()),
            (
                headers::CONTENT_TYPE.to_string(),
                self.codec.content_type().to_string(),
            ),
            (headers::ID.to_string(), Uuid::new_v4().to_string()),
        ]);
        header
    }
}

fn call_context(ctx: &Context, timeout: Option<Duration>) -> Context {
    let ctx = ctx.child();
    match timeout {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx,
    }
}

/// Wait `delay`, failing early if the wait would outlive the deadline.
async fn backoff(ctx: &Context, delay: Duration) -> Result<(), ClientError> {
    if ctx
        .deadline()
        .is_some_and(|deadline| deadline.saturating_duration_since(Instant::now()) < delay)
    {
        debug!(delay = ?delay, "Backoff would pass the call deadline");
        return Err(ClientError::DeadlineExceeded);
    }

    if delay.is_zero() {
        return Ok(());
    }

    debug!(delay = ?delay, "Backing off");
    tokio::select! {
        biased;
        done = ctx.done() => Err(done.into()),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
