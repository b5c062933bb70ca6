use std::sync::atomic::{AtomicBool, Ordering};

use courier_codec::Codec;
use courier_transport::{Context, DuplexStream, Message, TransportError, headers};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{ErrorLatch, SessionRequest, StreamError};

/// A duplex stream bound to one streaming call.
///
/// One task may `send` while another `recv`s on the same session. Concurrent
/// `send` calls against each other are not supported.
#[derive(Debug)]
pub struct StreamSession<S, C> {
    stream: S,
    request: SessionRequest<C>,
    error: ErrorLatch<StreamError>,
    closed: AtomicBool,
}

impl<S, C> StreamSession<S, C>
where
    S: DuplexStream,
    C: Codec,
{
    /// Wrap `stream` for a call to `service`/`endpoint`, snapshotting `ctx` metadata.
    pub fn new(
        service: impl Into<String>,
        endpoint: impl Into<String>,
        ctx: &Context,
        stream: S,
        codec: C,
    ) -> Self {
        Self {
            stream,
            request: SessionRequest::new(
                service.into(),
                endpoint.into(),
                ctx.metadata().clone(),
                codec,
            ),
            error: ErrorLatch::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Wrap an accepted server-side stream; service and endpoint come from the routing headers.
    pub fn accept(ctx: &Context, stream: S, codec: C) -> Self {
        let service = ctx.get(headers::SERVICE).unwrap_or_default().to_string();
        let endpoint = ctx.get(headers::ENDPOINT).unwrap_or_default().to_string();
        Self::new(service, endpoint, ctx, stream, codec)
    }

    /// The request view.
    pub const fn request(&self) -> &SessionRequest<C> {
        &self.request
    }

    /// Encode `value` and send it to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] after [`close`](Self::close), a codec error
    /// if `value` cannot be encoded, or the transport error (which is also latched).
    pub async fn send<T>(&self, value: &T) -> Result<(), StreamError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.ensure_open()?;
        let body = self.request.codec().marshal(value)?;
        self.send_message(Message::new(body)).await
    }

    /// Send an already-encoded message to the peer.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), without the codec step.
    pub async fn send_message(&self, message: Message) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.stream
            .send(message)
            .await
            .map_err(|e| self.record(e))
    }

    /// Receive and decode the next value. `Ok(None)` is a clean end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] after [`close`](Self::close), a codec error
    /// if the message does not decode into `T`, or the transport error (which is
    /// also latched).
    pub async fn recv<T: DeserializeOwned>(&self) -> Result<Option<T>, StreamError> {
        match self.recv_message().await? {
            Some(message) => Ok(Some(self.request.codec().unmarshal(&message.body)?)),
            None => Ok(None),
        }
    }

    /// Receive the next raw message. `Ok(None)` is a clean end of stream.
    ///
    /// # Errors
    ///
    /// Same as [`recv`](Self::recv), without the codec step.
    pub async fn recv_message(&self) -> Result<Option<Message>, StreamError> {
        self.ensure_open()?;
        self.stream.recv().await.map_err(|e| self.record(e))
    }

    /// Release the underlying stream. Closing twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the stream fails to close.
    pub async fn close(&self) -> Result<(), StreamError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!(
            service = %self.request.service(),
            endpoint = %self.request.endpoint(),
            "Closing stream session"
        );
        self.stream.close().await.map_err(StreamError::Transport)
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The first transport error seen by `send` or `recv`, if any.
    pub fn error(&self) -> Option<StreamError> {
        self.error.get().cloned()
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.is_closed() {
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    fn record(&self, error: TransportError) -> StreamError {
        let error = StreamError::Transport(error);
        if self.error.latch(error.clone()) {
            debug!(
                service = %self.request.service(),
                endpoint = %self.request.endpoint(),
                "Stream session failed: {}",
                error
            );
        }
        error
    }
}
