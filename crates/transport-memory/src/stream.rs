//! In-memory duplex stream

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use courier_transport::{DuplexStream, Message, TransportError};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

type Frame = Result<Message, TransportError>;

/// One end of an in-memory duplex stream
pub struct MemoryStream {
    id: Uuid,
    sender: Mutex<Option<flume::Sender<Frame>>>,
    receiver: flume::Receiver<Frame>,
    closed: AtomicBool,
    max_message_size: usize,
}

impl MemoryStream {
    /// Create two connected ends sharing one stream ID
    pub(crate) fn pair(buffer: usize, max_message_size: usize) -> (Self, Self) {
        let (a_tx, a_rx) = flume::bounded(buffer);
        let (b_tx, b_rx) = flume::bounded(buffer);
        let id = Uuid::new_v4();

        let client = Self::new(id, a_tx, b_rx, max_message_size);
        let server = Self::new(id, b_tx, a_rx, max_message_size);
        (client, server)
    }

    fn new(
        id: Uuid,
        sender: flume::Sender<Frame>,
        receiver: flume::Receiver<Frame>,
        max_message_size: usize,
    ) -> Self {
        Self {
            id,
            sender: Mutex::new(Some(sender)),
            receiver,
            closed: AtomicBool::new(false),
            max_message_size,
        }
    }

    /// Stream ID shared by both ends
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Fail the stream: the peer's next receive returns `error`, then the stream closes
    pub async fn reset(&self, error: TransportError) {
        let sender = self.sender.lock().take();
        if let Some(sender) = sender {
            debug!("Resetting memory stream {}: {}", self.id, error);
            let _ = sender.send_async(Err(error)).await;
        }
        self.closed.store(true, Ordering::Release);
    }
}

impl Debug for MemoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStream")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

#[async_trait]
impl DuplexStream for MemoryStream {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed);
        }

        let size = message.len();
        if size > self.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size,
                max: self.max_message_size,
            });
        }

        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or(TransportError::ConnectionClosed)?;

        sender
            .send_async(Ok(message))
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn recv(&self) -> Result<Option<Message>, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed);
        }

        match self.receiver.recv_async().await {
            Ok(frame) => frame.map(Some),
            // Every sender on the peer side is gone: clean end of stream
            Err(_) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Closing memory stream {}", self.id);
        }
        self.sender.lock().take();
        Ok(())
    }
}
