use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use courier_transport::Message;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::{DispatchError, Event, SubscriptionHandler, TransportEvent};

#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn call(
        &self,
        topic: String,
        data: Bytes,
        headers: Option<HashMap<String, String>>,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl<H: SubscriptionHandler> ErasedHandler for H {
    async fn call(
        &self,
        topic: String,
        data: Bytes,
        headers: Option<HashMap<String, String>>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.handle(topic, data, headers)
            .await
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
    }
}

/// Routes events to the handler subscribed to their topic.
///
/// One handler per topic; subscribing again replaces the previous handler.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: Arc<DashMap<String, Arc<dyn ErasedHandler>>>,
}

impl Dispatcher {
    /// Create a dispatcher with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `topic`.
    pub fn subscribe<H: SubscriptionHandler>(&self, topic: impl Into<String>, handler: H) {
        let topic = topic.into();
        info!("Subscribed handler to {}", topic);
        self.handlers.insert(topic, Arc::new(handler));
    }

    /// Remove the handler for `topic`. Returns whether one was subscribed.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        let removed = self.handlers.remove(topic).is_some();
        if removed {
            info!("Unsubscribed handler from {}", topic);
        }
        removed
    }

    /// Topics with a subscribed handler.
    pub fn topics(&self) -> Vec<String> {
        self.handlers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Deliver `event` to the handler for its topic, then acknowledge it.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Unroutable`] if the event has an empty topic
    /// - [`DispatchError::NoSubscriber`] if nothing is subscribed to the topic
    /// - [`DispatchError::Event`] if the event carries an error or the ack fails
    /// - [`DispatchError::Handler`] if the handler fails
    pub async fn dispatch<E: Event + ?Sized>(&self, event: &E) -> Result<(), DispatchError> {
        let topic = event.topic();
        if topic.is_empty() {
            warn!("Dropping event without a topic");
            return Err(DispatchError::Unroutable);
        }

        let handler = self
            .handlers
            .get(topic)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DispatchError::NoSubscriber(topic.to_string()))?;

        if let Some(error) = event.error() {
            warn!("Event on {} arrived failed: {}", topic, error);
            return Err(error.clone().into());
        }

        let message = event.message();
        debug!("Dispatching {} byte event to {}", message.body.len(), topic);

        handler
            .call(
                topic.to_string(),
                message.body.clone(),
                Some(message.header.clone()),
            )
            .await
            .map_err(|source| DispatchError::Handler {
                topic: topic.to_string(),
                source,
            })?;

        event.ack()?;
        Ok(())
    }

    /// Wrap an inbound transport message as an event and dispatch it.
    ///
    /// # Errors
    ///
    /// Same as [`dispatch`](Self::dispatch).
    pub async fn dispatch_message(&self, message: Message) -> Result<(), DispatchError> {
        self.dispatch(&TransportEvent::wrap(message)).await
    }
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("topics", &self.topics())
            .finish()
    }
}
