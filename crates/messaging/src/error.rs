use std::error::Error;

use thiserror::Error;

/// Errors carried by or raised from an event.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EventError {
    /// The event arrived in a failed state.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Acknowledging the event failed.
    #[error("Ack failed: {0}")]
    Ack(String),
}

/// Errors returned by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event carries no topic.
    #[error("Event has no topic")]
    Unroutable,

    /// Nothing is subscribed to the topic.
    #[error("No subscriber for topic {0}")]
    NoSubscriber(String),

    /// The event carried an error instead of a deliverable payload.
    #[error(transparent)]
    Event(#[from] EventError),

    /// The subscription handler failed.
    #[error("Handler for topic {topic} failed: {source}")]
    Handler {
        /// Topic the handler is subscribed to.
        topic: String,
        /// Handler error.
        source: Box<dyn Error + Send + Sync>,
    },
}
