use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for subscription handler errors
pub trait SubscriptionHandlerError: Error + Send + Sync + 'static {}

/// A handler for events published on one topic.
#[async_trait]
pub trait SubscriptionHandler
where
    Self: Send + Sync + 'static,
{
    /// The error type for the handler.
    type Error: SubscriptionHandlerError;

    /// Handles the given payload.
    async fn handle(
        &self,
        topic: String,
        data: Bytes,
        headers: Option<HashMap<String, String>>,
    ) -> Result<(), Self::Error>;
}
