use std::collections::HashMap;

use bytes::Bytes;

use crate::EventError;

/// Header map and body of one event.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EventMessage {
    /// Header map
    pub header: HashMap<String, String>,
    /// Payload
    pub body: Bytes,
}

/// An event as seen by dispatch code, whatever delivered it.
pub trait Event: Send + Sync {
    /// Routing topic; empty when the event carries none.
    fn topic(&self) -> &str;

    /// Header and body.
    fn message(&self) -> &EventMessage;

    /// Acknowledge delivery.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Ack`] if the delivery system rejects the acknowledgment.
    fn ack(&self) -> Result<(), EventError>;

    /// Error the event arrived with, if any.
    fn error(&self) -> Option<&EventError>;
}
