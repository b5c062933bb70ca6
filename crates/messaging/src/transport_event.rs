use courier_transport::{Message, headers};

use crate::{Event, EventError, EventMessage};

/// A point-to-point transport message presented as an [`Event`].
///
/// Acknowledging always succeeds and does nothing: the transport has no
/// redelivery, so handlers must not assume at-least-once delivery.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportEvent {
    message: EventMessage,
}

impl TransportEvent {
    /// Wrap `message`, keeping its header and body as they are.
    pub fn wrap(message: Message) -> Self {
        Self {
            message: EventMessage {
                header: message.header,
                body: message.body,
            },
        }
    }

    /// Give back the header and body.
    pub fn into_message(self) -> EventMessage {
        self.message
    }
}

impl From<Message> for TransportEvent {
    fn from(message: Message) -> Self {
        Self::wrap(message)
    }
}

impl Event for TransportEvent {
    fn topic(&self) -> &str {
        self.message
            .header
            .get(headers::TOPIC)
            .map_or("", String::as_str)
    }

    fn message(&self) -> &EventMessage {
        &self.message
    }

    fn ack(&self) -> Result<(), EventError> {
        Ok(())
    }

    fn error(&self) -> Option<&EventError> {
        None
    }
}
