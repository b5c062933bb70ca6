//! Event delivery for subscriber-style handlers.
//!
//! Broker deliveries and point-to-point transport messages reach handlers in the
//! same [`Event`] shape. [`TransportEvent`] adapts one inbound transport message;
//! it cannot be acknowledged in any meaningful way, so delivery through it is
//! fire-and-forget with no redelivery. [`Dispatcher`] routes events to the
//! [`SubscriptionHandler`] registered for their topic.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Routes events to subscription handlers by topic.
pub mod dispatcher;

/// Errors for events and dispatch.
pub mod error;

/// The event envelope and the `Event` trait.
pub mod event;

/// Subscription handlers process event payloads.
pub mod subscription_handler;

/// Adapter from transport messages to events.
pub mod transport_event;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, EventError};
pub use event::{Event, EventMessage};
pub use subscription_handler::{SubscriptionHandler, SubscriptionHandlerError};
pub use transport_event::TransportEvent;
