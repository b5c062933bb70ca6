//! Well-known header keys carried on transport messages

/// Target service name
pub const SERVICE: &str = "Courier-Service";

/// Target endpoint within the service
pub const ENDPOINT: &str = "Courier-Endpoint";

/// Topic of an event delivered over the transport
pub const TOPIC: &str = "Courier-Topic";

/// Request identifier
pub const ID: &str = "Courier-Id";

/// Payload encoding of the body
pub const CONTENT_TYPE: &str = "Content-Type";
