//! Stream sessions for streaming calls.
//!
//! A [`StreamSession`] exclusively owns one duplex stream for the lifetime of a
//! streaming call. It encodes and decodes values with a codec, exposes a read-only
//! [`SessionRequest`] view for server-side handlers, and latches the first
//! transport error so a handler can tell a clean end of stream from a failure.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod latch;
mod request;
mod session;

pub use error::StreamError;
pub use latch::ErrorLatch;
pub use request::SessionRequest;
pub use session::StreamSession;
