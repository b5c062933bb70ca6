//! Call execution for Courier clients.
//!
//! A [`Client`] turns one logical request into attempts against concrete nodes:
//! - [`Selector`] resolves a service through the registry and picks a node with a
//!   [`Strategy`], skipping nodes removed by [`SelectFilter`]s
//! - [`Backoff`] decides how long to wait between attempts
//! - the retry loop classifies transport failures as retryable or terminal and
//!   shares one deadline across every attempt
//!
//! Streaming calls are set up once, never retried, and handed back as a
//! [`StreamSession`](courier_stream::StreamSession).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod backoff;
mod client;
mod error;
mod options;
mod request;
mod selector;

pub use backoff::Backoff;
pub use client::Client;
pub use error::{ClientError, SelectError};
pub use options::{CallOptions, ClientConfig};
pub use request::Request;
pub use selector::{
    FailedNodes, SelectFilter, SelectOptions, Selector, SelectorState, Strategy, StrategyKind,
};
