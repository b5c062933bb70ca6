//! Call context: cancellation, deadline, and propagated metadata

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context finished
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Done {
    /// The context, or one of its parents, was canceled
    Canceled,
    /// The deadline passed
    DeadlineExceeded,
}

impl fmt::Display for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(f, "context canceled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Request-scoped context shared by every attempt of one logical call.
///
/// Cloning a context shares its cancellation; [`Context::child`] derives a context
/// that is canceled with its parent but can also be canceled on its own.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    metadata: Arc<HashMap<String, String>>,
}

impl Context {
    /// Create a fresh context with no deadline and no metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a context on the receiving side from an inbound header map
    pub fn from_header(header: &HashMap<String, String>) -> Self {
        Self {
            metadata: Arc::new(header.clone()),
            ..Self::default()
        }
    }

    /// Add a metadata entry that is propagated with outgoing requests
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.metadata).insert(key.into(), value.into());
        self
    }

    /// Set the deadline to `timeout` from now, keeping any earlier deadline.
    ///
    /// A timeout too large to represent leaves the deadline unchanged.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Set the deadline, keeping any earlier deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(
            self.deadline
                .map_or(deadline, |existing| existing.min(deadline)),
        );
        self
    }

    /// Derive a child context that is canceled when this one is
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            metadata: Arc::clone(&self.metadata),
        }
    }

    /// Propagated metadata
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Look up one metadata value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// The deadline, if any
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and all of its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context has been canceled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Current state: `None` while the context is still live
    pub fn err(&self) -> Option<Done> {
        if self.token.is_cancelled() {
            return Some(Done::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(Done::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is canceled or its deadline passes
    pub async fn done(&self) -> Done {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => Done::Canceled,
                    () = tokio::time::sleep_until(deadline) => Done::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                Done::Canceled
            }
        }
    }
}
