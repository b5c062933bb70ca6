//! Call options and client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Backoff, SelectFilter, SelectOptions, Strategy, StrategyKind};

/// Per-call options.
#[derive(Clone, Debug)]
pub struct CallOptions {
    /// Retries after the first attempt; 0 means exactly one attempt
    pub max_retries: u32,
    /// Wait between attempts
    pub backoff: Backoff,
    /// Deadline shared by every attempt, measured from the start of the call
    pub call_timeout: Option<Duration>,
    /// Node selection
    pub select: SelectOptions,
}

impl CallOptions {
    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Remove the call timeout; only the caller's context bounds the call.
    #[must_use]
    pub fn without_call_timeout(mut self) -> Self {
        self.call_timeout = None;
        self
    }

    /// Set the selection strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.select.strategy = strategy;
        self
    }

    /// Add a selection filter.
    #[must_use]
    pub fn with_filter(mut self, filter: SelectFilter) -> Self {
        self.select.filters.push(filter);
        self
    }

    /// Replace the selection options.
    #[must_use]
    pub fn with_select(mut self, select: SelectOptions) -> Self {
        self.select = select;
        self
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for CallOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Backoff::exponential(config.backoff_base, config.backoff_cap),
            call_timeout: config.call_timeout,
            select: SelectOptions::new().with_strategy(config.strategy.into()),
        }
    }
}

/// Client-wide defaults for [`CallOptions`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Deadline for each call
    pub call_timeout: Option<Duration>,
    /// First wait of the exponential backoff
    pub backoff_base: Duration,
    /// Longest wait of the exponential backoff
    pub backoff_cap: Duration,
    /// Selection strategy
    pub strategy: StrategyKind,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            call_timeout: Some(Duration::from_secs(5)),
            backoff_base: Backoff::DEFAULT_BASE,
            backoff_cap: Backoff::DEFAULT_CAP,
            strategy: StrategyKind::Random,
        }
    }
}
