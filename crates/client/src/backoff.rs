//! Delay policies applied between attempts of one call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Wait before the next attempt, given the index of the attempt that just failed.
///
/// Index 0 is the wait before the second attempt; nothing waits before the first.
#[derive(Clone)]
pub enum Backoff {
    /// Retry immediately.
    None,

    /// Wait the same duration every time.
    Constant(Duration),

    /// `min(cap, base * 2^attempt)`: non-decreasing and never above `cap`.
    Exponential {
        /// Wait after the first failure
        base: Duration,
        /// Upper bound on any wait
        cap: Duration,
    },

    /// Caller-supplied policy.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Backoff {
    /// Default first wait for [`Backoff::Exponential`]
    pub const DEFAULT_BASE: Duration = Duration::from_millis(100);

    /// Default cap for [`Backoff::Exponential`]
    pub const DEFAULT_CAP: Duration = Duration::from_secs(10);

    /// Exponential backoff with the given base and cap.
    pub const fn exponential(base: Duration, cap: Duration) -> Self {
        Self::Exponential { base, cap }
    }

    /// Wrap a custom policy.
    pub fn custom(policy: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(policy))
    }

    /// Delay after the attempt at index `attempt` failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(delay) => *delay,
            Self::Exponential { base, cap } => {
                if base.is_zero() {
                    return Duration::ZERO;
                }
                // Overflow saturates to the cap
                2u32.checked_pow(attempt)
                    .and_then(|factor| base.checked_mul(factor))
                    .map_or(*cap, |delay| delay.min(*cap))
            }
            Self::Custom(policy) => policy(attempt),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::exponential(Self::DEFAULT_BASE, Self::DEFAULT_CAP)
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Constant(delay) => f.debug_tuple("Constant").field(delay).finish(),
            Self::Exponential { base, cap } => f
                .debug_struct("Exponential")
                .field("base", base)
                .field("cap", cap)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
