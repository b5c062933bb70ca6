use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

/// Round-robin counters keyed by service name.
///
/// Counters are created on first use and never reset. Each selection takes the
/// next value with one atomic increment, so concurrent callers never see the
/// same slot twice or skip one.
#[derive(Debug, Default)]
pub struct SelectorState {
    counters: DashMap<String, AtomicUsize>,
}

impl SelectorState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next index in `0..len` for `service`; `None` when `len` is zero.
    pub fn next_index(&self, service: &str, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        if let Some(counter) = self.counters.get(service) {
            return Some(counter.fetch_add(1, Ordering::Relaxed) % len);
        }

        let counter = self.counters.entry(service.to_string()).or_default();
        Some(counter.fetch_add(1, Ordering::Relaxed) % len)
    }
}
