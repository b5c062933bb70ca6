use std::sync::OnceLock;

/// Holds the first value written to it; later writes are dropped.
#[derive(Debug)]
pub struct ErrorLatch<E> {
    slot: OnceLock<E>,
}

impl<E> ErrorLatch<E> {
    /// Create an empty latch.
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Store `error` if nothing is latched yet. Returns `true` if this call won.
    pub fn latch(&self, error: E) -> bool {
        self.slot.set(error).is_ok()
    }

    /// The latched error, if any.
    pub fn get(&self) -> Option<&E> {
        self.slot.get()
    }

    /// Whether an error has been latched.
    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<E> Default for ErrorLatch<E> {
    fn default() -> Self {
        Self::new()
    }
}
