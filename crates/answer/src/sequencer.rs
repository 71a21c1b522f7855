//! Request numbering for log correlation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing request ids, starting at 1.
///
/// Safe to share between concurrent requests; no two callers ever see the
/// same id.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    counter: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}
