use std::sync::atomic::{AtomicU64, Ordering};

/// Iteration tally shared by every worker of a run.
///
/// Only supports adding and reading, so the value never decreases and no lock is needed.
#[derive(Debug, Default)]
pub struct IterationCounter {
    value: AtomicU64,
}

impl IterationCounter {
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn add(&self, iterations: u64) {
        self.value.fetch_add(iterations, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
