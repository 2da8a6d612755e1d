//! # Task id allocation.
//!
//! [`TaskIdGenerator`] hands out strictly increasing ids. The read-modify-write
//! is a single atomic `fetch_add`, so concurrent producers never observe the
//! same value.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier assigned to a task at submission.
pub type TaskId = u64;

/// Monotonic, thread-safe id counter.
///
/// Starts at 0; the first id handed out is 1.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    last: AtomicU64,
}

impl TaskIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id.
    #[inline]
    pub fn next(&self) -> TaskId {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last id handed out (`0` if none yet).
    #[inline]
    pub fn last(&self) -> TaskId {
        self.last.load(Ordering::Relaxed)
    }
}
