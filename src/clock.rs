//! Logical clock for timestamp assignment.
//!
//! Wall clocks are not guaranteed monotonic, and matching priority never
//! depends on time anyway; a process-wide counter gives strictly increasing,
//! thread-safe ticks for `created_at` / `updated_at` / `executed_at`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Strictly increasing tick source shared by an engine and its books.
#[derive(Debug, Default)]
pub struct LogicalClock {
    ticks: AtomicU64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }

    /// Returns the next tick. Every call observes a value greater than any
    /// previously returned one, across threads.
    pub fn tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }
}
