//! Per-channel error stacks. Each "safe" conversion channel (safe string,
//! safe file, template validation) keeps the diagnostics of its most recent
//! call, readable by reverse index: 0 is the newest entry, `count() - 1`
//! the oldest. The stack is cleared and rebuilt at the start of every call
//! that owns the channel.

use std::sync::Mutex;

use super::lock::mutex_lock;

const SURFACE: &str = "error stack";

#[derive(Debug, Default)]
pub struct ErrorStack {
    entries: Mutex<Vec<String>>,
}

impl ErrorStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the stack for a new top-level call.
    pub fn begin(&self) {
        mutex_lock(&self.entries, SURFACE).clear();
    }

    pub fn push(&self, entry: impl Into<String>) {
        mutex_lock(&self.entries, SURFACE).push(entry.into());
    }

    /// Entry at `reverse_index` positions from the newest. Out-of-range
    /// access returns `None`, never a stale value.
    pub fn get(&self, reverse_index: usize) -> Option<String> {
        let entries = mutex_lock(&self.entries, SURFACE);
        entries
            .len()
            .checked_sub(reverse_index + 1)
            .map(|index| entries[index].clone())
    }

    pub fn count(&self) -> usize {
        mutex_lock(&self.entries, SURFACE).len()
    }

    /// Replace the whole stack with the errors of a finished call.
    pub fn replace(&self, entries: &[String]) {
        let mut guard = mutex_lock(&self.entries, SURFACE);
        guard.clear();
        guard.extend_from_slice(entries);
    }
}
