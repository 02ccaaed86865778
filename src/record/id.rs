//! Record id generation
//!
//! Ids are Unix-millisecond timestamps, bumped past the last issued id so
//! two calls in the same millisecond still get distinct values.

use chrono::Utc;
use parking_lot::Mutex;

/// Issues process-unique, time-derived record ids
#[derive(Debug, Default)]
pub struct IdGenerator {
    /// Highest id issued or observed so far
    last: Mutex<i64>,
}

impl IdGenerator {
    /// Create a generator with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new id
    ///
    /// Returns the current time in milliseconds, or `last + 1` when the
    /// clock has not moved past the previous id.
    pub fn generate(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last.lock();
        let id = if now > *last { now } else { *last + 1 };
        *last = id;
        id
    }

    /// Record an id that already exists elsewhere
    ///
    /// Subsequent calls to `generate` return ids strictly greater than it.
    pub fn observe(&self, id: i64) {
        let mut last = self.last.lock();
        if id > *last {
            *last = id;
        }
    }

    /// The highest id issued or observed
    pub fn last_issued(&self) -> i64 {
        *self.last.lock()
    }
}
