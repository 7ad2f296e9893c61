// Event id generation
//
// Ids are a fixed prefix followed by a millisecond timestamp. There is no
// central allocator; within one process the generator never hands out the
// same number twice, even for creates in the same millisecond.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;

/// Time-based event id generator
pub struct EventIdGenerator {
    prefix: String,
    clock: Arc<dyn Clock>,
    last: AtomicI64,
}

impl EventIdGenerator {
    pub fn new(prefix: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            prefix: prefix.into(),
            clock,
            last: AtomicI64::new(0),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Next id: prefix + max(now in millis, previous + 1)
    pub fn next_id(&self) -> String {
        let now = self.clock.now().timestamp_millis();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(previous + 1);
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("{}{}", self.prefix, candidate),
                Err(actual) => previous = actual,
            }
        }
    }
}

impl std::fmt::Debug for EventIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIdGenerator")
            .field("prefix", &self.prefix)
            .field("last", &self.last.load(Ordering::Relaxed))
            .finish()
    }
}
