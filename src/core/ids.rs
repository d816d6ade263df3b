//! Id generation for timetables and their parts.
//!
//! One `IdGenerator` belongs to a `TimetableFactory` and is handed to every
//! timetable it creates, so ids are unique per factory rather than per
//! process. Clones share the same counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    next: Arc<AtomicU64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next raw id, starting at 1.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Next id rendered with a prefix, e.g. `timetable3`.
    pub fn next_named(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id())
    }
}
