//! Pending callback entries for delay queues
//!
//! Both the deterministic test clock and the real-time timer thread keep their
//! pending work in a `BinaryHeap<ScheduledTask<_>>`. The ordering is reversed so
//! the heap pops the earliest due time first, and ties fall back to the order
//! in which the tasks were scheduled.

use std::cmp::Ordering;
use std::fmt;

/// A one-shot callback handed to a delay scheduler
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A task waiting for its due time
pub struct ScheduledTask<T> {
    /// When to run (milliseconds on a virtual clock, or an `Instant`)
    pub due: T,
    /// Monotonic sequence number, used as the tie-break
    pub seq: u64,
    pub task: Task,
}

impl<T> ScheduledTask<T> {
    pub fn new(due: T, seq: u64, task: Task) -> Self {
        Self { due, seq, task }
    }

    /// Consume the entry and execute its callback
    pub fn run(self) {
        (self.task)()
    }
}

impl<T: fmt::Debug> fmt::Debug for ScheduledTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("due", &self.due)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl<T: Ord> PartialEq for ScheduledTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for ScheduledTask<T> {}

impl<T: Ord> PartialOrd for ScheduledTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for ScheduledTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap behavior (earliest first)
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
