//! Deterministic virtual clock
//!
//! A [`DelayScheduler`] that only moves when told to. Tasks run on the caller's
//! thread inside [`ManualClock::advance`], in due order, with ties broken by
//! the order they were scheduled in.

use super::DelayScheduler;
use crate::types::scheduled_event::{ScheduledTask, Task};
use std::collections::BinaryHeap;
use std::sync::Mutex;

#[derive(Default)]
struct ClockState {
    now_ms: u64,
    next_seq: u64,
    pending: BinaryHeap<ScheduledTask<u64>>,
}

/// Virtual millisecond clock for tests and offline rendering
#[derive(Default)]
pub struct ManualClock {
    state: Mutex<ClockState>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.state.lock().map(|s| s.now_ms).unwrap_or(0)
    }

    /// Number of tasks still waiting
    pub fn pending(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    /// Move the clock forward by `ms`, running everything that falls due
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now().saturating_add(ms);
        self.advance_to(target)
    }

    /// Move the clock to `target_ms` (never backwards). Returns how many tasks ran.
    ///
    /// Tasks scheduled by a running task are picked up in the same pass when
    /// they fall inside the window.
    pub fn advance_to(&self, target_ms: u64) -> usize {
        let mut ran = 0;
        loop {
            // The lock is released before running so tasks can schedule more work
            let next = {
                let Ok(mut state) = self.state.lock() else {
                    return ran;
                };
                let due = state
                    .pending
                    .peek()
                    .map(|task| task.due)
                    .filter(|&due| due <= target_ms);
                match due {
                    Some(due) => {
                        state.now_ms = state.now_ms.max(due);
                        state.pending.pop()
                    }
                    None => {
                        state.now_ms = state.now_ms.max(target_ms);
                        None
                    }
                }
            };

            match next {
                Some(task) => {
                    task.run();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Run everything that is pending, however far in the future
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let last_due = self
                .state
                .lock()
                .ok()
                .and_then(|s| s.pending.iter().map(|t| t.due).max());
            match last_due {
                Some(due) => ran += self.advance_to(due),
                None => return ran,
            }
        }
    }
}

impl DelayScheduler for ManualClock {
    fn schedule(&self, delay_ms: u64, task: Task) {
        if let Ok(mut state) = self.state.lock() {
            let due = state.now_ms.saturating_add(delay_ms);
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(ScheduledTask::new(due, seq, task));
        }
    }
}
