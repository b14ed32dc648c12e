//! Real-time delay queue
//!
//! [`TimerThread`] is the wall-clock implementation of [`DelayScheduler`]. A
//! single worker thread owns a heap of pending callbacks and sleeps on its
//! command channel until the earliest one is due, so callbacks run in due
//! order on that thread. Scheduling from any thread only sends a command.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use fractal_echo_core::types::ScheduledTask;
use fractal_echo_core::{DelayScheduler, Task};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Commands that can be sent to the timer thread
enum TimerCommand {
    Schedule { due: Instant, task: Task },
    /// Drop every pending callback without running it
    Clear,
    Shutdown,
}

/// Wall-clock delay scheduler running callbacks on its own thread
pub struct TimerThread {
    command_tx: Sender<TimerCommand>,
    /// Callbacks scheduled but not yet run
    pending: Arc<AtomicUsize>,
    thread: Option<JoinHandle<()>>,
}

impl TimerThread {
    pub fn new() -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let pending = Arc::new(AtomicUsize::new(0));

        let pending_clone = pending.clone();
        let thread = thread::Builder::new()
            .name("fractal-echo-timer".to_string())
            .spawn(move || TimerWorker::new(command_rx, pending_clone).run())
            .ok();
        if thread.is_none() {
            log::error!("failed to spawn timer thread; scheduled echoes will not fire");
        }

        TimerThread {
            command_tx,
            pending,
            thread,
        }
    }

    /// Number of callbacks that have been scheduled and not yet run
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Forget every pending callback (used by `midi panic`)
    pub fn clear(&self) {
        let _ = self.command_tx.send(TimerCommand::Clear);
    }

    /// Run `task` after `delay`
    pub fn schedule_after(&self, delay: Duration, task: Task) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let due = Instant::now() + delay;
        if self
            .command_tx
            .send(TimerCommand::Schedule { due, task })
            .is_err()
        {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            log::warn!("timer thread is gone; dropping callback");
        }
    }
}

impl Default for TimerThread {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayScheduler for TimerThread {
    fn schedule(&self, delay_ms: u64, task: Task) {
        self.schedule_after(Duration::from_millis(delay_ms), task);
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        let _ = self.command_tx.send(TimerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// State owned by the timer thread
struct TimerWorker {
    command_rx: Receiver<TimerCommand>,
    pending: Arc<AtomicUsize>,
    queue: BinaryHeap<ScheduledTask<Instant>>,
    next_seq: u64,
}

impl TimerWorker {
    fn new(command_rx: Receiver<TimerCommand>, pending: Arc<AtomicUsize>) -> Self {
        Self {
            command_rx,
            pending,
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    fn run(&mut self) {
        loop {
            self.fire_due();

            // Sleep on the channel until the next deadline, or indefinitely when idle
            let received = match self.queue.peek().map(|next| next.due) {
                Some(due) => {
                    let timeout = due.saturating_duration_since(Instant::now());
                    self.command_rx.recv_timeout(timeout)
                }
                None => self
                    .command_rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Returns true when the thread should exit
    fn handle_command(&mut self, cmd: TimerCommand) -> bool {
        match cmd {
            TimerCommand::Schedule { due, task } => {
                self.queue.push(ScheduledTask::new(due, self.next_seq, task));
                self.next_seq += 1;
            }
            TimerCommand::Clear => {
                let dropped = self.queue.len();
                self.queue.clear();
                self.pending.fetch_sub(dropped, Ordering::SeqCst);
                log::debug!("timer cleared {} pending callbacks", dropped);
            }
            TimerCommand::Shutdown => return true,
        }
        false
    }

    fn fire_due(&mut self) {
        let now = Instant::now();
        while self.queue.peek().is_some_and(|next| next.due <= now) {
            if let Some(entry) = self.queue.pop() {
                entry.run();
                self.pending.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }
}
