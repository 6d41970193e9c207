//! Wall-clock scheduler driven by the host loop

use std::time::{Duration, Instant};

use pagewise_core::scheduler::{Scheduler, Task, TaskQueue};

/// Tasks become due relative to when the scheduler was created. Nothing
/// runs until [`ClockScheduler::run_due`] is called.
pub struct ClockScheduler {
    started: Instant,
    queue: TaskQueue,
}

impl ClockScheduler {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            queue: TaskQueue::new(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Run every task whose delay has passed
    pub fn run_due(&self) -> usize {
        self.queue.run_due(self.elapsed())
    }

    /// Time left until the earliest pending task is due
    pub fn time_until_next(&self) -> Option<Duration> {
        self.queue
            .next_due()
            .map(|due| due.saturating_sub(self.elapsed()))
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Default for ClockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ClockScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        self.queue.push(self.elapsed() + delay, task);
    }
}
