//! Fire-and-forget task scheduling for deferred bank actions

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use crate::config::{SettleConfig, SettlePolicy};

pub type Task = Box<dyn FnOnce()>;

/// Host-provided scheduler. Tasks run later on the controller thread.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Task);
}

struct Entry {
    due: Duration,
    seq: u64,
    task: Task,
}

/// Pending tasks ordered by due time, then by issue order
#[derive(Default)]
pub struct TaskQueue {
    entries: RefCell<Vec<Entry>>,
    next_seq: Cell<u64>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, due: Duration, task: Task) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.entries.borrow_mut().push(Entry { due, seq, task });
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.entries.borrow().iter().map(|e| e.due).min()
    }

    /// Remove the earliest task due at or before `now`, with its due time
    pub fn pop_due(&self, now: Duration) -> Option<(Duration, Task)> {
        let mut entries = self.entries.borrow_mut();
        let idx = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(i, _)| i)?;
        let entry = entries.remove(idx);
        Some((entry.due, entry.task))
    }

    /// Run every task due at or before `now`, including ones scheduled by
    /// the tasks themselves. Returns how many ran.
    pub fn run_due(&self, now: Duration) -> usize {
        let mut ran = 0;
        while let Some((_, task)) = self.pop_due(now) {
            task();
            ran += 1;
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scheduler on a virtual clock that only moves when told to
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    queue: TaskQueue,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Move the clock forward, running tasks as their due time passes
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;
        while let Some((due, task)) = self.queue.pop_due(target) {
            self.now.set(due.max(self.now.get()));
            task();
            ran += 1;
        }
        self.now.set(target);
        ran
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        self.queue.push(self.now.get() + delay, task);
    }
}

/// Kinds of deferred action a bank issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredKind {
    /// Select the boundary slot after a page scroll
    PageSelect,
    /// Select an absolute position after scrolling it into view
    PositionSelect,
    /// Configure a freshly created channel
    ConfigureChannel,
}

/// Per-bank deferred actions, delayed by the settle delay and governed by
/// the settle policy
#[derive(Clone)]
pub struct DeferredTasks {
    scheduler: Rc<dyn Scheduler>,
    config: SettleConfig,
    generations: Rc<RefCell<HashMap<DeferredKind, u64>>>,
}

impl DeferredTasks {
    pub fn new(scheduler: Rc<dyn Scheduler>, config: SettleConfig) -> Self {
        Self {
            scheduler,
            config,
            generations: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> SettleConfig {
        self.config
    }

    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        self.scheduler.clone()
    }

    /// Same scheduler and config, with coalescing state of its own. Each
    /// bank forks so one bank's actions never supersede another's.
    pub fn fork(&self) -> Self {
        Self::new(self.scheduler.clone(), self.config)
    }

    pub fn defer(&self, kind: DeferredKind, task: impl FnOnce() + 'static) {
        let delay = self.config.delay();
        match self.config.policy {
            SettlePolicy::Queue => self.scheduler.schedule(delay, Box::new(task)),
            SettlePolicy::Coalesce => {
                let generation = {
                    let mut generations = self.generations.borrow_mut();
                    let entry = generations.entry(kind).or_insert(0);
                    *entry += 1;
                    *entry
                };
                let generations = self.generations.clone();
                self.scheduler.schedule(
                    delay,
                    Box::new(move || {
                        let current = generations.borrow().get(&kind).copied();
                        if current == Some(generation) {
                            task();
                        } else {
                            trace!(?kind, generation, "Superseded deferred action skipped");
                        }
                    }),
                );
            }
        }
    }
}
