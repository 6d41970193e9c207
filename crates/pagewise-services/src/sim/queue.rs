//! Deferred delivery of host push notifications

use std::cell::RefCell;
use std::collections::VecDeque;

pub type Notification = Box<dyn FnOnce()>;

/// Notifications raised by host-side changes wait here until the host
/// loop flushes them, the way a real host reports state on its own tick
#[derive(Default)]
pub struct NotificationQueue {
    pending: RefCell<VecDeque<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: impl FnOnce() + 'static) {
        self.pending.borrow_mut().push_back(Box::new(notification));
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Deliver everything queued, including notifications queued while
    /// delivering. Returns the number delivered.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(notification) = next else { break };
            notification();
            delivered += 1;
        }
        delivered
    }
}
