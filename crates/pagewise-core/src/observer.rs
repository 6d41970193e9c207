//! Observer lists and scoped listener subscriptions

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::remote::{ItemListener, RemoteItem};

/// A registered host listener; unsubscribes when dropped
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Subscribe `listener` to a remote item for the lifetime of the guard
    pub fn item(item: Rc<dyn RemoteItem>, listener: ItemListener) -> Self {
        let id = item.subscribe(listener);
        Self::new(move || item.unsubscribe(id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Tree of subscriptions owned by a bank and its sub-banks.
///
/// Dropping the scope releases every subscription in it, children included.
#[derive(Debug, Default)]
pub struct ObserverScope {
    subscriptions: Vec<Subscription>,
    children: Vec<ObserverScope>,
}

impl ObserverScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn push_child(&mut self, child: ObserverScope) {
        self.children.push(child);
    }

    /// Total number of subscriptions including children
    pub fn len(&self) -> usize {
        self.subscriptions.len() + self.children.iter().map(ObserverScope::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Listener list for bank-level notifications.
///
/// Listeners are invoked on a snapshot, so a listener may register further
/// listeners or query the bank while being notified.
pub struct ObserverList<E> {
    listeners: RefCell<Vec<Rc<dyn Fn(&E)>>>,
}

impl<E> ObserverList<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn add(&self, listener: impl Fn(&E) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn notify(&self, event: &E) {
        let snapshot = self.listeners.borrow().clone();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// `(window index, is selected)`
pub type SelectionObservers = ObserverList<(usize, bool)>;
