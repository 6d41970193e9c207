//! Parameter page cursor: a name list plus a selected index

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use pagewise_core::remote::{ListenerId, PageEvent, PageListener, RemotePageCursor};

use super::queue::NotificationQueue;

pub struct SimPageCursor {
    queue: Rc<NotificationQueue>,
    names: RefCell<Vec<String>>,
    selected: Cell<Option<usize>>,
    listeners: Rc<RefCell<BTreeMap<ListenerId, PageListener>>>,
    next_id: Cell<ListenerId>,
}

impl SimPageCursor {
    /// The first page starts out selected
    pub fn new(queue: Rc<NotificationQueue>, names: Vec<String>) -> Rc<Self> {
        let selected = (!names.is_empty()).then_some(0);
        Rc::new(Self {
            queue,
            names: RefCell::new(names),
            selected: Cell::new(selected),
            listeners: Rc::new(RefCell::new(BTreeMap::new())),
            next_id: Cell::new(0),
        })
    }

    /// Replace the page list, as when the cursor device changes
    pub fn set_names(&self, names: Vec<String>) {
        let count = names.len();
        *self.names.borrow_mut() = names.clone();
        self.emit(PageEvent::Names(names));
        let selected = match (self.selected.get(), count) {
            (_, 0) => None,
            (Some(selected), _) => Some(selected.min(count - 1)),
            (None, _) => Some(0),
        };
        if self.selected.replace(selected) != selected {
            self.emit(PageEvent::Selected(selected));
        }
    }

    fn emit(&self, event: PageEvent) {
        let listeners = self.listeners.clone();
        self.queue.push(move || {
            let snapshot: Vec<_> = listeners.borrow().values().cloned().collect();
            for listener in snapshot {
                listener(&event);
            }
        });
    }
}

impl RemotePageCursor for SimPageCursor {
    fn page_names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }

    fn selected_page(&self) -> Option<usize> {
        self.selected.get()
    }

    fn select_page(&self, index: usize) {
        if index >= self.names.borrow().len() {
            return;
        }
        if self.selected.replace(Some(index)) != Some(index) {
            self.emit(PageEvent::Selected(Some(index)));
        }
    }

    fn subscribe(&self, listener: PageListener) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }
}
