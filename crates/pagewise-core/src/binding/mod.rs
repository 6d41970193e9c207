//! Binding strategies: how a bank window maps onto the host
//!
//! A [`WindowedBank`](crate::WindowedBank) owns exactly one binding, chosen at
//! construction:
//!
//! - [`DelegatingBinding`]: the host has a real paged cursor; every query and
//!   command passes straight through.
//! - [`NameArrayBinding`]: the host pushes a flat array of names plus a
//!   selected index; paging is derived from the selection.
//! - [`FlatBinding`]: a fixed pool with no host cursor and no selection;
//!   the page number is local state.

mod delegating;
mod flat;
mod name_array;

pub use delegating::{DelegatingBinding, EventTap, SelectionSource};
pub use flat::FlatBinding;
pub use name_array::NameArrayBinding;

use std::rc::Rc;

use crate::item::Item;
use crate::observer::{ObserverScope, SelectionObservers};
use crate::remote::RemoteCollection;

/// Capability set a bank window is built on.
///
/// Implementations must be inert when unbound: `false`, `0` and `None` from
/// queries, no-ops from commands.
pub trait BankBinding {
    fn page_size(&self) -> usize;
    fn is_bound(&self) -> bool;
    fn item_count(&self) -> usize;
    fn scroll_position(&self) -> Option<usize>;
    /// `slot` is below `page_size`; callers check
    fn item(&self, slot: usize) -> Item;

    fn can_scroll_backwards(&self) -> bool;
    fn can_scroll_forwards(&self) -> bool;
    fn can_scroll_page_backwards(&self) -> bool;
    fn can_scroll_page_forwards(&self) -> bool;

    fn scroll_backwards(&self);
    fn scroll_forwards(&self);
    fn scroll_page_backwards(&self);
    fn scroll_page_forwards(&self);
    /// `position` is below `item_count`; callers check
    fn scroll_to(&self, position: usize, adjust_page: bool);

    fn select_slot(&self, slot: usize);

    /// Whether items carry a selection at all
    fn supports_selection(&self) -> bool {
        true
    }

    /// Subscribe to host push notifications for as long as the returned
    /// scope lives
    fn attach(&self, observers: &Rc<SelectionObservers>) -> ObserverScope;

    fn remote(&self) -> Option<Rc<dyn RemoteCollection>> {
        None
    }
}

/// First position of the page containing `position`
pub fn page_start(position: usize, page_size: usize) -> usize {
    position / page_size.max(1) * page_size.max(1)
}

#[cfg(test)]
pub(crate) mod fake {
    //! Recording host collection for unit tests

    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use crate::item::ItemEvent;
    use crate::remote::{ItemListener, ListenerId, RemoteCollection, RemoteItem};

    #[derive(Default)]
    pub struct Log(pub RefCell<Vec<String>>);

    impl Log {
        pub fn push(&self, entry: impl Into<String>) {
            self.0.borrow_mut().push(entry.into());
        }

        pub fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.borrow_mut())
        }
    }

    pub struct FakeItem {
        slot: usize,
        log: Rc<Log>,
        next_id: Cell<ListenerId>,
        pub listeners: RefCell<HashMap<ListenerId, ItemListener>>,
    }

    impl FakeItem {
        pub fn emit(&self, event: ItemEvent) {
            let listeners: Vec<_> = self.listeners.borrow().values().cloned().collect();
            for listener in listeners {
                listener(&event);
            }
        }
    }

    impl RemoteItem for FakeItem {
        fn select(&self) {
            self.log.push(format!("select {}", self.slot));
        }

        fn subscribe(&self, listener: ItemListener) -> ListenerId {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            self.listeners.borrow_mut().insert(id, listener);
            id
        }

        fn unsubscribe(&self, id: ListenerId) {
            self.listeners.borrow_mut().remove(&id);
        }
    }

    /// Collection whose scroll state changes immediately and whose item
    /// content only changes when a test emits events
    pub struct FakeCollection {
        pub log: Rc<Log>,
        pub count: Cell<usize>,
        pub position: Cell<usize>,
        pub page_size: usize,
        pub items: Vec<Rc<FakeItem>>,
    }

    impl FakeCollection {
        pub fn new(page_size: usize, count: usize) -> Rc<Self> {
            Self::with_log(page_size, count, Rc::new(Log::default()))
        }

        pub fn with_log(page_size: usize, count: usize, log: Rc<Log>) -> Rc<Self> {
            let items = (0..page_size)
                .map(|slot| {
                    Rc::new(FakeItem {
                        slot,
                        log: log.clone(),
                        next_id: Cell::new(0),
                        listeners: RefCell::new(HashMap::new()),
                    })
                })
                .collect();
            Rc::new(Self {
                log,
                count: Cell::new(count),
                position: Cell::new(0),
                page_size,
                items,
            })
        }

        pub fn handle(self: &Rc<Self>) -> Option<Rc<dyn RemoteCollection>> {
            let handle: Rc<dyn RemoteCollection> = self.clone();
            Some(handle)
        }

        pub fn listener_count(&self) -> usize {
            self.items.iter().map(|i| i.listeners.borrow().len()).sum()
        }

        fn move_to(&self, position: usize, label: &str) {
            self.log.push(label);
            self.position.set(position);
        }
    }

    impl RemoteCollection for FakeCollection {
        fn item_count(&self) -> usize {
            self.count.get()
        }

        fn scroll_position(&self) -> usize {
            self.position.get()
        }

        fn can_scroll_backwards(&self) -> bool {
            self.position.get() > 0
        }

        fn can_scroll_forwards(&self) -> bool {
            self.position.get() + self.page_size < self.count.get()
        }

        fn can_scroll_page_backwards(&self) -> bool {
            self.can_scroll_backwards()
        }

        fn can_scroll_page_forwards(&self) -> bool {
            self.can_scroll_forwards()
        }

        fn item_at(&self, slot: usize) -> Option<Rc<dyn RemoteItem>> {
            self.items.get(slot).map(|i| i.clone() as Rc<dyn RemoteItem>)
        }

        fn scroll_backwards(&self) {
            self.move_to(self.position.get().saturating_sub(1), "scroll_backwards");
        }

        fn scroll_forwards(&self) {
            self.move_to(self.position.get() + 1, "scroll_forwards");
        }

        fn scroll_page_backwards(&self) {
            let target = self.position.get().saturating_sub(self.page_size);
            self.move_to(target, "scroll_page_backwards");
        }

        fn scroll_page_forwards(&self) {
            self.move_to(self.position.get() + self.page_size, "scroll_page_forwards");
        }

        fn set_scroll_position(&self, position: usize) {
            self.move_to(position, &format!("set_scroll_position {position}"));
        }

        fn stop(&self) {
            self.log.push("stop");
        }
    }
}
