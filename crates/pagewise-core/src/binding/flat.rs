//! Local paging over a fixed pool with no host cursor

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::BankBinding;
use crate::item::{Item, ItemEvent};
use crate::observer::{ObserverScope, SelectionObservers, Subscription};
use crate::remote::RemoteCollection;

/// Pool of `page_count * page_size` host items, paged locally.
///
/// There is no selection: the page number is the only state and every
/// mutation clamps it to the valid range.
pub struct FlatBinding {
    pool: Option<Rc<dyn RemoteCollection>>,
    page_size: usize,
    page: Cell<usize>,
    items: Rc<RefCell<Vec<Item>>>,
}

impl FlatBinding {
    pub fn new(pool: Option<Rc<dyn RemoteCollection>>, page_size: usize, page_count: usize) -> Self {
        let len = if pool.is_some() { page_size * page_count } else { 0 };
        Self {
            pool,
            page_size,
            page: Cell::new(0),
            items: Rc::new(RefCell::new((0..len).map(Item::empty).collect())),
        }
    }

    pub fn page(&self) -> usize {
        self.page.get()
    }

    fn last_page(&self) -> usize {
        (self.item_count() / self.page_size.max(1)).saturating_sub(1)
    }

    fn set_page(&self, page: usize) {
        self.page.set(page.min(self.last_page()));
    }
}

impl BankBinding for FlatBinding {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn is_bound(&self) -> bool {
        self.pool.is_some()
    }

    fn item_count(&self) -> usize {
        self.items.borrow().len()
    }

    fn scroll_position(&self) -> Option<usize> {
        self.pool.as_ref().map(|_| self.page.get() * self.page_size)
    }

    fn item(&self, slot: usize) -> Item {
        let position = self.page.get() * self.page_size + slot;
        match self.items.borrow().get(position) {
            Some(item) => Item {
                index: slot,
                position: Some(position),
                ..item.clone()
            },
            None => Item::empty(slot),
        }
    }

    fn can_scroll_backwards(&self) -> bool {
        self.page.get() > 0
    }

    fn can_scroll_forwards(&self) -> bool {
        self.is_bound() && self.page.get() < self.last_page()
    }

    fn can_scroll_page_backwards(&self) -> bool {
        self.can_scroll_backwards()
    }

    fn can_scroll_page_forwards(&self) -> bool {
        self.can_scroll_forwards()
    }

    fn scroll_backwards(&self) {
        self.set_page(self.page.get().saturating_sub(1));
    }

    fn scroll_forwards(&self) {
        self.set_page(self.page.get() + 1);
    }

    fn scroll_page_backwards(&self) {
        self.scroll_backwards();
    }

    fn scroll_page_forwards(&self) {
        self.scroll_forwards();
    }

    fn scroll_to(&self, position: usize, _adjust_page: bool) {
        self.set_page(position / self.page_size.max(1));
    }

    fn select_slot(&self, _slot: usize) {}

    fn supports_selection(&self) -> bool {
        false
    }

    fn attach(&self, _observers: &Rc<SelectionObservers>) -> ObserverScope {
        let mut scope = ObserverScope::new();
        let Some(pool) = &self.pool else {
            return scope;
        };
        let len = self.item_count();
        for position in 0..len {
            let Some(remote_item) = pool.item_at(position) else { continue };
            let items = Rc::downgrade(&self.items);
            let listener = Rc::new(move |event: &ItemEvent| {
                let Some(items) = items.upgrade() else { return };
                if let Some(item) = items.borrow_mut().get_mut(position) {
                    if !matches!(event, ItemEvent::Selected(_)) {
                        item.apply(event);
                    }
                }
            });
            scope.push(Subscription::item(remote_item, listener));
        }
        scope
    }

    fn remote(&self) -> Option<Rc<dyn RemoteCollection>> {
        self.pool.clone()
    }
}
