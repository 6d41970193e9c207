//! Paging synthesized from a pushed array of page names

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{BankBinding, page_start};
use crate::item::Item;
use crate::observer::{ObserverScope, SelectionObservers, Subscription};
use crate::remote::{PageEvent, RemotePageCursor};

struct PageState {
    names: RefCell<Vec<String>>,
    selected: Cell<Option<usize>>,
}

impl PageState {
    fn scroll_position(&self, page_size: usize) -> usize {
        page_start(self.selected.get().unwrap_or(0), page_size)
    }

    fn selected_slot(&self, page_size: usize) -> Option<usize> {
        let selected = self.selected.get()?;
        (selected < self.names.borrow().len())
            .then(|| selected - self.scroll_position(page_size))
    }
}

/// The host exposes only a cursor over a flat name list. The full list is
/// materialized locally and the window start is always the page containing
/// the selected name.
pub struct NameArrayBinding {
    cursor: Option<Rc<dyn RemotePageCursor>>,
    page_size: usize,
    state: Rc<PageState>,
}

impl NameArrayBinding {
    pub fn new(cursor: Option<Rc<dyn RemotePageCursor>>, page_size: usize) -> Self {
        let state = PageState {
            names: RefCell::new(Vec::new()),
            selected: Cell::new(None),
        };
        if let Some(cursor) = &cursor {
            *state.names.borrow_mut() = cursor.page_names();
            state.selected.set(cursor.selected_page());
        }
        Self {
            cursor,
            page_size,
            state: Rc::new(state),
        }
    }

    fn select_page(&self, index: usize) {
        if let Some(cursor) = &self.cursor {
            if index < self.item_count() {
                cursor.select_page(index);
            }
        }
    }
}

impl BankBinding for NameArrayBinding {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn is_bound(&self) -> bool {
        self.cursor.is_some()
    }

    fn item_count(&self) -> usize {
        self.state.names.borrow().len()
    }

    fn scroll_position(&self) -> Option<usize> {
        self.cursor
            .as_ref()
            .map(|_| self.state.scroll_position(self.page_size))
    }

    fn item(&self, slot: usize) -> Item {
        let position = self.state.scroll_position(self.page_size) + slot;
        match self.state.names.borrow().get(position) {
            Some(name) => Item {
                index: slot,
                exists: true,
                name: name.clone(),
                selected: self.state.selected.get() == Some(position),
                position: Some(position),
                ..Default::default()
            },
            None => Item::empty(slot),
        }
    }

    fn can_scroll_backwards(&self) -> bool {
        self.state.selected.get().is_some_and(|s| s > 0)
    }

    fn can_scroll_forwards(&self) -> bool {
        self.state
            .selected
            .get()
            .is_some_and(|s| s + 1 < self.item_count())
    }

    fn can_scroll_page_backwards(&self) -> bool {
        self.scroll_position().is_some_and(|p| p > 0)
    }

    fn can_scroll_page_forwards(&self) -> bool {
        self.scroll_position()
            .is_some_and(|p| p + self.page_size < self.item_count())
    }

    fn scroll_backwards(&self) {
        if let Some(selected) = self.state.selected.get().filter(|s| *s > 0) {
            self.select_page(selected - 1);
        }
    }

    fn scroll_forwards(&self) {
        if let Some(selected) = self.state.selected.get() {
            self.select_page(selected + 1);
        }
    }

    fn scroll_page_backwards(&self) {
        if let Some(position) = self.scroll_position().filter(|p| *p > 0) {
            self.select_page(position.saturating_sub(self.page_size));
        }
    }

    fn scroll_page_forwards(&self) {
        if let Some(position) = self.scroll_position() {
            self.select_page(position + self.page_size);
        }
    }

    fn scroll_to(&self, position: usize, _adjust_page: bool) {
        self.select_page(position);
    }

    fn select_slot(&self, slot: usize) {
        if let Some(position) = self.scroll_position() {
            self.select_page(position + slot);
        }
    }

    fn attach(&self, observers: &Rc<SelectionObservers>) -> ObserverScope {
        let mut scope = ObserverScope::new();
        let Some(cursor) = &self.cursor else {
            return scope;
        };
        *self.state.names.borrow_mut() = cursor.page_names();
        self.state.selected.set(cursor.selected_page());

        let state = Rc::downgrade(&self.state);
        let observers = Rc::downgrade(observers);
        let page_size = self.page_size;
        let id = cursor.subscribe(Rc::new(move |event: &PageEvent| {
            let Some(state) = state.upgrade() else { return };
            let before = state.selected_slot(page_size);
            match event {
                PageEvent::Names(names) => state.names.borrow_mut().clone_from(names),
                PageEvent::Selected(selected) => state.selected.set(*selected),
            }
            let after = state.selected_slot(page_size);
            if before == after {
                return;
            }
            let Some(observers) = observers.upgrade() else { return };
            if let Some(slot) = before {
                observers.notify(&(slot, false));
            }
            if let Some(slot) = after {
                observers.notify(&(slot, true));
            }
        }));
        let cursor = cursor.clone();
        scope.push(Subscription::new(move || cursor.unsubscribe(id)));
        scope
    }
}
