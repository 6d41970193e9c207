//! Binding backed directly by a host collection

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use super::{BankBinding, page_start};
use crate::item::{Item, ItemEvent};
use crate::observer::{ObserverScope, SelectionObservers, Subscription};
use crate::remote::{RemoteCollection, TrackHost};

/// Sees every push notification of every slot before the window applies it
pub type EventTap = Rc<dyn Fn(usize, &ItemEvent)>;

/// Where slot selection flags come from
#[derive(Clone, Default)]
pub enum SelectionSource {
    /// Each host item reports its own selection
    #[default]
    Items,
    /// A single cursor index, diffed against every slot
    Cursor(Rc<dyn TrackHost>),
}

struct WindowState {
    items: RefCell<Vec<Item>>,
    cursor: Cell<Option<usize>>,
}

impl WindowState {
    /// Re-evaluate cursor selection for the given slots, returning the
    /// slots whose flag actually changed
    fn diff_cursor(&self, slots: impl Iterator<Item = usize>) -> Vec<(usize, bool)> {
        let cursor = self.cursor.get();
        let mut items = self.items.borrow_mut();
        slots
            .filter_map(|slot| {
                let item = items.get_mut(slot)?;
                let selected = item.exists && item.position.is_some() && item.position == cursor;
                (item.selected != selected).then(|| {
                    item.selected = selected;
                    (slot, selected)
                })
            })
            .collect()
    }
}

pub struct DelegatingBinding {
    remote: Option<Rc<dyn RemoteCollection>>,
    page_size: usize,
    state: Rc<WindowState>,
    selection: SelectionSource,
    tap: Option<EventTap>,
}

impl DelegatingBinding {
    pub fn new(remote: Option<Rc<dyn RemoteCollection>>, page_size: usize) -> Self {
        Self {
            remote,
            page_size,
            state: Rc::new(WindowState {
                items: RefCell::new((0..page_size).map(Item::empty).collect()),
                cursor: Cell::new(None),
            }),
            selection: SelectionSource::Items,
            tap: None,
        }
    }

    /// A window with no host collection behind it
    pub fn unbound(page_size: usize) -> Self {
        Self::new(None, page_size)
    }

    pub fn with_selection(mut self, selection: SelectionSource) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_event_tap(mut self, tap: EventTap) -> Self {
        self.tap = Some(tap);
        self
    }

    fn attach_cursor(
        &self,
        host: &Rc<dyn TrackHost>,
        observers: &Weak<SelectionObservers>,
        scope: &mut ObserverScope,
    ) {
        self.state.cursor.set(host.cursor_index());
        let state = Rc::downgrade(&self.state);
        let observers = observers.clone();
        let page_size = self.page_size;
        let id = host.subscribe_cursor_index(Rc::new(move |cursor| {
            let (Some(state), Some(observers)) = (state.upgrade(), observers.upgrade()) else {
                return;
            };
            state.cursor.set(cursor);
            for change in state.diff_cursor(0..page_size) {
                observers.notify(&change);
            }
        }));
        let host = host.clone();
        scope.push(Subscription::new(move || host.unsubscribe_cursor_index(id)));
    }
}

impl BankBinding for DelegatingBinding {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn is_bound(&self) -> bool {
        self.remote.is_some()
    }

    fn item_count(&self) -> usize {
        self.remote.as_ref().map_or(0, |r| r.item_count())
    }

    fn scroll_position(&self) -> Option<usize> {
        self.remote.as_ref().map(|r| r.scroll_position())
    }

    fn item(&self, slot: usize) -> Item {
        self.state
            .items
            .borrow()
            .get(slot)
            .cloned()
            .unwrap_or_else(|| Item::empty(slot))
    }

    fn can_scroll_backwards(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.can_scroll_backwards())
    }

    fn can_scroll_forwards(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.can_scroll_forwards())
    }

    fn can_scroll_page_backwards(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.can_scroll_page_backwards())
    }

    fn can_scroll_page_forwards(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.can_scroll_page_forwards())
    }

    fn scroll_backwards(&self) {
        if let Some(remote) = &self.remote {
            remote.scroll_backwards();
        }
    }

    fn scroll_forwards(&self) {
        if let Some(remote) = &self.remote {
            remote.scroll_forwards();
        }
    }

    fn scroll_page_backwards(&self) {
        if let Some(remote) = &self.remote {
            remote.scroll_page_backwards();
        }
    }

    fn scroll_page_forwards(&self) {
        if let Some(remote) = &self.remote {
            remote.scroll_page_forwards();
        }
    }

    fn scroll_to(&self, position: usize, adjust_page: bool) {
        let Some(remote) = &self.remote else { return };
        let target = if adjust_page {
            page_start(position, self.page_size)
        } else {
            position
        };
        remote.set_scroll_position(target);
    }

    fn select_slot(&self, slot: usize) {
        if let Some(item) = self.remote.as_ref().and_then(|r| r.item_at(slot)) {
            item.select();
        }
    }

    fn attach(&self, observers: &Rc<SelectionObservers>) -> ObserverScope {
        let mut scope = ObserverScope::new();
        let Some(remote) = &self.remote else {
            return scope;
        };
        let observers = Rc::downgrade(observers);
        let cursor_driven = matches!(self.selection, SelectionSource::Cursor(_));

        for slot in 0..self.page_size {
            let Some(item) = remote.item_at(slot) else {
                trace!(slot, "Host exposes no item for window slot");
                continue;
            };
            let state = Rc::downgrade(&self.state);
            let observers = observers.clone();
            let tap = self.tap.clone();
            let listener = Rc::new(move |event: &ItemEvent| {
                let Some(state) = state.upgrade() else { return };
                if let Some(tap) = &tap {
                    tap(slot, event);
                }
                let changes = if cursor_driven {
                    match event {
                        ItemEvent::Selected(_) => Vec::new(),
                        ItemEvent::Position(_) | ItemEvent::Exists(_) => {
                            if let Some(item) = state.items.borrow_mut().get_mut(slot) {
                                item.apply(event);
                            }
                            state.diff_cursor(std::iter::once(slot))
                        }
                        _ => {
                            if let Some(item) = state.items.borrow_mut().get_mut(slot) {
                                item.apply(event);
                            }
                            Vec::new()
                        }
                    }
                } else {
                    let changed = state
                        .items
                        .borrow_mut()
                        .get_mut(slot)
                        .and_then(|item| item.apply(event));
                    changed.map(|selected| (slot, selected)).into_iter().collect()
                };
                if let Some(observers) = observers.upgrade() {
                    for change in changes {
                        observers.notify(&change);
                    }
                }
            });
            scope.push(Subscription::item(item, listener));
        }

        if let SelectionSource::Cursor(host) = &self.selection {
            self.attach_cursor(host, &observers, &mut scope);
        }
        scope
    }

    fn remote(&self) -> Option<Rc<dyn RemoteCollection>> {
        self.remote.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::fake::FakeCollection;

    #[test]
    fn test_unbound_binding_is_inert() {
        let binding = DelegatingBinding::unbound(4);
        assert!(!binding.is_bound());
        assert_eq!(binding.item_count(), 0);
        assert_eq!(binding.scroll_position(), None);
        assert!(!binding.can_scroll_page_forwards());
        binding.scroll_forwards();
        binding.scroll_to(3, true);
        binding.select_slot(1);
        assert_eq!(binding.item(3), Item::empty(3));
        assert!(binding.attach(&Rc::new(SelectionObservers::new())).is_empty());
    }

    #[test]
    fn test_scroll_to_aligns_to_page() {
        let remote = FakeCollection::new(4, 20);
        let binding = DelegatingBinding::new(remote.handle(), 4);
        binding.scroll_to(9, true);
        assert_eq!(remote.position.get(), 8);
        binding.scroll_to(9, false);
        assert_eq!(remote.position.get(), 9);
    }

    #[test]
    fn test_item_events_update_slot_and_notify_selection() {
        let remote = FakeCollection::new(2, 2);
        let binding = DelegatingBinding::new(remote.handle(), 2);
        let observers = Rc::new(SelectionObservers::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        observers.add(move |change| sink.borrow_mut().push(*change));

        let scope = binding.attach(&observers);
        assert_eq!(remote.listener_count(), 2);
        remote.items[1].emit(ItemEvent::Name("Keys".into()));
        remote.items[1].emit(ItemEvent::Selected(true));
        remote.items[1].emit(ItemEvent::Selected(true));

        assert_eq!(binding.item(1).name, "Keys");
        assert_eq!(*seen.borrow(), vec![(1, true)]);

        drop(scope);
        assert_eq!(remote.listener_count(), 0);
    }
}
