//! In-memory host collections and the paged views over them

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use pagewise_core::binding::page_start;
use pagewise_core::remote::{CursorListener, ItemListener, ListenerId, RemoteCollection, RemoteItem};
use pagewise_core::{ItemColor, ItemEvent};
use tracing::trace;

use super::queue::NotificationQueue;

/// One host-side entity. Fields that don't apply to a collection stay at
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimEntity {
    pub name: String,
    pub color: ItemColor,
    /// Timeline position in beats, for markers
    pub time: f64,
    pub armed: bool,
}

impl SimEntity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn marker(name: impl Into<String>, time: f64) -> Self {
        Self {
            name: name.into(),
            time,
            ..Default::default()
        }
    }
}

/// Ordered entity list with at most one selected entity. Any number of
/// [`SimCollection`] windows can page over the same store.
pub struct SimStore {
    queue: Rc<NotificationQueue>,
    entities: RefCell<Vec<SimEntity>>,
    selected: Cell<Option<usize>>,
    views: RefCell<Vec<Weak<SimCollection>>>,
    selection_listeners: RefCell<BTreeMap<ListenerId, CursorListener>>,
    next_id: Cell<ListenerId>,
    /// Store whose selection is cleared when this one selects
    exclusive: RefCell<Weak<SimStore>>,
    commands: RefCell<Vec<String>>,
}

impl SimStore {
    pub fn new(queue: Rc<NotificationQueue>) -> Rc<Self> {
        Self::with_entities(queue, Vec::new())
    }

    pub fn with_entities(queue: Rc<NotificationQueue>, entities: Vec<SimEntity>) -> Rc<Self> {
        Rc::new(Self {
            queue,
            entities: RefCell::new(entities),
            selected: Cell::new(None),
            views: RefCell::new(Vec::new()),
            selection_listeners: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(0),
            exclusive: RefCell::new(Weak::new()),
            commands: RefCell::new(Vec::new()),
        })
    }

    /// Selecting in either store clears the selection of the other
    pub fn link_exclusive(a: &Rc<Self>, b: &Rc<Self>) {
        *a.exclusive.borrow_mut() = Rc::downgrade(b);
        *b.exclusive.borrow_mut() = Rc::downgrade(a);
    }

    /// New paged window over this store
    pub fn view(self: &Rc<Self>, page_size: usize) -> Rc<SimCollection> {
        let view = SimCollection::new(self.clone(), page_size);
        let mut views = self.views.borrow_mut();
        views.retain(|v| v.strong_count() > 0);
        views.push(Rc::downgrade(&view));
        view
    }

    pub fn len(&self) -> usize {
        self.entities.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.borrow().is_empty()
    }

    pub fn entity(&self, index: usize) -> Option<SimEntity> {
        self.entities.borrow().get(index).cloned()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected.get()
    }

    /// Append an entity and return its index
    pub fn push(&self, entity: SimEntity) -> usize {
        let index = {
            let mut entities = self.entities.borrow_mut();
            entities.push(entity);
            entities.len() - 1
        };
        self.refresh();
        index
    }

    /// Mutate entity `index` in place. Returns false when it does not exist.
    pub fn update(&self, index: usize, change: impl FnOnce(&mut SimEntity)) -> bool {
        let updated = match self.entities.borrow_mut().get_mut(index) {
            Some(entity) => {
                change(entity);
                true
            }
            None => false,
        };
        if updated {
            self.refresh();
        }
        updated
    }

    /// Move the selection. Indices past the end clear it.
    pub fn select(&self, index: Option<usize>) {
        let index = index.filter(|i| *i < self.len());
        if self.selected.replace(index) == index {
            return;
        }
        trace!(?index, "Host selection moved");
        if index.is_some() {
            let other = self.exclusive.borrow().upgrade();
            if let Some(other) = other {
                other.select(None);
            }
        }
        for view in self.live_views() {
            view.reveal(index);
        }
        self.refresh();

        let listeners: Vec<_> = self.selection_listeners.borrow().values().cloned().collect();
        self.queue.push(move || {
            for listener in listeners {
                listener(index);
            }
        });
    }

    pub fn subscribe_selection(&self, listener: CursorListener) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.selection_listeners.borrow_mut().insert(id, listener);
        id
    }

    pub fn unsubscribe_selection(&self, id: ListenerId) {
        self.selection_listeners.borrow_mut().remove(&id);
    }

    /// Collection-wide commands received so far (`stop`, `clear_muted`)
    pub fn take_commands(&self) -> Vec<String> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    fn record(&self, command: &str) {
        self.commands.borrow_mut().push(command.to_string());
    }

    fn live_views(&self) -> Vec<Rc<SimCollection>> {
        self.views.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    /// Republish every slot of every window
    fn refresh(&self) {
        for view in self.live_views() {
            view.publish_all();
        }
    }
}

struct SimSlot {
    listeners: RefCell<BTreeMap<ListenerId, ItemListener>>,
    next_id: Cell<ListenerId>,
    index: usize,
    view: Weak<SimCollection>,
}

impl RemoteItem for SimSlot {
    fn select(&self) {
        let Some(view) = self.view.upgrade() else { return };
        let position = view.position.get() + self.index;
        if position < view.store.len() {
            view.store.select(Some(position));
        }
    }

    fn subscribe(&self, listener: ItemListener) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().insert(id, listener);
        if let Some(view) = self.view.upgrade() {
            view.publish(self.index);
        }
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }
}

/// Paged window over a [`SimStore`]. Scroll commands apply at once; the
/// slot contents they imply arrive only when the queue is flushed.
pub struct SimCollection {
    store: Rc<SimStore>,
    page_size: usize,
    position: Cell<usize>,
    slots: Vec<Rc<SimSlot>>,
    follow_cursor: Cell<bool>,
    skip_disabled: Cell<bool>,
    clip_feedback: Cell<bool>,
}

impl SimCollection {
    fn new(store: Rc<SimStore>, page_size: usize) -> Rc<Self> {
        Rc::new_cyclic(|view| Self {
            store,
            page_size,
            position: Cell::new(0),
            slots: (0..page_size)
                .map(|index| {
                    Rc::new(SimSlot {
                        listeners: RefCell::new(BTreeMap::new()),
                        next_id: Cell::new(0),
                        index,
                        view: view.clone(),
                    })
                })
                .collect(),
            follow_cursor: Cell::new(false),
            skip_disabled: Cell::new(false),
            clip_feedback: Cell::new(false),
        })
    }

    pub fn handle(self: &Rc<Self>) -> Rc<dyn RemoteCollection> {
        self.clone()
    }

    pub fn store(&self) -> &Rc<SimStore> {
        &self.store
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn follows_cursor(&self) -> bool {
        self.follow_cursor.get()
    }

    pub fn skips_disabled_items(&self) -> bool {
        self.skip_disabled.get()
    }

    pub fn shows_clip_feedback(&self) -> bool {
        self.clip_feedback.get()
    }

    /// Listeners currently registered across all slots
    pub fn listener_count(&self) -> usize {
        self.slots.iter().map(|s| s.listeners.borrow().len()).sum()
    }

    fn move_to(&self, position: usize) {
        let position = position.min(self.store.len().saturating_sub(1));
        if self.position.replace(position) != position {
            trace!(position, "Host window moved");
            self.publish_all();
        }
    }

    /// Scroll the selected entity into view when following the cursor
    fn reveal(&self, index: Option<usize>) {
        let Some(index) = index else { return };
        let start = self.position.get();
        if self.follow_cursor.get() && !(start..start + self.page_size).contains(&index) {
            self.move_to(page_start(index, self.page_size));
        }
    }

    fn publish_all(&self) {
        for index in 0..self.page_size {
            self.publish(index);
        }
    }

    /// Queue the current state of slot `index` for its listeners. The state
    /// is read when the notification is delivered, not when queued.
    fn publish(&self, index: usize) {
        let Some(slot) = self.slots.get(index) else { return };
        if slot.listeners.borrow().is_empty() {
            return;
        }
        let slot = Rc::downgrade(slot);
        self.store.queue.push(move || {
            let Some(slot) = slot.upgrade() else { return };
            let Some(view) = slot.view.upgrade() else { return };
            let events = view.slot_events(slot.index);
            let listeners: Vec<_> = slot.listeners.borrow().values().cloned().collect();
            for event in &events {
                for listener in &listeners {
                    listener(event);
                }
            }
        });
    }

    fn slot_events(&self, index: usize) -> Vec<ItemEvent> {
        let position = self.position.get() + index;
        match self.store.entity(position) {
            Some(entity) => vec![
                ItemEvent::Exists(true),
                ItemEvent::Name(entity.name),
                ItemEvent::Color(entity.color),
                ItemEvent::Position(Some(position)),
                ItemEvent::Selected(self.store.selected() == Some(position)),
                ItemEvent::Time(entity.time),
                ItemEvent::Armed(entity.armed),
            ],
            None => vec![
                ItemEvent::Exists(false),
                ItemEvent::Name(String::new()),
                ItemEvent::Position(None),
                ItemEvent::Selected(false),
                ItemEvent::Armed(false),
            ],
        }
    }
}

impl RemoteCollection for SimCollection {
    fn item_count(&self) -> usize {
        self.store.len()
    }

    fn scroll_position(&self) -> usize {
        self.position.get()
    }

    fn can_scroll_backwards(&self) -> bool {
        self.position.get() > 0
    }

    fn can_scroll_forwards(&self) -> bool {
        self.position.get() + self.page_size < self.store.len()
    }

    fn can_scroll_page_backwards(&self) -> bool {
        self.can_scroll_backwards()
    }

    fn can_scroll_page_forwards(&self) -> bool {
        self.can_scroll_forwards()
    }

    fn item_at(&self, slot: usize) -> Option<Rc<dyn RemoteItem>> {
        let slot: Rc<dyn RemoteItem> = self.slots.get(slot)?.clone();
        Some(slot)
    }

    fn scroll_backwards(&self) {
        if self.can_scroll_backwards() {
            self.move_to(self.position.get() - 1);
        }
    }

    fn scroll_forwards(&self) {
        if self.can_scroll_forwards() {
            self.move_to(self.position.get() + 1);
        }
    }

    fn scroll_page_backwards(&self) {
        self.move_to(self.position.get().saturating_sub(self.page_size));
    }

    fn scroll_page_forwards(&self) {
        if self.can_scroll_page_forwards() {
            self.move_to(self.position.get() + self.page_size);
        }
    }

    fn set_scroll_position(&self, position: usize) {
        self.move_to(position);
    }

    fn set_skip_disabled_items(&self, skip: bool) {
        self.skip_disabled.set(skip);
    }

    fn follow_cursor(&self, follow: bool) {
        self.follow_cursor.set(follow);
        self.reveal(self.store.selected());
    }

    fn set_clip_launcher_feedback(&self, show: bool) {
        self.clip_feedback.set(show);
    }

    fn stop(&self) {
        self.store.record("stop");
    }

    fn clear_muted(&self) {
        self.store.record("clear_muted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(names: &[&str]) -> (Rc<NotificationQueue>, Rc<SimStore>) {
        let queue = Rc::new(NotificationQueue::new());
        let entities = names.iter().map(|n| SimEntity::named(*n)).collect();
        let store = SimStore::with_entities(queue.clone(), entities);
        (queue, store)
    }

    fn record(view: &Rc<SimCollection>, slot: usize) -> Rc<RefCell<Vec<ItemEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let item = view.item_at(slot).unwrap();
        item.subscribe(Rc::new(move |event: &ItemEvent| sink.borrow_mut().push(event.clone())));
        seen
    }

    #[test]
    fn test_slot_content_arrives_on_flush() {
        let (queue, store) = store(&["Kick", "Snare", "Hats"]);
        let view = store.view(2);
        let seen = record(&view, 1);
        assert!(seen.borrow().is_empty());

        queue.flush();
        assert!(seen.borrow().contains(&ItemEvent::Name("Snare".into())));
        assert!(seen.borrow().contains(&ItemEvent::Position(Some(1))));

        seen.borrow_mut().clear();
        view.scroll_page_forwards();
        assert_eq!(view.scroll_position(), 2);
        assert!(seen.borrow().is_empty());
        queue.flush();
        assert!(seen.borrow().contains(&ItemEvent::Exists(false)));
    }

    #[test]
    fn test_scroll_limits() {
        let (_queue, store) = store(&["A", "B", "C", "D", "E"]);
        let view = store.view(2);
        view.scroll_page_backwards();
        assert_eq!(view.scroll_position(), 0);
        view.set_scroll_position(40);
        assert_eq!(view.scroll_position(), 4);
        assert!(!view.can_scroll_forwards());
        view.scroll_forwards();
        assert_eq!(view.scroll_position(), 4);
        view.scroll_backwards();
        assert_eq!(view.scroll_position(), 3);
    }

    #[test]
    fn test_selection_is_exclusive_and_followed() {
        let (queue, tracks) = store(&["1", "2", "3", "4", "5"]);
        let (_, effects) = store(&["Reverb"]);
        SimStore::link_exclusive(&tracks, &effects);
        let view = tracks.view(2);
        view.follow_cursor(true);

        let cursor = Rc::new(Cell::new(None));
        let sink = cursor.clone();
        tracks.subscribe_selection(Rc::new(move |index: Option<usize>| sink.set(index)));

        view.item_at(1).unwrap().select();
        assert_eq!(tracks.selected(), Some(1));
        tracks.select(Some(4));
        assert_eq!(view.scroll_position(), 4);
        queue.flush();
        assert_eq!(cursor.get(), Some(4));

        effects.select(Some(0));
        assert_eq!(tracks.selected(), None);
        tracks.select(Some(9));
        assert_eq!(tracks.selected(), None);
    }

    #[test]
    fn test_collection_commands_are_recorded() {
        let (_queue, store) = store(&["Scene 1"]);
        let view = store.view(4);
        view.stop();
        view.clear_muted();
        assert_eq!(store.take_commands(), vec!["stop", "clear_muted"]);
        assert!(store.take_commands().is_empty());
    }
}
