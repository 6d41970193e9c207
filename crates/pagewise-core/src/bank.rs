//! The windowed bank contract
//!
//! A bank exposes a fixed number of window slots over a host collection
//! plus navigation. Every operation is total: unbound banks answer with
//! `0`, `None` and `false` and ignore commands.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::binding::{BankBinding, DelegatingBinding, page_start};
use crate::error::{BankError, Result};
use crate::item::Item;
use crate::observer::{ObserverScope, SelectionObservers};
use crate::remote::RemoteCollection;
use crate::scheduler::{DeferredKind, DeferredTasks};

struct BankInner {
    binding: Box<dyn BankBinding>,
    deferred: DeferredTasks,
    observers: Rc<SelectionObservers>,
    scope: RefCell<Option<ObserverScope>>,
}

/// Generic bank over any [`BankBinding`]. Cloning shares the bank.
#[derive(Clone)]
pub struct WindowedBank {
    inner: Rc<BankInner>,
}

impl WindowedBank {
    pub fn new(binding: impl BankBinding + 'static, deferred: DeferredTasks) -> Result<Self> {
        if binding.page_size() == 0 {
            return Err(BankError::InvalidPageSize(0));
        }
        Ok(Self {
            inner: Rc::new(BankInner {
                binding: Box::new(binding),
                deferred: deferred.fork(),
                observers: Rc::new(SelectionObservers::new()),
                scope: RefCell::new(None),
            }),
        })
    }

    /// Bank over a host collection, or inert when `remote` is `None`
    pub fn delegating(
        remote: Option<Rc<dyn RemoteCollection>>,
        page_size: usize,
        deferred: DeferredTasks,
    ) -> Result<Self> {
        Self::new(DelegatingBinding::new(remote, page_size), deferred)
    }

    pub fn unbound(page_size: usize, deferred: DeferredTasks) -> Result<Self> {
        Self::new(DelegatingBinding::unbound(page_size), deferred)
    }

    fn binding(&self) -> &dyn BankBinding {
        self.inner.binding.as_ref()
    }

    pub fn deferred(&self) -> &DeferredTasks {
        &self.inner.deferred
    }

    pub fn downgrade(&self) -> WeakBank {
        WeakBank(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &WindowedBank) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_bound(&self) -> bool {
        self.binding().is_bound()
    }

    pub fn page_size(&self) -> usize {
        self.binding().page_size()
    }

    pub fn item_count(&self) -> usize {
        self.binding().item_count()
    }

    /// First position of the window, `None` when unbound
    pub fn scroll_position(&self) -> Option<usize> {
        self.binding().scroll_position()
    }

    /// Item bound to window slot `index`.
    ///
    /// # Panics
    /// If `index >= page_size()`. The window has a fixed size and indexing
    /// outside of it is a programming error.
    pub fn item(&self, index: usize) -> Item {
        let page_size = self.page_size();
        assert!(
            index < page_size,
            "window slot {index} out of range for page size {page_size}"
        );
        self.binding().item(index)
    }

    pub fn items(&self) -> Vec<Item> {
        (0..self.page_size()).map(|i| self.binding().item(i)).collect()
    }

    pub fn can_scroll_backwards(&self) -> bool {
        self.binding().can_scroll_backwards()
    }

    pub fn can_scroll_forwards(&self) -> bool {
        self.binding().can_scroll_forwards()
    }

    pub fn can_scroll_page_backwards(&self) -> bool {
        self.binding().can_scroll_page_backwards()
    }

    pub fn can_scroll_page_forwards(&self) -> bool {
        self.binding().can_scroll_page_forwards()
    }

    /// Move the window back by one position
    pub fn scroll_backwards(&self) {
        self.binding().scroll_backwards();
    }

    /// Move the window forward by one position
    pub fn scroll_forwards(&self) {
        self.binding().scroll_forwards();
    }

    pub fn scroll_page_backwards(&self) {
        if self.can_scroll_page_backwards() {
            self.binding().scroll_page_backwards();
        }
    }

    pub fn scroll_page_forwards(&self) {
        if self.can_scroll_page_forwards() {
            self.binding().scroll_page_forwards();
        }
    }

    /// Absolute positioning. With `adjust_page` the window starts at the
    /// page containing `position`. Positions outside `0..item_count()` are
    /// ignored.
    pub fn scroll_to(&self, position: usize, adjust_page: bool) {
        let count = self.item_count();
        if position >= count {
            trace!(position, count, "scroll_to out of range ignored");
            return;
        }
        self.binding().scroll_to(position, adjust_page);
    }

    /// Select the item in window slot `index`
    pub fn select_item(&self, index: usize) {
        if index < self.page_size() && self.binding().supports_selection() {
            self.binding().select_slot(index);
        }
    }

    /// Scroll the page containing `position` into view and select it. When
    /// the window has to move, the selection waits for the settle delay.
    pub fn select_item_at_position(&self, position: usize) {
        if !self.binding().supports_selection() || position >= self.item_count() {
            return;
        }
        let page_size = self.page_size();
        if let Some(start) = self.scroll_position() {
            if (start..start + page_size).contains(&position) {
                self.binding().select_slot(position - start);
                return;
            }
        }
        self.scroll_to(position, true);
        let slot = position - page_start(position, page_size);
        self.defer_select(DeferredKind::PositionSelect, slot);
    }

    /// Select the item after the selected one, paging forward at the end
    /// of the window
    pub fn select_next_item(&self) {
        if !self.binding().supports_selection() {
            self.scroll_forwards();
            return;
        }
        let index = self.selected_item_index().map_or(0, |i| i + 1);
        if index == self.page_size() {
            self.select_next_page();
        } else {
            self.select_item(index);
        }
    }

    /// Select the item before the selected one, paging backward at the
    /// start of the window
    pub fn select_previous_item(&self) {
        if !self.binding().supports_selection() {
            self.scroll_backwards();
            return;
        }
        match self.selected_item_index() {
            None => self.select_item(0),
            Some(0) => self.select_previous_page(),
            Some(index) => self.select_item(index - 1),
        }
    }

    /// Page forward, then select the first slot once the host has rebound
    /// the window
    pub fn select_next_page(&self) {
        if !self.can_scroll_page_forwards() {
            return;
        }
        self.binding().scroll_page_forwards();
        if self.binding().supports_selection() {
            self.defer_select(DeferredKind::PageSelect, 0);
        }
    }

    /// Page backward, then select the last slot once the host has rebound
    /// the window
    pub fn select_previous_page(&self) {
        if !self.can_scroll_page_backwards() {
            return;
        }
        self.binding().scroll_page_backwards();
        if self.binding().supports_selection() {
            self.defer_select(DeferredKind::PageSelect, self.page_size() - 1);
        }
    }

    fn defer_select(&self, kind: DeferredKind, slot: usize) {
        let bank = self.downgrade();
        self.inner.deferred.defer(kind, move || {
            if let Some(bank) = bank.upgrade() {
                trace!(?kind, slot, "Deferred selection");
                bank.select_item(slot);
            }
        });
    }

    pub fn selected_item(&self) -> Option<Item> {
        if !self.binding().supports_selection() {
            return None;
        }
        (0..self.page_size())
            .map(|i| self.binding().item(i))
            .find(|item| item.selected)
    }

    /// Window slot of the selected item
    pub fn selected_item_index(&self) -> Option<usize> {
        self.selected_item().map(|item| item.index)
    }

    /// Absolute position of the selected item
    pub fn selected_item_position(&self) -> Option<usize> {
        let item = self.selected_item()?;
        item.position
            .or_else(|| self.scroll_position().map(|start| start + item.index))
    }

    /// Register a `(window index, is selected)` listener
    pub fn add_selection_observer(&self, observer: impl Fn(usize, bool) + 'static) {
        self.inner
            .observers
            .add(move |&(index, selected)| observer(index, selected));
    }

    /// Acquire (`true`) or release (`false`) all host subscriptions of the
    /// bank's items
    pub fn enable_observers(&self, enable: bool) {
        if enable {
            if self.inner.scope.borrow().is_some() {
                return;
            }
            let scope = self.binding().attach(&self.inner.observers);
            debug!(subscriptions = scope.len(), "Bank observers enabled");
            *self.inner.scope.borrow_mut() = Some(scope);
        } else {
            let released = self.inner.scope.borrow_mut().take();
            if let Some(scope) = released {
                debug!(subscriptions = scope.len(), "Bank observers disabled");
                drop(scope);
            }
        }
    }

    pub fn observers_enabled(&self) -> bool {
        self.inner.scope.borrow().is_some()
    }

    pub fn set_skip_disabled_items(&self, skip: bool) {
        if let Some(remote) = self.binding().remote() {
            remote.set_skip_disabled_items(skip);
        }
    }

    pub fn follow_cursor(&self, follow: bool) {
        if let Some(remote) = self.binding().remote() {
            remote.follow_cursor(follow);
        }
    }

    pub fn set_clip_launcher_feedback(&self, show: bool) {
        if let Some(remote) = self.binding().remote() {
            remote.set_clip_launcher_feedback(show);
        }
    }

    pub fn stop(&self) {
        if let Some(remote) = self.binding().remote() {
            remote.stop();
        }
    }

    pub fn clear_muted_pads(&self) {
        if let Some(remote) = self.binding().remote() {
            remote.clear_muted();
        }
    }
}

/// Non-owning bank handle for deferred actions
#[derive(Clone)]
pub struct WeakBank(Weak<BankInner>);

impl WeakBank {
    pub fn upgrade(&self) -> Option<WindowedBank> {
        self.0.upgrade().map(|inner| WindowedBank { inner })
    }
}

/// The bank contract as seen by controller code.
///
/// Every method defaults to the inner [`WindowedBank`]; specializations
/// override the operations whose meaning differs.
pub trait Bank {
    fn window(&self) -> &WindowedBank;

    fn page_size(&self) -> usize {
        self.window().page_size()
    }

    fn item_count(&self) -> usize {
        self.window().item_count()
    }

    fn scroll_position(&self) -> Option<usize> {
        self.window().scroll_position()
    }

    fn item(&self, index: usize) -> Item {
        self.window().item(index)
    }

    fn can_scroll_page_backwards(&self) -> bool {
        self.window().can_scroll_page_backwards()
    }

    fn can_scroll_page_forwards(&self) -> bool {
        self.window().can_scroll_page_forwards()
    }

    fn scroll_backwards(&self) {
        self.window().scroll_backwards()
    }

    fn scroll_forwards(&self) {
        self.window().scroll_forwards()
    }

    fn scroll_page_backwards(&self) {
        self.window().scroll_page_backwards()
    }

    fn scroll_page_forwards(&self) {
        self.window().scroll_page_forwards()
    }

    fn scroll_to(&self, position: usize, adjust_page: bool) {
        self.window().scroll_to(position, adjust_page)
    }

    fn select_item_at_position(&self, position: usize) {
        self.window().select_item_at_position(position)
    }

    fn select_next_item(&self) {
        self.window().select_next_item()
    }

    fn select_previous_item(&self) {
        self.window().select_previous_item()
    }

    fn select_next_page(&self) {
        self.window().select_next_page()
    }

    fn select_previous_page(&self) {
        self.window().select_previous_page()
    }

    fn selected_item(&self) -> Option<Item> {
        self.window().selected_item()
    }

    fn selected_item_index(&self) -> Option<usize> {
        self.window().selected_item_index()
    }

    fn selected_item_position(&self) -> Option<usize> {
        self.window().selected_item_position()
    }

    fn enable_observers(&self, enable: bool) {
        self.window().enable_observers(enable)
    }

    /// Enable observers until the returned guard is dropped
    fn activate(&self) -> Activation<'_, Self>
    where
        Self: Sized,
    {
        self.enable_observers(true);
        Activation { bank: self }
    }
}

impl Bank for WindowedBank {
    fn window(&self) -> &WindowedBank {
        self
    }
}

/// Observers stay subscribed while this guard lives
pub struct Activation<'a, B: Bank + ?Sized> {
    bank: &'a B,
}

impl<B: Bank + ?Sized> Drop for Activation<'_, B> {
    fn drop(&mut self) {
        self.bank.enable_observers(false);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::binding::FlatBinding;
    use crate::binding::fake::FakeCollection;
    use crate::config::SettleConfig;
    use crate::item::ItemEvent;
    use crate::scheduler::ManualScheduler;

    fn setup(page_size: usize, count: usize) -> (Rc<ManualScheduler>, Rc<FakeCollection>, WindowedBank) {
        let scheduler = Rc::new(ManualScheduler::new());
        let remote = FakeCollection::new(page_size, count);
        let deferred = DeferredTasks::new(scheduler.clone(), SettleConfig::default());
        let bank = WindowedBank::delegating(remote.handle(), page_size, deferred).unwrap();
        bank.enable_observers(true);
        (scheduler, remote, bank)
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let deferred = DeferredTasks::new(Rc::new(ManualScheduler::new()), SettleConfig::default());
        assert_eq!(
            WindowedBank::unbound(0, deferred).err(),
            Some(BankError::InvalidPageSize(0))
        );
    }

    #[test]
    fn test_select_next_without_selection_picks_first_slot() {
        let (_, remote, bank) = setup(4, 10);
        bank.select_next_item();
        assert_eq!(remote.log.take(), vec!["select 0"]);
    }

    #[test]
    fn test_select_next_moves_within_window() {
        let (_, remote, bank) = setup(4, 10);
        remote.items[1].emit(ItemEvent::Selected(true));
        bank.select_next_item();
        bank.select_previous_item();
        assert_eq!(remote.log.take(), vec!["select 2", "select 0"]);
    }

    #[test]
    fn test_select_next_at_last_slot_pages_then_settles() {
        let (scheduler, remote, bank) = setup(4, 10);
        remote.items[3].emit(ItemEvent::Selected(true));

        bank.select_next_item();
        assert_eq!(remote.log.take(), vec!["scroll_page_forwards"]);

        scheduler.advance(Duration::from_millis(74));
        assert!(remote.log.take().is_empty());
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(remote.log.take(), vec!["select 0"]);
    }

    #[test]
    fn test_select_previous_at_first_slot_selects_last_after_settle() {
        let (scheduler, remote, bank) = setup(4, 10);
        remote.position.set(4);
        remote.items[0].emit(ItemEvent::Selected(true));

        bank.select_previous_item();
        scheduler.advance(Duration::from_millis(75));
        assert_eq!(remote.log.take(), vec!["scroll_page_backwards", "select 3"]);
    }

    #[test]
    fn test_select_next_page_without_room_is_noop() {
        let (scheduler, remote, bank) = setup(4, 4);
        bank.select_next_page();
        scheduler.advance(Duration::from_millis(100));
        assert!(remote.log.take().is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_scroll_to_ignores_out_of_range() {
        let (_, remote, bank) = setup(4, 10);
        bank.scroll_to(10, true);
        bank.scroll_to(6, true);
        assert_eq!(remote.log.take(), vec!["set_scroll_position 4"]);
    }

    #[test]
    fn test_select_item_at_position() {
        let (scheduler, remote, bank) = setup(4, 10);
        bank.select_item_at_position(2);
        bank.select_item_at_position(9);
        assert_eq!(remote.log.take(), vec!["select 2", "set_scroll_position 8"]);
        scheduler.advance(Duration::from_millis(75));
        assert_eq!(remote.log.take(), vec!["select 1"]);
    }

    #[test]
    fn test_selected_item_position_falls_back_to_window_start() {
        let (_, remote, bank) = setup(4, 10);
        remote.position.set(4);
        remote.items[2].emit(ItemEvent::Selected(true));
        assert_eq!(bank.selected_item_index(), Some(2));
        assert_eq!(bank.selected_item_position(), Some(6));
        remote.items[2].emit(ItemEvent::Position(Some(7)));
        assert_eq!(bank.selected_item_position(), Some(7));
    }

    #[test]
    fn test_unbound_bank_sentinels() {
        let scheduler = Rc::new(ManualScheduler::new());
        let bank = WindowedBank::unbound(8, DeferredTasks::new(scheduler.clone(), SettleConfig::default())).unwrap();
        bank.enable_observers(true);
        assert_eq!(bank.item_count(), 0);
        assert_eq!(bank.scroll_position(), None);
        assert!(!bank.can_scroll_page_forwards());
        assert!(!bank.can_scroll_backwards());
        bank.select_next_item();
        bank.select_previous_item();
        bank.select_next_page();
        bank.scroll_to(0, true);
        bank.select_item_at_position(0);
        bank.stop();
        assert_eq!(bank.selected_item(), None);
        assert_eq!(bank.item(7), Item::empty(7));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_item_outside_window_panics() {
        let (_, _, bank) = setup(4, 10);
        bank.item(4);
    }

    #[test]
    fn test_selection_observers_and_scope_release() {
        let (_, remote, bank) = setup(2, 2);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bank.add_selection_observer(move |index, selected| sink.borrow_mut().push((index, selected)));

        remote.items[0].emit(ItemEvent::Selected(true));
        bank.enable_observers(false);
        assert_eq!(remote.listener_count(), 0);
        remote.items[1].emit(ItemEvent::Selected(true));

        assert_eq!(*seen.borrow(), vec![(0, true)]);
        {
            let _active = bank.activate();
            assert_eq!(remote.listener_count(), 2);
        }
        assert_eq!(remote.listener_count(), 0);
    }

    #[test]
    fn test_flat_bank_navigation_degrades_to_paging() {
        let scheduler = Rc::new(ManualScheduler::new());
        let pool = FakeCollection::new(32, 32);
        let deferred = DeferredTasks::new(scheduler.clone(), SettleConfig::default());
        let bank = WindowedBank::new(FlatBinding::new(pool.handle(), 8, 4), deferred).unwrap();

        for _ in 0..4 {
            bank.select_next_item();
        }
        assert_eq!(bank.scroll_position(), Some(24));
        bank.select_previous_item();
        assert_eq!(bank.scroll_position(), Some(16));
        bank.select_next_page();
        assert_eq!(bank.scroll_position(), Some(24));
        assert_eq!(bank.selected_item(), None);
        assert_eq!(scheduler.pending(), 0);
    }
}
