//! Marker bank with time-based next/previous navigation
//!
//! Markers are sparse points on the timeline, so "next" and "previous" are
//! answered by searching a large unpaged shadow of all markers for the one
//! nearest to the play position, and the answer moves the transport.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::bank::{Bank, WindowedBank};
use crate::error::Result;
use crate::item::ItemEvent;
use crate::observer::{ObserverScope, Subscription};
use crate::remote::{RemoteCollection, Transport};
use crate::scheduler::DeferredTasks;

pub const DEFAULT_SHADOW_SIZE: usize = 100;

/// Shadow entry, never exposed as an item
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerEntry {
    pub exists: bool,
    /// Position in beats
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDirection {
    Next,
    Previous,
}

/// Time of the existing marker strictly after (or before) `play_position`
/// with the smallest distance to it. On equal distance the first entry in
/// scan order wins.
pub fn nearest_marker(entries: &[MarkerEntry], play_position: f64, direction: SeekDirection) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for entry in entries.iter().filter(|e| e.exists) {
        let distance = match direction {
            SeekDirection::Next => entry.time - play_position,
            SeekDirection::Previous => play_position - entry.time,
        };
        if distance <= 0.0 {
            continue;
        }
        if best.is_none_or(|(closest, _)| distance < closest) {
            best = Some((distance, entry.time));
        }
    }
    best.map(|(_, time)| time)
}

pub struct MarkerBank {
    window: WindowedBank,
    shadow_remote: Option<Rc<dyn RemoteCollection>>,
    shadow: Rc<RefCell<Vec<MarkerEntry>>>,
    shadow_scope: RefCell<Option<ObserverScope>>,
    transport: Option<Rc<dyn Transport>>,
}

impl MarkerBank {
    /// `markers` backs the visible window; `shadow` is a second, larger
    /// window over the same markers that is never scrolled
    pub fn new(
        markers: Option<Rc<dyn RemoteCollection>>,
        shadow: Option<Rc<dyn RemoteCollection>>,
        transport: Option<Rc<dyn Transport>>,
        page_size: usize,
        shadow_size: usize,
        deferred: DeferredTasks,
    ) -> Result<Self> {
        Ok(Self {
            window: WindowedBank::delegating(markers, page_size, deferred)?,
            shadow_remote: shadow,
            shadow: Rc::new(RefCell::new(vec![MarkerEntry::default(); shadow_size])),
            shadow_scope: RefCell::new(None),
            transport,
        })
    }

    /// Snapshot of the shadow window
    pub fn shadow(&self) -> Vec<MarkerEntry> {
        self.shadow.borrow().clone()
    }

    fn seek(&self, direction: SeekDirection) {
        let Some(transport) = &self.transport else { return };
        let play_position = transport.play_position();
        match nearest_marker(&self.shadow.borrow(), play_position, direction) {
            Some(time) => transport.set_play_position(time),
            None => trace!(?direction, play_position, "No marker to move to"),
        }
    }

    fn attach_shadow(&self) -> ObserverScope {
        let mut scope = ObserverScope::new();
        let Some(remote) = &self.shadow_remote else {
            return scope;
        };
        let size = self.shadow.borrow().len();
        for slot in 0..size {
            let Some(item) = remote.item_at(slot) else { continue };
            let shadow = Rc::downgrade(&self.shadow);
            let listener = Rc::new(move |event: &ItemEvent| {
                let Some(shadow) = shadow.upgrade() else { return };
                let mut shadow = shadow.borrow_mut();
                let Some(entry) = shadow.get_mut(slot) else { return };
                match event {
                    ItemEvent::Exists(exists) => entry.exists = *exists,
                    ItemEvent::Time(time) => entry.time = *time,
                    _ => {}
                }
            });
            scope.push(Subscription::item(item, listener));
        }
        scope
    }
}

impl Bank for MarkerBank {
    fn window(&self) -> &WindowedBank {
        &self.window
    }

    /// Move the transport to the nearest marker after the play position
    fn select_next_item(&self) {
        self.seek(SeekDirection::Next);
    }

    /// Move the transport to the nearest marker before the play position
    fn select_previous_item(&self) {
        self.seek(SeekDirection::Previous);
    }

    fn enable_observers(&self, enable: bool) {
        self.window.enable_observers(enable);
        if enable {
            if self.shadow_scope.borrow().is_none() {
                let scope = self.attach_shadow();
                *self.shadow_scope.borrow_mut() = Some(scope);
            }
        } else {
            let released = self.shadow_scope.borrow_mut().take();
            drop(released);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::binding::fake::FakeCollection;
    use crate::config::SettleConfig;
    use crate::scheduler::ManualScheduler;

    struct FakeTransport(Cell<f64>);

    impl Transport for FakeTransport {
        fn play_position(&self) -> f64 {
            self.0.get()
        }

        fn set_play_position(&self, beats: f64) {
            self.0.set(beats);
        }
    }

    fn entries(times: &[f64]) -> Vec<MarkerEntry> {
        times.iter().map(|&time| MarkerEntry { exists: true, time }).collect()
    }

    #[test]
    fn test_nearest_marker_in_both_directions() {
        let markers = entries(&[2.0, 5.0, 9.0]);
        assert_eq!(nearest_marker(&markers, 4.0, SeekDirection::Next), Some(5.0));
        assert_eq!(nearest_marker(&markers, 4.0, SeekDirection::Previous), Some(2.0));
        assert_eq!(nearest_marker(&markers, 10.0, SeekDirection::Next), None);
        assert_eq!(nearest_marker(&markers, 2.0, SeekDirection::Previous), None);
        assert_eq!(nearest_marker(&markers, 5.0, SeekDirection::Next), Some(9.0));
    }

    #[test]
    fn test_nearest_marker_skips_missing_and_keeps_first_on_tie() {
        let mut markers = entries(&[7.0, 3.0, 3.0]);
        markers[0].exists = false;
        assert_eq!(nearest_marker(&markers, 1.0, SeekDirection::Next), Some(3.0));
        let markers = entries(&[8.0, 2.0]);
        assert_eq!(nearest_marker(&markers, 5.0, SeekDirection::Next), Some(8.0));
    }

    #[test]
    fn test_bank_moves_transport_from_shadow() {
        let shadow = FakeCollection::new(DEFAULT_SHADOW_SIZE, 3);
        let transport = Rc::new(FakeTransport(Cell::new(4.0)));
        let deferred = DeferredTasks::new(Rc::new(ManualScheduler::new()), SettleConfig::default());
        let transport_handle: Rc<dyn Transport> = transport.clone();
        let bank = MarkerBank::new(
            None,
            shadow.handle(),
            Some(transport_handle),
            4,
            DEFAULT_SHADOW_SIZE,
            deferred,
        )
        .unwrap();
        bank.enable_observers(true);
        for (slot, time) in [2.0, 5.0, 9.0].into_iter().enumerate() {
            shadow.items[slot].emit(ItemEvent::Exists(true));
            shadow.items[slot].emit(ItemEvent::Time(time));
        }

        bank.select_next_item();
        assert_eq!(transport.0.get(), 5.0);
        transport.0.set(4.0);
        bank.select_previous_item();
        assert_eq!(transport.0.get(), 2.0);
        transport.0.set(10.0);
        bank.select_next_item();
        assert_eq!(transport.0.get(), 10.0);

        bank.enable_observers(false);
        assert_eq!(shadow.listener_count(), 0);
    }
}
