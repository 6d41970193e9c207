//! Scene bank coupled to the cursor track's clip slot bank

use crate::bank::{Bank, WindowedBank};
use crate::coupled::CoupledBankPair;

/// Scenes paged together with the clip slots of the cursor track, so that
/// scene row `i` and slot row `i` always show the same grid row
pub struct SceneBank {
    pair: CoupledBankPair,
}

impl SceneBank {
    pub fn new(scenes: WindowedBank, slots: Option<WindowedBank>) -> Self {
        Self {
            pair: CoupledBankPair::new(scenes, slots),
        }
    }

    /// Slot bank currently following this scene bank
    pub fn slot_bank(&self) -> Option<WindowedBank> {
        self.pair.follower()
    }

    /// Point the coupling at another track's slot bank
    pub fn set_slot_bank(&self, slots: Option<WindowedBank>) {
        self.pair.set_follower(slots);
    }

    pub fn select_item(&self, index: usize) {
        self.pair.select_item(index);
    }

    /// Stop playback of all scenes
    pub fn stop(&self) {
        self.pair.leader().stop();
    }
}

impl Bank for SceneBank {
    fn window(&self) -> &WindowedBank {
        self.pair.leader()
    }

    fn scroll_backwards(&self) {
        self.pair.scroll_backwards();
    }

    fn scroll_forwards(&self) {
        self.pair.scroll_forwards();
    }

    fn scroll_page_backwards(&self) {
        self.pair.scroll_page_backwards();
    }

    fn scroll_page_forwards(&self) {
        self.pair.scroll_page_forwards();
    }

    fn scroll_to(&self, position: usize, adjust_page: bool) {
        self.pair.scroll_to(position, adjust_page);
    }

    fn select_item_at_position(&self, position: usize) {
        self.pair.select_item_at_position(position);
    }

    fn select_next_item(&self) {
        self.pair.select_next_item();
    }

    fn select_previous_item(&self) {
        self.pair.select_previous_item();
    }

    fn select_next_page(&self) {
        self.pair.select_next_page();
    }

    fn select_previous_page(&self) {
        self.pair.select_previous_page();
    }

    /// The slot bank belongs to the cursor track and manages its own
    /// subscriptions
    fn enable_observers(&self, enable: bool) {
        self.pair.leader().enable_observers(enable);
    }
}
