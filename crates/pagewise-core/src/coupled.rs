//! Two banks paged in lockstep

use std::cell::RefCell;

use crate::bank::WindowedBank;

/// A leader bank and an optional follower that receives every window or
/// selection change first, with the same arguments.
///
/// The follower is referenced, not owned: it may be re-pointed at any time.
pub struct CoupledBankPair {
    leader: WindowedBank,
    follower: RefCell<Option<WindowedBank>>,
}

impl CoupledBankPair {
    pub fn new(leader: WindowedBank, follower: Option<WindowedBank>) -> Self {
        Self {
            leader,
            follower: RefCell::new(follower),
        }
    }

    pub fn leader(&self) -> &WindowedBank {
        &self.leader
    }

    pub fn follower(&self) -> Option<WindowedBank> {
        self.follower.borrow().clone()
    }

    pub fn set_follower(&self, follower: Option<WindowedBank>) {
        *self.follower.borrow_mut() = follower;
    }

    /// Apply `op` to the follower, then to the leader
    fn both(&self, op: impl Fn(&WindowedBank)) {
        let follower = self.follower();
        if let Some(follower) = &follower {
            op(follower);
        }
        op(&self.leader);
    }

    pub fn scroll_backwards(&self) {
        self.both(WindowedBank::scroll_backwards);
    }

    pub fn scroll_forwards(&self) {
        self.both(WindowedBank::scroll_forwards);
    }

    pub fn scroll_page_backwards(&self) {
        self.both(WindowedBank::scroll_page_backwards);
    }

    pub fn scroll_page_forwards(&self) {
        self.both(WindowedBank::scroll_page_forwards);
    }

    pub fn scroll_to(&self, position: usize, adjust_page: bool) {
        self.both(|bank| bank.scroll_to(position, adjust_page));
    }

    pub fn select_item(&self, index: usize) {
        self.both(|bank| bank.select_item(index));
    }

    pub fn select_item_at_position(&self, position: usize) {
        self.both(|bank| bank.select_item_at_position(position));
    }

    pub fn select_next_item(&self) {
        self.both(WindowedBank::select_next_item);
    }

    pub fn select_previous_item(&self) {
        self.both(WindowedBank::select_previous_item);
    }

    pub fn select_next_page(&self) {
        self.both(WindowedBank::select_next_page);
    }

    pub fn select_previous_page(&self) {
        self.both(WindowedBank::select_previous_page);
    }
}
