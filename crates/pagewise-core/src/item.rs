//! Window slot items and the events that refresh them

use serde::{Deserialize, Serialize};

/// RGB color of a remote entity, components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ItemColor {
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// Color lookup result for the selected channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorEntry {
    /// Nothing selected, light off
    #[default]
    Off,
    Color(ItemColor),
}

/// One slot of a bank window.
///
/// `index` is window-relative and never changes; the remote entity bound to
/// the slot does, as the window scrolls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    pub index: usize,
    pub exists: bool,
    pub name: String,
    pub selected: bool,
    pub color: ItemColor,
    /// Absolute index of the bound remote entity, if known
    pub position: Option<usize>,
}

impl Item {
    /// Empty slot, used for unbound windows and out-of-range reads
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Apply a push notification. Returns the new selection flag if it changed.
    pub(crate) fn apply(&mut self, event: &ItemEvent) -> Option<bool> {
        match event {
            ItemEvent::Exists(exists) => self.exists = *exists,
            ItemEvent::Name(name) => self.name.clone_from(name),
            ItemEvent::Color(color) => self.color = *color,
            ItemEvent::Position(position) => self.position = *position,
            ItemEvent::Selected(selected) => {
                if self.selected != *selected {
                    self.selected = *selected;
                    return Some(*selected);
                }
            }
            ItemEvent::Armed(_) | ItemEvent::Note { .. } | ItemEvent::Time(_) => {}
        }
        None
    }
}

/// Push notification from a remote item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    Exists(bool),
    Name(String),
    Color(ItemColor),
    Selected(bool),
    /// The slot was rebound to another remote entity
    Position(Option<usize>),
    /// Record arm state of a track
    Armed(bool),
    /// Note played on a track, velocity 0 is note off
    Note { pitch: u8, velocity: u8 },
    /// Timeline position of a marker, in beats
    Time(f64),
}
