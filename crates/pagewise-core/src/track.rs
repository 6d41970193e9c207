//! Track banks: channel creation, arm and note broadcast, effect track offset

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bank::{Bank, WindowedBank};
use crate::binding::{DelegatingBinding, EventTap, SelectionSource};
use crate::channel::{ChannelBank, ChannelSource};
use crate::error::{BankError, Result};
use crate::item::{ItemColor, ItemEvent};
use crate::observer::ObserverList;
use crate::remote::TrackHost;
use crate::scene::SceneBank;
use crate::scheduler::{DeferredKind, DeferredTasks};

/// Kind of track to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Audio,
    Instrument,
    Hybrid,
    Effect,
}

impl FromStr for ChannelType {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(Self::Audio),
            "instrument" | "inst" => Ok(Self::Instrument),
            "hybrid" => Ok(Self::Hybrid),
            "effect" | "fx" => Ok(Self::Effect),
            _ => Err(BankError::UnknownChannelType(s.to_string())),
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Audio => "audio",
            Self::Instrument => "instrument",
            Self::Hybrid => "hybrid",
            Self::Effect => "effect",
        };
        f.write_str(name)
    }
}

/// Note played on the track in a window slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub slot: usize,
    pub pitch: u8,
    /// 0 is note off
    pub velocity: u8,
}

/// Configuration applied to a track after it has been created
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewChannel {
    pub name: Option<String>,
    pub color: Option<ItemColor>,
    pub devices: Vec<String>,
}

/// Channel bank over tracks.
///
/// Selection follows the host's cursor track index when a [`TrackHost`] is
/// present: one notification per slot whose flag actually changed.
pub struct TrackBank {
    channels: ChannelBank,
    host: Option<Rc<dyn TrackHost>>,
    armed: Rc<RefCell<Vec<bool>>>,
    record_arm_observers: Rc<ObserverList<(usize, bool)>>,
    note_observers: Rc<ObserverList<NoteEvent>>,
}

impl TrackBank {
    pub fn new(
        source: &ChannelSource,
        host: Option<Rc<dyn TrackHost>>,
        page_size: usize,
        num_sends: usize,
        num_scenes: usize,
        deferred: DeferredTasks,
    ) -> Result<Self> {
        let armed = Rc::new(RefCell::new(vec![false; page_size]));
        let record_arm_observers = Rc::new(ObserverList::new());
        let note_observers = Rc::new(ObserverList::new());
        let tap = Self::event_tap(
            Rc::downgrade(&armed),
            Rc::downgrade(&record_arm_observers),
            Rc::downgrade(&note_observers),
        );

        let mut binding = DelegatingBinding::new(source.channels.clone(), page_size).with_event_tap(tap);
        if let Some(host) = &host {
            binding = binding.with_selection(SelectionSource::Cursor(host.clone()));
        }
        let window = WindowedBank::new(binding, deferred.clone())?;
        let channels = ChannelBank::assemble(window, source, num_sends, num_scenes, deferred)?;

        Ok(Self {
            channels,
            host,
            armed,
            record_arm_observers,
            note_observers,
        })
    }

    fn event_tap(
        armed: Weak<RefCell<Vec<bool>>>,
        record_arm_observers: Weak<ObserverList<(usize, bool)>>,
        note_observers: Weak<ObserverList<NoteEvent>>,
    ) -> EventTap {
        Rc::new(move |slot: usize, event: &ItemEvent| match event {
            ItemEvent::Armed(state) => {
                let Some(armed) = armed.upgrade() else { return };
                let changed = armed
                    .borrow_mut()
                    .get_mut(slot)
                    .is_some_and(|flag| std::mem::replace(flag, *state) != *state);
                if changed {
                    if let Some(observers) = record_arm_observers.upgrade() {
                        observers.notify(&(slot, *state));
                    }
                }
            }
            ItemEvent::Note { pitch, velocity } => {
                if let Some(observers) = note_observers.upgrade() {
                    observers.notify(&NoteEvent {
                        slot,
                        pitch: *pitch,
                        velocity: *velocity,
                    });
                }
            }
            _ => {}
        })
    }

    pub fn channels(&self) -> &ChannelBank {
        &self.channels
    }

    pub fn scene_bank(&self) -> Option<&SceneBank> {
        self.channels.scene_bank()
    }

    /// Create a track. When a name or color is given, the new cursor track
    /// is configured and scrolled into view after the settle delay, since
    /// creation completes asynchronously on the host.
    pub fn add_channel(&self, kind: ChannelType, config: NewChannel) {
        let Some(host) = &self.host else { return };
        debug!(%kind, name = ?config.name, "Creating track");
        host.create_track(kind);
        if config.name.is_none() && config.color.is_none() {
            return;
        }

        let host = host.clone();
        let bank = self.window().downgrade();
        self.window().deferred().defer(DeferredKind::ConfigureChannel, move || {
            if let Some(name) = &config.name {
                host.rename_cursor_track(name);
            }
            if let Some(color) = config.color {
                host.color_cursor_track(color);
            }
            for device in &config.devices {
                host.insert_cursor_track_device(device);
            }
            if let (Some(bank), Some(index)) = (bank.upgrade(), host.cursor_index()) {
                bank.scroll_to(index, true);
            }
        });
    }

    pub fn is_record_armed(&self, slot: usize) -> bool {
        self.armed.borrow().get(slot).copied().unwrap_or(false)
    }

    pub fn has_record_armed(&self) -> bool {
        self.armed.borrow().iter().any(|armed| *armed)
    }

    /// Register a `(window index, armed)` listener
    pub fn add_record_arm_observer(&self, observer: impl Fn(usize, bool) + 'static) {
        self.record_arm_observers
            .add(move |&(slot, armed)| observer(slot, armed));
    }

    pub fn add_note_observer(&self, observer: impl Fn(NoteEvent) + 'static) {
        self.note_observers.add(move |note| observer(*note));
    }

    pub fn can_edit_send(&self, index: usize) -> bool {
        self.channels.can_edit_send(index)
    }

    pub fn edit_send_name(&self, index: usize) -> String {
        self.channels.edit_send_name(index)
    }

    /// Stop all clips of the tracks
    pub fn stop(&self) {
        self.channels.stop();
    }
}

impl Bank for TrackBank {
    fn window(&self) -> &WindowedBank {
        self.channels.window()
    }

    fn enable_observers(&self, enable: bool) {
        self.channels.enable_observers(enable);
    }
}

/// Effect tracks addressed as if appended after all tracks of `main`.
///
/// Positions passed in or returned are in that combined index space.
pub struct EffectTrackBank {
    tracks: TrackBank,
    main: WindowedBank,
}

impl EffectTrackBank {
    pub fn new(tracks: TrackBank, main: WindowedBank) -> Self {
        Self { tracks, main }
    }

    pub fn tracks(&self) -> &TrackBank {
        &self.tracks
    }

    fn local(&self, position: usize) -> Option<usize> {
        position.checked_sub(self.main.item_count())
    }
}

impl Bank for EffectTrackBank {
    fn window(&self) -> &WindowedBank {
        self.tracks.window()
    }

    fn scroll_to(&self, position: usize, adjust_page: bool) {
        if let Some(local) = self.local(position) {
            self.tracks.scroll_to(local, adjust_page);
        }
    }

    fn select_item_at_position(&self, position: usize) {
        if let Some(local) = self.local(position) {
            self.tracks.select_item_at_position(local);
        }
    }

    fn selected_item_position(&self) -> Option<usize> {
        self.tracks
            .selected_item_position()
            .map(|local| local + self.main.item_count())
    }

    fn enable_observers(&self, enable: bool) {
        self.tracks.enable_observers(enable);
    }
}
