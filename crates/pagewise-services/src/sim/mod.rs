//! Simulated DAW host
//!
//! Implements every capability the bank layer consumes over in-memory
//! collections. Commands change host state immediately; the resulting push
//! notifications wait in a queue until [`SimHost::flush`], so banks see the
//! same latency they would against a real host.

mod pages;
mod queue;
mod store;

pub use pages::SimPageCursor;
pub use queue::{Notification, NotificationQueue};
pub use store::{SimCollection, SimEntity, SimStore};

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use pagewise_core::remote::{CursorListener, ListenerId, TrackHost, Transport};
use pagewise_core::{ChannelType, ItemColor};
use tracing::debug;

/// Transport reduced to its play position
#[derive(Debug, Default)]
pub struct SimTransport {
    position: Cell<f64>,
}

impl Transport for SimTransport {
    fn play_position(&self) -> f64 {
        self.position.get()
    }

    fn set_play_position(&self, beats: f64) {
        debug!(beats, "Transport moved");
        self.position.set(beats);
    }
}

pub struct SimHost {
    queue: Rc<NotificationQueue>,
    tracks: Rc<SimStore>,
    effect_tracks: Rc<SimStore>,
    scenes: Rc<SimStore>,
    clip_slots: Rc<SimStore>,
    devices: Rc<SimStore>,
    layers: Rc<SimStore>,
    drum_pads: Rc<SimStore>,
    parameters: Rc<SimStore>,
    markers: Rc<SimStore>,
    user_parameters: Rc<SimStore>,
    parameter_pages: Rc<SimPageCursor>,
    transport: Rc<SimTransport>,
    cursor_subscriptions: RefCell<BTreeMap<ListenerId, [ListenerId; 2]>>,
    next_cursor_id: Cell<ListenerId>,
}

impl SimHost {
    /// Host with every collection empty
    pub fn new() -> Rc<Self> {
        let queue = Rc::new(NotificationQueue::new());
        let store = || SimStore::new(queue.clone());
        let tracks = store();
        let effect_tracks = store();
        SimStore::link_exclusive(&tracks, &effect_tracks);
        Rc::new(Self {
            tracks,
            effect_tracks,
            scenes: store(),
            clip_slots: store(),
            devices: store(),
            layers: store(),
            drum_pads: store(),
            parameters: store(),
            markers: store(),
            user_parameters: store(),
            parameter_pages: SimPageCursor::new(queue.clone(), Vec::new()),
            transport: Rc::new(SimTransport::default()),
            cursor_subscriptions: RefCell::new(BTreeMap::new()),
            next_cursor_id: Cell::new(0),
            queue,
        })
    }

    /// Host populated with a small session
    pub fn demo() -> Rc<Self> {
        let host = Self::new();
        let fill = |store: &SimStore, prefix: &str, count: usize| {
            for i in 1..=count {
                store.push(SimEntity::named(format!("{prefix} {i}")));
            }
        };
        fill(&host.tracks, "Track", 12);
        fill(&host.effect_tracks, "FX", 3);
        fill(&host.scenes, "Scene", 16);
        fill(&host.clip_slots, "Clip", 16);
        fill(&host.devices, "Device", 3);
        fill(&host.layers, "Layer", 4);
        fill(&host.drum_pads, "Pad", 16);
        fill(&host.parameters, "Param", 24);
        fill(&host.user_parameters, "User", 32);
        for (i, time) in [0.0, 8.0, 16.0, 32.0, 48.0].into_iter().enumerate() {
            host.markers.push(SimEntity::marker(format!("Marker {}", i + 1), time));
        }
        host.parameter_pages
            .set_names((1..=10).map(|i| format!("Page {i}")).collect());
        host.tracks.select(Some(0));
        host.queue.flush();
        host
    }

    pub fn queue(&self) -> &Rc<NotificationQueue> {
        &self.queue
    }

    /// Deliver queued notifications. Returns the number delivered.
    pub fn flush(&self) -> usize {
        self.queue.flush()
    }

    pub fn tracks(&self) -> &Rc<SimStore> {
        &self.tracks
    }

    pub fn effect_tracks(&self) -> &Rc<SimStore> {
        &self.effect_tracks
    }

    pub fn scenes(&self) -> &Rc<SimStore> {
        &self.scenes
    }

    /// Clip slots of the cursor track
    pub fn clip_slots(&self) -> &Rc<SimStore> {
        &self.clip_slots
    }

    /// Devices of the cursor track
    pub fn devices(&self) -> &Rc<SimStore> {
        &self.devices
    }

    pub fn layers(&self) -> &Rc<SimStore> {
        &self.layers
    }

    pub fn drum_pads(&self) -> &Rc<SimStore> {
        &self.drum_pads
    }

    pub fn parameters(&self) -> &Rc<SimStore> {
        &self.parameters
    }

    pub fn markers(&self) -> &Rc<SimStore> {
        &self.markers
    }

    pub fn user_parameters(&self) -> &Rc<SimStore> {
        &self.user_parameters
    }

    pub fn parameter_pages(&self) -> &Rc<SimPageCursor> {
        &self.parameter_pages
    }

    pub fn transport(&self) -> &Rc<SimTransport> {
        &self.transport
    }

    /// Store and index of the cursor track
    fn cursor_entity(&self) -> Option<(&SimStore, usize)> {
        self.tracks
            .selected()
            .map(|index| (self.tracks.as_ref(), index))
            .or_else(|| {
                self.effect_tracks
                    .selected()
                    .map(|index| (self.effect_tracks.as_ref(), index))
            })
    }

    fn update_cursor_track(&self, change: impl FnOnce(&mut SimEntity)) {
        if let Some((store, index)) = self.cursor_entity() {
            store.update(index, change);
        }
    }
}

/// Effect tracks follow all tracks in the cursor index space
fn cursor_index(tracks: &SimStore, effect_tracks: &SimStore) -> Option<usize> {
    tracks
        .selected()
        .or_else(|| effect_tracks.selected().map(|index| tracks.len() + index))
}

impl TrackHost for SimHost {
    fn cursor_index(&self) -> Option<usize> {
        cursor_index(&self.tracks, &self.effect_tracks)
    }

    fn subscribe_cursor_index(&self, listener: CursorListener) -> ListenerId {
        let relay = |tracks: Weak<SimStore>, effect_tracks: Weak<SimStore>| -> CursorListener {
            let listener = listener.clone();
            Rc::new(move |_: Option<usize>| {
                let (Some(tracks), Some(effect_tracks)) = (tracks.upgrade(), effect_tracks.upgrade()) else {
                    return;
                };
                listener(cursor_index(&tracks, &effect_tracks));
            })
        };
        let tracks = Rc::downgrade(&self.tracks);
        let effect_tracks = Rc::downgrade(&self.effect_tracks);
        let ids = [
            self.tracks
                .subscribe_selection(relay(tracks.clone(), effect_tracks.clone())),
            self.effect_tracks
                .subscribe_selection(relay(tracks, effect_tracks)),
        ];

        let id = self.next_cursor_id.get();
        self.next_cursor_id.set(id + 1);
        self.cursor_subscriptions.borrow_mut().insert(id, ids);
        id
    }

    fn unsubscribe_cursor_index(&self, id: ListenerId) {
        let removed = self.cursor_subscriptions.borrow_mut().remove(&id);
        if let Some([track_id, effect_id]) = removed {
            self.tracks.unsubscribe_selection(track_id);
            self.effect_tracks.unsubscribe_selection(effect_id);
        }
    }

    /// New tracks are appended and become the cursor track
    fn create_track(&self, kind: ChannelType) {
        let (store, label) = match kind {
            ChannelType::Audio => (&self.tracks, "Audio"),
            ChannelType::Instrument => (&self.tracks, "Inst"),
            ChannelType::Hybrid => (&self.tracks, "Hybrid"),
            ChannelType::Effect => (&self.effect_tracks, "FX"),
        };
        let index = store.push(SimEntity::named(format!("{label} {}", store.len() + 1)));
        debug!(%kind, index, "Track created");
        store.select(Some(index));
    }

    fn rename_cursor_track(&self, name: &str) {
        self.update_cursor_track(|track| track.name = name.to_string());
    }

    fn color_cursor_track(&self, color: ItemColor) {
        self.update_cursor_track(|track| track.color = color);
    }

    fn insert_cursor_track_device(&self, device: &str) {
        self.devices.push(SimEntity::named(device));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_index_spans_effect_tracks() {
        let host = SimHost::demo();
        assert_eq!(host.cursor_index(), Some(0));
        host.effect_tracks().select(Some(1));
        assert_eq!(host.tracks().selected(), None);
        assert_eq!(host.cursor_index(), Some(13));
    }

    #[test]
    fn test_cursor_listener_sees_final_index() {
        let host = SimHost::demo();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = host.subscribe_cursor_index(Rc::new(move |index: Option<usize>| sink.borrow_mut().push(index)));

        host.effect_tracks().select(Some(0));
        host.flush();
        assert!(!seen.borrow().is_empty());
        assert!(seen.borrow().iter().all(|index| *index == Some(12)));

        host.unsubscribe_cursor_index(id);
        seen.borrow_mut().clear();
        host.tracks().select(Some(3));
        host.flush();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_create_and_configure_cursor_track() {
        let host = SimHost::new();
        host.create_track(ChannelType::Instrument);
        host.rename_cursor_track("Lead");
        host.color_cursor_track(ItemColor::new(1.0, 0.0, 0.0));
        host.insert_cursor_track_device("Polysynth");

        let track = host.tracks().entity(0).unwrap();
        assert_eq!(track.name, "Lead");
        assert_eq!(track.color, ItemColor::new(1.0, 0.0, 0.0));
        assert_eq!(host.devices().entity(0).unwrap().name, "Polysynth");

        host.create_track(ChannelType::Effect);
        assert_eq!(host.cursor_index(), Some(1));
        assert_eq!(host.effect_tracks().entity(0).unwrap().name, "FX 1");
    }
}
