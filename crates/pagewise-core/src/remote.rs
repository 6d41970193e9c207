//! Capability surface consumed from the DAW host
//!
//! Commands issued through these traits take effect on the host side
//! asynchronously. Their results come back later through the registered
//! listeners, which the host invokes on the controller thread.

use std::rc::Rc;

use crate::item::{ItemColor, ItemEvent};
use crate::track::ChannelType;

/// Handle returned by listener registration, passed back to unsubscribe
pub type ListenerId = u64;

pub type ItemListener = Rc<dyn Fn(&ItemEvent)>;
pub type CursorListener = Rc<dyn Fn(Option<usize>)>;
pub type PageListener = Rc<dyn Fn(&PageEvent)>;

/// A window slot on the host side. The object is stable; the entity it
/// is bound to follows the host's scroll position.
pub trait RemoteItem {
    fn select(&self);
    fn subscribe(&self, listener: ItemListener) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
}

/// A paged ordered collection on the host side
pub trait RemoteCollection {
    fn item_count(&self) -> usize;
    fn scroll_position(&self) -> usize;
    fn can_scroll_backwards(&self) -> bool;
    fn can_scroll_forwards(&self) -> bool;
    fn can_scroll_page_backwards(&self) -> bool;
    fn can_scroll_page_forwards(&self) -> bool;
    /// The host may expose fewer slots than the controller has rows
    fn item_at(&self, slot: usize) -> Option<Rc<dyn RemoteItem>>;
    fn scroll_backwards(&self);
    fn scroll_forwards(&self);
    fn scroll_page_backwards(&self);
    fn scroll_page_forwards(&self);
    fn set_scroll_position(&self, position: usize);

    fn set_skip_disabled_items(&self, _skip: bool) {}
    fn follow_cursor(&self, _follow: bool) {}
    fn set_clip_launcher_feedback(&self, _show: bool) {}
    fn stop(&self) {}
    fn clear_muted(&self) {}
}

/// Track creation and the cursor track
pub trait TrackHost {
    /// Absolute index of the cursor track
    fn cursor_index(&self) -> Option<usize>;
    fn subscribe_cursor_index(&self, listener: CursorListener) -> ListenerId;
    fn unsubscribe_cursor_index(&self, id: ListenerId);
    fn create_track(&self, kind: ChannelType);
    fn rename_cursor_track(&self, name: &str);
    fn color_cursor_track(&self, color: ItemColor);
    fn insert_cursor_track_device(&self, device: &str);
}

/// Parameter page cursor: a flat list of page names and a selected index
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Names(Vec<String>),
    Selected(Option<usize>),
}

pub trait RemotePageCursor {
    fn page_names(&self) -> Vec<String>;
    fn selected_page(&self) -> Option<usize>;
    fn select_page(&self, index: usize);
    fn subscribe(&self, listener: PageListener) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
}

/// Play position, in beats
pub trait Transport {
    fn play_position(&self) -> f64;
    fn set_play_position(&self, beats: f64);
}
