//! Banks of channel-like items: tracks, layers, drum pads

use std::rc::Rc;

use crate::bank::{Bank, WindowedBank};
use crate::error::Result;
use crate::item::ColorEntry;
use crate::remote::RemoteCollection;
use crate::scene::SceneBank;
use crate::scheduler::DeferredTasks;

/// Host collections a channel bank is assembled from. Any of them may be
/// absent; the matching bank is then inert.
#[derive(Clone, Default)]
pub struct ChannelSource {
    pub channels: Option<Rc<dyn RemoteCollection>>,
    /// Send collection of each window slot
    pub sends: Vec<Option<Rc<dyn RemoteCollection>>>,
    pub scenes: Option<Rc<dyn RemoteCollection>>,
    /// Clip slots of the cursor channel
    pub cursor_slots: Option<Rc<dyn RemoteCollection>>,
}

/// Channel bank with per-slot send banks and, when `num_scenes > 0`, a
/// scene bank coupled to the cursor channel's slot bank
pub struct ChannelBank {
    window: WindowedBank,
    scene_bank: Option<SceneBank>,
    sends: Vec<WindowedBank>,
    num_sends: usize,
    num_scenes: usize,
}

impl ChannelBank {
    pub fn new(
        source: &ChannelSource,
        page_size: usize,
        num_sends: usize,
        num_scenes: usize,
        deferred: DeferredTasks,
    ) -> Result<Self> {
        let window = WindowedBank::delegating(source.channels.clone(), page_size, deferred.clone())?;
        Self::assemble(window, source, num_sends, num_scenes, deferred)
    }

    /// Attach sends and scenes to an already built channel window
    pub fn assemble(
        window: WindowedBank,
        source: &ChannelSource,
        num_sends: usize,
        num_scenes: usize,
        deferred: DeferredTasks,
    ) -> Result<Self> {
        let sends = if num_sends > 0 {
            (0..window.page_size())
                .map(|slot| {
                    let remote = source.sends.get(slot).cloned().flatten();
                    WindowedBank::delegating(remote, num_sends, deferred.clone())
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let scene_bank = if num_scenes > 0 {
            let scenes = WindowedBank::delegating(source.scenes.clone(), num_scenes, deferred.clone())?;
            let slots = WindowedBank::delegating(source.cursor_slots.clone(), num_scenes, deferred)?;
            Some(SceneBank::new(scenes, Some(slots)))
        } else {
            None
        };

        Ok(Self {
            window,
            scene_bank,
            sends,
            num_sends,
            num_scenes,
        })
    }

    pub fn scene_bank(&self) -> Option<&SceneBank> {
        self.scene_bank.as_ref()
    }

    /// Send bank of the channel in window slot `slot`
    pub fn send_bank(&self, slot: usize) -> Option<&WindowedBank> {
        self.sends.get(slot)
    }

    pub fn num_sends(&self) -> usize {
        self.num_sends
    }

    pub fn num_scenes(&self) -> usize {
        self.num_scenes
    }

    /// Color of the selected channel, or off when nothing is selected
    pub fn selected_color_entry(&self) -> ColorEntry {
        self.window
            .selected_item()
            .map_or(ColorEntry::Off, |item| ColorEntry::Color(item.color))
    }

    /// Whether send `index` can be edited. Answers for the first visible
    /// channel, not per channel.
    pub fn can_edit_send(&self, index: usize) -> bool {
        index < self.num_sends
            && self
                .sends
                .first()
                .is_some_and(|sends| sends.item(index).exists)
    }

    /// Name of send `index` of the first visible channel
    pub fn edit_send_name(&self, index: usize) -> String {
        if index >= self.num_sends {
            return String::new();
        }
        self.sends
            .first()
            .map(|sends| sends.item(index).name)
            .unwrap_or_default()
    }

    pub fn stop(&self) {
        self.window.stop();
    }

    pub fn clear_muted_pads(&self) {
        self.window.clear_muted_pads();
    }
}

impl Bank for ChannelBank {
    fn window(&self) -> &WindowedBank {
        &self.window
    }

    fn enable_observers(&self, enable: bool) {
        self.window.enable_observers(enable);
        for sends in &self.sends {
            sends.enable_observers(enable);
        }
        if let Some(scene_bank) = &self.scene_bank {
            scene_bank.enable_observers(enable);
            if let Some(slots) = scene_bank.slot_bank() {
                slots.enable_observers(enable);
            }
        }
    }
}
