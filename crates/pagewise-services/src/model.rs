//! Controller model: every bank a controller uses, wired once against a host

use std::rc::Rc;

use pagewise_core::remote::{RemoteCollection, RemotePageCursor, TrackHost, Transport};
use pagewise_core::scheduler::Scheduler;
use pagewise_core::{
    Bank, ChannelBank, ChannelSource, DeferredTasks, EffectTrackBank, FlatBinding, Item, MarkerBank,
    NameArrayBinding, Result, TrackBank, WindowedBank,
};
use serde::Serialize;
use tracing::info;

use crate::config::ControllerConfig;
use crate::sim::{SimHost, SimStore};

/// Window over `store`, absent when the bank is disabled
fn remote(store: &Rc<SimStore>, size: usize) -> Option<Rc<dyn RemoteCollection>> {
    (size > 0).then(|| store.view(size).handle())
}

/// Disabled banks are unbound but still need a window
fn slots(size: usize) -> usize {
    size.max(1)
}

pub struct ControllerModel {
    tracks: TrackBank,
    effect_tracks: EffectTrackBank,
    devices: WindowedBank,
    layers: ChannelBank,
    drum_pads: ChannelBank,
    parameters: WindowedBank,
    parameter_pages: WindowedBank,
    user_parameters: WindowedBank,
    markers: MarkerBank,
    transport: Rc<dyn Transport>,
}

impl ControllerModel {
    pub fn new(host: &Rc<SimHost>, config: &ControllerConfig, scheduler: Rc<dyn Scheduler>) -> Result<Self> {
        let deferred = DeferredTasks::new(scheduler, config.settle);

        let num_tracks = config.num_tracks;
        let track_source = ChannelSource {
            channels: remote(host.tracks(), num_tracks),
            sends: (0..slots(num_tracks))
                .map(|_| remote(host.effect_tracks(), config.num_sends))
                .collect(),
            scenes: remote(host.scenes(), config.num_scenes),
            cursor_slots: remote(host.clip_slots(), config.num_scenes),
        };
        let track_host: Rc<dyn TrackHost> = host.clone();
        let tracks = TrackBank::new(
            &track_source,
            (num_tracks > 0).then_some(track_host),
            slots(num_tracks),
            config.num_sends,
            config.num_scenes,
            deferred.clone(),
        )?;

        let effect_source = ChannelSource {
            channels: remote(host.effect_tracks(), num_tracks),
            ..Default::default()
        };
        let effect_tracks = EffectTrackBank::new(
            TrackBank::new(&effect_source, None, slots(num_tracks), 0, 0, deferred.clone())?,
            tracks.window().clone(),
        );

        let devices = WindowedBank::delegating(
            remote(host.devices(), config.num_devices),
            slots(config.num_devices),
            deferred.clone(),
        )?;
        let layers = ChannelBank::new(
            &ChannelSource {
                channels: remote(host.layers(), config.num_layers),
                ..Default::default()
            },
            slots(config.num_layers),
            0,
            0,
            deferred.clone(),
        )?;
        let drum_pads = ChannelBank::new(
            &ChannelSource {
                channels: remote(host.drum_pads(), config.num_drum_pads),
                ..Default::default()
            },
            slots(config.num_drum_pads),
            0,
            0,
            deferred.clone(),
        )?;
        let parameters = WindowedBank::delegating(
            remote(host.parameters(), config.num_params),
            slots(config.num_params),
            deferred.clone(),
        )?;

        let page_cursor: Rc<dyn RemotePageCursor> = host.parameter_pages().clone();
        let parameter_pages = WindowedBank::new(
            NameArrayBinding::new(
                (config.num_parameter_pages > 0).then_some(page_cursor),
                slots(config.num_parameter_pages),
            ),
            deferred.clone(),
        )?;

        let per_page = config.num_user_params_per_page;
        let pool_size = config.num_user_pages * per_page;
        let user_parameters = WindowedBank::new(
            FlatBinding::new(
                remote(host.user_parameters(), pool_size),
                slots(per_page),
                config.num_user_pages,
            ),
            deferred.clone(),
        )?;

        let transport: Rc<dyn Transport> = host.transport().clone();
        let marker_enabled = config.num_markers > 0;
        let markers = MarkerBank::new(
            remote(host.markers(), config.num_markers),
            marker_enabled
                .then(|| remote(host.markers(), config.marker_shadow_size))
                .flatten(),
            marker_enabled.then(|| transport.clone()),
            slots(config.num_markers),
            config.marker_shadow_size,
            deferred.clone(),
        )?;

        info!(
            tracks = num_tracks,
            scenes = config.num_scenes,
            sends = config.num_sends,
            settle_ms = config.settle.delay_ms,
            "Controller model wired"
        );

        Ok(Self {
            tracks,
            effect_tracks,
            devices,
            layers,
            drum_pads,
            parameters,
            parameter_pages,
            user_parameters,
            markers,
            transport,
        })
    }

    pub fn tracks(&self) -> &TrackBank {
        &self.tracks
    }

    pub fn effect_tracks(&self) -> &EffectTrackBank {
        &self.effect_tracks
    }

    pub fn devices(&self) -> &WindowedBank {
        &self.devices
    }

    pub fn layers(&self) -> &ChannelBank {
        &self.layers
    }

    pub fn drum_pads(&self) -> &ChannelBank {
        &self.drum_pads
    }

    pub fn parameters(&self) -> &WindowedBank {
        &self.parameters
    }

    pub fn parameter_pages(&self) -> &WindowedBank {
        &self.parameter_pages
    }

    pub fn user_parameters(&self) -> &WindowedBank {
        &self.user_parameters
    }

    pub fn markers(&self) -> &MarkerBank {
        &self.markers
    }

    /// Acquire or release the host subscriptions of every bank
    pub fn enable_observers(&self, enable: bool) {
        let banks: [&dyn Bank; 9] = [
            &self.tracks,
            &self.effect_tracks,
            &self.devices,
            &self.layers,
            &self.drum_pads,
            &self.parameters,
            &self.parameter_pages,
            &self.user_parameters,
            &self.markers,
        ];
        for bank in banks {
            bank.enable_observers(enable);
        }
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            tracks: BankSnapshot::of(&self.tracks),
            effect_tracks: BankSnapshot::of(&self.effect_tracks),
            scenes: self.tracks.scene_bank().map(BankSnapshot::of),
            devices: BankSnapshot::of(&self.devices),
            parameters: BankSnapshot::of(&self.parameters),
            parameter_pages: BankSnapshot::of(&self.parameter_pages),
            user_parameters: BankSnapshot::of(&self.user_parameters),
            markers: BankSnapshot::of(&self.markers),
            play_position: self.transport.play_position(),
        }
    }
}

/// Visible state of one bank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankSnapshot {
    pub page_size: usize,
    pub item_count: usize,
    pub scroll_position: Option<usize>,
    pub selected: Option<usize>,
    pub items: Vec<Item>,
}

impl BankSnapshot {
    pub fn of<B: Bank + ?Sized>(bank: &B) -> Self {
        Self {
            page_size: bank.page_size(),
            item_count: bank.item_count(),
            scroll_position: bank.scroll_position(),
            selected: bank.selected_item_index(),
            items: (0..bank.page_size()).map(|i| bank.item(i)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub tracks: BankSnapshot,
    pub effect_tracks: BankSnapshot,
    pub scenes: Option<BankSnapshot>,
    pub devices: BankSnapshot,
    pub parameters: BankSnapshot,
    pub parameter_pages: BankSnapshot,
    pub user_parameters: BankSnapshot,
    pub markers: BankSnapshot,
    pub play_position: f64,
}
