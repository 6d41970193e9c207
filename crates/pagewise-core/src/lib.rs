//! pagewise-core: Windowed bank abstraction for DAW controller surfaces

mod bank;
pub mod binding;
mod channel;
mod config;
mod coupled;
mod error;
mod item;
mod marker;
mod observer;
pub mod remote;
mod scene;
pub mod scheduler;
mod track;

pub use bank::{Activation, Bank, WeakBank, WindowedBank};
pub use binding::{BankBinding, DelegatingBinding, FlatBinding, NameArrayBinding, SelectionSource};
pub use channel::{ChannelBank, ChannelSource};
pub use config::{DEFAULT_SETTLE_DELAY_MS, SettleConfig, SettlePolicy};
pub use coupled::CoupledBankPair;
pub use error::{BankError, Result};
pub use item::{ColorEntry, Item, ItemColor, ItemEvent};
pub use marker::{DEFAULT_SHADOW_SIZE, MarkerBank, MarkerEntry, SeekDirection, nearest_marker};
pub use observer::{ObserverList, ObserverScope, SelectionObservers, Subscription};
pub use remote::{RemoteCollection, RemoteItem, RemotePageCursor, TrackHost, Transport};
pub use scene::SceneBank;
pub use scheduler::{DeferredKind, DeferredTasks, ManualScheduler, Scheduler, TaskQueue};
pub use track::{ChannelType, EffectTrackBank, NewChannel, NoteEvent, TrackBank};
