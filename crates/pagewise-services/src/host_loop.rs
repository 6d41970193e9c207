//! Single-threaded host loop: controller commands in, host ticks between

use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use pagewise_core::{Bank, BankError, ChannelType, NewChannel};
use thiserror::Error;
use tracing::{debug, info};

use crate::clock::ClockScheduler;
use crate::config::ControllerConfig;
use crate::model::{ControllerModel, ModelSnapshot};
use crate::sim::SimHost;

/// Upper bound on how long the loop sleeps with nothing scheduled
const IDLE_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum HostLoopError {
    #[error("Command channel disconnected")]
    Disconnected,
    #[error("Snapshot receiver dropped")]
    SnapshotsClosed,
    #[error("Model error: {0}")]
    Model(#[from] BankError),
}

/// Controller command, parsed from one line of text
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Next,
    Previous,
    NextPage,
    PreviousPage,
    ScrollTo(usize),
    SelectPosition(usize),
    SceneNext,
    AddTrack { kind: ChannelType, name: Option<String> },
    MarkerNext,
    MarkerPrevious,
    PagesNext,
    UserNext,
    State,
    Quit,
}

impl FromStr for HostCommand {
    type Err = BankError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let unknown = || BankError::UnknownCommand(line.trim().to_string());
        let mut words = line.split_whitespace();
        let position = |word: Option<&str>| word.and_then(|w| w.parse::<usize>().ok());

        let command = match words.next().ok_or_else(unknown)? {
            "next" => Self::Next,
            "prev" => Self::Previous,
            "next-page" => Self::NextPage,
            "prev-page" => Self::PreviousPage,
            "scroll" => Self::ScrollTo(position(words.next()).ok_or_else(unknown)?),
            "select" => Self::SelectPosition(position(words.next()).ok_or_else(unknown)?),
            "scene-next" => Self::SceneNext,
            "add-track" => {
                let kind = words.next().ok_or_else(unknown)?.parse()?;
                let name = words.collect::<Vec<_>>().join(" ");
                Self::AddTrack {
                    kind,
                    name: (!name.is_empty()).then_some(name),
                }
            }
            "marker-next" => Self::MarkerNext,
            "marker-prev" => Self::MarkerPrevious,
            "pages-next" => Self::PagesNext,
            "user-next" => Self::UserNext,
            "state" => Self::State,
            "quit" | "exit" => Self::Quit,
            _ => return Err(unknown()),
        };
        Ok(command)
    }
}

/// Owns the host and the controller model; everything runs on the thread
/// that calls [`HostLoop::run`]
pub struct HostLoop {
    host: Rc<SimHost>,
    model: ControllerModel,
    scheduler: Rc<ClockScheduler>,
    commands: Receiver<HostCommand>,
    snapshots: Sender<ModelSnapshot>,
}

impl HostLoop {
    pub fn new(
        host: Rc<SimHost>,
        config: &ControllerConfig,
        commands: Receiver<HostCommand>,
        snapshots: Sender<ModelSnapshot>,
    ) -> Result<Self, HostLoopError> {
        let scheduler = Rc::new(ClockScheduler::new());
        let model = ControllerModel::new(&host, config, scheduler.clone())?;
        model.enable_observers(true);
        host.flush();
        Ok(Self {
            host,
            model,
            scheduler,
            commands,
            snapshots,
        })
    }

    pub fn model(&self) -> &ControllerModel {
        &self.model
    }

    /// Process commands until `quit`
    pub fn run(&self) -> Result<(), HostLoopError> {
        info!("Host loop started");
        loop {
            self.tick();
            let timeout = self
                .scheduler
                .time_until_next()
                .map_or(IDLE_POLL, |left| left.min(IDLE_POLL));
            match self.commands.recv_timeout(timeout) {
                Ok(HostCommand::Quit) => break,
                Ok(command) => self.apply(command)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(HostLoopError::Disconnected),
            }
        }
        self.model.enable_observers(false);
        info!("Host loop stopped");
        Ok(())
    }

    /// Deliver host notifications and run deferred actions that are due
    pub fn tick(&self) {
        let delivered = self.host.flush();
        let ran = self.scheduler.run_due();
        let delivered = delivered + self.host.flush();
        if ran > 0 || delivered > 0 {
            debug!(ran, delivered, "Host tick");
        }
    }

    pub fn apply(&self, command: HostCommand) -> Result<(), HostLoopError> {
        debug!(?command, "Applying command");
        let tracks = self.model.tracks();
        match command {
            HostCommand::Next => tracks.select_next_item(),
            HostCommand::Previous => tracks.select_previous_item(),
            HostCommand::NextPage => tracks.select_next_page(),
            HostCommand::PreviousPage => tracks.select_previous_page(),
            HostCommand::ScrollTo(position) => tracks.scroll_to(position, true),
            HostCommand::SelectPosition(position) => tracks.select_item_at_position(position),
            HostCommand::SceneNext => {
                if let Some(scenes) = tracks.scene_bank() {
                    scenes.select_next_item();
                }
            }
            HostCommand::AddTrack { kind, name } => tracks.add_channel(
                kind,
                NewChannel {
                    name,
                    ..Default::default()
                },
            ),
            HostCommand::MarkerNext => self.model.markers().select_next_item(),
            HostCommand::MarkerPrevious => self.model.markers().select_previous_item(),
            HostCommand::PagesNext => self.model.parameter_pages().select_next_item(),
            HostCommand::UserNext => self.model.user_parameters().select_next_item(),
            HostCommand::State => {
                self.tick();
                self.snapshots
                    .send(self.model.snapshot())
                    .map_err(|_| HostLoopError::SnapshotsClosed)?;
            }
            HostCommand::Quit => {}
        }
        self.host.flush();
        Ok(())
    }
}
