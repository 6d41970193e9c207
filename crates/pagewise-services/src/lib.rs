//! pagewise-services: Simulated host, configuration, and the host loop

pub mod clock;
pub mod config;
pub mod host_loop;
pub mod model;
pub mod sim;

pub use clock::ClockScheduler;
pub use config::{ConfigError, ControllerConfig, config_path, load_config, load_config_from, save_config, save_config_to};
pub use host_loop::{HostCommand, HostLoop, HostLoopError};
pub use model::{BankSnapshot, ControllerModel, ModelSnapshot};
pub use sim::{SimCollection, SimEntity, SimHost, SimPageCursor, SimStore, SimTransport};
