//! pagewise: drive the controller banks against a simulated host from stdin

use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Sender, unbounded};
use pagewise_services::{HostCommand, HostLoop, ModelSnapshot, SimHost, load_config, load_config_from};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn config_arg() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(None),
        Some("--config") => args
            .next()
            .map(|path| Some(PathBuf::from(path)))
            .ok_or_else(|| anyhow!("--config needs a path")),
        Some(other) => Err(anyhow!("Unknown argument: {other}")),
    }
}

/// Forward parsed stdin lines to the host loop; end of input quits
fn read_commands(commands: Sender<HostCommand>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<HostCommand>() {
            Ok(command) => {
                let quit = command == HostCommand::Quit;
                if commands.send(command).is_err() || quit {
                    return;
                }
            }
            Err(e) => warn!("Ignoring input: {e}"),
        }
    }
    let _ = commands.send(HostCommand::Quit);
}

fn print_snapshot(snapshot: &ModelSnapshot) {
    match serde_json::to_string_pretty(snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!("Failed to encode snapshot: {e}"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("pagewise=debug".parse()?))
        .init();

    let config = match config_arg()? {
        Some(path) => load_config_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config(),
    };

    info!("Starting pagewise");

    let (command_tx, command_rx) = unbounded();
    let (snapshot_tx, snapshot_rx) = unbounded::<ModelSnapshot>();

    thread::spawn(move || read_commands(command_tx));
    let printer = thread::spawn(move || {
        for snapshot in snapshot_rx {
            print_snapshot(&snapshot);
        }
    });

    {
        let host_loop = HostLoop::new(SimHost::demo(), &config, command_rx, snapshot_tx)?;
        host_loop.run()?;
    }

    printer
        .join()
        .map_err(|_| anyhow!("Snapshot printer panicked"))?;
    Ok(())
}
