#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that runs a Corridor Defence simulation.
//!
//! Snapshots stream to stdout as JSON lines; control messages are read from
//! stdin and logs go to stderr.

mod broadcast;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use corridor_defence_core::{wire::ClientMessage, Timestamp};
use corridor_defence_engine::{Clock, Simulation, Status, SystemClock};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::Instant,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::broadcast::JsonLines;

/// Command-line arguments accepted by the host.
#[derive(Debug, Parser)]
#[command(name = "corridor-defence", about = "Runs a Corridor Defence simulation")]
struct CliArgs {
    /// TOML file overriding the reference configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Waits for a `start` control message instead of starting immediately.
    #[arg(long)]
    wait_for_start: bool,
    /// Stops the simulation after this many ticks.
    #[arg(long, value_name = "COUNT")]
    max_ticks: Option<u64>,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, value_name = "DIRECTIVE", default_value = "info")]
    log_filter: String,
}

/// Entry point for the Corridor Defence command-line host.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter);

    let config = config::load(args.config.as_deref())?;
    let clock = SystemClock::new();
    let mut simulation = Simulation::new(config, clock)?;
    simulation.subscribe(JsonLines::stdout());

    if !args.wait_for_start {
        simulation.start()?;
    }

    run(&mut simulation, clock, &args).await;
    info!(
        ticks = simulation.tick_count(),
        health = simulation.latest_snapshot().user_health,
        "simulation finished"
    );
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(simulation: &mut Simulation, clock: SystemClock, args: &CliArgs) {
    let mut control = BufReader::new(tokio::io::stdin()).lines();
    let mut control_open = true;
    let mut replies = JsonLines::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        if matches!(simulation.status(), Status::Halted(_)) {
            break;
        }
        if args
            .max_ticks
            .is_some_and(|limit| simulation.tick_count() >= limit)
        {
            info!(limit = simulation.tick_count(), "tick limit reached");
            simulation.stop();
            break;
        }

        tokio::select! {
            () = sleep_until(simulation.next_deadline(), clock) => {
                let _ = simulation.pump();
            }
            line = control.next_line(), if control_open => match line {
                Ok(Some(text)) => handle_control(simulation, &mut replies, &text),
                Ok(None) => {
                    control_open = false;
                    if simulation.status() == Status::Idle {
                        info!("control channel closed before start");
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "control channel failed");
                    control_open = false;
                }
            },
            result = &mut ctrl_c => {
                if let Err(error) = result {
                    warn!(%error, "failed to listen for interrupts");
                }
                info!("interrupted");
                simulation.stop();
            }
        }
    }
}

async fn sleep_until(deadline: Option<Timestamp>, clock: SystemClock) {
    match deadline {
        Some(deadline) => {
            let wait = deadline.saturating_duration_since(clock.now());
            tokio::time::sleep_until(Instant::now() + wait).await;
        }
        None => std::future::pending().await,
    }
}

fn handle_control(
    simulation: &mut Simulation,
    replies: &mut JsonLines<std::io::Stdout>,
    text: &str,
) {
    let Some(message) = ClientMessage::parse(text) else {
        debug!(message = text, "dropping malformed control message");
        return;
    };

    match message {
        ClientMessage::Start => {
            if let Err(error) = simulation.start() {
                debug!(%error, "ignoring start request");
            }
        }
        ClientMessage::Stop => simulation.stop(),
        ClientMessage::Snapshot => replies.send(&simulation.snapshot()),
    }
}
