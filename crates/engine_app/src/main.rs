//! # engine_app: demo host
//!
//! Builds the demo scene and drives it with a fixed-timestep loop.
//!
//! ```text
//! engine_app [--config tick.json] [--tick-rate 60] [--max-ticks 600]
//! ```
//!
//! Command-line values override the config file, which overrides the
//! defaults. Log verbosity follows `RUST_LOG` (default `engine_app=info`).

mod demo;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_app::{TickConfig, TickLoop, World};

#[derive(Debug, Parser)]
#[command(name = "engine_app", about = "Run the ECS runtime demo scene")]
struct Args {
    /// JSON file with `tick_rate` and `max_ticks`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target ticks per second.
    #[arg(long)]
    tick_rate: Option<f64>,

    /// Stop after this many ticks (0 runs forever).
    #[arg(long)]
    max_ticks: Option<u64>,
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TickConfig::load(path)?,
        None => TickConfig::default(),
    };
    if let Some(tick_rate) = args.tick_rate {
        config.tick_rate = tick_rate;
    }
    if let Some(max_ticks) = args.max_ticks {
        config.max_ticks = max_ticks;
    }
    let config = config.validate()?;

    info!(
        tick_rate = config.tick_rate,
        max_ticks = config.max_ticks,
        "engine starting"
    );

    let mut world = World::new();
    demo::populate(&mut world);

    let mut tick_loop = TickLoop::with_world(config, world);
    tick_loop.run();

    info!(
        ticks = tick_loop.tick_id(),
        entities = tick_loop.world().store().entity_count(),
        "engine shut down"
    );
    Ok(())
}
