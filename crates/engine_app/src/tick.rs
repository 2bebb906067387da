//! Fixed-timestep host loop.
//!
//! Each tick advances the [`World`] by exactly `1 / tick_rate` seconds of
//! game time, then sleeps off whatever is left of the frame's wall-clock
//! budget.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::TickConfig;
use crate::world::World;

/// Drives a [`World`] at a fixed rate.
#[derive(Debug)]
pub struct TickLoop {
    /// Tick configuration.
    config: TickConfig,
    /// The simulation being driven.
    world: World,
}

impl TickLoop {
    /// Create a tick loop around an empty world.
    #[must_use]
    pub fn new(config: TickConfig) -> Self {
        Self::with_world(config, World::new())
    }

    /// Create a tick loop around an already populated world.
    #[must_use]
    pub fn with_world(config: TickConfig, world: World) -> Self {
        Self { config, world }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.world.tick_id()
    }

    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Consume the loop and hand back its world.
    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }

    /// Run one tick of the simulation.
    pub fn tick(&mut self) {
        self.world.update(self.config.frame_dt());
    }

    /// Run the tick loop for the configured number of ticks, or indefinitely.
    pub fn run(&mut self) {
        let tick_duration = Duration::from_secs_f64(self.config.frame_dt());
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            systems = self.world.systems().len(),
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick();

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
