//! Systems that advance the runtime's own time-driven machinery.
//!
//! Register both after the game-logic systems and before rendering, so timed
//! effects and queue steps triggered this frame are visible to the renderer.

use engine_event::TickContext;

use crate::system::System;

/// Advances the delay scheduler by the frame's `dt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelaySystem;

impl System for DelaySystem {
    fn name(&self) -> &str {
        "delay"
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) {
        let delays = ctx.delays;
        delays.advance(ctx.dt, ctx);
    }
}

/// Ticks the cooperative event queue once per frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueueSystem;

impl System for QueueSystem {
    fn name(&self) -> &str {
        "queue"
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) {
        let queue = ctx.queue;
        queue.tick(ctx.dt, ctx);
    }
}
