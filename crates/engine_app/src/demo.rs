//! A small scripted scene: a hero repeatedly attacks a goblin.
//!
//! Exercises the whole runtime once per attack. Input publishes
//! `AttackPressed`, a handler enqueues a rule sequence (wind up, wait out the
//! swing, deal damage), the damage handler publishes `Defeated` and enqueues
//! a cleanup trigger, and the render system prints a JSON snapshot.

use engine_component::{Component, Entity, QueryDescriptor};
use engine_event::{Event, FnItem, ItemContext, PublishItem, TickContext, WaitSeconds};
use engine_system::{DelaySystem, QueueSystem, System};
use glam::Vec2;
use serde::Serialize;
use tracing::{info, warn};

use engine_app::World;

const SWING_SECONDS: f64 = 0.3;
const SWING_DAMAGE: i32 = 3;

// -- Components --

#[derive(Debug, Clone, Copy)]
struct Position(Vec2);
impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

#[derive(Debug, Clone, Copy)]
struct Velocity(Vec2);
impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

#[derive(Debug, Clone, Copy)]
struct Health(i32);
impl Component for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}

/// Marks the entity driven by input.
#[derive(Debug)]
struct Controlled;
impl Component for Controlled {
    fn type_name() -> &'static str {
        "Controlled"
    }
}

// -- Events --

struct AttackPressed {
    attacker: Entity,
}
impl Event for AttackPressed {
    fn type_name() -> &'static str {
        "AttackPressed"
    }
}

struct Damage {
    target: Entity,
    amount: i32,
}
impl Event for Damage {
    fn type_name() -> &'static str {
        "Damage"
    }
}

struct Defeated {
    entity: Entity,
}
impl Event for Defeated {
    fn type_name() -> &'static str {
        "Defeated"
    }
}

// -- Systems --

/// Presses "attack" for every controlled entity once every `every` ticks.
struct ScriptedInput {
    every: u64,
}

impl System for ScriptedInput {
    fn name(&self) -> &str {
        "input"
    }

    fn query(&self) -> QueryDescriptor {
        QueryDescriptor::new().with::<Controlled>()
    }

    fn update_entity(&mut self, entity: Entity, ctx: &mut TickContext<'_>) {
        if ctx.tick_id % self.every == 0 {
            ctx.publish(&AttackPressed { attacker: entity });
        }
    }
}

struct Movement;

impl System for Movement {
    fn name(&self) -> &str {
        "movement"
    }

    fn query(&self) -> QueryDescriptor {
        QueryDescriptor::new().with::<Position>().with::<Velocity>()
    }

    fn update_entity(&mut self, entity: Entity, ctx: &mut TickContext<'_>) {
        let Some(velocity) = ctx.store.get_component::<Velocity>(entity).map(|v| v.0) else {
            return;
        };
        let dt = ctx.dt as f32;
        if let Some(position) = ctx.store.get_component_mut::<Position>(entity) {
            position.0 += velocity * dt;
        }
    }
}

#[derive(Serialize)]
struct EntityView<'a> {
    name: &'a str,
    position: Option<Vec2>,
    health: Option<i32>,
}

/// Logs a JSON snapshot of every positioned entity once every `every` ticks.
struct Render {
    every: u64,
}

impl System for Render {
    fn name(&self) -> &str {
        "render"
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) {
        if ctx.tick_id % self.every != 0 {
            return;
        }
        let store = &*ctx.store;
        let views: Vec<EntityView<'_>> = store
            .query::<Position>()
            .into_iter()
            .map(|e| EntityView {
                name: store.name_of(e).unwrap_or("?"),
                position: store.get_component::<Position>(e).map(|p| p.0),
                health: store.get_component::<Health>(e).map(|h| h.0),
            })
            .collect();
        match serde_json::to_string(&views) {
            Ok(json) => info!(tick_id = ctx.tick_id, queue_idle = ctx.queue.is_idle(), %json, "frame"),
            Err(err) => warn!(%err, "snapshot serialisation failed"),
        }
    }
}

// -- Wiring --

/// Populate `world` with the demo scene and its systems, in frame order.
pub fn populate(world: &mut World) {
    let hero = world.create_entity("Hero");
    world.add_component(hero, Position(Vec2::ZERO));
    world.add_component(hero, Velocity(Vec2::new(1.0, 0.0)));
    world.add_component(hero, Health(10));
    world.add_component(hero, Controlled);

    let goblin = world.create_entity("Goblin");
    world.add_component(goblin, Position(Vec2::new(5.0, 0.0)));
    world.add_component(goblin, Health(7));

    world.subscribe(|press: &AttackPressed, ctx: &mut TickContext<'_>| {
        if !ctx.queue.is_idle() {
            return Ok(());
        }
        let attacker = press.attacker;
        let Some(target) = ctx
            .store
            .query::<Health>()
            .into_iter()
            .find(|e| *e != attacker)
        else {
            return Ok(());
        };

        ctx.enqueue_rule(FnItem::new("wind up", move |item: &mut ItemContext<'_, '_>| {
            info!(tick_id = item.tick_id(), ?attacker, ?target, "swing started");
        }));
        ctx.enqueue_rule(WaitSeconds::new(SWING_SECONDS));
        ctx.enqueue_rule(PublishItem::new(Damage {
            target,
            amount: SWING_DAMAGE,
        }));
        Ok(())
    });

    world.subscribe(|damage: &Damage, ctx: &mut TickContext<'_>| {
        let Some(health) = ctx.store.get_component_mut::<Health>(damage.target) else {
            return Ok(());
        };
        health.0 -= damage.amount;
        let remaining = health.0;
        info!(target = ?damage.target, amount = damage.amount, remaining, "damage applied");

        if remaining <= 0 {
            ctx.publish(&Defeated {
                entity: damage.target,
            });
        }
        Ok(())
    });

    world.subscribe(|defeated: &Defeated, ctx: &mut TickContext<'_>| {
        let entity = defeated.entity;
        info!(?entity, "defeated");
        ctx.enqueue_trigger(FnItem::new("clean up", move |item: &mut ItemContext<'_, '_>| {
            item.store_mut().destroy_entity(entity);
        }));
        Ok(())
    });

    world.add_system(ScriptedInput { every: 30 });
    world.add_system(Movement);
    world.add_system(DelaySystem);
    world.add_system(QueueSystem);
    world.add_system(Render { every: 60 });
}
