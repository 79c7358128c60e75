//! Shared fixtures for unit tests.

use fr_core::{Entity, EntityKind, Fov, Robot, World};
use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::event::EventLog;

/// Owns everything a [`SimContext`] borrows.
pub(crate) struct Harness {
    pub world: World,
    pub clock: SimClock,
    pub events: EventLog,
    pub rng: StdRng,
    pub config: SimConfig,
}

impl Harness {
    pub fn new(world: World) -> Self {
        Self {
            world,
            clock: SimClock::new(1.0),
            events: EventLog::new(0),
            rng: StdRng::seed_from_u64(7),
            config: SimConfig::default(),
        }
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.clock = SimClock::new(dt);
        self
    }

    pub fn ctx(&mut self) -> SimContext<'_> {
        SimContext {
            world: &mut self.world,
            clock: &self.clock,
            events: &mut self.events,
            rng: &mut self.rng,
            config: &self.config,
        }
    }
}

/// One room at the origin, the safe zone behind it, and `robot1` at the
/// room center facing +Z with a 120 degree, range 10 field of view.
pub(crate) fn room_with_robot() -> World {
    let mut world = World::new();
    world
        .register(Entity::new("Room1", EntityKind::Room, Vec3::ZERO).shown())
        .unwrap();
    world
        .register(Entity::new("SafeZone", EntityKind::SafeZone, Vec3::new(0.0, 0.5, -12.0)).shown())
        .unwrap();
    world
        .register_robot(
            Robot::new("robot1", Fov::new(120.0, 10.0)),
            Vec3::new(0.0, 0.5, 0.0),
            Some("Room1".into()),
        )
        .unwrap();
    world
}

/// Register a hidden entity of `kind` at `(x, 0.5, z)` inside `Room1`.
pub(crate) fn place(world: &mut World, id: &str, kind: EntityKind, x: f32, z: f32) {
    world
        .register(Entity::new(id, kind, Vec3::new(x, 0.5, z)).in_room("Room1"))
        .unwrap();
}
