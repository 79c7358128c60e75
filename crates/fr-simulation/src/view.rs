use fr_core::{EntityId, EntityKind, World};
use glam::Vec3;
use serde::Serialize;

use crate::clock::SimClock;
use crate::dynamics::DynamicsSystem;

/// Snapshot of everything a renderer needs for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    /// Ticks completed.
    pub tick: u64,
    /// Simulated seconds since the start.
    pub elapsed: f64,
    /// `None` when the simulation runs without a dynamics system.
    pub dynamics: Option<DynamicsView>,
    /// Every entity, including deactivated ones, in id order.
    pub entities: Vec<EntityView>,
    /// Every robot, in registration order.
    pub robots: Vec<RobotView>,
}

/// State of the dynamics engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicsView {
    /// Dynamics are on right now.
    pub enabled: bool,
    /// Reported steps may perturb the world.
    pub on_step: bool,
    /// Seconds between periodic spawns.
    pub fire_spread_seconds: f64,
    /// A suspension window is open.
    pub suspended: bool,
    /// When the next periodic spawn is due.
    pub next_spawn_at: Option<f64>,
}

/// One registry record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    /// Entity ID.
    pub id: EntityId,
    /// What the entity is.
    pub kind: EntityKind,
    /// Live position; carried entities follow their carrier.
    pub position: Vec3,
    /// Still part of the simulation.
    pub active: bool,
    /// Revealed to the operator.
    pub shown: bool,
    /// The robot holding it.
    pub carried_by: Option<EntityId>,
}

/// One robot's agent state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotView {
    /// Robot ID.
    pub id: EntityId,
    /// Current position.
    pub position: Vec3,
    /// Facing direction.
    pub heading: Vec3,
    /// Full FOV angle in degrees.
    pub fov_deg: f32,
    /// Perception range.
    pub range: f32,
    /// Carries an extinguisher.
    pub equipped: bool,
    /// The held item.
    pub holding: Option<EntityId>,
    /// Current movement target.
    pub target: Option<Vec3>,
}

impl FrameView {
    /// Capture the current frame.
    pub fn capture(world: &World, clock: &SimClock, dynamics: Option<&DynamicsSystem>) -> Self {
        let entities = world
            .all_entities()
            .map(|e| EntityView {
                id: e.id.clone(),
                kind: e.kind,
                position: world.position_of(e.id.as_str()).unwrap_or(e.position),
                active: e.active,
                shown: e.shown,
                carried_by: e.carried_by.clone(),
            })
            .collect();

        let robots = world
            .robot_ids()
            .into_iter()
            .filter_map(|id| {
                let robot = world.robot(id.as_str()).ok()?;
                let pose = world.pose(id.as_str()).ok()?;
                Some(RobotView {
                    id: robot.id.clone(),
                    position: pose.position,
                    heading: pose.heading,
                    fov_deg: robot.fov.angle_deg,
                    range: robot.fov.range,
                    equipped: robot.equipped,
                    holding: robot.holding.clone(),
                    target: robot.target,
                })
            })
            .collect();

        Self {
            tick: clock.tick(),
            elapsed: clock.elapsed(),
            dynamics: dynamics.map(|d| DynamicsView {
                enabled: d.is_enabled(),
                on_step: d.config().on_step,
                fire_spread_seconds: d.config().fire_spread_seconds,
                suspended: d.is_suspended(),
                next_spawn_at: d.next_spawn_at(),
            }),
            entities,
            robots,
        }
    }

    /// Look up an entity by id.
    pub fn entity(&self, id: &str) -> Option<&EntityView> {
        self.entities.iter().find(|e| e.id.as_str() == id)
    }

    /// Look up a robot by id.
    pub fn robot(&self, id: &str) -> Option<&RobotView> {
        self.robots.iter().find(|r| r.id.as_str() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{place, room_with_robot};

    #[test]
    fn capture_lists_entities_and_robots() {
        let mut world = room_with_robot();
        place(&mut world, "Kit1", EntityKind::Kit, 3.0, 3.0);
        world.deactivate("Kit1").unwrap();

        let view = FrameView::capture(&world, &SimClock::new(0.5), None);
        assert_eq!(view.tick, 0);
        assert!(view.dynamics.is_none());
        assert_eq!(view.entities.len(), world.entity_count());
        assert!(!view.entity("Kit1").unwrap().active);
        let robot = view.robot("robot1").unwrap();
        assert!((robot.range - 10.0).abs() < f32::EPSILON);
        assert_eq!(robot.holding, None);
    }

    #[test]
    fn carried_entity_follows_carrier() {
        let mut world = room_with_robot();
        place(&mut world, "Kit1", EntityKind::Kit, 1.0, 0.0);
        world.attach("robot1", "Kit1").unwrap();

        let view = FrameView::capture(&world, &SimClock::new(1.0), None);
        let kit = view.entity("Kit1").unwrap();
        assert_eq!(kit.carried_by, Some(EntityId::new("robot1")));
        assert_eq!(kit.position, world.position_of("Kit1").unwrap());
        assert_eq!(
            view.robot("robot1").unwrap().holding,
            Some(EntityId::new("Kit1"))
        );
    }

    #[test]
    fn dynamics_state_is_reported() {
        let world = room_with_robot();
        let mut dynamics = DynamicsSystem::default();
        dynamics.restart(0.0);
        let view = FrameView::capture(&world, &SimClock::new(1.0), Some(&dynamics));
        let state = view.dynamics.unwrap();
        assert!(state.enabled);
        assert!(!state.suspended);
        assert_eq!(state.next_spawn_at, Some(45.0));
    }

    #[test]
    fn frame_serializes_to_json() {
        let view = FrameView::capture(&room_with_robot(), &SimClock::new(1.0), None);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["robots"][0]["id"], "robot1");
        assert_eq!(json["entities"].as_array().unwrap().len(), 3);
    }
}
