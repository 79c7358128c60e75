use fr_core::{Aabb, EntityId, World};
use glam::Vec3;

use crate::config::SimConfig;

/// Decides where a proposed step may land.
///
/// The policy is binary: the destination is clamped to the world bound, then
/// the whole step is rejected if a probe box at the destination overlaps any
/// active obstacle footprint. There is no sliding along obstacles and no
/// physics; a blocked step leaves the robot where it was.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    bound: f32,
    probe: Vec3,
}

/// Result of resolving a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The admissible position.
    pub position: Vec3,
    /// The obstacle that rejected the step, if any.
    pub blocked_by: Option<EntityId>,
}

impl CollisionResolver {
    /// Resolver clamping to `[-bound, bound]` and probing with a box of the given half extents.
    pub fn new(bound: f32, probe_half_extents: Vec3) -> Self {
        Self {
            bound: bound.abs(),
            probe: probe_half_extents.abs(),
        }
    }

    /// Resolver built from the simulation's bound and probe size.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.world_bound, config.probe_half_extents)
    }

    /// Admissible position for moving `delta` away from `current`.
    pub fn resolve(&self, world: &World, current: Vec3, delta: Vec3) -> Vec3 {
        self.resolve_detailed(world, current, delta).position
    }

    /// Like [`resolve`](Self::resolve), but also reports the blocking obstacle.
    pub fn resolve_detailed(&self, world: &World, current: Vec3, delta: Vec3) -> Resolution {
        let desired = self.clamp(current + delta);
        match self.blocker(world, desired) {
            Some(obstacle) => Resolution {
                position: current,
                blocked_by: Some(obstacle),
            },
            None => Resolution {
                position: desired,
                blocked_by: None,
            },
        }
    }

    /// Clamp the horizontal axes to the world bound.
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.clamp(-self.bound, self.bound),
            position.y,
            position.z.clamp(-self.bound, self.bound),
        )
    }

    /// First obstacle (in ID order) whose footprint overlaps the probe at `at`.
    pub fn blocker(&self, world: &World, at: Vec3) -> Option<EntityId> {
        let probe = Aabb::from_center(at, self.probe);
        world
            .query_area(&probe)
            .filter(|e| e.kind.blocks_movement())
            .find(|e| e.footprint().overlaps_horizontal(&probe))
            .map(|e| e.id.clone())
    }

    /// Whether a probe at `at` overlaps an obstacle.
    pub fn blocked(&self, world: &World, at: Vec3) -> bool {
        self.blocker(world, at).is_some()
    }
}
