use std::collections::BTreeSet;

use fr_core::geometry::flatten;
use fr_core::robot::Pose;
use fr_core::{EntityId, EntityKind, Fov, FrResult, World};
use glam::Vec3;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

/// Below this horizontal distance a target counts as being at the observer.
const COINCIDENT: f32 = 1e-6;

/// Rounding slack, in degrees, when comparing against the half angle.
const ANGLE_SLACK_DEG: f64 = 1e-6;

/// Geometric field-of-view test on the horizontal plane.
///
/// Visible iff the horizontal distance is at most `fov.range` (the boundary
/// itself is visible) and the angle between the heading and the direction to
/// the target is at most half the FOV angle. A target at the observer's own
/// position is visible.
pub fn is_visible(pose: &Pose, fov: &Fov, target: Vec3) -> bool {
    let to = flatten(target - pose.position);
    let distance = to.length();
    if distance > fov.range {
        return false;
    }
    if distance < COINCIDENT {
        return true;
    }
    let heading = flatten(pose.heading).as_dvec3().normalize_or_zero();
    let to = to.as_dvec3();
    let cos = (heading.dot(to) / to.length()).clamp(-1.0, 1.0);
    cos.acos().to_degrees() <= f64::from(fov.half_angle_deg()) + ANGLE_SLACK_DEG
}

/// Entities `robot` perceives right now, in ID order.
///
/// Map structure (rooms, floor, safe zone) and the robot itself are always
/// perceived. Everything else goes through [`is_visible`], with carried
/// entities tested at their carrier-derived position.
pub fn visible_entities(world: &World, robot: &str) -> FrResult<BTreeSet<EntityId>> {
    let state = world.robot(robot)?;
    let pose = world.pose(robot)?;
    let fov = state.fov;

    let mut visible = BTreeSet::new();
    visible.insert(state.id.clone());
    for kind in [EntityKind::Room, EntityKind::Floor, EntityKind::SafeZone] {
        visible.extend(world.entities_of_kind(kind).map(|e| e.id.clone()));
    }

    for entity in world.query_radius(pose.position, fov.range) {
        if !entity.kind.is_structural() && is_visible(&pose, &fov, entity.position) {
            visible.insert(entity.id.clone());
        }
    }

    // Carried entities are not in the spatial index.
    for carrier in world.robots() {
        if let Some(held) = &carrier.holding {
            if is_visible(&pose, &fov, world.position_of(held.as_str())?) {
                visible.insert(held.clone());
            }
        }
    }
    Ok(visible)
}

/// Active entities of `kind` that `robot` can see right now, in registration
/// order. Evaluated at call time, independent of earlier reveals.
pub fn visible_of_kind(world: &World, robot: &str, kind: EntityKind) -> FrResult<Vec<EntityId>> {
    let pose = world.pose(robot)?;
    let fov = world.robot(robot)?.fov;
    let mut found = Vec::new();
    for entity in world.entities_of_kind(kind) {
        if is_visible(&pose, &fov, world.position_of(entity.id.as_str())?) {
            found.push(entity.id.clone());
        }
    }
    Ok(found)
}

/// Mark everything `robot` perceives as shown. Returns the entities this
/// robot had not revealed before.
///
/// Reveal is one-way; nothing that leaves the field of view is hidden again.
pub fn reveal_for_agent(world: &mut World, robot: &str) -> FrResult<Vec<EntityId>> {
    let visible = visible_entities(world, robot)?;
    let mut newly = Vec::new();
    for id in visible {
        if world.reveal(robot, id.as_str())? {
            newly.push(id);
        }
    }
    Ok(newly)
}

/// Runs the reveal scan for every robot, once at start-up and once per tick.
#[derive(Debug, Default)]
pub struct ObservabilitySystem {
    scans: u64,
}

impl ObservabilitySystem {
    /// A system that has not scanned yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed scans (one per tick, plus the initial one).
    pub fn scans(&self) -> u64 {
        self.scans
    }

    fn scan(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        for robot in ctx.world.robot_ids() {
            let newly = reveal_for_agent(ctx.world, robot.as_str())?;
            for entity in newly {
                let kind = ctx.world.get(entity.as_str())?.kind;
                if kind.is_structural() || entity == robot {
                    continue;
                }
                tracing::debug!(%robot, %entity, "revealed");
                ctx.emit(
                    SimEventKind::Revealed {
                        robot: robot.clone(),
                        entity: entity.clone(),
                    },
                    format!("{robot} sees {entity} ({kind})"),
                );
            }
        }
        self.scans += 1;
        Ok(())
    }
}

impl System for ObservabilitySystem {
    fn name(&self) -> &'static str {
        "observability"
    }

    fn init(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.scan(ctx)
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.scan(ctx)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
