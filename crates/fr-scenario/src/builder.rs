use fr_core::{Entity, EntityId, EntityKind, Fov, Robot, World};
use glam::Vec3;
use rand::Rng;

use crate::config::IngestConfig;
use crate::document::{PlacementSpec, WorldSpec};
use crate::error::{ScenarioError, ScenarioResult};

/// ID of the floor entity every world gets.
pub const FLOOR_ID: &str = "Floor";
/// ID of the safe zone when the document does not place one itself.
pub const SAFE_ZONE_ID: &str = "SafeZone";

/// Build a world from its description.
///
/// Registration happens in passes so that every room exists before anything
/// references it:
/// 1. **Structure**: floor, rooms, safe zone
/// 2. **Obstacles**: placed relative to their room, hidden
/// 3. **Entities**: fires, kits, survivors, extinguishers, jittered inside
///    their room, hidden
/// 4. **Robots**: at their room's center
///
/// Any error aborts the build; no partially built world is returned.
pub fn build_world<R: Rng>(
    spec: &WorldSpec,
    config: &IngestConfig,
    rng: &mut R,
) -> ScenarioResult<World> {
    let mut builder = Builder {
        world: World::new(),
        config,
        rng,
    };
    builder.structure_pass(spec)?;
    builder.obstacle_pass(spec)?;
    builder.entity_pass(spec)?;
    builder.robot_pass(spec)?;
    Ok(builder.world)
}

struct Builder<'a, R> {
    world: World,
    config: &'a IngestConfig,
    rng: &'a mut R,
}

impl<R: Rng> Builder<'_, R> {
    fn structure_pass(&mut self, spec: &WorldSpec) -> ScenarioResult<()> {
        self.world.register(
            Entity::new(FLOOR_ID, EntityKind::Floor, Vec3::ZERO)
                .with_half_extents(Vec3::new(20.0, 0.0, 20.0))
                .shown(),
        )?;

        let half = self.config.room_half_size;
        for room in &spec.map.rooms {
            self.world.register(
                Entity::new(room.id.as_str(), EntityKind::Room, room.position())
                    .with_half_extents(Vec3::new(half, 0.1, half))
                    .shown(),
            )?;
        }

        let position = match &spec.map.safe_zone {
            Some(zone) => Vec3::from_array(zone.pos),
            None => spec
                .map
                .rooms
                .iter()
                .map(|r| r.pos[2])
                .reduce(f32::min)
                .map(|min_z| {
                    Vec3::new(0.0, self.config.entity_height, min_z - self.config.safe_zone_offset)
                })
                .unwrap_or(self.config.fallback_safe_zone),
        };
        self.world.register(
            Entity::new(SAFE_ZONE_ID, EntityKind::SafeZone, position)
                .with_half_extents(Vec3::new(1.0, 0.1, 1.0))
                .shown(),
        )?;
        tracing::debug!(rooms = spec.map.rooms.len(), safe_zone = ?position, "structure registered");
        Ok(())
    }

    fn obstacle_pass(&mut self, spec: &WorldSpec) -> ScenarioResult<()> {
        for obstacle in &spec.map.obstacles {
            let origin = self.room_origin(&obstacle.id, &obstacle.room)?;
            let (center, size) = obstacle.center_and_size();
            let position = origin + Vec3::new(center.x, self.config.entity_height, center.z);
            self.world.register(
                Entity::new(obstacle.id.as_str(), EntityKind::Obstacle, position)
                    .in_room(obstacle.room.as_str())
                    .with_half_extents(Vec3::new(size.x * 0.5, 0.5, size.z * 0.5)),
            )?;
        }
        Ok(())
    }

    fn entity_pass(&mut self, spec: &WorldSpec) -> ScenarioResult<()> {
        let lists: [(&[PlacementSpec], EntityKind); 4] = [
            (spec.entities.fires.as_slice(), EntityKind::Fire),
            (spec.entities.first_aid_kits.as_slice(), EntityKind::Kit),
            (spec.entities.survivors.as_slice(), EntityKind::Survivor),
            (spec.entities.extinguishers.as_slice(), EntityKind::Extinguisher),
        ];
        for (placements, kind) in lists {
            for placement in placements {
                let origin = self.room_origin(&placement.id, &placement.room)?;
                let offset = Vec3::new(
                    self.jitter(),
                    self.config.entity_height,
                    self.jitter(),
                );
                self.world.register(
                    Entity::new(placement.id.as_str(), kind, origin + offset)
                        .in_room(placement.room.as_str()),
                )?;
            }
        }
        Ok(())
    }

    fn robot_pass(&mut self, spec: &WorldSpec) -> ScenarioResult<()> {
        for robot in &spec.robots {
            let origin = self.room_origin(&robot.id, &robot.room)?;
            let profile = self.config.fov_for(&robot.id);
            let fov = Fov::new(
                robot.fov_deg.unwrap_or(profile.angle_deg),
                robot.range.unwrap_or(profile.range),
            );
            self.world.register_robot(
                Robot::new(robot.id.as_str(), fov),
                origin + Vec3::new(0.0, self.config.entity_height, 0.0),
                Some(EntityId::new(robot.room.as_str())),
            )?;
            tracing::debug!(robot = %robot.id, room = %robot.room, fov = fov.angle_deg, range = fov.range, "robot registered");
        }
        Ok(())
    }

    /// Position of a registered room, or `UnknownRoom` for `entity`.
    fn room_origin(&self, entity: &str, room: &str) -> ScenarioResult<Vec3> {
        match self.world.get(room) {
            Ok(e) if e.kind == EntityKind::Room => Ok(e.position),
            _ => Err(ScenarioError::UnknownRoom {
                entity: EntityId::new(entity),
                room: EntityId::new(room),
            }),
        }
    }

    fn jitter(&mut self) -> f32 {
        let j = self.config.placement_jitter;
        if j > 0.0 {
            self.rng.random_range(-j..=j)
        } else {
            0.0
        }
    }
}
