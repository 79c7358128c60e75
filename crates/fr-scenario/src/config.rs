use std::collections::BTreeMap;

use fr_core::Fov;
use glam::Vec3;

/// Placement rules applied while building a world from a document.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// FOV for robots without a profile or explicit values.
    pub default_fov: Fov,
    /// Per-robot FOV profiles, keyed by robot ID.
    pub fov_profiles: BTreeMap<String, Fov>,
    /// Entities land at `room + (U(-j, j), height, U(-j, j))`.
    pub placement_jitter: f32,
    /// Height above the room origin for entities, obstacles, and robots.
    pub entity_height: f32,
    /// Half the edge length of a room's square footprint.
    pub room_half_size: f32,
    /// Distance of the derived safe zone in front of the southernmost room.
    pub safe_zone_offset: f32,
    /// Safe zone position when the map has no rooms.
    pub fallback_safe_zone: Vec3,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let mut fov_profiles = BTreeMap::new();
        fov_profiles.insert("robot1".to_string(), Fov::new(120.0, 10.0));
        Self {
            default_fov: Fov::new(140.0, 14.0),
            fov_profiles,
            placement_jitter: 3.0,
            entity_height: 0.5,
            room_half_size: 5.0,
            safe_zone_offset: 6.0,
            fallback_safe_zone: Vec3::new(0.0, 0.5, -12.0),
        }
    }
}

impl IngestConfig {
    /// Set the FOV used for robots without a profile.
    pub fn with_default_fov(mut self, fov: Fov) -> Self {
        self.default_fov = fov;
        self
    }

    /// Give one robot its own FOV profile.
    pub fn with_fov_profile(mut self, robot: impl Into<String>, fov: Fov) -> Self {
        self.fov_profiles.insert(robot.into(), fov);
        self
    }

    /// Set how far entities may land from their room's center.
    pub fn with_placement_jitter(mut self, jitter: f32) -> Self {
        self.placement_jitter = jitter;
        self
    }

    /// FOV for a robot before any explicit per-robot values are applied.
    pub fn fov_for(&self, robot: &str) -> Fov {
        self.fov_profiles
            .get(robot)
            .copied()
            .unwrap_or(self.default_fov)
    }
}
