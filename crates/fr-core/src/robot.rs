use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::geometry::flatten;

/// A robot's perception cone on the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fov {
    /// Full opening angle in degrees.
    pub angle_deg: f32,
    /// Maximum perception distance.
    pub range: f32,
}

impl Fov {
    /// Build a cone from its full angle and range.
    pub fn new(angle_deg: f32, range: f32) -> Self {
        Self { angle_deg, range }
    }

    /// Half the opening angle: the largest visible deviation from the heading.
    pub fn half_angle_deg(&self) -> f32 {
        self.angle_deg * 0.5
    }
}

impl Default for Fov {
    fn default() -> Self {
        Self::new(120.0, 10.0)
    }
}

/// Position plus facing direction.
///
/// `heading` is a unit vector on the horizontal plane. Right-hand side is
/// `+X` when facing `+Z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Location of the robot.
    pub position: Vec3,
    /// Facing direction.
    pub heading: Vec3,
}

impl Pose {
    /// Create a pose; the heading is flattened and normalized.
    pub fn new(position: Vec3, heading: Vec3) -> Self {
        Self {
            position,
            heading: normalize_heading(heading),
        }
    }

    /// Unit vector the robot faces.
    pub fn forward(&self) -> Vec3 {
        self.heading
    }

    /// Unit vector to the robot's right.
    pub fn right(&self) -> Vec3 {
        Vec3::Y.cross(self.heading)
    }

    /// Transform an offset expressed in the robot's local frame
    /// (x = right, y = up, z = forward) into world space.
    pub fn local_to_world(&self, offset: Vec3) -> Vec3 {
        self.position + self.right() * offset.x + Vec3::Y * offset.y + self.heading * offset.z
    }
}

/// Flatten and normalize a heading, falling back to `+Z` for degenerate input.
pub fn normalize_heading(heading: Vec3) -> Vec3 {
    flatten(heading).try_normalize().unwrap_or(Vec3::Z)
}

/// Per-agent state for a robot entity.
///
/// The robot's position lives on its [`Entity`](crate::Entity) record; this
/// struct holds everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    /// Matches the robot's entity ID.
    pub id: EntityId,
    /// Facing direction, unit length on the horizontal plane.
    pub heading: Vec3,
    /// Perception cone used for reveal and for view-dependent actions.
    pub fov: Fov,
    /// Has an extinguisher equipped.
    pub equipped: bool,
    /// Mirrors the held entity's `carried_by` back-reference.
    pub holding: Option<EntityId>,
    /// Transient waypoint the movement integrator steers toward.
    pub target: Option<Vec3>,
    /// Entities this robot has revealed. Only ever grows.
    pub revealed: BTreeSet<EntityId>,
}

impl Robot {
    /// A robot facing `+Z`, unequipped and empty-handed.
    pub fn new(id: impl Into<EntityId>, fov: Fov) -> Self {
        Self {
            id: id.into(),
            heading: Vec3::Z,
            fov,
            equipped: false,
            holding: None,
            target: None,
            revealed: BTreeSet::new(),
        }
    }

    /// Replace the heading, normalized onto the horizontal plane.
    pub fn with_heading(mut self, heading: Vec3) -> Self {
        self.heading = normalize_heading(heading);
        self
    }

    /// Whether this robot has revealed `id` at any point.
    pub fn has_revealed(&self, id: &str) -> bool {
        self.revealed.contains(id)
    }
}
