use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Project a vector onto the horizontal (XZ) plane.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Distance between two points ignoring the vertical axis.
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}

/// Move `current` toward `target` by at most `max_step`, never overshooting.
pub fn move_towards(current: Vec3, target: Vec3, max_step: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_step
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Build a box from two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Build a box around `center` extending `half_extents` along each axis.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Footprint overlap test on the horizontal plane.
    ///
    /// Boxes that only touch along an edge do not overlap.
    pub fn overlaps_horizontal(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_new_orders_corners() {
        let b = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 5.0));
        assert_eq!(b.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 5.0));
        assert_eq!(b.center(), Vec3::new(0.0, 1.0, 4.0));
        assert_eq!(b.size(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn horizontal_overlap_ignores_height() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        let b = Aabb::from_center(Vec3::new(0.5, 100.0, 0.0), Vec3::splat(0.5));
        assert!(a.overlaps_horizontal(&b));
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(!a.overlaps_horizontal(&b));
    }

    #[test]
    fn horizontal_distance_drops_y() {
        let d = horizontal_distance(Vec3::new(0.0, 5.0, 0.0), Vec3::new(3.0, -2.0, 4.0));
        assert!((d - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn move_towards_clamps_to_target() {
        let next = move_towards(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 5.0);
        assert_eq!(next, Vec3::new(1.0, 0.0, 0.0));

        let next = move_towards(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 2.0);
        assert_eq!(next, Vec3::new(2.0, 0.0, 0.0));
    }
}
