use glam::Vec3;

use crate::error::{SimError, SimResult};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Simulated seconds per tick.
    pub seconds_per_tick: f64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Length of a `move_<direction>` step.
    pub step_length: f32,
    /// Robot travel speed in units per second.
    pub move_speed: f32,
    /// A robot closer than this to its target has arrived.
    pub arrival_tolerance: f32,
    /// Pick and deliver succeed directly within this horizontal distance.
    pub interaction_radius: f32,
    /// Horizontal coordinates are clamped to `[-bound, bound]`.
    pub world_bound: f32,
    /// Half extents of the box probed at a step's destination.
    pub probe_half_extents: Vec3,
    /// Held entities sit at this offset in the carrier's frame (right, up, forward).
    pub carry_offset: Vec3,
    /// Dropped entities land this far in front of the robot.
    pub drop_distance: f32,
    /// Rescued survivors land within this horizontal jitter of the safe zone.
    pub rescue_jitter: f32,
    /// How long extinguishing suspends the dynamics.
    pub extinguish_suspend_seconds: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            seconds_per_tick: 1.0,
            max_events: 0,
            step_length: 2.0,
            move_speed: 4.0,
            arrival_tolerance: 0.3,
            interaction_radius: 1.5,
            world_bound: 20.0,
            probe_half_extents: Vec3::new(0.3, 0.6, 0.3),
            carry_offset: Vec3::new(0.0, 1.0, 0.6),
            drop_distance: 0.6,
            rescue_jitter: 0.3,
            extinguish_suspend_seconds: 1.0,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of simulated seconds per tick.
    pub fn with_seconds_per_tick(mut self, seconds: f64) -> Self {
        self.seconds_per_tick = seconds;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Set the length of a directional step.
    pub fn with_step_length(mut self, length: f32) -> Self {
        self.step_length = length;
        self
    }

    /// Set robot travel speed in units per second.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Set the reach for direct pick and deliver.
    pub fn with_interaction_radius(mut self, radius: f32) -> Self {
        self.interaction_radius = radius;
        self
    }

    /// Set the horizontal clamp bound.
    pub fn with_world_bound(mut self, bound: f32) -> Self {
        self.world_bound = bound;
        self
    }

    /// Set the landing jitter around the safe zone.
    pub fn with_rescue_jitter(mut self, jitter: f32) -> Self {
        self.rescue_jitter = jitter;
        self
    }

    /// Reject settings the clock cannot run on.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.seconds_per_tick.is_finite() && self.seconds_per_tick > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "seconds per tick must be positive and finite, got {}",
                self.seconds_per_tick
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = SimConfig::default();
        assert_eq!(config.seed, 42);
        assert!((config.seconds_per_tick - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.max_events, 0);
        assert!((config.step_length - 2.0).abs() < f32::EPSILON);
        assert!((config.interaction_radius - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.probe_half_extents, Vec3::new(0.3, 0.6, 0.3));
    }

    #[test]
    fn config_builder_chain() {
        let config = SimConfig::default()
            .with_seed(123)
            .with_seconds_per_tick(0.25)
            .with_max_events(500)
            .with_move_speed(8.0)
            .with_world_bound(5.0);
        assert_eq!(config.seed, 123);
        assert!((config.seconds_per_tick - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.max_events, 500);
        assert!((config.move_speed - 8.0).abs() < f32::EPSILON);
        assert!((config.world_bound - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn validate_rejects_bad_tick_length() {
        assert!(SimConfig::default().validate().is_ok());
        for seconds in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let config = SimConfig::default().with_seconds_per_tick(seconds);
            assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
        }
    }
}
