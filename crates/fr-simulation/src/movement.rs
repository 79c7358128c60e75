use fr_core::geometry::{flatten, horizontal_distance, move_towards};
use glam::Vec3;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

/// Below this squared horizontal distance a robot keeps its heading.
const REORIENT_EPSILON_SQ: f32 = 1e-4;

/// Moves every robot with a pending target toward it.
///
/// Each tick a robot advances at most `speed * dt` along the horizontal
/// plane, turns to face its direction of travel, and drops the target once
/// it is within the arrival tolerance.
#[derive(Debug)]
pub struct MovementSystem {
    speed: f32,
    tolerance: f32,
    arrivals: u64,
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new(4.0, 0.3)
    }
}

impl MovementSystem {
    /// Create a movement system with the given speed (units per second) and
    /// arrival tolerance.
    pub fn new(speed: f32, tolerance: f32) -> Self {
        Self {
            speed,
            tolerance,
            arrivals: 0,
        }
    }

    /// Total number of arrivals so far.
    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let max_step = self.speed * ctx.clock.dt() as f32;

        for robot in ctx.world.robot_ids() {
            let Some(target) = ctx.world.robot(robot.as_str())?.target else {
                continue;
            };
            let pos = ctx.world.position_of(robot.as_str())?;
            let goal = Vec3::new(target.x, pos.y, target.z);

            let next = move_towards(pos, goal, max_step);
            let travel = flatten(goal - pos);
            if travel.length_squared() > REORIENT_EPSILON_SQ {
                ctx.world.set_heading(robot.as_str(), travel)?;
            }
            ctx.world.move_to(robot.as_str(), next)?;

            if horizontal_distance(next, goal) < self.tolerance {
                ctx.world.set_target(robot.as_str(), None)?;
                self.arrivals += 1;
                tracing::debug!(%robot, position = ?next, "arrived");
                ctx.emit(
                    SimEventKind::Arrived {
                        robot: robot.clone(),
                    },
                    format!("{robot} arrived at ({:.1}, {:.1})", next.x, next.z),
                );
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
