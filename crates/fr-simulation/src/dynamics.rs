use fr_core::{Entity, EntityId, EntityKind};
use fr_scenario::DynamicsPatch;
use glam::Vec3;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

/// Shortest allowed periodic spawn interval, in seconds.
pub const MIN_SPREAD_SECONDS: f64 = 1.0;

/// Slack for comparing simulated instants.
const TIME_EPSILON: f64 = 1e-9;

/// Settings for autonomous world changes.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsConfig {
    /// Periodic fire spreading and step-coupled changes on or off.
    pub enabled: bool,
    /// React to reported step events.
    pub on_step: bool,
    /// Seconds between periodic fire spawns. Never below [`MIN_SPREAD_SECONDS`].
    pub fire_spread_seconds: f64,
    /// Chance that a step spawns a fire.
    pub step_fire_chance: f64,
    /// Chance that a step nudges an obstacle.
    pub step_nudge_chance: f64,
    /// Largest horizontal offset of an obstacle nudge, per axis.
    pub nudge_extent: f32,
    /// Spawned fires land within this horizontal offset of a room center.
    pub spawn_jitter: f32,
    /// Height of spawned fires above the room origin.
    pub spawn_height: f32,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            on_step: true,
            fire_spread_seconds: 45.0,
            step_fire_chance: 0.40,
            step_nudge_chance: 0.20,
            nudge_extent: 0.5,
            spawn_jitter: 3.0,
            spawn_height: 0.5,
        }
    }
}

impl DynamicsConfig {
    /// Turn periodic spawning and step reactions on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Let reported steps perturb the world.
    pub fn with_on_step(mut self, on_step: bool) -> Self {
        self.on_step = on_step;
        self
    }

    /// Set the spawn interval. Clamped when the system is built.
    pub fn with_fire_spread_seconds(mut self, seconds: f64) -> Self {
        self.fire_spread_seconds = seconds;
        self
    }

    /// Overlay the fields present in `patch`.
    pub fn apply(&mut self, patch: &DynamicsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(on_step) = patch.on_step {
            self.on_step = on_step;
        }
        if let Some(seconds) = patch.fire_spread_seconds {
            self.fire_spread_seconds = seconds;
        }
    }
}

/// Clamp a spawn interval to [`MIN_SPREAD_SECONDS`], warning when it changes.
fn clamp_interval(seconds: f64) -> f64 {
    if seconds >= MIN_SPREAD_SECONDS {
        seconds
    } else {
        tracing::warn!(
            requested = seconds,
            used = MIN_SPREAD_SECONDS,
            "fire spread interval below minimum, clamped"
        );
        MIN_SPREAD_SECONDS
    }
}

/// The pending periodic spawn. Only the task whose generation matches the
/// system's current generation may fire.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TimedTask {
    generation: u64,
    due_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Suspension {
    restore_enabled: bool,
    resume_at: f64,
}

/// Spawns fires on a timer and perturbs the world after reported steps.
///
/// Timed waits are explicit tasks checked against the simulation clock.
/// Restarting bumps a generation counter and replaces the pending task, so at
/// most one periodic process is ever live.
#[derive(Debug)]
pub struct DynamicsSystem {
    config: DynamicsConfig,
    generation: u64,
    periodic: Option<TimedTask>,
    suspension: Option<Suspension>,
    pending_steps: u32,
}

impl Default for DynamicsSystem {
    fn default() -> Self {
        Self::new(DynamicsConfig::default())
    }
}

impl DynamicsSystem {
    /// Build a system; the interval is clamped to [`MIN_SPREAD_SECONDS`].
    pub fn new(mut config: DynamicsConfig) -> Self {
        config.fire_spread_seconds = clamp_interval(config.fire_spread_seconds);
        Self {
            config,
            generation: 0,
            periodic: None,
            suspension: None,
            pending_steps: 0,
        }
    }

    /// Current settings. During a suspension `enabled` reads `false`.
    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    /// Whether the dynamics are on right now.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether a suspension window is open.
    pub fn is_suspended(&self) -> bool {
        self.suspension.is_some()
    }

    /// When the current suspension ends, if one is active.
    pub fn resume_at(&self) -> Option<f64> {
        self.suspension.map(|s| s.resume_at)
    }

    /// When the next periodic spawn is due, if one is scheduled.
    pub fn next_spawn_at(&self) -> Option<f64> {
        self.periodic
            .filter(|t| t.generation == self.generation)
            .map(|t| t.due_at)
    }

    /// Incremented by every restart or cancellation of the periodic process.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Step events waiting for the next tick.
    pub fn pending_steps(&self) -> u32 {
        self.pending_steps
    }

    /// Cancel the periodic process and, if enabled, start a fresh one whose
    /// first spawn is one interval after `now`.
    pub fn restart(&mut self, now: f64) {
        self.generation += 1;
        self.periodic = self.config.enabled.then_some(TimedTask {
            generation: self.generation,
            due_at: now + self.config.fire_spread_seconds,
        });
    }

    fn cancel(&mut self) {
        self.generation += 1;
        self.periodic = None;
    }

    /// Replace all three public parameters at once and restart.
    ///
    /// Any suspension in progress is dropped: the new settings win.
    pub fn configure(&mut self, enabled: bool, on_step: bool, fire_spread_seconds: f64, now: f64) {
        self.config.enabled = enabled;
        self.config.on_step = on_step;
        self.config.fire_spread_seconds = clamp_interval(fire_spread_seconds);
        self.suspension = None;
        self.restart(now);
    }

    /// Overlay a partial configuration and restart.
    pub fn apply_patch(&mut self, patch: &DynamicsPatch, now: f64) {
        let mut next = self.config.clone();
        if let Some(suspension) = self.suspension {
            // Patch against the settings the suspension would restore.
            next.enabled = suspension.restore_enabled;
        }
        next.apply(patch);
        self.configure(next.enabled, next.on_step, next.fire_spread_seconds, now);
    }

    /// Force dynamics off for `seconds`, then restore the previous flag.
    ///
    /// The periodic process is cancelled immediately. A suspension that
    /// overlaps one already in progress keeps the originally captured flag
    /// and extends the window to whichever end is later.
    pub fn suspend(&mut self, seconds: f64, now: f64) {
        let resume_at = now + seconds.max(0.0);
        self.suspension = Some(match self.suspension {
            Some(current) => Suspension {
                restore_enabled: current.restore_enabled,
                resume_at: current.resume_at.max(resume_at),
            },
            None => Suspension {
                restore_enabled: self.config.enabled,
                resume_at,
            },
        });
        self.config.enabled = false;
        self.cancel();
        tracing::debug!(seconds, resume_at, "dynamics suspended");
    }

    /// Record a step event for the next tick.
    ///
    /// Returns `false` (and records nothing) when step-coupled changes are
    /// off or dynamics are disabled.
    pub fn report_step(&mut self) -> bool {
        if self.config.on_step && self.config.enabled {
            self.pending_steps += 1;
            true
        } else {
            false
        }
    }

    fn resume_if_due(&mut self, ctx: &mut SimContext<'_>) {
        let now = ctx.now();
        let Some(suspension) = self.suspension else {
            return;
        };
        if now + TIME_EPSILON < suspension.resume_at {
            return;
        }
        self.suspension = None;
        self.config.enabled = suspension.restore_enabled;
        self.restart(now);
        tracing::info!(enabled = self.config.enabled, "dynamics resumed");
        ctx.emit(
            SimEventKind::DynamicsResumed {
                enabled: self.config.enabled,
            },
            format!("dynamics resumed (enabled: {})", self.config.enabled),
        );
    }

    fn run_periodic(&mut self, ctx: &mut SimContext<'_>) {
        let now = ctx.now();
        while let Some(task) = self.periodic {
            if task.generation != self.generation
                || !self.config.enabled
                || !task.due_at.is_finite()
                || now + TIME_EPSILON < task.due_at
            {
                break;
            }
            self.spawn_fire_logged(ctx);
            self.periodic = Some(TimedTask {
                generation: task.generation,
                due_at: task.due_at + self.config.fire_spread_seconds,
            });
        }
    }

    fn run_steps(&mut self, ctx: &mut SimContext<'_>) {
        let steps = std::mem::take(&mut self.pending_steps);
        for _ in 0..steps {
            if !self.config.enabled {
                break;
            }
            if ctx.rng.random_bool(self.config.step_fire_chance.clamp(0.0, 1.0)) {
                self.spawn_fire_logged(ctx);
            }
            if ctx.rng.random_bool(self.config.step_nudge_chance.clamp(0.0, 1.0)) {
                if let Err(e) = self.nudge_obstacle(ctx) {
                    tracing::warn!(error = %e, "obstacle nudge skipped");
                }
            }
        }
    }

    fn spawn_fire_logged(&self, ctx: &mut SimContext<'_>) {
        if let Err(e) = self.spawn_fire(ctx) {
            tracing::warn!(error = %e, "fire spawn skipped");
        }
    }

    /// Spawn one fire in a uniformly chosen active room.
    ///
    /// Returns `None` when there are no rooms.
    pub fn spawn_fire(&self, ctx: &mut SimContext<'_>) -> SimResult<Option<EntityId>> {
        let rooms: Vec<EntityId> = ctx
            .world
            .entities_of_kind(EntityKind::Room)
            .map(|r| r.id.clone())
            .collect();
        let Some(room) = rooms.choose(&mut *ctx.rng).cloned() else {
            return Ok(None);
        };
        let origin = ctx.world.get(room.as_str())?.position;
        let jitter = self.config.spawn_jitter;
        let offset = Vec3::new(ctx.jitter(jitter), self.config.spawn_height, ctx.jitter(jitter));

        let id = ctx.world.next_spawn_id("Fire");
        ctx.world.register(
            Entity::new(id.clone(), EntityKind::Fire, origin + offset).in_room(room.clone()),
        )?;
        ctx.world.show(id.as_str())?;

        tracing::info!(fire = %id, %room, "fire spawned");
        ctx.emit(
            SimEventKind::FireSpawned {
                fire: id.clone(),
                room: room.clone(),
            },
            format!("{id} broke out in {room}"),
        );
        Ok(Some(id))
    }

    /// Shift one random active obstacle horizontally.
    ///
    /// Returns `None` when there are no obstacles.
    pub fn nudge_obstacle(&self, ctx: &mut SimContext<'_>) -> SimResult<Option<EntityId>> {
        let obstacles: Vec<EntityId> = ctx
            .world
            .entities_of_kind(EntityKind::Obstacle)
            .map(|o| o.id.clone())
            .collect();
        let Some(obstacle) = obstacles.choose(&mut *ctx.rng).cloned() else {
            return Ok(None);
        };
        let extent = self.config.nudge_extent;
        let offset = Vec3::new(ctx.jitter(extent), 0.0, ctx.jitter(extent));
        let position = ctx.world.get(obstacle.as_str())?.position + offset;
        ctx.world.move_to(obstacle.as_str(), position)?;

        tracing::debug!(%obstacle, ?offset, "obstacle nudged");
        ctx.emit(
            SimEventKind::ObstacleNudged {
                obstacle: obstacle.clone(),
                offset,
            },
            format!("{obstacle} shifted"),
        );
        Ok(Some(obstacle))
    }
}

impl System for DynamicsSystem {
    fn name(&self) -> &'static str {
        "dynamics"
    }

    fn init(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        if self.periodic.is_none() && self.suspension.is_none() {
            self.restart(ctx.now());
        }
        Ok(())
    }

    /// Order within a tick: end a due suspension, fire due periodic spawns,
    /// then process queued step events.
    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.resume_if_due(ctx);
        self.run_periodic(ctx);
        self.run_steps(ctx);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
