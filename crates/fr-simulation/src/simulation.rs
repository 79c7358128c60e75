use fr_core::{EntityId, World};
use fr_scenario::{CandidateAction, DynamicsPatch, Scenario};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::action::{Action, ActionExecutor, Outcome};
use crate::clock::SimClock;
use crate::collision::CollisionResolver;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::dynamics::{DynamicsConfig, DynamicsSystem};
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEvent, SimEventKind};
use crate::movement::MovementSystem;
use crate::observability::ObservabilitySystem;
use crate::system::System;
use crate::view::FrameView;

/// The top-level simulation orchestrator.
///
/// Owns the world, clock, RNG, event log, and registered systems.
/// Drives the tick loop and is the single entry point for commands, so
/// commands and system ticks never interleave.
pub struct Simulation {
    world: World,
    clock: SimClock,
    rng: StdRng,
    events: EventLog,
    config: SimConfig,
    systems: Vec<Box<dyn System>>,
    initialized: bool,
    executor: ActionExecutor,
    candidates: Vec<CandidateAction>,
    selected: Option<EntityId>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick())
            .field("systems", &self.systems.len())
            .field("events", &self.events.len())
            .field("selected", &self.selected)
            .finish()
    }
}

impl Simulation {
    /// Create a simulation with no systems registered.
    pub fn new(world: World, config: SimConfig) -> Self {
        let world = world.with_carry_offset(config.carry_offset);
        let clock = SimClock::new(config.seconds_per_tick);
        let rng = StdRng::seed_from_u64(config.seed);
        let events = EventLog::new(config.max_events);
        let executor = ActionExecutor::new(CollisionResolver::from_config(&config));
        Self {
            world,
            clock,
            rng,
            events,
            config,
            systems: Vec::new(),
            initialized: false,
            executor,
            candidates: Vec::new(),
            selected: None,
        }
    }

    /// Create a simulation with movement, observability, and dynamics
    /// registered, ticked in that order.
    pub fn with_dynamics(world: World, config: SimConfig, dynamics: DynamicsConfig) -> Self {
        let movement = MovementSystem::new(config.move_speed, config.arrival_tolerance);
        let mut sim = Self::new(world, config);
        sim.add_system(movement);
        sim.add_system(ObservabilitySystem::new());
        sim.add_system(DynamicsSystem::new(dynamics));
        sim
    }

    /// Create a simulation from a loaded scenario. The document's `dynamic`
    /// block overlays the default dynamics settings.
    pub fn from_scenario(scenario: Scenario, config: SimConfig) -> Self {
        let mut dynamics = DynamicsConfig::default();
        if let Some(patch) = &scenario.dynamics {
            dynamics.apply(patch);
        }
        let mut sim = Self::with_dynamics(scenario.world, config, dynamics);
        sim.candidates = scenario.candidates;
        sim
    }

    /// Register a system. Systems are ticked in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Initialize all registered systems.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.config.validate()?;
        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let mut ctx = SimContext {
                world: &mut self.world,
                clock: &self.clock,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
            };
            let result = system.init(&mut ctx);
            tracing::debug!(system = system.name(), ok = result.is_ok(), "system initialized");
            self.systems[i] = system;
            result?;
        }
        self.initialized = true;
        tracing::debug!(systems = self.systems.len(), "simulation initialized");
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> SimResult<()> {
        if !self.initialized {
            self.init()?;
        }

        self.clock.advance();

        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let mut ctx = SimContext {
                world: &mut self.world,
                clock: &self.clock,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
            };
            let result = system.tick(&mut ctx);
            if let Err(e) = &result {
                tracing::error!(system = system.name(), error = %e, "system tick failed");
            }
            self.systems[i] = system;
            result?;
        }
        Ok(())
    }

    /// Advance the simulation by `n` ticks.
    pub fn run(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.tick()?;
        }
        Ok(())
    }

    // --- Commands ---

    /// Run one command given as raw strings.
    ///
    /// An empty `robot` addresses the selected robot, or the first registered
    /// robot when none is selected. Failures never propagate: they come back
    /// as [`Outcome::Rejected`] and leave the world unchanged.
    pub fn execute(&mut self, robot: &str, action: &str, target: &str) -> Outcome {
        let Some(robot_id) = self.resolve_robot(robot) else {
            return self.reject(robot, action, SimError::UnknownRobot(robot.to_string()));
        };
        match Action::parse(action, target) {
            Ok(parsed) => self.execute_action(&robot_id, &parsed),
            Err(e) => self.reject(robot_id.as_str(), action, e),
        }
    }

    /// Run an already-parsed command.
    pub fn execute_action(&mut self, robot: &EntityId, action: &Action) -> Outcome {
        if let Err(e) = self.init() {
            return self.reject(robot.as_str(), &action.to_string(), e);
        }
        let mut ctx = SimContext {
            world: &mut self.world,
            clock: &self.clock,
            events: &mut self.events,
            rng: &mut self.rng,
            config: &self.config,
        };
        match self.executor.execute(&mut ctx, robot, action) {
            Ok(outcome) => {
                if matches!(outcome, Outcome::Extinguished { .. }) {
                    self.suspend_dynamics(self.config.extinguish_suspend_seconds);
                }
                outcome
            }
            Err(e) => self.reject(robot.as_str(), &action.to_string(), e),
        }
    }

    /// Run a command and, unless it was rejected, report a step to the
    /// dynamics engine.
    pub fn execute_step(&mut self, robot: &str, action: &str, target: &str) -> Outcome {
        let outcome = self.execute(robot, action, target);
        if !outcome.is_rejected() {
            self.report_step();
        }
        outcome
    }

    /// Run a suggested command from the scenario document.
    pub fn execute_candidate(&mut self, candidate: &CandidateAction) -> Outcome {
        self.execute(&candidate.robot, &candidate.action, &candidate.target)
    }

    fn resolve_robot(&self, robot: &str) -> Option<EntityId> {
        if robot.is_empty() {
            self.selected_robot()
        } else {
            Some(EntityId::new(robot))
        }
    }

    fn reject(&mut self, robot: &str, action: &str, err: SimError) -> Outcome {
        tracing::warn!(robot, action, error = %err, "command rejected");
        self.emit(
            SimEventKind::CommandRejected {
                robot: robot.to_string(),
                action: action.to_string(),
                reason: err.to_string(),
            },
            format!("{robot}: {action} rejected ({err})"),
        );
        Outcome::Rejected(err)
    }

    fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.tick(), kind, description));
    }

    /// Make `robot` the target of commands with an empty robot id.
    pub fn select(&mut self, robot: &str) -> SimResult<()> {
        if self.world.robot(robot).is_err() {
            return Err(SimError::UnknownRobot(robot.to_string()));
        }
        self.selected = Some(EntityId::new(robot));
        tracing::debug!(robot, "robot selected");
        Ok(())
    }

    /// The robot addressed by an empty robot id.
    pub fn selected_robot(&self) -> Option<EntityId> {
        self.selected
            .clone()
            .or_else(|| self.world.robot_ids().into_iter().next())
    }

    /// Suggested commands from the scenario document, in document order.
    pub fn candidates(&self) -> &[CandidateAction] {
        &self.candidates
    }

    // --- Dynamics ---

    /// The registered dynamics system, if any.
    pub fn dynamics(&self) -> Option<&DynamicsSystem> {
        self.get_system::<DynamicsSystem>()
    }

    /// Replace the dynamics settings and restart the periodic process.
    ///
    /// Returns `false` when no dynamics system is registered.
    pub fn configure_dynamics(&mut self, enabled: bool, on_step: bool, fire_spread_seconds: f64) -> bool {
        let now = self.clock.elapsed();
        let Some(dynamics) = self.get_system_mut::<DynamicsSystem>() else {
            return false;
        };
        dynamics.configure(enabled, on_step, fire_spread_seconds, now);
        let interval = dynamics.config().fire_spread_seconds;
        tracing::info!(enabled, on_step, interval, "dynamics configured");
        self.emit(
            SimEventKind::DynamicsConfigured {
                enabled,
                on_step,
                interval,
            },
            format!("dynamics configured (enabled: {enabled}, on_step: {on_step}, every {interval}s)"),
        );
        true
    }

    /// Overlay a partial dynamics configuration and restart.
    pub fn apply_dynamics_patch(&mut self, patch: &DynamicsPatch) -> bool {
        let now = self.clock.elapsed();
        let Some(dynamics) = self.get_system_mut::<DynamicsSystem>() else {
            return false;
        };
        dynamics.apply_patch(patch, now);
        let config = dynamics.config().clone();
        tracing::info!(
            enabled = config.enabled,
            on_step = config.on_step,
            interval = config.fire_spread_seconds,
            "dynamics patched"
        );
        self.emit(
            SimEventKind::DynamicsConfigured {
                enabled: config.enabled,
                on_step: config.on_step,
                interval: config.fire_spread_seconds,
            },
            "dynamics reconfigured",
        );
        true
    }

    /// Force dynamics off for `seconds` of simulated time.
    pub fn suspend_dynamics(&mut self, seconds: f64) -> bool {
        let now = self.clock.elapsed();
        let Some(dynamics) = self.get_system_mut::<DynamicsSystem>() else {
            return false;
        };
        dynamics.suspend(seconds, now);
        self.emit(
            SimEventKind::DynamicsSuspended { seconds },
            format!("dynamics paused for {seconds}s"),
        );
        true
    }

    /// Report a step event. It is processed on the next tick.
    pub fn report_step(&mut self) -> bool {
        self.get_system_mut::<DynamicsSystem>()
            .is_some_and(DynamicsSystem::report_step)
    }

    // --- Access ---

    /// Snapshot of the current frame for rendering.
    pub fn view(&self) -> FrameView {
        FrameView::capture(&self.world, &self.clock, self.dynamics())
    }

    /// The registry.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The simulation clock.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Everything logged so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Run-wide settings.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    /// Extract the world, consuming the simulation.
    pub fn into_world(self) -> World {
        self.world
    }

    /// Ticks completed.
    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}

/// Placeholder system used during the swap-and-tick pattern.
#[derive(Debug)]
struct NoopSystem;

impl System for NoopSystem {
    fn name(&self) -> &'static str {
        "noop"
    }
    fn tick(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{place, room_with_robot};
    use fr_core::EntityKind;
    use fr_scenario::IngestConfig;

    fn quiet() -> DynamicsConfig {
        DynamicsConfig::default()
            .with_enabled(false)
            .with_on_step(false)
    }

    fn sim(world: World) -> Simulation {
        Simulation::with_dynamics(world, SimConfig::default(), quiet())
    }

    const DOC: &str = r#"{
        "type": "world_init",
        "world": {
            "map": {"rooms": [{"id": "Room1", "pos": [0, 0, 0]}, {"id": "Room2", "pos": [12, 0, 0]}]},
            "entities": {
                "fires": [{"id": "Fire1", "room": "Room1"}],
                "survivors": [{"id": "Surv1", "room": "Room2"}]
            },
            "robots": [{"id": "robot1", "room": "Room1"}, {"id": "robot2", "room": "Room2"}]
        },
        "candidates": [{"robot": "robot1", "action": "extinguish_all_fov", "target": ""}],
        "dynamic": {"fire_spread_seconds": 5}
    }"#;

    #[test]
    fn init_reveals_before_first_tick() {
        let mut world = room_with_robot();
        place(&mut world, "Fire1", EntityKind::Fire, 0.0, 4.0);
        let mut sim = sim(world);
        sim.init().unwrap();
        assert_eq!(sim.current_tick(), 0);
        assert!(sim.world().get("Fire1").unwrap().shown);
    }

    #[test]
    fn command_then_ticks_moves_robot() {
        let mut sim = sim(room_with_robot());
        let outcome = sim.execute("robot1", "move_forward", "");
        assert!(matches!(outcome, Outcome::MoveStarted { blocked_by: None, .. }));

        sim.run(2).unwrap();
        let pose = sim.world().pose("robot1").unwrap();
        assert!((pose.position.z - 2.0).abs() < 1e-4);
        assert!(sim.world().robot("robot1").unwrap().target.is_none());
    }

    #[test]
    fn unknown_robot_is_rejected_and_logged() {
        let mut sim = sim(room_with_robot());
        let outcome = sim.execute("robot9", "drop", "");
        assert_eq!(outcome, Outcome::Rejected(SimError::UnknownRobot("robot9".into())));
        let last = sim.events().last().unwrap();
        assert!(matches!(last.kind, SimEventKind::CommandRejected { .. }));
        assert!(last.kind.involves("robot9"));
    }

    #[test]
    fn unknown_action_leaves_world_unchanged() {
        let mut sim = sim(room_with_robot());
        let before = sim.view();
        let outcome = sim.execute("robot1", "dance", "");
        assert_eq!(outcome, Outcome::Rejected(SimError::UnknownAction("dance".into())));
        assert_eq!(sim.view(), before);
    }

    #[test]
    fn empty_robot_uses_selection() {
        let mut world = room_with_robot();
        world
            .register_robot(
                fr_core::Robot::new("robot2", fr_core::Fov::default()),
                glam::Vec3::new(5.0, 0.5, 0.0),
                Some("Room1".into()),
            )
            .unwrap();
        let mut sim = sim(world);
        assert_eq!(sim.selected_robot(), Some(EntityId::new("robot1")));

        sim.select("robot2").unwrap();
        sim.execute("", "pick_extinguisher", "");
        assert!(sim.world().robot("robot2").unwrap().equipped);
        assert!(!sim.world().robot("robot1").unwrap().equipped);

        assert!(sim.select("nobody").is_err());
    }

    #[test]
    fn extinguish_suspends_dynamics() {
        let mut world = room_with_robot();
        place(&mut world, "Fire1", EntityKind::Fire, 0.0, 4.0);
        let config = DynamicsConfig::default().with_fire_spread_seconds(10.0);
        let mut sim = Simulation::with_dynamics(world, SimConfig::default(), config);

        let outcome = sim.execute("robot1", "extinguish_fire", "");
        assert_eq!(
            outcome,
            Outcome::Extinguished {
                fires: vec![EntityId::new("Fire1")],
                auto_equipped: true,
            }
        );
        assert!(sim.dynamics().unwrap().is_suspended());
        assert!(!sim.dynamics().unwrap().is_enabled());

        sim.tick().unwrap();
        assert!(sim.dynamics().unwrap().is_enabled());
        assert!(!sim.world().get("Fire1").unwrap().active);
    }

    #[test]
    fn execute_step_reports_only_accepted_commands() {
        let mut world = room_with_robot();
        place(&mut world, "Obs1", EntityKind::Obstacle, 8.0, 8.0);
        let mut sim = Simulation::with_dynamics(
            world,
            SimConfig::default(),
            DynamicsConfig::default().with_fire_spread_seconds(100.0),
        );
        sim.init().unwrap();

        sim.execute_step("robot1", "fly", "");
        assert_eq!(sim.dynamics().unwrap().pending_steps(), 0);
        sim.execute_step("robot1", "pick_extinguisher", "");
        assert_eq!(sim.dynamics().unwrap().pending_steps(), 1);

        sim.tick().unwrap();
        assert_eq!(sim.dynamics().unwrap().pending_steps(), 0);
    }

    #[test]
    fn configure_dynamics_emits_and_clamps() {
        let mut sim = sim(room_with_robot());
        assert!(sim.configure_dynamics(true, false, 0.5));
        let dynamics = sim.dynamics().unwrap();
        assert!(dynamics.is_enabled());
        assert!((dynamics.config().fire_spread_seconds - 1.0).abs() < f64::EPSILON);
        assert!(matches!(
            sim.events().last().unwrap().kind,
            SimEventKind::DynamicsConfigured { enabled: true, on_step: false, .. }
        ));

        sim.run(3).unwrap();
        assert_eq!(sim.world().entities_of_kind(EntityKind::Fire).count(), 3);
    }

    #[test]
    fn non_finite_tick_length_fails_before_ticking() {
        let config = SimConfig::default().with_seconds_per_tick(f64::INFINITY);
        let dynamics = DynamicsConfig::default().with_fire_spread_seconds(1.0);
        let mut sim = Simulation::with_dynamics(room_with_robot(), config, dynamics);
        assert!(matches!(sim.tick(), Err(SimError::InvalidConfig(_))));
        assert!(matches!(sim.run(3), Err(SimError::InvalidConfig(_))));
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.world().entities_of_kind(EntityKind::Fire).count(), 0);
    }

    #[test]
    fn without_dynamics_system_controls_are_noops() {
        let mut sim = Simulation::new(room_with_robot(), SimConfig::default());
        assert!(!sim.configure_dynamics(true, true, 5.0));
        assert!(!sim.suspend_dynamics(1.0));
        assert!(!sim.report_step());
        assert!(sim.view().dynamics.is_none());
    }

    #[test]
    fn from_scenario_applies_document_dynamics() {
        let scenario = fr_scenario::load_str(DOC, &IngestConfig::default(), 3).unwrap();
        let mut sim = Simulation::from_scenario(scenario, SimConfig::default());
        assert_eq!(sim.candidates().len(), 1);
        let dynamics = sim.dynamics().unwrap();
        assert!((dynamics.config().fire_spread_seconds - 5.0).abs() < f64::EPSILON);

        let candidate = sim.candidates()[0].clone();
        let outcome = sim.execute_candidate(&candidate);
        assert!(!outcome.is_rejected());
    }

    #[test]
    fn deterministic_runs() {
        let run = || {
            let scenario = fr_scenario::load_str(DOC, &IngestConfig::default(), 3).unwrap();
            let mut sim = Simulation::from_scenario(scenario, SimConfig::default().with_seed(9));
            sim.execute_step("robot1", "move_forward", "");
            sim.execute_step("robot2", "rescue_fov", "");
            sim.run(12).unwrap();
            sim.events()
                .events()
                .iter()
                .map(|e| e.description.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn rescue_and_carry_through_the_orchestrator() {
        let mut world = room_with_robot();
        place(&mut world, "Surv1", EntityKind::Survivor, 0.5, 1.0);
        let mut sim = sim(world);

        assert!(matches!(sim.execute("robot1", "pick", "Surv1"), Outcome::Picked { .. }));
        sim.execute("robot1", "move_forward", "");
        sim.run(2).unwrap();
        assert!(sim.world().position_of("Surv1").unwrap().z > 2.0);
        // Carried survivors keep following the robot as it moves.
        assert_eq!(
            sim.view().entity("Surv1").unwrap().position,
            sim.world().position_of("Surv1").unwrap()
        );

        assert!(matches!(sim.execute("robot1", "rescue_fov", ""), Outcome::Rescued { .. }));
        let survivor = sim.world().get("Surv1").unwrap();
        assert!(!survivor.active);
        assert!(survivor.carried_by.is_none());
        assert!(sim.world().robot("robot1").unwrap().holding.is_none());
    }

    #[test]
    fn into_world_preserves_changes() {
        let mut sim = sim(room_with_robot());
        sim.execute("robot1", "pick_extinguisher", "");
        let world = sim.into_world();
        assert!(world.robot("robot1").unwrap().equipped);
    }

    #[test]
    fn custom_system_registration() {
        #[derive(Debug)]
        struct Counter {
            ticks: u32,
        }
        impl System for Counter {
            fn name(&self) -> &'static str {
                "counter"
            }
            fn tick(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
                self.ticks += 1;
                Ok(())
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        let mut sim = Simulation::new(World::new(), SimConfig::default());
        sim.add_system(Counter { ticks: 0 });
        sim.run(4).unwrap();
        assert_eq!(sim.get_system::<Counter>().unwrap().ticks, 4);
    }
}
