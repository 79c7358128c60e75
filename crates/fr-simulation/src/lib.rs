//! Tick-based fire rescue simulation.
//!
//! Drives a [`fr_core::World`] with a set of systems (movement integration,
//! observability, autonomous dynamics) and executes robot commands between
//! ticks. Everything runs on one thread against a simulated clock, so the
//! same world, configuration, and command sequence always replay the same way.

/// Command parsing and the action executor.
pub mod action;
/// Simulation clock in ticks and simulated seconds.
pub mod clock;
/// Collision resolution for robot steps.
pub mod collision;
/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems each tick.
pub mod context;
/// Autonomous fire spreading and obstacle drift.
pub mod dynamics;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// Movement system: integrates robots toward their targets.
pub mod movement;
/// Field-of-view queries and the reveal system.
pub mod observability;
/// Top-level simulation orchestrator.
pub mod simulation;
/// The trait that all simulation systems implement.
pub mod system;
/// Serializable per-tick snapshots for renderers.
pub mod view;

#[cfg(test)]
mod testing;

/// Re-exports of [`action::Action`], [`action::ActionExecutor`], and [`action::Outcome`].
pub use action::{Action, ActionExecutor, Direction, Outcome};
/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-export of [`collision::CollisionResolver`].
pub use collision::CollisionResolver;
/// Re-export of [`config::SimConfig`].
pub use config::SimConfig;
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of [`dynamics::DynamicsConfig`] and [`dynamics::DynamicsSystem`].
pub use dynamics::{DynamicsConfig, DynamicsSystem};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`event::EventLog`], [`event::SimEvent`], and [`event::SimEventKind`].
pub use event::{EventLog, SimEvent, SimEventKind};
/// Re-export of [`movement::MovementSystem`].
pub use movement::MovementSystem;
/// Re-export of [`observability::ObservabilitySystem`].
pub use observability::ObservabilitySystem;
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
/// Re-export of [`system::System`].
pub use system::System;
/// Re-exports of the render snapshot types.
pub use view::{DynamicsView, EntityView, FrameView, RobotView};
