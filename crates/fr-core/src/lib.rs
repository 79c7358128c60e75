//! Core types for Fire Rescue: entities, robots, and the world registry.
//!
//! This crate owns the authoritative world state. Ingestion builds a [`World`]
//! once per scenario; the simulation crate then mutates it exclusively through
//! the registry methods defined here, which keep the carried-by/holding
//! relation and the spatial index consistent.

/// Entity identifiers, kinds, and the entity record.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Axis-aligned boxes and horizontal-plane helpers.
pub mod geometry;
/// Robot agents: pose, field of view, and per-agent state.
pub mod robot;
/// Uniform grid over the horizontal plane for range and overlap queries.
pub mod spatial;
/// The entity registry.
pub mod world;

/// Re-export core entity types.
pub use entity::{Entity, EntityId, EntityKind};
/// Re-export error types.
pub use error::{FrError, FrResult};
/// Re-export geometry helpers.
pub use geometry::Aabb;
/// Re-export robot types.
pub use robot::{Fov, Pose, Robot};
/// Re-export the registry.
pub use world::World;
