//! World ingestion for Fire Rescue.
//!
//! Parses `world_init` documents and builds the initial [`World`]. Loading is
//! all-or-nothing: any structural error aborts setup.

/// The world builder.
pub mod builder;
/// Ingestion configuration.
pub mod config;
/// Serde types for the `world_init` document.
pub mod document;
/// Error types for ingestion.
pub mod error;

use std::path::Path;

use fr_core::World;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub use builder::{FLOOR_ID, SAFE_ZONE_ID, build_world};
pub use config::IngestConfig;
pub use document::{CandidateAction, DynamicsPatch, WorldInit, WorldSpec};
pub use error::{ScenarioError, ScenarioResult};

/// A loaded scenario: the built world plus the document's side channels.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// The initial world.
    pub world: World,
    /// Suggested commands, in document order.
    pub candidates: Vec<CandidateAction>,
    /// Dynamics overrides from the document, if any.
    pub dynamics: Option<DynamicsPatch>,
}

/// Load a scenario from document text.
///
/// The same text, config, and seed always produce the same world.
pub fn load_str(text: &str, config: &IngestConfig, seed: u64) -> ScenarioResult<Scenario> {
    let doc = WorldInit::parse(text)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let world = build_world(&doc.world, config, &mut rng)?;
    tracing::info!(
        entities = world.entity_count(),
        robots = world.robot_ids().len(),
        candidates = doc.candidates.len(),
        "scenario loaded"
    );
    Ok(Scenario {
        world,
        candidates: doc.candidates,
        dynamics: doc.dynamic,
    })
}

/// Load a scenario from a file.
pub fn load_file(path: &Path, config: &IngestConfig, seed: u64) -> ScenarioResult<Scenario> {
    let text = std::fs::read_to_string(path)?;
    load_str(&text, config, seed)
}
