pub mod candidates;
pub mod check;
pub mod list;
pub mod run;
pub mod show;

use std::path::Path;

use fr_scenario::{IngestConfig, Scenario};
use glam::Vec3;

/// Load a scenario document, turning any ingestion error into a message.
fn load(file: &Path, seed: u64) -> Result<Scenario, String> {
    fr_scenario::load_file(file, &IngestConfig::default(), seed)
        .map_err(|e| format!("{}: {e}", file.display()))
}

/// Horizontal position as `(x, z)` with one decimal.
fn fmt_xz(v: Vec3) -> String {
    format!("({:.1}, {:.1})", v.x, v.z)
}

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
