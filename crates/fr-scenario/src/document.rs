use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ScenarioError, ScenarioResult};

/// The `type` tag of a world initialisation message.
pub const WORLD_INIT: &str = "world_init";

/// A complete world initialisation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldInit {
    /// Always [`WORLD_INIT`].
    #[serde(rename = "type", default = "world_init_tag")]
    pub kind: String,
    /// The world to build.
    pub world: WorldSpec,
    /// Suggested commands surfaced to the operator.
    #[serde(default)]
    pub candidates: Vec<CandidateAction>,
    /// Optional dynamics settings; absent fields keep their defaults.
    #[serde(default)]
    pub dynamic: Option<DynamicsPatch>,
}

fn world_init_tag() -> String {
    WORLD_INIT.to_string()
}

impl WorldInit {
    /// Parse a document that is either a full `world_init` message or a bare
    /// world description.
    pub fn parse(text: &str) -> ScenarioResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if let Some(kind) = value.get("type").and_then(|t| t.as_str()) {
            if kind != WORLD_INIT {
                return Err(ScenarioError::MessageType(kind.to_string()));
            }
        }

        if value.get("world").is_some() {
            Ok(serde_json::from_value(value)?)
        } else {
            let world: WorldSpec = serde_json::from_value(value)?;
            Ok(Self {
                kind: world_init_tag(),
                world,
                candidates: Vec::new(),
                dynamic: None,
            })
        }
    }
}

/// The world description: map, entities, and robots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSpec {
    /// Rooms, obstacles, and the optional safe zone.
    pub map: MapSpec,
    /// Fires, kits, survivors, and extinguishers, grouped by kind.
    #[serde(default)]
    pub entities: EntitiesSpec,
    /// Robots, each starting in a room.
    #[serde(default)]
    pub robots: Vec<RobotSpec>,
}

/// Static layout of the world.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapSpec {
    /// Rooms in document order.
    pub rooms: Vec<RoomSpec>,
    /// Obstacles, each anchored to a room.
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
    /// Explicit safe zone placement. Derived from the rooms when absent.
    #[serde(default)]
    pub safe_zone: Option<SafeZoneSpec>,
}

/// A room and its center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSpec {
    /// Room ID.
    pub id: String,
    /// Center in world coordinates.
    pub pos: [f32; 3],
}

impl RoomSpec {
    /// Center as a vector.
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.pos)
    }
}

/// An obstacle box given as `[min, max]` corners relative to its room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleSpec {
    /// Obstacle ID.
    pub id: String,
    /// Room the box is relative to.
    pub room: String,
    /// `[min, max]` corners in room-local coordinates.
    pub aabb: [[f32; 3]; 2],
}

impl ObstacleSpec {
    /// Center and size of the box in room-local coordinates.
    pub fn center_and_size(&self) -> (Vec3, Vec3) {
        let min = Vec3::from_array(self.aabb[0]);
        let max = Vec3::from_array(self.aabb[1]);
        ((min + max) * 0.5, (max - min).abs())
    }
}

/// Placed entities by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitiesSpec {
    /// Fires burning at start-up.
    #[serde(default)]
    pub fires: Vec<PlacementSpec>,
    /// First-aid kits.
    #[serde(default)]
    pub first_aid_kits: Vec<PlacementSpec>,
    /// Survivors waiting for rescue.
    #[serde(default)]
    pub survivors: Vec<PlacementSpec>,
    /// Loose extinguishers.
    #[serde(default)]
    pub extinguishers: Vec<PlacementSpec>,
}

/// An entity placed somewhere inside a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Entity ID.
    pub id: String,
    /// Room to place the entity in.
    pub room: String,
}

/// A robot and its starting room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotSpec {
    /// Robot ID.
    pub id: String,
    /// Starting room.
    pub room: String,
    /// Full FOV angle in degrees; the ingestion profile applies when absent.
    #[serde(default)]
    pub fov_deg: Option<f32>,
    /// Perception range; the ingestion profile applies when absent.
    #[serde(default)]
    pub range: Option<f32>,
}

/// Explicit safe zone placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeZoneSpec {
    /// Position in world coordinates.
    pub pos: [f32; 3],
}

/// A suggested command. The engine only exposes these; it never runs them on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAction {
    /// Robot that would run the command.
    pub robot: String,
    /// Action name.
    pub action: String,
    /// Target entity ID; empty when the action takes none.
    #[serde(default)]
    pub target: String,
}

impl fmt::Display for CandidateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}({})", self.robot, self.action, self.target)
    }
}

/// Partial dynamics configuration. Every absent field keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicsPatch {
    /// Periodic and step-coupled changes on or off.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Whether reported steps may perturb the world.
    #[serde(default)]
    pub on_step: Option<bool>,
    /// Seconds between periodic fire spawns.
    #[serde(default)]
    pub fire_spread_seconds: Option<f64>,
}
