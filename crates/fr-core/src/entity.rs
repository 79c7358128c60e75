use std::borrow::Borrow;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;

/// Unique identifier for every entity in the world.
///
/// Scenario documents name entities with plain strings (`"Room1"`,
/// `"fire_2"`), so identifiers are string-backed rather than generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Wrap a string as an entity ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A room on the map. Other entities are placed relative to rooms.
    Room,
    /// A controllable agent.
    Robot,
    /// A hazard that can be extinguished and that spreads over time.
    Fire,
    /// A first-aid kit.
    Kit,
    /// A victim to be rescued.
    Survivor,
    /// A fire extinguisher.
    Extinguisher,
    /// A movement blocker with a box footprint.
    Obstacle,
    /// Where rescued survivors are brought.
    SafeZone,
    /// The ground plane.
    Floor,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 9] = [
        Self::Room,
        Self::Robot,
        Self::Fire,
        Self::Kit,
        Self::Survivor,
        Self::Extinguisher,
        Self::Obstacle,
        Self::SafeZone,
        Self::Floor,
    ];

    /// Map structure that every robot perceives regardless of geometry.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Room | Self::Floor | Self::SafeZone)
    }

    /// Kinds a robot can pick up and carry.
    pub fn is_carriable(self) -> bool {
        matches!(self, Self::Kit | Self::Survivor | Self::Extinguisher)
    }

    /// Kinds whose footprint rejects robot movement.
    pub fn blocks_movement(self) -> bool {
        matches!(self, Self::Obstacle)
    }

    /// Parse a kind from its snake_case name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// The snake_case name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Robot => "robot",
            Self::Fire => "fire",
            Self::Kit => "kit",
            Self::Survivor => "survivor",
            Self::Extinguisher => "extinguisher",
            Self::Obstacle => "obstacle",
            Self::SafeZone => "safe_zone",
            Self::Floor => "floor",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core entity record. Every world object is an Entity.
///
/// Fields are public for reading and for building an entity before
/// registration. Once registered, the [`World`](crate::World) only hands out
/// shared references; all mutation goes through registry methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// The kind of this entity.
    pub kind: EntityKind,
    /// Last independently-known position. Stale while the entity is carried;
    /// use [`World::position_of`](crate::World::position_of) for the live value.
    pub position: Vec3,
    /// Enclosing room, if any. Rooms, the floor, and the safe zone have none.
    pub room: Option<EntityId>,
    /// `false` once the entity has been logically removed.
    pub active: bool,
    /// Whether any robot has revealed this entity.
    pub shown: bool,
    /// The robot currently carrying this entity.
    pub carried_by: Option<EntityId>,
    /// Half size of the entity's box. Zero for point-like entities.
    pub half_extents: Vec3,
}

impl Entity {
    /// Create an active, hidden, point-like entity.
    pub fn new(id: impl Into<EntityId>, kind: EntityKind, position: Vec3) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            room: None,
            active: true,
            shown: false,
            carried_by: None,
            half_extents: Vec3::ZERO,
        }
    }

    /// Place the entity inside a room.
    pub fn in_room(mut self, room: impl Into<EntityId>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Give the entity a box footprint.
    pub fn with_half_extents(mut self, half_extents: Vec3) -> Self {
        self.half_extents = half_extents.abs();
        self
    }

    /// Mark the entity as revealed from the start.
    pub fn shown(mut self) -> Self {
        self.shown = true;
        self
    }

    /// The entity's box at its recorded position.
    pub fn footprint(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    /// Whether a robot currently holds this entity.
    pub fn is_carried(&self) -> bool {
        self.carried_by.is_some()
    }
}
