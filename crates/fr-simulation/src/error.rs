use fr_core::{EntityId, EntityKind, FrError};

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Why a command or system step could not be carried out.
///
/// Command errors never halt the simulation; the orchestrator turns them into
/// [`Outcome::Rejected`](crate::action::Outcome::Rejected).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// The registry refused the operation.
    #[error(transparent)]
    World(#[from] FrError),

    /// No robot with this ID.
    #[error("unknown robot: \"{0}\"")]
    UnknownRobot(String),

    /// The action name is not recognized.
    #[error("unknown action: \"{0}\"")]
    UnknownAction(String),

    /// The target does not resolve to an active entity.
    #[error("unknown target: \"{0}\"")]
    UnknownTarget(String),

    /// The action needs a target and none was given.
    #[error("action {0} needs a target")]
    MissingTarget(String),

    /// The robot has nothing to drop or deliver.
    #[error("{0} is not holding anything")]
    NotHolding(EntityId),

    /// The robot already holds an item.
    #[error("{robot} already holds {held}")]
    HandsFull {
        /// The robot whose hands are full.
        robot: EntityId,
        /// The item it holds.
        held: EntityId,
    },

    /// Only kits, survivors, and extinguishers can be picked up.
    #[error("{id} is a {kind} and cannot be carried")]
    NotCarriable {
        /// The refused entity.
        id: EntityId,
        /// Its kind.
        kind: EntityKind,
    },

    /// Another robot holds the item.
    #[error("{id} is already carried by {by}")]
    AlreadyCarried {
        /// The held item.
        id: EntityId,
        /// The robot holding it.
        by: EntityId,
    },

    /// Rescue needs a safe zone to deliver to.
    #[error("no safe zone registered")]
    MissingSafeZone,

    /// A setting the simulation cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
