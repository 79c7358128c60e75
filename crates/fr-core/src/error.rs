use crate::entity::EntityId;

/// Alias for `Result<T, FrError>`.
pub type FrResult<T> = Result<T, FrError>;

/// Errors raised by the entity registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrError {
    /// The requested entity ID is not registered.
    #[error("unknown entity: {0}")]
    UnknownId(EntityId),

    /// An entity with the same ID is already registered.
    #[error("entity already registered: {0}")]
    DuplicateId(EntityId),

    /// The entity exists but is not a robot.
    #[error("entity is not a robot: {0}")]
    NotARobot(EntityId),

    /// The entity is carried by a robot and cannot be handled independently.
    #[error("entity {id} is carried by {by}")]
    Carried {
        /// The carried entity.
        id: EntityId,
        /// The robot carrying it.
        by: EntityId,
    },

    /// The robot already holds an entity.
    #[error("robot {robot} already holds {held}")]
    HandsFull {
        /// The robot whose hands are full.
        robot: EntityId,
        /// The entity it currently holds.
        held: EntityId,
    },

    /// The entity has been deactivated and can no longer be interacted with.
    #[error("entity is inactive: {0}")]
    Inactive(EntityId),
}
