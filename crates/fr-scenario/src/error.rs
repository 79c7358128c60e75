use fr_core::{EntityId, FrError};

/// Alias for `Result<T, ScenarioError>`.
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Errors raised while loading a scenario. All of them abort setup.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("invalid scenario document: {0}")]
    Json(#[from] serde_json::Error),

    /// The scenario file could not be read.
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// The registry rejected an entity (duplicate ID and the like).
    #[error(transparent)]
    World(#[from] FrError),

    /// An entity names a room that has not been registered.
    #[error("{entity} references unknown room \"{room}\"")]
    UnknownRoom {
        /// The referencing entity.
        entity: EntityId,
        /// The missing room.
        room: EntityId,
    },

    /// The message carries a `type` other than `world_init`.
    #[error("unexpected message type \"{0}\", expected \"world_init\"")]
    MessageType(String),
}
