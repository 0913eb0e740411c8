// Error taxonomy for script control operations.
//
// Only hard failures are errors. Ordinary outcomes a script is expected to
// branch on (no path found, stuck movement, a refused click) are plain
// `bool`/`Option` results, not `ControlError`s.
//
// Two families:
// - Caller contract violations: the script handed us something malformed
//   (unknown node-type name, wrong value shape, bad side name). These abort
//   the whole operation and are never retried.
// - Environment unavailable: collaborator state we need is gone (no player,
//   host tick loop shut down, tracked entity despawned).
//
// See also: `hints.rs` and `script.rs`, which produce most contract
// violations, `scheduler.rs` for `HostUnavailable`.

use crate::types::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Unknown path node type \"{0}\"")]
    UnknownNodeType(String),

    #[error("Malformed hint: {0}")]
    MalformedHint(String),

    #[error("Malformed script value: expected {expected}, got {got}")]
    MalformedValue { expected: &'static str, got: String },

    #[error("Path target set is empty")]
    EmptyTargets,

    #[error("Unknown block side \"{0}\"")]
    UnknownSide(String),

    #[error("Malformed item selector: {0}")]
    MalformedSelector(String),

    #[error("No controlled player in the world")]
    NoPlayer,

    #[error("Host tick loop is no longer running")]
    HostUnavailable,

    #[error("Entity {0} is not loaded")]
    MissingEntity(EntityId),

    #[error("Script thread panicked")]
    ScriptPanicked,

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl ControlError {
    /// True for errors caused by the caller handing us malformed input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ControlError::UnknownNodeType(_)
                | ControlError::MalformedHint(_)
                | ControlError::MalformedValue { .. }
                | ControlError::EmptyTargets
                | ControlError::UnknownSide(_)
                | ControlError::MalformedSelector(_)
        )
    }

    /// True for errors caused by missing collaborator state.
    pub fn is_environment_unavailable(&self) -> bool {
        matches!(
            self,
            ControlError::NoPlayer
                | ControlError::HostUnavailable
                | ControlError::MissingEntity(_)
                | ControlError::ScriptPanicked
        )
    }
}
