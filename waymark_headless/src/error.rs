// Errors raised by the headless host itself (as opposed to `ControlError`,
// which scripts see).

use waymark_control::ControlError;
use waymark_control::types::VoxelCoord;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Invalid host config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Spawn position {0} is outside the world")]
    SpawnOutOfBounds(VoxelCoord),

    #[error(transparent)]
    Control(#[from] ControlError),
}
