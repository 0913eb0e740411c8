// Data-driven headless host configuration.
//
// World size, player physics and the toy interaction timings all live in
// `HostConfig`, loaded from JSON. Every field has a default, so a config
// file only lists what it changes. Values are per tick (20 ticks per
// second in the default tuning).
//
// See also: `physics.rs` for how the movement constants are applied,
// `client.rs` for the interaction timings.

use crate::error::HostError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// World extent in voxels (x, y, z).
    pub world_size: [u32; 3],

    /// Downward acceleration per tick, applied before drag.
    pub gravity: f64,

    /// Vertical velocity multiplier per tick.
    pub vertical_drag: f64,

    /// Upward velocity set by a jump from the ground.
    pub jump_velocity: f64,

    /// Horizontal distance covered per tick while walking.
    pub walk_speed: f64,

    pub sprint_multiplier: f64,

    pub sneak_multiplier: f64,

    /// Upward velocity while pushing against a ladder.
    pub climb_speed: f64,

    pub player_width: f64,
    pub player_height: f64,
    pub eye_height: f64,

    /// How far the crosshair reaches.
    pub block_reach: f64,

    /// Ticks of continued mining needed to break a block.
    pub break_ticks: u32,

    /// Ticks an item stays in use after a successful use.
    pub use_ticks: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            world_size: [32, 16, 32],
            gravity: 0.08,
            vertical_drag: 0.98,
            jump_velocity: 0.42,
            walk_speed: 0.2,
            sprint_multiplier: 1.3,
            sneak_multiplier: 0.3,
            climb_speed: 0.2,
            player_width: 0.6,
            player_height: 1.8,
            eye_height: 1.62,
            block_reach: 4.5,
            break_ticks: 6,
            use_ticks: 32,
        }
    }
}

impl HostConfig {
    pub fn from_json(json: &str) -> Result<Self, HostError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &str) -> Result<Self, HostError> {
        let json = std::fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, HostError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
