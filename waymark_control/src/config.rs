// Data-driven control configuration.
//
// Every tunable constant of the movement and pathing layer lives in
// `ControlConfig`, loaded from JSON. Missing fields fall back to the
// defaults below, so a config file only needs to list what it changes.
//
// See also: `movement.rs` (radii, stuck interval), `pathfinding.rs`
// (entity height, step cost, search budget), `inventory.rs` (hotbar size),
// `interact.rs` (reach).

use crate::error::ControlError;
use serde::{Deserialize, Serialize};

/// Tunables for script-driven movement, pathing, and interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Point-to-point movement stops once the horizontal distance to the
    /// target is at most this.
    pub arrival_radius: f64,

    /// A final snap to the exact target is allowed within this distance.
    pub snap_radius: f64,

    /// Targets closer than this are snapped to without moving at all.
    pub already_there_radius: f64,

    /// Progress is sampled every this many ticks; no improvement = stuck.
    pub stuck_check_interval_ticks: u32,

    /// Entity height in whole voxels; the headroom a path node needs.
    pub entity_height: u32,

    /// Cost of a unit-length step before penalties.
    pub base_step_cost: f32,

    /// Default follow range and max path length are this multiple of the
    /// straight-line distance to the target.
    pub default_range_multiplier: f32,

    /// Upper bound on expanded nodes per search.
    pub max_expanded_nodes: usize,

    /// Maximum distance for clicking an entity.
    pub entity_reach: f64,

    /// Number of hotbar slots at the start of the main inventory.
    pub hotbar_size: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            arrival_radius: 0.25,
            snap_radius: 0.5,
            already_there_radius: 0.1,
            stuck_check_interval_ticks: 20,
            entity_height: 2,
            base_step_cost: 1.0,
            default_range_multiplier: 2.0,
            max_expanded_nodes: 16_384,
            entity_reach: 6.0,
            hotbar_size: 9,
        }
    }
}

impl ControlConfig {
    pub fn from_json(json: &str) -> Result<Self, ControlError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ControlError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = ControlConfig::default();
        let json = config.to_json().unwrap();
        let restored = ControlConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ControlConfig::from_json(r#"{ "entity_height": 3, "hotbar_size": 10 }"#)
            .unwrap();
        assert_eq!(config.entity_height, 3);
        assert_eq!(config.hotbar_size, 10);
        assert_eq!(config.arrival_radius, 0.25);
        assert_eq!(config.stuck_check_interval_ticks, 20);
    }

    #[test]
    fn from_json_rejects_invalid_json() {
        let err = ControlConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ControlError::Config(_)));
    }
}
