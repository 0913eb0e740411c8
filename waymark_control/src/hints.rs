// Caller-supplied traversal hints for a pathing operation.
//
// `TraversalHints` is a capability bundle: every field is optional and
// overrides exactly one planner default.
//
// | field             | overrides                         | default                      |
// |-------------------|-----------------------------------|------------------------------|
// | `node_type`       | voxel classification              | `classify_default`           |
// | `penalty`         | per-type penalty                  | `NodeType::default_penalty`  |
// | `follow_range`    | max search radius from the start  | 2x distance to target        |
// | `reach_distance`  | accepted Manhattan distance       | 0 (exact)                    |
// | `max_path_length` | max accumulated path cost         | 2x distance to target        |
//
// The classifier callback receives the planner's `BlockView` and returns a
// type *name* (scripts speak strings). Names are parsed with
// `NodeType::from_name`, so an unknown name aborts the search with
// `UnknownNodeType` instead of being guessed at. A callback
// returning `None` defers to the default classifier for that voxel. The same
// applies to the penalty callback.
//
// See also: `script.rs` for building hints from a script object,
// `pathfinding.rs` for where they are consulted.

use crate::config::ControlConfig;
use crate::error::ControlError;
use crate::host::BlockView;
use crate::node_type::{NodeType, classify_default};
use crate::types::VoxelCoord;
use std::fmt;

/// Classifier callback: type name for a voxel, or `None` for the default.
/// Gets the planner's world view; the host client is locked for the whole
/// search, so the callback must read blocks through `view`.
pub type NodeTypeHint =
    Box<dyn FnMut(&dyn BlockView, VoxelCoord) -> Result<Option<String>, ControlError>>;

/// Penalty callback: penalty for a type, or `None` for the default.
pub type PenaltyHint = Box<dyn FnMut(NodeType) -> Result<Option<f32>, ControlError>>;

/// Optional overrides for one pathing operation.
#[derive(Default)]
pub struct TraversalHints {
    pub node_type: Option<NodeTypeHint>,
    pub penalty: Option<PenaltyHint>,
    pub follow_range: Option<f32>,
    pub reach_distance: Option<u32>,
    pub max_path_length: Option<f32>,
}

/// Concrete search bounds after defaults are filled in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchLimits {
    pub follow_range: f32,
    pub max_path_length: f32,
    pub reach_distance: u32,
}

impl TraversalHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_types(
        mut self,
        f: impl FnMut(&dyn BlockView, VoxelCoord) -> Result<Option<String>, ControlError> + 'static,
    ) -> Self {
        self.node_type = Some(Box::new(f));
        self
    }

    pub fn with_penalties(
        mut self,
        f: impl FnMut(NodeType) -> Result<Option<f32>, ControlError> + 'static,
    ) -> Self {
        self.penalty = Some(Box::new(f));
        self
    }

    pub fn with_follow_range(mut self, range: f32) -> Self {
        self.follow_range = Some(range);
        self
    }

    pub fn with_reach_distance(mut self, reach: u32) -> Self {
        self.reach_distance = Some(reach);
        self
    }

    pub fn with_max_path_length(mut self, length: f32) -> Self {
        self.max_path_length = Some(length);
        self
    }

    /// Traversal type of `pos`, asking the hint first.
    pub fn classify(
        &mut self,
        view: &dyn BlockView,
        pos: VoxelCoord,
    ) -> Result<NodeType, ControlError> {
        if let Some(hint) = self.node_type.as_mut()
            && let Some(name) = hint(view, pos)?
        {
            return NodeType::from_name(&name);
        }
        Ok(classify_default(view, pos))
    }

    /// Penalty of `ty`, asking the hint first.
    pub fn penalty(&mut self, ty: NodeType) -> Result<f32, ControlError> {
        if let Some(hint) = self.penalty.as_mut()
            && let Some(p) = hint(ty)?
        {
            return Ok(p);
        }
        Ok(ty.default_penalty())
    }

    /// Fill in defaults. `straight_line` is the distance from the entity to
    /// the target voxel center.
    pub fn limits(&self, straight_line: f32, config: &ControlConfig) -> SearchLimits {
        let derived = straight_line * config.default_range_multiplier;
        SearchLimits {
            follow_range: self.follow_range.unwrap_or(derived),
            max_path_length: self.max_path_length.unwrap_or(derived),
            reach_distance: self.reach_distance.unwrap_or(0),
        }
    }
}

impl fmt::Debug for TraversalHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalHints")
            .field("node_type", &self.node_type.is_some())
            .field("penalty", &self.penalty.is_some())
            .field("follow_range", &self.follow_range)
            .field("reach_distance", &self.reach_distance)
            .field("max_path_length", &self.max_path_length)
            .finish()
    }
}
