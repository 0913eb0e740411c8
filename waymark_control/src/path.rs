// Computed paths and their traversal cursor.
//
// A `Path` is produced once by the planner (`pathfinding.rs`) and never
// changes shape afterwards: the node sequence is an `Arc<[PathNode]>`, so
// clones share it and nothing can write to it. The only mutable part is the
// cursor, which only moves forward (`advance`). Replanning builds a brand
// new `Path`; the executor swaps it in wholesale.
//
// `is_finished()` flips to true exactly when the cursor moves past the last
// node, and stays true.

use crate::types::{Vec3, VoxelCoord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One step of a computed path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub pos: VoxelCoord,
    /// Cumulative cost from the start node.
    pub cost: f32,
    /// Position of this node within its path.
    pub index: usize,
}

/// An immutable node sequence plus a forward-only cursor.
#[derive(Clone, Debug)]
pub struct Path {
    nodes: Arc<[PathNode]>,
    cursor: usize,
    /// The target the search reached.
    reached: VoxelCoord,
}

impl Path {
    /// Build a path from positions and their cumulative costs.
    pub(crate) fn from_steps(steps: Vec<(VoxelCoord, f32)>, reached: VoxelCoord) -> Self {
        let nodes: Vec<PathNode> = steps
            .into_iter()
            .enumerate()
            .map(|(index, (pos, cost))| PathNode { pos, cost, index })
            .collect();
        Self {
            nodes: nodes.into(),
            cursor: 0,
            reached,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// The node the cursor points at, or `None` once finished.
    pub fn current(&self) -> Option<&PathNode> {
        self.nodes.get(self.cursor)
    }

    pub fn end(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    /// The target voxel whose reach region the search ended in.
    pub fn reached_target(&self) -> VoxelCoord {
        self.reached
    }

    /// Total cost of the whole path.
    pub fn total_cost(&self) -> f32 {
        self.end().map_or(0.0, |n| n.cost)
    }

    /// Nodes from the cursor to the end, inclusive.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.nodes.len()
    }

    /// Move the cursor one node forward. No-op once finished.
    pub fn advance(&mut self) {
        if !self.is_finished() {
            self.cursor += 1;
        }
    }

    /// True if both paths share the same node storage.
    pub fn same_nodes(&self, other: &Path) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }
}

/// The horizontal point a path leg steers to: the node's XZ center.
pub fn leg_target(node: &PathNode) -> (f64, f64) {
    let c: Vec3 = node.pos.center();
    (c.x, c.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(len: i32) -> Path {
        let steps = (0..len)
            .map(|x| (VoxelCoord::new(x, 1, 0), x as f32))
            .collect();
        Path::from_steps(steps, VoxelCoord::new(len - 1, 1, 0))
    }

    #[test]
    fn nodes_carry_their_index() {
        let path = straight(4);
        for (i, node) in path.nodes().iter().enumerate() {
            assert_eq!(node.index, i);
        }
        assert_eq!(path.total_cost(), 3.0);
    }

    #[test]
    fn cursor_is_monotonic_and_finishes_exactly_once() {
        let mut path = straight(3);
        let mut finished_transitions = 0;
        let mut last_cursor = path.current_index();
        let mut was_finished = path.is_finished();
        for _ in 0..6 {
            path.advance();
            assert!(path.current_index() >= last_cursor);
            last_cursor = path.current_index();
            if path.is_finished() && !was_finished {
                finished_transitions += 1;
            }
            was_finished = path.is_finished();
        }
        assert_eq!(finished_transitions, 1);
        assert_eq!(path.current_index(), 3);
        assert!(path.current().is_none());
    }

    #[test]
    fn finished_only_after_passing_last_node() {
        let mut path = straight(2);
        path.advance();
        assert!(!path.is_finished());
        assert_eq!(path.current().unwrap().pos, VoxelCoord::new(1, 1, 0));
        path.advance();
        assert!(path.is_finished());
    }

    #[test]
    fn clones_share_nodes_but_not_cursor() {
        let mut path = straight(3);
        let snapshot = path.clone();
        path.advance();
        assert!(path.same_nodes(&snapshot));
        assert_eq!(snapshot.current_index(), 0);
        assert_eq!(path.remaining(), 2);
    }

    #[test]
    fn leg_target_is_voxel_center() {
        let path = straight(2);
        assert_eq!(leg_target(&path.nodes()[1]), (1.5, 0.5));
    }
}
