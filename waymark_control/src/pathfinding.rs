// A* path planning over the voxel world.
//
// Searches the 26-neighborhood of voxel positions where the entity's feet
// would be. A `BinaryHeap` gives the open set (min-heap via reversed
// ordering). Scores and back-links live in `FxHashMap`s keyed by
// `VoxelCoord`; the world is unbounded so there is no dense index to use.
//
// An edge `cur -> n` exists only when:
// - `n` classifies as a standable type with a non-negative penalty,
// - the column above `n` is collision-empty for the entity height, swept
//   over the higher of the two feet levels,
// - a step up also has clear space above the current head,
// - a purely vertical move starts or ends on a climbable voxel,
// - a diagonal move does not cut through either orthogonal corner column.
//
// Edge cost is `step_length * base_step_cost * (1 + penalty)`. The heuristic
// is Euclidean distance to the nearest target minus the reach distance,
// clamped at zero. Success is popping a node within reach (Manhattan) of any
// target. There are no partial paths: running past the follow range, the
// max path length, or the expansion budget yields `None`.
//
// **Determinism.** The search is a pure function of the world, the hints,
// and its inputs. Ties are broken by lower f, then lower g, then discovery
// order. Classification is memoized so a hint callback sees each voxel at
// most once per search.
//
// See also: `hints.rs` for the overrides consulted here, `executor.rs`
// which calls `find_path` at start and on every replan.

use crate::config::ControlConfig;
use crate::error::ControlError;
use crate::hints::{SearchLimits, TraversalHints};
use crate::host::BlockView;
use crate::node_type::NodeType;
use crate::path::Path;
use crate::types::{Vec3, VoxelCoord};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use tracing::debug;

/// Entry in the A* open set.
#[derive(Debug)]
struct OpenEntry {
    pos: VoxelCoord,
    f_score: f32,
    g_score: f32,
    seq: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f, then smallest g, then earliest
        // discovery is "greatest".
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.g_score.total_cmp(&self.g_score))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Per-search memo of classifications and penalties.
struct Costing<'h, 'v> {
    view: &'v dyn BlockView,
    hints: &'h mut TraversalHints,
    types: FxHashMap<VoxelCoord, NodeType>,
    penalties: FxHashMap<NodeType, f32>,
}

impl Costing<'_, '_> {
    fn node_type(&mut self, pos: VoxelCoord) -> Result<NodeType, ControlError> {
        if let Some(&ty) = self.types.get(&pos) {
            return Ok(ty);
        }
        let ty = self.hints.classify(self.view, pos)?;
        self.types.insert(pos, ty);
        Ok(ty)
    }

    fn penalty(&mut self, ty: NodeType) -> Result<f32, ControlError> {
        if let Some(&p) = self.penalties.get(&ty) {
            return Ok(p);
        }
        let p = self.hints.penalty(ty)?;
        self.penalties.insert(ty, p);
        Ok(p)
    }

    fn column_clear(&self, x: i32, z: i32, y_lo: i32, y_hi: i32) -> bool {
        (y_lo..=y_hi).all(|y| self.view.is_collision_empty(VoxelCoord::new(x, y, z)))
    }
}

/// Default follow range and max path length are measured from the entity to
/// the nearest target's voxel center.
pub fn straight_line_distance(entity: Vec3, targets: &BTreeSet<VoxelCoord>) -> f32 {
    targets
        .iter()
        .map(|t| entity.distance(t.center()))
        .fold(f64::INFINITY, f64::min) as f32
}

/// Find a path from `start` to any voxel within reach of `targets`.
///
/// Returns `Ok(None)` when no path exists within the limits, and an error
/// only for malformed input: an empty target set, or a hint that names an
/// unknown traversal type.
pub fn find_path(
    view: &dyn BlockView,
    start: VoxelCoord,
    targets: &BTreeSet<VoxelCoord>,
    hints: &mut TraversalHints,
    entity: Vec3,
    config: &ControlConfig,
) -> Result<Option<Path>, ControlError> {
    if targets.is_empty() {
        return Err(ControlError::EmptyTargets);
    }
    let limits = hints.limits(straight_line_distance(entity, targets), config);
    let height = config.entity_height.max(1) as i32;

    let mut costing = Costing {
        view,
        hints,
        types: FxHashMap::default(),
        penalties: FxHashMap::default(),
    };

    let mut g_score: FxHashMap<VoxelCoord, f32> = FxHashMap::default();
    let mut came_from: FxHashMap<VoxelCoord, VoxelCoord> = FxHashMap::default();
    let mut closed: FxHashSet<VoxelCoord> = FxHashSet::default();
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;
    let mut expanded = 0usize;

    g_score.insert(start, 0.0);
    open.push(OpenEntry {
        pos: start,
        f_score: heuristic(start, targets, &limits),
        g_score: 0.0,
        seq,
    });

    while let Some(current) = open.pop() {
        if current.f_score > limits.max_path_length {
            debug!(
                target: "pathing",
                %start,
                f = current.f_score,
                max = limits.max_path_length,
                "frontier exceeds max path length"
            );
            return Ok(None);
        }
        if !closed.insert(current.pos) {
            continue;
        }

        if let Some(reached) = reached_target(current.pos, targets, limits.reach_distance) {
            let path = reconstruct(&came_from, &g_score, current.pos, reached);
            debug!(
                target: "pathing",
                %start,
                %reached,
                nodes = path.len(),
                cost = path.total_cost(),
                expanded,
                "path found"
            );
            return Ok(Some(path));
        }

        expanded += 1;
        if expanded > config.max_expanded_nodes {
            debug!(target: "pathing", %start, expanded, "expansion budget exhausted");
            return Ok(None);
        }

        for (next, step_len) in candidate_moves(current.pos) {
            if closed.contains(&next) {
                continue;
            }
            if start.distance(next) > f64::from(limits.follow_range) {
                continue;
            }
            let Some(penalty) = edge_penalty(&mut costing, current.pos, next, height)? else {
                continue;
            };
            let tentative_g = current.g_score + step_len * config.base_step_cost * (1.0 + penalty);
            if tentative_g > limits.max_path_length {
                continue;
            }
            if tentative_g < g_score.get(&next).copied().unwrap_or(f32::INFINITY) {
                g_score.insert(next, tentative_g);
                came_from.insert(next, current.pos);
                seq += 1;
                open.push(OpenEntry {
                    pos: next,
                    f_score: tentative_g + heuristic(next, targets, &limits),
                    g_score: tentative_g,
                    seq,
                });
            }
        }
    }

    debug!(target: "pathing", %start, expanded, "frontier exhausted");
    Ok(None)
}

fn heuristic(pos: VoxelCoord, targets: &BTreeSet<VoxelCoord>, limits: &SearchLimits) -> f32 {
    let nearest = targets
        .iter()
        .map(|t| pos.distance(*t))
        .fold(f64::INFINITY, f64::min);
    (nearest as f32 - limits.reach_distance as f32).max(0.0)
}

fn reached_target(
    pos: VoxelCoord,
    targets: &BTreeSet<VoxelCoord>,
    reach: u32,
) -> Option<VoxelCoord> {
    targets
        .iter()
        .copied()
        .find(|t| pos.manhattan_distance(*t) <= reach)
}

/// The 26 neighbor offsets with their step lengths.
fn candidate_moves(pos: VoxelCoord) -> SmallVec<[(VoxelCoord, f32); 26]> {
    let mut out = SmallVec::new();
    for dy in -1..=1 {
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                let axes = (dx != 0) as u8 + (dy != 0) as u8 + (dz != 0) as u8;
                let len = match axes {
                    1 => 1.0,
                    2 => std::f32::consts::SQRT_2,
                    _ => 3.0f32.sqrt(),
                };
                out.push((pos.offset(dx, dy, dz), len));
            }
        }
    }
    out
}

/// The penalty of moving `cur -> next`, or `None` if the move is not an
/// edge.
fn edge_penalty(
    costing: &mut Costing<'_, '_>,
    cur: VoxelCoord,
    next: VoxelCoord,
    height: i32,
) -> Result<Option<f32>, ControlError> {
    let next_type = costing.node_type(next)?;
    if !next_type.is_standable() {
        return Ok(None);
    }
    let penalty = costing.penalty(next_type)?;
    if penalty < 0.0 {
        return Ok(None);
    }

    let (dx, dy, dz) = (next.x - cur.x, next.y - cur.y, next.z - cur.z);

    if dx == 0 && dz == 0 {
        let cur_type = costing.node_type(cur)?;
        if cur_type != NodeType::Climbable && next_type != NodeType::Climbable {
            return Ok(None);
        }
    }

    let top = next.y.max(cur.y) + height - 1;
    if !costing.column_clear(next.x, next.z, next.y + 1, top) {
        return Ok(None);
    }

    if dy > 0 && !costing.column_clear(cur.x, cur.z, cur.y + height, next.y + height - 1) {
        return Ok(None);
    }

    if dx != 0 && dz != 0 {
        let lo = cur.y.max(next.y);
        let hi = lo + height - 1;
        if !costing.column_clear(cur.x + dx, cur.z, lo, hi)
            || !costing.column_clear(cur.x, cur.z + dz, lo, hi)
        {
            return Ok(None);
        }
    }

    Ok(Some(penalty))
}

fn reconstruct(
    came_from: &FxHashMap<VoxelCoord, VoxelCoord>,
    g_score: &FxHashMap<VoxelCoord, f32>,
    end: VoxelCoord,
    reached: VoxelCoord,
) -> Path {
    let mut steps = Vec::new();
    let mut pos = end;
    loop {
        steps.push((pos, g_score.get(&pos).copied().unwrap_or(0.0)));
        match came_from.get(&pos) {
            Some(&prev) => pos = prev,
            None => break,
        }
    }
    steps.reverse();
    Path::from_steps(steps, reached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    /// Sparse test world: a solid floor at y = 0 over a square, plus edits.
    struct TestWorld {
        half: i32,
        blocks: BTreeMap<VoxelCoord, BlockKind>,
    }

    impl TestWorld {
        fn floor(half: i32) -> Self {
            Self {
                half,
                blocks: BTreeMap::new(),
            }
        }

        fn set(&mut self, pos: VoxelCoord, kind: BlockKind) {
            self.blocks.insert(pos, kind);
        }
    }

    impl BlockView for TestWorld {
        fn block_at(&self, pos: VoxelCoord) -> BlockKind {
            if let Some(&kind) = self.blocks.get(&pos) {
                return kind;
            }
            if pos.y == 0 && pos.x.abs() <= self.half && pos.z.abs() <= self.half {
                BlockKind::Solid
            } else {
                BlockKind::Air
            }
        }
    }

    fn targets(of: &[VoxelCoord]) -> BTreeSet<VoxelCoord> {
        of.iter().copied().collect()
    }

    fn feet(pos: VoxelCoord) -> Vec3 {
        Vec3::new(f64::from(pos.x) + 0.5, f64::from(pos.y), f64::from(pos.z) + 0.5)
    }

    fn plan(
        world: &TestWorld,
        start: VoxelCoord,
        goal: VoxelCoord,
        hints: &mut TraversalHints,
    ) -> Result<Option<Path>, ControlError> {
        find_path(
            world,
            start,
            &targets(&[goal]),
            hints,
            feet(start),
            &ControlConfig::default(),
        )
    }

    #[test]
    fn trivial_path_when_already_at_target() {
        let world = TestWorld::floor(4);
        let here = VoxelCoord::new(0, 1, 0);
        let path = plan(&world, here, here, &mut TraversalHints::new())
            .unwrap()
            .unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path.total_cost(), 0.0);
    }

    #[test]
    fn straight_floor_cost_tracks_distance() {
        let world = TestWorld::floor(12);
        let start = VoxelCoord::new(-8, 1, 0);
        let goal = VoxelCoord::new(8, 1, 0);
        let path = plan(&world, start, goal, &mut TraversalHints::new())
            .unwrap()
            .unwrap();
        let straight = start.distance(goal) as f32;
        assert!(path.total_cost() >= straight - 1e-4);
        assert!(path.total_cost() <= straight * 1.5);
        assert_eq!(path.end().unwrap().pos, goal);
        assert_eq!(path.nodes()[0].pos, start);
    }

    #[test]
    fn search_is_deterministic() {
        let world = TestWorld::floor(8);
        let start = VoxelCoord::new(-5, 1, -3);
        let goal = VoxelCoord::new(4, 1, 5);
        let a = plan(&world, start, goal, &mut TraversalHints::new()).unwrap().unwrap();
        let b = plan(&world, start, goal, &mut TraversalHints::new()).unwrap().unwrap();
        assert_eq!(a.nodes(), b.nodes());
    }

    #[test]
    fn empty_target_set_is_an_error() {
        let world = TestWorld::floor(2);
        let err = find_path(
            &world,
            VoxelCoord::new(0, 1, 0),
            &BTreeSet::new(),
            &mut TraversalHints::new(),
            Vec3::ZERO,
            &ControlConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::EmptyTargets));
    }

    #[test]
    fn unknown_hint_type_aborts_search() {
        let world = TestWorld::floor(4);
        let mut hints = TraversalHints::new().with_node_types(|_, pos| {
            Ok((pos.x == 1).then(|| "quicksand".to_string()))
        });
        let err = plan(&world, VoxelCoord::new(0, 1, 0), VoxelCoord::new(3, 1, 0), &mut hints)
            .unwrap_err();
        assert!(matches!(err, ControlError::UnknownNodeType(ref n) if n == "quicksand"));
    }

    #[test]
    fn classifier_hint_called_once_per_voxel() {
        let world = TestWorld::floor(6);
        let seen = Rc::new(RefCell::new(BTreeMap::<VoxelCoord, u32>::new()));
        let log = seen.clone();
        let mut hints = TraversalHints::new().with_node_types(move |_, pos| {
            *log.borrow_mut().entry(pos).or_default() += 1;
            Ok(None)
        });
        plan(&world, VoxelCoord::new(-3, 1, 0), VoxelCoord::new(3, 1, 2), &mut hints)
            .unwrap()
            .unwrap();
        assert!(seen.borrow().values().all(|&n| n == 1));
    }

    #[test]
    fn target_beyond_follow_range_is_unreachable() {
        let world = TestWorld::floor(20);
        let mut hints = TraversalHints::new().with_follow_range(5.0);
        let path = plan(&world, VoxelCoord::new(0, 1, 0), VoxelCoord::new(15, 1, 0), &mut hints)
            .unwrap();
        assert!(path.is_none());
    }

    #[test]
    fn reach_distance_accepts_nearby_node() {
        let world = TestWorld::floor(6);
        let goal = VoxelCoord::new(4, 1, 0);
        let mut hints = TraversalHints::new().with_reach_distance(2);
        let path = plan(&world, VoxelCoord::new(-4, 1, 0), goal, &mut hints)
            .unwrap()
            .unwrap();
        let end = path.end().unwrap().pos;
        assert!(end.manhattan_distance(goal) <= 2);
        assert_eq!(path.reached_target(), goal);
    }

    #[test]
    fn steps_up_a_single_block() {
        let mut world = TestWorld::floor(6);
        // A one-block ledge spanning the whole width at x = 2.
        for z in -6..=6 {
            for x in 2..=6 {
                world.set(VoxelCoord::new(x, 1, z), BlockKind::Solid);
            }
        }
        let goal = VoxelCoord::new(4, 2, 0);
        let path = plan(&world, VoxelCoord::new(-2, 1, 0), goal, &mut TraversalHints::new())
            .unwrap()
            .unwrap();
        assert_eq!(path.end().unwrap().pos, goal);
        let climbs = path
            .nodes()
            .windows(2)
            .filter(|w| w[1].pos.y > w[0].pos.y)
            .count();
        assert_eq!(climbs, 1);
    }

    #[test]
    fn two_block_wall_blocks_the_way() {
        let mut world = TestWorld::floor(3);
        for z in -3..=3 {
            world.set(VoxelCoord::new(1, 1, z), BlockKind::Solid);
            world.set(VoxelCoord::new(1, 2, z), BlockKind::Solid);
        }
        let path = plan(
            &world,
            VoxelCoord::new(-2, 1, 0),
            VoxelCoord::new(3, 1, 0),
            &mut TraversalHints::new(),
        )
        .unwrap();
        assert!(path.is_none());
    }

    #[test]
    fn does_not_cut_solid_corners() {
        let mut world = TestWorld::floor(4);
        world.set(VoxelCoord::new(1, 1, 0), BlockKind::Solid);
        world.set(VoxelCoord::new(1, 2, 0), BlockKind::Solid);
        let path = plan(
            &world,
            VoxelCoord::new(0, 1, 0),
            VoxelCoord::new(1, 1, 1),
            &mut TraversalHints::new(),
        )
        .unwrap()
        .unwrap();
        for w in path.nodes().windows(2) {
            let (a, b) = (w[0].pos, w[1].pos);
            let diagonal = a.x != b.x && a.z != b.z;
            assert!(!(diagonal && a == VoxelCoord::new(0, 1, 0) && b == VoxelCoord::new(1, 1, 1)));
        }
    }

    #[test]
    fn impassable_penalty_forces_detour() {
        let world = TestWorld::floor(6);
        let mut hints = TraversalHints::new().with_node_types(|_, pos| {
            Ok((pos.x == 0 && pos.z != 3).then(|| "lava".to_string()))
        });
        let path = plan(&world, VoxelCoord::new(-2, 1, 0), VoxelCoord::new(2, 1, 0), &mut hints)
            .unwrap()
            .unwrap();
        assert!(
            path.nodes()
                .iter()
                .filter(|n| n.pos.x == 0)
                .all(|n| n.pos.z == 3)
        );
    }

    #[test]
    fn penalty_hint_changes_preferred_route() {
        let world = TestWorld::floor(6);
        // Everything at z = 0 between the endpoints is water_border; making
        // it expensive pushes the route off that row.
        let mut hints = TraversalHints::new()
            .with_node_types(|_, pos| {
                Ok((pos.z == 0 && pos.x > -3 && pos.x < 3).then(|| "water_border".to_string()))
            })
            .with_penalties(|ty| Ok((ty == NodeType::WaterBorder).then_some(50.0)))
            .with_max_path_length(40.0)
            .with_follow_range(10.0);
        let path = plan(&world, VoxelCoord::new(-3, 1, 0), VoxelCoord::new(3, 1, 0), &mut hints)
            .unwrap()
            .unwrap();
        assert!(path.nodes().iter().all(|n| n.pos.z != 0 || n.pos.x.abs() >= 3));
    }

    #[test]
    fn climbs_ladder_vertically() {
        let mut world = TestWorld::floor(4);
        // Wall with a ladder against it leading to a platform at y = 4.
        for y in 1..=3 {
            world.set(VoxelCoord::new(1, y, 0), BlockKind::Solid);
            world.set(VoxelCoord::new(0, y, 0), BlockKind::Ladder);
        }
        let goal = VoxelCoord::new(1, 4, 0);
        let path = plan(&world, VoxelCoord::new(-2, 1, 0), goal, &mut TraversalHints::new())
            .unwrap()
            .unwrap();
        assert_eq!(path.end().unwrap().pos, goal);
        assert!(
            path.nodes()
                .windows(2)
                .any(|w| w[0].pos.x == w[1].pos.x && w[0].pos.z == w[1].pos.z)
        );
    }

    #[test]
    fn open_set_orders_by_f_then_g_then_sequence() {
        let mut heap = BinaryHeap::new();
        let at = VoxelCoord::new(0, 0, 0);
        heap.push(OpenEntry { pos: at, f_score: 2.0, g_score: 1.0, seq: 0 });
        heap.push(OpenEntry { pos: at, f_score: 1.0, g_score: 1.0, seq: 2 });
        heap.push(OpenEntry { pos: at, f_score: 1.0, g_score: 0.5, seq: 3 });
        heap.push(OpenEntry { pos: at, f_score: 1.0, g_score: 1.0, seq: 1 });
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|e| e.seq)).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);
    }
}
