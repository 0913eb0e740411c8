// Path following with replanning.
//
// `PathExecutor` drives the player along a planned `Path`, one node at a
// time, replanning when the world changes near the remaining route or the
// target moves. State machine:
//
//     Following -> (ReplanPending) -> Following -> ... -> Done | Failed
//
// Each leg is `move_to` the horizontal center of the node at the cursor
// (smart movement on), then the cursor advances. After every leg:
// - a pending replan (set by the mutation observer), or
// - a moving target whose freshly resolved voxel differs from the last one
// triggers a new `find_path` with the same hints. The new `Path` replaces
// the old one wholesale; a failed replan fails the operation.
//
// The mutation observer is registered for the duration of `run` through an
// `ObserverGuard`, so it is removed on every exit path. It only reads a
// `ReplanZone` snapshot and sets a flag, O(1) per event. The zone is a
// sphere around the midpoint of the entity and the path's end node with
// radius `len - cursor`; an edited voxel whose center lies strictly inside
// marks the path stale. The zone is refreshed at each leg start and after
// every tick of the leg.
//
// Targets are resolved through `TargetResolver`: a fixed voxel, a tracked
// entity, a Rust closure, or a script function returning `{x, y, z}`.
// Script target functions run with the client released; hint callbacks
// get the world view as an argument instead of reaching for the client.
//
// The state lives in the shared watch, so an `ExecutorMonitor` can read it
// from the host side while `run` is in progress; a relevant edit shows up
// as `ReplanPending` immediately.
//
// See also: `pathfinding.rs` for the planner, `movement.rs` for legs,
// `mutation.rs` for the observer registry.

use crate::error::ControlError;
use crate::hints::TraversalHints;
use crate::host::{GameClient, PlayerSnapshot};
use crate::movement::move_to_observed;
use crate::mutation::MutationEvent;
use crate::path::{Path, leg_target};
use crate::pathfinding::find_path;
use crate::scheduler::TickScheduler;
use crate::script::{ScriptFunction, ScriptValue, voxel_from_object};
use crate::session::ControlSession;
use crate::types::{EntityId, Vec3, VoxelCoord};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Where the executor is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    Following,
    ReplanPending,
    Done,
    Failed,
}

/// Produces the voxel a pathing operation heads for.
///
/// Resolvers open the host through `session.client()` only for as long as
/// they read it, so a resolver that calls back into script code never runs
/// with the client locked.
pub trait TargetResolver {
    fn resolve<S: TickScheduler>(
        &mut self,
        session: &mut ControlSession<'_, S>,
    ) -> Result<VoxelCoord, ControlError>;

    /// Whether the target can change between legs.
    fn is_moving(&self) -> bool;
}

/// A fixed voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticTarget(pub VoxelCoord);

impl TargetResolver for StaticTarget {
    fn resolve<S: TickScheduler>(
        &mut self,
        _session: &mut ControlSession<'_, S>,
    ) -> Result<VoxelCoord, ControlError> {
        Ok(self.0)
    }

    fn is_moving(&self) -> bool {
        false
    }
}

/// The voxel a tracked entity stands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityTarget(pub EntityId);

impl TargetResolver for EntityTarget {
    fn resolve<S: TickScheduler>(
        &mut self,
        session: &mut ControlSession<'_, S>,
    ) -> Result<VoxelCoord, ControlError> {
        let entity = session
            .client()?
            .entity(self.0)
            .ok_or(ControlError::MissingEntity(self.0))?;
        Ok(VoxelCoord::containing(entity.position))
    }

    fn is_moving(&self) -> bool {
        true
    }
}

/// A closure over the host, re-evaluated after every leg.
pub struct FnTarget<F>(pub F);

impl<F> TargetResolver for FnTarget<F>
where
    F: FnMut(&dyn GameClient) -> Result<VoxelCoord, ControlError>,
{
    fn resolve<S: TickScheduler>(
        &mut self,
        session: &mut ControlSession<'_, S>,
    ) -> Result<VoxelCoord, ControlError> {
        let client = session.client()?;
        (self.0)(&*client)
    }

    fn is_moving(&self) -> bool {
        true
    }
}

/// A script function returning an `{x, y, z}` object. Called with the
/// client released.
#[derive(Clone)]
pub struct ScriptTarget(pub ScriptFunction);

impl ScriptTarget {
    pub fn from_script(value: &ScriptValue) -> Result<Self, ControlError> {
        Ok(ScriptTarget(value.as_function()?.clone()))
    }
}

impl TargetResolver for ScriptTarget {
    fn resolve<S: TickScheduler>(
        &mut self,
        _session: &mut ControlSession<'_, S>,
    ) -> Result<VoxelCoord, ControlError> {
        voxel_from_object(&(self.0)(&[])?)
    }

    fn is_moving(&self) -> bool {
        true
    }
}

impl fmt::Debug for ScriptTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScriptTarget(..)")
    }
}

/// Region in which a world edit invalidates the remaining path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplanZone {
    pub center: Vec3,
    pub radius: f64,
}

impl ReplanZone {
    /// Zone for `path` seen from an entity at `entity`. `None` once the path
    /// has nothing left to invalidate.
    pub fn around(path: &Path, entity: Vec3) -> Option<Self> {
        if path.is_empty() || path.is_finished() {
            return None;
        }
        let end = path.end()?.pos.corner();
        Some(Self {
            center: end.midpoint(entity),
            radius: path.remaining() as f64,
        })
    }

    pub fn contains(&self, pos: VoxelCoord) -> bool {
        pos.center().distance_sq(self.center) < self.radius * self.radius
    }
}

#[derive(Debug)]
struct ReplanWatch {
    zone: Option<ReplanZone>,
    pending: bool,
    state: ExecutorState,
}

impl Default for ReplanWatch {
    fn default() -> Self {
        Self {
            zone: None,
            pending: false,
            state: ExecutorState::Following,
        }
    }
}

impl ReplanWatch {
    fn observe(&mut self, event: &MutationEvent) {
        if self.zone.is_some_and(|zone| zone.contains(event.pos)) {
            self.pending = true;
            if self.state == ExecutorState::Following {
                self.state = ExecutorState::ReplanPending;
            }
        }
    }
}

type SharedWatch = Arc<Mutex<ReplanWatch>>;

fn lock_watch(watch: &SharedWatch) -> std::sync::MutexGuard<'_, ReplanWatch> {
    watch.lock().unwrap_or_else(PoisonError::into_inner)
}

fn refresh_zone(watch: &SharedWatch, path: Option<&Path>, entity: Vec3) {
    lock_watch(watch).zone = path.and_then(|p| ReplanZone::around(p, entity));
}

/// Read-only view of a running executor's state. Cloneable and `Send`, so
/// the host can watch a script's executor between ticks.
#[derive(Clone, Debug)]
pub struct ExecutorMonitor(SharedWatch);

impl ExecutorMonitor {
    /// `ReplanPending` from the moment a relevant edit is observed until the
    /// replan after the current leg.
    pub fn state(&self) -> ExecutorState {
        lock_watch(&self.0).state
    }
}

/// Follows a path to a target, replanning as needed.
pub struct PathExecutor<T> {
    target: T,
    hints: TraversalHints,
    path: Option<Path>,
    last_target: Option<VoxelCoord>,
    watch: SharedWatch,
    replans: u32,
}

impl<T: TargetResolver> PathExecutor<T> {
    pub fn new(target: T, hints: TraversalHints) -> Self {
        Self {
            target,
            hints,
            path: None,
            last_target: None,
            watch: Arc::new(Mutex::new(ReplanWatch::default())),
            replans: 0,
        }
    }

    pub fn state(&self) -> ExecutorState {
        lock_watch(&self.watch).state
    }

    pub fn monitor(&self) -> ExecutorMonitor {
        ExecutorMonitor(self.watch.clone())
    }

    fn set_state(&self, state: ExecutorState) {
        lock_watch(&self.watch).state = state;
    }

    /// The path currently being followed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Replans during the latest `run`.
    pub fn replans(&self) -> u32 {
        self.replans
    }

    /// Plan from the player's current voxel to the last resolved target,
    /// resolving it first if there is none.
    fn plan<S: TickScheduler>(
        &mut self,
        session: &mut ControlSession<'_, S>,
    ) -> Result<Option<Path>, ControlError> {
        let target = match self.last_target {
            Some(t) => t,
            None => {
                let t = self.target.resolve(session)?;
                self.last_target = Some(t);
                t
            }
        };
        let config = session.config().clone();
        let client = session.client()?;
        let player = client.player().ok_or(ControlError::NoPlayer)?;
        let targets = BTreeSet::from([target]);
        find_path(
            client.world(),
            player.voxel(),
            &targets,
            &mut self.hints,
            player.position,
            &config,
        )
    }

    /// After a leg: should the path be recomputed?
    fn needs_replan<S: TickScheduler>(
        &mut self,
        session: &mut ControlSession<'_, S>,
    ) -> Result<bool, ControlError> {
        let pending = std::mem::take(&mut lock_watch(&self.watch).pending);
        let mut moved = false;
        if self.target.is_moving() {
            let fresh = self.target.resolve(session)?;
            moved = self.last_target != Some(fresh);
            self.last_target = Some(fresh);
        }
        if pending || moved {
            debug!(target: "pathing", pending, moved, target = ?self.last_target, "replan needed");
        }
        Ok(pending || moved)
    }

    /// Follow the target until it is reached or the path fails. Returns
    /// whether the target was reached. Each call starts over: the target is
    /// resolved afresh and the replan count resets.
    pub fn run<S: TickScheduler>(
        &mut self,
        session: &mut ControlSession<'_, S>,
    ) -> Result<bool, ControlError> {
        self.last_target = None;
        self.replans = 0;
        *lock_watch(&self.watch) = ReplanWatch::default();

        self.path = self.plan(session)?;
        if self.path.is_none() {
            debug!(target: "pathing", target = ?self.last_target, "no initial path");
            self.set_state(ExecutorState::Failed);
            return Ok(false);
        }

        let watch = self.watch.clone();
        let registry = session.client()?.mutations().clone();
        let _observer = registry.register_scoped(move |event| lock_watch(&watch).observe(event));

        while let Some(node) = self.path.as_ref().and_then(|p| p.current().copied()) {
            let entity = session.player()?.position;
            refresh_zone(&self.watch, self.path.as_ref(), entity);

            let (x, z) = leg_target(&node);
            let path = self.path.as_ref();
            let watch = &self.watch;
            let reached = move_to_observed(session, x, z, true, &mut |player: &PlayerSnapshot| {
                refresh_zone(watch, path, player.position);
            })?;
            if !reached {
                debug!(target: "pathing", node = %node.pos, "leg failed");
                self.set_state(ExecutorState::Failed);
                return Ok(false);
            }
            if let Some(p) = self.path.as_mut() {
                p.advance();
            }

            if self.needs_replan(session)? {
                self.set_state(ExecutorState::ReplanPending);
                self.path = self.plan(session)?;
                self.replans += 1;
                if self.path.is_none() {
                    debug!(target: "pathing", replans = self.replans, "replan found no path");
                    self.set_state(ExecutorState::Failed);
                    return Ok(false);
                }
            }
            self.set_state(ExecutorState::Following);
        }

        self.set_state(ExecutorState::Done);
        info!(
            target: "pathing",
            target = ?self.last_target,
            replans = self.replans,
            "path complete"
        );
        Ok(true)
    }
}

/// Path to `target` with `hints`. Returns whether it was reached.
pub fn path_to<S: TickScheduler, T: TargetResolver>(
    session: &mut ControlSession<'_, S>,
    target: T,
    hints: TraversalHints,
) -> Result<bool, ControlError> {
    PathExecutor::new(target, hints).run(session)
}
