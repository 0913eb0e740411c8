// waymark_control — scripted player control for a host voxel game.
//
// This crate lets a user script drive the player entity of a host game one
// simulation tick at a time: walk to points, plan and follow paths to
// static or moving targets (replanning as the world changes underneath),
// look around, juggle the inventory, and click on blocks and entities. It
// knows nothing about any particular game; everything it needs from the
// host comes in through the narrow traits in `host.rs`.
//
// Module overview:
// - `types.rs`:       VoxelCoord, Vec3, Aabb, EntityId, Hand, Face.
// - `block.rs`:       BlockKind, the host's block classification.
// - `node_type.rs`:   NodeType traversal types, default penalties, default classifier.
// - `host.rs`:        Collaborator traits (BlockView, GameClient, HostTick, inventory, interaction).
// - `mutation.rs`:    Block-mutation observer registry with scoped guards.
// - `input.rs`:       MovementFlags / InputState, per-tick script intent.
// - `config.rs`:      ControlConfig, every movement/pathing tunable.
// - `error.rs`:       ControlError.
// - `scheduler.rs`:   TickScheduler: local and threaded per-tick suspension.
// - `session.rs`:     ControlSession, the per-script context.
// - `hints.rs`:       TraversalHints, optional per-search callbacks and limits.
// - `pathfinding.rs`: A* over voxels.
// - `path.rs`:        Path, the immutable node list plus cursor.
// - `movement.rs`:    snap_to / move_to, tick-driven point-to-point movement.
// - `executor.rs`:    PathExecutor: path following with replanning.
// - `look.rs`:        Rotation helpers and look sync.
// - `inventory.rs`:   Slot selection, item picking, containers.
// - `interact.rs`:    Click bindings, long use and long mine.
// - `script.rs`:      ScriptValue and conversion of script-shaped arguments.
// - `player.rs`:      ScriptPlayer facade and spawn_script.
//
// **Critical constraint: one tick at a time.** The script and the host
// simulation never run concurrently. A script only waits inside
// `TickScheduler::advance_one_tick`, and every tick it spends is exactly one
// host step. Pathfinding is deterministic: same world, start, targets and
// hints give the same node sequence.

pub mod block;
pub mod config;
pub mod error;
pub mod executor;
pub mod hints;
pub mod host;
pub mod input;
pub mod interact;
pub mod inventory;
pub mod look;
pub mod movement;
pub mod mutation;
pub mod node_type;
pub mod path;
pub mod pathfinding;
pub mod player;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::ControlConfig;
pub use error::ControlError;
pub use player::{ScriptPlayer, spawn_script};
