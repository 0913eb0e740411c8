// Collaborator interfaces: everything the control layer needs from the host
// game client, and nothing more.
//
// The host owns the entity, world, physics, inventory model, and network
// connection. The control layer reads them through snapshots
// (`PlayerSnapshot`, `EntitySnapshot`) and writes through a handful of
// narrow setters. No engine internals leak through these traits.
//
// - `BlockView`:         per-voxel block classification.
// - `GameClient`:        player, world, mutation channel, outbound sync, and
//                        access to the inventory/interaction surfaces.
// - `HostTick`:          one discrete simulation step, fed with script intent.
// - `InventoryAccess`:   slot contents and active-slot selection.
// - `InteractionAccess`: use/attack/interact dispatch for the click bindings.
//
// The headless reference host in `waymark_headless` implements all of them.
//
// See also: `scheduler.rs` for how `HostTick` is driven, `mutation.rs` for
// the registry returned by `GameClient::mutations`.

use crate::block::BlockKind;
use crate::input::{InputState, MovementFlags};
use crate::inventory::ItemStack;
use crate::mutation::MutationRegistry;
use crate::types::{Aabb, EntityId, Face, Hand, Vec3, VoxelCoord};
use serde::{Deserialize, Serialize};

/// Read access to the host's voxel world.
pub trait BlockView {
    fn block_at(&self, pos: VoxelCoord) -> BlockKind;

    fn is_collision_empty(&self, pos: VoxelCoord) -> bool {
        self.block_at(pos).is_collision_empty()
    }
}

/// Point-in-time view of the controlled player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Feet position.
    pub position: Vec3,
    pub eye_height: f64,
    pub width: f64,
    pub height: f64,
    pub on_ground: bool,
    pub yaw: f32,
    pub pitch: f32,
}

impl PlayerSnapshot {
    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.eye_height, 0.0)
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::of_entity(self.position, self.width, self.height)
    }

    pub fn voxel(&self) -> VoxelCoord {
        VoxelCoord::containing(self.position)
    }
}

/// Point-in-time view of some other entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub position: Vec3,
    /// `Some` for living entities, which are looked at eye-to-eye.
    pub eye_height: Option<f64>,
}

/// Outbound notifications telling the remote peer about out-of-band changes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyncPacket {
    Position { position: Vec3, on_ground: bool },
    Look { yaw: f32, pitch: f32, on_ground: bool },
}

/// Outcome of an interaction attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionResult {
    /// The interaction happened.
    Success,
    /// Nothing happened with this hand; try the next one.
    Pass,
    /// The interaction was refused outright; do not try other hands.
    Fail,
}

/// Where a block click lands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockHit {
    pub point: Vec3,
    pub face: Face,
    pub block: VoxelCoord,
}

/// The host game client as seen by scripts between ticks.
pub trait GameClient {
    fn world(&self) -> &dyn BlockView;

    fn mutations(&self) -> &MutationRegistry;

    /// `None` when no player entity is currently controlled.
    fn player(&self) -> Option<PlayerSnapshot>;

    fn set_player_position(&mut self, position: Vec3);

    fn set_player_rotation(&mut self, yaw: f32, pitch: f32);

    /// Flags the real input devices are asserting this tick.
    fn device_input(&self) -> MovementFlags;

    fn send(&mut self, packet: SyncPacket);

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot>;

    fn inventory(&mut self) -> &mut dyn InventoryAccess;

    fn interaction(&mut self) -> &mut dyn InteractionAccess;
}

/// One discrete host simulation step.
pub trait HostTick {
    /// Advance the simulation by exactly one tick. `script` is the active
    /// script's intent for this tick, or `None` when no script is driving.
    fn step(&mut self, script: Option<&InputState>);
}

/// Slot contents and selection of the player's own inventory.
pub trait InventoryAccess {
    /// Main inventory slots; indices `0..hotbar_size` are the hotbar.
    fn main_slots(&self) -> &[ItemStack];

    fn selected_slot(&self) -> usize;

    fn set_selected_slot(&mut self, slot: usize);

    /// Swap the item in `slot` into the selected hotbar slot.
    fn pick_from_inventory(&mut self, slot: usize);

    /// Identifier of the open container screen, if any.
    fn open_container(&self) -> Option<u32>;

    fn close_container(&mut self);
}

/// Host-side interaction dispatch used by the click bindings.
pub trait InteractionAccess {
    fn interact_item(&mut self, hand: Hand) -> InteractionResult;

    fn interact_block(&mut self, hand: Hand, hit: BlockHit) -> InteractionResult;

    fn interact_entity(&mut self, hand: Hand, entity: EntityId) -> InteractionResult;

    /// Begin breaking a block. Returns whether the host accepted it.
    fn attack_block(&mut self, pos: VoxelCoord, face: Face) -> bool;

    fn attack_entity(&mut self, entity: EntityId);

    fn swing_hand(&mut self, hand: Hand);

    /// Nearest point on `pos` visible from the player's eyes, restricted to
    /// `face` when given.
    fn closest_visible_point(&self, pos: VoxelCoord, face: Option<Face>) -> Option<Vec3>;

    /// The block currently under the crosshair.
    fn crosshair_block(&self) -> Option<VoxelCoord>;

    fn is_using_item(&self) -> bool;

    fn is_breaking_block(&self) -> bool;

    /// Keep mining the block being broken for this tick.
    fn continue_breaking_block(&mut self);
}
