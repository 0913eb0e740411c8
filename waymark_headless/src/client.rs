// Headless reference game client.
//
// `HeadlessClient` is the single source of truth for a tiny voxel game that
// scripts can drive without a real client: it owns the world, the player
// body, a handful of other entities, a 36-slot inventory plus off hand, and
// a toy interaction model. It implements every collaborator trait the
// control layer consumes (`GameClient`, `BlockView` through the world,
// `InventoryAccess`, `InteractionAccess`) and `HostTick` for stepping.
//
// ## Tick
//
// `step(script)` advances exactly one tick:
//
//   1. Combine the script's intent with device input (`InputState::effective`).
//   2. Turn the held keys and the player's yaw into a wish vector and run
//      `physics::step_body`. Jumps that actually happen are counted in
//      `jump_impulses`.
//   3. Move other entities by their per-tick velocity.
//   4. Advance item use and block breaking. Breaking only progresses on
//      ticks where `continue_breaking_block` was called; a tick without it
//      cancels the break.
//
// ## Toy items
//
// - `block:<kind>` (e.g. `block:solid`, `block:ladder`) places that block
//   against the clicked face and consumes one item.
// - `food:<anything>` can be used; use lasts `use_ticks`.
// - Anything else passes on every interaction except entity clicks.
//
// Every world write goes through `set_block`, which notifies the mutation
// registry so running path executors see the edit.
//
// See also: `physics.rs`, `world.rs`, `config.rs`.

use crate::config::HostConfig;
use crate::error::HostError;
use crate::physics::{Body, Wish, step_body};
use crate::world::{VoxelWorld, face_center, neighbor};
use std::collections::BTreeMap;
use tracing::{debug, trace};
use waymark_control::block::BlockKind;
use waymark_control::host::{
    BlockHit, BlockView, EntitySnapshot, GameClient, HostTick, InteractionAccess,
    InteractionResult, InventoryAccess, PlayerSnapshot, SyncPacket,
};
use waymark_control::input::{InputState, MovementFlags};
use waymark_control::inventory::ItemStack;
use waymark_control::look::forward_vector;
use waymark_control::mutation::{MutationEvent, MutationRegistry};
use waymark_control::types::{Aabb, EntityId, Face, Hand, Vec3, VoxelCoord};

pub const MAIN_INVENTORY_SLOTS: usize = 36;

/// A non-player entity drifting at a fixed velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Creature {
    pub position: Vec3,
    pub velocity: Vec3,
    pub eye_height: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Breaking {
    pos: VoxelCoord,
    remaining: u32,
    continued: bool,
}

/// The block a `block:<kind>` item places.
pub fn placeable_block(item: &str) -> Option<BlockKind> {
    let kind = item.strip_prefix("block:")?;
    match kind {
        "solid" => Some(BlockKind::Solid),
        "ladder" => Some(BlockKind::Ladder),
        "leaves" => Some(BlockKind::Leaves),
        "fence" => Some(BlockKind::Fence),
        "honey" => Some(BlockKind::Honey),
        "rail" => Some(BlockKind::Rail),
        "door" => Some(BlockKind::ClosedDoor),
        _ => None,
    }
}

fn is_usable(item: &str) -> bool {
    item.starts_with("food:")
}

pub struct HeadlessClient {
    pub config: HostConfig,
    world: VoxelWorld,
    registry: MutationRegistry,
    body: Option<Body>,
    yaw: f32,
    pitch: f32,
    creatures: BTreeMap<EntityId, Creature>,
    next_entity: u32,
    tick: u64,

    /// Flags the simulated devices assert every tick.
    pub device: MovementFlags,
    /// Intent of the last tick, `None` when no script drove it.
    pub last_input: Option<InputState>,
    pub packets: Vec<SyncPacket>,
    pub jump_impulses: u32,
    pub swings: Vec<Hand>,
    pub attacked: Vec<EntityId>,

    slots: Vec<ItemStack>,
    off_hand: ItemStack,
    selected: usize,
    container: Option<u32>,
    using_ticks: u32,
    breaking: Option<Breaking>,
}

impl HeadlessClient {
    /// An empty world of `config.world_size` with no player.
    pub fn new(config: HostConfig) -> Self {
        let [sx, sy, sz] = config.world_size;
        Self {
            world: VoxelWorld::new(sx, sy, sz),
            config,
            registry: MutationRegistry::new(),
            body: None,
            yaw: 0.0,
            pitch: 0.0,
            creatures: BTreeMap::new(),
            next_entity: 1,
            tick: 0,
            device: MovementFlags::NONE,
            last_input: None,
            packets: Vec::new(),
            jump_impulses: 0,
            swings: Vec::new(),
            attacked: Vec::new(),
            slots: vec![ItemStack::empty(); MAIN_INVENTORY_SLOTS],
            off_hand: ItemStack::empty(),
            selected: 0,
            container: None,
            using_ticks: 0,
            breaking: None,
        }
    }

    /// A world with a solid floor layer at y = 0 and the player standing on
    /// it at the center.
    pub fn flat(config: HostConfig) -> Result<Self, HostError> {
        let [sx, _, sz] = config.world_size;
        let mut client = Self::new(config);
        let max = VoxelCoord::new(sx as i32 - 1, 0, sz as i32 - 1);
        client
            .world
            .fill(VoxelCoord::new(0, 0, 0), max, BlockKind::Solid);
        let center = VoxelCoord::new(sx as i32 / 2, 1, sz as i32 / 2);
        client.spawn_player(center)?;
        Ok(client)
    }

    /// Place the player standing at the bottom center of `voxel`.
    pub fn spawn_player(&mut self, voxel: VoxelCoord) -> Result<(), HostError> {
        if !self.world.in_bounds(voxel) {
            return Err(HostError::SpawnOutOfBounds(voxel));
        }
        let feet = Vec3::new(
            f64::from(voxel.x) + 0.5,
            f64::from(voxel.y),
            f64::from(voxel.z) + 0.5,
        );
        let mut body = Body::new(feet, self.config.player_width, self.config.player_height);
        body.on_ground = !self.world.get(voxel.down(1)).is_collision_empty();
        self.body = Some(body);
        debug!(target: "host", %voxel, "player spawned");
        Ok(())
    }

    pub fn remove_player(&mut self) {
        self.body = None;
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.body.map(|b| b.position)
    }

    pub fn voxels(&self) -> &VoxelWorld {
        &self.world
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Write a block and tell mutation observers about it. Returns whether
    /// anything changed.
    pub fn set_block(&mut self, pos: VoxelCoord, kind: BlockKind) -> bool {
        match self.world.set(pos, kind) {
            Some(old) if old != kind => {
                trace!(target: "host", %pos, ?old, new = ?kind, "block changed");
                self.registry.notify(&MutationEvent { pos, old, new: kind });
                true
            }
            _ => false,
        }
    }

    /// Fill a box without notifying observers. For building worlds before
    /// any script runs.
    pub fn fill(&mut self, a: VoxelCoord, b: VoxelCoord, kind: BlockKind) {
        self.world.fill(a, b, kind);
    }

    pub fn spawn_entity(&mut self, position: Vec3, eye_height: Option<f64>) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.creatures.insert(
            id,
            Creature {
                position,
                velocity: Vec3::ZERO,
                eye_height,
            },
        );
        id
    }

    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn despawn_entity(&mut self, id: EntityId) -> bool {
        self.creatures.remove(&id).is_some()
    }

    pub fn set_slot(&mut self, slot: usize, stack: ItemStack) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = stack;
        }
    }

    pub fn slot(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot)
    }

    pub fn set_off_hand(&mut self, stack: ItemStack) {
        self.off_hand = stack;
    }

    pub fn set_open_container(&mut self, id: Option<u32>) {
        self.container = id;
    }

    fn held_mut(&mut self, hand: Hand) -> &mut ItemStack {
        match hand {
            Hand::Main => &mut self.slots[self.selected],
            Hand::Off => &mut self.off_hand,
        }
    }

    fn eye(&self) -> Option<Vec3> {
        self.body
            .map(|b| b.position + Vec3::new(0.0, self.config.eye_height, 0.0))
    }

    fn look_direction(&self) -> Vec3 {
        let (yaw, pitch) = (f64::from(self.yaw).to_radians(), f64::from(self.pitch).to_radians());
        Vec3::new(
            -yaw.sin() * pitch.cos(),
            -pitch.sin(),
            yaw.cos() * pitch.cos(),
        )
    }

    fn wish(&self, flags: MovementFlags) -> Wish {
        let forward = forward_vector(self.yaw);
        let left = Vec3::new(forward.z, 0.0, -forward.x);
        let f = f64::from(i8::from(flags.forward) - i8::from(flags.back));
        let s = f64::from(i8::from(flags.left) - i8::from(flags.right));
        let mut direction = forward * f + left * s;
        let len = direction.horizontal_length();
        if len > 1.0 {
            direction = direction * (1.0 / len);
        }
        Wish {
            direction,
            jump: flags.jump,
            sprint: flags.sprint,
            sneak: flags.sneak,
        }
    }

    fn advance_breaking(&mut self) {
        let Some(mut breaking) = self.breaking.take() else {
            return;
        };
        if !breaking.continued {
            debug!(target: "host", pos = %breaking.pos, "breaking abandoned");
            return;
        }
        breaking.remaining = breaking.remaining.saturating_sub(1);
        if breaking.remaining == 0 {
            debug!(target: "host", pos = %breaking.pos, "block broken");
            self.set_block(breaking.pos, BlockKind::Air);
        } else {
            breaking.continued = false;
            self.breaking = Some(breaking);
        }
    }
}

impl HostTick for HeadlessClient {
    fn step(&mut self, script: Option<&InputState>) {
        self.tick += 1;
        self.last_input = script.copied();
        let flags = script.map_or(self.device, |i| i.effective(self.device));
        let wish = self.wish(flags);

        if let Some(mut body) = self.body {
            let outcome = step_body(&self.world, &mut body, wish, &self.config);
            if outcome.jumped {
                self.jump_impulses += 1;
                trace!(target: "host", tick = self.tick, "jump");
            }
            self.body = Some(body);
        }

        for creature in self.creatures.values_mut() {
            creature.position = creature.position + creature.velocity;
        }

        self.using_ticks = self.using_ticks.saturating_sub(1);
        self.advance_breaking();
    }
}

impl InventoryAccess for HeadlessClient {
    fn main_slots(&self) -> &[ItemStack] {
        &self.slots
    }

    fn selected_slot(&self) -> usize {
        self.selected
    }

    fn set_selected_slot(&mut self, slot: usize) {
        if slot < self.slots.len() {
            self.selected = slot;
        }
    }

    fn pick_from_inventory(&mut self, slot: usize) {
        if slot < self.slots.len() {
            self.slots.swap(slot, self.selected);
        }
    }

    fn open_container(&self) -> Option<u32> {
        self.container
    }

    fn close_container(&mut self) {
        self.container = None;
    }
}

impl InteractionAccess for HeadlessClient {
    fn interact_item(&mut self, hand: Hand) -> InteractionResult {
        let held = self.held_mut(hand);
        if held.is_empty() || !is_usable(&held.item) {
            return InteractionResult::Pass;
        }
        self.using_ticks = self.config.use_ticks;
        InteractionResult::Success
    }

    fn interact_block(&mut self, hand: Hand, hit: BlockHit) -> InteractionResult {
        let Some(kind) = placeable_block(&self.held_mut(hand).item) else {
            return InteractionResult::Pass;
        };
        let target = neighbor(hit.block, hit.face);
        let occupied = !self.world.in_bounds(target)
            || !self.world.get(target).is_collision_empty()
            || self.body.is_some_and(|b| {
                !kind.is_collision_empty() && b.bounding_box().intersects(&Aabb::of_voxel(target))
            });
        if occupied {
            return InteractionResult::Fail;
        }
        self.set_block(target, kind);
        let held = self.held_mut(hand);
        held.count = held.count.saturating_sub(1);
        if held.count == 0 {
            *held = ItemStack::empty();
        }
        InteractionResult::Success
    }

    fn interact_entity(&mut self, hand: Hand, entity: EntityId) -> InteractionResult {
        if !self.creatures.contains_key(&entity) || self.held_mut(hand).is_empty() {
            return InteractionResult::Pass;
        }
        InteractionResult::Success
    }

    fn attack_block(&mut self, pos: VoxelCoord, _face: Face) -> bool {
        if self.world.get(pos).is_collision_empty() {
            return false;
        }
        self.breaking = Some(Breaking {
            pos,
            remaining: self.config.break_ticks.max(1),
            continued: false,
        });
        true
    }

    fn attack_entity(&mut self, entity: EntityId) {
        self.attacked.push(entity);
    }

    fn swing_hand(&mut self, hand: Hand) {
        self.swings.push(hand);
    }

    fn closest_visible_point(&self, pos: VoxelCoord, face: Option<Face>) -> Option<Vec3> {
        let eye = self.eye()?;
        if self.world.get(pos).is_collision_empty() {
            return None;
        }
        let faces = match face {
            Some(f) => vec![f],
            None => vec![
                Face::Down,
                Face::Up,
                Face::North,
                Face::South,
                Face::West,
                Face::East,
            ],
        };
        faces
            .into_iter()
            .filter(|&f| self.world.get(neighbor(pos, f)).is_collision_empty())
            .map(|f| face_center(pos, f))
            .filter(|&point| self.world.is_visible(eye, pos, point))
            .min_by(|a, b| a.distance_sq(eye).total_cmp(&b.distance_sq(eye)))
    }

    fn crosshair_block(&self) -> Option<VoxelCoord> {
        let eye = self.eye()?;
        let end = eye + self.look_direction() * self.config.block_reach;
        self.world.raycast_first_hit(eye, end).map(|hit| hit.voxel)
    }

    fn is_using_item(&self) -> bool {
        self.using_ticks > 0
    }

    fn is_breaking_block(&self) -> bool {
        self.breaking.is_some()
    }

    fn continue_breaking_block(&mut self) {
        if let Some(b) = self.breaking.as_mut() {
            b.continued = true;
        }
    }
}

impl GameClient for HeadlessClient {
    fn world(&self) -> &dyn BlockView {
        &self.world
    }

    fn mutations(&self) -> &MutationRegistry {
        &self.registry
    }

    fn player(&self) -> Option<PlayerSnapshot> {
        self.body.map(|b| PlayerSnapshot {
            position: b.position,
            eye_height: self.config.eye_height,
            width: b.width,
            height: b.height,
            on_ground: b.on_ground,
            yaw: self.yaw,
            pitch: self.pitch,
        })
    }

    fn set_player_position(&mut self, position: Vec3) {
        if let Some(body) = self.body.as_mut() {
            body.position = position;
        }
    }

    fn set_player_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-90.0, 90.0);
    }

    fn device_input(&self) -> MovementFlags {
        self.device
    }

    fn send(&mut self, packet: SyncPacket) {
        self.packets.push(packet);
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.creatures.get(&id).map(|c| EntitySnapshot {
            id,
            position: c.position,
            eye_height: c.eye_height,
        })
    }

    fn inventory(&mut self) -> &mut dyn InventoryAccess {
        self
    }

    fn interaction(&mut self) -> &mut dyn InteractionAccess {
        self
    }
}
