// In-crate test host.
//
// `TestHost` is a kinematic stand-in for a game client: a flat floor at
// y = 0, a player that slides along its yaw at a fixed speed while forward
// is held (no collision, no gravity), and scripted inventory/interaction
// results. Physics-accurate scenarios live in `waymark_headless`.

use crate::block::BlockKind;
use crate::host::{
    BlockHit, BlockView, EntitySnapshot, GameClient, HostTick, InteractionAccess,
    InteractionResult, InventoryAccess, PlayerSnapshot, SyncPacket,
};
use crate::input::{InputState, MovementFlags};
use crate::inventory::ItemStack;
use crate::look::forward_vector;
use crate::mutation::{MutationEvent, MutationRegistry};
use crate::types::{EntityId, Face, Hand, Vec3, VoxelCoord};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) struct TestHost {
    pub half: i32,
    pub blocks: BTreeMap<VoxelCoord, BlockKind>,
    pub registry: MutationRegistry,
    pub player: Option<PlayerSnapshot>,
    pub speed: f64,
    pub device: MovementFlags,
    pub last_input: Option<InputState>,
    pub inputs: Vec<InputState>,
    pub packets: Vec<SyncPacket>,
    pub entities: Vec<EntitySnapshot>,

    pub slots: Vec<ItemStack>,
    pub selected: usize,
    pub picked: Vec<usize>,
    pub container: Option<u32>,

    /// Result of interacting with each hand, indexed `[main, off]`.
    pub hand_results: [InteractionResult; 2],
    pub hidden: BTreeSet<VoxelCoord>,
    pub log: Vec<String>,
    pub use_duration: u32,
    pub break_duration: u32,
    using_ticks: u32,
    breaking: Option<VoxelCoord>,
    breaking_ticks: u32,
}

impl TestHost {
    /// Floor spanning `-half..=half` in x and z, player standing at the
    /// center of voxel (0, 1, 0).
    pub fn flat(half: i32) -> Self {
        Self {
            half,
            blocks: BTreeMap::new(),
            registry: MutationRegistry::new(),
            player: Some(PlayerSnapshot {
                position: Vec3::new(0.5, 1.0, 0.5),
                eye_height: 1.62,
                width: 0.6,
                height: 1.8,
                on_ground: true,
                yaw: 0.0,
                pitch: 0.0,
            }),
            speed: 0.3,
            device: MovementFlags::NONE,
            last_input: None,
            inputs: Vec::new(),
            packets: Vec::new(),
            entities: Vec::new(),
            slots: vec![ItemStack::empty(); 36],
            selected: 0,
            picked: Vec::new(),
            container: None,
            hand_results: [InteractionResult::Pass; 2],
            hidden: BTreeSet::new(),
            log: Vec::new(),
            use_duration: 0,
            break_duration: 0,
            using_ticks: 0,
            breaking: None,
            breaking_ticks: 0,
        }
    }

    pub fn set_block(&mut self, pos: VoxelCoord, kind: BlockKind) {
        let old = self.block_at(pos);
        self.blocks.insert(pos, kind);
        self.registry.notify(&MutationEvent { pos, old, new: kind });
    }

    fn hand_index(hand: Hand) -> usize {
        match hand {
            Hand::Main => 0,
            Hand::Off => 1,
        }
    }
}

impl BlockView for TestHost {
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

impl InventoryAccess for TestHost {
    fn main_slots(&self) -> &[ItemStack] {
        &self.slots
    }

    fn selected_slot(&self) -> usize {
        self.selected
    }

    fn set_selected_slot(&mut self, slot: usize) {
        self.selected = slot;
    }

    fn pick_from_inventory(&mut self, slot: usize) {
        self.picked.push(slot);
        self.slots.swap(slot, self.selected);
    }

    fn open_container(&self) -> Option<u32> {
        self.container
    }

    fn close_container(&mut self) {
        self.container = None;
    }
}

impl InteractionAccess for TestHost {
    fn interact_item(&mut self, hand: Hand) -> InteractionResult {
        self.log.push(format!("use {hand:?}"));
        let result = self.hand_results[Self::hand_index(hand)];
        if result == InteractionResult::Success {
            self.using_ticks = self.use_duration;
        }
        result
    }

    fn interact_block(&mut self, hand: Hand, hit: BlockHit) -> InteractionResult {
        self.log
            .push(format!("use {hand:?} on {} {:?}", hit.block, hit.face));
        self.hand_results[Self::hand_index(hand)]
    }

    fn interact_entity(&mut self, hand: Hand, entity: EntityId) -> InteractionResult {
        self.log.push(format!("use {hand:?} on {entity}"));
        self.hand_results[Self::hand_index(hand)]
    }

    fn attack_block(&mut self, pos: VoxelCoord, face: Face) -> bool {
        self.log.push(format!("attack {pos} {face:?}"));
        if self.block_at(pos).is_collision_empty() {
            return false;
        }
        self.breaking = Some(pos);
        self.breaking_ticks = self.break_duration;
        true
    }

    fn attack_entity(&mut self, entity: EntityId) {
        self.log.push(format!("attack {entity}"));
    }

    fn swing_hand(&mut self, hand: Hand) {
        self.log.push(format!("swing {hand:?}"));
    }

    fn closest_visible_point(&self, pos: VoxelCoord, _face: Option<Face>) -> Option<Vec3> {
        (!self.hidden.contains(&pos)).then(|| pos.center())
    }

    fn crosshair_block(&self) -> Option<VoxelCoord> {
        None
    }

    fn is_using_item(&self) -> bool {
        self.using_ticks > 0
    }

    fn is_breaking_block(&self) -> bool {
        self.breaking.is_some()
    }

    fn continue_breaking_block(&mut self) {
        self.log.push("continue".to_string());
    }
}

impl GameClient for TestHost {
    fn world(&self) -> &dyn BlockView {
        self
    }

    fn mutations(&self) -> &MutationRegistry {
        &self.registry
    }

    fn player(&self) -> Option<PlayerSnapshot> {
        self.player
    }

    fn set_player_position(&mut self, position: Vec3) {
        if let Some(p) = self.player.as_mut() {
            p.position = position;
        }
    }

    fn set_player_rotation(&mut self, yaw: f32, pitch: f32) {
        if let Some(p) = self.player.as_mut() {
            p.yaw = yaw;
            p.pitch = pitch;
        }
    }

    fn device_input(&self) -> MovementFlags {
        self.device
    }

    fn send(&mut self, packet: SyncPacket) {
        self.packets.push(packet);
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id).copied()
    }

    fn inventory(&mut self) -> &mut dyn InventoryAccess {
        self
    }

    fn interaction(&mut self) -> &mut dyn InteractionAccess {
        self
    }
}

impl HostTick for TestHost {
    fn step(&mut self, script: Option<&InputState>) {
        if let Some(input) = script {
            self.inputs.push(*input);
        }
        self.last_input = script.copied();
        let flags = script.map_or(self.device, |i| i.effective(self.device));
        if let Some(p) = self.player.as_mut()
            && flags.forward
        {
            p.position = p.position + forward_vector(p.yaw) * self.speed;
        }
        self.using_ticks = self.using_ticks.saturating_sub(1);
        if self.breaking.is_some() {
            if self.breaking_ticks <= 1 {
                if let Some(pos) = self.breaking.take() {
                    self.set_block(pos, BlockKind::Air);
                }
            } else {
                self.breaking_ticks -= 1;
            }
        }
    }
}
