// Traversal types and their default classification.
//
// A `NodeType` says how an entity standing with its feet in a voxel would
// fare there: walkable floor, open air (would fall), blocked, or one of the
// hazard/obstacle classes. Every type has a default penalty; a negative
// penalty means the type is impassable. Script hints may override both the
// classification of any voxel and the penalty of any type (see `hints.rs`).
//
// Type names are the lowercase snake_case spelling (`"danger_fire"`) and
// parse case-insensitively. An unknown name is a caller contract violation,
// never silently mapped to a default.
//
// `classify_default` is the engine-side classifier used whenever a hint does
// not classify a voxel. It looks at the voxel itself, the one below it
// (support), and the horizontal ring around it (nearby hazards).

use crate::block::BlockKind;
use crate::error::ControlError;
use crate::host::BlockView;
use crate::types::VoxelCoord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Traversal classification of a voxel for ground navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Blocked,
    Open,
    Walkable,
    Climbable,
    Fence,
    Lava,
    Water,
    WaterBorder,
    Rail,
    DangerFire,
    DamageFire,
    DangerCactus,
    DamageCactus,
    DangerOther,
    DamageOther,
    DoorOpen,
    DoorClosed,
    Leaves,
    StickyHoney,
}

impl NodeType {
    pub const ALL: [NodeType; 19] = [
        NodeType::Blocked,
        NodeType::Open,
        NodeType::Walkable,
        NodeType::Climbable,
        NodeType::Fence,
        NodeType::Lava,
        NodeType::Water,
        NodeType::WaterBorder,
        NodeType::Rail,
        NodeType::DangerFire,
        NodeType::DamageFire,
        NodeType::DangerCactus,
        NodeType::DamageCactus,
        NodeType::DangerOther,
        NodeType::DamageOther,
        NodeType::DoorOpen,
        NodeType::DoorClosed,
        NodeType::Leaves,
        NodeType::StickyHoney,
    ];

    /// The penalty used when no hint overrides it. Negative = impassable.
    pub fn default_penalty(self) -> f32 {
        match self {
            NodeType::Blocked
            | NodeType::Fence
            | NodeType::Lava
            | NodeType::DamageCactus
            | NodeType::DamageOther
            | NodeType::DoorClosed
            | NodeType::Leaves => -1.0,
            NodeType::Open
            | NodeType::Walkable
            | NodeType::Climbable
            | NodeType::Rail
            | NodeType::DoorOpen => 0.0,
            NodeType::Water
            | NodeType::WaterBorder
            | NodeType::DangerFire
            | NodeType::DangerCactus
            | NodeType::DangerOther
            | NodeType::StickyHoney => 8.0,
            NodeType::DamageFire => 16.0,
        }
    }

    /// Whether an entity can stand here as a path node at all (independent
    /// of penalty). Blocked voxels are solid; open voxels have no support.
    pub fn is_standable(self) -> bool {
        !matches!(self, NodeType::Blocked | NodeType::Open)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeType::Blocked => "blocked",
            NodeType::Open => "open",
            NodeType::Walkable => "walkable",
            NodeType::Climbable => "climbable",
            NodeType::Fence => "fence",
            NodeType::Lava => "lava",
            NodeType::Water => "water",
            NodeType::WaterBorder => "water_border",
            NodeType::Rail => "rail",
            NodeType::DangerFire => "danger_fire",
            NodeType::DamageFire => "damage_fire",
            NodeType::DangerCactus => "danger_cactus",
            NodeType::DamageCactus => "damage_cactus",
            NodeType::DangerOther => "danger_other",
            NodeType::DamageOther => "damage_other",
            NodeType::DoorOpen => "door_open",
            NodeType::DoorClosed => "door_closed",
            NodeType::Leaves => "leaves",
            NodeType::StickyHoney => "sticky_honey",
        }
    }

    /// Parse a type name case-insensitively.
    pub fn from_name(name: &str) -> Result<Self, ControlError> {
        let lower = name.to_ascii_lowercase();
        NodeType::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| ControlError::UnknownNodeType(name.to_string()))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a voxel for an entity whose feet would occupy it.
pub fn classify_default(view: &dyn BlockView, pos: VoxelCoord) -> NodeType {
    let here = view.block_at(pos);
    match here {
        BlockKind::Solid | BlockKind::Honey => return NodeType::Blocked,
        BlockKind::Fence => return NodeType::Fence,
        BlockKind::ClosedDoor => return NodeType::DoorClosed,
        BlockKind::Leaves => return NodeType::Leaves,
        BlockKind::Cactus => return NodeType::DamageCactus,
        BlockKind::Lava => return NodeType::Lava,
        BlockKind::Fire => return NodeType::DamageFire,
        BlockKind::Water => return NodeType::Water,
        BlockKind::Ladder => return NodeType::Climbable,
        BlockKind::OpenDoor => return NodeType::DoorOpen,
        BlockKind::Rail => return NodeType::Rail,
        BlockKind::Air => {}
    }

    let below = view.block_at(pos.down(1));
    let base = match below {
        BlockKind::Air | BlockKind::Water | BlockKind::Lava | BlockKind::Fire | BlockKind::Rail => {
            return NodeType::Open;
        }
        BlockKind::Ladder => NodeType::Climbable,
        BlockKind::Fence => return NodeType::Blocked,
        BlockKind::Cactus => return NodeType::DamageCactus,
        BlockKind::Honey => NodeType::StickyHoney,
        BlockKind::Solid
        | BlockKind::Leaves
        | BlockKind::OpenDoor
        | BlockKind::ClosedDoor => NodeType::Walkable,
    };
    if base != NodeType::Walkable {
        return base;
    }

    // A walkable voxel next to a hazard is downgraded to its danger class.
    let mut near_water = false;
    for dx in -1..=1 {
        for dz in -1..=1 {
            if dx == 0 && dz == 0 {
                continue;
            }
            match view.block_at(pos.offset(dx, 0, dz)) {
                BlockKind::Fire | BlockKind::Lava => return NodeType::DangerFire,
                BlockKind::Cactus => return NodeType::DangerCactus,
                BlockKind::Water => near_water = true,
                _ => {}
            }
        }
    }
    if near_water {
        NodeType::WaterBorder
    } else {
        NodeType::Walkable
    }
}
