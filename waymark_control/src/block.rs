// Host block classification as seen by the control layer.
//
// The host world exposes one `BlockKind` per voxel. This is deliberately a
// coarse classification: enough to answer "can an entity pass through
// this?" and to derive a default traversal type (see `node_type.rs`), not a
// full block registry.

use serde::{Deserialize, Serialize};

/// The material class of a single voxel in the host world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Air,
    Solid,
    Water,
    Lava,
    Fire,
    Cactus,
    Ladder,
    Leaves,
    Fence,
    OpenDoor,
    ClosedDoor,
    Honey,
    Rail,
}

impl BlockKind {
    /// True when the block has no collision shape: an entity box may overlap it.
    pub fn is_collision_empty(self) -> bool {
        matches!(
            self,
            BlockKind::Air
                | BlockKind::Water
                | BlockKind::Lava
                | BlockKind::Fire
                | BlockKind::Ladder
                | BlockKind::OpenDoor
                | BlockKind::Rail
        )
    }

    pub fn is_liquid(self) -> bool {
        matches!(self, BlockKind::Water | BlockKind::Lava)
    }

    /// Lowercase name handed to script callbacks.
    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Air => "air",
            BlockKind::Solid => "solid",
            BlockKind::Water => "water",
            BlockKind::Lava => "lava",
            BlockKind::Fire => "fire",
            BlockKind::Cactus => "cactus",
            BlockKind::Ladder => "ladder",
            BlockKind::Leaves => "leaves",
            BlockKind::Fence => "fence",
            BlockKind::OpenDoor => "open_door",
            BlockKind::ClosedDoor => "closed_door",
            BlockKind::Honey => "honey",
            BlockKind::Rail => "rail",
        }
    }
}
