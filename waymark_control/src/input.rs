// Per-tick movement intent.
//
// `MovementFlags` is the plain set of held keys. `InputState` is the
// script's intent: its own flags plus the `blocked` mode toggle. The host
// reads one `InputState` per tick (handed over by `advance_one_tick`) and
// combines it with real device input via `effective()`:
//
// - blocked:   script flags only; device input is ignored for the tick.
// - unblocked: script flags OR device flags.
//
// All fields are plain booleans, so there are no illegal states to
// validate. Mutations become visible to the simulation only at the next
// tick boundary.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// The movement keys held during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFlags {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sneak: bool,
    pub sprint: bool,
}

impl MovementFlags {
    pub const NONE: Self = Self {
        forward: false,
        back: false,
        left: false,
        right: false,
        jump: false,
        sneak: false,
        sprint: false,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NONE
    }
}

impl BitOr for MovementFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            forward: self.forward || rhs.forward,
            back: self.back || rhs.back,
            left: self.left || rhs.left,
            right: self.right || rhs.right,
            jump: self.jump || rhs.jump,
            sneak: self.sneak || rhs.sneak,
            sprint: self.sprint || rhs.sprint,
        }
    }
}

/// A script's movement intent for the upcoming tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub flags: MovementFlags,
    /// When set, the tick uses script flags instead of device input.
    pub blocked: bool,
}

impl InputState {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::neutral();
    }

    /// The flags the simulation should apply this tick given what the real
    /// devices are asserting.
    pub fn effective(&self, device: MovementFlags) -> MovementFlags {
        if self.blocked {
            self.flags
        } else {
            self.flags | device
        }
    }
}
