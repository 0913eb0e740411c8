// Script-facing player object.
//
// `ScriptPlayer` owns one `ControlSession` and exposes every control
// operation as a method, taking script-shaped arguments (plain numbers,
// `ScriptValue` hint objects and selectors) and converting them before
// delegating to the feature modules. It holds no state of its own beyond
// the session, so dropping it releases the input exactly like dropping the
// session.
//
// `spawn_script` starts a script closure on its own thread against a shared
// client, returning the `ScriptThread` the host drives once per tick.
//
// See also: `session.rs`, `executor.rs`, `movement.rs`, `look.rs`,
// `inventory.rs`, `interact.rs`.

use crate::config::ControlConfig;
use crate::error::ControlError;
use crate::executor::{self, EntityTarget, ScriptTarget, StaticTarget, TargetResolver};
use crate::hints::TraversalHints;
use crate::host::GameClient;
use crate::input::MovementFlags;
use crate::interact;
use crate::inventory::{self, ItemSelector};
use crate::look;
use crate::movement;
use crate::scheduler::{ScriptThread, ThreadedScheduler, TickScheduler};
use crate::script::{ScriptValue, hints_from_script};
use crate::session::ControlSession;
use crate::types::{EntityId, Vec3, VoxelCoord};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Generates `set_pressing_*` / `is_pressing_*` pairs for one movement flag.
macro_rules! pressing_accessors {
    ($($flag:ident => $set:ident, $is:ident;)*) => {
        $(
            pub fn $set(&mut self, pressed: bool) {
                self.session.input_mut().flags.$flag = pressed;
            }

            /// Held by the script, or by the real device while input is
            /// not blocked.
            pub fn $is(&mut self) -> Result<bool, ControlError> {
                Ok(self.effective_flags()?.$flag)
            }
        )*
    };
}

pub struct ScriptPlayer<'a, S: TickScheduler> {
    session: ControlSession<'a, S>,
}

impl<'a, S: TickScheduler> ScriptPlayer<'a, S> {
    pub fn new(scheduler: &'a mut S, config: ControlConfig) -> Self {
        Self {
            session: ControlSession::new(scheduler, config),
        }
    }

    pub fn session(&self) -> &ControlSession<'a, S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ControlSession<'a, S> {
        &mut self.session
    }

    /// Wait out one host tick with the current input.
    pub fn tick(&mut self) -> Result<(), ControlError> {
        self.session.tick()
    }

    pub fn position(&mut self) -> Result<Vec3, ControlError> {
        Ok(self.session.player()?.position)
    }

    // Movement.

    pub fn snap_to(&mut self, x: f64, y: f64, z: f64, sync: bool) -> Result<bool, ControlError> {
        movement::snap_to(&mut self.session, Vec3::new(x, y, z), sync)
    }

    pub fn move_to(&mut self, x: f64, z: f64, smart: bool) -> Result<bool, ControlError> {
        movement::move_to(&mut self.session, x, z, smart)
    }

    /// Path to any target resolver with Rust-side hints.
    pub fn path_to<T: TargetResolver>(
        &mut self,
        target: T,
        hints: TraversalHints,
    ) -> Result<bool, ControlError> {
        executor::path_to(&mut self.session, target, hints)
    }

    /// Path to the voxel containing `(x, y, z)`. `hints` is a hint object or
    /// null.
    pub fn path_to_pos(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        hints: &ScriptValue,
    ) -> Result<bool, ControlError> {
        let hints = hints_from_script(hints)?;
        let target = VoxelCoord::containing(Vec3::new(x, y, z));
        let reached = self.path_to(StaticTarget(target), hints)?;
        info!(target: "script", %target, reached, "path_to");
        Ok(reached)
    }

    /// Follow an entity, replanning whenever it changes voxel.
    pub fn path_to_entity(
        &mut self,
        id: EntityId,
        hints: &ScriptValue,
    ) -> Result<bool, ControlError> {
        let hints = hints_from_script(hints)?;
        self.path_to(EntityTarget(id), hints)
    }

    /// Follow whatever `{x, y, z}` the script function `target` returns.
    pub fn path_to_fn(
        &mut self,
        target: &ScriptValue,
        hints: &ScriptValue,
    ) -> Result<bool, ControlError> {
        let target = ScriptTarget::from_script(target)?;
        let hints = hints_from_script(hints)?;
        self.path_to(target, hints)
    }

    // Looking.

    pub fn look_at(&mut self, x: f64, y: f64, z: f64) -> Result<(), ControlError> {
        look::look_at(&mut self.session, Vec3::new(x, y, z))
    }

    pub fn look_at_entity(&mut self, id: EntityId) -> Result<(), ControlError> {
        look::look_at_entity(&mut self.session, id)
    }

    pub fn set_yaw(&mut self, yaw: f32) -> Result<(), ControlError> {
        look::set_yaw(&mut self.session, yaw)
    }

    pub fn set_pitch(&mut self, pitch: f32) -> Result<(), ControlError> {
        look::set_pitch(&mut self.session, pitch)
    }

    pub fn sync_rotation(&mut self) -> Result<(), ControlError> {
        look::sync_rotation(&mut self.session)
    }

    // Inventory.

    pub fn selected_slot(&mut self) -> Result<usize, ControlError> {
        inventory::selected_slot(&mut self.session)
    }

    pub fn set_selected_slot(&mut self, slot: i64) -> Result<(), ControlError> {
        inventory::set_selected_slot(&mut self.session, slot)
    }

    /// `selector` is an item id string, a predicate function, or a partial
    /// JSON pattern object.
    pub fn pick(&mut self, selector: &ScriptValue) -> Result<bool, ControlError> {
        let mut selector = ItemSelector::from_script(selector)?;
        inventory::pick(&mut self.session, &mut selector)
    }

    pub fn open_container(&mut self) -> Result<Option<u32>, ControlError> {
        inventory::open_container(&mut self.session)
    }

    pub fn close_container(&mut self) -> Result<(), ControlError> {
        inventory::close_container(&mut self.session)
    }

    // Interaction.

    pub fn right_click(&mut self) -> Result<bool, ControlError> {
        interact::right_click(&mut self.session)
    }

    pub fn left_click_block(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        side: Option<&str>,
    ) -> Result<bool, ControlError> {
        interact::left_click_block(&mut self.session, VoxelCoord::new(x, y, z), side)
    }

    pub fn right_click_block(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        side: Option<&str>,
    ) -> Result<bool, ControlError> {
        interact::right_click_block(&mut self.session, VoxelCoord::new(x, y, z), side)
    }

    pub fn left_click_entity(&mut self, id: EntityId) -> Result<bool, ControlError> {
        interact::left_click_entity(&mut self.session, id)
    }

    pub fn right_click_entity(&mut self, id: EntityId) -> Result<bool, ControlError> {
        interact::right_click_entity(&mut self.session, id)
    }

    pub fn long_use_item(&mut self) -> Result<bool, ControlError> {
        interact::long_use_item(&mut self.session)
    }

    pub fn long_mine_block(&mut self, x: i32, y: i32, z: i32) -> Result<bool, ControlError> {
        interact::long_mine_block(&mut self.session, VoxelCoord::new(x, y, z))
    }

    // Input.

    /// From now on only the script's flags drive the player.
    pub fn block_input(&mut self) {
        self.session.set_blocking(true);
    }

    pub fn unblock_input(&mut self) {
        self.session.set_blocking(false);
    }

    pub fn is_input_blocked(&self) -> bool {
        self.session.is_blocking()
    }

    fn effective_flags(&mut self) -> Result<MovementFlags, ControlError> {
        let device = self.session.client()?.device_input();
        Ok(self.session.input().effective(device))
    }

    pressing_accessors! {
        forward => set_pressing_forward, is_pressing_forward;
        back => set_pressing_back, is_pressing_back;
        left => set_pressing_left, is_pressing_left;
        right => set_pressing_right, is_pressing_right;
        jump => set_pressing_jump, is_pressing_jump;
        sneak => set_pressing_sneak, is_pressing_sneak;
        sprint => set_pressing_sprint, is_pressing_sprint;
    }
}

/// Run `script` on its own thread against `client`. The script does not
/// start until the host's first `run_until_tick`; its input is released
/// when it returns.
pub fn spawn_script<C, R, F>(
    client: Arc<Mutex<C>>,
    config: ControlConfig,
    script: F,
) -> ScriptThread<R>
where
    C: GameClient + Send + 'static,
    R: Send + 'static,
    F: FnOnce(&mut ScriptPlayer<'_, ThreadedScheduler<C>>) -> Result<R, ControlError>
        + Send
        + 'static,
{
    ScriptThread::spawn(client, move |mut scheduler| {
        let mut player = ScriptPlayer::new(&mut scheduler, config);
        script(&mut player)
    })
}
