// Point-to-point movement driven by per-tick input.
//
// `move_to(x, z, smart)` walks the player to a horizontal point by looking
// at it and holding forward with input blocked, one tick at a time:
//
// 1. Already within `already_there_radius`: snap and succeed, no ticks.
// 2. Each tick: with smart movement, first inject a one-tick jump impulse
//    if a one-block step is directly ahead (see `step_ahead`); then look at
//    the target at eye height and tick with forward held.
// 3. Every `stuck_check_interval_ticks` ticks the squared distance is
//    compared with the previous sample. No decrease means stuck: fail.
// 4. The loop exits within `arrival_radius`; the player is then snapped to
//    the exact target. A refused snap fails the move.
//
// The forward flag and blocking mode are restored on every exit path.
//
// `snap_to` teleports the player to a point no farther than `snap_radius`
// away and optionally tells the remote peer with a position packet.
//
// See also: `executor.rs`, which calls `move_to_observed` once per path
// node.

use crate::error::ControlError;
use crate::host::{BlockView, GameClient, PlayerSnapshot, SyncPacket};
use crate::look::look_at;
use crate::scheduler::TickScheduler;
use crate::session::ControlSession;
use crate::types::{Aabb, Vec3, VoxelCoord};
use tracing::debug;

/// Teleport to `target` if it is within the snap radius.
pub fn snap_to<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    target: Vec3,
    sync: bool,
) -> Result<bool, ControlError> {
    let player = session.player()?;
    let radius = session.config().snap_radius;
    if player.position.distance_sq(target) > radius * radius {
        return Ok(false);
    }
    let mut client = session.client()?;
    client.set_player_position(target);
    if sync {
        client.send(SyncPacket::Position {
            position: target,
            on_ground: player.on_ground,
        });
    }
    Ok(true)
}

pub fn move_to<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    x: f64,
    z: f64,
    smart: bool,
) -> Result<bool, ControlError> {
    move_to_observed(session, x, z, smart, &mut |_| {})
}

/// `move_to`, calling `after_tick` with a fresh player snapshot after every
/// tick it spends.
pub fn move_to_observed<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    x: f64,
    z: f64,
    smart: bool,
    after_tick: &mut dyn FnMut(&PlayerSnapshot),
) -> Result<bool, ControlError> {
    let player = session.player()?;
    let here = Vec3::new(x, player.position.y, z);
    let already = session.config().already_there_radius;
    if player.position.distance_sq(here) < already * already {
        snap_to(session, here, false)?;
        return Ok(true);
    }

    let saved = *session.input();
    session.input_mut().blocked = true;
    session.input_mut().flags.forward = true;

    let outcome = walk(session, x, z, smart, after_tick);

    let input = session.input_mut();
    input.flags.forward = saved.flags.forward;
    input.blocked = saved.blocked;
    outcome
}

fn walk<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    x: f64,
    z: f64,
    smart: bool,
    after_tick: &mut dyn FnMut(&PlayerSnapshot),
) -> Result<bool, ControlError> {
    let arrival = session.config().arrival_radius;
    let interval = session.config().stuck_check_interval_ticks.max(1);
    let mut last_dist_sq = horizontal_dist_sq(&session.player()?, x, z);
    let mut ticks = 0u32;

    loop {
        if smart && should_jump(session, x, z)? {
            let was_jumping = session.input().flags.jump;
            session.input_mut().flags.jump = true;
            session.tick()?;
            session.input_mut().flags.jump = was_jumping;
            after_tick(&session.player()?);
            debug!(target: "movement", x, z, "jump impulse");
        }

        let player = session.player()?;
        look_at(
            session,
            Vec3::new(x, player.position.y + player.eye_height, z),
        )?;
        session.tick()?;
        let player = session.player()?;
        after_tick(&player);

        ticks += 1;
        let dist_sq = horizontal_dist_sq(&player, x, z);
        if ticks.is_multiple_of(interval) {
            if dist_sq >= last_dist_sq {
                debug!(
                    target: "movement",
                    x, z, ticks, dist_sq, last_dist_sq,
                    "no progress, giving up"
                );
                return Ok(false);
            }
            last_dist_sq = dist_sq;
        }
        if dist_sq <= arrival * arrival {
            break;
        }
    }

    let player = session.player()?;
    let snapped = snap_to(session, Vec3::new(x, player.position.y, z), false)?;
    if !snapped {
        debug!(target: "movement", x, z, "final snap refused");
    }
    Ok(snapped)
}

fn horizontal_dist_sq(player: &PlayerSnapshot, x: f64, z: f64) -> f64 {
    let dx = x - player.position.x;
    let dz = z - player.position.z;
    dx * dx + dz * dz
}

fn should_jump<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    x: f64,
    z: f64,
) -> Result<bool, ControlError> {
    let player = session.player()?;
    let client = session.client()?;
    Ok(step_ahead(client.world(), &player, x, z))
}

/// True when the player is on the ground facing a one-block step toward
/// `(x, z)` that it can jump onto: the voxel one unit ahead at foot level
/// is solid, the two above it are clear, the voxel two above the player is
/// clear, and the step actually matters (the target is more than a unit
/// away, or standing on the target would overlap the step).
pub fn step_ahead(world: &dyn BlockView, player: &PlayerSnapshot, x: f64, z: f64) -> bool {
    if !player.on_ground {
        return false;
    }
    let pos = player.position;
    let (dx, dz) = (x - pos.x, z - pos.z);
    let len = (dx * dx + dz * dz).sqrt();
    if len == 0.0 {
        return false;
    }
    let ahead = VoxelCoord::containing(Vec3::new(pos.x + dx / len, pos.y, pos.z + dz / len));
    if world.is_collision_empty(ahead)
        || !world.is_collision_empty(ahead.up(1))
        || !world.is_collision_empty(ahead.up(2))
    {
        return false;
    }
    if !world.is_collision_empty(player.voxel().up(2)) {
        return false;
    }
    len * len > 1.0
        || player
            .bounding_box()
            .offset(Vec3::new(dx, 0.0, dz))
            .intersects(&Aabb::of_voxel(ahead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::config::ControlConfig;
    use crate::scheduler::LocalScheduler;
    use crate::testing::TestHost;

    fn feet_at(host: &mut TestHost, pos: Vec3) {
        if let Some(p) = host.player.as_mut() {
            p.position = pos;
        }
    }

    #[test]
    fn snap_within_radius_is_exact() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let start = session.player().unwrap().position;
        let target = start + Vec3::new(0.3, 0.0, -0.2);
        assert!(snap_to(&mut session, target, true).unwrap());
        assert_eq!(session.player().unwrap().position, target);
        drop(session);
        assert_eq!(
            scheduler.host().packets,
            vec![SyncPacket::Position {
                position: target,
                on_ground: true
            }]
        );
    }

    #[test]
    fn snap_beyond_radius_is_refused() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let start = session.player().unwrap().position;
        assert!(!snap_to(&mut session, start + Vec3::new(0.6, 0.0, 0.0), false).unwrap());
        assert_eq!(session.player().unwrap().position, start);
    }

    #[test]
    fn already_there_snaps_without_ticking() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let start = session.player().unwrap().position;
        assert!(move_to(&mut session, start.x + 0.05, start.z, true).unwrap());
        assert_eq!(session.current_tick(), 0);
        assert_eq!(session.player().unwrap().position.x, start.x + 0.05);
    }

    #[test]
    fn walks_to_target_and_snaps_exactly() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let start = session.player().unwrap().position;
        let (x, z) = (start.x + 3.0, start.z - 2.0);
        assert!(move_to(&mut session, x, z, true).unwrap());
        let end = session.player().unwrap().position;
        assert_eq!((end.x, end.z), (x, z));
        assert!(session.current_tick() > 0);
    }

    #[test]
    fn restores_forward_and_blocking() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let start = session.player().unwrap().position;
        move_to(&mut session, start.x + 2.0, start.z, false).unwrap();
        assert!(!session.input().flags.forward);
        assert!(!session.is_blocking());
    }

    #[test]
    fn holds_forward_blocked_while_moving() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        {
            let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
            let start = session.player().unwrap().position;
            move_to(&mut session, start.x + 2.0, start.z, false).unwrap();
        }
        let seen = &scheduler.host().inputs;
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|i| i.blocked && i.flags.forward));
    }

    #[test]
    fn stuck_after_one_interval_without_progress() {
        let mut host = TestHost::flat(8);
        host.speed = 0.0;
        let mut scheduler = LocalScheduler::new(host);
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let start = session.player().unwrap().position;
        assert!(!move_to(&mut session, start.x + 5.0, start.z, false).unwrap());
        assert_eq!(session.current_tick(), 20);
        assert!(!session.input().flags.forward);
    }

    #[test]
    fn step_ahead_detects_single_block_step() {
        let mut host = TestHost::flat(8);
        feet_at(&mut host, Vec3::new(0.5, 1.0, 0.5));
        host.blocks.insert(VoxelCoord::new(1, 1, 0), BlockKind::Solid);
        let player = host.player.unwrap();
        assert!(step_ahead(&host, &player, 3.5, 0.5));
    }

    #[test]
    fn step_ahead_ignores_two_block_wall() {
        let mut host = TestHost::flat(8);
        feet_at(&mut host, Vec3::new(0.5, 1.0, 0.5));
        host.blocks.insert(VoxelCoord::new(1, 1, 0), BlockKind::Solid);
        host.blocks.insert(VoxelCoord::new(1, 2, 0), BlockKind::Solid);
        let player = host.player.unwrap();
        assert!(!step_ahead(&host, &player, 3.5, 0.5));
    }

    #[test]
    fn step_ahead_requires_ground_contact() {
        let mut host = TestHost::flat(8);
        feet_at(&mut host, Vec3::new(0.5, 1.0, 0.5));
        host.blocks.insert(VoxelCoord::new(1, 1, 0), BlockKind::Solid);
        let mut player = host.player.unwrap();
        player.on_ground = false;
        assert!(!step_ahead(&host, &player, 3.5, 0.5));
    }

    #[test]
    fn step_ahead_skips_when_target_is_short_of_step() {
        let mut host = TestHost::flat(8);
        feet_at(&mut host, Vec3::new(0.5, 1.0, 0.5));
        host.blocks.insert(VoxelCoord::new(1, 1, 0), BlockKind::Solid);
        let player = host.player.unwrap();
        // Target 0.2 ahead: box moved there (x 0.4..1.0) does not reach x = 1.
        assert!(!step_ahead(&host, &player, 0.7, 0.5));
    }
}
