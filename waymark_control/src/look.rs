// Player rotation: look-at and rotation sync.
//
// Yaw and pitch are in degrees. Yaw 0 faces +z and grows clockwise seen
// from above (yaw -90 faces +x); pitch is positive looking down. Rotation
// changes are local until `sync_rotation` sends a look packet.

use crate::error::ControlError;
use crate::host::{GameClient, SyncPacket};
use crate::scheduler::TickScheduler;
use crate::session::ControlSession;
use crate::types::{EntityId, Vec3};

/// Yaw and pitch that point from `eye` at `target`.
pub fn angles_to(eye: Vec3, target: Vec3) -> (f32, f32) {
    let d = target - eye;
    let horizontal = d.horizontal_length();
    let yaw = d.z.atan2(d.x).to_degrees() - 90.0;
    let pitch = -d.y.atan2(horizontal).to_degrees();
    (yaw as f32, pitch as f32)
}

/// Horizontal unit vector the player walks along for a given yaw.
pub fn forward_vector(yaw: f32) -> Vec3 {
    let rad = f64::from(yaw).to_radians();
    Vec3::new(-rad.sin(), 0.0, rad.cos())
}

pub fn look_at<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    target: Vec3,
) -> Result<(), ControlError> {
    let player = session.player()?;
    let (yaw, pitch) = angles_to(player.eye_position(), target);
    session.client()?.set_player_rotation(yaw, pitch);
    Ok(())
}

/// Look at an entity: eye to eye for living entities, at its feet otherwise.
pub fn look_at_entity<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    id: EntityId,
) -> Result<(), ControlError> {
    let entity = session
        .client()?
        .entity(id)
        .ok_or(ControlError::MissingEntity(id))?;
    let target = entity.position + Vec3::new(0.0, entity.eye_height.unwrap_or(0.0), 0.0);
    look_at(session, target)
}

pub fn set_yaw<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    yaw: f32,
) -> Result<(), ControlError> {
    let player = session.player()?;
    session.client()?.set_player_rotation(yaw, player.pitch);
    Ok(())
}

pub fn set_pitch<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    pitch: f32,
) -> Result<(), ControlError> {
    let player = session.player()?;
    session.client()?.set_player_rotation(player.yaw, pitch);
    Ok(())
}

/// Tell the remote peer about the current rotation.
pub fn sync_rotation<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
) -> Result<(), ControlError> {
    let player = session.player()?;
    session.client()?.send(SyncPacket::Look {
        yaw: player.yaw,
        pitch: player.pitch,
        on_ground: player.on_ground,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::host::EntitySnapshot;
    use crate::scheduler::LocalScheduler;
    use crate::testing::TestHost;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn cardinal_yaws() {
        let eye = Vec3::ZERO;
        assert!(approx(angles_to(eye, Vec3::new(0.0, 0.0, 1.0)).0, 0.0));
        assert!(approx(angles_to(eye, Vec3::new(1.0, 0.0, 0.0)).0, -90.0));
        assert!(approx(angles_to(eye, Vec3::new(-1.0, 0.0, 0.0)).0, 90.0));
    }

    #[test]
    fn pitch_is_positive_looking_down() {
        let (_, pitch) = angles_to(Vec3::ZERO, Vec3::new(1.0, -1.0, 0.0));
        assert!(approx(pitch, 45.0));
    }

    #[test]
    fn forward_vector_matches_look_direction() {
        for target in [
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ] {
            let (yaw, _) = angles_to(Vec3::ZERO, target);
            let f = forward_vector(yaw);
            let len = target.horizontal_length();
            assert!((f.x - target.x / len).abs() < 1e-4);
            assert!((f.z - target.z / len).abs() < 1e-4);
        }
    }

    #[test]
    fn look_at_sets_rotation_from_eye() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let eye = session.player().unwrap().eye_position();
        look_at(&mut session, eye + Vec3::new(0.0, 0.0, 5.0)).unwrap();
        let player = session.player().unwrap();
        assert!(approx(player.yaw, 0.0));
        assert!(approx(player.pitch, 0.0));
    }

    #[test]
    fn look_at_entity_uses_eye_height_for_living() {
        let mut host = TestHost::flat(8);
        let feet = host.player.unwrap().position;
        host.entities.push(EntitySnapshot {
            id: EntityId(7),
            position: feet + Vec3::new(4.0, 0.0, 0.0),
            eye_height: host.player.map(|p| p.eye_height),
        });
        let mut scheduler = LocalScheduler::new(host);
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        look_at_entity(&mut session, EntityId(7)).unwrap();
        let player = session.player().unwrap();
        assert!(approx(player.pitch, 0.0));
        assert!(approx(player.yaw, -90.0));
    }

    #[test]
    fn look_at_missing_entity_fails() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let err = look_at_entity(&mut session, EntityId(99)).unwrap_err();
        assert!(matches!(err, ControlError::MissingEntity(EntityId(99))));
    }

    #[test]
    fn sync_rotation_sends_look_packet() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(8));
        {
            let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
            set_yaw(&mut session, 45.0).unwrap();
            set_pitch(&mut session, -10.0).unwrap();
            sync_rotation(&mut session).unwrap();
        }
        assert_eq!(
            scheduler.host().packets,
            vec![SyncPacket::Look {
                yaw: 45.0,
                pitch: -10.0,
                on_ground: true
            }]
        );
    }
}
