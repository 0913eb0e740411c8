// Click and use bindings.
//
// Every interaction tries the main hand, then the off hand: `Success` ends
// the attempt with true, `Fail` ends it with false, `Pass` moves on to the
// next hand. Block clicks first look at the closest visible point of the
// block; when no side is given, the clicked face is the one the view ray
// hits. Entity clicks require the entity within `entity_reach`.
//
// The long variants hold the action across ticks with input blocked for as
// long as the host reports it active, then restore the blocking mode.

use crate::error::ControlError;
use crate::host::{BlockHit, GameClient, InteractionResult};
use crate::look::{look_at, look_at_entity};
use crate::scheduler::TickScheduler;
use crate::session::ControlSession;
use crate::types::{EntityId, Face, Hand, Vec3, VoxelCoord};
use tracing::debug;

/// Use the held item.
pub fn right_click<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
) -> Result<bool, ControlError> {
    let mut client = session.client()?;
    let interaction = client.interaction();
    for hand in Hand::ALL {
        match interaction.interact_item(hand) {
            InteractionResult::Success => return Ok(true),
            InteractionResult::Fail => return Ok(false),
            InteractionResult::Pass => {}
        }
    }
    Ok(false)
}

/// Look at the visible part of `pos` and pick the face being clicked.
fn aim_at_block<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    pos: VoxelCoord,
    side: Option<&str>,
) -> Result<Option<(Vec3, Face)>, ControlError> {
    let side = side.map(Face::from_name).transpose()?;
    let Some(point) = session
        .client()?
        .interaction()
        .closest_visible_point(pos, side)
    else {
        return Ok(None);
    };
    look_at(session, point)?;
    let eye = session.player()?.eye_position();
    Ok(Some((point, side.unwrap_or_else(|| Face::facing(point - eye)))))
}

/// Start breaking the block at `pos`.
pub fn left_click_block<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    pos: VoxelCoord,
    side: Option<&str>,
) -> Result<bool, ControlError> {
    let Some((_, face)) = aim_at_block(session, pos, side)? else {
        return Ok(false);
    };
    let mut client = session.client()?;
    let interaction = client.interaction();
    interaction.swing_hand(Hand::Main);
    Ok(interaction.attack_block(pos, face))
}

/// Use the held item on the block at `pos`.
pub fn right_click_block<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    pos: VoxelCoord,
    side: Option<&str>,
) -> Result<bool, ControlError> {
    let Some((point, face)) = aim_at_block(session, pos, side)? else {
        return Ok(false);
    };
    let hit = BlockHit {
        point,
        face,
        block: pos,
    };
    let mut client = session.client()?;
    let interaction = client.interaction();
    for hand in Hand::ALL {
        match interaction.interact_block(hand, hit) {
            InteractionResult::Success => {
                interaction.swing_hand(hand);
                return Ok(true);
            }
            InteractionResult::Fail => return Ok(false),
            InteractionResult::Pass => {}
        }
    }
    Ok(false)
}

fn within_reach<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    id: EntityId,
) -> Result<bool, ControlError> {
    let player = session.player()?;
    let entity = session
        .client()?
        .entity(id)
        .ok_or(ControlError::MissingEntity(id))?;
    let reach = session.config().entity_reach;
    Ok(player.position.distance_sq(entity.position) <= reach * reach)
}

/// Attack an entity within reach.
pub fn left_click_entity<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    id: EntityId,
) -> Result<bool, ControlError> {
    if !within_reach(session, id)? {
        return Ok(false);
    }
    look_at_entity(session, id)?;
    let mut client = session.client()?;
    let interaction = client.interaction();
    interaction.swing_hand(Hand::Main);
    interaction.attack_entity(id);
    Ok(true)
}

/// Interact with an entity within reach.
pub fn right_click_entity<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    id: EntityId,
) -> Result<bool, ControlError> {
    if !within_reach(session, id)? {
        return Ok(false);
    }
    for hand in Hand::ALL {
        let result = session.client()?.interaction().interact_entity(hand, id);
        match result {
            InteractionResult::Success => {
                look_at_entity(session, id)?;
                return Ok(true);
            }
            InteractionResult::Fail => return Ok(false),
            InteractionResult::Pass => {}
        }
    }
    Ok(false)
}

/// Use the held item and keep using it until the host says it is done.
pub fn long_use_item<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
) -> Result<bool, ControlError> {
    if !right_click(session)? {
        return Ok(false);
    }
    if !session.client()?.interaction().is_using_item() {
        return Ok(false);
    }
    let was_blocking = session.is_blocking();
    session.set_blocking(true);
    let outcome = hold_use(session);
    session.set_blocking(was_blocking);
    outcome
}

fn hold_use<S: TickScheduler>(session: &mut ControlSession<'_, S>) -> Result<bool, ControlError> {
    loop {
        session.tick()?;
        if !session.client()?.interaction().is_using_item() {
            return Ok(true);
        }
    }
}

/// Mine the block at `pos` until it breaks. Fails if the block goes out of
/// sight before then.
pub fn long_mine_block<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    pos: VoxelCoord,
) -> Result<bool, ControlError> {
    if !left_click_block(session, pos, None)? {
        return Ok(false);
    }
    if !session.client()?.interaction().is_breaking_block() {
        return Ok(false);
    }
    let was_blocking = session.is_blocking();
    session.set_blocking(true);
    let outcome = hold_mine(session, pos);
    session.set_blocking(was_blocking);
    outcome
}

fn hold_mine<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    pos: VoxelCoord,
) -> Result<bool, ControlError> {
    loop {
        let (aimed, point) = {
            let mut client = session.client()?;
            let interaction = client.interaction();
            let aimed = interaction.crosshair_block() == Some(pos);
            let point = if aimed {
                None
            } else {
                interaction.closest_visible_point(pos, None)
            };
            (aimed, point)
        };
        if !aimed {
            let Some(point) = point else {
                debug!(target: "script", %pos, "mined block went out of sight");
                return Ok(false);
            };
            look_at(session, point)?;
        }
        session.client()?.interaction().continue_breaking_block();
        session.tick()?;
        if !session.client()?.interaction().is_breaking_block() {
            return Ok(true);
        }
    }
}
