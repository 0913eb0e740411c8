// Player physics for the headless host.
//
// A deliberately small model: an upright AABB moved once per tick with
// axis-separated collision against unit voxel boxes (Y first, then X, then
// Z). Vertical motion follows
//
//     vy = (vy - gravity) * vertical_drag     (or vy = jump_velocity on a jump)
//
// and horizontal motion is set directly from the wish direction times the
// walk speed, scaled for sprint and sneak. A body overlapping a ladder and
// pressing into a wall climbs at `climb_speed` instead of falling.
//
// With the default tuning a jump from the ground rises just over one block
// (peak ~1.25), so a single-block step can be climbed and a two-block wall
// cannot.
//
// See also: `client.rs`, which turns `MovementFlags` and yaw into the wish
// vector and calls `step_body` once per host tick.

use crate::config::HostConfig;
use crate::world::VoxelWorld;
use waymark_control::block::BlockKind;
use waymark_control::types::{Aabb, Vec3, VoxelCoord};

/// Overlap slack on the axes not being swept, so a body resting exactly on
/// a surface is not treated as sunk into it.
const EPSILON: f64 = 1e-7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Feet position.
    pub position: Vec3,
    pub velocity: Vec3,
    pub on_ground: bool,
    /// Horizontal movement was clipped last tick.
    pub against_wall: bool,
    pub width: f64,
    pub height: f64,
}

impl Body {
    pub fn new(position: Vec3, width: f64, height: f64) -> Self {
        Self {
            position,
            velocity: Vec3::new(0.0, 0.0, 0.0),
            on_ground: false,
            against_wall: false,
            width,
            height,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::of_entity(self.position, self.width, self.height)
    }
}

/// What happened during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub jumped: bool,
    pub landed: bool,
}

/// Horizontal intent for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Wish {
    /// Horizontal direction, length at most 1.
    pub direction: Vec3,
    pub jump: bool,
    pub sprint: bool,
    pub sneak: bool,
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
}

fn component(v: Vec3, axis: Axis) -> f64 {
    match axis {
        Axis::X => v.x,
        Axis::Y => v.y,
        Axis::Z => v.z,
    }
}

fn along(axis: Axis, d: f64) -> Vec3 {
    match axis {
        Axis::X => Vec3::new(d, 0.0, 0.0),
        Axis::Y => Vec3::new(0.0, d, 0.0),
        Axis::Z => Vec3::new(0.0, 0.0, d),
    }
}

fn overlaps_on(a: &Aabb, b: &Aabb, axis: Axis) -> bool {
    component(a.min, axis) < component(b.max, axis) - EPSILON
        && component(a.max, axis) > component(b.min, axis) + EPSILON
}

/// Clip a movement of `delta` along `axis` so `bx` does not enter any voxel
/// with a collision shape.
fn clip_axis(world: &VoxelWorld, bx: &Aabb, axis: Axis, delta: f64) -> f64 {
    if delta == 0.0 {
        return 0.0;
    }
    let swept = if delta > 0.0 {
        Aabb::new(bx.min, bx.max + along(axis, delta))
    } else {
        Aabb::new(bx.min + along(axis, delta), bx.max)
    };
    let (others_a, others_b) = match axis {
        Axis::X => (Axis::Y, Axis::Z),
        Axis::Y => (Axis::X, Axis::Z),
        Axis::Z => (Axis::X, Axis::Y),
    };

    let lo = VoxelCoord::containing(swept.min);
    let hi = VoxelCoord::containing(swept.max - Vec3::new(EPSILON, EPSILON, EPSILON));
    let mut clipped = delta;
    for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
            for x in lo.x..=hi.x {
                let v = VoxelCoord::new(x, y, z);
                if world.get(v).is_collision_empty() {
                    continue;
                }
                let vb = Aabb::of_voxel(v);
                if !overlaps_on(bx, &vb, others_a) || !overlaps_on(bx, &vb, others_b) {
                    continue;
                }
                if clipped > 0.0 && component(bx.max, axis) <= component(vb.min, axis) + EPSILON {
                    clipped = clipped.min(component(vb.min, axis) - component(bx.max, axis));
                } else if clipped < 0.0
                    && component(bx.min, axis) >= component(vb.max, axis) - EPSILON
                {
                    clipped = clipped.max(component(vb.max, axis) - component(bx.min, axis));
                }
            }
        }
    }
    clipped
}

fn touches_ladder(world: &VoxelWorld, bx: &Aabb) -> bool {
    let lo = VoxelCoord::containing(bx.min);
    let hi = VoxelCoord::containing(bx.max - Vec3::new(EPSILON, EPSILON, EPSILON));
    (lo.y..=hi.y).any(|y| {
        (lo.z..=hi.z)
            .any(|z| (lo.x..=hi.x).any(|x| world.get(VoxelCoord::new(x, y, z)) == BlockKind::Ladder))
    })
}

/// Advance `body` by one tick.
pub fn step_body(world: &VoxelWorld, body: &mut Body, wish: Wish, config: &HostConfig) -> StepOutcome {
    let mut outcome = StepOutcome::default();

    let mut speed = config.walk_speed;
    if wish.sprint && !wish.sneak {
        speed *= config.sprint_multiplier;
    }
    if wish.sneak {
        speed *= config.sneak_multiplier;
    }
    body.velocity.x = wish.direction.x * speed;
    body.velocity.z = wish.direction.z * speed;

    let on_ladder = touches_ladder(world, &body.bounding_box());
    if wish.jump && body.on_ground {
        body.velocity.y = config.jump_velocity;
        outcome.jumped = true;
    } else if on_ladder && body.against_wall {
        body.velocity.y = config.climb_speed;
    } else {
        body.velocity.y = (body.velocity.y - config.gravity) * config.vertical_drag;
        if on_ladder {
            body.velocity.y = body.velocity.y.max(-config.climb_speed);
        }
    }

    let mut bx = body.bounding_box();
    let dy = clip_axis(world, &bx, Axis::Y, body.velocity.y);
    bx = bx.offset(along(Axis::Y, dy));
    let dx = clip_axis(world, &bx, Axis::X, body.velocity.x);
    bx = bx.offset(along(Axis::X, dx));
    let dz = clip_axis(world, &bx, Axis::Z, body.velocity.z);

    let was_on_ground = body.on_ground;
    let clipped_y = dy != body.velocity.y;
    body.on_ground = clipped_y && body.velocity.y < 0.0;
    if clipped_y {
        body.velocity.y = 0.0;
    }
    body.against_wall = dx != body.velocity.x || dz != body.velocity.z;
    body.position = body.position + Vec3::new(dx, dy, dz);
    outcome.landed = body.on_ground && !was_on_ground;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_world() -> VoxelWorld {
        let mut world = VoxelWorld::new(16, 8, 16);
        world.fill(VoxelCoord::new(0, 0, 0), VoxelCoord::new(15, 0, 15), BlockKind::Solid);
        world
    }

    fn standing(x: f64, z: f64) -> Body {
        let mut body = Body::new(Vec3::new(x, 1.0, z), 0.6, 1.8);
        body.on_ground = true;
        body
    }

    fn forward_z() -> Wish {
        Wish {
            direction: Vec3::new(0.0, 0.0, 1.0),
            ..Wish::default()
        }
    }

    #[test]
    fn resting_body_stays_on_ground() {
        let world = floor_world();
        let config = HostConfig::default();
        let mut body = standing(4.5, 4.5);
        for _ in 0..10 {
            step_body(&world, &mut body, Wish::default(), &config);
            assert!(body.on_ground);
            assert_eq!(body.position.y, 1.0);
        }
    }

    #[test]
    fn falling_body_lands_on_floor() {
        let world = floor_world();
        let config = HostConfig::default();
        let mut body = Body::new(Vec3::new(4.5, 4.0, 4.5), 0.6, 1.8);
        let mut landed = false;
        for _ in 0..40 {
            landed |= step_body(&world, &mut body, Wish::default(), &config).landed;
        }
        assert!(landed);
        assert!(body.on_ground);
        assert!((body.position.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn walking_moves_at_walk_speed() {
        let world = floor_world();
        let config = HostConfig::default();
        let mut body = standing(4.5, 4.5);
        step_body(&world, &mut body, forward_z(), &config);
        assert!((body.position.z - 4.7).abs() < 1e-9);
        assert_eq!(body.position.x, 4.5);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let mut world = floor_world();
        world.fill(VoxelCoord::new(0, 1, 6), VoxelCoord::new(15, 2, 6), BlockKind::Solid);
        let config = HostConfig::default();
        let mut body = standing(4.5, 4.5);
        for _ in 0..20 {
            step_body(&world, &mut body, forward_z(), &config);
        }
        assert!((body.position.z - 5.7).abs() < 1e-9);
        assert!(body.against_wall);
    }

    #[test]
    fn jump_clears_one_block_step() {
        let mut world = floor_world();
        world.fill(VoxelCoord::new(0, 1, 6), VoxelCoord::new(15, 1, 15), BlockKind::Solid);
        let config = HostConfig::default();
        let mut body = standing(4.5, 5.5);
        let mut wish = forward_z();
        wish.jump = true;
        assert!(step_body(&world, &mut body, wish, &config).jumped);
        for _ in 0..20 {
            step_body(&world, &mut body, forward_z(), &config);
        }
        assert!(body.on_ground);
        assert!((body.position.y - 2.0).abs() < 1e-9);
        assert!(body.position.z > 6.5);
    }

    #[test]
    fn jump_does_not_clear_two_blocks() {
        let mut world = floor_world();
        world.fill(VoxelCoord::new(0, 1, 6), VoxelCoord::new(15, 2, 6), BlockKind::Solid);
        let config = HostConfig::default();
        let mut body = standing(4.5, 5.5);
        let mut wish = forward_z();
        wish.jump = true;
        step_body(&world, &mut body, wish, &config);
        for _ in 0..30 {
            step_body(&world, &mut body, forward_z(), &config);
        }
        assert!(body.position.z < 6.0);
        assert!((body.position.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn airborne_jump_is_ignored() {
        let world = floor_world();
        let config = HostConfig::default();
        let mut body = Body::new(Vec3::new(4.5, 3.0, 4.5), 0.6, 1.8);
        let wish = Wish {
            jump: true,
            ..Wish::default()
        };
        assert!(!step_body(&world, &mut body, wish, &config).jumped);
    }

    #[test]
    fn ladder_climbs_when_pushing_into_wall() {
        let mut world = floor_world();
        world.fill(VoxelCoord::new(4, 1, 6), VoxelCoord::new(4, 4, 6), BlockKind::Solid);
        world.fill(VoxelCoord::new(4, 1, 5), VoxelCoord::new(4, 3, 5), BlockKind::Ladder);
        let config = HostConfig::default();
        let mut body = standing(4.5, 5.5);
        for _ in 0..8 {
            step_body(&world, &mut body, forward_z(), &config);
        }
        assert!(body.position.y > 1.5);
    }
}
