// Dense 3D voxel grid for the headless host.
//
// The world is stored as a flat `Vec<BlockKind>` indexed by
// `x + z * size_x + y * size_x * size_z`, giving O(1) read/write access.
// Out-of-bounds reads return `Air`; out-of-bounds writes are no-ops.
//
// Also provides `raycast_first_hit()`, a 3D DDA (Amanatides & Woo) voxel
// traversal returning the first voxel with a collision shape along a
// segment, and the face the segment entered it through. The client uses it
// for the crosshair and for block visibility.
//
// See also: `client.rs`, which owns the world and routes every write
// through the mutation registry, `physics.rs` for collision against it.

use waymark_control::block::BlockKind;
use waymark_control::host::BlockView;
use waymark_control::types::{Face, Vec3, VoxelCoord};

/// Dense 3D voxel grid.
#[derive(Clone, Debug, Default)]
pub struct VoxelWorld {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z.
    voxels: Vec<BlockKind>,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
}

/// First solid voxel along a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub voxel: VoxelCoord,
    /// Face the ray entered through. `None` when the ray starts inside.
    pub face: Option<Face>,
}

impl VoxelWorld {
    /// Create a new world filled with `Air`.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        Self {
            voxels: vec![BlockKind::Air; total],
            size_x,
            size_y,
            size_z,
        }
    }

    pub fn in_bounds(&self, coord: VoxelCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && (coord.x as u32) < self.size_x
            && (coord.y as u32) < self.size_y
            && (coord.z as u32) < self.size_z
    }

    fn index(&self, coord: VoxelCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            let x = coord.x as usize;
            let y = coord.y as usize;
            let z = coord.z as usize;
            let sx = self.size_x as usize;
            let sz = self.size_z as usize;
            Some(x + z * sx + y * sx * sz)
        } else {
            None
        }
    }

    /// Read a voxel. Returns `Air` for out-of-bounds coordinates.
    pub fn get(&self, coord: VoxelCoord) -> BlockKind {
        self.index(coord)
            .map(|i| self.voxels[i])
            .unwrap_or(BlockKind::Air)
    }

    /// Write a voxel and return what was there. No-op returning `None` for
    /// out-of-bounds coordinates.
    pub fn set(&mut self, coord: VoxelCoord, kind: BlockKind) -> Option<BlockKind> {
        let i = self.index(coord)?;
        Some(std::mem::replace(&mut self.voxels[i], kind))
    }

    /// Fill the inclusive box `a..=b`.
    pub fn fill(&mut self, a: VoxelCoord, b: VoxelCoord, kind: BlockKind) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.set(VoxelCoord::new(x, y, z), kind);
                }
            }
        }
    }

    /// 3D DDA raycast from `from` to `to`. Returns the first voxel with a
    /// collision shape the segment passes through, including the voxel at
    /// `to`.
    pub fn raycast_first_hit(&self, from: Vec3, to: Vec3) -> Option<RayHit> {
        let from = [from.x, from.y, from.z];
        let to = [to.x, to.y, to.z];
        let dir = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];

        let mut voxel = [
            from[0].floor() as i32,
            from[1].floor() as i32,
            from[2].floor() as i32,
        ];

        let mut step = [0i32; 3];
        let mut t_max = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];

        for axis in 0..3 {
            if dir[axis] > 0.0 {
                step[axis] = 1;
                t_delta[axis] = 1.0 / dir[axis];
                t_max[axis] = ((voxel[axis] as f64 + 1.0) - from[axis]) / dir[axis];
            } else if dir[axis] < 0.0 {
                step[axis] = -1;
                t_delta[axis] = 1.0 / (-dir[axis]);
                t_max[axis] = (from[axis] - voxel[axis] as f64) / (-dir[axis]);
            }
        }

        let mut entered: Option<Face> = None;
        loop {
            let coord = VoxelCoord::new(voxel[0], voxel[1], voxel[2]);
            if !self.get(coord).is_collision_empty() {
                return Some(RayHit {
                    voxel: coord,
                    face: entered,
                });
            }

            let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
                0
            } else if t_max[1] <= t_max[2] {
                1
            } else {
                2
            };

            if t_max[axis] > 1.0 {
                return None;
            }

            voxel[axis] += step[axis];
            t_max[axis] += t_delta[axis];
            entered = Some(entry_face(axis, step[axis]));
        }
    }

    /// Whether `point` on the surface of `target` can be seen from `eye`:
    /// nothing solid lies between them other than `target` itself.
    pub fn is_visible(&self, eye: Vec3, target: VoxelCoord, point: Vec3) -> bool {
        // Aim slightly into the block so the ray ends inside `target`.
        let inward = target.center() - point;
        let end = point + inward * 1e-3;
        match self.raycast_first_hit(eye, end) {
            Some(hit) => hit.voxel == target,
            None => false,
        }
    }
}

/// Face of the voxel being entered when stepping along `axis` by `step`.
fn entry_face(axis: usize, step: i32) -> Face {
    match (axis, step > 0) {
        (0, true) => Face::West,
        (0, false) => Face::East,
        (1, true) => Face::Down,
        (1, false) => Face::Up,
        (_, true) => Face::North,
        (_, false) => Face::South,
    }
}

/// Center of `face` on the unit cube of `voxel`.
pub fn face_center(voxel: VoxelCoord, face: Face) -> Vec3 {
    let c = voxel.center();
    let offset = match face {
        Face::Down => Vec3::new(0.0, -0.5, 0.0),
        Face::Up => Vec3::new(0.0, 0.5, 0.0),
        Face::North => Vec3::new(0.0, 0.0, -0.5),
        Face::South => Vec3::new(0.0, 0.0, 0.5),
        Face::West => Vec3::new(-0.5, 0.0, 0.0),
        Face::East => Vec3::new(0.5, 0.0, 0.0),
    };
    c + offset
}

/// The voxel adjacent to `voxel` across `face`.
pub fn neighbor(voxel: VoxelCoord, face: Face) -> VoxelCoord {
    match face {
        Face::Down => voxel.offset(0, -1, 0),
        Face::Up => voxel.offset(0, 1, 0),
        Face::North => voxel.offset(0, 0, -1),
        Face::South => voxel.offset(0, 0, 1),
        Face::West => voxel.offset(-1, 0, 0),
        Face::East => voxel.offset(1, 0, 0),
    }
}

impl BlockView for VoxelWorld {
    fn block_at(&self, pos: VoxelCoord) -> BlockKind {
        self.get(pos)
    }
}
